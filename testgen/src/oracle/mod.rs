//! Contract checking: classifying executed sequences

use crate::config::CheckerConfig;
use crate::execution::{ExecutionEngine, ExecutionTrace, NoopVisitor};
use crate::types::Classification;
use opseq_core::{Throwable, Value};
use opseq_operation::Outcome;
use opseq_sequence::Sequence;
use tracing::debug;

/// Decides what an executed sequence means.
///
/// Called exactly once per executed sequence; its verdict is final.
pub trait ContractChecker {
    fn classify(&self, sequence: &Sequence, trace: &ExecutionTrace) -> Classification;

    /// The statement a kept verdict rests on; emitted tests end there.
    fn deciding_statement(
        &self,
        _sequence: &Sequence,
        trace: &ExecutionTrace,
        _classification: Classification,
    ) -> Option<usize> {
        trace.first_exceptional().map(|(index, _)| index)
    }
}

impl<F> ContractChecker for F
where
    F: Fn(&Sequence, &ExecutionTrace) -> Classification,
{
    fn classify(&self, sequence: &Sequence, trace: &ExecutionTrace) -> Classification {
        self(sequence, trace)
    }
}

/// Flags exceptions the failing member does not declare.
///
/// A timed-out statement makes the sequence Invalid, or ErrorRevealing when
/// configured. Otherwise every exceptional statement is judged on its own,
/// first match wins:
/// 1. the exception is declared by the member: Regression
/// 2. a NullPointerException with a null argument: Invalid
/// 3. a configured precondition exception: Invalid
/// 4. anything else: ErrorRevealing
///
/// One ErrorRevealing statement makes the sequence ErrorRevealing; failing
/// that, one Invalid statement makes it Invalid.
#[derive(Debug, Clone, Default)]
pub struct UndeclaredExceptionChecker {
    config: CheckerConfig,
}

impl UndeclaredExceptionChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Verdict for one exceptional statement.
    fn classify_statement(&self, sequence: &Sequence, trace: &ExecutionTrace, index: usize, outcome: &Outcome) -> Classification {
        match outcome.thrown() {
            Some(thrown) => self.classify_thrown(sequence, trace, index, thrown),
            None => Classification::ErrorRevealing,
        }
    }

    fn exceptional<'t>(trace: &'t ExecutionTrace) -> impl Iterator<Item = (usize, &'t Outcome)> + 't {
        trace.outcomes().iter().enumerate().filter(|(_, o)| o.is_exceptional())
    }

    fn classify_thrown(&self, sequence: &Sequence, trace: &ExecutionTrace, index: usize, thrown: &Throwable) -> Classification {
        let Some(statement) = sequence.statement(index) else {
            return Classification::ErrorRevealing;
        };
        if statement.operation().member().is_some_and(|m| m.declares(&thrown.class)) {
            return Classification::Regression;
        }

        if self.config.null_npe_invalid && thrown.is(Throwable::NULL_POINTER) {
            let null_input = statement
                .inputs()
                .iter()
                .any(|&i| trace.outcome(i).and_then(Outcome::value).is_some_and(Value::is_null));
            if null_input {
                return Classification::Invalid;
            }
        }

        if self.config.precondition_exceptions.iter().any(|c| thrown.is(c)) {
            return Classification::Invalid;
        }
        Classification::ErrorRevealing
    }
}

impl ContractChecker for UndeclaredExceptionChecker {
    fn classify(&self, sequence: &Sequence, trace: &ExecutionTrace) -> Classification {
        if trace.has_timeout() {
            return if self.config.timeout_is_error {
                Classification::ErrorRevealing
            } else {
                Classification::Invalid
            };
        }
        let mut verdict = Classification::Regression;
        for (index, outcome) in Self::exceptional(trace) {
            match self.classify_statement(sequence, trace, index, outcome) {
                Classification::ErrorRevealing => return Classification::ErrorRevealing,
                Classification::Invalid => verdict = Classification::Invalid,
                _ => {}
            }
        }
        verdict
    }

    fn deciding_statement(
        &self,
        sequence: &Sequence,
        trace: &ExecutionTrace,
        classification: Classification,
    ) -> Option<usize> {
        if let Some(index) = trace.outcomes().iter().position(Outcome::is_timeout) {
            return Some(index);
        }
        match classification {
            Classification::ErrorRevealing => Self::exceptional(trace)
                .find(|&(index, outcome)| {
                    self.classify_statement(sequence, trace, index, outcome) == Classification::ErrorRevealing
                })
                .map(|(index, _)| index),
            _ => trace.first_exceptional().map(|(index, _)| index),
        }
    }
}

/// Re-executes kept sequences and reports Flaky when the replay diverges.
///
/// Outcomes are compared by kind and thrown class; object identities and
/// timings are expected to differ between runs.
pub struct ReplayChecker<C> {
    inner: C,
    engine: ExecutionEngine,
}

impl<C: ContractChecker> ReplayChecker<C> {
    pub fn new(inner: C, engine: ExecutionEngine) -> Self {
        Self { inner, engine }
    }
}

impl<C: ContractChecker> ContractChecker for ReplayChecker<C> {
    fn classify(&self, sequence: &Sequence, trace: &ExecutionTrace) -> Classification {
        let verdict = self.inner.classify(sequence, trace);
        if !verdict.is_kept() {
            return verdict;
        }
        let replay = self.engine.execute(sequence, &mut NoopVisitor);
        let diverged = trace
            .outcomes()
            .iter()
            .zip(replay.outcomes())
            .position(|(a, b)| !same_shape(a, b));
        match diverged {
            Some(index) => {
                debug!(index, "replay diverged");
                Classification::Flaky
            }
            None => verdict,
        }
    }

    fn deciding_statement(
        &self,
        sequence: &Sequence,
        trace: &ExecutionTrace,
        classification: Classification,
    ) -> Option<usize> {
        self.inner.deciding_statement(sequence, trace, classification)
    }
}

fn same_shape(a: &Outcome, b: &Outcome) -> bool {
    match (a, b) {
        (Outcome::Normal { value: x, .. }, Outcome::Normal { value: y, .. }) => {
            x.as_object().is_some() == y.as_object().is_some() && (x.as_object().is_some() || x == y)
        }
        (Outcome::Exceptional { thrown: x, .. }, Outcome::Exceptional { thrown: y, .. }) => x.class == y.class,
        (Outcome::Timeout { .. }, Outcome::Timeout { .. }) => true,
        (Outcome::NotExecuted, Outcome::NotExecuted) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_registry, op};
    use opseq_core::Value;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn run(checker: &dyn ContractChecker, seq: &Sequence) -> Classification {
        ExecutionEngine::default()
            .execute_and_classify(seq, checker, &mut NoopVisitor)
            .1
    }

    #[test]
    fn test_rules() {
        let registry = fixture_registry();
        let checker = UndeclaredExceptionChecker::default();
        let call = |text: &str, literal: &str| {
            Sequence::from_statements(
                vec![
                    (op(&registry, "demo.Faulty.<init>()"), vec![]),
                    (op(&registry, literal), vec![]),
                    (op(&registry, text), vec![0, 1]),
                ],
                &registry,
            )
            .unwrap()
        };

        let ok = call("demo.Faulty.checkPositive(int)", "int:3");
        assert_eq!(run(&checker, &ok), Classification::Regression);

        // declared in the throws clause
        let declared = call("demo.Faulty.checkPositive(int)", "int:-3");
        assert_eq!(run(&checker, &declared), Classification::Regression);

        let divide = Sequence::from_statements(
            vec![
                (op(&registry, "int:1"), vec![]),
                (op(&registry, "int:0"), vec![]),
                (op(&registry, "demo.Faulty.divide(int,int)"), vec![0, 1]),
            ],
            &registry,
        )
        .unwrap();
        assert_eq!(run(&checker, &divide), Classification::ErrorRevealing);
    }

    #[test]
    fn test_every_exception_is_judged() {
        let registry = fixture_registry();
        let checker = UndeclaredExceptionChecker::default();
        // a declared failure followed by an independent undeclared one
        let seq = Sequence::from_statements(
            vec![
                (op(&registry, "demo.Faulty.<init>()"), vec![]),
                (op(&registry, "int:-1"), vec![]),
                (op(&registry, "demo.Faulty.checkPositive(int)"), vec![0, 1]),
                (op(&registry, "int:1"), vec![]),
                (op(&registry, "int:0"), vec![]),
                (op(&registry, "demo.Faulty.divide(int,int)"), vec![3, 4]),
            ],
            &registry,
        )
        .unwrap();
        let trace = ExecutionEngine::default().execute(&seq, &mut NoopVisitor);
        assert!(trace.outcome(2).unwrap().is_exceptional());
        assert!(trace.outcome(5).unwrap().is_exceptional());
        assert_eq!(checker.classify(&seq, &trace), Classification::ErrorRevealing);
        assert_eq!(checker.deciding_statement(&seq, &trace, Classification::ErrorRevealing), Some(5));

        // a null-argument NPE ahead of a declared failure
        let invalid = Sequence::from_statements(
            vec![
                (op(&registry, "demo.Point:null"), vec![]),
                (op(&registry, "demo.Point.origin()"), vec![]),
                (op(&registry, "demo.Point.distanceTo(demo.Point)"), vec![0, 1]),
                (op(&registry, "demo.Faulty.<init>()"), vec![]),
                (op(&registry, "int:-1"), vec![]),
                (op(&registry, "demo.Faulty.checkPositive(int)"), vec![3, 4]),
            ],
            &registry,
        )
        .unwrap();
        assert_eq!(run(&checker, &invalid), Classification::Invalid);
    }

    #[test]
    fn test_null_receiver_is_invalid() {
        let registry = fixture_registry();
        let seq = Sequence::from_statements(
            vec![
                (op(&registry, "demo.Point:null"), vec![]),
                (op(&registry, "demo.Point.origin()"), vec![]),
                (op(&registry, "demo.Point.distanceTo(demo.Point)"), vec![0, 1]),
            ],
            &registry,
        )
        .unwrap();
        let checker = UndeclaredExceptionChecker::default();
        assert_eq!(run(&checker, &seq), Classification::Invalid);

        let strict = UndeclaredExceptionChecker::new(CheckerConfig::default().with_null_npe_invalid(false));
        assert_eq!(run(&strict, &seq), Classification::ErrorRevealing);
    }

    #[test]
    fn test_closure_checker() {
        let registry = fixture_registry();
        let seq = Sequence::of(op(&registry, "demo.Outer.<init>()"), &registry).unwrap();
        let checker = |_: &Sequence, _: &ExecutionTrace| Classification::Flaky;
        assert_eq!(run(&checker, &seq), Classification::Flaky);
    }

    #[test]
    fn test_replay_detects_divergence() {
        let registry = fixture_registry();
        let seq = Sequence::of(op(&registry, "int:1"), &registry).unwrap();
        let trace = ExecutionTrace::new(vec![opseq_operation::Outcome::normal(Value::Int(2), Duration::ZERO)]);

        let calls = Arc::new(AtomicI64::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            move |_: &Sequence, _: &ExecutionTrace| {
                calls.fetch_add(1, Ordering::SeqCst);
                Classification::Regression
            }
        };
        let replay = ReplayChecker::new(counted, ExecutionEngine::default());
        assert_eq!(replay.classify(&seq, &trace), Classification::Flaky);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stable = ExecutionEngine::default().execute(&seq, &mut NoopVisitor);
        assert_eq!(replay.classify(&seq, &stable), Classification::Regression);
    }
}
