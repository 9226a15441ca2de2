//! Sequence execution with per-statement time budgets

use crate::oracle::ContractChecker;
use crate::types::Classification;
use opseq_core::{Throwable, Value};
use opseq_operation::Outcome;
use opseq_sequence::Sequence;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace, warn};

const DEFAULT_BUDGET_MS: u64 = 1000;

/// Observer of an execution in progress.
///
/// All callbacks default to no-ops.
pub trait ExecutionVisitor {
    fn before_statement(&mut self, _sequence: &Sequence, _index: usize) {}

    fn after_statement(&mut self, _sequence: &Sequence, _index: usize, _outcome: &Outcome) {}

    fn after_sequence(&mut self, _sequence: &Sequence, _trace: &ExecutionTrace) {}
}

/// Visitor that observes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisitor;

impl ExecutionVisitor for NoopVisitor {}

/// Visitor that logs each executed statement
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingVisitor;

impl ExecutionVisitor for TracingVisitor {
    fn before_statement(&mut self, sequence: &Sequence, index: usize) {
        if let Some(statement) = sequence.statement(index) {
            trace!(index, operation = %statement.operation(), "executing");
        }
    }

    fn after_statement(&mut self, _sequence: &Sequence, index: usize, outcome: &Outcome) {
        match outcome {
            Outcome::Normal { elapsed, .. } => trace!(index, ?elapsed, "normal"),
            Outcome::Exceptional { thrown, elapsed } => trace!(index, %thrown, ?elapsed, "exceptional"),
            Outcome::Timeout { budget } => warn!(index, ?budget, "statement timed out"),
            Outcome::NotExecuted => trace!(index, "not executed"),
        }
    }

    fn after_sequence(&mut self, sequence: &Sequence, trace: &ExecutionTrace) {
        debug!(
            statements = sequence.len(),
            first_exceptional = ?trace.first_exceptional().map(|(i, _)| i),
            "sequence executed"
        );
    }
}

/// Per-statement outcomes of one execution, in statement order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionTrace {
    outcomes: Vec<Outcome>,
}

impl ExecutionTrace {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn outcome(&self, index: usize) -> Option<&Outcome> {
        self.outcomes.get(index)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn last(&self) -> Option<&Outcome> {
        self.outcomes.last()
    }

    /// Index and outcome of the first Exceptional or Timeout statement.
    pub fn first_exceptional(&self) -> Option<(usize, &Outcome)> {
        self.outcomes.iter().enumerate().find(|(_, o)| o.is_exceptional())
    }

    pub fn has_timeout(&self) -> bool {
        self.outcomes.iter().any(Outcome::is_timeout)
    }

    pub fn all_normal(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_normal)
    }

    /// Outcomes of the first `len` statements.
    pub fn prefix(&self, len: usize) -> ExecutionTrace {
        ExecutionTrace::new(self.outcomes.iter().take(len).cloned().collect())
    }
}

/// Runs sequences statement by statement.
///
/// Every non-literal statement runs on its own worker thread; one that
/// exceeds the budget is abandoned and never joined.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    budget: Duration,
}

impl ExecutionEngine {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn execute(&self, sequence: &Sequence, visitor: &mut dyn ExecutionVisitor) -> ExecutionTrace {
        let mut outcomes: Vec<Outcome> = Vec::with_capacity(sequence.len());
        let mut abandoned = false;

        for (index, statement) in sequence.statements().iter().enumerate() {
            visitor.before_statement(sequence, index);

            let args: Option<Vec<Value>> = statement
                .inputs()
                .iter()
                .map(|&input| outcomes.get(input).and_then(Outcome::value).cloned())
                .collect();

            let outcome = match args {
                // the runtime is in an unknown state after an abandoned worker
                _ if abandoned => Outcome::NotExecuted,
                None => Outcome::NotExecuted,
                Some(args) if statement.operation().is_literal() => statement.operation().invoke(&args),
                Some(args) => self.run_with_budget(statement.operation().clone(), args),
            };
            if outcome.is_timeout() {
                warn!(index, operation = %statement.operation(), budget = ?self.budget, "abandoning worker");
                abandoned = true;
            }

            visitor.after_statement(sequence, index, &outcome);
            outcomes.push(outcome);
        }

        let trace = ExecutionTrace::new(outcomes);
        visitor.after_sequence(sequence, &trace);
        trace
    }

    /// Execute, then hand the trace to `checker` exactly once.
    pub fn execute_and_classify(
        &self,
        sequence: &Sequence,
        checker: &dyn ContractChecker,
        visitor: &mut dyn ExecutionVisitor,
    ) -> (ExecutionTrace, Classification) {
        let trace = self.execute(sequence, visitor);
        let classification = checker.classify(sequence, &trace);
        debug!(statements = sequence.len(), classification = classification.as_str(), "classified");
        (trace, classification)
    }

    fn run_with_budget(&self, operation: opseq_operation::Operation, args: Vec<Value>) -> Outcome {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let _ = tx.send(operation.invoke(&args));
        });

        match rx.recv_timeout(self.budget) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                drop(handle);
                Outcome::Timeout { budget: self.budget }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Outcome::exceptional(Throwable::error("worker thread died"), Duration::ZERO)
            }
        }
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_BUDGET_MS))
    }
}
