//! Feedback-directed sequence generation

use crate::config::GeneratorConfig;
use crate::execution::{ExecutionEngine, ExecutionTrace, ExecutionVisitor};
use crate::oracle::ContractChecker;
use crate::types::*;
use opseq_core::TypeRef;
use opseq_operation::Operation;
use opseq_registry::TypeRegistry;
use opseq_sequence::{ComponentPool, Sequence};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, trace};

/// Grows random sequences out of the component pool, executes them, and
/// feeds normally-terminating ones back into the pool.
pub struct SequenceGenerator<'a> {
    registry: &'a TypeRegistry,
    operations: &'a [Operation],
    pool: &'a ComponentPool,
    checker: &'a dyn ContractChecker,
    engine: ExecutionEngine,
    config: GeneratorConfig,
    seen: HashSet<Sequence>,
    stats: GenerationStats,
}

impl<'a> SequenceGenerator<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        operations: &'a [Operation],
        pool: &'a ComponentPool,
        checker: &'a dyn ContractChecker,
        config: GeneratorConfig,
    ) -> TestGenResult<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            operations,
            pool,
            checker,
            engine: ExecutionEngine::new(config.statement_budget()),
            config,
            seen: HashSet::new(),
            stats: GenerationStats::default(),
        })
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Run until `max_tests` tests are kept, `max_attempts` candidates were
    /// tried, or the time limit passes.
    pub fn generate(&mut self, rng: &mut impl Rng, visitor: &mut dyn ExecutionVisitor) -> Vec<GeneratedTest> {
        let start = Instant::now();
        let mut tests = Vec::new();
        if self.operations.is_empty() {
            return tests;
        }

        while tests.len() < self.config.max_tests
            && self.stats.attempts < self.config.max_attempts
            && start.elapsed() < self.config.time_limit()
        {
            self.stats.attempts += 1;
            let Some(operation) = self.operations.choose(rng) else {
                break;
            };

            let Some(candidate) = self.build_candidate(operation, rng) else {
                trace!(operation = %operation, "no inputs available");
                self.stats.unbound += 1;
                continue;
            };
            if candidate.len() > self.config.max_sequence_length {
                self.stats.too_long += 1;
                continue;
            }
            if self.pool.contains(&candidate) || !self.seen.insert(candidate.clone()) {
                self.stats.duplicates += 1;
                continue;
            }

            self.stats.executed += 1;
            let (trace, classification) = self.engine.execute_and_classify(&candidate, self.checker, visitor);
            self.stats.record(classification);
            if trace.has_timeout() {
                self.stats.timeouts += 1;
            }

            if classification == Classification::Regression {
                self.promote_reusable(&candidate, &trace);
            }
            if classification.is_kept() {
                let deciding = self.checker.deciding_statement(&candidate, &trace, classification);
                let (sequence, trace) = trim_to(candidate, trace, deciding);
                tests.push(GeneratedTest {
                    id: format!("test{}", tests.len() + 1),
                    sequence,
                    trace,
                    classification,
                });
            }
        }

        debug!(
            kept = tests.len(),
            attempts = self.stats.attempts,
            elapsed = ?start.elapsed(),
            "generation finished"
        );
        tests
    }

    fn build_candidate(&self, operation: &Operation, rng: &mut impl Rng) -> Option<Sequence> {
        if rng.gen_bool(self.config.extend_ratio) {
            let pooled = self.pool.sequences();
            if let Some(extended) = pooled.choose(rng).and_then(|s| s.extend(operation, self.registry)) {
                return Some(extended);
            }
        }

        let mut parts: Vec<Sequence> = Vec::with_capacity(operation.arity());
        let mut inputs = Vec::with_capacity(operation.arity());
        let mut len = 0;
        for (position, ty) in operation.input_types().iter().enumerate() {
            let part = self.input_for(operation, position, ty, rng)?;
            len += part.len();
            inputs.push(len - 1);
            parts.push(part);
        }
        Sequence::concat_all(&parts)
            .append(operation.clone(), inputs, self.registry)
            .ok()
    }

    /// A sequence whose last statement can feed parameter `position`.
    fn input_for(&self, operation: &Operation, position: usize, ty: &TypeRef, rng: &mut impl Rng) -> Option<Sequence> {
        let receiver = position == 0 && (operation.has_receiver() || operation.takes_enclosing_instance());
        if ty.is_reference() && !receiver && rng.gen_bool(self.config.null_ratio) {
            let null = Operation::null_of(ty.clone()).ok()?;
            return Sequence::of(null, self.registry).ok();
        }
        self.pool
            .candidates_for(ty, self.registry)
            .choose(rng)
            .cloned()
    }

    /// Add the normally-terminating part of a regression sequence to the pool.
    fn promote_reusable(&mut self, sequence: &Sequence, trace: &ExecutionTrace) {
        let reusable = match trace.first_exceptional() {
            None => Some(sequence.clone()),
            Some((0, _)) => None,
            Some((index, _)) => sequence.subsequence(index - 1).ok(),
        };
        if let Some(reusable) = reusable {
            if self.pool.promote(reusable) {
                self.stats.promoted += 1;
            }
        }
    }
}

/// Drop the statements after `last` from an emitted test. They may have
/// run, but the verdict does not depend on them.
fn trim_to(sequence: Sequence, trace: ExecutionTrace, last: Option<usize>) -> (Sequence, ExecutionTrace) {
    match last.map(|index| (index, sequence.subsequence(index))) {
        Some((index, Ok(prefix))) => (prefix, trace.prefix(index + 1)),
        _ => (sequence, trace),
    }
}
