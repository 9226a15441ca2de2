//! Feedback-directed Test Generation for opseq
//!
//! This crate drives random test generation over a registry-modelled library:
//! - Resolves a class/operation selection into operations
//! - Grows candidate sequences from a pool of accepted components
//! - Executes each candidate under per-statement time budgets
//! - Classifies executions through a pluggable contract checker
//! - Reports results and writes accepted tests as source

pub mod config;
pub mod execution;
pub mod generator;
pub mod oracle;
pub mod report;
pub mod selection;
pub mod types;

pub use config::{CheckerConfig, GeneratorConfig, NameErrorPolicy};
pub use execution::{ExecutionEngine, ExecutionTrace, ExecutionVisitor, NoopVisitor, TracingVisitor};
pub use generator::SequenceGenerator;
pub use oracle::{ContractChecker, ReplayChecker, UndeclaredExceptionChecker};
pub use report::{ReportGenerator, TestClassWriter};
pub use selection::{
    load_components, load_operations, AbortOnNameError, CheckState, LoadError, NameErrorHandler, Selection,
    TypeSelection, WarnOnNameError,
};
pub use types::*;

use opseq_operation::{OmitPattern, Operation};
use opseq_registry::{MemberDef, TypeRegistry};
use opseq_sequence::{default_seeds, ComponentPool};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Main entry point for the test generator
pub struct TestGenerator {
    pub config: GeneratorConfig,
    pub rng: StdRng,
    checker: Box<dyn ContractChecker>,
}

impl TestGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let inner = UndeclaredExceptionChecker::new(config.checker.clone());
        let checker: Box<dyn ContractChecker> = if config.replay_kept {
            Box::new(ReplayChecker::new(inner, ExecutionEngine::new(config.statement_budget())))
        } else {
            Box::new(inner)
        };
        Self { config, rng, checker }
    }

    /// Replace the default contract checker
    pub fn with_checker(mut self, checker: impl ContractChecker + 'static) -> Self {
        self.checker = Box::new(checker);
        self
    }

    /// Generate a complete test suite for a selection
    pub fn generate_suite(&mut self, registry: &TypeRegistry, selection: &Selection) -> TestGenResult<TestSuite> {
        let pool = self.seeded_pool(registry);
        self.generate_with_pool(registry, selection, &pool)
    }

    /// Generate a test suite, growing an existing component pool
    pub fn generate_with_pool(
        &mut self,
        registry: &TypeRegistry,
        selection: &Selection,
        pool: &ComponentPool,
    ) -> TestGenResult<TestSuite> {
        self.config.validate()?;

        // 1. Resolve the selection
        let operations = self.load(registry, selection)?;

        // 2. Grow sequences
        let mut generator =
            SequenceGenerator::new(registry, &operations, pool, self.checker.as_ref(), self.config.clone())?;
        let tests = generator.generate(&mut self.rng, &mut TracingVisitor);
        let stats = generator.stats().clone();

        info!(
            operations = operations.len(),
            tests = tests.len(),
            pool = pool.len(),
            "test suite generated"
        );

        // 3. Assemble
        Ok(TestSuite {
            tests,
            operation_count: operations.len(),
            stats,
            seed: self.config.seed,
        })
    }

    /// A pool seeded from a component file. Blocks that fail to resolve
    /// follow the configured name-error policy.
    pub fn load_pool(&self, registry: &TypeRegistry, components: &str) -> TestGenResult<ComponentPool> {
        let pool = self.seeded_pool(registry);
        let handler = self.config.on_name_error.handler();
        load_components(&pool, components, registry, handler.as_ref())?;
        Ok(pool)
    }

    fn seeded_pool(&self, registry: &TypeRegistry) -> ComponentPool {
        if self.config.use_default_seeds {
            ComponentPool::with_seeds(default_seeds(), registry)
        } else {
            ComponentPool::new()
        }
    }

    fn load(&self, registry: &TypeRegistry, selection: &Selection) -> TestGenResult<Vec<Operation>> {
        let omit = OmitPattern::new(self.config.omit_patterns.as_slice())
            .map_err(|e| TestGenError::Config(format!("bad omit pattern: {}", e)))?;
        let public_only = self.config.public_only;
        let predicate = |m: &MemberDef| (!public_only || m.is_public()) && !omit.omits(&m.signature());
        let handler = self.config.on_name_error.handler();
        Ok(load_operations(selection, registry, handler.as_ref(), &predicate)?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use opseq_operation::Operation;
    use opseq_registry::TypeRegistry;

    pub fn fixture_registry() -> TypeRegistry {
        TypeRegistry::demo().expect("demo registry builds")
    }

    pub fn op(registry: &TypeRegistry, text: &str) -> Operation {
        Operation::parse(text, registry).expect("operation text resolves")
    }
}
