//! opseq Sequence
//!
//! Statements, sequences and the pool of accepted sequences. A sequence is
//! an append-only program fragment: each statement applies an operation to
//! variables declared by earlier statements, so every sequence is acyclic
//! and topologically ordered by construction.

mod codec;
mod codegen;
mod compose;
mod error;
mod pool;
mod sequence;

pub use codec::{parse_blocks, parse_many, write_many, SequenceParseError};
pub use error::{SequenceError, SequenceResult};
pub use pool::{default_seeds, ComponentPool};
pub use sequence::{Sequence, Statement, Variable};

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
