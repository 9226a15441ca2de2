//! opseq Registry
//!
//! Runtime model of the target library: declared types, their members and
//! the invocation backends behind them. The registry is the single source
//! of truth for resolving type names and member signatures, and is
//! immutable after construction via RegistryBuilder.

mod builder;
#[cfg(any(test, feature = "demo"))]
mod demo;
mod java_base;
mod registry;
mod types;

pub use builder::{ClassBuilder, RegistryBuilder, RegistryError, ENCLOSING_FIELD};
#[cfg(any(test, feature = "demo"))]
pub use demo::add_demo_types;
pub use java_base::add_java_base;
pub use registry::TypeRegistry;
pub use types::*;
