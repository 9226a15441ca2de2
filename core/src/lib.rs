//! opseq core types
//!
//! Foundational types shared by every other crate in the workspace:
//! - Static types (TypeRef, TypeTuple, PrimitiveType)
//! - Runtime values (Value, Object, ObjectRef)
//! - Thrown failures (Throwable)

mod types;
mod value;

pub use types::*;
pub use value::*;
