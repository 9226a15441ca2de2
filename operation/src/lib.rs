//! opseq Operation
//!
//! The unit of test generation: one constructor call, method call, field
//! access or literal constant of the target library, with its typed
//! signature. Operations render themselves as source code, round-trip through
//! a canonical text form, and invoke the member behind them.

mod codec;
mod error;
mod filter;
mod invoke;
pub mod literal;
mod operation;
mod render;

pub use codec::ParseError;
pub use error::{OperationError, OperationResult};
pub use filter::{AccessiblePredicate, MemberPredicate, OmitPattern};
pub use invoke::Outcome;
pub use operation::{Operation, OperationKind};
pub use render::BoundInput;
