//! Dynamic invocation of operations and the outcome of one statement.

use crate::operation::Callable;
use crate::{Operation, OperationKind};
use opseq_core::{Throwable, Value};
use opseq_registry::MemberDef;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of executing one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Completed normally. Void operations yield `Value::Null`.
    Normal { value: Value, elapsed: Duration },
    /// The invoked member raised a failure.
    Exceptional { thrown: Throwable, elapsed: Duration },
    /// The invocation did not finish within its budget.
    Timeout { budget: Duration },
    /// Skipped because an input was not produced normally.
    NotExecuted,
}

impl Outcome {
    pub fn normal(value: Value, elapsed: Duration) -> Self {
        Outcome::Normal { value, elapsed }
    }

    pub fn exceptional(thrown: Throwable, elapsed: Duration) -> Self {
        Outcome::Exceptional { thrown, elapsed }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Outcome::Normal { .. })
    }

    /// Exceptional or timed out.
    pub fn is_exceptional(&self) -> bool {
        matches!(self, Outcome::Exceptional { .. } | Outcome::Timeout { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::Timeout { .. })
    }

    pub fn is_not_executed(&self) -> bool {
        matches!(self, Outcome::NotExecuted)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Normal { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn thrown(&self) -> Option<&Throwable> {
        match self {
            Outcome::Exceptional { thrown, .. } => Some(thrown),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Outcome::Normal { elapsed, .. } | Outcome::Exceptional { elapsed, .. } => *elapsed,
            Outcome::Timeout { budget } => *budget,
            Outcome::NotExecuted => Duration::ZERO,
        }
    }
}

impl Operation {
    /// Invoke the operation with `args` (receiver first for instance members).
    ///
    /// Never fails: every failure of the invoked member, including a panic in
    /// its backend, is reported as [`Outcome::Exceptional`].
    pub fn invoke(&self, args: &[Value]) -> Outcome {
        if args.len() != self.arity() {
            return Outcome::exceptional(
                Throwable::illegal_argument(format!(
                    "wrong number of arguments: {} expects {}, got {}",
                    self,
                    self.arity(),
                    args.len()
                )),
                Duration::ZERO,
            );
        }

        let member = match &self.inner.callable {
            Callable::Literal(value) => return Outcome::normal(value.clone(), Duration::ZERO),
            Callable::Member(member) => member,
        };

        if self.takes_enclosing_instance() && args[0].is_null() {
            return Outcome::exceptional(
                Throwable::null_pointer(format!(
                    "call to {} with null for enclosing instance",
                    member.signature()
                )),
                Duration::ZERO,
            );
        }
        if self.has_receiver() && args[0].is_null() {
            return Outcome::exceptional(
                Throwable::null_pointer(format!("call to {} on null receiver", member.signature())),
                Duration::ZERO,
            );
        }

        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(member, args)));
        let elapsed = start.elapsed();
        match result {
            Ok(Ok(value)) => Outcome::normal(value, elapsed),
            Ok(Err(thrown)) => Outcome::exceptional(thrown, elapsed),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                debug!(operation = %self, %message, "invocation panicked");
                Outcome::exceptional(Throwable::error(message), elapsed)
            }
        }
    }

    fn dispatch(&self, member: &MemberDef, args: &[Value]) -> Result<Value, Throwable> {
        match self.kind() {
            OperationKind::ConstructorCall | OperationKind::MethodCall => member.invoke(args),
            OperationKind::FieldGetter => member.read_field(args.first().unwrap_or(&Value::Null)),
            OperationKind::FieldSetter => {
                let null = Value::Null;
                let (receiver, value) = match args {
                    [value] => (&null, value),
                    [receiver, value] => (receiver, value),
                    _ => return Err(Throwable::illegal_argument("wrong number of arguments")),
                };
                member.write_field(receiver, value.clone())?;
                Ok(Value::Null)
            }
            OperationKind::Literal => Ok(Value::Null),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_registry;
    use opseq_core::{PrimitiveType, TypeRef};
    use opseq_registry::MemberKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_constructor_returns_empty_list() {
        let registry = fixture_registry();
        let list = registry.resolve_type("java.util.ArrayList").unwrap();
        let ctor = registry.find_member(&list, MemberKind::Constructor, "<init>", &[]).unwrap();
        let outcome = Operation::constructor(ctor.clone()).unwrap().invoke(&[]);
        let value = outcome.value().unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.class().name(), "java.util.ArrayList");
        assert_eq!(obj.lock().elements().map(|e| e.len()), Some(0));
    }

    #[test]
    fn test_null_enclosing_instance_is_npe_before_backend() {
        let registry = fixture_registry();
        let inner = registry.resolve_type("demo.Outer$Inner").unwrap();
        let outer = registry.resolve_type("demo.Outer").unwrap();
        let ctor = registry
            .find_member(
                &inner,
                MemberKind::Constructor,
                "<init>",
                &[outer, TypeRef::Primitive(PrimitiveType::Int)],
            )
            .unwrap();
        let outcome = Operation::constructor(ctor.clone())
            .unwrap()
            .invoke(&[Value::Null, Value::Int(1)]);
        assert_eq!(outcome.thrown().map(|t| t.class.as_str()), Some(Throwable::NULL_POINTER));
        assert_eq!(outcome.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_null_receiver_is_npe() {
        let registry = fixture_registry();
        let list = registry.resolve_type("java.util.ArrayList").unwrap();
        let size = registry.find_member(&list, MemberKind::Method, "size", &[]).unwrap();
        let outcome = Operation::method(size.clone()).unwrap().invoke(&[Value::Null]);
        assert!(outcome.thrown().unwrap().is(Throwable::NULL_POINTER));
    }

    #[test]
    fn test_wrong_argument_count() {
        let registry = fixture_registry();
        let list = registry.resolve_type("java.util.ArrayList").unwrap();
        let size = registry.find_member(&list, MemberKind::Method, "size", &[]).unwrap();
        let outcome = Operation::method(size.clone()).unwrap().invoke(&[]);
        assert!(outcome.thrown().unwrap().is(Throwable::ILLEGAL_ARGUMENT));
    }

    #[test]
    fn test_declared_failure_is_exceptional() {
        let registry = fixture_registry();
        let faulty = registry.resolve_type("demo.Faulty").unwrap();
        let ctor = registry.find_member(&faulty, MemberKind::Constructor, "<init>", &[]).unwrap();
        let receiver = Operation::constructor(ctor.clone()).unwrap().invoke(&[]);
        let check = registry
            .find_member(
                &faulty,
                MemberKind::Method,
                "checkPositive",
                &[TypeRef::Primitive(PrimitiveType::Int)],
            )
            .unwrap();
        let op = Operation::method(check.clone()).unwrap();
        let recv = receiver.value().unwrap().clone();

        assert_eq!(op.invoke(&[recv.clone(), Value::Int(3)]).value(), Some(&Value::Int(3)));
        let failed = op.invoke(&[recv, Value::Int(-1)]);
        assert!(failed.is_exceptional());
        assert!(failed.thrown().unwrap().is(Throwable::ILLEGAL_ARGUMENT));
    }

    #[test]
    fn test_panic_becomes_error() {
        let registry = fixture_registry();
        let faulty = registry.resolve_type("demo.Faulty").unwrap();
        let ctor = registry.find_member(&faulty, MemberKind::Constructor, "<init>", &[]).unwrap();
        let recv = Operation::constructor(ctor.clone()).unwrap().invoke(&[]);
        let crash = registry.find_member(&faulty, MemberKind::Method, "crash", &[]).unwrap();
        let outcome = Operation::method(crash.clone())
            .unwrap()
            .invoke(&[recv.value().unwrap().clone()]);
        let thrown = outcome.thrown().unwrap();
        assert!(thrown.is(Throwable::ERROR));
        assert_eq!(thrown.message, "internal invariant broken");
    }

    #[test]
    fn test_field_set_then_get() {
        let registry = fixture_registry();
        let point = registry.resolve_type("demo.Point").unwrap();
        let ctor = registry.find_member(&point, MemberKind::Constructor, "<init>", &[]).unwrap();
        let recv = Operation::constructor(ctor.clone()).unwrap().invoke(&[]).value().unwrap().clone();
        let x = registry.find_field(&point, "x").unwrap();

        let set = Operation::field_setter(x.clone()).unwrap().invoke(&[recv.clone(), Value::Int(9)]);
        assert_eq!(set.value(), Some(&Value::Null));
        let get = Operation::field_getter(x.clone()).unwrap().invoke(&[recv]);
        assert_eq!(get.value(), Some(&Value::Int(9)));
    }

    #[test]
    fn test_static_field_read() {
        let registry = fixture_registry();
        let point = registry.resolve_type("demo.Point").unwrap();
        let origin = registry.find_field(&point, "ORIGIN_X").unwrap();
        let outcome = Operation::field_getter(origin.clone()).unwrap().invoke(&[]);
        assert_eq!(outcome.value(), Some(&Value::Int(0)));
    }

    #[test]
    fn test_literal_yields_its_value() {
        let op = Operation::literal(TypeRef::string(), Value::from("x")).unwrap();
        assert_eq!(op.invoke(&[]).value(), Some(&Value::from("x")));
    }
}
