//! Demonstration target library layered over the platform model.
//!
//! Covers the shapes the engine has to handle: fields, static members,
//! a subclass, static and inner member classes, documented precondition
//! failures, undocumented failures, a panicking member and a member that
//! never returns.

use crate::{add_java_base, MemberSpec, RegistryBuilder, RegistryError, TypeRegistry, ENCLOSING_FIELD};
use opseq_core::{Object, ObjectRef, ObjectState, Throwable, TypeRef, Value};
use std::time::Duration;

const POINT: &str = "demo.Point";

impl TypeRegistry {
    /// Platform model plus the demonstration classes.
    pub fn demo() -> Result<TypeRegistry, RegistryError> {
        let mut builder = RegistryBuilder::new();
        add_java_base(&mut builder)?;
        add_demo_types(&mut builder)?;
        builder.build()
    }
}

pub fn add_demo_types(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder
        .add_class(POINT)
        .extends("java.lang.Object")
        .member(MemberSpec::field("x", "int"))
        .member(MemberSpec::field("y", "int"))
        .member(
            MemberSpec::field("ORIGIN_X", "int")
                .static_member()
                .final_field()
                .initial(Value::Int(0)),
        )
        .member(MemberSpec::constructor())
        .member(
            MemberSpec::constructor()
                .param("int")
                .param("int")
                .body(|args| Ok(point(POINT, args[0].clone(), args[1].clone()))),
        )
        .member(
            MemberSpec::method("origin")
                .static_member()
                .returns(POINT)
                .body(|_| Ok(point(POINT, Value::Int(0), Value::Int(0)))),
        )
        .member(
            MemberSpec::method("distanceTo")
                .param(POINT)
                .returns("int")
                .body(|args| {
                    let (ax, ay) = coords(&args[0])?;
                    let (bx, by) = coords(&args[1])?;
                    Ok(Value::Int((ax - bx).abs() + (ay - by).abs()))
                }),
        )
        .done()?;

    builder
        .add_class("demo.ColoredPoint")
        .extends(POINT)
        .member(
            MemberSpec::constructor()
                .body(|_| Ok(point("demo.ColoredPoint", Value::Int(0), Value::Int(0)))),
        )
        .member(
            MemberSpec::method("color")
                .returns("java.lang.String")
                .body(|_| Ok(Value::from("red"))),
        )
        .done()?;

    builder
        .add_class("demo.Outer")
        .member(MemberSpec::constructor())
        .done()?;

    builder
        .add_class("demo.Outer$Inner")
        .inner_of("demo.Outer")
        .member(MemberSpec::constructor().param("int"))
        .member(
            MemberSpec::method("outer")
                .returns("demo.Outer")
                .body(|args| {
                    let obj = args[0]
                        .as_object()
                        .ok_or_else(|| Throwable::null_pointer("receiver is null"))?;
                    let outer = obj.lock().field(ENCLOSING_FIELD).cloned();
                    Ok(outer.unwrap_or(Value::Null))
                }),
        )
        .done()?;

    builder
        .add_class("demo.Outer$Nested")
        .static_member_of("demo.Outer")
        .member(MemberSpec::constructor())
        .done()?;

    builder
        .add_class("demo.Faulty")
        .member(MemberSpec::constructor())
        .member(
            MemberSpec::method("checkPositive")
                .param("int")
                .returns("int")
                .throws(Throwable::ILLEGAL_ARGUMENT)
                .body(|args| match args[1].as_int() {
                    Some(n) if n > 0 => Ok(Value::Int(n)),
                    Some(n) => Err(Throwable::illegal_argument(format!("{} is not positive", n))),
                    None => Err(Throwable::illegal_argument("not an int")),
                }),
        )
        .member(
            MemberSpec::method("divide")
                .static_member()
                .param("int")
                .param("int")
                .returns("int")
                .body(|args| {
                    let a = args[0].as_int().unwrap_or(0);
                    let b = args[1].as_int().unwrap_or(0);
                    if b == 0 {
                        return Err(Throwable::new("java.lang.ArithmeticException", "/ by zero"));
                    }
                    Ok(Value::Int(a / b))
                }),
        )
        .member(MemberSpec::method("crash").body(|_| {
            panic!("internal invariant broken");
        }))
        .member(MemberSpec::method("spin").body(|_| loop {
            std::thread::sleep(Duration::from_millis(5));
        }))
        .done()?;

    Ok(())
}

fn point(class: &str, x: Value, y: Value) -> Value {
    let mut object = Object::record(TypeRef::class(class));
    if let ObjectState::Fields(fields) = &mut object.state {
        fields.insert("x".to_string(), x);
        fields.insert("y".to_string(), y);
    }
    Value::Object(ObjectRef::new(object))
}

fn coords(value: &Value) -> Result<(i64, i64), Throwable> {
    let obj = value
        .as_object()
        .ok_or_else(|| Throwable::null_pointer("point is null"))?;
    let guard = obj.lock();
    let x = guard.field("x").and_then(Value::as_int).unwrap_or(0);
    let y = guard.field("y").and_then(Value::as_int).unwrap_or(0);
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_registry_builds() {
        let registry = TypeRegistry::demo().unwrap();
        let colored = registry.resolve_type("demo.ColoredPoint").unwrap();
        let point = registry.resolve_type(POINT).unwrap();
        assert!(registry.is_assignable(&point, &colored));
        assert!(registry.resolve_type("demo.Outer$Inner").unwrap().is_inner_class());
        let nested = registry.resolve_type("demo.Outer$Nested").unwrap();
        assert!(nested.is_member_class() && !nested.is_inner_class());
    }

    #[test]
    fn test_static_field_starts_at_initial_value() {
        let registry = TypeRegistry::demo().unwrap();
        let point = registry.resolve_type(POINT).unwrap();
        let origin = registry.find_field(&point, "ORIGIN_X").unwrap();
        assert_eq!(origin.read_field(&Value::Null).unwrap(), Value::Int(0));
    }
}
