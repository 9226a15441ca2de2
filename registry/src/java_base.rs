//! A small in-process model of the `java.lang` / `java.util` classes.
//!
//! Enough of the platform library to drive generation end to end: the root
//! class, strings, a string builder and two list implementations.

use crate::{MemberSpec, RegistryBuilder, RegistryError, TypeRegistry};
use opseq_core::{Object, ObjectRef, ObjectState, Throwable, TypeRef, Value};

const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";
const STRING_BUILDER: &str = "java.lang.StringBuilder";
const COLLECTION: &str = "java.util.Collection";
const LIST: &str = "java.util.List";
const ARRAY_LIST: &str = "java.util.ArrayList";
const LINKED_LIST: &str = "java.util.LinkedList";
const NO_SUCH_ELEMENT: &str = "java.util.NoSuchElementException";

impl TypeRegistry {
    /// A registry holding only the platform model.
    pub fn java_base() -> Result<TypeRegistry, RegistryError> {
        let mut builder = RegistryBuilder::new();
        add_java_base(&mut builder)?;
        builder.build()
    }
}

/// Register the platform model with `builder`.
pub fn add_java_base(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder
        .add_class(OBJECT)
        .member(MemberSpec::constructor())
        .member(
            MemberSpec::method("equals")
                .param(OBJECT)
                .returns("boolean")
                .body(|args| Ok(Value::Bool(args[0] == args[1]))),
        )
        .done()?;

    builder
        .add_class(STRING)
        .extends(OBJECT)
        .member(MemberSpec::constructor().body(|_| Ok(Value::from(""))))
        .member(
            MemberSpec::constructor()
                .param(STRING)
                .throws(Throwable::NULL_POINTER)
                .body(|args| match &args[0] {
                    Value::String(s) => Ok(Value::String(s.clone())),
                    _ => Err(Throwable::null_pointer("original is null")),
                }),
        )
        .member(
            MemberSpec::method("length")
                .returns("int")
                .body(|args| string_receiver(args).map(|s| Value::Int(s.chars().count() as i64))),
        )
        .member(
            MemberSpec::method("isEmpty")
                .returns("boolean")
                .body(|args| string_receiver(args).map(|s| Value::Bool(s.is_empty()))),
        )
        .member(
            MemberSpec::method("charAt")
                .param("int")
                .returns("char")
                .throws(Throwable::INDEX_OUT_OF_BOUNDS)
                .body(|args| {
                    let s = string_receiver(args)?;
                    let index = args[1].as_int().unwrap_or(-1);
                    let len = s.chars().count();
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| s.chars().nth(i))
                        .map(Value::Char)
                        .ok_or_else(|| Throwable::index_out_of_bounds(index, len))
                }),
        )
        .member(
            MemberSpec::method("concat")
                .param(STRING)
                .returns(STRING)
                .body(|args| {
                    let s = string_receiver(args)?;
                    match &args[1] {
                        Value::String(other) => Ok(Value::String(format!("{}{}", s, other))),
                        _ => Err(Throwable::null_pointer("argument is null")),
                    }
                }),
        )
        .done()?;

    builder
        .add_class(STRING_BUILDER)
        .extends(OBJECT)
        .member(MemberSpec::constructor().body(|_| Ok(new_builder(String::new()))))
        .member(
            MemberSpec::constructor()
                .param(STRING)
                .throws(Throwable::NULL_POINTER)
                .body(|args| match &args[0] {
                    Value::String(s) => Ok(new_builder(s.clone())),
                    _ => Err(Throwable::null_pointer("str is null")),
                }),
        )
        .member(
            MemberSpec::method("append")
                .param(STRING)
                .returns(STRING_BUILDER)
                .body(|args| {
                    let suffix = args[1].as_str().unwrap_or("null").to_string();
                    with_builder(&args[0], |buf| buf.push_str(&suffix))?;
                    Ok(args[0].clone())
                }),
        )
        .member(
            MemberSpec::method("reverse")
                .returns(STRING_BUILDER)
                .body(|args| {
                    with_builder(&args[0], |buf| *buf = buf.chars().rev().collect())?;
                    Ok(args[0].clone())
                }),
        )
        .member(
            MemberSpec::method("length")
                .returns("int")
                .body(|args| with_builder(&args[0], |buf| Value::Int(buf.chars().count() as i64))),
        )
        .member(
            MemberSpec::method("toString")
                .returns(STRING)
                .body(|args| with_builder(&args[0], |buf| Value::String(buf.clone()))),
        )
        .done()?;

    builder.add_interface(COLLECTION).done()?;
    builder.add_interface(LIST).extends(COLLECTION).done()?;

    let array_list = builder
        .add_class(ARRAY_LIST)
        .extends(OBJECT)
        .implements(LIST)
        .member(MemberSpec::constructor().body(|_| Ok(new_list(ARRAY_LIST, Vec::new()))))
        .member(
            MemberSpec::constructor()
                .param("int")
                .throws(Throwable::ILLEGAL_ARGUMENT)
                .body(|args| {
                    let capacity = args[0].as_int().unwrap_or(0);
                    if capacity < 0 {
                        return Err(Throwable::illegal_argument(format!(
                            "Illegal Capacity: {}",
                            capacity
                        )));
                    }
                    Ok(new_list(ARRAY_LIST, Vec::with_capacity(capacity.min(1024) as usize)))
                }),
        )
        .member(
            MemberSpec::constructor()
                .param(COLLECTION)
                .throws(Throwable::NULL_POINTER)
                .body(|args| {
                    let items = with_list(&args[0], |items| items.clone())?;
                    Ok(new_list(ARRAY_LIST, items))
                }),
        );
    add_list_methods(array_list)
        .member(
            MemberSpec::method("get")
                .param("int")
                .returns(OBJECT)
                .throws(Throwable::INDEX_OUT_OF_BOUNDS)
                .body(|args| {
                    let index = args[1].as_int().unwrap_or(-1);
                    with_list(&args[0], |items| {
                        usize::try_from(index)
                            .ok()
                            .and_then(|i| items.get(i).cloned())
                            .ok_or_else(|| Throwable::index_out_of_bounds(index, items.len()))
                    })?
                }),
        )
        .member(
            MemberSpec::method("remove")
                .param("int")
                .returns(OBJECT)
                .throws(Throwable::INDEX_OUT_OF_BOUNDS)
                .body(|args| {
                    let index = args[1].as_int().unwrap_or(-1);
                    with_list(&args[0], |items| match usize::try_from(index) {
                        Ok(i) if i < items.len() => Ok(items.remove(i)),
                        _ => Err(Throwable::index_out_of_bounds(index, items.len())),
                    })?
                }),
        )
        .done()?;

    let linked_list = builder
        .add_class(LINKED_LIST)
        .extends(OBJECT)
        .implements(LIST)
        .member(MemberSpec::constructor().body(|_| Ok(new_list(LINKED_LIST, Vec::new()))));
    add_list_methods(linked_list)
        .member(
            MemberSpec::method("addFirst")
                .param(OBJECT)
                .body(|args| {
                    let item = args[1].clone();
                    with_list(&args[0], |items| items.insert(0, item))?;
                    Ok(Value::Null)
                }),
        )
        .member(
            MemberSpec::method("getFirst")
                .returns(OBJECT)
                .throws(NO_SUCH_ELEMENT)
                .body(|args| {
                    with_list(&args[0], |items| items.first().cloned())?
                        .ok_or_else(|| Throwable::new(NO_SUCH_ELEMENT, ""))
                }),
        )
        .member(
            MemberSpec::method("removeFirst")
                .returns(OBJECT)
                .throws(NO_SUCH_ELEMENT)
                .body(|args| {
                    with_list(&args[0], |items| {
                        if items.is_empty() {
                            None
                        } else {
                            Some(items.remove(0))
                        }
                    })?
                    .ok_or_else(|| Throwable::new(NO_SUCH_ELEMENT, ""))
                }),
        )
        .done()?;

    Ok(())
}

fn add_list_methods(class: crate::ClassBuilder<'_>) -> crate::ClassBuilder<'_> {
    class
        .member(
            MemberSpec::method("add")
                .param(OBJECT)
                .returns("boolean")
                .body(|args| {
                    let item = args[1].clone();
                    with_list(&args[0], |items| items.push(item))?;
                    Ok(Value::Bool(true))
                }),
        )
        .member(
            MemberSpec::method("size")
                .returns("int")
                .body(|args| with_list(&args[0], |items| Value::Int(items.len() as i64))),
        )
        .member(
            MemberSpec::method("isEmpty")
                .returns("boolean")
                .body(|args| with_list(&args[0], |items| Value::Bool(items.is_empty()))),
        )
        .member(
            MemberSpec::method("contains")
                .param(OBJECT)
                .returns("boolean")
                .body(|args| {
                    let needle = args[1].clone();
                    with_list(&args[0], |items| Value::Bool(items.contains(&needle)))
                }),
        )
        .member(
            MemberSpec::method("clear").body(|args| {
                with_list(&args[0], |items| items.clear())?;
                Ok(Value::Null)
            }),
        )
}

fn string_receiver(args: &[Value]) -> Result<&str, Throwable> {
    match args.first() {
        Some(Value::String(s)) => Ok(s),
        _ => Err(Throwable::null_pointer("receiver is not a string")),
    }
}

fn new_list(class: &str, items: Vec<Value>) -> Value {
    Value::Object(ObjectRef::new(Object {
        class: TypeRef::class(class),
        state: ObjectState::List(items),
    }))
}

fn new_builder(initial: String) -> Value {
    let mut object = Object::record(TypeRef::class(STRING_BUILDER));
    if let ObjectState::Fields(fields) = &mut object.state {
        fields.insert("value".to_string(), Value::String(initial));
    }
    Value::Object(ObjectRef::new(object))
}

/// Run `f` on the elements of a list instance.
fn with_list<R>(target: &Value, f: impl FnOnce(&mut Vec<Value>) -> R) -> Result<R, Throwable> {
    match target {
        Value::Object(obj) => {
            let mut guard = obj.lock();
            match &mut guard.state {
                ObjectState::List(items) => Ok(f(items)),
                ObjectState::Fields(_) => Err(Throwable::new(
                    "java.lang.ClassCastException",
                    format!("{} is not a collection", guard.class),
                )),
            }
        }
        Value::Null => Err(Throwable::null_pointer("collection is null")),
        other => Err(Throwable::new(
            "java.lang.ClassCastException",
            format!("{} is not a collection", other.kind_name()),
        )),
    }
}

/// Run `f` on the character buffer of a string builder.
fn with_builder<R>(target: &Value, f: impl FnOnce(&mut String) -> R) -> Result<R, Throwable> {
    let obj = target
        .as_object()
        .ok_or_else(|| Throwable::null_pointer("builder is null"))?;
    let mut guard = obj.lock();
    match &mut guard.state {
        ObjectState::Fields(fields) => match fields.get_mut("value") {
            Some(Value::String(buf)) => Ok(f(buf)),
            _ => Err(Throwable::error("corrupt StringBuilder state")),
        },
        ObjectState::List(_) => Err(Throwable::error("corrupt StringBuilder state")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemberKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_java_base_resolves() {
        let registry = TypeRegistry::java_base().unwrap();
        let list = registry.resolve_type(ARRAY_LIST).unwrap();
        let collection = registry.resolve_type(COLLECTION).unwrap();
        assert!(collection.is_interface());
        assert!(registry.is_subtype(&list, &collection));
        assert!(registry.is_assignable(&TypeRef::object(), &list));
        assert!(!registry.is_assignable(&list, &TypeRef::object()));
        assert!(!registry.is_assignable(&TypeRef::object(), &TypeRef::Primitive(opseq_core::PrimitiveType::Int)));
    }

    #[test]
    fn test_array_list_behaviour() {
        let registry = TypeRegistry::java_base().unwrap();
        let list_ty = registry.resolve_type(ARRAY_LIST).unwrap();
        let ctor = registry.find_member(&list_ty, MemberKind::Constructor, "<init>", &[]).unwrap();
        let add = registry
            .find_member(&list_ty, MemberKind::Method, "add", &[TypeRef::object()])
            .unwrap();
        let get = registry
            .find_member(&list_ty, MemberKind::Method, "get", &[TypeRef::Primitive(opseq_core::PrimitiveType::Int)])
            .unwrap();

        let list = ctor.invoke(&[]).unwrap();
        assert_eq!(add.invoke(&[list.clone(), Value::from("x")]).unwrap(), Value::Bool(true));
        assert_eq!(get.invoke(&[list.clone(), Value::Int(0)]).unwrap(), Value::from("x"));
        let err = get.invoke(&[list, Value::Int(3)]).unwrap_err();
        assert!(err.is(Throwable::INDEX_OUT_OF_BOUNDS));
        assert!(get.declares(Throwable::INDEX_OUT_OF_BOUNDS));
    }

    #[test]
    fn test_negative_capacity_is_illegal_argument() {
        let registry = TypeRegistry::java_base().unwrap();
        let list_ty = registry.resolve_type(ARRAY_LIST).unwrap();
        let ctor = registry
            .find_member(&list_ty, MemberKind::Constructor, "<init>", &[TypeRef::Primitive(opseq_core::PrimitiveType::Int)])
            .unwrap();
        let err = ctor.invoke(&[Value::Int(-1)]).unwrap_err();
        assert_eq!(err.to_string(), "java.lang.IllegalArgumentException: Illegal Capacity: -1");
    }
}
