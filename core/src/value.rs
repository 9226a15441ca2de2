//! Runtime values and thrown failures.
//!
//! Values are what operations consume and produce when invoked against the
//! target runtime: scalars, strings, and shared references to object
//! instances. Object references compare by identity.

use crate::TypeRef;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value produced or consumed by an invocation.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null reference.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Character value.
    Char(char),
    /// Any integral value (byte, short, int, long).
    Int(i64),
    /// Any floating point value (float, double).
    Float(f64),
    /// String value.
    String(String),
    /// Reference to an object instance.
    Object(ObjectRef),
}

impl Value {
    /// Returns true if this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The zero value a field of type `ty` holds before assignment.
    pub fn default_for(ty: &TypeRef) -> Value {
        use crate::PrimitiveType::*;
        match ty.as_primitive() {
            Some(Boolean) => Value::Bool(false),
            Some(Char) => Value::Char('\0'),
            Some(Float) | Some(Double) => Value::Float(0.0),
            Some(_) => Value::Int(0),
            None => Value::Null,
        }
    }

    /// Short description of the runtime kind of this value.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::Int(_) => "integral".to_string(),
            Value::Float(_) => "floating".to_string(),
            Value::String(_) => crate::JAVA_LANG_STRING.to_string(),
            Value::Object(o) => o.class().name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "'{}'", c.escape_default()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:?}", fl),
            Value::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Value::Object(o) => write!(f, "{}", o),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

/// Instance state.
#[derive(Debug, Clone)]
pub enum ObjectState {
    /// Named fields.
    Fields(BTreeMap<String, Value>),
    /// Ordered elements (container instances).
    List(Vec<Value>),
}

/// An object instance of some runtime class.
#[derive(Debug, Clone)]
pub struct Object {
    pub class: TypeRef,
    pub state: ObjectState,
}

impl Object {
    /// An instance with no fields set.
    pub fn record(class: TypeRef) -> Self {
        Self {
            class,
            state: ObjectState::Fields(BTreeMap::new()),
        }
    }

    /// An empty container instance.
    pub fn list(class: TypeRef) -> Self {
        Self {
            class,
            state: ObjectState::List(Vec::new()),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self.state {
            ObjectState::Fields(fields) => fields.get(name),
            ObjectState::List(_) => None,
        }
    }

    pub fn elements(&self) -> Option<&[Value]> {
        match &self.state {
            ObjectState::List(items) => Some(items),
            ObjectState::Fields(_) => None,
        }
    }
}

/// Shared, identity-compared handle to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Arc<Mutex<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Arc::new(Mutex::new(object)))
    }

    /// Runtime class of the instance.
    pub fn class(&self) -> TypeRef {
        self.0.lock().class.clone()
    }

    /// Lock the instance for reading or mutation.
    pub fn lock(&self) -> MutexGuard<'_, Object> {
        self.0.lock()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:#x})", self.addr())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_lock: a runaway invocation may still hold the instance
        match self.0.try_lock() {
            Some(obj) => write!(f, "{}@{:x}", obj.class.simple_name(), self.addr() & 0xffff),
            None => write!(f, "<locked>@{:x}", self.addr() & 0xffff),
        }
    }
}

/// Failure raised by an invoked member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throwable {
    /// Binary name of the thrown class.
    pub class: String,
    pub message: String,
}

impl Throwable {
    pub const NULL_POINTER: &'static str = "java.lang.NullPointerException";
    pub const ILLEGAL_ARGUMENT: &'static str = "java.lang.IllegalArgumentException";
    pub const ILLEGAL_STATE: &'static str = "java.lang.IllegalStateException";
    pub const INDEX_OUT_OF_BOUNDS: &'static str = "java.lang.IndexOutOfBoundsException";
    pub const ERROR: &'static str = "java.lang.Error";

    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }

    pub fn null_pointer(message: impl Into<String>) -> Self {
        Self::new(Self::NULL_POINTER, message)
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(Self::ILLEGAL_ARGUMENT, message)
    }

    pub fn index_out_of_bounds(index: i64, size: usize) -> Self {
        Self::new(
            Self::INDEX_OUT_OF_BOUNDS,
            format!("Index {} out of bounds for length {}", index, size),
        )
    }

    /// An internal error of the invoked code.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Self::ERROR, message)
    }

    pub fn is(&self, class: &str) -> bool {
        self.class == class
    }

    /// Simple class name, for generated catch clauses.
    pub fn simple_class(&self) -> &str {
        self.class.rsplit(['.', '$']).next().unwrap_or(&self.class)
    }
}

impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.class)
        } else {
            write!(f, "{}: {}", self.class, self.message)
        }
    }
}

impl std::error::Error for Throwable {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitiveType;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Char('a').as_int(), Some(97));
        assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = ObjectRef::new(Object::list(TypeRef::class("java.util.ArrayList")));
        let b = ObjectRef::new(Object::list(TypeRef::class("java.util.ArrayList")));
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_default_for() {
        assert_eq!(Value::default_for(&TypeRef::Primitive(PrimitiveType::Int)), Value::Int(0));
        assert_eq!(
            Value::default_for(&TypeRef::Primitive(PrimitiveType::Boolean)),
            Value::Bool(false)
        );
        assert_eq!(Value::default_for(&TypeRef::string()), Value::Null);
    }

    #[test]
    fn test_throwable_display() {
        let t = Throwable::null_pointer("receiver was null");
        assert_eq!(t.to_string(), "java.lang.NullPointerException: receiver was null");
        assert_eq!(t.simple_class(), "NullPointerException");
        assert!(t.is(Throwable::NULL_POINTER));
    }
}
