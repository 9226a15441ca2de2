//! Declared types and members of the target runtime.

use opseq_core::{Throwable, TypeRef, TypeTuple, Value};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Dynamic invocation backend for a constructor or method.
///
/// For instance methods the receiver is `args[0]`. Constructors of inner
/// classes get the enclosing instance as `args[0]`.
pub trait Invocable: Send + Sync {
    fn invoke(&self, args: &[Value]) -> Result<Value, Throwable>;
}

impl<F> Invocable for F
where
    F: Fn(&[Value]) -> Result<Value, Throwable> + Send + Sync,
{
    fn invoke(&self, args: &[Value]) -> Result<Value, Throwable> {
        self(args)
    }
}

/// Index of a member within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Method,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

/// Identity of a member: what two handles to the same member share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub declaring: TypeRef,
    pub kind: MemberKind,
    pub name: String,
    pub params: TypeTuple,
}

pub(crate) enum MemberBody {
    Callable(Arc<dyn Invocable>),
    InstanceField,
    StaticField(Mutex<Value>),
}

/// A constructor, method or field of a declared type.
pub struct MemberDef {
    pub id: MemberId,
    pub key: MemberKey,
    /// Result type: the declaring type for constructors, the field type for fields.
    pub returns: TypeRef,
    pub is_static: bool,
    pub is_final: bool,
    pub visibility: Visibility,
    /// Binary names of exceptions this member documents.
    pub throws: Vec<String>,
    pub(crate) body: MemberBody,
}

impl MemberDef {
    pub fn declaring(&self) -> &TypeRef {
        &self.key.declaring
    }

    pub fn kind(&self) -> MemberKind {
        self.key.kind
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Declared parameters. Inner-class constructors list the enclosing type first.
    pub fn params(&self) -> &TypeTuple {
        &self.key.params
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn declares(&self, exception_class: &str) -> bool {
        self.throws.iter().any(|t| t == exception_class)
    }

    /// Signature text: `T.<init>(A,B)`, `T.m(A)` or `T.f` for fields.
    pub fn signature(&self) -> String {
        let owner = self.declaring().name();
        match self.kind() {
            MemberKind::Constructor => format!("{}.<init>({})", owner, self.params().raw_names()),
            MemberKind::Method => {
                format!("{}.{}({})", owner, self.name(), self.params().raw_names())
            }
            MemberKind::Field => format!("{}.{}", owner, self.name()),
        }
    }

    /// Invoke a constructor or method.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, Throwable> {
        match &self.body {
            MemberBody::Callable(f) => f.invoke(args),
            _ => Err(Throwable::error(format!("{} is not callable", self.signature()))),
        }
    }

    /// Read a field; `receiver` is ignored for static fields.
    pub fn read_field(&self, receiver: &Value) -> Result<Value, Throwable> {
        match &self.body {
            MemberBody::StaticField(slot) => Ok(slot.lock().clone()),
            MemberBody::InstanceField => {
                let obj = self.instance(receiver)?;
                let guard = obj.lock();
                Ok(guard
                    .field(self.name())
                    .cloned()
                    .unwrap_or_else(|| Value::default_for(&self.returns)))
            }
            MemberBody::Callable(_) => {
                Err(Throwable::error(format!("{} is not a field", self.signature())))
            }
        }
    }

    /// Assign a field; `receiver` is ignored for static fields.
    pub fn write_field(&self, receiver: &Value, value: Value) -> Result<(), Throwable> {
        match &self.body {
            MemberBody::StaticField(slot) => {
                *slot.lock() = value;
                Ok(())
            }
            MemberBody::InstanceField => {
                let obj = self.instance(receiver)?;
                let mut guard = obj.lock();
                match &mut guard.state {
                    opseq_core::ObjectState::Fields(fields) => {
                        fields.insert(self.name().to_string(), value);
                        Ok(())
                    }
                    opseq_core::ObjectState::List(_) => Err(Throwable::error(format!(
                        "instance of {} has no field {}",
                        guard.class,
                        self.name()
                    ))),
                }
            }
            MemberBody::Callable(_) => {
                Err(Throwable::error(format!("{} is not a field", self.signature())))
            }
        }
    }

    fn instance<'v>(&self, receiver: &'v Value) -> Result<&'v opseq_core::ObjectRef, Throwable> {
        match receiver {
            Value::Object(obj) => Ok(obj),
            Value::Null => Err(Throwable::null_pointer(format!(
                "cannot access field {} of null",
                self.name()
            ))),
            other => Err(Throwable::illegal_argument(format!(
                "{} is not an instance of {}",
                other.kind_name(),
                self.declaring()
            ))),
        }
    }
}

impl PartialEq for MemberDef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MemberDef {}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDef")
            .field("id", &self.id)
            .field("signature", &self.signature())
            .field("returns", &self.returns)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// A declared class or interface.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// The type, carrying its declared flags.
    pub ty: TypeRef,
    /// Direct supertypes (superclass and interfaces).
    pub supertypes: Vec<TypeRef>,
    /// Enclosing type for member classes.
    pub enclosing: Option<TypeRef>,
    pub is_abstract: bool,
    /// Declared members, in declaration order.
    pub members: Vec<MemberId>,
}

impl TypeDef {
    pub fn name(&self) -> String {
        self.ty.name()
    }

    /// Whether instances can be created through constructors.
    pub fn is_instantiable(&self) -> bool {
        !self.is_abstract && !self.ty.is_interface()
    }
}

/// Declarative description of a member, resolved when the registry is built.
pub struct MemberSpec {
    pub(crate) kind: MemberKind,
    pub(crate) name: String,
    pub(crate) params: Vec<String>,
    pub(crate) returns: Option<String>,
    pub(crate) is_static: bool,
    pub(crate) is_final: bool,
    pub(crate) visibility: Visibility,
    pub(crate) throws: Vec<String>,
    pub(crate) body: Option<Arc<dyn Invocable>>,
    pub(crate) initial: Option<Value>,
}

impl MemberSpec {
    fn of(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            params: Vec::new(),
            returns: None,
            is_static: false,
            is_final: false,
            visibility: Visibility::Public,
            throws: Vec::new(),
            body: None,
            initial: None,
        }
    }

    /// A constructor. Without a body it creates an instance with unset fields.
    pub fn constructor() -> Self {
        Self::of(MemberKind::Constructor, "<init>")
    }

    /// A method returning `void` unless [`MemberSpec::returns`] says otherwise.
    pub fn method(name: impl Into<String>) -> Self {
        Self::of(MemberKind::Method, name)
    }

    pub fn field(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let mut spec = Self::of(MemberKind::Field, name);
        spec.returns = Some(type_name.into());
        spec
    }

    pub fn param(mut self, type_name: impl Into<String>) -> Self {
        self.params.push(type_name.into());
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = Some(type_name.into());
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn final_field(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn throws(mut self, exception_class: impl Into<String>) -> Self {
        self.throws.push(exception_class.into());
        self
    }

    pub fn body<F>(self, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Throwable> + Send + Sync + 'static,
    {
        self.backend(Arc::new(body))
    }

    /// Use an existing invocation backend.
    pub fn backend(mut self, backend: Arc<dyn Invocable>) -> Self {
        self.body = Some(backend);
        self
    }

    /// Initial value of a static field.
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }
}
