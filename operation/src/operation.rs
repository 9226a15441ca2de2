//! The Operation type: one callable unit of the target library.

use crate::error::{OperationError, OperationResult};
use crate::literal;
use opseq_core::{TypeRef, TypeTuple, Value};
use opseq_registry::{MemberDef, MemberKind};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Which kind of callable unit an operation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ConstructorCall,
    MethodCall,
    FieldGetter,
    FieldSetter,
    /// A primitive, string or null constant.
    Literal,
}

#[derive(Debug, Clone)]
pub(crate) enum Callable {
    Member(Arc<MemberDef>),
    Literal(Value),
}

pub(crate) struct OperationInner {
    pub(crate) kind: OperationKind,
    pub(crate) callable: Callable,
    pub(crate) declaring: TypeRef,
    pub(crate) inputs: TypeTuple,
    pub(crate) output: TypeRef,
    hash: u64,
}

/// An immutable, typed, invocable unit: `declaring : inputs -> output`.
///
/// Cheap to clone. Two operations are equal iff they wrap the same
/// underlying member (or are the same literal).
#[derive(Clone)]
pub struct Operation {
    pub(crate) inner: Arc<OperationInner>,
}

impl Operation {
    fn new(
        kind: OperationKind,
        callable: Callable,
        declaring: TypeRef,
        inputs: TypeTuple,
        output: TypeRef,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        match &callable {
            Callable::Member(m) => m.key.hash(&mut hasher),
            Callable::Literal(v) => {
                declaring.hash(&mut hasher);
                literal::source_text(&declaring, v).hash(&mut hasher);
            }
        }
        let hash = hasher.finish();
        Self {
            inner: Arc::new(OperationInner {
                kind,
                callable,
                declaring,
                inputs,
                output,
                hash,
            }),
        }
    }

    /// A call to a constructor.
    pub fn constructor(member: Arc<MemberDef>) -> OperationResult<Self> {
        expect_kind(&member, MemberKind::Constructor)?;
        if member.declaring().is_inner_class() && member.params().is_empty() {
            return Err(OperationError::MissingEnclosingParameter(member.signature()));
        }
        let declaring = member.declaring().clone();
        let inputs = member.params().clone();
        let output = member.returns.clone();
        Ok(Self::new(
            OperationKind::ConstructorCall,
            Callable::Member(member),
            declaring,
            inputs,
            output,
        ))
    }

    /// A call to a static or instance method. Instance methods take the
    /// receiver as their first input.
    pub fn method(member: Arc<MemberDef>) -> OperationResult<Self> {
        expect_kind(&member, MemberKind::Method)?;
        let declaring = member.declaring().clone();
        let inputs = receiver_and(&member, member.params().clone());
        let output = member.returns.clone();
        Ok(Self::new(
            OperationKind::MethodCall,
            Callable::Member(member),
            declaring,
            inputs,
            output,
        ))
    }

    /// Read of a field.
    pub fn field_getter(member: Arc<MemberDef>) -> OperationResult<Self> {
        expect_kind(&member, MemberKind::Field)?;
        let declaring = member.declaring().clone();
        let inputs = receiver_and(&member, TypeTuple::empty());
        let output = member.returns.clone();
        Ok(Self::new(
            OperationKind::FieldGetter,
            Callable::Member(member),
            declaring,
            inputs,
            output,
        ))
    }

    /// Assignment to a non-final field.
    pub fn field_setter(member: Arc<MemberDef>) -> OperationResult<Self> {
        expect_kind(&member, MemberKind::Field)?;
        if member.is_final {
            return Err(OperationError::FinalField(member.signature()));
        }
        let declaring = member.declaring().clone();
        let inputs = receiver_and(&member, TypeTuple::new(vec![member.returns.clone()]));
        Ok(Self::new(
            OperationKind::FieldSetter,
            Callable::Member(member),
            declaring,
            inputs,
            TypeRef::Void,
        ))
    }

    /// The natural operation for a member: constructor call, method call or
    /// field read.
    pub fn for_member(member: Arc<MemberDef>) -> OperationResult<Self> {
        match member.kind() {
            MemberKind::Constructor => Self::constructor(member),
            MemberKind::Method => Self::method(member),
            MemberKind::Field => Self::field_getter(member),
        }
    }

    /// A constant of type `ty`.
    pub fn literal(ty: TypeRef, value: Value) -> OperationResult<Self> {
        if !literal::fits(&ty, &value) {
            return Err(OperationError::LiteralTypeMismatch {
                type_name: ty.name(),
                value: value.to_string(),
            });
        }
        Ok(Self::new(
            OperationKind::Literal,
            Callable::Literal(value),
            ty.clone(),
            TypeTuple::empty(),
            ty,
        ))
    }

    /// The null constant of a reference type.
    pub fn null_of(ty: TypeRef) -> OperationResult<Self> {
        Self::literal(ty, Value::Null)
    }

    pub fn kind(&self) -> OperationKind {
        self.inner.kind
    }

    pub fn declaring_type(&self) -> &TypeRef {
        &self.inner.declaring
    }

    pub fn input_types(&self) -> &TypeTuple {
        &self.inner.inputs
    }

    pub fn output_type(&self) -> &TypeRef {
        &self.inner.output
    }

    pub fn arity(&self) -> usize {
        self.inner.inputs.len()
    }

    /// The underlying member; `None` for literals.
    pub fn member(&self) -> Option<&Arc<MemberDef>> {
        match &self.inner.callable {
            Callable::Member(m) => Some(m),
            Callable::Literal(_) => None,
        }
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match &self.inner.callable {
            Callable::Literal(v) => Some(v),
            Callable::Member(_) => None,
        }
    }

    /// Member name: `<init>` for constructors, `<get>`/`<set>` for field
    /// accesses, the method name otherwise.
    pub fn name(&self) -> &str {
        match self.kind() {
            OperationKind::ConstructorCall => "<init>",
            OperationKind::FieldGetter => "<get>",
            OperationKind::FieldSetter => "<set>",
            OperationKind::Literal => "<literal>",
            OperationKind::MethodCall => self.member().map(|m| m.name()).unwrap_or_default(),
        }
    }

    pub fn is_constructor_call(&self) -> bool {
        self.kind() == OperationKind::ConstructorCall
    }

    pub fn is_literal(&self) -> bool {
        self.kind() == OperationKind::Literal
    }

    /// Static methods and static field accesses.
    pub fn is_static(&self) -> bool {
        self.member().is_some_and(|m| {
            m.kind() != MemberKind::Constructor && m.is_static
        })
    }

    /// Instance methods and instance field accesses take a receiver first.
    pub fn has_receiver(&self) -> bool {
        matches!(
            self.kind(),
            OperationKind::MethodCall | OperationKind::FieldGetter | OperationKind::FieldSetter
        ) && !self.is_static()
    }

    /// Constructor of a non-static member class: input 0 is the enclosing instance.
    pub fn takes_enclosing_instance(&self) -> bool {
        self.is_constructor_call() && self.inner.declaring.is_inner_class()
    }

    /// Text substituted for a variable produced by this operation, so the
    /// producing statement need not appear in generated code.
    pub fn short_form(&self) -> Option<String> {
        self.literal_value()
            .map(|v| literal::source_text(&self.inner.declaring, v))
    }

    /// The cached hash.
    pub fn hash_code(&self) -> u64 {
        self.inner.hash
    }
}

fn expect_kind(member: &MemberDef, kind: MemberKind) -> OperationResult<()> {
    if member.kind() == kind {
        Ok(())
    } else {
        Err(OperationError::WrongMemberKind {
            member: member.signature(),
            expected: kind,
        })
    }
}

fn receiver_and(member: &MemberDef, rest: TypeTuple) -> TypeTuple {
    if member.is_static {
        rest
    } else {
        rest.prepend(member.declaring().clone())
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        if self.inner.hash != other.inner.hash || self.inner.kind != other.inner.kind {
            return false;
        }
        match (&self.inner.callable, &other.inner.callable) {
            (Callable::Member(a), Callable::Member(b)) => a.key == b.key,
            (Callable::Literal(a), Callable::Literal(b)) => {
                self.inner.declaring == other.inner.declaring && a == b
            }
            _ => false,
        }
    }
}

impl Eq for Operation {}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_parsable_text())
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operation({} : {} -> {})",
            self.to_parsable_text(),
            self.inner.inputs,
            self.inner.output
        )
    }
}
