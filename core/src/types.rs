//! Static type references.
//!
//! A [`TypeRef`] names a declared type the way the target runtime does: by
//! its binary name (`pkg.Outer$Inner`). Descriptive flags such as
//! "interface" or "static member" ride along but never take part in
//! equality, so a type built from a bare name and the same type built from
//! runtime introspection compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Binary name of the root class.
pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// Binary name of the string class.
pub const JAVA_LANG_STRING: &str = "java.lang.String";

/// Primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    /// All primitive types, in declaration order.
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    /// The keyword naming this primitive.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Look up a primitive by keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Returns true for byte, short, int and long.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Int | PrimitiveType::Long
        )
    }

    /// Returns true for float and double.
    pub fn is_floating(&self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    /// Widening primitive conversion: can a value of `from` be used where
    /// `self` is expected without a cast?
    pub fn widens_from(&self, from: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if *self == from {
            return true;
        }
        match from {
            Byte => matches!(self, Short | Int | Long | Float | Double),
            Short | Char => matches!(self, Int | Long | Float | Double),
            Int => matches!(self, Long | Float | Double),
            Long => matches!(self, Float | Double),
            Float => matches!(self, Double),
            Boolean | Double => false,
        }
    }
}

/// Where a class is declared relative to other classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Nesting {
    /// A top-level class.
    #[default]
    TopLevel,
    /// A static member class: no enclosing instance.
    StaticMember,
    /// A non-static member class: constructors take the enclosing instance first.
    Inner,
}

/// A class or interface type, possibly instantiated with type arguments.
#[derive(Debug, Clone)]
pub struct ClassType {
    name: String,
    type_args: Vec<TypeRef>,
    interface: bool,
    nesting: Nesting,
}

impl ClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            interface: false,
            nesting: Nesting::TopLevel,
        }
    }

    pub fn interface(mut self) -> Self {
        self.interface = true;
        self
    }

    pub fn with_nesting(mut self, nesting: Nesting) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn with_type_args(mut self, args: Vec<TypeRef>) -> Self {
        self.type_args = args;
        self
    }

    /// Binary name (`pkg.Outer$Inner`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_args(&self) -> &[TypeRef] {
        &self.type_args
    }

    pub fn is_interface(&self) -> bool {
        self.interface
    }

    pub fn nesting(&self) -> Nesting {
        self.nesting
    }

    pub fn into_type(self) -> TypeRef {
        TypeRef::Class(Arc::new(self))
    }
}

/// A static type.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Void,
    Primitive(PrimitiveType),
    Class(Arc<ClassType>),
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// A top-level class type with default flags.
    pub fn class(name: impl Into<String>) -> Self {
        ClassType::new(name).into_type()
    }

    pub fn object() -> Self {
        Self::class(JAVA_LANG_OBJECT)
    }

    pub fn string() -> Self {
        Self::class(JAVA_LANG_STRING)
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// Build a type from its name alone: primitives, `void`, `T[]` arrays,
    /// otherwise a top-level class. Use a registry to get declared flags.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(element) = name.strip_suffix("[]") {
            return Self::from_name(element).map(Self::array_of);
        }
        if name == "void" {
            return Some(TypeRef::Void);
        }
        if let Some(p) = PrimitiveType::from_name(name) {
            return Some(TypeRef::Primitive(p));
        }
        if !is_binary_name(name) {
            return None;
        }
        Some(Self::class(name))
    }

    /// Qualified binary name, without type arguments.
    pub fn name(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Class(c) => c.name.clone(),
            TypeRef::Array(e) => format!("{}[]", e.name()),
        }
    }

    /// Name as written in generated source: nested types use `.`, type
    /// arguments are included.
    pub fn source_name(&self) -> String {
        match self {
            TypeRef::Class(c) => {
                let base = c.name.replace('$', ".");
                if c.type_args.is_empty() {
                    base
                } else {
                    let args: Vec<String> = c.type_args.iter().map(|t| t.source_name()).collect();
                    format!("{}<{}>", base, args.join(", "))
                }
            }
            TypeRef::Array(e) => format!("{}[]", e.source_name()),
            other => other.name(),
        }
    }

    /// Unqualified name (`Inner` for `pkg.Outer$Inner`).
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Class(c) => {
                let start = c.name.rfind(['.', '$']).map(|i| i + 1).unwrap_or(0);
                c.name[start..].to_string()
            }
            TypeRef::Array(e) => format!("{}[]", e.simple_name()),
            other => other.name(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Classes, interfaces and arrays.
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::Class(_) | TypeRef::Array(_))
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            TypeRef::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        self.as_class().is_some_and(|c| c.name == JAVA_LANG_OBJECT)
    }

    pub fn is_string(&self) -> bool {
        self.as_class().is_some_and(|c| c.name == JAVA_LANG_STRING)
    }

    pub fn is_interface(&self) -> bool {
        self.as_class().is_some_and(|c| c.interface)
    }

    /// Declared inside another class.
    pub fn is_member_class(&self) -> bool {
        self.as_class()
            .is_some_and(|c| c.nesting != Nesting::TopLevel)
    }

    /// A non-static member class, whose instances need an enclosing instance.
    pub fn is_inner_class(&self) -> bool {
        self.as_class().is_some_and(|c| c.nesting == Nesting::Inner)
    }

    /// Has type arguments.
    pub fn is_generic(&self) -> bool {
        self.as_class().is_some_and(|c| !c.type_args.is_empty())
    }

    /// The same type with type arguments erased.
    pub fn raw(&self) -> TypeRef {
        match self {
            TypeRef::Class(c) if !c.type_args.is_empty() => {
                let mut raw = (**c).clone();
                raw.type_args.clear();
                raw.into_type()
            }
            TypeRef::Array(e) => TypeRef::array_of(e.raw()),
            other => other.clone(),
        }
    }
}

fn is_binary_name(name: &str) -> bool {
    name.split('.').all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            }
            _ => false,
        }
    })
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Void, TypeRef::Void) => true,
            (TypeRef::Primitive(a), TypeRef::Primitive(b)) => a == b,
            (TypeRef::Class(a), TypeRef::Class(b)) => {
                Arc::ptr_eq(a, b) || (a.name == b.name && a.type_args == b.type_args)
            }
            (TypeRef::Array(a), TypeRef::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TypeRef::Void => {}
            TypeRef::Primitive(p) => p.hash(state),
            TypeRef::Class(c) => {
                c.name.hash(state);
                c.type_args.hash(state);
            }
            TypeRef::Array(e) => e.hash(state),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Ordered, immutable list of types: a signature's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeTuple(Arc<[TypeRef]>);

impl TypeTuple {
    pub fn new(types: Vec<TypeRef>) -> Self {
        Self(types.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TypeRef> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TypeRef] {
        &self.0
    }

    /// A new tuple with `first` in front.
    pub fn prepend(&self, first: TypeRef) -> Self {
        let mut types = Vec::with_capacity(self.len() + 1);
        types.push(first);
        types.extend(self.0.iter().cloned());
        Self::new(types)
    }

    /// Comma-separated raw names, as used by the canonical text form.
    pub fn raw_names(&self) -> String {
        self.0.iter().map(|t| t.raw().name()).collect::<Vec<_>>().join(",")
    }
}

impl From<Vec<TypeRef>> for TypeTuple {
    fn from(types: Vec<TypeRef>) -> Self {
        Self::new(types)
    }
}

impl fmt::Display for TypeTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, t) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, ")")
    }
}
