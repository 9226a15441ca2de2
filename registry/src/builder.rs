//! RegistryBuilder for constructing an immutable TypeRegistry.

use crate::types::MemberBody;
use crate::{Invocable, MemberDef, MemberId, MemberKey, MemberKind, MemberSpec, TypeDef, TypeRegistry};
use opseq_core::{ClassType, Nesting, Object, ObjectRef, Throwable, TypeRef, TypeTuple, Value};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Field an inner-class instance uses to hold its enclosing instance.
pub const ENCLOSING_FIELD: &str = "this$0";

/// Errors that can occur during registry construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Invalid type name: {0}")]
    InvalidTypeName(String),

    #[error("Unknown type `{name}` in {context}")]
    UnknownType { name: String, context: String },

    #[error("Inheritance cycle detected involving type: {0}")]
    InheritanceCycle(String),

    #[error("Duplicate member: {0}")]
    DuplicateMember(String),

    #[error("Method has no body: {0}")]
    MissingBody(String),

    #[error("Invalid member {member}: {reason}")]
    InvalidMember { member: String, reason: String },
}

struct PendingClass {
    name: String,
    interface: bool,
    nesting: Nesting,
    enclosing: Option<String>,
    supertypes: Vec<String>,
    is_abstract: bool,
    members: Vec<MemberSpec>,
}

/// Builder for constructing an immutable TypeRegistry.
#[derive(Default)]
pub struct RegistryBuilder {
    classes: Vec<PendingClass>,
    names: HashSet<String>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class definition.
    pub fn add_class(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name.into(), false)
    }

    /// Add an interface definition.
    pub fn add_interface(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name.into(), true)
    }

    /// Build the immutable TypeRegistry.
    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        // Declared types first, so member signatures can reference any of them
        let mut declared: HashMap<String, TypeRef> = HashMap::new();
        for class in &self.classes {
            let mut ct = ClassType::new(class.name.clone()).with_nesting(class.nesting);
            if class.interface {
                ct = ct.interface();
            }
            declared.insert(class.name.clone(), ct.into_type());
        }

        let resolve = |name: &str, context: &str| -> Result<TypeRef, RegistryError> {
            resolve_name(&declared, name).ok_or_else(|| RegistryError::UnknownType {
                name: name.to_string(),
                context: context.to_string(),
            })
        };

        let mut types = HashMap::new();
        let mut type_order = Vec::new();
        let mut members: Vec<Arc<MemberDef>> = Vec::new();
        let mut keys: HashSet<MemberKey> = HashSet::new();

        for class in self.classes {
            let ty = declared[&class.name].clone();
            let context = format!("type {}", class.name);

            let supertypes = class
                .supertypes
                .iter()
                .map(|s| resolve(s, &context))
                .collect::<Result<Vec<_>, _>>()?;
            let enclosing = class
                .enclosing
                .as_deref()
                .map(|e| resolve(e, &context))
                .transpose()?;

            let mut member_ids = Vec::new();
            for spec in class.members {
                let def = build_member(
                    spec,
                    MemberId(members.len() as u32),
                    &ty,
                    enclosing.as_ref(),
                    &resolve,
                )?;
                if !keys.insert(def.key.clone()) {
                    return Err(RegistryError::DuplicateMember(def.signature()));
                }
                member_ids.push(def.id);
                members.push(Arc::new(def));
            }

            type_order.push(class.name.clone());
            types.insert(
                class.name,
                TypeDef {
                    ty,
                    supertypes,
                    enclosing,
                    is_abstract: class.is_abstract,
                    members: member_ids,
                },
            );
        }

        check_acyclic(&types)?;

        Ok(TypeRegistry::new(types, type_order, members))
    }
}

fn resolve_name(declared: &HashMap<String, TypeRef>, name: &str) -> Option<TypeRef> {
    let name = name.trim();
    if let Some(element) = name.strip_suffix("[]") {
        return resolve_name(declared, element).map(TypeRef::array_of);
    }
    if let Some(ty) = declared.get(name) {
        return Some(ty.clone());
    }
    TypeRef::from_name(name).filter(|t| !t.is_reference())
}

fn build_member(
    spec: MemberSpec,
    id: MemberId,
    owner: &TypeRef,
    enclosing: Option<&TypeRef>,
    resolve: &dyn Fn(&str, &str) -> Result<TypeRef, RegistryError>,
) -> Result<MemberDef, RegistryError> {
    let context = format!("{}.{}", owner, spec.name);
    let invalid = |reason: &str| RegistryError::InvalidMember {
        member: context.clone(),
        reason: reason.to_string(),
    };

    let mut params = spec
        .params
        .iter()
        .map(|p| resolve(p, &context))
        .collect::<Result<Vec<_>, _>>()?;
    if params.iter().any(TypeRef::is_void) {
        return Err(invalid("void parameter"));
    }

    let (returns, body) = match spec.kind {
        MemberKind::Constructor => {
            if owner.is_interface() {
                return Err(invalid("interfaces have no constructors"));
            }
            if owner.is_inner_class() {
                let outer = enclosing.ok_or_else(|| invalid("inner class without enclosing type"))?;
                params.insert(0, outer.clone());
            }
            let body = match spec.body {
                Some(body) => body,
                None => default_constructor(owner.clone()),
            };
            (owner.clone(), MemberBody::Callable(body))
        }
        MemberKind::Method => {
            let returns = match spec.returns.as_deref() {
                Some(r) => resolve(r, &context)?,
                None => TypeRef::Void,
            };
            let body = spec
                .body
                .ok_or_else(|| RegistryError::MissingBody(context.clone()))?;
            (returns, MemberBody::Callable(body))
        }
        MemberKind::Field => {
            let field_type = match spec.returns.as_deref() {
                Some(r) => resolve(r, &context)?,
                None => return Err(invalid("field without a type")),
            };
            if field_type.is_void() {
                return Err(invalid("void field"));
            }
            let body = if spec.is_static {
                let initial = spec
                    .initial
                    .unwrap_or_else(|| Value::default_for(&field_type));
                MemberBody::StaticField(Mutex::new(initial))
            } else {
                MemberBody::InstanceField
            };
            (field_type, body)
        }
    };

    Ok(MemberDef {
        id,
        key: MemberKey {
            declaring: owner.clone(),
            kind: spec.kind,
            name: spec.name,
            params: TypeTuple::new(params),
        },
        returns,
        is_static: spec.is_static,
        is_final: spec.is_final,
        visibility: spec.visibility,
        throws: spec.throws,
        body,
    })
}

fn default_constructor(class: TypeRef) -> Arc<dyn Invocable> {
    let inner = class.is_inner_class();
    Arc::new(move |args: &[Value]| -> Result<Value, Throwable> {
        let mut object = Object::record(class.clone());
        if inner {
            if let (Some(outer), opseq_core::ObjectState::Fields(fields)) =
                (args.first(), &mut object.state)
            {
                fields.insert(ENCLOSING_FIELD.to_string(), outer.clone());
            }
        }
        Ok(Value::Object(ObjectRef::new(object)))
    })
}

fn check_acyclic(types: &HashMap<String, TypeDef>) -> Result<(), RegistryError> {
    fn visit(
        name: &str,
        types: &HashMap<String, TypeDef>,
        visiting: &mut HashSet<String>,
        done: &mut HashSet<String>,
    ) -> Result<(), RegistryError> {
        if done.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name.to_string()) {
            return Err(RegistryError::InheritanceCycle(name.to_string()));
        }
        if let Some(def) = types.get(name) {
            for parent in &def.supertypes {
                visit(&parent.name(), types, visiting, done)?;
            }
        }
        visiting.remove(name);
        done.insert(name.to_string());
        Ok(())
    }

    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    for name in types.keys() {
        visit(name, types, &mut visiting, &mut done)?;
    }
    Ok(())
}

/// Builder for a class or interface definition.
pub struct ClassBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    class: PendingClass,
}

impl<'a> ClassBuilder<'a> {
    fn new(builder: &'a mut RegistryBuilder, name: String, interface: bool) -> Self {
        Self {
            builder,
            class: PendingClass {
                name,
                interface,
                nesting: Nesting::TopLevel,
                enclosing: None,
                supertypes: Vec::new(),
                is_abstract: interface,
                members: Vec::new(),
            },
        }
    }

    /// Add a superclass or super-interface by name.
    pub fn extends(mut self, parent_name: impl Into<String>) -> Self {
        self.class.supertypes.push(parent_name.into());
        self
    }

    /// Add an implemented interface by name.
    pub fn implements(self, interface_name: impl Into<String>) -> Self {
        self.extends(interface_name)
    }

    /// Mark as abstract.
    pub fn abstract_type(mut self) -> Self {
        self.class.is_abstract = true;
        self
    }

    /// Declare as a static member class of `outer`.
    pub fn static_member_of(mut self, outer: impl Into<String>) -> Self {
        self.class.nesting = Nesting::StaticMember;
        self.class.enclosing = Some(outer.into());
        self
    }

    /// Declare as a non-static member class of `outer`.
    pub fn inner_of(mut self, outer: impl Into<String>) -> Self {
        self.class.nesting = Nesting::Inner;
        self.class.enclosing = Some(outer.into());
        self
    }

    /// Add a member.
    pub fn member(mut self, spec: MemberSpec) -> Self {
        self.class.members.push(spec);
        self
    }

    /// Finish building this class.
    pub fn done(self) -> Result<(), RegistryError> {
        let name = self.class.name.clone();
        if TypeRef::from_name(&name).map_or(true, |t| !t.is_reference() || name.ends_with("[]")) {
            return Err(RegistryError::InvalidTypeName(name));
        }
        if !self.builder.names.insert(name.clone()) {
            return Err(RegistryError::DuplicateTypeName(name));
        }
        self.builder.classes.push(self.class);
        Ok(())
    }
}
