//! The TypeRegistry - immutable lookup of the target runtime's declared types.

use crate::{MemberDef, MemberId, MemberKey, MemberKind, TypeDef};
use opseq_core::TypeRef;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolves type names and member signatures to live handles.
/// It is immutable after construction.
pub struct TypeRegistry {
    /// Declared types by binary name.
    types: HashMap<String, TypeDef>,
    /// Declaration order of type names.
    type_order: Vec<String>,
    /// Members by ID.
    members: Vec<Arc<MemberDef>>,
    /// Member lookup by identity.
    member_index: HashMap<MemberKey, MemberId>,
}

impl TypeRegistry {
    pub(crate) fn new(
        types: HashMap<String, TypeDef>,
        type_order: Vec<String>,
        members: Vec<Arc<MemberDef>>,
    ) -> Self {
        let member_index = members.iter().map(|m| (m.key.clone(), m.id)).collect();
        Self {
            types,
            type_order,
            members,
            member_index,
        }
    }

    // ==================== Type Lookups ====================

    /// Resolve a type name: primitives, `void`, arrays of resolvable types,
    /// and declared classes (carrying their declared flags).
    pub fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return self.resolve_type(element).map(TypeRef::array_of);
        }
        if let Some(def) = self.types.get(name) {
            return Some(def.ty.clone());
        }
        TypeRef::from_name(name).filter(|t| !t.is_reference())
    }

    /// Get a type definition by binary name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Get the definition of a type, ignoring type arguments.
    pub fn type_def(&self, ty: &TypeRef) -> Option<&TypeDef> {
        ty.as_class().and_then(|c| self.types.get(c.name()))
    }

    /// All declared types, in declaration order.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.type_order.iter().filter_map(|n| self.types.get(n))
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ==================== Member Lookups ====================

    pub fn member(&self, id: MemberId) -> Option<&Arc<MemberDef>> {
        self.members.get(id.0 as usize)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members declared by a type, in declaration order.
    pub fn members_of(&self, ty: &TypeRef) -> Vec<&Arc<MemberDef>> {
        self.type_def(ty)
            .map(|def| def.members.iter().filter_map(|id| self.member(*id)).collect())
            .unwrap_or_default()
    }

    /// Find a member by exact (kind, name, parameter tuple) on `declaring`.
    pub fn find_member(
        &self,
        declaring: &TypeRef,
        kind: MemberKind,
        name: &str,
        params: &[TypeRef],
    ) -> Option<&Arc<MemberDef>> {
        let key = MemberKey {
            declaring: declaring.raw(),
            kind,
            name: name.to_string(),
            params: params.iter().map(|t| t.raw()).collect::<Vec<_>>().into(),
        };
        if let Some(id) = self.member_index.get(&key) {
            return self.member(*id);
        }
        // declared signatures may carry type arguments; compare erasures
        self.members_of(declaring).into_iter().find(|m| {
            m.kind() == kind
                && m.name() == name
                && m.params().len() == params.len()
                && m.params().iter().zip(params).all(|(a, b)| a.raw() == b.raw())
        })
    }

    /// Find a field by name on `declaring`.
    pub fn find_field(&self, declaring: &TypeRef, name: &str) -> Option<&Arc<MemberDef>> {
        self.find_member(declaring, MemberKind::Field, name, &[])
    }

    // ==================== Subtype Queries ====================

    /// Check if `sub` is `sup` or one of its (transitive) subtypes.
    pub fn is_subtype(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        if sub.raw() == sup.raw() {
            return true;
        }
        match (sub, sup) {
            (TypeRef::Array(a), TypeRef::Array(b)) => {
                a.is_reference() && b.is_reference() && self.is_subtype(a, b)
            }
            (TypeRef::Array(_), _) => sup.is_object(),
            (TypeRef::Class(_), TypeRef::Class(_)) => {
                if sup.is_object() {
                    return true;
                }
                let mut seen = HashSet::new();
                let mut stack = vec![sub.raw()];
                while let Some(current) = stack.pop() {
                    if !seen.insert(current.name()) {
                        continue;
                    }
                    if let Some(def) = self.type_def(&current) {
                        for parent in &def.supertypes {
                            if parent.raw() == sup.raw() {
                                return true;
                            }
                            stack.push(parent.raw());
                        }
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Can a value of static type `from` be bound where `to` is expected
    /// without a cast changing its meaning?
    pub fn is_assignable(&self, to: &TypeRef, from: &TypeRef) -> bool {
        match (to, from) {
            (TypeRef::Void, _) | (_, TypeRef::Void) => false,
            (TypeRef::Primitive(t), TypeRef::Primitive(f)) => t.widens_from(*f),
            (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
            _ => self.is_subtype(from, to),
        }
    }

    /// Instantiable subtypes of `ty` (including itself), in declaration order.
    pub fn instantiable_subtypes(&self, ty: &TypeRef) -> Vec<&TypeDef> {
        self.all_types()
            .filter(|def| def.is_instantiable() && self.is_subtype(&def.ty, ty))
            .collect()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_order)
            .field("members", &self.members.len())
            .finish()
    }
}
