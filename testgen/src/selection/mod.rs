//! Operation selection handed over by a class picker
//!
//! A selection is a tri-state tree: a checked type contributes all of its
//! members, a grayed type only the operations listed for it, and an
//! unchecked type nothing.

use crate::config::NameErrorPolicy;
use opseq_operation::{MemberPredicate, Operation, ParseError};
use opseq_registry::{MemberKind, TypeRegistry};
use opseq_sequence::{ComponentPool, SequenceParseError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to resolve a selected name
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("No class found for type name {0}")]
    UnknownType(String),
    #[error("Unable to load operation: {0}")]
    Operation(#[from] ParseError),
    #[error("Unable to load component: {0}")]
    Component(#[from] SequenceParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Checked,
    Grayed,
    Unchecked,
}

/// One type of the selection tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSelection {
    pub type_name: String,
    pub state: CheckState,
    /// Canonical operation texts; only read for grayed types
    #[serde(default)]
    pub operations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub types: Vec<TypeSelection>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every member of `type_name`.
    pub fn check(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(TypeSelection {
            type_name: type_name.into(),
            state: CheckState::Checked,
            operations: Vec::new(),
        });
        self
    }

    /// Select only the listed operations of `type_name`.
    pub fn gray<S: Into<String>>(mut self, type_name: impl Into<String>, operations: impl IntoIterator<Item = S>) -> Self {
        self.types.push(TypeSelection {
            type_name: type_name.into(),
            state: CheckState::Grayed,
            operations: operations.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn uncheck(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(TypeSelection {
            type_name: type_name.into(),
            state: CheckState::Unchecked,
            operations: Vec::new(),
        });
        self
    }

    /// Every declared type of `registry`, checked.
    pub fn all(registry: &TypeRegistry) -> Self {
        registry.all_types().fold(Self::new(), |s, def| s.check(def.name()))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Decides whether an unresolvable name aborts loading.
pub trait NameErrorHandler {
    /// `Ok` to skip the name and continue, `Err` to abort.
    fn handle(&self, error: LoadError) -> Result<(), LoadError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnNameError;

impl NameErrorHandler for AbortOnNameError {
    fn handle(&self, error: LoadError) -> Result<(), LoadError> {
        Err(error)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WarnOnNameError;

impl NameErrorHandler for WarnOnNameError {
    fn handle(&self, error: LoadError) -> Result<(), LoadError> {
        warn!(%error, "skipping unresolvable name");
        Ok(())
    }
}

impl NameErrorPolicy {
    pub fn handler(&self) -> Box<dyn NameErrorHandler> {
        match self {
            NameErrorPolicy::Abort => Box::new(AbortOnNameError),
            NameErrorPolicy::Warn => Box::new(WarnOnNameError),
        }
    }
}

/// Resolve a selection to operations, without duplicates and in selection
/// order.
///
/// Members of checked types pass through `predicate`; operations listed
/// explicitly for grayed types are taken as given. Constructors of abstract
/// types and interfaces are left out, and every non-final field also gets a
/// setter.
pub fn load_operations(
    selection: &Selection,
    registry: &TypeRegistry,
    handler: &dyn NameErrorHandler,
    predicate: &dyn MemberPredicate,
) -> Result<Vec<Operation>, LoadError> {
    let mut seen = HashSet::new();
    let mut operations = Vec::new();
    let mut add = |op: Operation| {
        if seen.insert(op.clone()) {
            operations.push(op);
        }
    };

    for entry in &selection.types {
        match entry.state {
            CheckState::Unchecked => continue,
            CheckState::Grayed => {
                for text in &entry.operations {
                    match Operation::parse(text, registry) {
                        Ok(op) => add(op),
                        Err(err) => handler.handle(err.into())?,
                    }
                }
            }
            CheckState::Checked => {
                let Some(def) = registry.get_type(&entry.type_name) else {
                    handler.handle(LoadError::UnknownType(entry.type_name.clone()))?;
                    continue;
                };
                for member in registry.members_of(&def.ty) {
                    if member.kind() == MemberKind::Constructor && !def.is_instantiable() {
                        continue;
                    }
                    let op = match Operation::for_member(member.clone()) {
                        Ok(op) => op,
                        Err(err) => {
                            debug!(%err, "member has no operation");
                            continue;
                        }
                    };
                    if !op.satisfies(predicate) {
                        continue;
                    }
                    add(op);
                    if member.kind() == MemberKind::Field && !member.is_final {
                        if let Ok(setter) = Operation::field_setter(member.clone()) {
                            add(setter);
                        }
                    }
                }
            }
        }
    }
    debug!(count = operations.len(), "operations loaded");
    Ok(operations)
}

/// Promote the sequences of a component file into `pool`. Blocks that fail
/// to resolve go through `handler`, like unresolvable selection names.
pub fn load_components(
    pool: &ComponentPool,
    text: &str,
    registry: &TypeRegistry,
    handler: &dyn NameErrorHandler,
) -> Result<usize, LoadError> {
    let loaded = pool.load_with(text, registry, |err| handler.handle(LoadError::Component(err)))?;
    debug!(loaded, pool = pool.len(), "components loaded");
    Ok(loaded)
}
