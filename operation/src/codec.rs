//! Canonical operation text.
//!
//! ```text
//! java.util.ArrayList.<init>(int)
//! java.util.ArrayList.add(java.lang.Object)
//! demo.Point.<get>(x)
//! demo.Point.<set>(x)
//! java.lang.String:"a\"b"
//! ```
//!
//! Instance methods list their declared parameters only; the receiver is
//! implied by the resolved member. Inner-class constructors list the
//! enclosing type first, as the runtime signature does.

use crate::{literal, Operation, OperationKind};
use opseq_core::TypeRef;
use opseq_registry::{MemberKind, TypeRegistry};
use thiserror::Error;

const GETTER: &str = "<get>";
const SETTER: &str = "<set>";

/// Errors while resolving operation text against a registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Malformed operation text: {0}")]
    Malformed(String),

    #[error("Cannot resolve declaring type `{type_name}` in {text}")]
    UnresolvedDeclaringType { type_name: String, text: String },

    #[error("Cannot resolve parameter type `{type_name}` in {text}")]
    UnresolvedParameterType { type_name: String, text: String },

    #[error("No such member: {0}")]
    NoSuchMember(String),

    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

impl ParseError {
    /// The offending operation text.
    pub fn text(&self) -> &str {
        match self {
            ParseError::Malformed(text)
            | ParseError::NoSuchMember(text)
            | ParseError::InvalidLiteral(text)
            | ParseError::UnresolvedDeclaringType { text, .. }
            | ParseError::UnresolvedParameterType { text, .. } => text,
        }
    }
}

impl Operation {
    /// Canonical text; [`Operation::parse`] maps it back to an equal operation.
    pub fn to_parsable_text(&self) -> String {
        if let Some(value) = self.literal_value() {
            return format!("{}:{}", self.declaring_type().name(), literal::value_text(value));
        }
        let Some(member) = self.member() else {
            return String::new();
        };
        match self.kind() {
            OperationKind::FieldGetter => {
                format!("{}.{}({})", member.declaring().name(), GETTER, member.name())
            }
            OperationKind::FieldSetter => {
                format!("{}.{}({})", member.declaring().name(), SETTER, member.name())
            }
            _ => member.signature(),
        }
    }

    /// Resolve canonical text against `registry`.
    pub fn parse(text: &str, registry: &TypeRegistry) -> Result<Operation, ParseError> {
        let text = text.trim();
        if is_literal_text(text) {
            return parse_literal(text, registry);
        }

        let malformed = || ParseError::Malformed(text.to_string());
        let open = text.find('(').ok_or_else(malformed)?;
        if !text.ends_with(')') || text.len() - 1 < open {
            return Err(malformed());
        }
        let (type_name, member_name) = text[..open].rsplit_once('.').ok_or_else(malformed)?;
        if type_name.is_empty() || member_name.is_empty() {
            return Err(malformed());
        }
        let args = text[open + 1..text.len() - 1].trim();

        let declaring = registry
            .resolve_type(type_name)
            .filter(|t| registry.type_def(t).is_some())
            .ok_or_else(|| ParseError::UnresolvedDeclaringType {
                type_name: type_name.to_string(),
                text: text.to_string(),
            })?;
        let no_such_member = || ParseError::NoSuchMember(text.to_string());

        if member_name == GETTER || member_name == SETTER {
            let field = registry.find_field(&declaring, args).ok_or_else(no_such_member)?;
            let op = if member_name == GETTER {
                Operation::field_getter(field.clone())
            } else {
                Operation::field_setter(field.clone())
            };
            return op.map_err(|_| no_such_member());
        }

        let params = parse_params(args, text, registry)?;
        let kind = if member_name == "<init>" {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };
        let member = registry
            .find_member(&declaring, kind, member_name, &params)
            .ok_or_else(no_such_member)?;
        Operation::for_member(member.clone()).map_err(|_| no_such_member())
    }
}

/// Literal text has its `type:` prefix before any parenthesis.
fn is_literal_text(text: &str) -> bool {
    match (text.find(':'), text.find('(')) {
        (Some(colon), Some(open)) => colon < open,
        (Some(_), None) => true,
        _ => false,
    }
}

fn parse_literal(text: &str, registry: &TypeRegistry) -> Result<Operation, ParseError> {
    let (type_name, value_text) = text
        .split_once(':')
        .ok_or_else(|| ParseError::Malformed(text.to_string()))?;
    let ty = registry
        .resolve_type(type_name.trim())
        .filter(|t| !t.is_void())
        .ok_or_else(|| ParseError::UnresolvedDeclaringType {
            type_name: type_name.to_string(),
            text: text.to_string(),
        })?;
    let value = literal::parse_value(&ty, value_text)
        .ok_or_else(|| ParseError::InvalidLiteral(text.to_string()))?;
    Operation::literal(ty, value).map_err(|_| ParseError::InvalidLiteral(text.to_string()))
}

fn parse_params(args: &str, text: &str, registry: &TypeRegistry) -> Result<Vec<TypeRef>, ParseError> {
    if args.is_empty() {
        return Ok(Vec::new());
    }
    args.split(',')
        .map(str::trim)
        .map(|name| {
            registry
                .resolve_type(name)
                .filter(|t| !t.is_void())
                .ok_or_else(|| ParseError::UnresolvedParameterType {
                    type_name: name.to_string(),
                    text: text.to_string(),
                })
        })
        .collect()
}
