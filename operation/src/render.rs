//! Source rendering of an operation applied to bound variables.

use crate::{Operation, OperationKind};
use opseq_core::TypeRef;

/// A variable as seen by code generation: its name, static type and the
/// literal text substituted for it, if its declaring statement has one.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundInput {
    pub name: String,
    pub ty: TypeRef,
    pub short_form: Option<String>,
}

impl BoundInput {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            short_form: None,
        }
    }

    pub fn with_short_form(mut self, text: impl Into<String>) -> Self {
        self.short_form = Some(text.into());
        self
    }

    fn text(&self) -> &str {
        self.short_form.as_deref().unwrap_or(&self.name)
    }
}

impl Operation {
    /// Append the expression this operation denotes when applied to `inputs`.
    ///
    /// An input is cast to the declared type at its position whenever the
    /// bound variable's static type differs from it.
    pub fn append_code(&self, inputs: &[BoundInput], out: &mut String) {
        debug_assert_eq!(inputs.len(), self.arity(), "arity mismatch rendering {}", self);
        let declaring = self.declaring_type();
        match self.kind() {
            OperationKind::Literal => {
                out.push_str(&self.short_form().unwrap_or_default());
            }
            OperationKind::ConstructorCall => {
                if self.takes_enclosing_instance() && !inputs.is_empty() {
                    out.push_str(&self.receiver(&inputs[0]));
                    out.push_str(".new ");
                    out.push_str(&declaring.simple_name());
                    self.append_args(inputs, 1, out);
                } else {
                    out.push_str("new ");
                    out.push_str(&declaring.source_name());
                    self.append_args(inputs, 0, out);
                }
            }
            OperationKind::MethodCall => {
                let first = self.append_target(inputs, out);
                out.push_str(self.name());
                self.append_args(inputs, first, out);
            }
            OperationKind::FieldGetter => {
                self.append_target(inputs, out);
                out.push_str(self.field_name());
            }
            OperationKind::FieldSetter => {
                let first = self.append_target(inputs, out);
                out.push_str(self.field_name());
                out.push_str(" = ");
                if let Some(value) = inputs.get(first) {
                    out.push_str(&self.argument(first, value));
                }
            }
        }
    }

    /// The rendered expression as a fresh string.
    pub fn to_code(&self, inputs: &[BoundInput]) -> String {
        let mut out = String::new();
        self.append_code(inputs, &mut out);
        out
    }

    /// `recv.` or `Type.`; returns the index of the first non-receiver input.
    fn append_target(&self, inputs: &[BoundInput], out: &mut String) -> usize {
        match inputs.first() {
            Some(recv) if self.has_receiver() => {
                out.push_str(&self.receiver(recv));
                out.push('.');
                1
            }
            _ => {
                out.push_str(&self.declaring_type().source_name());
                out.push('.');
                0
            }
        }
    }

    fn append_args(&self, inputs: &[BoundInput], first: usize, out: &mut String) {
        out.push('(');
        for (i, input) in inputs.iter().enumerate().skip(first) {
            if i > first {
                out.push_str(", ");
            }
            out.push_str(&self.argument(i, input));
        }
        out.push(')');
    }

    fn argument(&self, position: usize, input: &BoundInput) -> String {
        match self.input_types().get(position) {
            Some(param) if *param != input.ty => format!("({}) {}", param.source_name(), input.text()),
            _ => input.text().to_string(),
        }
    }

    fn receiver(&self, input: &BoundInput) -> String {
        match self.input_types().get(0) {
            Some(param) if *param != input.ty => {
                format!("(({}) {})", param.source_name(), input.text())
            }
            _ if input.short_form.is_some() => format!("({})", input.text()),
            _ => input.name.clone(),
        }
    }

    fn field_name(&self) -> &str {
        self.member().map(|m| m.name()).unwrap_or_default()
    }
}
