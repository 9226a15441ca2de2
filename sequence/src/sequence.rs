//! Statements and sequences.

use crate::error::{SequenceError, SequenceResult};
use opseq_core::TypeRef;
use opseq_operation::{BoundInput, Operation};
use opseq_registry::TypeRegistry;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One operation applied to variables declared by earlier statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    operation: Operation,
    inputs: Vec<usize>,
}

impl Statement {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Indices of the statements whose results are the inputs.
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Whether the statement's result can be used as an input.
    pub fn declares_variable(&self) -> bool {
        !self.operation.output_type().is_void()
    }

    /// Literal text substituted for this statement's variable.
    pub fn short_form(&self) -> Option<String> {
        self.operation.short_form()
    }

    pub(crate) fn shift_inputs(&mut self, offset: usize) {
        for input in &mut self.inputs {
            *input += offset;
        }
    }
}

/// The result of the statement at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub index: usize,
    pub ty: TypeRef,
}

impl Variable {
    /// Source name: the simple type name, lower-camel-cased, plus the index.
    pub fn name(&self) -> String {
        variable_name(&self.ty, self.index)
    }
}

fn variable_name(ty: &TypeRef, index: usize) -> String {
    let base = match ty {
        TypeRef::Array(element) => format!("{}Array", element.simple_name().replace("[]", "Array")),
        other => other.simple_name(),
    };
    let mut chars = base.chars();
    let lowered: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "var".to_string(),
    };
    format!("{}{}", lowered, index)
}

/// An append-only, topologically ordered list of statements.
///
/// Cheap to clone: statements are shared. Equality is structural (the
/// ordered operations and their input indices) and the hash is computed once.
#[derive(Clone)]
pub struct Sequence {
    statements: Arc<Vec<Statement>>,
    hash: u64,
}

impl Sequence {
    pub fn new() -> Self {
        Self::from_parts(Vec::new())
    }

    pub(crate) fn from_parts(statements: Vec<Statement>) -> Self {
        let mut hasher = DefaultHasher::new();
        statements.len().hash(&mut hasher);
        for statement in &statements {
            statement.operation.hash_code().hash(&mut hasher);
            statement.inputs.hash(&mut hasher);
        }
        Self {
            statements: Arc::new(statements),
            hash: hasher.finish(),
        }
    }

    /// A sequence of a single input-free operation.
    pub fn of(operation: Operation, registry: &TypeRegistry) -> SequenceResult<Self> {
        Self::new().append(operation, Vec::new(), registry)
    }

    /// Build from explicit statements, validating each binding.
    pub fn from_statements(
        statements: impl IntoIterator<Item = (Operation, Vec<usize>)>,
        registry: &TypeRegistry,
    ) -> SequenceResult<Self> {
        let mut validated = Vec::new();
        for (operation, inputs) in statements {
            check_binding(&validated, &operation, &inputs, registry)?;
            validated.push(Statement { operation, inputs });
        }
        Ok(Self::from_parts(validated))
    }

    /// A new sequence with one more statement applying `operation` to the
    /// variables at `inputs`.
    ///
    /// Every input must be declared by an earlier, non-void statement whose
    /// type is assignable to the parameter type at that position.
    pub fn append(
        &self,
        operation: Operation,
        inputs: Vec<usize>,
        registry: &TypeRegistry,
    ) -> SequenceResult<Sequence> {
        check_binding(&self.statements, &operation, &inputs, registry)?;
        let mut statements = Vec::with_capacity(self.len() + 1);
        statements.extend(self.statements.iter().cloned());
        statements.push(Statement { operation, inputs });
        Ok(Self::from_parts(statements))
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }

    /// The variable declared by the statement at `index`, if any.
    pub fn variable(&self, index: usize) -> Option<Variable> {
        self.statements
            .get(index)
            .filter(|s| s.declares_variable())
            .map(|s| Variable {
                index,
                ty: s.operation.output_type().clone(),
            })
    }

    /// All declared variables, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        (0..self.len()).filter_map(move |i| self.variable(i))
    }

    /// Type of the last statement's result, if it declares one.
    pub fn output_type(&self) -> Option<&TypeRef> {
        self.last()
            .filter(|s| s.declares_variable())
            .map(|s| s.operation.output_type())
    }

    /// The inputs of the statement at `index` as code generation sees them.
    pub fn bound_inputs(&self, index: usize) -> Vec<BoundInput> {
        let Some(statement) = self.statements.get(index) else {
            return Vec::new();
        };
        statement
            .inputs
            .iter()
            .map(|&i| {
                let source = &self.statements[i];
                let ty = source.operation.output_type().clone();
                let input = BoundInput::new(variable_name(&ty, i), ty);
                match source.short_form() {
                    Some(text) => input.with_short_form(text),
                    None => input,
                }
            })
            .collect()
    }

    /// Indices of the statements that transitively depend on `index`.
    pub fn dependents_of(&self, index: usize) -> Vec<usize> {
        let mut tainted = vec![false; self.len()];
        if index < self.len() {
            tainted[index] = true;
        }
        let mut result = Vec::new();
        for (i, statement) in self.statements.iter().enumerate().skip(index + 1) {
            if statement.inputs.iter().any(|&input| tainted[input]) {
                tainted[i] = true;
                result.push(i);
            }
        }
        result
    }

    /// The cached structural hash.
    pub fn hash_code(&self) -> u64 {
        self.hash
    }
}

fn check_binding(
    existing: &[Statement],
    operation: &Operation,
    inputs: &[usize],
    registry: &TypeRegistry,
) -> SequenceResult<()> {
    let statement = existing.len();
    if inputs.len() != operation.arity() {
        return Err(SequenceError::ArityMismatch {
            operation: operation.to_parsable_text(),
            expected: operation.arity(),
            actual: inputs.len(),
        });
    }
    for (position, (&input, param)) in inputs.iter().zip(operation.input_types().iter()).enumerate() {
        let source = existing
            .get(input)
            .ok_or(SequenceError::ForwardReference { statement, input })?;
        let actual = source.operation.output_type();
        if actual.is_void() {
            return Err(SequenceError::VoidInput { statement, input });
        }
        if !registry.is_assignable(param, actual) {
            return Err(SequenceError::TypeMismatch {
                statement,
                position,
                expected: param.name(),
                actual: actual.name(),
            });
        }
    }
    Ok(())
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.statements == other.statements
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_parsable_text())
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.statements.iter().enumerate().map(|(i, s)| {
                let inputs: Vec<String> = s.inputs.iter().map(|v| format!("v{}", v)).collect();
                format!("v{} = {} [{}]", i, s.operation, inputs.join(" "))
            }))
            .finish()
    }
}
