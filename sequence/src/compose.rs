//! Building new sequences from existing ones.

use crate::error::{SequenceError, SequenceResult};
use crate::{Sequence, Statement};
use opseq_operation::Operation;
use opseq_registry::TypeRegistry;

impl Sequence {
    /// Append `operation`, binding each parameter to the most recently
    /// declared variable assignable to it. `None` if some parameter has no
    /// compatible variable.
    pub fn extend(&self, operation: &Operation, registry: &TypeRegistry) -> Option<Sequence> {
        let inputs = operation
            .input_types()
            .iter()
            .map(|param| {
                self.variables()
                    .filter(|v| registry.is_assignable(param, &v.ty))
                    .last()
                    .map(|v| v.index)
            })
            .collect::<Option<Vec<_>>>()?;
        self.append(operation.clone(), inputs, registry).ok()
    }

    /// `self` followed by `other`, with `other`'s variables renumbered to
    /// continue after `self`'s.
    pub fn concat(&self, other: &Sequence) -> Sequence {
        Sequence::concat_all([self, other])
    }

    /// Splice several sequences together in order.
    pub fn concat_all<'a>(parts: impl IntoIterator<Item = &'a Sequence>) -> Sequence {
        let mut statements: Vec<Statement> = Vec::new();
        for part in parts {
            let offset = statements.len();
            statements.extend(part.statements().iter().map(|s| {
                let mut moved = s.clone();
                moved.shift_inputs(offset);
                moved
            }));
        }
        Sequence::from_parts(statements)
    }

    /// The prefix of statements `0..=upto`.
    pub fn subsequence(&self, upto: usize) -> SequenceResult<Sequence> {
        if upto >= self.len() {
            return Err(SequenceError::IndexOutOfRange {
                index: upto,
                len: self.len(),
            });
        }
        Ok(Sequence::from_parts(self.statements()[..=upto].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_registry, op};
    use pretty_assertions::assert_eq;

    fn assert_forward_references(seq: &Sequence) {
        for (i, statement) in seq.statements().iter().enumerate() {
            for &input in statement.inputs() {
                assert!(input < i, "statement {} uses v{}", i, input);
                assert!(seq.variable(input).is_some());
            }
        }
    }

    #[test]
    fn test_extend_picks_most_recent_compatible_variable() {
        let registry = fixture_registry();
        let seq = Sequence::from_statements(
            vec![
                (op(&registry, "java.util.ArrayList.<init>()"), vec![]),
                (op(&registry, "java.util.ArrayList.<init>()"), vec![]),
                (op(&registry, "java.lang.StringBuilder.<init>()"), vec![]),
            ],
            &registry,
        )
        .unwrap();
        let extended = seq.extend(&op(&registry, "java.util.ArrayList.size()"), &registry).unwrap();
        assert_eq!(extended.len(), 4);
        assert_eq!(extended.statement(3).unwrap().inputs(), &[1]);
        assert_forward_references(&extended);
    }

    #[test]
    fn test_extend_without_compatible_variable() {
        let registry = fixture_registry();
        let seq = Sequence::of(op(&registry, "java.lang.StringBuilder.<init>()"), &registry).unwrap();
        assert!(seq.extend(&op(&registry, "java.util.ArrayList.size()"), &registry).is_none());
        assert!(Sequence::new()
            .extend(&op(&registry, "java.util.ArrayList.<init>()"), &registry)
            .is_some());
    }

    #[test]
    fn test_concat_renumbers() {
        let registry = fixture_registry();
        let a = Sequence::from_statements(
            vec![
                (op(&registry, "java.util.ArrayList.<init>()"), vec![]),
                (op(&registry, "java.util.ArrayList.size()"), vec![0]),
            ],
            &registry,
        )
        .unwrap();
        let b = Sequence::from_statements(
            vec![
                (op(&registry, "java.lang.StringBuilder.<init>()"), vec![]),
                (op(&registry, "java.lang.StringBuilder.reverse()"), vec![0]),
            ],
            &registry,
        )
        .unwrap();
        let joined = a.concat(&b);
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.statement(3).unwrap().inputs(), &[2]);
        assert_forward_references(&joined);
        assert_eq!(joined.subsequence(1).unwrap(), a);
    }

    #[test]
    fn test_subsequence_out_of_range() {
        let registry = fixture_registry();
        let seq = Sequence::of(op(&registry, "java.util.ArrayList.<init>()"), &registry).unwrap();
        assert_eq!(
            seq.subsequence(1),
            Err(SequenceError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(seq.subsequence(0).unwrap(), seq);
    }
}
