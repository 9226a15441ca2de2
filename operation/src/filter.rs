//! Predicates over the members behind operations.

use crate::Operation;
use opseq_registry::MemberDef;
use regex_lite::Regex;

/// A test over a registry member.
pub trait MemberPredicate {
    fn test(&self, member: &MemberDef) -> bool;
}

impl<F> MemberPredicate for F
where
    F: Fn(&MemberDef) -> bool,
{
    fn test(&self, member: &MemberDef) -> bool {
        self(member)
    }
}

/// Accepts public members only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessiblePredicate;

impl MemberPredicate for AccessiblePredicate {
    fn test(&self, member: &MemberDef) -> bool {
        member.is_public()
    }
}

/// Rejects members whose signature matches any of a set of patterns.
#[derive(Debug, Clone, Default)]
pub struct OmitPattern {
    patterns: Vec<Regex>,
}

impl OmitPattern {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex_lite::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `signature` matches one of the patterns.
    pub fn omits(&self, signature: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(signature))
    }
}

impl MemberPredicate for OmitPattern {
    fn test(&self, member: &MemberDef) -> bool {
        !self.omits(&member.signature())
    }
}

impl Operation {
    /// Evaluate `predicate` over the underlying member. Literals satisfy
    /// every predicate.
    pub fn satisfies(&self, predicate: &dyn MemberPredicate) -> bool {
        self.member().map_or(true, |m| predicate.test(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_registry;
    use opseq_core::{TypeRef, Value};
    use opseq_registry::MemberKind;

    #[test]
    fn test_omit_pattern() {
        let registry = fixture_registry();
        let omit = OmitPattern::new(&["^demo\\.Faulty\\.", "\\.clear\\("]).unwrap();

        let crash = Operation::parse("demo.Faulty.crash()", &registry).unwrap();
        let clear = Operation::parse("java.util.ArrayList.clear()", &registry).unwrap();
        let size = Operation::parse("java.util.ArrayList.size()", &registry).unwrap();
        assert!(!crash.satisfies(&omit));
        assert!(!clear.satisfies(&omit));
        assert!(size.satisfies(&omit));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(OmitPattern::new(&["("]).is_err());
    }

    #[test]
    fn test_closure_predicate() {
        let registry = fixture_registry();
        let list = registry.resolve_type("java.util.ArrayList").unwrap();
        let only_ctors = |m: &MemberDef| m.kind() == MemberKind::Constructor;
        for member in registry.members_of(&list) {
            let op = Operation::for_member(member.clone()).unwrap();
            assert_eq!(op.satisfies(&only_ctors), op.is_constructor_call());
        }
    }

    #[test]
    fn test_literals_satisfy_everything() {
        let lit = Operation::literal(TypeRef::string(), Value::from("x")).unwrap();
        assert!(lit.satisfies(&|_: &MemberDef| false));
        assert!(lit.satisfies(&AccessiblePredicate));
    }
}
