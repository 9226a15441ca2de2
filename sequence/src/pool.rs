//! Shared pool of accepted sequences.

use crate::codec::{parse_blocks, write_many, SequenceParseError};
use crate::Sequence;
use opseq_core::{PrimitiveType, TypeRef, Value};
use opseq_operation::Operation;
use opseq_registry::TypeRegistry;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct PoolState {
    sequences: Vec<Sequence>,
    seen: HashSet<Sequence>,
}

/// Accepted sequences available as building blocks for new ones.
///
/// Read-mostly: workers read through [`ComponentPool::candidates_for`] or
/// take a private [`ComponentPool::snapshot`]; writers [`ComponentPool::promote`].
/// Candidates are returned in insertion order.
#[derive(Debug, Default)]
pub struct ComponentPool {
    state: RwLock<PoolState>,
}

impl ComponentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool holding one single-literal sequence per seed constant.
    pub fn with_seeds(seeds: impl IntoIterator<Item = Operation>, registry: &TypeRegistry) -> Self {
        let pool = Self::new();
        for seed in seeds {
            match Sequence::of(seed, registry) {
                Ok(seq) => {
                    pool.promote(seq);
                }
                Err(err) => debug!(%err, "seed rejected"),
            }
        }
        pool
    }

    /// Add `sequence` unless an equal one is already present. Returns
    /// whether it was added.
    pub fn promote(&self, sequence: Sequence) -> bool {
        if sequence.is_empty() {
            return false;
        }
        let mut state = self.state.write();
        if !state.seen.insert(sequence.clone()) {
            return false;
        }
        state.sequences.push(sequence);
        true
    }

    pub fn len(&self) -> usize {
        self.state.read().sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().sequences.is_empty()
    }

    pub fn contains(&self, sequence: &Sequence) -> bool {
        self.state.read().seen.contains(sequence)
    }

    /// All sequences, in insertion order.
    pub fn sequences(&self) -> Vec<Sequence> {
        self.state.read().sequences.clone()
    }

    /// A private copy of the pool.
    pub fn snapshot(&self) -> ComponentPool {
        ComponentPool {
            state: RwLock::new(self.state.read().clone()),
        }
    }

    /// Sequences whose last statement yields a value assignable to `ty`.
    pub fn candidates_for(&self, ty: &TypeRef, registry: &TypeRegistry) -> Vec<Sequence> {
        self.state
            .read()
            .sequences
            .iter()
            .filter(|s| s.output_type().is_some_and(|out| registry.is_assignable(ty, out)))
            .cloned()
            .collect()
    }

    /// The pool in component-file form.
    pub fn to_parsable_text(&self) -> String {
        write_many(self.state.read().sequences.iter())
    }

    /// Promote every sequence of a component file; returns how many were new.
    /// Any bad block fails the whole load.
    pub fn load(&self, text: &str, registry: &TypeRegistry) -> Result<usize, SequenceParseError> {
        self.load_with(text, registry, |err| Err(err))
    }

    /// Promote every sequence of a component file, handing each block that
    /// fails to parse to `on_error`. `Ok` skips the block; `Err` aborts the
    /// load before anything is promoted.
    pub fn load_with<E>(
        &self,
        text: &str,
        registry: &TypeRegistry,
        mut on_error: impl FnMut(SequenceParseError) -> Result<(), E>,
    ) -> Result<usize, E> {
        let mut parsed = Vec::new();
        for block in parse_blocks(text, registry) {
            match block {
                Ok(sequence) => parsed.push(sequence),
                Err(err) => on_error(err)?,
            }
        }
        Ok(parsed.into_iter().filter(|s| self.promote(s.clone())).count())
    }
}

/// Default seed constants: small numbers, both booleans, a few characters
/// and two strings.
pub fn default_seeds() -> Vec<Operation> {
    let mut seeds = Vec::new();
    let mut push = |ty: TypeRef, value: Value| {
        if let Ok(op) = Operation::literal(ty, value) {
            seeds.push(op);
        }
    };
    for p in [PrimitiveType::Byte, PrimitiveType::Short, PrimitiveType::Int, PrimitiveType::Long] {
        for n in [-1, 0, 1, 10, 100] {
            push(TypeRef::Primitive(p), Value::Int(n));
        }
    }
    for p in [PrimitiveType::Float, PrimitiveType::Double] {
        for f in [-1.0, 0.0, 1.0, 10.0, 100.0] {
            push(TypeRef::Primitive(p), Value::Float(f));
        }
    }
    for c in ['#', ' ', '4', 'a'] {
        push(TypeRef::Primitive(PrimitiveType::Char), Value::Char(c));
    }
    for b in [true, false] {
        push(TypeRef::Primitive(PrimitiveType::Boolean), Value::Bool(b));
    }
    for s in ["", "hi!"] {
        push(TypeRef::string(), Value::from(s));
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_registry, op};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_promote_deduplicates() {
        let registry = fixture_registry();
        let pool = ComponentPool::new();
        let seq = Sequence::of(op(&registry, "java.util.ArrayList.<init>()"), &registry).unwrap();
        assert!(pool.promote(seq.clone()));
        assert!(!pool.promote(seq.clone()));
        assert!(!pool.promote(Sequence::new()));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&seq));
    }

    #[test]
    fn test_candidates_by_assignability() {
        let registry = fixture_registry();
        let pool = ComponentPool::with_seeds(default_seeds(), &registry);
        let seeded = pool.len();
        pool.promote(Sequence::of(op(&registry, "java.util.LinkedList.<init>()"), &registry).unwrap());

        let collection = registry.resolve_type("java.util.Collection").unwrap();
        let found = pool.candidates_for(&collection, &registry);
        assert_eq!(found.len(), 1);
        assert_eq!(pool.len(), seeded + 1);

        let ints = pool.candidates_for(&TypeRef::Primitive(PrimitiveType::Int), &registry);
        // byte, short, char and int seeds widen to int
        assert_eq!(ints.len(), 19);
    }

    #[test]
    fn test_snapshot_is_private() {
        let registry = fixture_registry();
        let pool = ComponentPool::new();
        let snapshot = pool.snapshot();
        snapshot.promote(Sequence::of(op(&registry, "demo.Outer.<init>()"), &registry).unwrap());
        assert!(pool.is_empty());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_concurrent_promotion() {
        let registry = Arc::new(fixture_registry());
        let pool = Arc::new(ComponentPool::new());
        let handles: Vec<_> = ["java.util.ArrayList.<init>()", "java.util.LinkedList.<init>()"]
            .into_iter()
            .map(|text| {
                let registry = Arc::clone(&registry);
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..10 {
                        pool.promote(Sequence::of(op(&registry, text), &registry).unwrap());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_load_and_save() {
        let registry = fixture_registry();
        let pool = ComponentPool::new();
        pool.promote(Sequence::of(op(&registry, "demo.Point.origin()"), &registry).unwrap());
        let text = pool.to_parsable_text();

        let reloaded = ComponentPool::new();
        assert_eq!(reloaded.load(&text, &registry).unwrap(), 1);
        assert_eq!(reloaded.load(&text, &registry).unwrap(), 0);
        assert_eq!(reloaded.sequences(), pool.sequences());
    }

    #[test]
    fn test_load_with_skips_bad_blocks() {
        let registry = fixture_registry();
        let text = "v0 = demo.Nope.<init>() :\n\nv0 = java.util.ArrayList.<init>() :\n";

        let strict = ComponentPool::new();
        assert!(strict.load(text, &registry).is_err());
        assert!(strict.is_empty());

        let lenient = ComponentPool::new();
        let mut skipped = Vec::new();
        let loaded = lenient.load_with(text, &registry, |err| {
            skipped.push(err);
            Ok::<(), SequenceParseError>(())
        });
        assert_eq!(loaded, Ok(1));
        assert_eq!(skipped.len(), 1);
        assert_eq!(
            lenient.sequences(),
            vec![Sequence::of(op(&registry, "java.util.ArrayList.<init>()"), &registry).unwrap()]
        );
    }
}
