//! Integration tests for sequence execution and classification

use opseq_core::Value;
use opseq_operation::{Operation, Outcome};
use opseq_registry::TypeRegistry;
use opseq_sequence::Sequence;
use opseq_testgen::{
    CheckerConfig, Classification, ContractChecker, ExecutionEngine, ExecutionTrace, ExecutionVisitor,
    NoopVisitor, UndeclaredExceptionChecker,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn registry() -> TypeRegistry {
    TypeRegistry::demo().unwrap()
}

fn op(registry: &TypeRegistry, text: &str) -> Operation {
    Operation::parse(text, registry).unwrap()
}

fn build(registry: &TypeRegistry, statements: &[(&str, &[usize])]) -> Sequence {
    Sequence::from_statements(
        statements.iter().map(|(text, inputs)| (op(registry, text), inputs.to_vec())),
        registry,
    )
    .unwrap()
}

#[test]
fn test_array_list_constructor_scenario() {
    let registry = registry();
    let ctor = op(&registry, "java.util.ArrayList.<init>()");
    assert_eq!(ctor.arity(), 0);
    assert_eq!(ctor.to_parsable_text(), "java.util.ArrayList.<init>()");

    let seq = Sequence::of(ctor, &registry).unwrap();
    let trace = ExecutionEngine::default().execute(&seq, &mut NoopVisitor);
    let value = trace.outcome(0).and_then(Outcome::value).unwrap();
    let list = value.as_object().unwrap();
    assert_eq!(list.class().name(), "java.util.ArrayList");
    assert_eq!(list.lock().elements().map(<[Value]>::len), Some(0));
}

#[test]
fn test_transitive_skip_keeps_siblings() {
    let registry = registry();
    let seq = build(
        &registry,
        &[
            ("int:-1", &[]),
            ("java.util.ArrayList.<init>(int)", &[0]),
            ("java.util.ArrayList.size()", &[1]),
            ("java.util.ArrayList.<init>()", &[]),
            ("java.util.ArrayList.size()", &[3]),
            ("java.util.ArrayList.<init>(int)", &[2]),
        ],
    );
    assert_eq!(seq.dependents_of(1), vec![2, 5]);

    let trace = ExecutionEngine::default().execute(&seq, &mut NoopVisitor);
    assert!(trace.outcome(0).unwrap().is_normal());
    assert_eq!(
        trace.outcome(1).and_then(Outcome::thrown).map(|t| t.class.as_str()),
        Some("java.lang.IllegalArgumentException")
    );
    assert!(trace.outcome(2).unwrap().is_not_executed());
    assert_eq!(trace.outcome(4).and_then(Outcome::value), Some(&Value::Int(0)));
    assert!(trace.outcome(5).unwrap().is_not_executed());
}

#[test]
fn test_timeout_abandons_worker() {
    let registry = registry();
    let seq = build(
        &registry,
        &[
            ("demo.Faulty.<init>()", &[]),
            ("demo.Faulty.spin()", &[0]),
            ("demo.Outer.<init>()", &[]),
        ],
    );
    let engine = ExecutionEngine::new(Duration::from_millis(50));
    let trace = engine.execute(&seq, &mut NoopVisitor);

    assert!(trace.outcome(0).unwrap().is_normal());
    assert_eq!(
        trace.outcome(1),
        Some(&Outcome::Timeout {
            budget: Duration::from_millis(50)
        })
    );
    assert!(trace.outcome(2).unwrap().is_not_executed());
    assert!(trace.has_timeout());

    let checker = UndeclaredExceptionChecker::default();
    assert_eq!(
        checker.classify(&seq, &trace),
        Classification::Invalid
    );
    let strict = UndeclaredExceptionChecker::new(CheckerConfig::default().with_timeout_is_error(true));
    assert_eq!(
        strict.classify(&seq, &trace),
        Classification::ErrorRevealing
    );
}

#[test]
fn test_later_undeclared_failure_reveals_error() {
    let registry = registry();
    let seq = build(
        &registry,
        &[
            ("demo.Faulty.<init>()", &[]),
            ("int:-1", &[]),
            ("demo.Faulty.checkPositive(int)", &[0, 1]),
            ("int:1", &[]),
            ("int:0", &[]),
            ("demo.Faulty.divide(int,int)", &[3, 4]),
        ],
    );
    let checker = UndeclaredExceptionChecker::default();
    let (trace, classification) =
        ExecutionEngine::default().execute_and_classify(&seq, &checker, &mut NoopVisitor);

    let thrown: Vec<(usize, &str)> = trace
        .outcomes()
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.thrown().map(|t| (i, t.class.as_str())))
        .collect();
    assert_eq!(
        thrown,
        vec![
            (2, "java.lang.IllegalArgumentException"),
            (5, "java.lang.ArithmeticException"),
        ]
    );
    assert_eq!(classification, Classification::ErrorRevealing);
    assert_eq!(checker.deciding_statement(&seq, &trace, classification), Some(5));

    // only declared failures: still a regression, ending at the first one
    let declared = build(
        &registry,
        &[
            ("demo.Faulty.<init>()", &[]),
            ("int:-1", &[]),
            ("demo.Faulty.checkPositive(int)", &[0, 1]),
            ("int:0", &[]),
            ("demo.Faulty.checkPositive(int)", &[0, 3]),
        ],
    );
    let trace = ExecutionEngine::default().execute(&declared, &mut NoopVisitor);
    assert!(trace.outcome(4).unwrap().is_exceptional());
    assert_eq!(checker.classify(&declared, &trace), Classification::Regression);
    assert_eq!(checker.deciding_statement(&declared, &trace, Classification::Regression), Some(2));
}

#[test]
fn test_panicking_member_is_captured() {
    let registry = registry();
    let seq = build(&registry, &[("demo.Faulty.<init>()", &[]), ("demo.Faulty.crash()", &[0])]);
    let (trace, classification) = ExecutionEngine::default().execute_and_classify(
        &seq,
        &UndeclaredExceptionChecker::default(),
        &mut NoopVisitor,
    );
    let thrown = trace.outcome(1).and_then(Outcome::thrown).unwrap();
    assert_eq!(thrown.class, "java.lang.Error");
    assert!(thrown.message.contains("internal invariant broken"));
    assert_eq!(classification, Classification::ErrorRevealing);
}

#[test]
fn test_null_enclosing_instance() {
    let registry = registry();
    let seq = build(
        &registry,
        &[
            ("demo.Outer:null", &[]),
            ("int:1", &[]),
            ("demo.Outer$Inner.<init>(demo.Outer,int)", &[0, 1]),
        ],
    );
    let trace = ExecutionEngine::default().execute(&seq, &mut NoopVisitor);
    let outcome = trace.outcome(2).unwrap();
    assert_eq!(outcome.thrown().map(|t| t.class.as_str()), Some("java.lang.NullPointerException"));
    assert_eq!(outcome.elapsed(), Duration::ZERO);
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ExecutionVisitor for Recorder {
    fn before_statement(&mut self, _sequence: &Sequence, index: usize) {
        self.events.push(format!("before {}", index));
    }

    fn after_statement(&mut self, _sequence: &Sequence, index: usize, outcome: &Outcome) {
        let kind = if outcome.is_normal() { "normal" } else { "other" };
        self.events.push(format!("after {} {}", index, kind));
    }

    fn after_sequence(&mut self, sequence: &Sequence, trace: &ExecutionTrace) {
        self.events.push(format!("done {}/{}", trace.len(), sequence.len()));
    }
}

#[test]
fn test_visitor_sees_every_statement() {
    let registry = registry();
    let seq = build(&registry, &[("demo.Point.origin()", &[]), ("demo.Point.<get>(y)", &[0])]);
    let mut recorder = Recorder::default();
    ExecutionEngine::default().execute(&seq, &mut recorder);
    assert_eq!(
        recorder.events,
        vec!["before 0", "after 0 normal", "before 1", "after 1 normal", "done 2/2"]
    );
}
