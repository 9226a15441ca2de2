//! Integration tests for end-to-end suite generation

use opseq_registry::TypeRegistry;
use opseq_sequence::{ComponentPool, Sequence};
use opseq_testgen::{
    Classification, GeneratorConfig, NameErrorPolicy, ReportGenerator, Selection, TestClassWriter, TestGenError,
    TestGenerator, TestSuite,
};
use pretty_assertions::assert_eq;

fn registry() -> TypeRegistry {
    TypeRegistry::demo().unwrap()
}

fn selection() -> Selection {
    Selection::new()
        .check("demo.Point")
        .check("java.util.ArrayList")
        .gray(
            "demo.Faulty",
            [
                "demo.Faulty.<init>()",
                "demo.Faulty.checkPositive(int)",
                "demo.Faulty.divide(int,int)",
            ],
        )
}

fn config() -> GeneratorConfig {
    GeneratorConfig::minimal()
        .with_max_tests(25)
        .with_max_attempts(150)
        .with_omit_patterns(["ArrayList\\.remove"])
}

fn fingerprint(suite: &TestSuite) -> Vec<(String, Classification)> {
    suite
        .tests
        .iter()
        .map(|t| (t.sequence.to_parsable_text(), t.classification))
        .collect()
}

#[test]
fn test_same_seed_same_suite() {
    let registry = registry();
    let first = TestGenerator::new(config()).generate_suite(&registry, &selection()).unwrap();
    let second = TestGenerator::new(config()).generate_suite(&registry, &selection()).unwrap();

    assert!(!first.tests.is_empty());
    assert_eq!(fingerprint(&first), fingerprint(&second));
    assert_eq!(first.stats, second.stats);
    assert_eq!(first.seed, 42);
}

#[test]
fn test_suite_contents() {
    let registry = registry();
    let suite = TestGenerator::new(config()).generate_suite(&registry, &selection()).unwrap();

    assert!(suite.tests.len() <= 25);
    assert!(suite.stats.attempts <= 150);
    assert_eq!(suite.stats.timeouts, 0);
    for test in &suite.tests {
        assert!(test.classification.is_kept());
        assert!(test.sequence.len() <= config().max_sequence_length);
        assert!(!test.sequence.to_parsable_text().contains("ArrayList.remove"));
        // every accepted sequence survives its text form
        assert_eq!(Sequence::parse(&test.sequence.to_parsable_text(), &registry).unwrap(), test.sequence);
    }

    let report = ReportGenerator::generate(&suite);
    assert!(report.contains("Seed: 42"));
    let source = TestClassWriter::new("GeneratedTest").write(&suite.tests);
    assert_eq!(source.matches("@Test").count(), suite.tests.len());
}

#[test]
fn test_pool_grows_and_persists() {
    let registry = registry();
    let pool = ComponentPool::new();
    let config = config().with_default_seeds(false);
    let selection = Selection::new().check("demo.Point");
    TestGenerator::new(config)
        .generate_with_pool(&registry, &selection, &pool)
        .unwrap();
    assert!(!pool.is_empty());

    let reloaded = ComponentPool::new();
    let loaded = reloaded.load(&pool.to_parsable_text(), &registry).unwrap();
    assert_eq!(loaded, pool.len());
    assert_eq!(reloaded.sequences(), pool.sequences());
}

#[test]
fn test_partially_malformed_component_file() {
    let registry = registry();
    let components = "# saved components\n\
                      v0 = demo.Nope.<init>() :\n\
                      \n\
                      v0 = java.util.ArrayList.<init>() :\n\
                      \n\
                      v0 = demo.Point.origin() :\n\
                      v1 = demo.Point.bogus() : v0\n";

    let strict = TestGenerator::new(config().with_default_seeds(false));
    assert!(matches!(strict.load_pool(&registry, components), Err(TestGenError::Load(_))));

    let lenient = TestGenerator::new(
        config()
            .with_default_seeds(false)
            .with_name_error_policy(NameErrorPolicy::Warn),
    );
    let pool = lenient.load_pool(&registry, components).unwrap();
    let texts: Vec<String> = pool.sequences().iter().map(Sequence::to_parsable_text).collect();
    assert_eq!(texts, vec!["v0 = java.util.ArrayList.<init>() :"]);
}

#[test]
fn test_name_error_policies() {
    let registry = registry();
    let selection = Selection::new().check("demo.Point").check("demo.DoesNotExist");

    let abort = TestGenerator::new(config()).generate_suite(&registry, &selection);
    assert!(matches!(abort, Err(TestGenError::Load(_))));

    let warn = TestGenerator::new(config().with_name_error_policy(NameErrorPolicy::Warn))
        .generate_suite(&registry, &selection)
        .unwrap();
    assert_eq!(warn.operation_count, 9);
}

#[test]
fn test_config_from_json() {
    let config = GeneratorConfig::from_json(
        r#"{
            "seed": 9,
            "max_tests": 5,
            "omit_patterns": ["^demo\\.Faulty"],
            "checker": {"timeout_is_error": true}
        }"#,
    )
    .unwrap();
    assert_eq!(config.seed, 9);
    assert!(config.checker.timeout_is_error);
    assert!(config.checker.null_npe_invalid);

    let registry = registry();
    let suite = TestGenerator::new(config)
        .generate_suite(&registry, &Selection::new().check("demo.Faulty").check("demo.Point"))
        .unwrap();
    assert!(suite.tests.len() <= 5);
    assert!(suite
        .tests
        .iter()
        .all(|t| !t.sequence.to_parsable_text().contains("demo.Faulty")));
}

#[test]
fn test_invalid_config_rejected() {
    let registry = registry();
    let bad = GeneratorConfig::minimal().with_omit_patterns(["("]);
    let result = TestGenerator::new(bad).generate_suite(&registry, &Selection::new().check("demo.Point"));
    assert!(matches!(result, Err(TestGenError::Config(_))));
}
