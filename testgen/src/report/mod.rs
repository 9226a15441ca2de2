//! Test report and test source generation

use crate::types::*;
use opseq_core::{Throwable, Value};
use opseq_operation::{literal, Outcome};

/// Generates human-readable generation reports
pub struct ReportGenerator;

impl ReportGenerator {
    /// Generate a full report of one generation run
    pub fn generate(suite: &TestSuite) -> String {
        let stats = &suite.stats;
        let mut lines = Vec::new();

        // Header
        lines.push("╔══════════════════════════════════════════════════════════════╗".to_string());
        lines.push("║               opseq Test Generation Report                   ║".to_string());
        lines.push("╚══════════════════════════════════════════════════════════════╝".to_string());
        lines.push(String::new());

        lines.push(format!("Seed: {}", suite.seed));
        lines.push(format!("Operations: {}", suite.operation_count));
        lines.push(format!("Tests: {}", suite.tests.len()));
        lines.push(String::new());

        lines.push("═══════════════════════════════════════════════════════════════".to_string());
        lines.push("                         SEARCH                                ".to_string());
        lines.push("═══════════════════════════════════════════════════════════════".to_string());
        lines.push(String::new());

        let execution_rate = if stats.attempts > 0 {
            (stats.executed as f64 / stats.attempts as f64) * 100.0
        } else {
            0.0
        };
        lines.push(format!("Attempts:   {}", stats.attempts));
        lines.push(format!("Executed:   {} ({:.1}%)", stats.executed, execution_rate));
        lines.push(format!("Unbound:    {}", stats.unbound));
        lines.push(format!("Duplicates: {}", stats.duplicates));
        lines.push(format!("Too long:   {}", stats.too_long));
        lines.push(format!("Timeouts:   {}", stats.timeouts));
        lines.push(format!("Promoted:   {}", stats.promoted));
        lines.push(String::new());

        lines.push("By Classification:".to_string());
        for (classification, count) in [
            (Classification::Regression, stats.regression),
            (Classification::ErrorRevealing, stats.error_revealing),
            (Classification::Invalid, stats.invalid),
            (Classification::Flaky, stats.flaky),
        ] {
            lines.push(format!("  {:16} {}", classification.as_str(), count));
        }
        lines.push(String::new());

        let failures: Vec<_> = suite.error_revealing_tests().collect();
        if !failures.is_empty() {
            lines.push("═══════════════════════════════════════════════════════════════".to_string());
            lines.push("                    ERROR-REVEALING TESTS                      ".to_string());
            lines.push("═══════════════════════════════════════════════════════════════".to_string());
            lines.push(String::new());
            for test in failures {
                let thrown = test.failure().map(|t| t.to_string()).unwrap_or_default();
                lines.push(format!("  {} ({} statements): {}", test.id, test.sequence.len(), thrown));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Generate JSON report for programmatic consumption
    pub fn generate_json(suite: &TestSuite) -> String {
        use serde_json::json;

        let tests: Vec<_> = suite
            .tests
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "classification": t.classification.as_str(),
                    "statements": t.sequence.len(),
                    "thrown": t.trace.last()
                        .and_then(|o| o.thrown())
                        .map(|e| e.class.clone()),
                    "sequence": t.sequence.to_parsable_text(),
                })
            })
            .collect();

        let report = json!({
            "seed": suite.seed,
            "operations": suite.operation_count,
            "stats": suite.stats,
            "tests": tests,
        });

        serde_json::to_string_pretty(&report).unwrap_or_default()
    }
}

/// Writes accepted tests as a JUnit test class
#[derive(Debug, Clone)]
pub struct TestClassWriter {
    class_name: String,
    package: Option<String>,
}

impl TestClassWriter {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            package: None,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// The whole test class.
    pub fn write(&self, tests: &[GeneratedTest]) -> String {
        let mut lines = Vec::new();
        if let Some(package) = &self.package {
            lines.push(format!("package {};", package));
            lines.push(String::new());
        }
        lines.push("import org.junit.Test;".to_string());
        lines.push(String::new());
        lines.push(format!("public class {} {{", self.class_name));
        for test in tests {
            lines.push(String::new());
            lines.push("    @Test".to_string());
            lines.push(format!("    public void {}() throws Throwable {{", test.id));
            for line in Self::method_body(test) {
                lines.push(format!("        {}", line));
            }
            lines.push("    }".to_string());
        }
        lines.push("}".to_string());
        lines.push(String::new());
        lines.join("\n")
    }

    /// Statements of one test method, unindented.
    pub fn method_body(test: &GeneratedTest) -> Vec<String> {
        let sequence = &test.sequence;
        let Some(last) = sequence.len().checked_sub(1) else {
            return Vec::new();
        };
        let mut body = Vec::new();
        for index in 0..last {
            let Some(code) = sequence.statement_code(index) else {
                continue;
            };
            match test.trace.outcome(index) {
                Some(Outcome::NotExecuted) => {}
                Some(outcome) => match outcome.thrown() {
                    Some(thrown) => body.extend(Self::expect_thrown(code, thrown)),
                    None => body.push(code),
                },
                None => body.push(code),
            }
        }
        let last_code = sequence.statement_code(last);

        if let Some(expected) = test.expected_exception() {
            body.extend(last_code.into_iter().flat_map(|code| Self::expect_thrown(code, expected)));
            return body;
        }

        if let Some(failure) = test.failure() {
            body.push(format!("// throws {}", failure));
        }
        body.extend(last_code);
        if test.classification == Classification::Regression {
            body.extend(Self::value_assertion(test, last));
        }
        body
    }

    fn expect_thrown(code: String, thrown: &Throwable) -> Vec<String> {
        let class = thrown.class.replace('$', ".");
        vec![
            "try {".to_string(),
            format!("    {}", code),
            format!("    org.junit.Assert.fail(\"Expected exception of type {}\");", class),
            format!("}} catch ({} e) {{", class),
            "    // expected".to_string(),
            "}".to_string(),
        ]
    }

    /// Assertion pinning a primitive or string result of statement `index`.
    fn value_assertion(test: &GeneratedTest, index: usize) -> Option<String> {
        let statement = test.sequence.statement(index)?;
        if statement.short_form().is_some() {
            return None;
        }
        let var = test.sequence.variable(index)?;
        let value = test.trace.outcome(index)?.value()?;
        if value.as_float().is_some_and(f64::is_nan) {
            return None;
        }
        let expected = literal::source_text(&var.ty, value);
        match value {
            Value::String(_) if var.ty.is_string() => {
                Some(format!("org.junit.Assert.assertEquals({}, {});", expected, var.name()))
            }
            Value::Bool(_) | Value::Char(_) | Value::Int(_) | Value::Float(_) if var.ty.is_primitive() => Some(format!(
                "org.junit.Assert.assertTrue(\"'\" + {name} + \"' != \" + {lit}, {name} == {lit});",
                name = var.name(),
                lit = expected
            )),
            _ => None,
        }
    }
}
