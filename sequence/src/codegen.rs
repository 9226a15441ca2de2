//! Test method bodies from sequences.

use crate::Sequence;

impl Sequence {
    /// Source line for the statement at `index`, or `None` when the
    /// statement has a short form and is substituted at its uses instead.
    pub fn statement_code(&self, index: usize) -> Option<String> {
        let statement = self.statement(index)?;
        if statement.short_form().is_some() {
            return None;
        }
        let expr = statement.operation().to_code(&self.bound_inputs(index));
        Some(match self.variable(index) {
            Some(var) => format!("{} {} = {};", var.ty.source_name(), var.name(), expr),
            None => format!("{};", expr),
        })
    }

    /// The whole sequence as a test method body, one statement per line.
    pub fn to_code(&self) -> String {
        let mut out = String::new();
        for index in 0..self.len() {
            if let Some(line) = self.statement_code(index) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_registry, op};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_body_omits_literals() {
        let registry = fixture_registry();
        let seq = Sequence::from_statements(
            vec![
                (op(&registry, "int:3"), vec![]),
                (op(&registry, "java.util.ArrayList.<init>(int)"), vec![0]),
                (op(&registry, "java.lang.String:\"a\""), vec![]),
                (op(&registry, "java.util.ArrayList.add(java.lang.Object)"), vec![1, 2]),
                (op(&registry, "java.util.ArrayList.clear()"), vec![1]),
            ],
            &registry,
        )
        .unwrap();
        assert_eq!(
            seq.to_code(),
            "java.util.ArrayList arrayList1 = new java.util.ArrayList(3);\n\
             boolean boolean3 = arrayList1.add((java.lang.Object) \"a\");\n\
             arrayList1.clear();\n"
        );
        assert_eq!(seq.statement_code(0), None);
    }

    #[test]
    fn test_inner_class_declaration() {
        let registry = fixture_registry();
        let seq = Sequence::from_statements(
            vec![
                (op(&registry, "demo.Outer.<init>()"), vec![]),
                (op(&registry, "int:1"), vec![]),
                (op(&registry, "demo.Outer$Inner.<init>(demo.Outer,int)"), vec![0, 1]),
            ],
            &registry,
        )
        .unwrap();
        assert_eq!(
            seq.statement_code(2).as_deref(),
            Some("demo.Outer.Inner inner2 = outer0.new Inner(1);")
        );
    }
}
