//! Renders generated code as C#-style source text.

use crate::ast::{ClassDeclaration, FieldDeclaration, MethodDeclaration, Statement};
use itertools::Itertools;

/// Formats statements and declarations with a configurable indent unit.
#[derive(Debug, Clone)]
pub struct CodePrinter {
    indent: String,
}

impl Default for CodePrinter {
    fn default() -> Self {
        Self::new("    ")
    }
}

impl CodePrinter {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
        }
    }

    /// Renders a statement list, one statement per line, at the given nesting level.
    pub fn print_statements(&self, statements: &[Statement], level: usize) -> String {
        let mut out = String::new();
        self.write_statements(&mut out, statements, level);
        out
    }

    pub fn print_method(&self, method: &MethodDeclaration, level: usize) -> String {
        let mut out = String::new();
        self.write_method(&mut out, method, level);
        out
    }

    /// Renders the namespace, usings and class shell around every member.
    pub fn print_class(&self, class: &ClassDeclaration) -> String {
        let mut out = String::new();
        for using in &class.usings {
            out.push_str(&format!("using {};\n", using));
        }
        if !class.usings.is_empty() {
            out.push('\n');
        }

        let namespaced = !class.namespace.is_empty();
        let level = if namespaced { 1 } else { 0 };
        if namespaced {
            out.push_str(&format!("namespace {}\n{{\n", class.namespace));
        }

        self.line(&mut out, level, &match &class.base_class {
            Some(base) => format!("public partial class {} : {}", class.name, base),
            None => format!("public partial class {}", class.name),
        });
        self.line(&mut out, level, "{");

        for field in &class.fields {
            self.line(&mut out, level + 1, &Self::field_text(field));
        }
        for (i, method) in class.methods.iter().enumerate() {
            if i > 0 || !class.fields.is_empty() {
                out.push('\n');
            }
            self.write_method(&mut out, method, level + 1);
        }

        self.line(&mut out, level, "}");
        if namespaced {
            out.push_str("}\n");
        }
        out
    }

    fn field_text(field: &FieldDeclaration) -> String {
        let modifier = if field.is_static { " static" } else { "" };
        format!(
            "{}{} {} {};",
            field.accessibility, modifier, field.type_name, field.name
        )
    }

    fn write_method(&self, out: &mut String, method: &MethodDeclaration, level: usize) {
        let mut modifiers = vec![method.accessibility.to_string()];
        if method.is_static {
            modifiers.push("static".to_string());
        }
        if method.is_virtual {
            modifiers.push("virtual".to_string());
        }

        self.line(out, level, &format!(
            "{} {} {}({})",
            modifiers.join(" "),
            method.return_type,
            method.name,
            method.parameters.iter().join(", ")
        ));
        self.line(out, level, "{");
        self.write_statements(out, &method.body, level + 1);
        self.line(out, level, "}");
    }

    fn write_statements(&self, out: &mut String, statements: &[Statement], level: usize) {
        for (i, statement) in statements.iter().enumerate() {
            match statement {
                // A label must be followed by a statement.
                Statement::Label(label) if i + 1 == statements.len() => {
                    self.line(out, level.saturating_sub(1), &format!("{}: ;", label));
                }
                Statement::Label(label) => {
                    self.line(out, level.saturating_sub(1), &format!("{}:", label));
                }
                Statement::Foreach {
                    item,
                    collection,
                    body,
                } => {
                    self.line(out, level, &format!("foreach (var {} in {})", item, collection));
                    self.line(out, level, "{");
                    self.write_statements(out, body, level + 1);
                    self.line(out, level, "}");
                }
                Statement::Raw(text) => {
                    for line in dedent(text) {
                        self.line(out, level, &line);
                    }
                }
                other => self.line(out, level, &other.to_string()),
            }
        }
    }

    fn line(&self, out: &mut String, level: usize, text: &str) {
        if !text.is_empty() {
            for _ in 0..level {
                out.push_str(&self.indent);
            }
            out.push_str(text);
        }
        out.push('\n');
    }
}

/// Strips blank edges and the space/tab indentation common to every non-blank line.
fn dedent(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let first = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let last = lines.iter().rposition(|l| !l.is_empty()).map_or(first, |p| p + 1);
    let lines = &lines[first..last];

    let common = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    // Only ASCII bytes are counted, so `common` is always a char boundary.
    lines
        .iter()
        .map(|l| l.get(common..).unwrap_or(*l).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Value};

    #[test]
    fn test_labels_are_outdented_and_terminated() {
        let statements = vec![
            Statement::IfGoto {
                condition: Expression::Literal(Value::Bool(true)),
                label: "block2".to_string(),
            },
            Statement::Return,
            Statement::Label("block2".to_string()),
        ];
        let text = CodePrinter::new("  ").print_statements(&statements, 1);
        assert_eq!(text, "  if (true) goto block2;\n  return;\nblock2: ;\n");
    }

    #[test]
    fn test_raw_fragments_are_dedented() {
        let statements = vec![Statement::Raw("\n    a = 1;\n      b = 2;\n".to_string())];
        let text = CodePrinter::new("\t").print_statements(&statements, 1);
        assert_eq!(text, "\ta = 1;\n\t  b = 2;\n");
    }

    #[test]
    fn test_unicode_indentation_is_kept() {
        let statements = vec![Statement::Raw("\u{a0}a = 1;\n b = 2;".to_string())];
        let text = CodePrinter::default().print_statements(&statements, 0);
        assert_eq!(text, "\u{a0}a = 1;\n b = 2;\n");

        let statements = vec![Statement::Raw("  \u{a0}a = 1;\n  b = 2;".to_string())];
        let text = CodePrinter::default().print_statements(&statements, 0);
        assert_eq!(text, "\u{a0}a = 1;\nb = 2;\n");
    }
}
