use super::lexer::{TYPE_KEYWORDS, Token, TokenKind, tokenize};
use super::{
    FragmentAnalysis, FragmentAnalyzer, IdentifierRole, IdentifierUsage, Occurrence,
    TrailingReturn,
};
use crate::diagnostics::Diagnostic;
use ahash::{AHashMap, AHashSet};

/// Type and namespace names that resolve in the embedding scope of generated code.
const DEFAULT_KNOWN: &[&str] = &[
    "System", "Math", "MathF", "Console", "String", "Convert", "Enumerable", "List", "Dictionary",
    "HashSet", "Array", "Object", "DateTime", "TimeSpan", "Guid", "Random", "Debug", "Trace",
    "Task", "Nullable", "Tuple", "ValueTuple", "StringBuilder", "Exception",
    "ArgumentException", "InvalidOperationException", "NotSupportedException", "Int32", "Int64",
    "Single", "Double", "Boolean", "Char", "Byte", "Vector2", "Vector3", "Vector4", "Quaternion",
    "Matrix", "Color",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug, Clone, Copy)]
struct Declaration {
    top_level: bool,
    initialized: bool,
}

#[derive(Default)]
struct Scan {
    order: Vec<String>,
    accesses: AHashMap<String, Vec<Access>>,
    occurrences: Vec<Occurrence>,
    declarations: AHashMap<String, Declaration>,
}

impl Scan {
    fn record(&mut self, name: &str, access: Access, token: &Token) {
        if !self.accesses.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.accesses.entry(name.to_string()).or_default().push(access);
        self.occurrences.push(Occurrence {
            name: name.to_string(),
            span: token.span.clone(),
        });
    }

    fn declare(&mut self, name: &str, declaration: Declaration) {
        self.declarations.entry(name.to_string()).or_insert(declaration);
    }
}

/// A token-level approximation of a semantic identifier analysis for C-like fragments.
///
/// Identifiers are unresolved unless they are keywords, member names (after `.`), called
/// names, types in declaration position, lambda parameters, locals declared inside nested
/// scopes, or listed as known names.
#[derive(Debug, Clone)]
pub struct LexicalAnalyzer {
    known: AHashSet<String>,
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self {
            known: DEFAULT_KNOWN.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LexicalAnalyzer {
    /// Adds names that resolve in the embedding scope, e.g. script members or imported types.
    pub fn with_known_identifiers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    fn scan(&self, source: &str, tokens: &[Token]) -> Scan {
        let mut scan = Scan::default();
        let text = |i: usize| tokens.get(i).map(|t| t.text(source)).unwrap_or("");
        let mut depth = 0usize;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            let current = token.text(source);

            match token.kind {
                TokenKind::Punct => {
                    match current {
                        "{" => depth += 1,
                        "}" => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    i += 1;
                    continue;
                }
                TokenKind::Number | TokenKind::Text => {
                    i += 1;
                    continue;
                }
                TokenKind::Keyword | TokenKind::Identifier => {}
            }

            if is_statement_start(source, tokens, i) {
                if let Some(name_index) = declaration_name(source, tokens, i) {
                    let name = text(name_index);
                    scan.declare(
                        name,
                        Declaration {
                            top_level: depth == 0,
                            initialized: text(name_index + 1) == "=",
                        },
                    );
                    scan.record(name, Access::Write, &tokens[name_index]);
                    i = name_index + 1;
                    continue;
                }
            }

            if token.kind == TokenKind::Keyword {
                i += 1;
                continue;
            }

            let previous = if i > 0 { text(i - 1) } else { "" };
            let next = text(i + 1);

            let is_member = matches!(previous, "." | "?." | "::");
            let is_type = matches!(previous, "new" | "is" | "as")
                || (previous == "(" && i >= 2 && text(i - 2) == "typeof")
                || tokens
                    .get(i + 1)
                    .is_some_and(|t| t.kind == TokenKind::Identifier);
            let is_call = next == "(";
            let is_named_argument = next == ":" && matches!(previous, "(" | ",");

            if next == "=>" {
                scan.declare(
                    current,
                    Declaration {
                        top_level: false,
                        initialized: false,
                    },
                );
            } else if !(is_member || is_type || is_call || is_named_argument || self.is_known(current))
            {
                let access = match (previous, next) {
                    ("out", _) | (_, "=") => Access::Write,
                    ("ref" | "++" | "--", _) => Access::ReadWrite,
                    (_, "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | "??=")
                    | (_, "++" | "--") => Access::ReadWrite,
                    _ => Access::Read,
                };
                scan.record(current, access, token);
            }
            i += 1;
        }
        scan
    }

    fn finish(scan: Scan, statements: bool) -> (Vec<IdentifierUsage>, Vec<Occurrence>) {
        let mut identifiers = Vec::new();
        for name in &scan.order {
            let usage = match scan.declarations.get(name) {
                Some(declaration) => {
                    if !(statements && declaration.top_level && declaration.initialized) {
                        continue;
                    }
                    IdentifierUsage {
                        name: name.clone(),
                        role: IdentifierRole::Output,
                        declared: true,
                    }
                }
                None => {
                    let accesses = &scan.accesses[name];
                    let role = if !statements {
                        IdentifierRole::Input
                    } else {
                        let written = accesses.iter().any(|a| *a != Access::Read);
                        match accesses.first() {
                            Some(Access::Write) => IdentifierRole::Output,
                            _ if written => IdentifierRole::InputOutput,
                            _ => IdentifierRole::Input,
                        }
                    };
                    IdentifierUsage {
                        name: name.clone(),
                        role,
                        declared: false,
                    }
                }
            };
            identifiers.push(usage);
        }

        let slot_names: AHashSet<&str> = identifiers.iter().map(|u| u.name.as_str()).collect();
        let occurrences = scan
            .occurrences
            .into_iter()
            .filter(|o| slot_names.contains(o.name.as_str()))
            .collect();
        (identifiers, occurrences)
    }
}

impl FragmentAnalyzer for LexicalAnalyzer {
    fn analyze_statements(&self, code: &str) -> FragmentAnalysis {
        let (tokens, mut diagnostics) = tokenize(code);
        diagnostics.extend(check_delimiters(code, &tokens));

        let trailing_return = trailing_return(code, &tokens);
        let scan = self.scan(code, &tokens);
        let (identifiers, occurrences) = Self::finish(scan, true);

        FragmentAnalysis {
            identifiers,
            occurrences,
            trailing_return,
            diagnostics,
        }
    }

    fn analyze_expression(&self, code: &str) -> FragmentAnalysis {
        let (tokens, mut diagnostics) = tokenize(code);
        diagnostics.extend(check_delimiters(code, &tokens));
        if tokens.is_empty() {
            diagnostics.push(Diagnostic::error("Expression is empty"));
        }

        let scan = self.scan(code, &tokens);
        let (identifiers, occurrences) = Self::finish(scan, false);

        FragmentAnalysis {
            identifiers,
            occurrences,
            trailing_return: None,
            diagnostics,
        }
    }
}

fn is_statement_start(source: &str, tokens: &[Token], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    match tokens[i - 1].text(source) {
        ";" | "{" | "}" => true,
        "(" => i >= 2 && matches!(tokens[i - 2].text(source), "foreach" | "for" | "using"),
        _ => false,
    }
}

/// If a local declaration (`Type name =`, `var name;`, `foreach (T name in`) starts at `i`,
/// returns the index of the declared name.
fn declaration_name(source: &str, tokens: &[Token], i: usize) -> Option<usize> {
    let text = |j: usize| tokens.get(j).map(|t| t.text(source)).unwrap_or("");
    let kind = |j: usize| tokens.get(j).map(|t| t.kind);

    let mut j = i;
    match kind(j)? {
        TokenKind::Keyword if TYPE_KEYWORDS.contains(&text(j)) => j += 1,
        TokenKind::Identifier => {
            j += 1;
            while text(j) == "." && kind(j + 1) == Some(TokenKind::Identifier) {
                j += 2;
            }
        }
        _ => return None,
    }

    if text(j) == "<" {
        let mut nesting = 0usize;
        loop {
            match text(j) {
                "<" => nesting += 1,
                ">" => {
                    nesting -= 1;
                    if nesting == 0 {
                        j += 1;
                        break;
                    }
                }
                "," | "." | "[" | "]" | "?" => {}
                _ if matches!(kind(j), Some(TokenKind::Identifier | TokenKind::Keyword)) => {}
                _ => return None,
            }
            j += 1;
        }
    }
    while text(j) == "?" {
        j += 1;
    }
    while text(j) == "[" && text(j + 1) == "]" {
        j += 2;
    }

    if kind(j) != Some(TokenKind::Identifier) {
        return None;
    }
    matches!(text(j + 1), "=" | ";" | "," | "in").then_some(j)
}

fn trailing_return(source: &str, tokens: &[Token]) -> Option<TrailingReturn> {
    let last = tokens.len().checked_sub(1)?;
    if tokens[last].text(source) != ";" {
        return None;
    }

    let depth_zero = tokens[..last]
        .iter()
        .map(|t| match t.text(source) {
            "{" => 1i32,
            "}" => -1,
            _ => 0,
        })
        .sum::<i32>()
        == 0;
    if !depth_zero {
        return None;
    }

    let start = tokens[..last]
        .iter()
        .rposition(|t| matches!(t.text(source), ";" | "{" | "}"))
        .map(|p| p + 1)
        .unwrap_or(0);
    if tokens[start].text(source) != "return" || start + 1 >= last {
        return None;
    }

    Some(TrailingReturn {
        statement: tokens[start].span.start..tokens[last].span.end,
        expression: tokens[start + 1].span.start..tokens[last - 1].span.end,
    })
}

fn check_delimiters(source: &str, tokens: &[Token]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut stack: Vec<&str> = Vec::new();
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Punct) {
        let current = token.text(source);
        let opening = match current {
            "(" | "[" | "{" => {
                stack.push(current);
                continue;
            }
            ")" => "(",
            "]" => "[",
            "}" => "{",
            _ => continue,
        };
        if stack.pop() != Some(opening) {
            diagnostics.push(Diagnostic::error(format!(
                "Unexpected '{}' at offset {}",
                current, token.span.start
            )));
            return diagnostics;
        }
    }
    if let Some(open) = stack.last() {
        diagnostics.push(Diagnostic::error(format!("Unclosed '{}'", open)));
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(analysis: &FragmentAnalysis) -> Vec<(&str, IdentifierRole)> {
        analysis
            .identifiers
            .iter()
            .map(|u| (u.name.as_str(), u.role))
            .collect()
    }

    #[test]
    fn test_inputs_outputs_and_locals() {
        let analyzer = LexicalAnalyzer::default();
        let analysis = analyzer.analyze_statements(
            "var sum = a + b; total = sum * 2; counter++; if (a > 0) { int tmp = 1; }",
        );
        assert_eq!(
            roles(&analysis),
            vec![
                ("sum", IdentifierRole::Output),
                ("a", IdentifierRole::Input),
                ("b", IdentifierRole::Input),
                ("total", IdentifierRole::Output),
                ("counter", IdentifierRole::InputOutput),
            ]
        );
        assert!(analysis.usage("sum").is_some_and(|u| u.declared));
        assert!(analysis.usage("total").is_some_and(|u| !u.declared));
        assert!(analysis.usage("tmp").is_none());
        assert!(analysis.diagnostics.is_empty());
        assert!(analysis.trailing_return.is_none());
    }

    #[test]
    fn test_members_calls_and_known_names_are_resolved() {
        let analyzer = LexicalAnalyzer::default().with_known_identifiers(["Speed"]);
        let analysis =
            analyzer.analyze_statements("entity.Transform.Position = Math.Max(delta, Speed);");
        assert_eq!(
            roles(&analysis),
            vec![("entity", IdentifierRole::Input), ("delta", IdentifierRole::Input)]
        );
    }

    #[test]
    fn test_read_then_write_is_input_output() {
        let analysis = LexicalAnalyzer::default().analyze_statements("x = x + step;");
        // Plain assignment first: the incoming value is never observed.
        assert_eq!(analysis.usage("x").map(|u| u.role), Some(IdentifierRole::Output));

        let analysis = LexicalAnalyzer::default().analyze_statements("log(x); x = 0;");
        assert_eq!(
            analysis.usage("x").map(|u| u.role),
            Some(IdentifierRole::InputOutput)
        );
    }

    #[test]
    fn test_trailing_return() {
        let code = "var d = a - b; return d * d;";
        let analysis = LexicalAnalyzer::default().analyze_statements(code);
        let trailing = analysis.trailing_return.expect("trailing return");
        assert_eq!(&code[trailing.statement.clone()], "return d * d;");
        assert_eq!(&code[trailing.expression.clone()], "d * d");

        let void_return = LexicalAnalyzer::default().analyze_statements("a(); return;");
        assert!(void_return.trailing_return.is_none());

        let nested = LexicalAnalyzer::default().analyze_statements("if (a) { return b; }");
        assert!(nested.trailing_return.is_none());
    }

    #[test]
    fn test_expression_identifiers_are_inputs() {
        let analysis = LexicalAnalyzer::default()
            .analyze_expression("items.Where(i => i > limit).Count() + offset");
        assert_eq!(
            roles(&analysis),
            vec![
                ("items", IdentifierRole::Input),
                ("limit", IdentifierRole::Input),
                ("offset", IdentifierRole::Input),
            ]
        );
        assert_eq!(analysis.occurrences_of("limit").count(), 1);
    }

    #[test]
    fn test_foreach_and_generic_declarations() {
        let analysis = LexicalAnalyzer::default().analyze_statements(
            "List<int> found = new List<int>(); foreach (var v in values) { found.Add(v); }",
        );
        assert_eq!(
            roles(&analysis),
            vec![
                ("found", IdentifierRole::Output),
                ("values", IdentifierRole::Input),
            ]
        );
    }

    #[test]
    fn test_unbalanced_delimiters_are_reported() {
        let analysis = LexicalAnalyzer::default().analyze_statements("foo(a]; b = 1;");
        assert_eq!(analysis.diagnostics.len(), 1);
        assert!(analysis.diagnostics[0].message.contains("Unexpected ']'"));

        let analysis = LexicalAnalyzer::default().analyze_statements("while (a) { b();");
        assert!(analysis.diagnostics[0].message.contains("Unclosed '{'"));
    }
}
