use crate::diagnostics::Diagnostic;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    /// String or character literal.
    Text,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

pub(crate) const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "base", "bool", "break", "byte", "case", "catch", "char",
    "checked", "class", "const", "continue", "decimal", "default", "delegate", "do", "double",
    "dynamic", "else", "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float",
    "for", "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "nameof", "namespace", "new", "null", "object", "operator", "out", "override",
    "params", "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
    "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw",
    "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "var",
    "virtual", "void", "volatile", "when", "while", "yield",
];

/// Keywords that can start a local declaration.
pub(crate) const TYPE_KEYWORDS: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "dynamic", "float", "int", "long", "object",
    "sbyte", "short", "string", "uint", "ulong", "ushort", "var",
];

// Longest first so the greedy match below picks e.g. `<<=` over `<<`.
const OPERATORS: &[&str] = &[
    "<<=", "??=", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "=>", "??", "?.", "::", "<<",
];

/// Splits C-like source into tokens, skipping whitespace and comments.
///
/// Unterminated literals and comments are reported as diagnostics; the offending text is
/// still returned as a single token so analysis can continue.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let Some(c) = rest.chars().next() else { break };

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if rest.starts_with("//") {
            pos += rest.find('\n').unwrap_or(rest.len());
            continue;
        }

        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(end) => pos += end + 4,
                None => {
                    diagnostics.push(Diagnostic::error("Unterminated block comment"));
                    pos = source.len();
                }
            }
            continue;
        }

        let start = pos;

        if c == '_' || c.is_alphabetic() {
            pos += scan_while(rest, |ch| ch == '_' || ch.is_alphanumeric());
            let kind = if KEYWORDS.contains(&&source[start..pos]) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token {
                kind,
                span: start..pos,
            });
            continue;
        }

        if c.is_ascii_digit() {
            pos += scan_while(rest, |ch| ch == '_' || ch == '.' || ch.is_ascii_alphanumeric());
            tokens.push(Token {
                kind: TokenKind::Number,
                span: start..pos,
            });
            continue;
        }

        let verbatim = rest.starts_with("@\"") || rest.starts_with("$@\"") || rest.starts_with("@$\"");
        if c == '"' || c == '\'' || verbatim || rest.starts_with("$\"") {
            let prefix = rest.find(['"', '\'']).unwrap_or(0);
            let quote = bytes[pos + prefix];
            let body = pos + prefix + 1;
            match scan_literal(&bytes[body..], quote, verbatim) {
                Some(len) => pos = body + len,
                None => {
                    diagnostics.push(Diagnostic::error(format!(
                        "Unterminated {} literal",
                        if quote == b'"' { "string" } else { "character" }
                    )));
                    pos = source.len();
                }
            }
            tokens.push(Token {
                kind: TokenKind::Text,
                span: start..pos,
            });
            continue;
        }

        let len = OPERATORS
            .iter()
            .find(|op| rest.starts_with(**op))
            .map(|op| op.len())
            .unwrap_or(c.len_utf8());
        pos += len;
        tokens.push(Token {
            kind: TokenKind::Punct,
            span: start..pos,
        });
    }

    (tokens, diagnostics)
}

fn scan_while(text: &str, predicate: impl Fn(char) -> bool) -> usize {
    text.char_indices()
        .find(|(_, ch)| !predicate(*ch))
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Returns the length of a literal body including its closing quote.
fn scan_literal(body: &[u8], quote: u8, verbatim: bool) -> Option<usize> {
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        if verbatim && b == quote {
            // `""` is an escaped quote inside a verbatim string.
            if body.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        if !verbatim && b == b'\\' {
            i += 2;
            continue;
        }
        if !verbatim && b == b'\n' {
            return None;
        }
        if b == quote {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}
