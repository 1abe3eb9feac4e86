//! Identifier and data-flow analysis of embedded code fragments.
//!
//! Free-form blocks embed raw code. The compiler never interprets that code itself; it asks a
//! [`FragmentAnalyzer`] which identifiers the fragment leaves unresolved, how each of them is
//! used, and where they occur, then derives slots and substitutions from the answer.

mod lexer;
mod lexical;

pub use lexer::{Token, TokenKind, tokenize};
pub use lexical::LexicalAnalyzer;

use crate::diagnostics::Diagnostic;
use std::ops::Range;

/// How a fragment uses an identifier it does not resolve itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierRole {
    /// Read before any write.
    Input,
    /// Read and written; the incoming value matters and the updated value flows out.
    InputOutput,
    /// Declared (or assigned) by the fragment and available after it.
    Output,
}

impl IdentifierRole {
    pub fn is_input(self) -> bool {
        matches!(self, IdentifierRole::Input | IdentifierRole::InputOutput)
    }

    pub fn is_output(self) -> bool {
        matches!(self, IdentifierRole::Output | IdentifierRole::InputOutput)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierUsage {
    pub name: String,
    pub role: IdentifierRole,
    /// The fragment declares this name itself (only meaningful for outputs).
    pub declared: bool,
}

/// A free-standing occurrence of a slot-bound identifier, as a byte range of the fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub name: String,
    pub span: Range<usize>,
}

/// A final `return <expr>;` statement yielding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingReturn {
    /// From the `return` keyword through the terminating `;`.
    pub statement: Range<usize>,
    pub expression: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentAnalysis {
    /// Slot-worthy identifiers, in order of first appearance.
    pub identifiers: Vec<IdentifierUsage>,
    pub occurrences: Vec<Occurrence>,
    pub trailing_return: Option<TrailingReturn>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FragmentAnalysis {
    pub fn usage(&self, name: &str) -> Option<&IdentifierUsage> {
        self.identifiers.iter().find(|u| u.name == name)
    }

    pub fn occurrences_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Occurrence> {
        self.occurrences.iter().filter(move |o| o.name == name)
    }
}

/// The identifier/data-flow analysis facility consumed by free-form blocks.
pub trait FragmentAnalyzer: Send + Sync {
    /// Analyses a sequence of statements.
    fn analyze_statements(&self, code: &str) -> FragmentAnalysis;

    /// Analyses a single expression; every unresolved identifier is an input.
    fn analyze_expression(&self, code: &str) -> FragmentAnalysis;
}
