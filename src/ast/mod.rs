//! The structured code produced by the compiler.
//!
//! Expressions and statements are kept as a small tree rather than text so the shape of the
//! generated body (fallthrough, gotos, labels, nested loops) can be inspected directly; the
//! [`crate::printer::CodePrinter`] turns it into source text.

pub mod declaration;
pub mod expression;
pub mod statement;
pub mod value;

pub use declaration::*;
pub use expression::*;
pub use statement::*;
pub use value::*;
