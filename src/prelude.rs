//! Prelude module for convenient imports
//!
//! Re-exports the types needed to build a script graph, compile it and print the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let script = Script::from_json(&std::fs::read_to_string("path/to/script.json")?)?;
//! let compiler = Compiler::builder(script).build();
//! let compiled = compiler.compile();
//!
//! println!("{}", compiled.source(&compiler.printer()));
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{
    Accessibility, Block, BlockId, BlockKind, FunctionCall, IntoScript, Link, LinkId, Method,
    Parameter, Property, RefKind, Script, Slot, SlotDirection, SlotId, SlotKind,
};

// Compilation
pub use crate::compiler::{
    CompiledMethod, CompiledScript, Compiler, CompilerOptions, MethodReport, Reachability,
    ReachabilityStrategy,
};
pub use crate::diagnostics::{Diagnostic, DiagnosticLog, Severity};

// Generated code
pub use crate::ast::{Expression, Statement, Value};
pub use crate::printer::CodePrinter;

// Analysis
pub use crate::analysis::{FragmentAnalyzer, LexicalAnalyzer};

// Error types
pub use crate::error::{ArtifactError, CompileError, GraphError, ScriptConversionError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
