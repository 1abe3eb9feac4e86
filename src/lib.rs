//! # Kairo - Visual Script Compiler
//!
//! **Kairo** lowers node-and-wire visual scripts into structured imperative code. A script's
//! methods are graphs of blocks: execution blocks act as statements and are wired together by
//! execution links, expression blocks produce values that flow along value links. The compiler
//! builds a control-flow graph from the execution wiring, checks that every value is computed
//! before it is read, compiles loop bodies as nested scopes and emits C#-style source.
//!
//! ## Core Workflow
//!
//! 1.  **Build or load a graph**: create a [`graph::Script`] with the editing API, load one from
//!     JSON, or implement [`graph::IntoScript`] for your own editor format.
//! 2.  **Compile**: use `Compiler::builder` to configure options and the fragment analyzer,
//!     then call `compile`.
//! 3.  **Inspect**: every method comes with its diagnostics; print the class with a
//!     [`printer::CodePrinter`] or persist it with [`compiler::CompiledScript::save`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut method = Method::new("Run");
//!     let start = method.add_block(BlockKind::Start);
//!     let set = method.add_block(BlockKind::VariableSet { name: "x".to_string() });
//!     method.link_execution(start, None, set)?;
//!
//!     let value = method
//!         .find_slot(set, SlotDirection::Input, SlotKind::Value, None)
//!         .ok_or("missing value slot")?;
//!     method.set_slot_value(value, Some(Value::from(5)))?;
//!
//!     let script = Script::new("Game", "Player")
//!         .with_property(Property::new("x", "int"))
//!         .with_method(method);
//!
//!     let compiler = Compiler::builder(script).build();
//!     let compiled = compiler.compile();
//!
//!     // public void Run() { x = 5; }
//!     println!("{}", compiled.source(&compiler.printer()));
//!     for report in &compiled.reports {
//!         for diagnostic in report.diagnostics.entries() {
//!             println!("{}: {}", report.method, diagnostic);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod artifact;
pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod printer;
