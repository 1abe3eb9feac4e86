//! Lowers the methods of a [`Script`] into a class of structured code.
//!
//! Each method is compiled by its own [`context::CompilerContext`]: the execution wiring is
//! turned into basic blocks, blocks are generated in queue order, and the basic blocks are
//! concatenated with gotos wherever the next block does not directly follow. Problems that do
//! not prevent code generation are recorded as diagnostics; structural errors abort only the
//! method they occur in.

mod codegen;
mod context;
mod freeform;
mod index;
pub mod options;
pub mod reachability;

pub use options::{CompilerOptions, ReachabilityStrategy};
pub use reachability::{ExecutionGraph, Reachability, ReachabilityMap, classify};

use crate::analysis::{FragmentAnalyzer, LexicalAnalyzer};
use crate::ast::{ClassDeclaration, FieldDeclaration, MethodDeclaration};
use crate::diagnostics::{DiagnosticLog, Severity};
use crate::error::CompileError;
use crate::graph::{BlockId, BlockKind, Method, Script};
use crate::printer::CodePrinter;
use ahash::AHashSet;
use context::CompilerContext;
use serde::{Deserialize, Serialize};

/// The outcome of compiling one method.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMethod {
    pub declaration: MethodDeclaration,
    pub diagnostics: DiagnosticLog,
}

/// Diagnostics of one method, and the fatal error that stopped it, if any.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MethodReport {
    pub method: String,
    pub diagnostics: DiagnosticLog,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompiledScript {
    pub class: ClassDeclaration,
    pub reports: Vec<MethodReport>,
}

impl CompiledScript {
    pub fn report(&self, method: &str) -> Option<&MethodReport> {
        self.reports.iter().find(|r| r.method == method)
    }

    /// Whether every method compiled without fatal errors or error diagnostics.
    pub fn is_clean(&self) -> bool {
        self.reports
            .iter()
            .all(|r| r.error.is_none() && !r.diagnostics.has_errors())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.reports.iter().map(|r| r.diagnostics.count(severity)).sum()
    }

    pub fn source(&self, printer: &CodePrinter) -> String {
        printer.print_class(&self.class)
    }
}

pub struct Compiler {
    script: Script,
    options: CompilerOptions,
    analyzer: Box<dyn FragmentAnalyzer>,
}

pub struct CompilerBuilder {
    script: Script,
    options: CompilerOptions,
    analyzer: Option<Box<dyn FragmentAnalyzer>>,
}

impl CompilerBuilder {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            options: CompilerOptions::default(),
            analyzer: None,
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the analyzer used for free-form fragments.
    pub fn with_analyzer(mut self, analyzer: Box<dyn FragmentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn build(self) -> Compiler {
        // The default analyzer treats script members as resolved names.
        let analyzer = self.analyzer.unwrap_or_else(|| {
            Box::new(LexicalAnalyzer::default().with_known_identifiers(
                self.script.properties.iter().map(|p| p.name.clone()),
            ))
        });
        Compiler {
            script: self.script,
            options: self.options,
            analyzer,
        }
    }
}

impl Compiler {
    pub fn builder(script: Script) -> CompilerBuilder {
        CompilerBuilder::new(script)
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn printer(&self) -> CodePrinter {
        CodePrinter::new(self.options.indent.clone())
    }

    /// Compiles every method of the script into one class.
    ///
    /// A method that fails with a fatal error is left out of the class; its report carries the
    /// error, and the remaining methods are unaffected.
    pub fn compile(&self) -> CompiledScript {
        tracing::info!(
            script = %self.script.name,
            methods = self.script.methods.len(),
            "compiling script"
        );

        let fields = self
            .script
            .properties
            .iter()
            .map(|p| FieldDeclaration {
                accessibility: p.accessibility,
                is_static: p.is_static,
                type_name: p.type_name.clone(),
                name: p.name.clone(),
            })
            .collect();

        let mut methods = Vec::new();
        let mut reports = Vec::new();
        for method in &self.script.methods {
            match self.compile_method(method) {
                Ok(compiled) => {
                    methods.push(compiled.declaration);
                    reports.push(MethodReport {
                        method: method.name.clone(),
                        diagnostics: compiled.diagnostics,
                        error: None,
                    });
                }
                Err(error) => {
                    tracing::error!(method = %method.name, %error, "method compilation failed");
                    reports.push(MethodReport {
                        method: method.name.clone(),
                        diagnostics: DiagnosticLog::new(),
                        error: Some(error.to_string()),
                    });
                }
            }
        }

        let class = ClassDeclaration {
            namespace: self.script.namespace.clone(),
            usings: self.script.usings.clone(),
            name: self.script.name.clone(),
            base_class: self.script.base_class.clone(),
            fields,
            methods,
        };
        CompiledScript { class, reports }
    }

    /// Compiles a single method of this script (or a compatible one) into a declaration.
    pub fn compile_method(&self, method: &Method) -> Result<CompiledMethod, CompileError> {
        let span = tracing::info_span!("compile_method", method = %method.name);
        let _guard = span.enter();

        let starts: Vec<BlockId> = method
            .blocks()
            .filter(|b| matches!(b.kind, BlockKind::Start))
            .map(|b| b.id)
            .collect();
        if starts.len() > 1 {
            return Err(CompileError::MultipleStartBlocks {
                method: method.name.clone(),
                count: starts.len(),
            });
        }

        let variables: AHashSet<String> = self
            .script
            .properties
            .iter()
            .map(|p| p.name.clone())
            .chain(method.parameters.iter().map(|p| p.name.clone()))
            .collect();

        let mut context =
            CompilerContext::new(method, &self.options, self.analyzer.as_ref(), variables)?;
        let body = match starts.first() {
            Some(&entry) => context.compile_method(entry)?,
            None => {
                context.diagnostics_mut().warning(None, format!(
                    "Method '{}' has no start block; its body is empty",
                    method.name
                ));
                Vec::new()
            }
        };
        let diagnostics = context.into_diagnostics();

        tracing::info!(
            statements = body.len(),
            diagnostics = diagnostics.len(),
            "compiled method"
        );

        Ok(CompiledMethod {
            declaration: MethodDeclaration {
                accessibility: method.accessibility,
                is_static: method.is_static,
                is_virtual: method.is_virtual,
                return_type: method.return_type.clone(),
                name: method.name.clone(),
                parameters: method.parameters.clone(),
                body,
            },
            diagnostics,
        })
    }
}
