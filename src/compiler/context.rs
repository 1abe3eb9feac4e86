use super::codegen;
use super::index::GraphIndex;
use super::options::CompilerOptions;
use super::reachability::{self, ExecutionGraph, Reachability, ReachabilityMap};
use crate::analysis::FragmentAnalyzer;
use crate::ast::{Expression, Statement};
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::error::CompileError;
use crate::graph::{Block, BlockId, Method, Slot, SlotDirection, SlotId, SlotKind};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// A straight-line run of statements in the control-flow graph under construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BasicBlock {
    /// Position within the owning scope; adjacent indices fall through.
    pub index: usize,
    pub scope: usize,
    pub statements: Vec<Statement>,
    pub next: Option<usize>,
    pub label: Option<String>,
}

/// The part of the lowering state that a loop body replaces while it is compiled.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scope {
    pub id: usize,
    pub queue: VecDeque<(usize, BlockId)>,
    /// Serials of the basic blocks built in this scope, in index order.
    pub blocks: Vec<usize>,
    pub current: Option<(usize, BlockId)>,
    pub in_loop: bool,
}

impl Scope {
    fn new(id: usize, in_loop: bool) -> Self {
        Self {
            id,
            queue: VecDeque::new(),
            blocks: Vec::new(),
            current: None,
            in_loop,
        }
    }
}

/// Lowers one method graph into a statement list.
///
/// A context is single use: it owns every piece of mutable state of one method compile, so
/// separate methods can be compiled independently (and in parallel) from the same script.
pub(crate) struct CompilerContext<'a> {
    pub(crate) index: GraphIndex<'a>,
    pub(crate) options: &'a CompilerOptions,
    pub(crate) analyzer: &'a dyn FragmentAnalyzer,
    graph: ExecutionGraph,
    /// Names that resolve as variables: script properties and method parameters.
    variables: AHashSet<String>,
    entry: Option<BlockId>,

    basic_blocks: Vec<BasicBlock>,
    block_map: AHashMap<BlockId, usize>,
    scope: Scope,
    next_scope: usize,
    reachability: Option<ReachabilityMap>,

    locals: AHashMap<SlotId, String>,
    next_local: usize,
    resolving: AHashSet<SlotId>,

    reported: AHashSet<BlockId>,
    diagnostics: DiagnosticLog,
}

impl<'a> CompilerContext<'a> {
    pub(crate) fn new(
        method: &'a Method,
        options: &'a CompilerOptions,
        analyzer: &'a dyn FragmentAnalyzer,
        variables: AHashSet<String>,
    ) -> Result<Self, CompileError> {
        Ok(Self {
            index: GraphIndex::new(method)?,
            options,
            analyzer,
            graph: ExecutionGraph::from_method(method),
            variables,
            entry: None,
            basic_blocks: Vec::new(),
            block_map: AHashMap::new(),
            scope: Scope::new(0, false),
            next_scope: 1,
            reachability: None,
            locals: AHashMap::new(),
            next_local: 0,
            resolving: AHashSet::new(),
            reported: AHashSet::new(),
            diagnostics: DiagnosticLog::new(),
        })
    }

    pub(crate) fn compile_method(&mut self, entry: BlockId) -> Result<Vec<Statement>, CompileError> {
        self.entry = Some(entry);
        self.basic_block_for(entry)?;
        self.drain_queue()?;
        tracing::debug!(
            basic_blocks = self.scope.blocks.len(),
            "built function body"
        );
        Ok(self.collect_statements())
    }

    #[cfg(test)]
    pub(crate) fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut DiagnosticLog {
        &mut self.diagnostics
    }

    pub(crate) fn into_diagnostics(self) -> DiagnosticLog {
        self.diagnostics
    }

    // --- Control flow ---

    /// The basic block lowering `block`, created and queued on first request.
    ///
    /// A block already lowered in a different scope is a fatal error: its code cannot live
    /// in both a function body and a loop body.
    pub(crate) fn basic_block_for(&mut self, block: BlockId) -> Result<usize, CompileError> {
        if let Some(&serial) = self.block_map.get(&block) {
            if self.basic_blocks[serial].scope != self.scope.id {
                return Err(CompileError::BlockReused { block_id: block });
            }
            return Ok(serial);
        }

        let serial = self.basic_blocks.len();
        self.basic_blocks.push(BasicBlock {
            index: self.scope.blocks.len(),
            scope: self.scope.id,
            statements: Vec::new(),
            next: None,
            label: None,
        });
        self.scope.blocks.push(serial);
        self.scope.queue.push_back((serial, block));
        self.block_map.insert(block, serial);
        Ok(serial)
    }

    /// Labels use the function-wide serial, so they stay unique across nested scopes.
    pub(crate) fn label_for(&mut self, serial: usize) -> String {
        let prefix = &self.options.label_prefix;
        self.basic_blocks[serial]
            .label
            .get_or_insert_with(|| format!("{}{}", prefix, serial))
            .clone()
    }

    /// Appends a statement to the basic block being generated.
    pub(crate) fn emit(&mut self, statement: Statement) {
        if let Some((serial, _)) = self.scope.current {
            self.basic_blocks[serial].statements.push(statement);
        }
    }

    pub(crate) fn current_block(&self) -> Option<BlockId> {
        self.scope.current.map(|(_, block)| block)
    }

    fn drain_queue(&mut self) -> Result<(), CompileError> {
        while let Some((serial, block_id)) = self.scope.queue.pop_front() {
            self.scope.current = Some((serial, block_id));
            let block = self.index.block(block_id)?;
            tracing::trace!(block = %block_id, kind = block.kind.title(), serial, "generating");

            codegen::generate_code(self, block)?;

            if let Some(target) = block
                .auto_flow_slot()
                .and_then(|slot| self.index.execution_target(slot.id))
            {
                let next = self.basic_block_for(target)?;
                self.basic_blocks[serial].next = Some(next);
            }

            match self.basic_blocks[serial].next {
                Some(next) => {
                    if self.basic_blocks[next].index != self.basic_blocks[serial].index + 1 {
                        let label = self.label_for(next);
                        self.emit(Statement::Goto(label));
                    }
                }
                None if !self.scope.queue.is_empty() => {
                    self.emit(if self.scope.in_loop {
                        Statement::Continue
                    } else {
                        Statement::Return
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    fn collect_statements(&self) -> Vec<Statement> {
        let mut statements = Vec::new();
        for &serial in &self.scope.blocks {
            let basic_block = &self.basic_blocks[serial];
            if let Some(label) = &basic_block.label {
                statements.push(Statement::Label(label.clone()));
            }
            statements.extend(basic_block.statements.iter().cloned());
        }
        statements
    }

    /// Compiles the chain hanging off an execution output as the body of a loop.
    ///
    /// The body gets its own queue and basic-block list; the outer scope is restored
    /// unchanged afterwards, whether or not the body compiled.
    pub(crate) fn compile_loop_body(&mut self, output: SlotId) -> Result<Vec<Statement>, CompileError> {
        let Some(target) = self.index.execution_target(output) else {
            return Ok(Vec::new());
        };

        let inner = Scope::new(self.next_scope, true);
        self.next_scope += 1;
        let outer = std::mem::replace(&mut self.scope, inner);

        let result = self
            .basic_block_for(target)
            .and_then(|_| self.drain_queue())
            .map(|_| self.collect_statements());

        self.scope = outer;
        result
    }

    // --- Values ---

    /// Produces the expression a value input evaluates to.
    ///
    /// Unresolvable values never abort compilation: they degrade to the `unknown` sentinel
    /// and record an error diagnostic.
    pub(crate) fn resolve_expression(&mut self, slot_id: SlotId) -> Result<Expression, CompileError> {
        let Some(slot) = self.index.slot(slot_id) else {
            self.diagnostics
                .error(self.current_block(), format!("Slot {} does not exist", slot_id));
            return Ok(Expression::unknown());
        };

        if let Some(source) = self.index.source_of(slot_id) {
            return self.resolve_linked(slot, source);
        }
        if let Some(value) = &slot.value {
            return Ok(Expression::Literal(value.clone()));
        }
        if let Some(name) = &slot.name {
            return Ok(Expression::identifier(name.clone()));
        }

        self.diagnostics.error(
            Some(slot.block),
            format!(
                "Input {} has no incoming link, literal value or name",
                slot.display_name()
            ),
        );
        Ok(Expression::unknown())
    }

    fn resolve_linked(&mut self, slot: &'a Slot, source: &'a Slot) -> Result<Expression, CompileError> {
        let source_block = self.index.block(source.block)?;

        if source_block.is_execution() {
            match self.classify(source_block.id) {
                Reachability::Always => {}
                Reachability::Sometimes => self.diagnostics.error(
                    Some(slot.block),
                    format!(
                        "Input {} reads a value from block {} ({}), which does not always run before it",
                        slot.display_name(),
                        source_block.id,
                        source_block.kind.title()
                    ),
                ),
                Reachability::Never => {
                    self.diagnostics.error(
                        Some(slot.block),
                        format!(
                            "Input {} reads a value from block {} ({}), which never runs before it",
                            slot.display_name(),
                            source_block.id,
                            source_block.kind.title()
                        ),
                    );
                    return Ok(Expression::unknown());
                }
            }
        }

        if let Some(local) = self.locals.get(&source.id) {
            return Ok(Expression::identifier(local.clone()));
        }

        if source_block.kind.is_expression() {
            if !self.resolving.insert(source.id) {
                self.diagnostics.error(
                    Some(source_block.id),
                    format!(
                        "Output {} depends on its own value through a cycle of expression blocks",
                        source.display_name()
                    ),
                );
                return Ok(Expression::unknown());
            }
            let expression = codegen::generate_expression(self, source_block, source);
            self.resolving.remove(&source.id);
            return expression;
        }

        self.diagnostics.error(
            Some(slot.block),
            format!(
                "Output {} of block {} has not been computed at this point",
                source.display_name(),
                source_block.id
            ),
        );
        Ok(Expression::unknown())
    }

    /// Classifies `block` relative to the block currently being generated.
    fn classify(&mut self, block: BlockId) -> Reachability {
        let (Some(entry), Some(current)) = (self.entry, self.current_block()) else {
            return Reachability::Never;
        };
        let stale = self
            .reachability
            .as_ref()
            .is_none_or(|map| map.target() != current);
        if stale {
            self.reachability = Some(reachability::classify(
                &self.graph,
                entry,
                current,
                self.options.reachability,
            ));
        }
        self.reachability
            .as_ref()
            .map_or(Reachability::Never, |map| map.get(block))
    }

    /// Binds a fresh local name to an output slot; repeated calls return the same name.
    pub(crate) fn register_local(&mut self, slot: SlotId, prefix: &str) -> String {
        if let Some(existing) = self.locals.get(&slot) {
            return existing.clone();
        }
        let name = format!("{}{}", prefix, self.next_local);
        self.next_local += 1;
        self.locals.insert(slot, name.clone());
        name
    }

    // --- Helpers for code generation ---

    pub(crate) fn require_slot(
        &self,
        block: &'a Block,
        direction: SlotDirection,
        kind: SlotKind,
        name: Option<&str>,
    ) -> Result<&'a Slot, CompileError> {
        self.index.require_slot(block, direction, kind, name)
    }

    pub(crate) fn error(&mut self, block: BlockId, message: impl Into<String>) {
        self.diagnostics.error(Some(block), message);
    }

    pub(crate) fn warning(&mut self, block: BlockId, message: impl Into<String>) {
        self.diagnostics.warning(Some(block), message);
    }

    /// Warns (once per block) about a variable the script does not declare.
    pub(crate) fn check_variable(&mut self, block: BlockId, name: &str) {
        if !self.variables.contains(name) && self.reported.insert(block) {
            self.warning(
                block,
                format!("Variable '{}' is not a property or parameter of this script", name),
            );
        }
    }

    /// Forwards a fragment's analysis diagnostics, once per block.
    pub(crate) fn forward_fragment_diagnostics(&mut self, block: BlockId, diagnostics: Vec<Diagnostic>) {
        if self.reported.insert(block) {
            for diagnostic in diagnostics {
                self.diagnostics.push(diagnostic.with_block(block));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LexicalAnalyzer;
    use crate::ast::Value;
    use crate::graph::{BlockKind, ITEM_SLOT, LOOP_SLOT};

    fn loop_method() -> (Method, BlockId, BlockId, BlockId) {
        let mut method = Method::new("Run");
        let start = method.add_block(BlockKind::Start);
        let each = method.add_block(BlockKind::Foreach);
        let body = method.add_block(BlockKind::VariableSet {
            name: "x".to_string(),
        });
        method.link_execution(start, None, each).expect("start -> foreach");
        method
            .link_execution(each, Some(LOOP_SLOT), body)
            .expect("loop -> body");
        method
            .link_value(each, Some(ITEM_SLOT), body, None)
            .expect("item -> value");
        (method, start, each, body)
    }

    #[test]
    fn test_loop_body_restores_outer_scope() {
        let (method, start, each, _) = loop_method();
        let options = CompilerOptions::default();
        let analyzer = LexicalAnalyzer::default();
        let mut ctx = CompilerContext::new(&method, &options, &analyzer, AHashSet::new())
            .expect("context");
        ctx.entry = Some(start);

        ctx.basic_block_for(start).expect("entry");
        let serial = ctx.basic_block_for(each).expect("foreach");
        ctx.scope.queue.clear();
        ctx.scope.current = Some((serial, each));
        let before = ctx.scope.clone();

        let loop_slot = method
            .find_slot(each, SlotDirection::Output, SlotKind::Execution, Some(LOOP_SLOT))
            .expect("loop slot");
        let body = ctx.compile_loop_body(loop_slot).expect("body");

        assert_eq!(ctx.scope, before);
        assert_eq!(body.len(), 1);
        // The body's only basic block is numbered from zero in its own scope.
        let inner = ctx.basic_blocks.last().expect("inner block");
        assert_eq!(inner.index, 0);
        assert_ne!(inner.scope, before.id);
    }

    #[test]
    fn test_local_names_are_idempotent() {
        let (method, start, each, body) = loop_method();
        let options = CompilerOptions::default();
        let analyzer = LexicalAnalyzer::default();
        let mut ctx = CompilerContext::new(&method, &options, &analyzer, AHashSet::new())
            .expect("context");
        ctx.entry = Some(start);
        let serial = ctx.basic_block_for(body).expect("body block");
        ctx.scope.current = Some((serial, body));

        let item = method
            .find_slot(each, SlotDirection::Output, SlotKind::Value, Some(ITEM_SLOT))
            .expect("item slot");
        let name = ctx.register_local(item, "item");
        assert_eq!(ctx.register_local(item, "item"), name);

        let input = method
            .find_slot(body, SlotDirection::Input, SlotKind::Value, None)
            .expect("value slot");
        let first = ctx.resolve_expression(input).expect("first");
        let second = ctx.resolve_expression(input).expect("second");
        assert_eq!(first, Expression::identifier(name));
        assert_eq!(first, second);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_literal_and_name_fallbacks() {
        let mut method = Method::new("Run");
        let set = method.add_block(BlockKind::VariableSet {
            name: "x".to_string(),
        });
        let input = method
            .find_slot(set, SlotDirection::Input, SlotKind::Value, None)
            .expect("value slot");
        method
            .set_slot_value(input, Some(Value::from(5)))
            .expect("literal");

        let options = CompilerOptions::default();
        let analyzer = LexicalAnalyzer::default();
        let mut ctx = CompilerContext::new(&method, &options, &analyzer, AHashSet::new())
            .expect("context");
        assert_eq!(
            ctx.resolve_expression(input).expect("resolve"),
            Expression::Literal(Value::Number(5.0))
        );
    }
}
