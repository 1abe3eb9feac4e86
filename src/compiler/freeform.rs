//! Lowering of blocks that embed raw code.
//!
//! The fragment text is kept as written; only the identifiers bound to slots are rewritten,
//! using the byte spans reported by the analyzer.

use super::context::CompilerContext;
use crate::analysis::{FragmentAnalysis, IdentifierRole};
use crate::ast::{Expression, Statement};
use crate::error::CompileError;
use crate::graph::{Block, SlotDirection, SlotKind};
use std::ops::Range;

pub(super) fn generate_code<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
    code: &str,
) -> Result<(), CompileError> {
    let analysis = ctx.analyzer.analyze_statements(code);
    ctx.forward_fragment_diagnostics(block.id, analysis.diagnostics.clone());
    let options = ctx.options;
    let prefix = options.local_prefix.as_str();

    let mut declarations = Vec::new();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for usage in &analysis.identifiers {
        let name = usage.name.as_str();
        let input = block.find_slot(SlotDirection::Input, SlotKind::Value, Some(name));
        let output = block.find_slot(SlotDirection::Output, SlotKind::Value, Some(name));

        let replacement = match (usage.role, input, output) {
            (IdentifierRole::Input, Some(input), _) => {
                ctx.resolve_expression(input.id)?.to_operand()
            }
            (IdentifierRole::InputOutput, Some(input), Some(output)) => {
                let value = ctx.resolve_expression(input.id)?;
                let local = ctx.register_local(output.id, prefix);
                declarations.push(Statement::Declare {
                    name: local.clone(),
                    type_name: None,
                    value: Some(value),
                });
                local
            }
            (IdentifierRole::Output, _, Some(output)) => {
                let local = ctx.register_local(output.id, prefix);
                if !usage.declared {
                    declarations.push(Statement::Declare {
                        name: local.clone(),
                        type_name: None,
                        value: None,
                    });
                }
                local
            }
            _ => {
                ctx.warning(
                    block.id,
                    format!(
                        "Identifier '{}' has no matching slot; the block's slots are out of date",
                        name
                    ),
                );
                continue;
            }
        };
        edits.extend(
            analysis
                .occurrences_of(name)
                .map(|o| (o.span.clone(), replacement.clone())),
        );
    }

    if let Some(trailing) = &analysis.trailing_return {
        match block.find_slot(SlotDirection::Output, SlotKind::Value, None) {
            Some(result) => {
                let local = ctx.register_local(result.id, prefix);
                edits.push((
                    trailing.statement.start..trailing.expression.start,
                    format!("var {} = ", local),
                ));
            }
            None => ctx.warning(
                block.id,
                "The fragment returns a value but the block has no result slot",
            ),
        }
    }

    for declaration in declarations {
        ctx.emit(declaration);
    }
    let text = apply_edits(code, edits);
    if !text.trim().is_empty() {
        ctx.emit(Statement::Raw(text));
    }
    Ok(())
}

pub(super) fn generate_expression<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
    expression: &str,
) -> Result<Expression, CompileError> {
    let analysis = ctx.analyzer.analyze_expression(expression);
    ctx.forward_fragment_diagnostics(block.id, analysis.diagnostics.clone());

    let edits = substitute_inputs(ctx, block, &analysis)?;
    let text = apply_edits(expression, edits);
    let text = text.trim();

    if is_identifier(text) {
        Ok(Expression::identifier(text))
    } else {
        Ok(Expression::Raw(text.to_string()))
    }
}

fn substitute_inputs<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
    analysis: &FragmentAnalysis,
) -> Result<Vec<(Range<usize>, String)>, CompileError> {
    let mut edits = Vec::new();
    for usage in &analysis.identifiers {
        let Some(input) =
            block.find_slot(SlotDirection::Input, SlotKind::Value, Some(usage.name.as_str()))
        else {
            continue;
        };
        let replacement = ctx.resolve_expression(input.id)?.to_operand();
        edits.extend(
            analysis
                .occurrences_of(&usage.name)
                .map(|o| (o.span.clone(), replacement.clone())),
        );
    }
    Ok(edits)
}

/// Applies non-overlapping replacements to `source`.
fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        if range.start < cursor || range.end > source.len() {
            continue;
        }
        out.push_str(&source[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
