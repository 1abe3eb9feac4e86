//! Per-kind lowering of blocks into statements and expressions.

use super::context::CompilerContext;
use super::freeform;
use crate::ast::{Expression, Statement};
use crate::error::CompileError;
use crate::graph::{
    Block, BlockKind, FALSE_SLOT, FunctionCall, ITEM_SLOT, LOOP_SLOT, RefKind, Slot,
    SlotDirection, SlotKind, THIS_SLOT, TRUE_SLOT,
};

/// Appends the statements of an execution block to the current basic block.
pub(super) fn generate_code<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
) -> Result<(), CompileError> {
    match &block.kind {
        BlockKind::Start => Ok(()),
        BlockKind::ConditionalBranch => conditional_branch(ctx, block),
        BlockKind::Foreach => foreach(ctx, block),
        BlockKind::VariableSet { name } => {
            ctx.check_variable(block.id, name);
            let input = ctx.require_slot(block, SlotDirection::Input, SlotKind::Value, None)?;
            let value = ctx.resolve_expression(input.id)?;
            ctx.emit(Statement::Assign {
                target: name.clone(),
                value,
            });
            Ok(())
        }
        BlockKind::FreeformCode { code } => freeform::generate_code(ctx, block, code),
        BlockKind::FunctionCall(call) => function_call(ctx, block, call),
        BlockKind::VariableGet { .. } | BlockKind::FreeformExpression { .. } => Ok(()),
    }
}

/// Produces the value of an expression block's output.
pub(super) fn generate_expression<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
    output: &'a Slot,
) -> Result<Expression, CompileError> {
    match &block.kind {
        BlockKind::VariableGet { name } => {
            ctx.check_variable(block.id, name);
            Ok(Expression::identifier(name.clone()))
        }
        BlockKind::FreeformExpression { expression } => {
            freeform::generate_expression(ctx, block, expression)
        }
        other => {
            ctx.error(
                block.id,
                format!(
                    "{} blocks cannot produce output {} as an expression",
                    other.title(),
                    output.display_name()
                ),
            );
            Ok(Expression::unknown())
        }
    }
}

fn conditional_branch<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
) -> Result<(), CompileError> {
    // The False target is created first so it directly follows the branch and falls through.
    let false_slot =
        ctx.require_slot(block, SlotDirection::Output, SlotKind::Execution, Some(FALSE_SLOT))?;
    if let Some(target) = ctx.index.execution_target(false_slot.id) {
        ctx.basic_block_for(target)?;
    }

    let true_slot =
        ctx.require_slot(block, SlotDirection::Output, SlotKind::Execution, Some(TRUE_SLOT))?;
    if let Some(target) = ctx.index.execution_target(true_slot.id) {
        let condition_slot =
            ctx.require_slot(block, SlotDirection::Input, SlotKind::Value, None)?;
        let condition = ctx.resolve_expression(condition_slot.id)?;
        let serial = ctx.basic_block_for(target)?;
        let label = ctx.label_for(serial);
        ctx.emit(Statement::IfGoto { condition, label });
    }
    Ok(())
}

fn foreach<'a>(ctx: &mut CompilerContext<'a>, block: &'a Block) -> Result<(), CompileError> {
    let item_slot = ctx.require_slot(block, SlotDirection::Output, SlotKind::Value, Some(ITEM_SLOT))?;
    let collection_slot = ctx.require_slot(block, SlotDirection::Input, SlotKind::Value, None)?;
    let loop_slot =
        ctx.require_slot(block, SlotDirection::Output, SlotKind::Execution, Some(LOOP_SLOT))?;

    let options = ctx.options;
    let item = ctx.register_local(item_slot.id, &options.loop_item_prefix);
    let collection = ctx.resolve_expression(collection_slot.id)?;
    let body = ctx.compile_loop_body(loop_slot.id)?;

    ctx.emit(Statement::Foreach {
        item,
        collection,
        body,
    });
    Ok(())
}

fn function_call<'a>(
    ctx: &mut CompilerContext<'a>,
    block: &'a Block,
    call: &'a FunctionCall,
) -> Result<(), CompileError> {
    let receiver = if call.is_member_call {
        let this = ctx.require_slot(block, SlotDirection::Input, SlotKind::Value, Some(THIS_SLOT))?;
        Some(ctx.resolve_expression(this.id)?)
    } else {
        call.declaring_type.clone().map(Expression::Identifier)
    };

    let mut arguments = Vec::with_capacity(call.parameters.len());
    for parameter in &call.parameters {
        let slot = ctx.require_slot(
            block,
            SlotDirection::Input,
            SlotKind::Value,
            Some(parameter.name.as_str()),
        )?;
        if parameter.ref_kind != RefKind::None {
            ctx.error(
                block.id,
                format!(
                    "Parameter '{}' of '{}' is passed by {}, which is not supported",
                    parameter.name,
                    call.name,
                    if parameter.ref_kind == RefKind::Ref { "ref" } else { "out" }
                ),
            );
            continue;
        }
        arguments.push(ctx.resolve_expression(slot.id)?);
    }

    let expression = Expression::Call {
        receiver: receiver.map(Box::new),
        function: call.name.clone(),
        arguments,
    };

    let result = block.find_slot(SlotDirection::Output, SlotKind::Value, None);
    match result {
        Some(slot) if ctx.index.has_targets(slot.id) => {
            let options = ctx.options;
            let name = ctx.register_local(slot.id, &options.call_result_prefix);
            ctx.emit(Statement::Declare {
                name,
                type_name: None,
                value: Some(expression),
            });
        }
        _ => ctx.emit(Statement::Expression(expression)),
    }
    Ok(())
}
