use crate::graph::{BlockId, LinkId, SlotId};
use thiserror::Error;

/// Errors raised while editing a method graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Block '{0}' does not exist in this method")]
    BlockNotFound(BlockId),

    #[error("Slot '{0}' does not exist in this method")]
    SlotNotFound(SlotId),

    #[error("Block '{block}' has no {description} slot")]
    MissingSlot { block: BlockId, description: String },

    #[error("Link '{0}' does not exist in this method")]
    LinkNotFound(LinkId),

    #[error("A link must go from an output slot to an input slot (from '{from}', to '{to}')")]
    InvalidDirection { from: SlotId, to: SlotId },

    #[error("Cannot link slot '{from}' to slot '{to}': {message}")]
    KindMismatch {
        from: SlotId,
        to: SlotId,
        message: String,
    },

    #[error("Value input slot '{0}' already has an incoming link")]
    InputAlreadyLinked(SlotId),

    #[error("Execution output slot '{0}' already has an outgoing link")]
    ExecutionAlreadyLinked(SlotId),

    #[error("Execution slot '{0}' cannot carry a literal value")]
    ExecutionSlotValue(SlotId),

    #[error("Block '{0}' cannot feed one of its own value inputs")]
    SelfLink(BlockId),

    #[error("Parameter '{0}' is already declared")]
    DuplicateParameter(String),

    #[error("Parameter '{0}' is not declared")]
    ParameterNotFound(String),
}

/// Fatal errors that abort the compilation of a single method.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(
        "Block '{block_id}' is reached from two different control contexts; a block can only belong to one function body or loop body"
    )]
    BlockReused { block_id: BlockId },

    #[error("Block '{block_id}' is missing its required {description} slot")]
    MissingSlot {
        block_id: BlockId,
        description: String,
    },

    #[error("Link '{link_id}' references slot '{slot_id}', which does not exist")]
    DanglingLink { link_id: LinkId, slot_id: SlotId },

    #[error("Method '{method}' has {count} start blocks, expected at most one")]
    MultipleStartBlocks { method: String, count: usize },

    #[error("Block '{0}' was not found in the method graph")]
    BlockNotFound(BlockId),
}

/// Errors that can occur when converting a custom user format into a kairo `Script`.
#[derive(Error, Debug, Clone)]
pub enum ScriptConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors that can occur while persisting or loading compiled artifacts.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Artifact error: {0}")]
    Generic(String),
}
