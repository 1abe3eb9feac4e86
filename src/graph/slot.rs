use super::{BlockId, SlotId};
use crate::ast::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    Value,
    Execution,
}

/// Behavioural flags attached to a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotFlags {
    /// Control flow follows this execution output automatically once the block has run.
    pub auto_flow: bool,
}

impl SlotFlags {
    pub const NONE: SlotFlags = SlotFlags { auto_flow: false };
    pub const AUTO_FLOW: SlotFlags = SlotFlags { auto_flow: true };
}

/// A typed connection point on a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    /// The owning block.
    pub block: BlockId,
    pub direction: SlotDirection,
    pub kind: SlotKind,
    pub name: Option<String>,
    pub type_name: Option<String>,
    /// Literal used when nothing is linked to this slot.
    pub value: Option<Value>,
    pub flags: SlotFlags,
}

impl Slot {
    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == SlotDirection::Output
    }

    pub fn is_execution(&self) -> bool {
        self.kind == SlotKind::Execution
    }

    /// Whether this slot answers a `(direction, kind, name)` lookup.
    pub fn matches(&self, direction: SlotDirection, kind: SlotKind, name: Option<&str>) -> bool {
        self.direction == direction && self.kind == kind && self.name.as_deref() == name
    }

    /// Label used in diagnostics.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("'{}'", name),
            None => format!("#{}", self.id),
        }
    }
}

/// The shape of a slot as produced by a block's configuration, before it is given an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDefinition {
    pub direction: SlotDirection,
    pub kind: SlotKind,
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub flags: SlotFlags,
}

impl SlotDefinition {
    fn new(direction: SlotDirection, kind: SlotKind, name: Option<&str>) -> Self {
        Self {
            direction,
            kind,
            name: name.map(str::to_string),
            type_name: None,
            flags: SlotFlags::NONE,
        }
    }

    pub fn execution_input() -> Self {
        Self::new(SlotDirection::Input, SlotKind::Execution, None)
    }

    /// The unnamed execution output that control falls into after the block ran.
    pub fn auto_flow_output() -> Self {
        Self::named_execution_output(None).auto_flow()
    }

    pub fn named_execution_output(name: Option<&str>) -> Self {
        Self::new(SlotDirection::Output, SlotKind::Execution, name)
    }

    pub fn value_input(name: Option<&str>) -> Self {
        Self::new(SlotDirection::Input, SlotKind::Value, name)
    }

    pub fn value_output(name: Option<&str>) -> Self {
        Self::new(SlotDirection::Output, SlotKind::Value, name)
    }

    pub fn auto_flow(mut self) -> Self {
        self.flags = SlotFlags::AUTO_FLOW;
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn matches(&self, slot: &Slot) -> bool {
        slot.matches(self.direction, self.kind, self.name.as_deref())
    }

    pub(crate) fn instantiate(self, id: SlotId, block: BlockId) -> Slot {
        Slot {
            id,
            block,
            direction: self.direction,
            kind: self.kind,
            name: self.name,
            type_name: self.type_name,
            value: None,
            flags: self.flags,
        }
    }
}
