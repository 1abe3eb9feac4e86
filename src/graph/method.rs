use super::{Block, BlockId, BlockKind, Link, LinkId, Slot, SlotDirection, SlotId, SlotKind};
use crate::analysis::{FragmentAnalyzer, LexicalAnalyzer};
use crate::ast::Value;
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Accessibility::Public => "public",
            Accessibility::Protected => "protected",
            Accessibility::Internal => "internal",
            Accessibility::Private => "private",
        })
    }
}

/// How an argument is passed to a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub ref_kind: RefKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ref_kind: RefKind::None,
        }
    }

    pub fn by_ref(mut self) -> Self {
        self.ref_kind = RefKind::Ref;
        self
    }

    pub fn by_out(mut self) -> Self {
        self.ref_kind = RefKind::Out;
        self
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ref_kind {
            RefKind::None => {}
            RefKind::Ref => f.write_str("ref ")?,
            RefKind::Out => f.write_str("out ")?,
        }
        write!(f, "{} {}", self.type_name, self.name)
    }
}

/// A function of a script: its signature plus the block graph describing its body.
///
/// The graph is only mutated through this type, which keeps the link invariants intact:
/// links always go from an output to an input of the same kind, a value input has at most
/// one incoming link and an execution output at most one outgoing link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    blocks: BTreeMap<BlockId, Block>,
    #[serde(default)]
    links: BTreeMap<LinkId, Link>,
    #[serde(default)]
    next_id: u32,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accessibility: Accessibility::Public,
            is_static: false,
            is_virtual: false,
            return_type: "void".to_string(),
            parameters: Vec::new(),
            blocks: BTreeMap::new(),
            links: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = is_virtual;
        self
    }

    // --- Parameters ---

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), GraphError> {
        if self.parameters.iter().any(|p| p.name == parameter.name) {
            return Err(GraphError::DuplicateParameter(parameter.name));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn remove_parameter(&mut self, name: &str) -> Result<Parameter, GraphError> {
        let position = self
            .parameters
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| GraphError::ParameterNotFound(name.to_string()))?;
        Ok(self.parameters.remove(position))
    }

    // --- Blocks ---

    /// Adds a block, generating its slots with the default lexical analyzer.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        self.add_block_with(kind, &LexicalAnalyzer::default())
    }

    pub fn add_block_with(&mut self, kind: BlockKind, analyzer: &dyn FragmentAnalyzer) -> BlockId {
        let id = BlockId(self.allocate_id());
        let mut block = Block::new(id, kind);
        let definitions = block.kind.generate_slots(analyzer);
        block.apply_slot_definitions(definitions, &mut self.next_id);
        self.blocks.insert(id, block);
        id
    }

    /// Reconfigures a block and regenerates its slots.
    ///
    /// Slots that survive keep their ids (and therefore their links); links attached to slots
    /// that disappeared are removed.
    pub fn update_block(
        &mut self,
        id: BlockId,
        kind: BlockKind,
        analyzer: &dyn FragmentAnalyzer,
    ) -> Result<(), GraphError> {
        self.sync_id_counter();
        let block = self.blocks.get_mut(&id).ok_or(GraphError::BlockNotFound(id))?;
        block.kind = kind;
        let definitions = block.kind.generate_slots(analyzer);
        let removed = block.apply_slot_definitions(definitions, &mut self.next_id);

        if !removed.is_empty() {
            let before = self.links.len();
            self.links
                .retain(|_, link| !removed.contains(&link.source) && !removed.contains(&link.target));
            tracing::debug!(
                block = %id,
                removed_slots = removed.len(),
                removed_links = before - self.links.len(),
                "regenerated block slots"
            );
        }
        Ok(())
    }

    /// Removes a block together with every link attached to it.
    pub fn remove_block(&mut self, id: BlockId) -> Result<Block, GraphError> {
        let block = self.blocks.remove(&id).ok_or(GraphError::BlockNotFound(id))?;
        let owned: Vec<SlotId> = block.slots().iter().map(|s| s.id).collect();
        self.links
            .retain(|_, link| !owned.contains(&link.source) && !owned.contains(&link.target));
        Ok(block)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    // --- Slots ---

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.blocks.values().find_map(|b| b.slot(id))
    }

    /// Looks up a slot of a block by `(direction, kind, name)`.
    pub fn find_slot(
        &self,
        block: BlockId,
        direction: SlotDirection,
        kind: SlotKind,
        name: Option<&str>,
    ) -> Option<SlotId> {
        self.block(block)?
            .find_slot(direction, kind, name)
            .map(|s| s.id)
    }

    /// Sets (or clears) the literal default of a value slot.
    pub fn set_slot_value(&mut self, id: SlotId, value: Option<Value>) -> Result<(), GraphError> {
        let slot = self
            .blocks
            .values_mut()
            .find_map(|b| b.slot_mut(id))
            .ok_or(GraphError::SlotNotFound(id))?;
        if slot.kind == SlotKind::Execution && value.is_some() {
            return Err(GraphError::ExecutionSlotValue(id));
        }
        slot.value = value;
        Ok(())
    }

    // --- Links ---

    pub fn add_link(&mut self, source: SlotId, target: SlotId) -> Result<LinkId, GraphError> {
        let source_slot = self.slot(source).ok_or(GraphError::SlotNotFound(source))?;
        let target_slot = self.slot(target).ok_or(GraphError::SlotNotFound(target))?;

        if source_slot.direction != SlotDirection::Output
            || target_slot.direction != SlotDirection::Input
        {
            return Err(GraphError::InvalidDirection {
                from: source,
                to: target,
            });
        }
        if source_slot.kind != target_slot.kind {
            return Err(GraphError::KindMismatch {
                from: source,
                to: target,
                message: format!(
                    "a {:?} output cannot feed a {:?} input",
                    source_slot.kind, target_slot.kind
                ),
            });
        }
        match source_slot.kind {
            SlotKind::Value => {
                if source_slot.block == target_slot.block {
                    return Err(GraphError::SelfLink(source_slot.block));
                }
                if self.links.values().any(|l| l.target == target) {
                    return Err(GraphError::InputAlreadyLinked(target));
                }
            }
            SlotKind::Execution => {
                if self.links.values().any(|l| l.source == source) {
                    return Err(GraphError::ExecutionAlreadyLinked(source));
                }
            }
        }

        let id = LinkId(self.allocate_id());
        self.links.insert(id, Link { id, source, target });
        Ok(id)
    }

    /// Convenience for wiring `source_block`'s execution output to `target_block`'s input.
    pub fn link_execution(
        &mut self,
        source_block: BlockId,
        output_name: Option<&str>,
        target_block: BlockId,
    ) -> Result<LinkId, GraphError> {
        let source =
            self.require_slot(source_block, SlotDirection::Output, SlotKind::Execution, output_name)?;
        let target =
            self.require_slot(target_block, SlotDirection::Input, SlotKind::Execution, None)?;
        self.add_link(source, target)
    }

    /// Convenience for wiring a value output to a value input, both looked up by name.
    pub fn link_value(
        &mut self,
        source_block: BlockId,
        output_name: Option<&str>,
        target_block: BlockId,
        input_name: Option<&str>,
    ) -> Result<LinkId, GraphError> {
        let source =
            self.require_slot(source_block, SlotDirection::Output, SlotKind::Value, output_name)?;
        let target =
            self.require_slot(target_block, SlotDirection::Input, SlotKind::Value, input_name)?;
        self.add_link(source, target)
    }

    fn require_slot(
        &self,
        block: BlockId,
        direction: SlotDirection,
        kind: SlotKind,
        name: Option<&str>,
    ) -> Result<SlotId, GraphError> {
        let found = self.block(block).ok_or(GraphError::BlockNotFound(block))?;
        found
            .find_slot(direction, kind, name)
            .map(|s| s.id)
            .ok_or_else(|| GraphError::MissingSlot {
                block,
                description: format!("{:?} {:?} {}", direction, kind, name.unwrap_or("<unnamed>")),
            })
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        self.links.remove(&id).ok_or(GraphError::LinkNotFound(id))
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    fn allocate_id(&mut self) -> u32 {
        self.sync_id_counter();
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Graphs loaded from hand-written JSON may omit the id counter; keep it past every id in use.
    fn sync_id_counter(&mut self) {
        let highest = self
            .blocks
            .values()
            .flat_map(|b| std::iter::once(b.id.0).chain(b.slots().iter().map(|s| s.id.0)))
            .chain(self.links.keys().map(|l| l.0))
            .max();
        if let Some(highest) = highest {
            self.next_id = self.next_id.max(highest + 1);
        }
    }
}
