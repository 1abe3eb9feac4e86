use crate::error::CompileError;
use crate::graph::{Block, BlockId, Method, Slot, SlotDirection, SlotId, SlotKind};
use ahash::AHashMap;

/// Id-indexed lookups over a method graph, built once per compilation.
pub(crate) struct GraphIndex<'a> {
    method: &'a Method,
    slots: AHashMap<SlotId, &'a Slot>,
    /// Value input slot -> the output slot feeding it.
    sources: AHashMap<SlotId, SlotId>,
    /// Output slot -> every input slot it feeds.
    targets: AHashMap<SlotId, Vec<SlotId>>,
}

impl<'a> GraphIndex<'a> {
    pub(crate) fn new(method: &'a Method) -> Result<Self, CompileError> {
        let slots: AHashMap<SlotId, &'a Slot> = method
            .blocks()
            .flat_map(|b| b.slots().iter())
            .map(|s| (s.id, s))
            .collect();

        let mut sources = AHashMap::new();
        let mut targets: AHashMap<SlotId, Vec<SlotId>> = AHashMap::new();
        for link in method.links() {
            for slot_id in [link.source, link.target] {
                if !slots.contains_key(&slot_id) {
                    return Err(CompileError::DanglingLink {
                        link_id: link.id,
                        slot_id,
                    });
                }
            }
            sources.insert(link.target, link.source);
            targets.entry(link.source).or_default().push(link.target);
        }

        Ok(Self {
            method,
            slots,
            sources,
            targets,
        })
    }

    pub(crate) fn block(&self, id: BlockId) -> Result<&'a Block, CompileError> {
        self.method.block(id).ok_or(CompileError::BlockNotFound(id))
    }

    pub(crate) fn slot(&self, id: SlotId) -> Option<&'a Slot> {
        self.slots.get(&id).copied()
    }

    /// The output slot linked into `input`, if any.
    pub(crate) fn source_of(&self, input: SlotId) -> Option<&'a Slot> {
        self.sources.get(&input).and_then(|s| self.slot(*s))
    }

    pub(crate) fn has_targets(&self, output: SlotId) -> bool {
        self.targets.get(&output).is_some_and(|t| !t.is_empty())
    }

    /// The block an execution output hands control to.
    pub(crate) fn execution_target(&self, output: SlotId) -> Option<BlockId> {
        self.targets
            .get(&output)?
            .iter()
            .filter_map(|t| self.slot(*t))
            .find(|s| s.kind == SlotKind::Execution)
            .map(|s| s.block)
    }

    pub(crate) fn require_slot(
        &self,
        block: &'a Block,
        direction: SlotDirection,
        kind: SlotKind,
        name: Option<&str>,
    ) -> Result<&'a Slot, CompileError> {
        block
            .find_slot(direction, kind, name)
            .ok_or_else(|| CompileError::MissingSlot {
                block_id: block.id,
                description: format!(
                    "{:?} {:?} {}",
                    direction,
                    kind,
                    name.map_or_else(|| "<unnamed>".to_string(), |n| format!("'{}'", n))
                ),
            })
    }
}
