use super::{LinkId, SlotId};
use serde::{Deserialize, Serialize};

/// A directed wire from an output slot to an input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: SlotId,
    pub target: SlotId,
}
