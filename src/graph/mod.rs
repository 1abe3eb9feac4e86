//! The visual-script graph: blocks, their slots, and the links wiring them together.
//!
//! Everything is stored in per-method arenas addressed by integer ids. Links hold
//! `(source, target)` slot ids rather than references, so cyclic execution wiring
//! (loops, gotos) never creates ownership cycles.

pub mod block;
pub mod conversion;
pub mod link;
pub mod method;
pub mod script;
pub mod slot;

pub use block::*;
pub use conversion::*;
pub use link::*;
pub use method::*;
pub use script::*;
pub use slot::*;

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_ids {
    ( $( $(#[$meta:meta])* $name:ident ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

define_ids! {
    /// Identifies a block inside its owning method.
    BlockId,
    /// Identifies a slot inside its owning method.
    SlotId,
    /// Identifies a link inside its owning method.
    LinkId,
}
