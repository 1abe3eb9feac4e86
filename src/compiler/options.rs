use serde::{Deserialize, Serialize};

/// How the compiler decides whether an execution block has run before another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReachabilityStrategy {
    /// Enumerates every simple path from the entry block to the query block.
    #[default]
    Paths,
    /// Dominator analysis over every entry->query walk; linear in practice.
    ///
    /// Agrees with `Paths` on `Always`. A block that only lies on a loop which returns to an
    /// earlier block is `Sometimes` here, while `Paths` reports it as `Never`.
    Dominators,
}

/// Naming and formatting knobs of a compilation.
///
/// Every field has a default, so a JSON options file only needs to mention what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Prefix of locals holding function-call results.
    pub call_result_prefix: String,
    /// Prefix of foreach iteration variables.
    pub loop_item_prefix: String,
    /// Prefix of locals introduced for free-form code outputs.
    pub local_prefix: String,
    pub label_prefix: String,
    pub indent: String,
    pub reachability: ReachabilityStrategy,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            call_result_prefix: "result".to_string(),
            loop_item_prefix: "item".to_string(),
            local_prefix: "local".to_string(),
            label_prefix: "block".to_string(),
            indent: "    ".to_string(),
            reachability: ReachabilityStrategy::Paths,
        }
    }
}

impl CompilerOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_reachability(mut self, reachability: ReachabilityStrategy) -> Self {
        self.reachability = reachability;
        self
    }
}
