use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::fixed::Ticks;

new_key_type! {
    /// Stable handle of a tracked unit in the engine's unit arena.
    pub struct UnitId;
}

/// Where a tracked unit came from. Purely descriptive; identity is the
/// [`UnitId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitOrigin {
    /// Pre-seeded stock: the `index`-th unit of `node`'s initial inventory.
    Initial { node: usize, index: u32 },
    /// The `index`-th unit of customer demand raised at `tick`.
    Demand { tick: Ticks, index: u32 },
}

impl std::fmt::Display for UnitOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitOrigin::Initial { node, index } => write!(f, "init_{}#{}", node + 1, index),
            UnitOrigin::Demand { tick, index } => write!(f, "t{}#{}", tick, index),
        }
    }
}
