//! Chain configuration and its validation.

use serde::{Deserialize, Deserializer, Serialize};

use crate::fixed::Ticks;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a [`ChainConfig`] is rejected. Fatal at engine construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("a chain needs at least one node")]
    NoNodes,
    #[error("{field} has {actual} entries, expected one per node ({expected})")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("production time must be at least one tick")]
    ZeroProductionTime,
    #[error("horizon must be at least one tick")]
    ZeroHorizon,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-node defaults, used by [`ChainConfig::default`] and to fill vectors a
/// config file leaves out.
pub const DEFAULT_INVENTORY: u32 = 50;
pub const DEFAULT_ORDER_LAG: Ticks = 1;
pub const DEFAULT_TRANSIT_LAG: Ticks = 3;

/// Construction parameters for a supply chain.
///
/// Per-node vectors are indexed from the customer-facing node (0) to the
/// manufacturer (`num_nodes - 1`). When deserialized, omitted fields take
/// their defaults and omitted per-node vectors are sized to `num_nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ChainConfigFile")]
pub struct ChainConfig {
    pub num_nodes: usize,
    pub initial_inventories: Vec<u32>,
    /// Delay before an order sent upstream by node `i` is visible at `i + 1`.
    pub order_lags: Vec<Ticks>,
    /// Delay before a unit shipped by node `i` lands at `i - 1`.
    pub transit_lags: Vec<Ticks>,
    /// Manufacturer batch duration.
    pub production_time: Ticks,
    /// The engine finishes once `tick >= horizon`.
    pub horizon: Ticks,
    /// Inclusive upper bound for sampled per-tick demand.
    pub max_demand: u32,
    pub seed: Option<u64>,
    /// Log a warning the first time any demand queue grows past this depth.
    pub backlog_warning: Option<usize>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::uniform(4, DEFAULT_INVENTORY, DEFAULT_ORDER_LAG, DEFAULT_TRANSIT_LAG)
    }
}

// ---------------------------------------------------------------------------
// Deserialized form
// ---------------------------------------------------------------------------

/// A config as written in a file: every field optional.
#[derive(Deserialize)]
#[serde(default)]
struct ChainConfigFile {
    num_nodes: usize,
    #[serde(deserialize_with = "present")]
    initial_inventories: Option<Vec<u32>>,
    #[serde(deserialize_with = "present")]
    order_lags: Option<Vec<Ticks>>,
    #[serde(deserialize_with = "present")]
    transit_lags: Option<Vec<Ticks>>,
    production_time: Ticks,
    horizon: Ticks,
    max_demand: u32,
    seed: Option<u64>,
    backlog_warning: Option<usize>,
}

impl Default for ChainConfigFile {
    fn default() -> Self {
        let base = ChainConfig::default();
        Self {
            num_nodes: base.num_nodes,
            initial_inventories: None,
            order_lags: None,
            transit_lags: None,
            production_time: base.production_time,
            horizon: base.horizon,
            max_demand: base.max_demand,
            seed: base.seed,
            backlog_warning: base.backlog_warning,
        }
    }
}

/// A field that is present deserializes to `Some`, in every format.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<ChainConfigFile> for ChainConfig {
    fn from(file: ChainConfigFile) -> Self {
        let n = file.num_nodes;
        Self {
            num_nodes: n,
            initial_inventories: file
                .initial_inventories
                .unwrap_or_else(|| vec![DEFAULT_INVENTORY; n]),
            order_lags: file.order_lags.unwrap_or_else(|| vec![DEFAULT_ORDER_LAG; n]),
            transit_lags: file
                .transit_lags
                .unwrap_or_else(|| vec![DEFAULT_TRANSIT_LAG; n]),
            production_time: file.production_time,
            horizon: file.horizon,
            max_demand: file.max_demand,
            seed: file.seed,
            backlog_warning: file.backlog_warning,
        }
    }
}

impl ChainConfig {
    /// Every node gets the same inventory and lags.
    pub fn uniform(num_nodes: usize, inventory: u32, order_lag: Ticks, transit_lag: Ticks) -> Self {
        Self {
            num_nodes,
            initial_inventories: vec![inventory; num_nodes],
            order_lags: vec![order_lag; num_nodes],
            transit_lags: vec![transit_lag; num_nodes],
            production_time: 3,
            horizon: 30,
            max_demand: 50,
            seed: None,
            backlog_warning: None,
        }
    }

    pub fn with_inventories(mut self, inventories: Vec<u32>) -> Self {
        self.initial_inventories = inventories;
        self
    }

    pub fn with_order_lags(mut self, lags: Vec<Ticks>) -> Self {
        self.order_lags = lags;
        self
    }

    pub fn with_transit_lags(mut self, lags: Vec<Ticks>) -> Self {
        self.transit_lags = lags;
        self
    }

    pub fn with_production_time(mut self, ticks: Ticks) -> Self {
        self.production_time = ticks;
        self
    }

    pub fn with_horizon(mut self, ticks: Ticks) -> Self {
        self.horizon = ticks;
        self
    }

    pub fn with_max_demand(mut self, max: u32) -> Self {
        self.max_demand = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_backlog_warning(mut self, depth: usize) -> Self {
        self.backlog_warning = Some(depth);
        self
    }

    /// Index of the manufacturer node.
    pub fn manufacturer(&self) -> usize {
        self.num_nodes.saturating_sub(1)
    }

    /// Check internal consistency. Never substitutes defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        let lengths = [
            ("initial_inventories", self.initial_inventories.len()),
            ("order_lags", self.order_lags.len()),
            ("transit_lags", self.transit_lags.len()),
        ];
        for (field, actual) in lengths {
            if actual != self.num_nodes {
                return Err(ConfigError::LengthMismatch {
                    field,
                    expected: self.num_nodes,
                    actual,
                });
            }
        }
        if self.production_time == 0 {
            return Err(ConfigError::ZeroProductionTime);
        }
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        Ok(())
    }
}
