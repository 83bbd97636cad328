//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::ChainConfig;
use crate::engine::Engine;
use crate::fixed::Ticks;
use crate::id::{UnitId, UnitOrigin};

/// Horizon used by the builders below; long enough for any scenario test.
pub const TEST_HORIZON: Ticks = 1_000;

// ===========================================================================
// Engine builders
// ===========================================================================

/// Build an engine from a config that is known to be valid.
pub fn engine_from(config: ChainConfig) -> Engine {
    Engine::new(config).expect("test config should be valid")
}

/// One customer-facing node with `inventory` units and zero lags.
pub fn single_node(inventory: u32) -> Engine {
    engine_from(
        ChainConfig::uniform(1, inventory, 0, 0)
            .with_horizon(TEST_HORIZON)
            .with_seed(0),
    )
}

/// A chain of `nodes` identical nodes ending in a manufacturer.
pub fn chain(
    nodes: usize,
    inventory: u32,
    order_lag: Ticks,
    transit_lag: Ticks,
    production_time: Ticks,
) -> Engine {
    engine_from(
        ChainConfig::uniform(nodes, inventory, order_lag, transit_lag)
            .with_production_time(production_time)
            .with_horizon(TEST_HORIZON)
            .with_seed(0),
    )
}

/// The classic four-tier chain (retailer, wholesaler, distributor,
/// factory) with distinct lags per tier.
pub fn beer_game_chain(seed: u64) -> Engine {
    engine_from(
        ChainConfig::uniform(4, 12, 1, 2)
            .with_order_lags(vec![1, 1, 2, 2])
            .with_transit_lags(vec![0, 2, 2, 3])
            .with_production_time(2)
            .with_max_demand(8)
            .with_horizon(TEST_HORIZON)
            .with_seed(seed),
    )
}

// ===========================================================================
// Unit queries
// ===========================================================================

/// Demand units of the current run, in creation order.
pub fn demand_units(engine: &Engine) -> Vec<UnitId> {
    engine
        .units_since_reset()
        .filter(|(_, u)| matches!(u.origin, UnitOrigin::Demand { .. }))
        .map(|(id, _)| id)
        .collect()
}

/// Units of the current run handed to a customer, in creation order.
pub fn delivered_units(engine: &Engine) -> Vec<UnitId> {
    engine
        .units_since_reset()
        .filter(|(_, u)| u.is_delivered())
        .map(|(id, _)| id)
        .collect()
}

/// Sum of inventory across every node.
pub fn total_inventory(engine: &Engine) -> usize {
    engine.nodes().iter().map(|n| n.inventory().len()).sum()
}
