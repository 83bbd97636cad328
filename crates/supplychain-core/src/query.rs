//! Read-only snapshot types for observing the chain.
//!
//! All types are owned copies, never references into engine storage, so
//! dashboards and exporters can hold on to them across ticks.

use serde::{Deserialize, Serialize};

use crate::fixed::Ticks;
use crate::node::Node;

/// Queue depths and stock of one node at the end of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub inventory: usize,
    pub demand_queue: usize,
    pub inbound_shipments: usize,
    pub inbound_orders: usize,
    /// Open production batches (manufacturer only, 0 elsewhere).
    pub open_batches: usize,
}

impl NodeStats {
    pub fn of(node: &Node) -> Self {
        Self {
            inventory: node.inventory().len(),
            demand_queue: node.demand_queue().len(),
            inbound_shipments: node.inbound_shipments().len(),
            inbound_orders: node.inbound_orders().len(),
            open_batches: node.production().map_or(0, |line| line.batches().len()),
        }
    }
}

/// The observation recorded for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    pub tick: Ticks,
    /// Demand applied this tick, overridden or sampled.
    pub demand: u32,
    /// One entry per node, customer-facing first.
    pub nodes: Vec<NodeStats>,
}

impl TickStats {
    pub fn inventories(&self) -> Vec<usize> {
        self.nodes.iter().map(|n| n.inventory).collect()
    }

    pub fn demand_queues(&self) -> Vec<usize> {
        self.nodes.iter().map(|n| n.demand_queue).collect()
    }
}

/// Where every unit in the arena currently is.
///
/// Physical units sit in inventory, in transit or in a batch, or have been
/// delivered. Demand units that never reached a batch exist only as orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCensus {
    pub in_inventory: usize,
    pub in_transit: usize,
    pub in_production: usize,
    pub delivered: usize,
    pub awaiting_production: usize,
}

impl UnitCensus {
    pub fn total(&self) -> usize {
        self.in_inventory
            + self.in_transit
            + self.in_production
            + self.delivered
            + self.awaiting_production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_stats_projections() {
        let stats = TickStats {
            tick: 0,
            demand: 3,
            nodes: vec![
                NodeStats {
                    inventory: 2,
                    demand_queue: 1,
                    ..Default::default()
                },
                NodeStats {
                    inventory: 5,
                    ..Default::default()
                },
            ],
        };
        assert_eq!(stats.inventories(), vec![2, 5]);
        assert_eq!(stats.demand_queues(), vec![1, 0]);
    }

    #[test]
    fn census_total_sums_every_bucket() {
        let census = UnitCensus {
            in_inventory: 1,
            in_transit: 2,
            in_production: 3,
            delivered: 4,
            awaiting_production: 5,
        };
        assert_eq!(census.total(), 15);
    }
}
