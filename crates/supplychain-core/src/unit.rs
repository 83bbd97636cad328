//! Tracked units and their per-stage timelines.
//!
//! Every demanded item (and every unit of pre-seeded stock) is minted once as
//! a [`TrackedUnit`] in the engine's arena and addressed by [`UnitId`] from
//! then on. Queue entries hold handles, never copies.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::fixed::Ticks;
use crate::id::{UnitId, UnitOrigin};

/// Arena owning every unit the engine has ever created.
pub type UnitArena = SlotMap<UnitId, TrackedUnit>;

// ---------------------------------------------------------------------------
// Stamps
// ---------------------------------------------------------------------------

/// A shipment observed at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalStamp {
    /// Tick the unit became visible in the node's inventory.
    pub tick: Ticks,
    /// Originating-request tick carried by the shipment.
    pub request_tick: Ticks,
}

/// A unit handed to the end customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStamp {
    pub tick: Ticks,
    /// Originating-request tick of the demand entry this unit satisfied.
    pub request_tick: Ticks,
    /// The demand unit whose queue entry was paired with this unit.
    pub demand: UnitId,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Timestamps for every lifecycle stage, indexed by node where the stage is
/// per node. Unset stages are `None`.
///
/// Causal order: customer demand, order sent/arrived at each node walking
/// upstream, production start and completion, then shipped/arrived at each
/// node walking downstream, then delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub customer_demand: Option<Ticks>,
    /// `order_sent[i]`: the order left node `i` for node `i + 1`.
    pub order_sent: Vec<Option<Ticks>>,
    /// `order_arrived[i]`: the order became visible at node `i`.
    pub order_arrived: Vec<Option<Ticks>>,
    pub production_started: Option<Ticks>,
    pub manufacturing_completed: Option<Ticks>,
    /// `shipped[i]`: the unit left node `i` for node `i - 1`.
    pub shipped: Vec<Option<Ticks>>,
    /// `arrived[i]`: the unit landed in node `i`'s inventory.
    pub arrived: Vec<Option<ArrivalStamp>>,
    pub delivered: Option<DeliveryStamp>,
}

impl Timeline {
    /// Empty timeline for a chain of `nodes` nodes.
    pub fn new(nodes: usize) -> Self {
        Self {
            customer_demand: None,
            order_sent: vec![None; nodes],
            order_arrived: vec![None; nodes],
            production_started: None,
            manufacturing_completed: None,
            shipped: vec![None; nodes],
            arrived: vec![None; nodes],
            delivered: None,
        }
    }

    /// Every stamp that is set, in causal stage order.
    pub fn stamps_in_order(&self) -> Vec<Ticks> {
        let mut out = Vec::new();
        out.extend(self.customer_demand);
        for i in 0..self.order_sent.len() {
            out.extend(self.order_arrived[i]);
            out.extend(self.order_sent[i]);
        }
        out.extend(self.production_started);
        out.extend(self.manufacturing_completed);
        for i in (0..self.shipped.len()).rev() {
            out.extend(self.arrived[i].map(|a| a.tick));
            out.extend(self.shipped[i]);
        }
        out.extend(self.delivered.map(|d| d.tick));
        out
    }

    /// True when the set stamps never decrease along the stage order.
    pub fn is_monotonic(&self) -> bool {
        self.stamps_in_order().windows(2).all(|w| w[0] <= w[1])
    }
}

// ---------------------------------------------------------------------------
// Tracked unit
// ---------------------------------------------------------------------------

/// One indivisible demanded item with its stage timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedUnit {
    pub origin: UnitOrigin,
    pub timeline: Timeline,
}

impl TrackedUnit {
    /// A unit of pre-seeded stock. It has no demand timestamp.
    pub fn initial(node: usize, index: u32, nodes: usize) -> Self {
        Self {
            origin: UnitOrigin::Initial { node, index },
            timeline: Timeline::new(nodes),
        }
    }

    /// A unit of customer demand raised at `tick`.
    pub fn demand(tick: Ticks, index: u32, nodes: usize) -> Self {
        let mut timeline = Timeline::new(nodes);
        timeline.customer_demand = Some(tick);
        if let Some(first) = timeline.order_arrived.first_mut() {
            *first = Some(tick);
        }
        Self {
            origin: UnitOrigin::Demand { tick, index },
            timeline,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.timeline.delivered.is_some()
    }

    /// Demand units that have not entered a production batch yet. They exist
    /// only as orders, not as physical stock.
    pub fn is_awaiting_production(&self) -> bool {
        matches!(self.origin, UnitOrigin::Demand { .. })
            && self.timeline.production_started.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_unit_stamps_customer_and_node_one() {
        let u = TrackedUnit::demand(4, 0, 3);
        assert_eq!(u.timeline.customer_demand, Some(4));
        assert_eq!(u.timeline.order_arrived[0], Some(4));
        assert!(u.is_awaiting_production());
        assert!(!u.is_delivered());
    }

    #[test]
    fn initial_unit_has_no_demand() {
        let u = TrackedUnit::initial(2, 0, 3);
        assert_eq!(u.timeline.customer_demand, None);
        assert!(!u.is_awaiting_production());
        assert!(u.timeline.stamps_in_order().is_empty());
    }

    #[test]
    fn monotonic_timeline() {
        let mut u = TrackedUnit::demand(0, 0, 2);
        u.timeline.order_sent[0] = Some(0);
        u.timeline.order_arrived[1] = Some(1);
        u.timeline.production_started = Some(1);
        u.timeline.manufacturing_completed = Some(4);
        u.timeline.shipped[1] = Some(4);
        u.timeline.arrived[0] = Some(ArrivalStamp { tick: 7, request_tick: 0 });
        assert!(u.timeline.is_monotonic());

        u.timeline.manufacturing_completed = Some(0);
        assert!(!u.timeline.is_monotonic());
    }
}
