//! Supply-chain nodes: inventory, queues and the manufacturer's batch line.
//!
//! A node owns four FIFO collections:
//!
//! - **inventory**: physical units on hand, picked head first;
//! - **demand queue**: downstream demand waiting for stock;
//! - **inbound orders**: orders sent by the downstream neighbour, not yet
//!   visible here;
//! - **inbound shipments**: units shipped by the upstream neighbour, not yet
//!   landed here.
//!
//! Nodes only touch each other through explicit hand-off: a node pushes into
//! its neighbour's inbound queue. Each inbound queue has a single producer
//! with a fixed lag, so scheduled ticks are non-decreasing front to back and
//! draining the ready prefix drains every ready entry.

use std::collections::VecDeque;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::fixed::Ticks;
use crate::id::UnitId;
use crate::unit::{DeliveryStamp, UnitArena};

// ---------------------------------------------------------------------------
// Queue entries
// ---------------------------------------------------------------------------

/// Pending downstream demand at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandEntry {
    /// Tick the demand became visible at this node.
    pub arrival: Ticks,
    pub unit: UnitId,
    /// Tick the request was raised by the downstream party.
    pub request_tick: Ticks,
}

/// An order travelling upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    /// Tick the order becomes visible at the receiving node.
    pub visible_at: Ticks,
    pub unit: UnitId,
    pub sent: Ticks,
}

/// A unit travelling downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentEntry {
    /// Tick the unit lands in the receiving node's inventory.
    pub arrival: Ticks,
    pub unit: UnitId,
    pub sent: Ticks,
    pub request_tick: Ticks,
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// A unit assigned to a production batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUnit {
    pub unit: UnitId,
    pub request_tick: Ticks,
}

/// One manufacturing run. Batches are independent and run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub start: Ticks,
    /// `start + production_time`.
    pub completion: Ticks,
    pub units: Vec<BatchUnit>,
}

/// The manufacturer's production line: unlimited concurrent batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLine {
    production_time: Ticks,
    batches: Vec<ProductionBatch>,
}

impl ProductionLine {
    pub fn new(production_time: Ticks) -> Self {
        Self {
            production_time,
            batches: Vec::new(),
        }
    }

    pub fn production_time(&self) -> Ticks {
        self.production_time
    }

    /// Open batches, oldest first.
    pub fn batches(&self) -> &[ProductionBatch] {
        &self.batches
    }

    /// Total units across all open batches.
    pub fn units_in_production(&self) -> usize {
        self.batches.iter().map(|b| b.units.len()).sum()
    }
}

/// What a call to [`Node::run_production`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionReport {
    /// Units whose batch closed this tick, now shipped downstream.
    pub completed: Vec<UnitId>,
    /// Number of batches opened this tick.
    pub batches_opened: usize,
}

// ---------------------------------------------------------------------------
// Fulfillment
// ---------------------------------------------------------------------------

/// One demand entry served from inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fulfillment {
    /// The physical unit taken from inventory.
    pub unit: UnitId,
    /// The demand unit whose queue entry was served.
    pub demand: UnitId,
    pub request_tick: Ticks,
    /// Scheduled arrival downstream, or `None` when handed to the customer.
    pub arrives_at: Option<Ticks>,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One stage of the chain. Index 0 faces the customer; the last index is the
/// manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    index: usize,
    order_lag: Ticks,
    transit_lag: Ticks,
    inventory: VecDeque<UnitId>,
    demand_queue: VecDeque<DemandEntry>,
    inbound_orders: VecDeque<OrderEntry>,
    inbound_shipments: VecDeque<ShipmentEntry>,
    production: Option<ProductionLine>,
}

impl Node {
    pub fn new(index: usize, order_lag: Ticks, transit_lag: Ticks) -> Self {
        Self {
            index,
            order_lag,
            transit_lag,
            inventory: VecDeque::new(),
            demand_queue: VecDeque::new(),
            inbound_orders: VecDeque::new(),
            inbound_shipments: VecDeque::new(),
            production: None,
        }
    }

    /// Turn this node into the manufacturer.
    pub fn with_production(mut self, production_time: Ticks) -> Self {
        self.production = Some(ProductionLine::new(production_time));
        self
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn order_lag(&self) -> Ticks {
        self.order_lag
    }

    pub fn transit_lag(&self) -> Ticks {
        self.transit_lag
    }

    pub fn is_manufacturer(&self) -> bool {
        self.production.is_some()
    }

    pub fn production(&self) -> Option<&ProductionLine> {
        self.production.as_ref()
    }

    pub fn inventory(&self) -> &VecDeque<UnitId> {
        &self.inventory
    }

    pub fn demand_queue(&self) -> &VecDeque<DemandEntry> {
        &self.demand_queue
    }

    pub fn inbound_orders(&self) -> &VecDeque<OrderEntry> {
        &self.inbound_orders
    }

    pub fn inbound_shipments(&self) -> &VecDeque<ShipmentEntry> {
        &self.inbound_shipments
    }

    // -----------------------------------------------------------------------
    // Stock and hand-off
    // -----------------------------------------------------------------------

    /// Place a unit directly into inventory (initial stock).
    pub(crate) fn stock(&mut self, unit: UnitId) {
        self.inventory.push_back(unit);
    }

    pub(crate) fn accept_shipment(&mut self, entry: ShipmentEntry) {
        self.inbound_shipments.push_back(entry);
    }

    pub(crate) fn accept_order(&mut self, entry: OrderEntry) {
        self.inbound_orders.push_back(entry);
    }

    /// Drop all stock, queues and batches.
    pub(crate) fn clear(&mut self) {
        self.inventory.clear();
        self.demand_queue.clear();
        self.inbound_orders.clear();
        self.inbound_shipments.clear();
        if let Some(line) = &mut self.production {
            line.batches.clear();
        }
    }

    // -----------------------------------------------------------------------
    // Per-tick operations
    // -----------------------------------------------------------------------

    /// Move every shipment due at or before `tick` into inventory, in FIFO
    /// order. Returns `(unit, request_tick)` for each arrival.
    pub fn receive_arrived_shipments(&mut self, tick: Ticks) -> Vec<(UnitId, Ticks)> {
        let mut arrived = Vec::new();
        while let Some(front) = self.inbound_shipments.front() {
            if front.arrival > tick {
                break;
            }
            let Some(entry) = self.inbound_shipments.pop_front() else {
                break;
            };
            self.inventory.push_back(entry.unit);
            arrived.push((entry.unit, entry.request_tick));
        }
        arrived
    }

    /// Pop every order visible at or before `tick`. Returns `(unit, sent)`.
    pub fn receive_arrived_orders(&mut self, tick: Ticks) -> Vec<(UnitId, Ticks)> {
        let mut visible = Vec::new();
        while let Some(front) = self.inbound_orders.front() {
            if front.visible_at > tick {
                break;
            }
            let Some(entry) = self.inbound_orders.pop_front() else {
                break;
            };
            visible.push((entry.unit, entry.sent));
        }
        visible
    }

    /// Append to the demand queue. Entries are never reordered or merged.
    pub fn enqueue_demand(&mut self, tick: Ticks, unit: UnitId, request_tick: Ticks) {
        self.demand_queue.push_back(DemandEntry {
            arrival: tick,
            unit,
            request_tick,
        });
    }

    /// Send an order for `unit` to `upstream`. It becomes visible there at
    /// `tick + order_lag`.
    pub fn propagate_order_upstream(
        &self,
        tick: Ticks,
        unit: UnitId,
        upstream: &mut Node,
        units: &mut UnitArena,
    ) {
        let visible_at = tick.saturating_add(self.order_lag);
        if let Some(u) = units.get_mut(unit) {
            u.timeline.order_sent[self.index] = Some(tick);
            u.timeline.order_arrived[upstream.index] = Some(visible_at);
        }
        upstream.accept_order(OrderEntry {
            visible_at,
            unit,
            sent: tick,
        });
    }

    /// Serve the demand queue from inventory, head to head, until either runs
    /// dry. With a `downstream` node each served unit is shipped there;
    /// without one it is handed to the customer at `tick`.
    pub fn fulfill_demand(
        &mut self,
        tick: Ticks,
        mut downstream: Option<&mut Node>,
        units: &mut UnitArena,
    ) -> Vec<Fulfillment> {
        let mut served = Vec::new();
        while !self.demand_queue.is_empty() && !self.inventory.is_empty() {
            let (Some(demand), Some(unit)) =
                (self.demand_queue.pop_front(), self.inventory.pop_front())
            else {
                break;
            };

            let arrives_at = match downstream.as_deref_mut() {
                Some(next) => {
                    let arrival = tick.saturating_add(self.transit_lag);
                    if let Some(u) = units.get_mut(unit) {
                        u.timeline.shipped[self.index] = Some(tick);
                    }
                    next.accept_shipment(ShipmentEntry {
                        arrival,
                        unit,
                        sent: tick,
                        request_tick: demand.request_tick,
                    });
                    Some(arrival)
                }
                None => {
                    if let Some(u) = units.get_mut(unit) {
                        u.timeline.delivered = Some(DeliveryStamp {
                            tick,
                            request_tick: demand.request_tick,
                            demand: demand.unit,
                        });
                    }
                    None
                }
            };

            served.push(Fulfillment {
                unit,
                demand: demand.unit,
                request_tick: demand.request_tick,
                arrives_at,
            });
        }
        served
    }

    /// Manufacturer step. First close every batch due at or before `tick`,
    /// shipping its units to `downstream`; then open one batch per distinct
    /// arrival tick in the demand queue, draining the queue completely.
    ///
    /// A node without a production line does nothing.
    pub fn run_production(
        &mut self,
        tick: Ticks,
        downstream: &mut Node,
        units: &mut UnitArena,
    ) -> ProductionReport {
        let mut report = ProductionReport::default();
        let index = self.index;
        let transit_lag = self.transit_lag;
        let Some(line) = self.production.as_mut() else {
            return report;
        };

        // Close finished batches.
        let (done, open): (Vec<ProductionBatch>, Vec<ProductionBatch>) =
            std::mem::take(&mut line.batches)
                .into_iter()
                .partition(|b| b.completion <= tick);
        line.batches = open;

        for batch in done {
            trace!(
                "batch started at {} completed at {} ({} units)",
                batch.start,
                batch.completion,
                batch.units.len()
            );
            for BatchUnit { unit, request_tick } in batch.units {
                if let Some(u) = units.get_mut(unit) {
                    u.timeline.manufacturing_completed = Some(batch.completion);
                    u.timeline.shipped[index] = Some(batch.completion);
                }
                downstream.accept_shipment(ShipmentEntry {
                    arrival: batch.completion.saturating_add(transit_lag),
                    unit,
                    sent: batch.completion,
                    request_tick,
                });
                report.completed.push(unit);
            }
        }

        // Group queued demand by arrival tick, first appearance first.
        let mut groups: Vec<(Ticks, Vec<BatchUnit>)> = Vec::new();
        for entry in self.demand_queue.drain(..) {
            let member = BatchUnit {
                unit: entry.unit,
                request_tick: entry.request_tick,
            };
            match groups.iter_mut().find(|(arrival, _)| *arrival == entry.arrival) {
                Some((_, members)) => members.push(member),
                None => groups.push((entry.arrival, vec![member])),
            }
        }

        for (_, members) in groups {
            for m in &members {
                if let Some(u) = units.get_mut(m.unit) {
                    u.timeline.production_started = Some(tick);
                }
            }
            let completion = tick.saturating_add(line.production_time);
            trace!("batch opened at {} due {} ({} units)", tick, completion, members.len());
            line.batches.push(ProductionBatch {
                start: tick,
                completion,
                units: members,
            });
            report.batches_opened += 1;
        }

        report
    }
}

// ---------------------------------------------------------------------------
// Neighbour borrowing
// ---------------------------------------------------------------------------

/// Borrow two distinct nodes mutably at once.
///
/// # Panics
///
/// Panics if `a == b` or either index is out of bounds.
pub(crate) fn pair_mut(nodes: &mut [Node], a: usize, b: usize) -> (&mut Node, &mut Node) {
    assert_ne!(a, b, "pair_mut requires distinct indices");
    if a < b {
        let (lo, hi) = nodes.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = nodes.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
