//! Cycle-time analytics for the supply chain engine.
//!
//! Reads the stage timelines of every [`TrackedUnit`] in an [`Engine`] and
//! derives three families of cycle times:
//!
//! - **Full cycle**: delivery tick minus the customer-demand tick of the
//!   demand the delivery satisfied.
//! - **Node-1 cycle**: delivery tick minus the request tick carried with the
//!   delivered unit.
//! - **Node-pair cycles**: for each adjacent pair of nodes, the time a unit
//!   spent between the request that pulled it into a node and the tick it
//!   left that node.
//!
//! Averages are [`Fixed64`] so repeated seeded runs report identical figures.
//! An empty sample yields `None`, never an error.
//!
//! # Usage
//!
//! ```ignore
//! let mut analytics = CycleTimeAnalytics::for_engine(&engine);
//! while !engine.is_finished() {
//!     engine.step(None);
//!     analytics.record(&engine);
//! }
//! let last = analytics.history().last();
//! ```

use log::debug;
use supplychain_core::engine::Engine;
use supplychain_core::fixed::{mean_ticks, Fixed64, Ticks};
use supplychain_core::unit::TrackedUnit;

// ---------------------------------------------------------------------------
// Lag attribution
// ---------------------------------------------------------------------------

/// Which transit lag is backed out of a downstream arrival to recover the
/// tick a unit left the upstream node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LagAttribution {
    /// The lag of the node the unit was shipped from. This is the lag the
    /// engine applied when it scheduled the shipment.
    #[default]
    Shipper,
    /// The configured lag of the node that received the unit.
    Receiver,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Raw cycle-time samples from one analytics pass, in unit creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleTimes {
    /// Engine tick the pass was taken at.
    pub tick: Ticks,
    pub full_cycle: Vec<i64>,
    pub node_one_cycle: Vec<i64>,
    /// One sample vector per adjacent pair; index 0 is the pair (node 1,
    /// node 2).
    pub node_pairs: Vec<Vec<i64>>,
}

impl CycleTimes {
    pub fn averages(&self) -> CycleTimeAverages {
        CycleTimeAverages {
            tick: self.tick,
            full_cycle: mean_ticks(&self.full_cycle),
            node_one_cycle: mean_ticks(&self.node_one_cycle),
            node_pairs: self.node_pairs.iter().map(|s| mean_ticks(s)).collect(),
        }
    }

    /// Number of units with a completed delivery.
    pub fn delivered(&self) -> usize {
        self.node_one_cycle.len()
    }
}

/// One row of the history series: the mean of every metric at a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTimeAverages {
    pub tick: Ticks,
    pub full_cycle: Option<Fixed64>,
    pub node_one_cycle: Option<Fixed64>,
    pub node_pairs: Vec<Option<Fixed64>>,
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Derives cycle times from an engine and keeps a history of their averages.
#[derive(Debug, Clone)]
pub struct CycleTimeAnalytics {
    /// Per-node transit lags, customer-facing first.
    transit_lags: Vec<Ticks>,
    attribution: LagAttribution,
    history: Vec<CycleTimeAverages>,
}

impl CycleTimeAnalytics {
    pub fn new(transit_lags: Vec<Ticks>) -> Self {
        Self {
            transit_lags,
            attribution: LagAttribution::default(),
            history: Vec::new(),
        }
    }

    /// Analytics configured with the engine's own transit lags.
    pub fn for_engine(engine: &Engine) -> Self {
        Self::new(engine.transit_lags())
    }

    pub fn with_attribution(mut self, attribution: LagAttribution) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn attribution(&self) -> LagAttribution {
        self.attribution
    }

    pub fn transit_lags(&self) -> &[Ticks] {
        &self.transit_lags
    }

    /// Compute cycle times over the engine's current run.
    pub fn compute(&self, engine: &Engine) -> CycleTimes {
        let pairs = self.transit_lags.len().saturating_sub(1);
        let mut times = CycleTimes {
            tick: engine.tick(),
            node_pairs: vec![Vec::new(); pairs],
            ..CycleTimes::default()
        };

        for (_, unit) in engine.units_since_reset() {
            if let Some(delivered) = unit.timeline.delivered {
                if let Some(raised) = engine
                    .unit(delivered.demand)
                    .and_then(|d| d.timeline.customer_demand)
                {
                    times.full_cycle.push(signed_diff(delivered.tick, raised));
                }
                times
                    .node_one_cycle
                    .push(signed_diff(delivered.tick, delivered.request_tick));
            }
            // Pairs above the first only need arrival stamps.
            self.push_pair_samples(unit, &mut times.node_pairs);
        }

        times
    }

    /// Compute cycle times and append their averages to the history.
    pub fn record(&mut self, engine: &Engine) -> CycleTimes {
        let times = self.compute(engine);
        let row = times.averages();
        debug!(
            "cycle times at tick {}: {} delivered, full {:?}, pairs {:?}",
            row.tick,
            times.delivered(),
            row.full_cycle,
            row.node_pairs
        );
        self.history.push(row);
        times
    }

    pub fn history(&self) -> &[CycleTimeAverages] {
        &self.history
    }

    /// Drop the history, e.g. after the engine was reset.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn push_pair_samples(&self, unit: &TrackedUnit, pairs: &mut [Vec<i64>]) {
        let t = &unit.timeline;
        for (k, samples) in pairs.iter_mut().enumerate() {
            let Some(arrived_here) = t.arrived.get(k).copied().flatten() else {
                continue;
            };
            let left = if k == 0 {
                // The customer hand-off has no transit.
                t.delivered.map(|d| d.tick as i64)
            } else {
                t.arrived[k - 1].map(|down| down.tick as i64 - self.lag_for_pair(k) as i64)
            };
            if let Some(left) = left {
                samples.push(left - arrived_here.request_tick as i64);
            }
        }
    }

    /// Lag backed out of node `k - 1`'s arrival stamp for pair `k`.
    fn lag_for_pair(&self, k: usize) -> Ticks {
        let index = match self.attribution {
            LagAttribution::Shipper => k,
            LagAttribution::Receiver => k - 1,
        };
        self.transit_lags.get(index).copied().unwrap_or(0)
    }
}

fn signed_diff(later: Ticks, earlier: Ticks) -> i64 {
    later as i64 - earlier as i64
}
