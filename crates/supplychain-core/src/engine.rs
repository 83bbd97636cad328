//! The simulation engine: owns the chain of nodes and the unit arena and
//! advances them one tick at a time.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - An ordered `Vec<Node>`, customer-facing node first, manufacturer last
//! - A [`UnitArena`] holding every [`TrackedUnit`] ever minted (append-only)
//! - A seedable [`SimRng`] for demand sampling
//! - A [`SimState`] (tick counter) and the per-tick [`TickStats`] log
//!
//! # Tick Pipeline
//!
//! Each `step()` runs, in this order:
//! 1. **Receive** -- every node lands shipments that are due
//! 2. **Demand** -- mint units for this tick's demand at node 0 and send
//!    their orders to node 1
//! 3. **Orders** -- nodes 1.. pick up visible orders, queue them as local
//!    demand and pass them further upstream (the manufacturer keeps them)
//! 4. **Fulfill** -- manufacturer runs production, then every other node,
//!    tail to head, serves its demand queue from inventory
//! 5. **Record** -- append the tick's [`TickStats`]
//! 6. **Bookkeeping** -- advance the tick and recompute the state hash

use log::{debug, info, warn};
use slotmap::Key;

use crate::config::{ChainConfig, ConfigError};
use crate::fixed::{mean_u32, Fixed64, Ticks};
use crate::id::UnitId;
use crate::node::{pair_mut, Node};
use crate::query::{NodeStats, TickStats, UnitCensus};
use crate::rng::SimRng;
use crate::sim::{SimState, SimStatus, StateHash, StepOutcome};
use crate::unit::{ArrivalStamp, TrackedUnit, UnitArena};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The multi-node supply chain simulation.
#[derive(Debug)]
pub struct Engine {
    config: ChainConfig,

    /// Nodes, customer-facing first.
    pub(crate) nodes: Vec<Node>,

    /// Every unit ever created, in creation order.
    pub(crate) units: UnitArena,

    /// Arena length when the current run began; units before it belong to
    /// runs discarded by `reset`.
    run_start: usize,

    rng: SimRng,

    /// Effective seed, either configured or drawn from the clock.
    seed: u64,

    /// Simulation clock.
    pub sim_state: SimState,

    stats_log: Vec<TickStats>,

    demand_history: Vec<u32>,

    /// Set once a backlog warning has been logged this run.
    backlog_warned: bool,

    last_state_hash: u64,
}

impl Engine {
    /// Build a chain from `config`, seeding initial inventory.
    pub fn new(config: ChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (rng, seed) = match config.seed {
            Some(seed) => (SimRng::new(seed), seed),
            None => SimRng::from_entropy(),
        };

        let nodes = build_nodes(&config);
        let mut engine = Self {
            config,
            nodes,
            units: UnitArena::with_key(),
            run_start: 0,
            rng,
            seed,
            sim_state: SimState::new(),
            stats_log: Vec::new(),
            demand_history: Vec::new(),
            backlog_warned: false,
            last_state_hash: 0,
        };
        engine.seed_inventory();
        engine.last_state_hash = engine.compute_state_hash();

        info!(
            "supply chain ready: {} nodes, horizon {}, seed {}",
            engine.nodes.len(),
            engine.config.horizon,
            engine.seed
        );
        Ok(engine)
    }

    fn seed_inventory(&mut self) {
        let num_nodes = self.nodes.len();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            for i in 0..self.config.initial_inventories[index] {
                let id = self.units.insert(TrackedUnit::initial(index, i, num_nodes));
                node.stock(id);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn is_finished(&self) -> bool {
        self.sim_state.tick >= self.config.horizon
    }

    pub fn status(&self) -> SimStatus {
        if self.is_finished() {
            SimStatus::Finished
        } else {
            SimStatus::Running
        }
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance one tick. `demand` overrides the sampled customer demand.
    ///
    /// Once the horizon is reached this returns [`StepOutcome::Finished`]
    /// and changes nothing, including the RNG.
    pub fn step(&mut self, demand: Option<u32>) -> StepOutcome {
        if self.is_finished() {
            debug!("step ignored: finished at tick {}", self.sim_state.tick);
            return StepOutcome::Finished {
                tick: self.sim_state.tick,
            };
        }
        let tick = self.sim_state.tick;

        // Phase 1: Receive -- land shipments before anything can consume them.
        self.phase_receive(tick);

        // Phase 2: Demand -- mint units and raise orders.
        let demand = self.phase_demand(tick, demand);

        // Phase 3: Orders -- propagate upstream.
        self.phase_orders(tick);

        // Phase 4: Fulfill -- manufacturer first, customer-facing node last.
        let delivered = self.phase_fulfill(tick);

        // Phase 5: Record.
        let stats = self.phase_record(tick, demand);
        debug!(
            "tick {}: demand {}, delivered {}, inventories {:?}, backlogs {:?}",
            tick,
            demand,
            delivered,
            stats.inventories(),
            stats.demand_queues()
        );

        // Phase 6: Bookkeeping.
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();

        StepOutcome::Stepped(stats)
    }

    /// Step with sampled demand until the horizon. Returns the number of
    /// ticks run.
    pub fn run_to_end(&mut self) -> usize {
        let mut steps = 0;
        while !self.is_finished() {
            self.step(None);
            steps += 1;
        }
        steps
    }

    /// Step once per entry of `schedule`, stopping early at the horizon.
    pub fn run_with_demand(&mut self, schedule: &[u32]) -> Vec<TickStats> {
        let mut observed = Vec::with_capacity(schedule.len());
        for &demand in schedule {
            match self.step(Some(demand)) {
                StepOutcome::Stepped(stats) => observed.push(stats),
                StepOutcome::Finished { .. } => break,
            }
        }
        observed
    }

    /// Restore initial inventory and empty every queue, batch and log.
    ///
    /// Units from earlier runs stay in the arena untouched; fresh units are
    /// minted for the initial stock. The RNG rewinds to the effective seed.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.clear();
        }
        self.run_start = self.units.len();
        self.seed_inventory();
        self.rng = SimRng::new(self.seed);
        self.sim_state = SimState::new();
        self.stats_log.clear();
        self.demand_history.clear();
        self.backlog_warned = false;
        self.last_state_hash = self.compute_state_hash();
        info!("supply chain reset (seed {})", self.seed);
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn phase_receive(&mut self, tick: Ticks) {
        for node in &mut self.nodes {
            let index = node.index();
            for (unit, request_tick) in node.receive_arrived_shipments(tick) {
                if let Some(u) = self.units.get_mut(unit) {
                    u.timeline.arrived[index] = Some(ArrivalStamp { tick, request_tick });
                }
            }
        }
    }

    fn phase_demand(&mut self, tick: Ticks, demand: Option<u32>) -> u32 {
        let quantity = match demand {
            Some(q) => q,
            None => self.rng.below_inclusive(self.config.max_demand),
        };
        self.demand_history.push(quantity);

        let num_nodes = self.nodes.len();
        for i in 0..quantity {
            let id = self.units.insert(TrackedUnit::demand(tick, i, num_nodes));
            self.nodes[0].enqueue_demand(tick, id, tick);
            if num_nodes > 1 {
                let (retail, next) = pair_mut(&mut self.nodes, 0, 1);
                retail.propagate_order_upstream(tick, id, next, &mut self.units);
            }
        }
        quantity
    }

    fn phase_orders(&mut self, tick: Ticks) {
        let num_nodes = self.nodes.len();
        for i in 1..num_nodes {
            let visible = self.nodes[i].receive_arrived_orders(tick);
            for (unit, sent) in visible {
                self.nodes[i].enqueue_demand(tick, unit, sent);
                if i + 1 < num_nodes {
                    let (node, upstream) = pair_mut(&mut self.nodes, i, i + 1);
                    node.propagate_order_upstream(tick, unit, upstream, &mut self.units);
                }
            }
        }
    }

    /// Returns the number of units handed to customers this tick.
    fn phase_fulfill(&mut self, tick: Ticks) -> usize {
        let mut delivered = 0;
        for i in (0..self.nodes.len()).rev() {
            if i == 0 {
                delivered = self.nodes[0].fulfill_demand(tick, None, &mut self.units).len();
            } else if self.nodes[i].is_manufacturer() {
                let (maker, downstream) = pair_mut(&mut self.nodes, i, i - 1);
                maker.run_production(tick, downstream, &mut self.units);
            } else {
                let (node, downstream) = pair_mut(&mut self.nodes, i, i - 1);
                node.fulfill_demand(tick, Some(downstream), &mut self.units);
            }
        }
        delivered
    }

    fn phase_record(&mut self, tick: Ticks, demand: u32) -> TickStats {
        let stats = TickStats {
            tick,
            demand,
            nodes: self.nodes.iter().map(NodeStats::of).collect(),
        };

        if let Some(limit) = self.config.backlog_warning
            && !self.backlog_warned
            && let Some((index, node)) = stats
                .nodes
                .iter()
                .enumerate()
                .find(|(_, n)| n.demand_queue > limit)
        {
            warn!(
                "node {} backlog reached {} at tick {} (warning threshold {})",
                index + 1,
                node.demand_queue,
                tick,
                limit
            );
            self.backlog_warned = true;
        }

        self.stats_log.push(stats.clone());
        stats
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Get the most recently computed state hash.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    fn compute_state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.sim_state.tick);
        h.write_u64(self.rng.state());
        for node in &self.nodes {
            h.write_u64(node.inventory().len() as u64);
            for &unit in node.inventory() {
                h.write_u64(unit.data().as_ffi());
            }
            for entry in node.demand_queue() {
                h.write_u64(entry.unit.data().as_ffi());
                h.write_u64(entry.arrival);
                h.write_u64(entry.request_tick);
            }
            for entry in node.inbound_orders() {
                h.write_u64(entry.unit.data().as_ffi());
                h.write_u64(entry.visible_at);
            }
            for entry in node.inbound_shipments() {
                h.write_u64(entry.unit.data().as_ffi());
                h.write_u64(entry.arrival);
            }
            if let Some(line) = node.production() {
                for batch in line.batches() {
                    h.write_u64(batch.completion);
                    h.write_u32(batch.units.len() as u32);
                }
            }
        }
        h.finish()
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The seed actually in use (configured, or drawn from the clock).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Per-node transit lags, customer-facing first.
    pub fn transit_lags(&self) -> Vec<Ticks> {
        self.nodes.iter().map(Node::transit_lag).collect()
    }

    /// Every unit ever created, including units from runs before a reset.
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &TrackedUnit)> {
        self.units.iter()
    }

    /// Units created since construction or the last reset.
    pub fn units_since_reset(&self) -> impl Iterator<Item = (UnitId, &TrackedUnit)> {
        self.units.iter().skip(self.run_start)
    }

    pub fn unit(&self, id: UnitId) -> Option<&TrackedUnit> {
        self.units.get(id)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn stats_log(&self) -> &[TickStats] {
        &self.stats_log
    }

    pub fn demand_history(&self) -> &[u32] {
        &self.demand_history
    }

    /// Mean demand per tick over the current run.
    pub fn average_demand(&self) -> Option<Fixed64> {
        mean_u32(&self.demand_history)
    }

    /// Inventory of one node at the end of each recorded tick.
    pub fn inventory_series(&self, node: usize) -> Vec<usize> {
        self.stats_log
            .iter()
            .filter_map(|s| s.nodes.get(node).map(|n| n.inventory))
            .collect()
    }

    /// Count the current run's units by where they are.
    pub fn unit_census(&self) -> UnitCensus {
        let mut census = UnitCensus::default();
        for node in &self.nodes {
            census.in_inventory += node.inventory().len();
            census.in_transit += node.inbound_shipments().len();
            census.in_production += node.production().map_or(0, |l| l.units_in_production());
        }
        for (_, unit) in self.units_since_reset() {
            if unit.is_delivered() {
                census.delivered += 1;
            } else if unit.is_awaiting_production() {
                census.awaiting_production += 1;
            }
        }
        census
    }
}

fn build_nodes(config: &ChainConfig) -> Vec<Node> {
    let manufacturer = (config.num_nodes > 1).then(|| config.manufacturer());
    (0..config.num_nodes)
        .map(|i| {
            let node = Node::new(i, config.order_lags[i], config.transit_lags[i]);
            if Some(i) == manufacturer {
                node.with_production(config.production_time)
            } else {
                node
            }
        })
        .collect()
}
