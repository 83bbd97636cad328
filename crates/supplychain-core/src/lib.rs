//! Supply Chain Core -- a discrete-tick simulation of a multi-stage supply
//! chain.
//!
//! A chain is an ordered list of inventory-holding nodes. Customer demand
//! enters at node 0, orders travel upstream with a per-node communication
//! lag, the last node manufactures in concurrent batches, and units travel
//! back downstream with a per-node transit lag. Every demanded item is a
//! [`unit::TrackedUnit`] with a timeline of stage timestamps, which is what
//! cycle-time analytics are computed from.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] runs:
//!
//! 1. **Receive** -- every node lands the shipments due this tick.
//! 2. **Demand** -- units are minted for customer demand and ordered upstream.
//! 3. **Orders** -- visible orders become local demand and move upstream.
//! 4. **Fulfill** -- production runs, then nodes serve demand tail to head.
//! 5. **Record** -- per-node stock and queue depths are logged.
//! 6. **Bookkeeping** -- the tick advances and the state hash is refreshed.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- owns nodes, the unit arena and the clock.
//! - [`node::Node`] -- inventory, demand queue, inbound orders/shipments and
//!   (manufacturer only) a [`node::ProductionLine`].
//! - [`unit::TrackedUnit`] / [`unit::Timeline`] -- per-unit stage stamps.
//! - [`config::ChainConfig`] -- construction parameters, validated up front.
//! - [`query::TickStats`] -- the owned per-tick observation.

pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod engine;
pub mod fixed;
pub mod id;
pub mod node;
pub mod query;
pub mod rng;
pub mod sim;
pub mod unit;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
