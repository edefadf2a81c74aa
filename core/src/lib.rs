//! Fleet consumables forecast and pricing engine.
//!
//! Forward-simulates cartridge depletion for every device in a fleet
//! snapshot and derives cost, sell price, margin, vendor spend and
//! subscription pricing from the resulting replacement plan.

pub mod clock;
pub mod config;
pub mod contract;
pub mod depletion;
pub mod engine;
pub mod error;
pub mod export;
pub mod horizon;
pub mod margin;
pub mod pricing;
pub mod record;
pub mod request;
pub mod resolver;
pub mod risk;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod subscription;
pub mod types;
pub mod vendor;
