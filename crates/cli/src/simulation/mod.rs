//! Tick loop orchestration module.

mod runner;
mod stats;

pub use runner::{Simulation, SimulationConfig};
pub use stats::{NodeSnapshot, SimulationStats};
