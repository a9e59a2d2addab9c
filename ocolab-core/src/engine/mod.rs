//! Trade simulator: per-event breakout entry and OCO bracket exit.
//!
//! Each post event runs its own small state machine
//! (`Idle → Armed → Open → Closed`) over the shared, read-only price stream
//! and metrics. Events never see each other's state, so they can be
//! simulated in parallel; results are recombined in post order.

pub mod config;
pub mod simulator;
pub mod state;

pub use config::SimConfig;
pub use simulator::{EventOutcome, SimStats, SimulationReport, Simulator};
pub use state::{entry_fill, EventState, Position};
