//! Simulated playback backend with deterministic timing.
//!
//! [`SimulatedEngine`] implements the engine ABI over an in-memory clip so the
//! control loop, session bootstrap and CLI can run without a real sensor
//! playback service. [`SimulatedHost`] plays the role of the service that
//! knows which recordings exist and which streams it can play.

mod engine;
mod host;

pub use engine::{CallJournal, ClipSpec, EngineCall, SimulatedEngine};
pub use host::SimulatedHost;
