//! Command dispatch: turning a remote command into engine operations.
//!
//! The crate stays small. [`plan`] is a pure, total function over
//! `(Command, EngineView)`; [`apply`] reads the view from a live engine,
//! plans, and executes the operations in order. Decisions are always derived
//! from the engine's state at call time, never from command history.

/// Plan execution against a live engine.
pub mod apply;
/// Pure command reducer.
pub mod plan;

pub use crate::apply::{apply, apply_with_view};
pub use crate::plan::{plan, EngineOp, EngineView, Plan};
