//! Control loop driving a playback engine from the command mailbox.
//!
//! The loop polls the engine's state on every iteration. While the engine is
//! live and not `Busy` it drains the mailbox once and hands any pending
//! command to the dispatcher. It returns when the engine reaches a terminal
//! state.

mod control;
mod error;
mod idle;
mod observer;

pub use control::{ControlLoop, Iteration, LoopReport};
pub use error::{ControlError, ControlResult};
pub use idle::IdleStrategy;
pub use observer::{LoopObserver, NoopObserver};
