use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the loop does between iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleStrategy {
    /// Pure busy-poll.
    Spin,
    /// Yield the time slice.
    #[default]
    Yield,
    /// Sleep for the given number of microseconds.
    SleepUs(u64),
}

impl IdleStrategy {
    pub fn idle(self) {
        match self {
            IdleStrategy::Spin => std::hint::spin_loop(),
            IdleStrategy::Yield => thread::yield_now(),
            IdleStrategy::SleepUs(us) => thread::sleep(Duration::from_micros(us)),
        }
    }
}
