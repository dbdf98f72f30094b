//! Playback session bootstrap: validate, open, bind, configure, run, close.

mod config;
mod error;
mod session;

pub use config::{SessionConfig, DEFAULT_PORT};
pub use error::{SessionError, SessionResult};
pub use session::{run_session, select_streams, Session};
