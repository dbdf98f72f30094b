use std::path::PathBuf;

use thiserror::Error;

use crate::{EngineState, StreamId};

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures reported by a playback engine or its host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{op} is not valid while the engine is {state}")]
    InvalidOperation { op: &'static str, state: EngineState },

    #[error("playback host is not connected")]
    NotConnected,

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("stream {0} is not present in the file")]
    StreamNotInFile(StreamId),

    #[error("stream {0} is not supported for playback")]
    StreamNotSupported(StreamId),
}
