//! Playback engine ABI shared between the control loop and engine backends.
//!
//! This crate defines the capability boundary between the remote-control core
//! (layer 05) and whatever drives the actual sensor-data playback. The core
//! only ever talks to an engine through [`PlaybackEngine`], and only from the
//! control-loop thread.

#![allow(missing_docs)]

mod error;

use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::{EngineError, EngineResult};

/// Observable state of a playback engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EngineState {
    Playing,
    Paused,
    /// Mid-transition. Issuing any operation now is an invalid operation.
    Busy,
    Stopped,
    Error,
}

impl EngineState {
    /// States in which the control loop keeps polling.
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            EngineState::Playing | EngineState::Paused | EngineState::Busy
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Playing => "playing",
            EngineState::Paused => "paused",
            EngineState::Busy => "busy",
            EngineState::Stopped => "stopped",
            EngineState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Whether the engine paces output in real time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    Enabled,
    /// As fast as commanded; required for deterministic stepping.
    #[default]
    Disabled,
}

impl TimingMode {
    pub const fn toggled(self) -> Self {
        match self {
            TimingMode::Enabled => TimingMode::Disabled,
            TimingMode::Disabled => TimingMode::Enabled,
        }
    }
}

/// What the engine does after the final pass over the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndBehavior {
    #[default]
    Stop,
    /// Hold the last frame in `Paused`.
    Pause,
}

/// Name of an event stream inside a recording, e.g. `depth`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StreamId(String);

impl StreamId {
    /// Stream names compare case-insensitively; the id is stored lowercased.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(name: &str) -> Self {
        StreamId::new(name)
    }
}

impl From<String> for StreamId {
    fn from(name: String) -> Self {
        StreamId::new(name)
    }
}

impl From<StreamId> for String {
    fn from(id: StreamId) -> Self {
        id.0
    }
}

/// Operations the remote-control core needs from a playback engine.
///
/// Implementations are driven from a single thread and need not be `Sync`.
pub trait PlaybackEngine {
    /// Polls the current state. Simulated engines may advance their clock here.
    fn state(&mut self) -> EngineState;

    fn timing_mode(&self) -> TimingMode;

    fn set_timing_mode(&mut self, mode: TimingMode) -> EngineResult<()>;

    fn pause(&mut self) -> EngineResult<()>;

    fn resume(&mut self) -> EngineResult<()>;

    /// Advances one unit of `stream` while paused.
    fn step_once(&mut self, stream: &StreamId) -> EngineResult<()>;

    fn stop(&mut self) -> EngineResult<()>;

    /// Number of repeats after the first pass.
    fn set_loop_count(&mut self, count: u32) -> EngineResult<()>;

    fn set_end_behavior(&mut self, behavior: EndBehavior) -> EngineResult<()>;

    /// Begins playback in `Paused` so frames can be stepped before playing.
    fn start_paused(&mut self) -> EngineResult<()>;
}

/// Opens recordings and answers stream capability questions.
pub trait EngineHost {
    type Engine: PlaybackEngine;

    /// Whether the playback service can be reached at all.
    fn is_connected(&self) -> bool;

    /// Streams recorded in the file at `path`.
    fn file_streams(&self, path: &Path) -> EngineResult<Vec<StreamId>>;

    /// Whether the playback target can consume `stream`.
    fn is_playable(&self, stream: &StreamId) -> bool;

    /// Creates a playback over `streams` of the file at `path`.
    fn open(&self, path: &Path, streams: &[StreamId]) -> EngineResult<Self::Engine>;
}
