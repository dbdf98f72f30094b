use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::debug;
use service_abi::{EngineError, EngineHost, EngineResult, StreamId};

use crate::engine::{CallJournal, ClipSpec, SimulatedEngine};

/// Catalog of simulated recordings plus the set of playable streams.
pub struct SimulatedHost {
    clips: HashMap<PathBuf, ClipSpec>,
    playable: HashSet<StreamId>,
    busy_polls: u32,
    fault_at: Option<u32>,
    connected: bool,
    journal: CallJournal,
}

impl SimulatedHost {
    /// Host that can play `depth`, `ir`, `body` and `color`.
    pub fn new() -> Self {
        Self {
            clips: HashMap::new(),
            playable: ["depth", "ir", "body", "color"]
                .into_iter()
                .map(StreamId::from)
                .collect(),
            busy_polls: 2,
            fault_at: None,
            connected: true,
            journal: CallJournal::default(),
        }
    }

    pub fn with_clip(mut self, path: impl Into<PathBuf>, clip: ClipSpec) -> Self {
        self.clips.insert(path.into(), clip);
        self
    }

    pub fn with_playable(mut self, streams: &[&str]) -> Self {
        self.playable = streams.iter().map(|s| StreamId::new(s)).collect();
        self
    }

    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Every opened engine enters `Error` on reaching `frame`.
    pub fn with_fault_at(mut self, frame: u32) -> Self {
        self.fault_at = Some(frame);
        self
    }

    /// Simulates the playback service going away.
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Journal shared by every engine this host opens.
    pub fn journal(&self) -> CallJournal {
        CallJournal::clone(&self.journal)
    }

    fn clip(&self, path: &Path) -> EngineResult<&ClipSpec> {
        self.clips
            .get(path)
            .ok_or_else(|| EngineError::FileNotFound(path.to_path_buf()))
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHost for SimulatedHost {
    type Engine = SimulatedEngine;

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn file_streams(&self, path: &Path) -> EngineResult<Vec<StreamId>> {
        if !self.connected {
            return Err(EngineError::NotConnected);
        }
        Ok(self.clip(path)?.streams.clone())
    }

    fn is_playable(&self, stream: &StreamId) -> bool {
        self.playable.contains(stream)
    }

    fn open(&self, path: &Path, streams: &[StreamId]) -> EngineResult<SimulatedEngine> {
        if !self.connected {
            return Err(EngineError::NotConnected);
        }
        let mut clip = self.clip(path)?.clone();
        if let Some(missing) = streams.iter().find(|s| !clip.streams.contains(s)) {
            return Err(EngineError::StreamNotInFile(missing.clone()));
        }
        if !streams.is_empty() {
            clip.streams = streams.to_vec();
        }
        debug!(
            "opened {} ({} frames, streams {:?})",
            path.display(),
            clip.frames,
            clip.streams
        );

        let mut engine = SimulatedEngine::new(clip)
            .with_busy_polls(self.busy_polls)
            .with_journal(self.journal());
        if let Some(frame) = self.fault_at {
            engine = engine.with_fault_at(frame);
        }
        Ok(engine)
    }
}
