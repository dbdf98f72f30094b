use std::sync::Arc;
use std::time::{Duration, Instant};

use log::trace;
use parking_lot::Mutex;
use service_abi::{
    EndBehavior, EngineError, EngineResult, EngineState, PlaybackEngine, StreamId, TimingMode,
};

/// Recording being played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipSpec {
    /// Frames per pass.
    pub frames: u32,
    /// Real-time spacing between frames when timing is enabled.
    pub frame_interval: Duration,
    pub streams: Vec<StreamId>,
}

impl ClipSpec {
    pub fn new(frames: u32, streams: &[&str]) -> Self {
        Self {
            frames: frames.max(1),
            frame_interval: Duration::from_micros(33_333),
            streams: streams.iter().map(|s| StreamId::new(s)).collect(),
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

impl Default for ClipSpec {
    fn default() -> Self {
        Self::new(300, &["depth", "ir", "body"])
    }
}

/// Engine operation as observed by the simulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    SetTimingMode(TimingMode),
    Pause,
    Resume,
    StepOnce(StreamId),
    Stop,
    SetLoopCount(u32),
    SetEndBehavior(EndBehavior),
    StartPaused,
}

/// Shared log of successful engine calls, in issue order.
pub type CallJournal = Arc<Mutex<Vec<EngineCall>>>;

#[derive(Clone, Copy, Debug)]
enum Phase {
    Idle,
    Playing { last_advance: Instant },
    Paused,
    Stepping { remaining: u32 },
    Stopped,
    Error,
}

/// In-memory engine with a frame cursor, timing mode and loop handling.
///
/// Stepping is asynchronous: after `step_once` the engine reports `Busy` for
/// `busy_polls` state reads and then lands `Paused` one frame further.
pub struct SimulatedEngine {
    clip: ClipSpec,
    phase: Phase,
    timing: TimingMode,
    position: u32,
    passes: u32,
    loop_count: u32,
    end_behavior: EndBehavior,
    busy_polls: u32,
    fault_at: Option<u32>,
    steps_completed: u32,
    frames_played: u64,
    journal: CallJournal,
}

impl SimulatedEngine {
    pub fn new(clip: ClipSpec) -> Self {
        Self {
            clip,
            phase: Phase::Idle,
            timing: TimingMode::Disabled,
            position: 0,
            passes: 0,
            loop_count: 0,
            end_behavior: EndBehavior::Stop,
            busy_polls: 2,
            fault_at: None,
            steps_completed: 0,
            frames_played: 0,
            journal: CallJournal::default(),
        }
    }

    /// Number of `Busy` reads a step takes to land.
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Enter `Error` when the cursor reaches `frame`.
    pub fn with_fault_at(mut self, frame: u32) -> Self {
        self.fault_at = Some(frame);
        self
    }

    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn journal(&self) -> CallJournal {
        Arc::clone(&self.journal)
    }

    /// Current frame index within the pass.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn steps_completed(&self) -> u32 {
        self.steps_completed
    }

    /// Frames advanced by real playback, steps excluded.
    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    pub fn clip(&self) -> &ClipSpec {
        &self.clip
    }

    /// State without advancing the simulation clock.
    pub fn peek_state(&self) -> EngineState {
        match self.phase {
            Phase::Idle | Phase::Stopped => EngineState::Stopped,
            Phase::Playing { .. } => EngineState::Playing,
            Phase::Paused => EngineState::Paused,
            Phase::Stepping { .. } => EngineState::Busy,
            Phase::Error => EngineState::Error,
        }
    }

    fn record(&self, call: EngineCall) {
        trace!("engine call {call:?}");
        self.journal.lock().push(call);
    }

    fn invalid(&self, op: &'static str) -> EngineError {
        EngineError::InvalidOperation {
            op,
            state: self.peek_state(),
        }
    }

    fn reject_busy(&self, op: &'static str) -> EngineResult<()> {
        match self.phase {
            Phase::Stepping { .. } => Err(self.invalid(op)),
            _ => Ok(()),
        }
    }

    fn advance_frame(&mut self) {
        self.position += 1;
        if self.fault_at == Some(self.position) {
            self.phase = Phase::Error;
            return;
        }
        if self.position < self.clip.frames {
            return;
        }
        self.passes += 1;
        if self.passes <= self.loop_count {
            self.position = 0;
            return;
        }
        self.position = self.clip.frames - 1;
        self.phase = match self.end_behavior {
            EndBehavior::Stop => Phase::Stopped,
            EndBehavior::Pause => Phase::Paused,
        };
    }

    fn land_step(&mut self) {
        self.phase = Phase::Paused;
        self.steps_completed += 1;
        self.advance_frame();
    }

    fn poll_playing(&mut self, last_advance: Instant) {
        match self.timing {
            TimingMode::Disabled => {
                self.frames_played += 1;
                self.advance_frame();
            }
            TimingMode::Enabled => {
                let interval = self.clip.frame_interval.max(Duration::from_micros(1));
                let due = u32::try_from(last_advance.elapsed().as_nanos() / interval.as_nanos())
                    .unwrap_or(u32::MAX);
                let mut advanced = 0;
                while advanced < due && matches!(self.phase, Phase::Playing { .. }) {
                    self.frames_played += 1;
                    self.advance_frame();
                    advanced += 1;
                }
                if let Phase::Playing { .. } = self.phase {
                    self.phase = Phase::Playing {
                        last_advance: last_advance + interval * advanced,
                    };
                }
            }
        }
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn state(&mut self) -> EngineState {
        match self.phase {
            Phase::Stepping { remaining: 0 } => self.land_step(),
            Phase::Stepping { remaining } => {
                self.phase = Phase::Stepping {
                    remaining: remaining - 1,
                }
            }
            Phase::Playing { last_advance } => self.poll_playing(last_advance),
            Phase::Idle | Phase::Paused | Phase::Stopped | Phase::Error => {}
        }
        self.peek_state()
    }

    fn timing_mode(&self) -> TimingMode {
        self.timing
    }

    fn set_timing_mode(&mut self, mode: TimingMode) -> EngineResult<()> {
        self.reject_busy("set_timing_mode")?;
        if matches!(self.phase, Phase::Stopped | Phase::Error) {
            return Err(self.invalid("set_timing_mode"));
        }
        if let (TimingMode::Disabled, TimingMode::Enabled, Phase::Playing { .. }) =
            (self.timing, mode, self.phase)
        {
            self.phase = Phase::Playing {
                last_advance: Instant::now(),
            };
        }
        self.timing = mode;
        self.record(EngineCall::SetTimingMode(mode));
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        match self.phase {
            Phase::Playing { .. } | Phase::Paused => {
                self.phase = Phase::Paused;
                self.record(EngineCall::Pause);
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    fn resume(&mut self) -> EngineResult<()> {
        match self.phase {
            Phase::Paused => {
                self.phase = Phase::Playing {
                    last_advance: Instant::now(),
                };
                self.record(EngineCall::Resume);
                Ok(())
            }
            Phase::Playing { .. } => {
                self.record(EngineCall::Resume);
                Ok(())
            }
            _ => Err(self.invalid("resume")),
        }
    }

    fn step_once(&mut self, stream: &StreamId) -> EngineResult<()> {
        if !matches!(self.phase, Phase::Paused) {
            return Err(self.invalid("step_once"));
        }
        if !self.clip.streams.contains(stream) {
            return Err(EngineError::StreamNotInFile(stream.clone()));
        }
        self.record(EngineCall::StepOnce(stream.clone()));
        if self.busy_polls == 0 {
            self.land_step();
        } else {
            self.phase = Phase::Stepping {
                remaining: self.busy_polls,
            };
        }
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        match self.phase {
            Phase::Stepping { .. } | Phase::Error => Err(self.invalid("stop")),
            _ => {
                self.phase = Phase::Stopped;
                self.record(EngineCall::Stop);
                Ok(())
            }
        }
    }

    fn set_loop_count(&mut self, count: u32) -> EngineResult<()> {
        self.reject_busy("set_loop_count")?;
        self.loop_count = count;
        self.record(EngineCall::SetLoopCount(count));
        Ok(())
    }

    fn set_end_behavior(&mut self, behavior: EndBehavior) -> EngineResult<()> {
        self.reject_busy("set_end_behavior")?;
        self.end_behavior = behavior;
        self.record(EngineCall::SetEndBehavior(behavior));
        Ok(())
    }

    fn start_paused(&mut self) -> EngineResult<()> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Paused;
                self.record(EngineCall::StartPaused);
                Ok(())
            }
            _ => Err(self.invalid("start_paused")),
        }
    }
}
