use service_abi::{EngineState, TimingMode};
use smallvec::{smallvec, SmallVec};
use transport_codecs::Command;

/// Single engine operation issued by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineOp {
    SetTiming(TimingMode),
    Pause,
    Resume,
    StepOnce,
    Stop,
}

/// Ordered operations for one command. Never longer than three.
pub type Plan = SmallVec<[EngineOp; 3]>;

/// Engine attributes the decision table depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineView {
    pub state: EngineState,
    pub timing: TimingMode,
}

impl EngineView {
    pub const fn new(state: EngineState, timing: TimingMode) -> Self {
        Self { state, timing }
    }
}

/// Reduces a command into the engine operations it requires.
///
/// A `Busy` engine must not be touched, so it always yields an empty plan.
/// `Tick`, `Calibration` and `None` are reserved and yield nothing.
pub fn plan(command: Command, view: EngineView) -> Plan {
    if view.state == EngineState::Busy {
        return Plan::new();
    }
    match command {
        // Real-time pacing cannot be single-stepped deterministically.
        Command::Step if view.state == EngineState::Paused => match view.timing {
            TimingMode::Enabled => {
                smallvec![EngineOp::SetTiming(TimingMode::Disabled), EngineOp::StepOnce]
            }
            TimingMode::Disabled => smallvec![EngineOp::StepOnce],
        },
        Command::Step => smallvec![
            EngineOp::SetTiming(TimingMode::Disabled),
            EngineOp::Pause,
            EngineOp::StepOnce,
        ],
        Command::Play if view.state == EngineState::Playing => {
            smallvec![EngineOp::SetTiming(TimingMode::Disabled), EngineOp::Pause]
        }
        Command::Play => smallvec![EngineOp::SetTiming(TimingMode::Enabled), EngineOp::Resume],
        Command::Time => {
            let mut ops: Plan = smallvec![EngineOp::SetTiming(view.timing.toggled())];
            if view.state == EngineState::Paused {
                ops.push(EngineOp::Resume);
            }
            ops
        }
        Command::Exit => smallvec![EngineOp::Stop],
        Command::Tick | Command::Calibration | Command::None => Plan::new(),
    }
}
