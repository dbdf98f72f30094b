use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use app::{ControlError, ControlLoop, IdleStrategy, LoopObserver};
use mock::{ClipSpec, EngineCall, SimulatedEngine};
use service_abi::{EngineError, EngineState, PlaybackEngine, StreamId, TimingMode};
use transport_codecs::{Command, CommandMailbox};

fn started(clip: ClipSpec, busy_polls: u32) -> SimulatedEngine {
    let mut engine = SimulatedEngine::new(clip).with_busy_polls(busy_polls);
    engine.start_paused().expect("start paused");
    engine
}

fn depth() -> StreamId {
    StreamId::new("depth")
}

/// Feeds one command per iteration, only once the previous one was consumed
/// and the engine is ready for it.
struct Script {
    mailbox: Arc<CommandMailbox>,
    pending: VecDeque<Command>,
    dispatched: Vec<(Command, EngineState)>,
}

impl Script {
    fn new(mailbox: Arc<CommandMailbox>, commands: &[Command]) -> Self {
        Self {
            mailbox,
            pending: commands.iter().copied().collect(),
            dispatched: Vec::new(),
        }
    }
}

impl LoopObserver for Script {
    fn on_poll(&mut self, state: EngineState) {
        if state == EngineState::Busy || !self.mailbox.is_empty() {
            return;
        }
        if let Some(next) = self.pending.pop_front() {
            self.mailbox.publish(next);
        }
    }

    fn on_dispatch(&mut self, command: Command, state: EngineState) {
        self.dispatched.push((command, state));
    }
}

#[test]
fn scripted_session_steps_twice_then_plays_then_exits() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = started(ClipSpec::new(100, &["depth"]), 2);
    let journal = engine.journal();
    let mailbox = Arc::new(CommandMailbox::new());
    let mut script = Script::new(
        Arc::clone(&mailbox),
        &[Command::Step, Command::Step, Command::Time, Command::Exit],
    );

    let report = ControlLoop::new(mailbox, depth())
        .with_idle(IdleStrategy::Spin)
        .run_observed(&mut engine, &mut script)
        .expect("normal completion");

    assert_eq!(report.final_state, EngineState::Stopped);
    assert_eq!(report.dispatched, 4);
    assert_eq!(engine.steps_completed(), 2);
    assert_eq!(engine.position(), 2);
    assert_eq!(engine.timing_mode(), TimingMode::Enabled);
    assert_eq!(
        *journal.lock(),
        vec![
            EngineCall::StartPaused,
            EngineCall::StepOnce(depth()),
            EngineCall::StepOnce(depth()),
            EngineCall::SetTimingMode(TimingMode::Enabled),
            EngineCall::Resume,
            EngineCall::Stop,
        ]
    );
    assert_eq!(
        script.dispatched,
        vec![
            (Command::Step, EngineState::Paused),
            (Command::Step, EngineState::Paused),
            (Command::Time, EngineState::Paused),
            (Command::Exit, EngineState::Playing),
        ]
    );
}

/// Publishes on every poll regardless of state, then `Exit`.
struct Hammer {
    mailbox: Arc<CommandMailbox>,
    polls: u32,
    limit: u32,
    dispatch_states: Vec<EngineState>,
}

impl LoopObserver for Hammer {
    fn on_poll(&mut self, _state: EngineState) {
        self.polls += 1;
        match self.polls.cmp(&self.limit) {
            std::cmp::Ordering::Less => {
                self.mailbox.publish(Command::Step);
            }
            std::cmp::Ordering::Equal => {
                self.mailbox.publish(Command::Exit);
            }
            std::cmp::Ordering::Greater => {}
        }
    }

    fn on_dispatch(&mut self, _command: Command, state: EngineState) {
        self.dispatch_states.push(state);
    }
}

#[test]
fn nothing_is_dispatched_while_busy() {
    let mut engine = started(ClipSpec::new(1000, &["depth"]), 3);
    let mailbox = Arc::new(CommandMailbox::new());
    let mut hammer = Hammer {
        mailbox: Arc::clone(&mailbox),
        polls: 0,
        limit: 40,
        dispatch_states: Vec::new(),
    };

    let report = ControlLoop::new(mailbox, depth())
        .with_idle(IdleStrategy::Spin)
        .run_observed(&mut engine, &mut hammer)
        .expect("no operation is ever rejected");

    assert_eq!(report.final_state, EngineState::Stopped);
    assert!(!hammer.dispatch_states.is_empty());
    assert!(hammer
        .dispatch_states
        .iter()
        .all(|state| *state != EngineState::Busy));
    // One dispatch per four polls: the step itself plus three busy reads.
    assert_eq!(engine.steps_completed(), 10);
}

struct Recorder {
    mailbox: Arc<CommandMailbox>,
    commands: Vec<Command>,
}

impl LoopObserver for Recorder {
    fn on_dispatch(&mut self, command: Command, _state: EngineState) {
        if self.commands.is_empty() {
            self.mailbox.publish(Command::Exit);
        }
        self.commands.push(command);
    }
}

#[test]
fn play_overwritten_by_step_is_never_acted_on() {
    let mut engine = started(ClipSpec::new(100, &["depth"]), 1);
    let journal = engine.journal();
    let mailbox = Arc::new(CommandMailbox::new());
    mailbox.publish(Command::Play);
    mailbox.publish(Command::Step);

    let mut recorder = Recorder {
        mailbox: Arc::clone(&mailbox),
        commands: Vec::new(),
    };
    ControlLoop::new(mailbox, depth())
        .run_observed(&mut engine, &mut recorder)
        .expect("normal completion");

    assert_eq!(recorder.commands, vec![Command::Step, Command::Exit]);
    assert!(!journal.lock().contains(&EngineCall::Resume));
    assert_eq!(engine.position(), 1);
}

#[test]
fn engine_error_ends_run_with_playback_failed() {
    let clip = ClipSpec::new(100, &["depth"]).with_frame_interval(Duration::from_micros(50));
    let mut engine = started(clip, 1).with_fault_at(3);
    let mailbox = Arc::new(CommandMailbox::new());
    mailbox.publish(Command::Play);

    let err = ControlLoop::new(mailbox, depth())
        .with_idle(IdleStrategy::SleepUs(20))
        .run(&mut engine)
        .expect_err("fault must surface");

    match err {
        ControlError::PlaybackFailed { report } => {
            assert_eq!(report.final_state, EngineState::Error);
            assert_eq!(report.dispatched, 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn clip_running_out_is_a_normal_completion() {
    let clip = ClipSpec::new(5, &["depth"]).with_frame_interval(Duration::from_micros(50));
    let mut engine = started(clip, 1);
    let mailbox = Arc::new(CommandMailbox::new());
    mailbox.publish(Command::Play);

    let report = ControlLoop::new(mailbox, depth())
        .with_idle(IdleStrategy::SleepUs(20))
        .run(&mut engine)
        .expect("normal completion");

    assert_eq!(report.final_state, EngineState::Stopped);
    assert_eq!(engine.frames_played(), 5);
}

#[test]
fn rejected_operation_is_reported_with_its_command() {
    let mut engine = started(ClipSpec::new(10, &["depth"]), 1);
    let mailbox = Arc::new(CommandMailbox::new());
    mailbox.publish(Command::Step);

    let err = ControlLoop::new(mailbox, StreamId::new("color"))
        .run(&mut engine)
        .expect_err("stream is not in the clip");

    assert_eq!(
        err,
        ControlError::Engine {
            command: Command::Step,
            source: EngineError::StreamNotInFile(StreamId::new("color")),
        }
    );
}
