use std::sync::Arc;

use dispatch::{apply_with_view, EngineView, Plan};
use log::{debug, info};
use service_abi::{EngineState, PlaybackEngine, StreamId};
use transport_codecs::{Command, CommandMailbox};

use crate::error::{ControlError, ControlResult};
use crate::idle::IdleStrategy;
use crate::observer::{LoopObserver, NoopObserver};

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopReport {
    pub iterations: u64,
    pub dispatched: u64,
    pub final_state: EngineState,
}

/// Outcome of a single loop iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Iteration {
    /// Engine mid-transition; the mailbox was left alone.
    Busy,
    /// Nothing pending.
    Idle,
    Dispatched { command: Command, ops: Plan },
    /// Engine reached a terminal state.
    Finished(EngineState),
}

/// Polling driver that feeds mailbox commands to the dispatcher.
pub struct ControlLoop {
    mailbox: Arc<CommandMailbox>,
    step_stream: StreamId,
    idle: IdleStrategy,
    iterations: u64,
    dispatched: u64,
}

impl ControlLoop {
    pub fn new(mailbox: Arc<CommandMailbox>, step_stream: StreamId) -> Self {
        Self {
            mailbox,
            step_stream,
            idle: IdleStrategy::default(),
            iterations: 0,
            dispatched: 0,
        }
    }

    pub fn with_idle(mut self, idle: IdleStrategy) -> Self {
        self.idle = idle;
        self
    }

    pub fn mailbox(&self) -> &Arc<CommandMailbox> {
        &self.mailbox
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Runs until the engine leaves `Playing`/`Paused`/`Busy`.
    pub fn run<E>(&mut self, engine: &mut E) -> ControlResult<LoopReport>
    where
        E: PlaybackEngine + ?Sized,
    {
        self.run_observed(engine, &mut NoopObserver)
    }

    /// Like [`run`](Self::run) with instrumentation hooks.
    ///
    /// A terminal `Error` state is reported as [`ControlError::PlaybackFailed`].
    pub fn run_observed<E, O>(&mut self, engine: &mut E, observer: &mut O) -> ControlResult<LoopReport>
    where
        E: PlaybackEngine + ?Sized,
        O: LoopObserver + ?Sized,
    {
        let final_state = loop {
            match self.run_once(engine, observer)? {
                Iteration::Finished(state) => break state,
                Iteration::Busy | Iteration::Idle | Iteration::Dispatched { .. } => {
                    self.idle.idle()
                }
            }
        };

        let report = LoopReport {
            iterations: self.iterations,
            dispatched: self.dispatched,
            final_state,
        };
        info!(
            "control loop finished: engine {final_state} after {} iterations, {} command(s)",
            report.iterations, report.dispatched
        );
        if final_state == EngineState::Error {
            return Err(ControlError::PlaybackFailed { report });
        }
        Ok(report)
    }

    /// Performs one iteration: read state, then drain and dispatch if allowed.
    pub fn run_once<E, O>(&mut self, engine: &mut E, observer: &mut O) -> ControlResult<Iteration>
    where
        E: PlaybackEngine + ?Sized,
        O: LoopObserver + ?Sized,
    {
        let state = engine.state();
        self.iterations += 1;
        observer.on_poll(state);

        if !state.is_live() {
            return Ok(Iteration::Finished(state));
        }
        // Issuing a transition mid-transition is an invalid operation.
        if state == EngineState::Busy {
            return Ok(Iteration::Busy);
        }

        let command = self.mailbox.take();
        if !command.is_some() {
            return Ok(Iteration::Idle);
        }

        observer.on_dispatch(command, state);
        debug!("dispatching {command} (engine {state})");
        let view = EngineView::new(state, engine.timing_mode());
        let ops = apply_with_view(command, view, engine, &self.step_stream)
            .map_err(|source| ControlError::Engine { command, source })?;
        self.dispatched += 1;
        Ok(Iteration::Dispatched { command, ops })
    }
}
