use log::trace;
use service_abi::{EngineResult, PlaybackEngine, StreamId};
use transport_codecs::Command;

use crate::plan::{plan, EngineOp, EngineView, Plan};

/// Applies `command` to `engine`, returning the operations that were issued.
///
/// The view is read from the engine on every call. Execution stops at the
/// first failing operation and the error is returned unchanged.
pub fn apply<E>(command: Command, engine: &mut E, step_stream: &StreamId) -> EngineResult<Plan>
where
    E: PlaybackEngine + ?Sized,
{
    let view = EngineView::new(engine.state(), engine.timing_mode());
    apply_with_view(command, view, engine, step_stream)
}

/// Like [`apply`], but decides on a state the caller has just polled.
///
/// The control loop uses this so the decision is made on the same read that
/// established the engine was not `Busy`.
pub fn apply_with_view<E>(
    command: Command,
    view: EngineView,
    engine: &mut E,
    step_stream: &StreamId,
) -> EngineResult<Plan>
where
    E: PlaybackEngine + ?Sized,
{
    let ops = plan(command, view);
    for op in &ops {
        trace!("{command}: {op:?} (engine {})", view.state);
        execute(*op, engine, step_stream)?;
    }
    Ok(ops)
}

fn execute<E>(op: EngineOp, engine: &mut E, step_stream: &StreamId) -> EngineResult<()>
where
    E: PlaybackEngine + ?Sized,
{
    match op {
        EngineOp::SetTiming(mode) => engine.set_timing_mode(mode),
        EngineOp::Pause => engine.pause(),
        EngineOp::Resume => engine.resume(),
        EngineOp::StepOnce => engine.step_once(step_stream),
        EngineOp::Stop => engine.stop(),
    }
}
