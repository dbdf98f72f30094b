use service_abi::EngineError;
use thiserror::Error;
use transport_codecs::Command;

use crate::control::LoopReport;

pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("playback failed: engine entered {} after {} iterations", .report.final_state, .report.iterations)]
    PlaybackFailed { report: LoopReport },

    #[error("engine rejected {command}: {source}")]
    Engine {
        command: Command,
        #[source]
        source: EngineError,
    },
}
