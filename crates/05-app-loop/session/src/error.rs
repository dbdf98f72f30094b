use std::io;
use std::path::PathBuf;

use app::ControlError;
use service_abi::EngineError;
use thiserror::Error;
use transport_fabric::FabricError;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no recording path given")]
    EmptyPath,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Fabric(#[from] FabricError),

    #[error(transparent)]
    Control(#[from] ControlError),
}
