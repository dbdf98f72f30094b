use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use app::IdleStrategy;
use serde::{Deserialize, Serialize};
use service_abi::{EndBehavior, StreamId};

use crate::error::{SessionError, SessionResult};

pub const DEFAULT_PORT: u16 = 27001;

/// Everything a session needs besides the recording path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub bind_address: String,
    pub port: u16,
    /// Extra passes after the first one.
    pub loop_count: u32,
    pub end_behavior: EndBehavior,
    /// Stream advanced by a single step.
    pub step_stream: StreamId,
    /// Streams to play. Empty selects every stream in the file.
    pub streams: Vec<StreamId>,
    pub idle: IdleStrategy,
    /// How often the receiver wakes up to notice it was closed.
    pub receive_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            loop_count: 0,
            end_behavior: EndBehavior::Stop,
            step_stream: StreamId::new("depth"),
            streams: Vec::new(),
            idle: IdleStrategy::Yield,
            receive_timeout_ms: 50,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> SessionResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SessionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(SessionError::InvalidConfig(format!(
                "bind_address {:?} is not an IP address",
                self.bind_address
            )));
        }
        if self.receive_timeout_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "receive_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.step_stream.as_str().is_empty() {
            return Err(SessionError::InvalidConfig(
                "step_stream must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}
