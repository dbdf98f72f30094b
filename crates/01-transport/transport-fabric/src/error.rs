use std::io;
use std::net::SocketAddr;

use thiserror::Error;

pub type FabricResult<T> = Result<T, FabricError>;

#[derive(Debug, Error)]
pub enum FabricError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("socket error: {0}")]
    Socket(#[from] io::Error),

    #[error("invalid fabric configuration: {0}")]
    InvalidConfig(&'static str),
}
