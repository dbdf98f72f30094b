#![allow(missing_docs)]
//! Datagram plumbing for the remote command channel.
//!
//! [`DatagramReceiver`] keeps exactly one receive outstanding on a bound
//! socket from a background thread and publishes every decoded command into
//! a shared [`CommandMailbox`](transport_codecs::CommandMailbox).
//! [`DatagramSender`] is the matching client side.

mod error;
mod metrics;
mod receiver;
mod sender;

pub use error::{FabricError, FabricResult};
pub use metrics::ReceiverStats;
pub use receiver::{DatagramReceiver, ReceiverOptions, DEFAULT_RECEIVE_TIMEOUT};
pub use sender::{DatagramSender, SendOutcome};
