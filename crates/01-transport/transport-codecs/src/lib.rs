//! Wire codecs for remote playback commands.
//!
//! A command travels as a single datagram in one of two equivalent forms:
//! a raw opcode in byte 0, or an ASCII token such as `STEP`. Both decode to
//! the same [`Command`], which is also the value carried by the command
//! mailbox.

mod command;
mod wire;

pub use command::{Command, CommandMailbox};
pub use wire::{decode_datagram, encode, WireFormat, DATAGRAM_LEN};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown command code {0:#04x}")]
    UnknownCode(u8),

    #[error("unknown command token {0:?}")]
    UnknownToken(String),
}
