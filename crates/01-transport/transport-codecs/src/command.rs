use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use transport::{Mailbox, SlotCode};

use crate::CodecError;

/// Mailbox carrying the most recent command from the receiver to the loop.
pub type CommandMailbox = Mailbox<Command>;

/// Remote playback intent, one opcode per datagram.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// No command pending.
    #[default]
    None = 0,
    /// Stop playback and end the session.
    Exit = 1,
    /// Toggle between real-time playback and paused.
    Play = 16,
    /// Advance exactly one frame.
    Step = 20,
    /// Toggle timing mode.
    Time = 32,
    /// Reserved.
    Tick = 64,
    /// Reserved.
    Calibration = 128,
}

impl Command {
    /// Every command with a wire representation, `None` excluded.
    pub const ALL: [Command; 6] = [
        Command::Exit,
        Command::Play,
        Command::Step,
        Command::Time,
        Command::Tick,
        Command::Calibration,
    ];

    /// Opcode carried in byte 0 of a datagram.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up an opcode. Unknown values yield `None` (the Rust option).
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Command::None),
            1 => Some(Command::Exit),
            16 => Some(Command::Play),
            20 => Some(Command::Step),
            32 => Some(Command::Time),
            64 => Some(Command::Tick),
            128 => Some(Command::Calibration),
            _ => None,
        }
    }

    /// ASCII token used by the text form of the protocol.
    pub const fn token(self) -> &'static str {
        match self {
            Command::None => "NONE",
            Command::Exit => "EXIT",
            Command::Play => "PLAY",
            Command::Step => "STEP",
            Command::Time => "TIME",
            Command::Tick => "TICK",
            Command::Calibration => "CALI",
        }
    }

    /// True when a command is pending.
    pub const fn is_some(self) -> bool {
        !matches!(self, Command::None)
    }
}

impl SlotCode for Command {
    const EMPTY: u8 = Command::None as u8;

    fn to_code(self) -> u8 {
        self.code()
    }

    fn from_code(code: u8) -> Self {
        Command::from_code(code).unwrap_or(Command::None)
    }
}

impl TryFrom<u8> for Command {
    type Error = CodecError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Command::from_code(code).ok_or(CodecError::UnknownCode(code))
    }
}

impl FromStr for Command {
    type Err = CodecError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.token() == token)
            .ok_or_else(|| CodecError::UnknownToken(token.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
