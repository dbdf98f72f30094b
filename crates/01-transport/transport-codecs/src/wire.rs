use crate::Command;

/// Receive buffer size. Only byte 0 carries an opcode; the rest leaves room
/// for the four-letter text tokens.
pub const DATAGRAM_LEN: usize = 8;

/// Encoding used by a sender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WireFormat {
    /// Opcode in a single byte.
    #[default]
    Byte,
    /// ASCII token, e.g. `STEP`.
    Text,
}

/// Decodes one received datagram into a pending command.
///
/// Returns `None` for empty frames, unknown opcodes and unknown tokens, and
/// for an explicit `Command::None` opcode, since none of them can change the
/// mailbox meaningfully.
pub fn decode_datagram(payload: &[u8]) -> Option<Command> {
    if payload.is_empty() {
        return None;
    }
    let command = decode_text(payload).or_else(|| Command::from_code(payload[0]))?;
    command.is_some().then_some(command)
}

/// Encodes a command for transmission.
pub fn encode(command: Command, format: WireFormat) -> Vec<u8> {
    match format {
        WireFormat::Byte => vec![command.code()],
        WireFormat::Text => command.token().as_bytes().to_vec(),
    }
}

fn decode_text(payload: &[u8]) -> Option<Command> {
    let text = core::str::from_utf8(payload).ok()?;
    let token = text.trim_end_matches(|c: char| c == '\0' || c.is_ascii_whitespace());
    token.parse().ok()
}
