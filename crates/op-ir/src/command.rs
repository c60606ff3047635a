//! Part command stream encoding.
//!
//! Each part is a byte stream of commands. Timed commands (notes and
//! rests) carry a length in timer-B ticks; everything else takes effect
//! immediately.

use core::fmt;

/// Highest note number (octave 7, semitone 11).
pub const MAX_NOTE: u8 = 0x5F;

/// Commands the driver decodes for one part in one tick, counting the
/// note or rest that ends the run. Longer runs end the part.
pub const MAX_COMMANDS_PER_TICK: usize = 64;

const OP_REST: u8 = 0x80;
const OP_TEMPO: u8 = 0xF0;
const OP_VOLUME: u8 = 0xF1;
const OP_MULTIPLIER: u8 = 0xF2;
const OP_DEPTH: u8 = 0xF3;
const OP_PAN: u8 = 0xF4;
const OP_LOOP_POINT: u8 = 0xFE;
const OP_END: u8 = 0xFF;

/// Output routing for a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pan {
    Center,
    Left,
    Right,
}

impl Pan {
    /// Left/right enable bits as laid out in the chip's pan register.
    pub const fn register_bits(self) -> u8 {
        match self {
            Pan::Center => 0xC0,
            Pan::Left => 0x80,
            Pan::Right => 0x40,
        }
    }
}

/// One decoded command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Key a note on for `len` ticks
    Note { note: u8, len: u8 },
    /// Stay silent for `len` ticks
    Rest { len: u8 },
    /// Set the timer-B reload value
    Tempo(u8),
    /// Carrier total level (0 = loudest, 127 = silent)
    Volume(u8),
    /// Modulator frequency multiplier
    Multiplier(u8),
    /// Modulation depth
    Depth(u8),
    Pan(Pan),
    /// Where playback resumes after `End`
    LoopPoint,
    End,
}

impl Command {
    /// Whether this command consumes ticks.
    pub fn is_timed(&self) -> bool {
        matches!(self, Command::Note { .. } | Command::Rest { .. })
    }
}

/// Why a command failed to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended in the middle of a command
    UnexpectedEof,
    /// Unknown opcode byte
    InvalidOpcode(u8),
    /// Parameter byte out of range for its opcode
    InvalidParameter { opcode: u8, value: u8 },
    /// Note or rest with a length of zero ticks
    ZeroLength,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEof => write!(f, "unexpected end of command stream"),
            DecodeError::InvalidOpcode(op) => write!(f, "invalid opcode {:#04x}", op),
            DecodeError::InvalidParameter { opcode, value } => {
                write!(f, "parameter {:#04x} out of range for opcode {:#04x}", value, opcode)
            }
            DecodeError::ZeroLength => write!(f, "zero-length note or rest"),
        }
    }
}

/// Decode the command at `offset`, returning it and the offset of the next one.
pub fn decode(stream: &[u8], offset: usize) -> Result<(Command, usize), DecodeError> {
    let opcode = *stream.get(offset).ok_or(DecodeError::UnexpectedEof)?;
    let param = || stream.get(offset + 1).copied().ok_or(DecodeError::UnexpectedEof);
    let ranged = |max: u8| {
        let value = param()?;
        if value > max {
            Err(DecodeError::InvalidParameter { opcode, value })
        } else {
            Ok(value)
        }
    };

    let command = match opcode {
        0..=MAX_NOTE => {
            let len = param()?;
            if len == 0 {
                return Err(DecodeError::ZeroLength);
            }
            Command::Note { note: opcode, len }
        }
        OP_REST => {
            let len = param()?;
            if len == 0 {
                return Err(DecodeError::ZeroLength);
            }
            Command::Rest { len }
        }
        OP_TEMPO => Command::Tempo(param()?),
        OP_VOLUME => Command::Volume(ranged(127)?),
        OP_MULTIPLIER => Command::Multiplier(ranged(15)?),
        OP_DEPTH => Command::Depth(ranged(7)?),
        OP_PAN => match ranged(2)? {
            0 => Command::Pan(Pan::Center),
            1 => Command::Pan(Pan::Left),
            _ => Command::Pan(Pan::Right),
        },
        OP_LOOP_POINT => return Ok((Command::LoopPoint, offset + 1)),
        OP_END => return Ok((Command::End, offset + 1)),
        other => return Err(DecodeError::InvalidOpcode(other)),
    };

    Ok((command, offset + 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_note_and_advances_two_bytes() {
        let stream = [0x30, 24, 0xFF];
        assert_eq!(decode(&stream, 0), Ok((Command::Note { note: 0x30, len: 24 }, 2)));
        assert_eq!(decode(&stream, 2), Ok((Command::End, 3)));
    }

    #[test]
    fn rejects_zero_length() {
        assert_eq!(decode(&[0x10, 0], 0), Err(DecodeError::ZeroLength));
        assert_eq!(decode(&[0x80, 0], 0), Err(DecodeError::ZeroLength));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert_eq!(
            decode(&[0xF3, 8], 0),
            Err(DecodeError::InvalidParameter { opcode: 0xF3, value: 8 })
        );
        assert_eq!(decode(&[0xF4, 2], 0), Ok((Command::Pan(Pan::Right), 2)));
    }

    #[test]
    fn truncated_command_is_eof() {
        assert_eq!(decode(&[0xF0], 0), Err(DecodeError::UnexpectedEof));
        assert_eq!(decode(&[], 0), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(decode(&[0x60, 1], 0), Err(DecodeError::InvalidOpcode(0x60)));
    }
}
