//! File formats for opnplay.
//!
//! Parses sequence files into [`op_ir::ParsedTrack`], builds them with
//! [`TrackWriter`], and writes rendered audio as WAV.

mod track_format;
mod wav_format;
mod writer;

pub use track_format::{load_track, MAX_FILE_SIZE};
pub use wav_format::{samples_to_wav, write_wav};
pub use writer::TrackWriter;

use op_ir::DecodeError;

/// Error type for format parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("invalid file header")]
    InvalidHeader,
    #[error("unsupported board byte {0:#04x}")]
    UnsupportedBoard(u8),
    #[error("{count} parts, board supports 1 to {max}")]
    BadPartCount { count: usize, max: usize },
    #[error("part {part} starts at {offset:#x}, past the end of the data")]
    PartOutOfBounds { part: usize, offset: usize },
    #[error("part {part}: {kind} at offset {offset:#x}")]
    InvalidCommand {
        part: usize,
        offset: usize,
        kind: DecodeError,
    },
    #[error("part {part} has more than one loop point")]
    DuplicateLoopPoint { part: usize },
    #[error("part {part} loops without a note or rest")]
    EmptyLoop { part: usize },
    #[error("part {part}: too many commands before the note or rest at {offset:#x}")]
    TooManyCommands { part: usize, offset: usize },
    #[error("comment is not NUL-terminated")]
    UnterminatedComment,
    #[error("file is {0} bytes, limit is {max}", max = MAX_FILE_SIZE)]
    TooLarge(usize),
}
