//! Builder for sequence files, used by tests, benches and the demo command.

use op_ir::Board;

const MAGIC: &[u8; 4] = b"OPSQ";
/// Magic, timer B, part count and comment offset.
const FIXED_HEADER_LEN: usize = 8;

/// Assembles a sequence file from raw part streams.
///
/// ```
/// use op_formats::{load_track, TrackWriter};
///
/// let data = TrackWriter::new().part(&[0x30, 4, 0xFF]).build();
/// assert!(load_track(&data).is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct TrackWriter {
    board: Board,
    timer_b: u8,
    comment: Option<String>,
    parts: Vec<Vec<u8>>,
}

impl Default for TrackWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackWriter {
    pub fn new() -> Self {
        Self {
            board: Board::Opna,
            timer_b: 200,
            comment: None,
            parts: Vec::new(),
        }
    }

    pub fn board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    pub fn timer_b(mut self, timer_b: u8) -> Self {
        self.timer_b = timer_b;
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.comment = Some(text.to_owned());
        self
    }

    /// Append a part stream. The bytes are written as given, so the
    /// stream should end with `0xFF`.
    pub fn part(mut self, stream: &[u8]) -> Self {
        self.parts.push(stream.to_vec());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_len = FIXED_HEADER_LEN + 2 * self.parts.len();

        let mut offsets = Vec::with_capacity(self.parts.len());
        let mut cursor = header_len;
        for part in &self.parts {
            offsets.push(cursor as u16);
            cursor += part.len();
        }
        let comment_offset = if self.comment.is_some() { cursor as u16 } else { 0 };

        let mut out = Vec::with_capacity(1 + cursor);
        out.push(self.board.to_byte());
        out.extend_from_slice(MAGIC);
        out.push(self.timer_b);
        out.push(self.parts.len() as u8);
        out.extend_from_slice(&comment_offset.to_le_bytes());
        for offset in offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        for part in &self.parts {
            out.extend_from_slice(part);
        }
        if let Some(comment) = &self.comment {
            out.extend_from_slice(comment.as_bytes());
            out.push(0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let data = TrackWriter::new()
            .timer_b(190)
            .part(&[0x30, 1, 0xFF])
            .part(&[0xFF])
            .build();
        assert_eq!(data[0], 1);
        assert_eq!(&data[1..5], b"OPSQ");
        assert_eq!(data[5], 190);
        assert_eq!(data[6], 2);
        assert_eq!(u16::from_le_bytes([data[7], data[8]]), 0);
        // first part right after the header: 8 fixed bytes + 2 offsets
        assert_eq!(u16::from_le_bytes([data[9], data[10]]), 12);
        assert_eq!(u16::from_le_bytes([data[11], data[12]]), 15);
    }

    #[test]
    fn comment_follows_parts() {
        let data = TrackWriter::new().comment("hi").part(&[0xFF]).build();
        let offset = u16::from_le_bytes([data[7], data[8]]) as usize;
        assert_eq!(&data[1 + offset..], b"hi\0");
    }

    #[test]
    fn opn_board_byte() {
        let data = TrackWriter::new().board(Board::Opn).part(&[0xFF]).build();
        assert_eq!(data[0], 0);
    }
}
