//! Parsed track data and its simulator copy.
//!
//! The file format reads one byte *before* the logical data start (the
//! board byte). Rather than stepping a pointer backwards, both
//! [`ParsedTrack`] and [`TrackCopy`] keep the whole file and describe the
//! body with an explicit [`Span`]; the byte at `body.offset - 1` is the
//! lookback byte and always travels with the body.

use alloc::collections::TryReserveError;
use alloc::string::String;
use alloc::vec::Vec;
use arrayvec::ArrayVec;

/// Maximum number of parts any board supports.
pub const MAX_PARTS: usize = 6;

/// Sound board the track was written for, stored in the lookback byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Board {
    /// Three FM channels
    Opn,
    /// Six FM channels
    Opna,
}

impl Board {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Board::Opn),
            1 => Some(Board::Opna),
            _ => None,
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            Board::Opn => 0,
            Board::Opna => 1,
        }
    }

    pub const fn max_parts(self) -> usize {
        match self {
            Board::Opn => 3,
            Board::Opna => 6,
        }
    }
}

/// A byte range within a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    /// The span widened by one byte at the front to include the lookback byte.
    pub fn with_lookback(self) -> Span {
        Span {
            offset: self.offset - 1,
            len: self.len + 1,
        }
    }

    fn range(self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Sequence data decoded from a file. Immutable once built.
#[derive(Clone, Debug)]
pub struct ParsedTrack {
    data: Vec<u8>,
    body: Span,
    board: Board,
    timer_b: u8,
    parts: ArrayVec<u16, MAX_PARTS>,
    comment: Option<String>,
}

impl ParsedTrack {
    /// Build a track from raw file bytes whose body starts at offset 1.
    ///
    /// The caller has already validated the header and every part stream.
    /// Returns `None` if `data` lacks the lookback byte.
    pub fn new(
        data: Vec<u8>,
        board: Board,
        timer_b: u8,
        parts: ArrayVec<u16, MAX_PARTS>,
        comment: Option<String>,
    ) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let body = Span {
            offset: 1,
            len: data.len() - 1,
        };
        Some(Self {
            data,
            body,
            board,
            timer_b,
            parts,
            comment,
        })
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// Initial timer-B reload value.
    pub fn timer_b(&self) -> u8 {
        self.timer_b
    }

    /// Part stream offsets, relative to the body.
    pub fn parts(&self) -> &[u16] {
        &self.parts
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Body span within the file bytes.
    pub fn body(&self) -> Span {
        self.body
    }

    pub fn view(&self) -> TrackView<'_> {
        TrackView {
            bytes: &self.data[self.body.with_lookback().range()],
            timer_b: self.timer_b,
            parts: &self.parts,
        }
    }
}

/// A privately owned duplicate of a track's body and lookback byte.
///
/// Used by the loop simulator so that a dry run never shares memory with
/// real playback. Dropping it frees everything it owns.
#[derive(Debug)]
pub struct TrackCopy {
    bytes: Vec<u8>,
    timer_b: u8,
    parts: ArrayVec<u16, MAX_PARTS>,
}

impl TrackCopy {
    /// Duplicate `track`, reporting allocation failure instead of aborting.
    pub fn try_from_track(track: &ParsedTrack) -> Result<Self, TryReserveError> {
        let span = track.body.with_lookback();
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(span.len)?;
        bytes.extend_from_slice(&track.data[span.range()]);
        Ok(Self {
            bytes,
            timer_b: track.timer_b,
            parts: track.parts.clone(),
        })
    }

    /// The copied span: lookback byte followed by the body.
    pub fn span(&self) -> Span {
        Span {
            offset: 0,
            len: self.bytes.len(),
        }
    }

    pub fn view(&self) -> TrackView<'_> {
        TrackView {
            bytes: &self.bytes,
            timer_b: self.timer_b,
            parts: &self.parts,
        }
    }
}

/// Borrowed view of track data as the driver consumes it.
#[derive(Clone, Copy, Debug)]
pub struct TrackView<'a> {
    /// Lookback byte followed by the body.
    bytes: &'a [u8],
    timer_b: u8,
    parts: &'a [u16],
}

impl<'a> TrackView<'a> {
    /// The byte immediately preceding the body.
    pub fn lookback(&self) -> u8 {
        self.bytes[0]
    }

    pub fn body(&self) -> &'a [u8] {
        &self.bytes[1..]
    }

    pub fn timer_b(&self) -> u8 {
        self.timer_b
    }

    pub fn parts(&self) -> &'a [u16] {
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample_track() -> ParsedTrack {
        let mut parts = ArrayVec::new();
        parts.push(4);
        ParsedTrack::new(vec![1, 0xAA, 0xBB, 0xCC, 0xDD, 0xFF], Board::Opna, 200, parts, None)
            .unwrap()
    }

    #[test]
    fn track_needs_lookback_byte() {
        let track = ParsedTrack::new(Vec::new(), Board::Opn, 200, ArrayVec::new(), None);
        assert!(track.is_none());
    }

    #[test]
    fn view_exposes_lookback_byte() {
        let track = sample_track();
        let view = track.view();
        assert_eq!(view.lookback(), 1);
        assert_eq!(view.body(), &[0xAA, 0xBB, 0xCC, 0xDD, 0xFF]);
    }

    #[test]
    fn copy_duplicates_lookback_and_body() {
        let track = sample_track();
        let copy = TrackCopy::try_from_track(&track).unwrap();
        assert_eq!(copy.span(), Span { offset: 0, len: 6 });
        assert_eq!(copy.view().lookback(), track.view().lookback());
        assert_eq!(copy.view().body(), track.view().body());
        assert_eq!(copy.view().parts(), track.parts());
        assert_ne!(copy.view().body().as_ptr(), track.view().body().as_ptr());
    }

    #[test]
    fn span_with_lookback() {
        let span = Span { offset: 1, len: 10 };
        assert_eq!(span.with_lookback(), Span { offset: 0, len: 11 });
    }

    #[test]
    fn board_byte() {
        assert_eq!(Board::from_byte(0), Some(Board::Opn));
        assert_eq!(Board::from_byte(1).map(Board::max_parts), Some(6));
        assert_eq!(Board::from_byte(2), None);
    }
}
