//! Display contract: what the player tells the visual layer.

use op_ir::{Board, LoopLength};

use crate::{DisplayError, PlaybackPosition, SpectrumSnapshot};

/// Facts about a freshly loaded track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackInfo<'a> {
    pub filename: &'a str,
    pub board: Board,
    pub parts: usize,
    pub timer_b: u8,
    pub comment: Option<&'a str>,
    pub loop_length: LoopLength,
}

/// Everything one visual frame needs.
#[derive(Clone, Copy, Debug)]
pub struct RenderFrame<'a> {
    pub spectrum: &'a SpectrumSnapshot,
    pub paused: bool,
    pub loop_length: LoopLength,
    pub position: PlaybackPosition,
}

/// A visual front end driven by [`crate::Player`].
///
/// All calls happen on the host side and never while the audio lock is
/// held.
pub trait Display {
    /// One-time setup, called from [`crate::Player::new`].
    fn init(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn update_file(&mut self, info: &TrackInfo<'_>);

    /// Return comment scrolling to the top.
    fn comment_reset(&mut self);

    fn comment_scroll(&mut self, down: bool);

    /// `index` is already clamped to the configured palette count.
    fn set_palette(&mut self, index: u8);

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), DisplayError>;
}

/// Display that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn update_file(&mut self, _info: &TrackInfo<'_>) {}
    fn comment_reset(&mut self) {}
    fn comment_scroll(&mut self, _down: bool) {}
    fn set_palette(&mut self, _index: u8) {}
    fn render(&mut self, _frame: &RenderFrame<'_>) -> Result<(), DisplayError> {
        Ok(())
    }
}
