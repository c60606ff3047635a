//! Audio frame type.

/// A stereo audio frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Build a frame from 32-bit accumulators, clamping to the i16 range.
    pub fn from_i32(left: i32, right: i32) -> Self {
        Self {
            left: left.clamp(-32768, 32767) as i16,
            right: right.clamp(-32768, 32767) as i16,
        }
    }

    /// Write this frame into an interleaved `[left, right]` pair.
    pub fn write_interleaved(self, out: &mut [i16]) {
        out[0] = self.left;
        out[1] = self.right;
    }

    pub fn is_silent(self) -> bool {
        self.left == 0 && self.right == 0
    }
}
