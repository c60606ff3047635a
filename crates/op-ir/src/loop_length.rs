//! Loop length as measured by the loop simulator.

use core::fmt;

/// Number of timer-B ticks until the first loop completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopLength {
    /// Not measured, or the measurement was aborted
    #[default]
    Unknown,
    /// The track never reaches its loop target
    Never,
    Ticks(u32),
}

impl LoopLength {
    /// Raw sentinel for [`LoopLength::Unknown`].
    pub const UNKNOWN_RAW: u32 = 0;
    /// Raw sentinel for [`LoopLength::Never`] (all bits set).
    pub const NEVER_RAW: u32 = u32::MAX;

    /// Encode as a single integer, as displays consume it.
    pub fn to_raw(self) -> u32 {
        match self {
            LoopLength::Unknown => Self::UNKNOWN_RAW,
            LoopLength::Never => Self::NEVER_RAW,
            LoopLength::Ticks(t) => t,
        }
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            Self::UNKNOWN_RAW => LoopLength::Unknown,
            Self::NEVER_RAW => LoopLength::Never,
            t => LoopLength::Ticks(t),
        }
    }

    pub fn ticks(self) -> Option<u32> {
        match self {
            LoopLength::Ticks(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for LoopLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopLength::Unknown => write!(f, "unknown"),
            LoopLength::Never => write!(f, "never"),
            LoopLength::Ticks(t) => write!(f, "{} ticks", t),
        }
    }
}
