//! The audio lock and the state it guards.

use op_chip::{AdpcmRam, Opn};
use op_driver::DriverWork;
use op_ir::ParsedTrack;
use spin::mutex::{SpinMutex, SpinMutexGuard};

/// Everything the audio path mutates: chip, driver progress, the loaded
/// track and ADPCM memory.
pub struct AudioState {
    pub(crate) chip: Opn,
    pub(crate) work: DriverWork,
    pub(crate) track: Option<ParsedTrack>,
    pub(crate) adpcm_ram: AdpcmRam,
}

impl AudioState {
    fn new() -> Self {
        Self {
            chip: Opn::new(),
            work: DriverWork::new(),
            track: None,
            adpcm_ram: AdpcmRam::new(),
        }
    }

    /// Zero everything ahead of a load. No track is playable afterwards.
    pub(crate) fn clear(&mut self) {
        self.adpcm_ram.clear();
        self.work.reset();
        self.chip.reset();
        self.track = None;
    }

    pub fn chip(&self) -> &Opn {
        &self.chip
    }

    pub fn work(&self) -> &DriverWork {
        &self.work
    }

    pub fn track(&self) -> Option<&ParsedTrack> {
        self.track.as_ref()
    }

    pub fn adpcm_ram(&self) -> &AdpcmRam {
        &self.adpcm_ram
    }
}

pub type AudioGuard<'a> = SpinMutexGuard<'a, AudioState>;

/// Busy-waiting exclusive lock around [`AudioState`].
///
/// Held for the whole of a load and the whole of a mix call. Nothing
/// that holds it blocks on I/O.
pub struct AudioLock {
    state: SpinMutex<AudioState>,
}

impl AudioLock {
    pub(crate) fn new() -> Self {
        Self {
            state: SpinMutex::new(AudioState::new()),
        }
    }

    /// Spin until the state is ours. Dropping the guard releases it.
    pub fn acquire(&self) -> AudioGuard<'_> {
        self.state.lock()
    }

    pub fn try_acquire(&self) -> Option<AudioGuard<'_>> {
        self.state.try_lock()
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }
}
