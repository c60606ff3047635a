//! Host-side context: load, render and playback control.

use std::collections::TryReserveError;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use op_driver::PCM_CHANNELS;
use op_ir::{Board, LoopLength, ParsedTrack};

use crate::audio_state::AudioLock;
use crate::display::{Display, RenderFrame, TrackInfo};
use crate::spectrum::{self, SpectrumHandoff, SpectrumSnapshot};
use crate::staging::{StagingBuffers, FILENAME_BUFFER_SIZE};
use crate::{DisplayError, InitError, LoadError, Mixer, PlayerConfig};

/// Driver progress as last reported by the mixer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Timer-B ticks since load
    pub ticks: u32,
    /// Completed loops since load
    pub loops: u32,
}

/// State shared by [`Player`] and [`Mixer`].
pub(crate) struct Shared {
    pub(crate) audio: AudioLock,
    /// Read by the mixer under the audio lock, written without it.
    pub(crate) paused: AtomicBool,
    pub(crate) spectrum: SpectrumHandoff,
    pub(crate) ticks: AtomicU32,
    pub(crate) loops: AtomicU32,
}

impl Shared {
    pub(crate) fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            ticks: self.ticks.load(Ordering::Relaxed),
            loops: self.loops.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn set_position(&self, position: PlaybackPosition) {
        self.ticks.store(position.ticks, Ordering::Relaxed);
        self.loops.store(position.loops, Ordering::Relaxed);
    }
}

/// Host-visible summary of the loaded track, kept outside the audio lock.
struct Loaded {
    filename: heapless::String<FILENAME_BUFFER_SIZE>,
    board: Board,
    parts: usize,
    timer_b: u8,
    comment: Option<String>,
}

impl Loaded {
    fn info(&self, loop_length: LoopLength) -> TrackInfo<'_> {
        TrackInfo {
            filename: &self.filename,
            board: self.board,
            parts: self.parts,
            timer_b: self.timer_b,
            comment: self.comment.as_deref(),
            loop_length,
        }
    }
}

/// Loop-length measurement run during load, under the audio lock.
type MeasureFn = fn(&ParsedTrack, u32, u32) -> Result<LoopLength, TryReserveError>;

/// Host-side playback context.
///
/// Created together with its [`Mixer`] by [`Player::new`]; the mixer goes
/// to the audio callback, the player stays with the host.
pub struct Player<D: Display> {
    shared: Arc<Shared>,
    staging: StagingBuffers,
    display: D,
    /// Display-side spectrum copy, refreshed by `render` when the slot is free
    spectrum: SpectrumSnapshot,
    loop_length: LoopLength,
    loaded: Option<Loaded>,
    palette: u8,
    config: PlayerConfig,
    measure: MeasureFn,
}

impl<D: Display> Player<D> {
    /// Build lookup tables, initialize the display, and create the
    /// player/mixer pair.
    pub fn new(mut display: D, config: PlayerConfig) -> Result<(Self, Mixer), InitError> {
        if config.palette_count == 0 {
            return Err(InitError::NoPalettes);
        }
        op_chip::init_tables();
        spectrum::init_tables();
        display.init()?;
        display.set_palette(0);

        let shared = Arc::new(Shared {
            audio: AudioLock::new(),
            paused: AtomicBool::new(false),
            spectrum: SpectrumHandoff::new(),
            ticks: AtomicU32::new(0),
            loops: AtomicU32::new(0),
        });
        let mixer = Mixer::new(shared.clone());

        log::debug!("player ready, {} palettes", config.palette_count);
        let player = Self {
            shared,
            staging: StagingBuffers::new(),
            display,
            spectrum: SpectrumSnapshot::default(),
            loop_length: LoopLength::Unknown,
            loaded: None,
            palette: 0,
            config,
            measure: op_driver::try_measure_loop_length,
        };
        Ok((player, mixer))
    }

    // --- Staging ---

    pub fn staging(&self) -> &StagingBuffers {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut StagingBuffers {
        &mut self.staging
    }

    // --- Load ---

    /// Load the first `len` staged bytes as a new track.
    ///
    /// Whatever was playing is discarded first. On failure nothing is
    /// playable and the mixer produces silence until the next good load.
    pub fn load(&mut self, len: usize) -> Result<(), LoadError> {
        let filename = self.staging.filename();
        self.loop_length = LoopLength::Unknown;
        self.loaded = None;

        let mut audio = self.shared.audio.acquire();
        audio.clear();
        self.shared.set_position(PlaybackPosition::default());

        let parsed = self
            .staging
            .file(len)
            .and_then(|bytes| op_formats::load_track(bytes).map_err(LoadError::from));
        let track = match parsed {
            Ok(track) => track,
            Err(e) => {
                drop(audio);
                log::warn!("failed to load {}: {}", filename, e);
                return Err(e);
            }
        };

        // no logging until the lock is released
        let measured = (self.measure)(&track, self.config.loop_target, self.config.tick_ceiling);
        let loop_length = measured.clone().unwrap_or_default();

        let state = &mut *audio;
        state.work.set_loop_length(loop_length);
        op_driver::init(&mut state.work, track.view(), &mut state.chip);
        state.work.pcm_error = [true; PCM_CHANNELS];

        let loaded = Loaded {
            filename,
            board: track.board(),
            parts: track.parts().len(),
            timer_b: track.timer_b(),
            comment: track.comment().map(str::to_owned),
        };
        state.track = Some(track);
        drop(audio);

        if let Err(e) = measured {
            log::warn!("no memory to measure loop of {}: {}", loaded.filename, e);
        }
        log::info!(
            "loaded {}: {:?}, {} parts, loop {}",
            loaded.filename,
            loaded.board,
            loaded.parts,
            loop_length
        );
        self.loop_length = loop_length;

        self.display.update_file(&loaded.info(loop_length));
        self.display.comment_reset();
        self.loaded = Some(loaded);
        Ok(())
    }

    /// Stage `bytes` under `name` and load them.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), LoadError> {
        self.staging.set_filename(name);
        let len = self.staging.stage_file(bytes)?;
        self.load(len)
    }

    pub fn loop_length(&self) -> LoopLength {
        self.loop_length
    }

    /// The loaded track, if the last load succeeded.
    pub fn track_info(&self) -> Option<TrackInfo<'_>> {
        self.loaded.as_ref().map(|loaded| loaded.info(self.loop_length))
    }

    pub fn position(&self) -> PlaybackPosition {
        self.shared.position()
    }

    // --- Render ---

    /// Draw one visual frame with the newest spectrum the mixer left,
    /// or the previous one if the slot is busy.
    pub fn render(&mut self) -> Result<(), DisplayError> {
        self.shared.spectrum.try_fetch(&mut self.spectrum);
        let frame = RenderFrame {
            spectrum: &self.spectrum,
            paused: self.shared.paused.load(Ordering::Acquire),
            loop_length: self.loop_length,
            position: self.shared.position(),
        };
        self.display.render(&frame)
    }

    pub fn spectrum(&self) -> &SpectrumSnapshot {
        &self.spectrum
    }

    // --- Playback control ---

    /// Flip the pause flag and return the new state. Never waits on the
    /// audio lock; a mix already in progress finishes with the old value.
    pub fn toggle_pause(&self) -> bool {
        !self.shared.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Select a palette, clamped to `0..palette_count`. Returns the index used.
    pub fn set_palette(&mut self, index: i32) -> u8 {
        let max = self.config.palette_count.saturating_sub(1) as i32;
        self.palette = index.clamp(0, max) as u8;
        self.display.set_palette(self.palette);
        self.palette
    }

    pub fn palette(&self) -> u8 {
        self.palette
    }

    pub fn scroll_comment(&mut self, down: bool) {
        self.display.comment_scroll(down);
    }

    // --- Access ---

    pub fn audio(&self) -> &AudioLock {
        &self.shared.audio
    }

    pub fn spectrum_handoff(&self) -> &SpectrumHandoff {
        &self.shared.spectrum
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }
}
