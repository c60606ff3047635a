//! Audio-side context.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::player::{PlaybackPosition, Shared};
use crate::{AudioLock, SpectrumHandoff, MAX_SAMPLES};

/// Produces interleaved stereo samples for the audio callback.
pub struct Mixer {
    shared: Arc<Shared>,
    buffer: [i16; MAX_SAMPLES * 2],
}

impl Mixer {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            buffer: [0; MAX_SAMPLES * 2],
        }
    }

    /// Mix up to [`MAX_SAMPLES`] frames and return them interleaved.
    ///
    /// The output is zeroed first, so a paused or empty player yields
    /// silence. Spectrum publishing is skipped if the display holds the
    /// slot. Does not allocate.
    pub fn mix(&mut self, frames: usize) -> &[i16] {
        let frames = frames.min(MAX_SAMPLES);

        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.fill(frames));
        #[cfg(not(feature = "alloc_check"))]
        self.fill(frames);

        &self.buffer[..frames * 2]
    }

    fn fill(&mut self, frames: usize) {
        let out = &mut self.buffer[..frames * 2];
        out.fill(0);

        {
            let mut audio = self.shared.audio.acquire();
            let state = &mut *audio;
            let paused = self.shared.paused.load(Ordering::Acquire);
            if let (false, Some(track)) = (paused, &state.track) {
                let work = &mut state.work;
                state.chip.mix(out, |chip| {
                    op_driver::interrupt(work, track.view(), chip);
                });
                self.shared.set_position(PlaybackPosition {
                    ticks: work.timerb_ticks(),
                    loops: work.loop_count(),
                });
            }
        }

        self.shared.spectrum.try_publish(out);
    }

    /// The whole output buffer, including frames past the last mix.
    pub fn buffer(&self) -> &[i16] {
        &self.buffer
    }

    /// Mix `frames` frames in [`MAX_SAMPLES`] blocks for offline use.
    pub fn render_interleaved(&mut self, frames: usize) -> Vec<i16> {
        let mut out = Vec::with_capacity(frames * 2);
        let mut remaining = frames;
        while remaining > 0 {
            let block = remaining.min(MAX_SAMPLES);
            out.extend_from_slice(self.mix(block));
            remaining -= block;
        }
        out
    }

    pub fn position(&self) -> PlaybackPosition {
        self.shared.position()
    }

    /// True once every part of the loaded track has ended. Takes the audio lock.
    pub fn is_finished(&self) -> bool {
        self.shared.audio.acquire().work().is_finished()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    pub fn spectrum_handoff(&self) -> &SpectrumHandoff {
        &self.shared.spectrum
    }

    /// The lock shared with the player.
    pub fn audio(&self) -> &AudioLock {
        &self.shared.audio
    }
}

#[cfg(test)]
mod tests {
    use crate::{NullDisplay, Player, PlayerConfig, MAX_SAMPLES};
    use op_formats::TrackWriter;

    fn loaded() -> (Player<NullDisplay>, super::Mixer) {
        let (mut player, mixer) = Player::new(NullDisplay, PlayerConfig::default()).unwrap();
        let data = TrackWriter::new()
            .timer_b(250)
            .part(&[0x30, 8, 0xFE, 0x34, 4, 0xFF])
            .build();
        player.load_bytes("t", &data).unwrap();
        (player, mixer)
    }

    #[test]
    fn mix_clamps_to_max_samples() {
        let (_player, mut mixer) = loaded();
        assert_eq!(mixer.mix(1000).len(), MAX_SAMPLES * 2);
        assert_eq!(mixer.mix(0).len(), 0);
        assert_eq!(mixer.mix(32).len(), 64);
    }

    #[test]
    fn mix_without_track_is_silent() {
        let (_player, mut mixer) = Player::new(NullDisplay, PlayerConfig::default()).unwrap();
        assert!(mixer.mix(128).iter().all(|&s| s == 0));
    }

    #[test]
    fn mix_advances_position() {
        let (player, mut mixer) = loaded();
        for _ in 0..10 {
            mixer.mix(128);
        }
        // 1280 frames at 48 frames per tick
        assert_eq!(player.position().ticks, 26);
        assert_eq!(mixer.position(), player.position());
    }

    #[test]
    fn paused_mix_keeps_position() {
        let (player, mut mixer) = loaded();
        mixer.mix(128);
        let before = mixer.position();
        player.toggle_pause();
        assert!(mixer.is_paused());
        assert!(mixer.mix(128).iter().all(|&s| s == 0));
        assert_eq!(mixer.position(), before);
    }

    #[test]
    fn render_interleaved_spans_blocks() {
        let (_player, mut mixer) = loaded();
        let samples = mixer.render_interleaved(300);
        assert_eq!(samples.len(), 600);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn publish_skipped_while_display_holds_slot() {
        let (player, mut mixer) = loaded();
        let held = player.spectrum_handoff().try_claim().unwrap();
        mixer.mix(128);
        assert!(held.is_silent());
        drop(held);
    }
}
