//! Spectrum snapshots and the single-slot handoff between mix and render.
//!
//! Band levels come from a Goertzel filter per band over the mono sum of
//! the last mixed block. Neither side ever waits on the slot: when the
//! other side holds it, the transfer is skipped for that call.

use op_chip::SAMPLE_RATE;
use spin::mutex::{SpinMutex, SpinMutexGuard};
use spin::Once;

/// Number of bands in a [`SpectrumSnapshot`].
pub const SPECTRUM_BANDS: usize = 32;

const LOWEST_BAND_HZ: f32 = 60.0;
const HIGHEST_BAND_HZ: f32 = 16_000.0;
/// Levels below this map to 0.
const FLOOR_DB: f32 = -60.0;

static COEFFICIENTS: Once<[f32; SPECTRUM_BANDS]> = Once::new();

/// Build the per-band filter coefficients. Called from player setup so
/// the first mix does not pay for it.
pub(crate) fn init_tables() {
    coefficients();
}

fn coefficients() -> &'static [f32; SPECTRUM_BANDS] {
    COEFFICIENTS.call_once(|| {
        let ratio = HIGHEST_BAND_HZ / LOWEST_BAND_HZ;
        let mut table = [0.0; SPECTRUM_BANDS];
        for (band, coeff) in table.iter_mut().enumerate() {
            let t = band as f32 / (SPECTRUM_BANDS - 1) as f32;
            let freq = LOWEST_BAND_HZ * libm::powf(ratio, t);
            let omega = 2.0 * core::f32::consts::PI * freq / SAMPLE_RATE as f32;
            *coeff = 2.0 * libm::cosf(omega);
        }
        table
    })
}

/// One frame of band levels, 0 (silent) to 255 (full scale).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpectrumSnapshot {
    pub bands: [u8; SPECTRUM_BANDS],
}

impl Default for SpectrumSnapshot {
    fn default() -> Self {
        Self {
            bands: [0; SPECTRUM_BANDS],
        }
    }
}

impl SpectrumSnapshot {
    /// Recompute from interleaved stereo samples.
    pub fn compute(&mut self, samples: &[i16]) {
        let frames = samples.len() / 2;
        if frames == 0 {
            self.bands = [0; SPECTRUM_BANDS];
            return;
        }

        for (level, &coeff) in self.bands.iter_mut().zip(coefficients()) {
            let (mut s1, mut s2) = (0.0f32, 0.0f32);
            for pair in samples.chunks_exact(2) {
                let x = (pair[0] as f32 + pair[1] as f32) / 65536.0;
                let s0 = x + coeff * s1 - s2;
                s2 = s1;
                s1 = s0;
            }
            let power = (s1 * s1 + s2 * s2 - coeff * s1 * s2).max(0.0);
            let amplitude = 2.0 * libm::sqrtf(power) / frames as f32;
            *level = to_level(amplitude);
        }
    }

    pub fn is_silent(&self) -> bool {
        self.bands.iter().all(|&b| b == 0)
    }
}

fn to_level(amplitude: f32) -> u8 {
    if amplitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * libm::log10f(amplitude);
    let scaled = (db - FLOOR_DB) / -FLOOR_DB * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

/// Single shared snapshot slot guarded by a try-only spinlock.
pub struct SpectrumHandoff {
    slot: SpinMutex<SpectrumSnapshot>,
}

impl Default for SpectrumHandoff {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumHandoff {
    pub const fn new() -> Self {
        Self {
            slot: SpinMutex::new(SpectrumSnapshot {
                bands: [0; SPECTRUM_BANDS],
            }),
        }
    }

    /// Writer side: compute a snapshot from `samples` into the slot.
    /// Returns `false` and does nothing if the slot is taken.
    pub fn try_publish(&self, samples: &[i16]) -> bool {
        match self.slot.try_lock() {
            Some(mut slot) => {
                slot.compute(samples);
                true
            }
            None => false,
        }
    }

    /// Reader side: copy the slot into `dst`. Returns `false` and leaves
    /// `dst` untouched if the slot is taken.
    pub fn try_fetch(&self, dst: &mut SpectrumSnapshot) -> bool {
        match self.slot.try_lock() {
            Some(slot) => {
                *dst = *slot;
                true
            }
            None => false,
        }
    }

    /// Take the slot directly, if free.
    pub fn try_claim(&self) -> Option<SpinMutexGuard<'_, SpectrumSnapshot>> {
        self.slot.try_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, frames: usize) -> Vec<i16> {
        (0..frames)
            .flat_map(|i| {
                let phase = 2.0 * core::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32;
                let s = (libm::sinf(phase) * 16000.0) as i16;
                [s, s]
            })
            .collect()
    }

    #[test]
    fn silence_has_empty_bands() {
        let mut snap = SpectrumSnapshot::default();
        snap.compute(&[0; 256]);
        assert!(snap.is_silent());
    }

    #[test]
    fn low_tone_peaks_in_low_bands() {
        let mut snap = SpectrumSnapshot::default();
        snap.compute(&tone(220.0, 1024));
        let peak = snap
            .bands
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak < SPECTRUM_BANDS / 2, "peak in band {}", peak);
        assert!(!snap.is_silent());
    }

    #[test]
    fn empty_input_clears() {
        let mut snap = SpectrumSnapshot {
            bands: [9; SPECTRUM_BANDS],
        };
        snap.compute(&[]);
        assert!(snap.is_silent());
    }

    #[test]
    fn publish_skips_when_claimed() {
        let handoff = SpectrumHandoff::new();
        let held = handoff.try_claim().unwrap();
        assert!(!handoff.try_publish(&tone(440.0, 128)));
        drop(held);
        assert!(handoff.try_publish(&tone(440.0, 128)));
    }

    #[test]
    fn fetch_keeps_stale_copy_when_claimed() {
        let handoff = SpectrumHandoff::new();
        assert!(handoff.try_publish(&tone(440.0, 128)));

        let mut copy = SpectrumSnapshot::default();
        let held = handoff.try_claim().unwrap();
        assert!(!handoff.try_fetch(&mut copy));
        assert!(copy.is_silent());
        drop(held);

        assert!(handoff.try_fetch(&mut copy));
        assert!(!copy.is_silent());
    }
}
