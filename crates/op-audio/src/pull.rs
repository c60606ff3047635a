//! Pulls mixer blocks and hands out frames at the device rate.

use op_player::{Mixer, MAX_SAMPLES, SAMPLE_RATE};

/// Wraps a [`Mixer`], refilling one block at a time and stepping through
/// it at `SAMPLE_RATE / device_rate` source frames per output frame.
pub struct BlockPuller {
    mixer: Mixer,
    block: [i16; MAX_SAMPLES * 2],
    /// Read position in source frames within `block`
    pos: f64,
    step: f64,
}

impl BlockPuller {
    pub fn new(mixer: Mixer, device_rate: u32) -> Self {
        Self {
            mixer,
            block: [0; MAX_SAMPLES * 2],
            // start exhausted so the first frame triggers a mix
            pos: MAX_SAMPLES as f64,
            step: SAMPLE_RATE as f64 / device_rate.max(1) as f64,
        }
    }

    /// Next stereo frame as `f32` in `[-1, 1]`.
    pub fn next_frame(&mut self) -> (f32, f32) {
        while self.pos >= MAX_SAMPLES as f64 {
            self.block.copy_from_slice(self.mixer.mix(MAX_SAMPLES));
            self.pos -= MAX_SAMPLES as f64;
        }
        let i = self.pos as usize * 2;
        self.pos += self.step;
        (to_f32(self.block[i]), to_f32(self.block[i + 1]))
    }

    /// Fill an interleaved device buffer with `channels` samples per frame.
    /// Channels past the second are zeroed.
    pub fn fill(&mut self, data: &mut [f32], channels: usize) {
        for chunk in data.chunks_mut(channels.max(1)) {
            let (left, right) = self.next_frame();
            for (i, sample) in chunk.iter_mut().enumerate() {
                *sample = match i {
                    0 => left,
                    1 => right,
                    _ => 0.0,
                };
            }
        }
    }
}

fn to_f32(sample: i16) -> f32 {
    sample as f32 / 32767.0
}
