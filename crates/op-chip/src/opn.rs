//! The FM chip.

use alloc::boxed::Box;
use alloc::vec;

use crate::frame::Frame;
use crate::tables::{self, SINE_BITS, SINE_LEN};
use crate::timer::TimerState;
use crate::reg;

/// Number of FM channels.
pub const CHANNELS: usize = 6;

/// Size of the ADPCM sample memory in bytes.
pub const ADPCM_RAM_SIZE: usize = 256 * 1024;

/// Value returned when reading [`reg::ID`].
const CHIP_ID: u8 = 0x01;

/// Envelope level at key on (Q15).
const ENV_MAX: u16 = 32767;

/// ADPCM sample memory. Lives beside the chip rather than inside it so
/// that a chip reset leaves sample data alone.
pub struct AdpcmRam(Box<[u8]>);

impl AdpcmRam {
    pub fn new() -> Self {
        Self(vec![0; ADPCM_RAM_SIZE].into_boxed_slice())
    }

    pub fn clear(&mut self) {
        self.0.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl Default for AdpcmRam {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Channel {
    fnum: u16,
    block: u8,
    multiplier: u8,
    total_level: u8,
    depth: u8,
    pan: u8,
    key: bool,
    carrier_phase: u32,
    modulator_phase: u32,
    /// Current envelope level (Q15)
    env: u16,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            fnum: 0,
            block: 0,
            multiplier: 1,
            total_level: 127,
            depth: 0,
            pan: 0xC0,
            key: false,
            carrier_phase: 0,
            modulator_phase: 0,
            env: 0,
        }
    }
}

impl Channel {
    fn key_on(&mut self) {
        self.key = true;
        self.env = ENV_MAX;
        self.carrier_phase = 0;
        self.modulator_phase = 0;
    }

    fn key_off(&mut self) {
        self.key = false;
    }

    /// Render one sample, returning (left, right) contributions.
    fn render(&mut self, sine: &[i16; SINE_LEN], level: &[u16; 128]) -> (i32, i32) {
        if self.env == 0 {
            return (0, 0);
        }

        // One full cycle is 2^32 phase units: inc = fnum * 2^block * 2^11.
        let increment = (self.fnum as u32) << (self.block as u32 + 11);
        let mod_increment = match self.multiplier {
            0 => increment / 2,
            m => increment.wrapping_mul(m as u32),
        };
        self.modulator_phase = self.modulator_phase.wrapping_add(mod_increment);
        self.carrier_phase = self.carrier_phase.wrapping_add(increment);

        let shift = 32 - SINE_BITS;
        let modulator = sine[(self.modulator_phase >> shift) as usize] as i64;
        let offset = if self.depth == 0 {
            0
        } else {
            (modulator << (self.depth as u32 + 11)) as u32
        };
        let carrier = sine[(self.carrier_phase.wrapping_add(offset) >> shift) as usize] as i32;

        let amplitude = (carrier * level[self.total_level as usize] as i32) >> 15;
        let out = (amplitude * self.env as i32) >> 17;

        if !self.key {
            self.env = self.env.saturating_sub((self.env >> 9).max(1));
        }

        let left = if self.pan & 0x80 != 0 { out } else { 0 };
        let right = if self.pan & 0x40 != 0 { out } else { 0 };
        (left, right)
    }
}

/// Two-operator FM chip with six channels and OPN-style timers.
pub struct Opn {
    regs: [u8; 0x100],
    channels: [Channel; CHANNELS],
    timer: TimerState,
    sine: &'static [i16; SINE_LEN],
    level: &'static [u16; 128],
}

impl Opn {
    /// Create a chip in its power-on state.
    pub fn new() -> Self {
        Self {
            regs: [0; 0x100],
            channels: Default::default(),
            timer: TimerState::new(),
            sine: tables::sine(),
            level: tables::level(),
        }
    }

    /// Return to the power-on state.
    pub fn reset(&mut self) {
        self.regs = [0; 0x100];
        self.channels = Default::default();
        self.timer = TimerState::new();
    }

    /// Write a register. Addresses outside the first bank are ignored.
    pub fn write(&mut self, addr: u16, value: u8) {
        if addr >= 0x100 {
            return;
        }
        self.regs[addr as usize] = value;

        match addr {
            reg::TIMER_A_HIGH..=reg::TIMER_CONTROL => self.timer.write(addr, value),
            reg::KEY_ON => {
                let slot = value & 0x03;
                if slot == 3 {
                    return;
                }
                let ch = slot as usize + if value & 0x04 != 0 { 3 } else { 0 };
                if value & 0xF0 != 0 {
                    self.channels[ch].key_on();
                } else {
                    self.channels[ch].key_off();
                }
            }
            _ => {
                if let Some((base, ch)) = channel_register(addr) {
                    let channel = &mut self.channels[ch];
                    match base {
                        reg::MULTIPLIER => channel.multiplier = value & 0x0F,
                        reg::TOTAL_LEVEL => channel.total_level = value & 0x7F,
                        reg::FNUM_LOW => {
                            channel.fnum = (channel.fnum & 0x700) | value as u16;
                        }
                        reg::FNUM_HIGH => {
                            channel.fnum = (channel.fnum & 0xFF) | ((value as u16 & 0x07) << 8);
                            channel.block = (value >> 3) & 0x07;
                        }
                        reg::DEPTH => channel.depth = value & 0x07,
                        reg::PAN => channel.pan = value & 0xC0,
                        _ => {}
                    }
                }
            }
        }
    }

    /// Read back a register. [`reg::ID`] reports the chip identifier.
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            reg::ID => CHIP_ID,
            a if a < 0x100 => self.regs[a as usize],
            _ => 0,
        }
    }

    /// Timer status flags.
    pub fn status(&self) -> u8 {
        self.timer.flags()
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    /// Whether a channel is keyed on.
    pub fn key(&self, ch: usize) -> bool {
        self.channels.get(ch).is_some_and(|c| c.key)
    }

    /// Produce one stereo frame.
    pub fn mix_frame(&mut self) -> Frame {
        let mut left = 0;
        let mut right = 0;
        for channel in &mut self.channels {
            let (l, r) = channel.render(self.sine, self.level);
            left += l;
            right += r;
        }
        Frame::from_i32(left, right)
    }

    /// Fill an interleaved stereo buffer, one frame per `[left, right]` pair.
    ///
    /// The timers advance once per frame; whenever one raises its flag,
    /// `on_timer` runs against the chip before that frame is rendered.
    pub fn mix<F: FnMut(&mut Opn)>(&mut self, out: &mut [i16], mut on_timer: F) {
        for pair in out.chunks_exact_mut(2) {
            if self.timer.step() {
                on_timer(self);
            }
            self.mix_frame().write_interleaved(pair);
        }
    }
}

impl Default for Opn {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a per-channel register address into (base, channel).
fn channel_register(addr: u16) -> Option<(u16, usize)> {
    const BASES: [u16; 6] = [
        reg::MULTIPLIER,
        reg::TOTAL_LEVEL,
        reg::FNUM_LOW,
        reg::FNUM_HIGH,
        reg::DEPTH,
        reg::PAN,
    ];
    BASES
        .iter()
        .find(|&&base| addr >= base && addr < base + CHANNELS as u16)
        .map(|&base| (base, (addr - base) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{status, timer_ctl};

    fn keyed_chip() -> Opn {
        let mut chip = Opn::new();
        chip.write(reg::TOTAL_LEVEL, 0);
        chip.write(reg::FNUM_HIGH, (4 << 3) | 0x02);
        chip.write(reg::FNUM_LOW, 0x6A);
        chip.write(reg::KEY_ON, 0xF0);
        chip
    }

    #[test]
    fn silent_at_power_on() {
        let mut chip = Opn::new();
        let mut buf = [1i16; 64];
        chip.mix(&mut buf, |_| {});
        assert!(buf.iter().all(|&s| s == 0));
    }

    #[test]
    fn keyed_channel_produces_sound() {
        let mut chip = keyed_chip();
        assert!(chip.key(0));
        let mut buf = [0i16; 256];
        chip.mix(&mut buf, |_| {});
        assert!(buf.iter().any(|&s| s != 0));
    }

    #[test]
    fn key_off_decays_to_silence() {
        let mut chip = keyed_chip();
        chip.write(reg::KEY_ON, 0x00);
        let mut buf = [0i16; 2 * 8192];
        chip.mix(&mut buf, |_| {});
        assert!(buf[buf.len() - 64..].iter().all(|&s| s == 0));
    }

    #[test]
    fn key_register_maps_second_half() {
        let mut chip = Opn::new();
        chip.write(reg::KEY_ON, 0xF4);
        assert!(chip.key(3));
        chip.write(reg::KEY_ON, 0xF3);
        assert!(!chip.key(2));
    }

    #[test]
    fn pan_routes_output() {
        let mut chip = keyed_chip();
        chip.write(reg::PAN, 0x80);
        let mut buf = [0i16; 256];
        chip.mix(&mut buf, |_| {});
        assert!(buf.chunks(2).all(|p| p[1] == 0));
        assert!(buf.chunks(2).any(|p| p[0] != 0));
    }

    #[test]
    fn timer_b_invokes_handler() {
        let mut chip = Opn::new();
        chip.write(reg::TIMER_B, 255);
        chip.write(reg::TIMER_CONTROL, timer_ctl::LOAD_B | timer_ctl::ENABLE_B);
        let mut calls = 0;
        let mut buf = [0i16; 2 * 32];
        chip.mix(&mut buf, |c| {
            assert_eq!(c.status() & status::TIMER_B, status::TIMER_B);
            c.write(
                reg::TIMER_CONTROL,
                timer_ctl::LOAD_B | timer_ctl::ENABLE_B | timer_ctl::RESET_B,
            );
            calls += 1;
        });
        assert_eq!(calls, 4);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut chip = keyed_chip();
        chip.reset();
        assert!(!chip.key(0));
        assert_eq!(chip.read(reg::TOTAL_LEVEL), 0);
        assert_eq!(chip.read(reg::ID), CHIP_ID);
    }

    #[test]
    fn adpcm_ram_clears() {
        let mut ram = AdpcmRam::new();
        ram.as_mut_slice()[100] = 7;
        ram.clear();
        assert!(ram.as_slice().iter().all(|&b| b == 0));
        assert_eq!(ram.as_slice().len(), ADPCM_RAM_SIZE);
    }
}
