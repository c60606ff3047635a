//! Timer A/B state.
//!
//! Both timers count output frames. Timer B reloads with
//! `(256 - TB) * 8` frames, timer A with `(1024 - NA) / 2`.

use crate::{reg, status, timer_ctl};

/// Output frames per timer-B count.
pub const TIMER_B_FRAMES_PER_STEP: u32 = 8;

#[derive(Clone, Debug, Default)]
pub struct TimerState {
    a_value: u16,
    b_value: u8,
    control: u8,
    flags: u8,
    /// Half-frames until timer A expires
    a_counter: u32,
    /// Frames until timer B expires
    b_counter: u32,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a write to one of the timer registers.
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            reg::TIMER_A_HIGH => self.a_value = (self.a_value & 0x03) | ((value as u16) << 2),
            reg::TIMER_A_LOW => self.a_value = (self.a_value & 0x3FC) | (value as u16 & 0x03),
            reg::TIMER_B => self.b_value = value,
            reg::TIMER_CONTROL => {
                if value & timer_ctl::LOAD_A != 0 && self.control & timer_ctl::LOAD_A == 0 {
                    self.a_counter = self.a_period();
                }
                if value & timer_ctl::LOAD_B != 0 && self.control & timer_ctl::LOAD_B == 0 {
                    self.b_counter = self.b_period();
                }
                if value & timer_ctl::RESET_A != 0 {
                    self.flags &= !status::TIMER_A;
                }
                if value & timer_ctl::RESET_B != 0 {
                    self.flags &= !status::TIMER_B;
                }
                self.control = value & 0x0F;
            }
            _ => {}
        }
    }

    /// Current status flags.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Timer-B reload value.
    pub fn b_value(&self) -> u8 {
        self.b_value
    }

    fn a_period(&self) -> u32 {
        1024 - self.a_value as u32
    }

    fn b_period(&self) -> u32 {
        (256 - self.b_value as u32) * TIMER_B_FRAMES_PER_STEP
    }

    /// Advance by one output frame. Returns true when a flag was raised.
    pub fn step(&mut self) -> bool {
        let mut raised = false;

        if self.control & timer_ctl::LOAD_A != 0 {
            self.a_counter = self.a_counter.saturating_sub(2);
            if self.a_counter == 0 {
                self.a_counter = self.a_period();
                if self.control & timer_ctl::ENABLE_A != 0 {
                    self.flags |= status::TIMER_A;
                    raised = true;
                }
            }
        }

        if self.control & timer_ctl::LOAD_B != 0 {
            self.b_counter = self.b_counter.saturating_sub(1);
            if self.b_counter == 0 {
                self.b_counter = self.b_period();
                if self.control & timer_ctl::ENABLE_B != 0 {
                    self.flags |= status::TIMER_B;
                    raised = true;
                }
            }
        }

        raised
    }
}
