//! Driver entry points: initialization and the timer interrupt.

use op_chip::{reg, status, timer_ctl};
use op_ir::{decode, Board, Command, Pan, TrackView, MAX_COMMANDS_PER_TICK};

use crate::backend::HardwareBackend;
use crate::frequency::{fnum_high, note_to_fnum};
use crate::work::{DriverWork, PartState};

/// Keep timer B counting with its flag enabled.
const TIMER_B_RUN: u8 = timer_ctl::LOAD_B | timer_ctl::ENABLE_B;

const DEFAULT_TOTAL_LEVEL: u8 = 0x10;
const DEFAULT_DEPTH: u8 = 3;

/// Prepare `work` to play `track`.
///
/// Progress fields are reset; the loop length and PCM error flags are
/// left as the caller set them.
pub fn init<B: HardwareBackend>(work: &mut DriverWork, track: TrackView<'_>, hw: &mut B) {
    work.parts.clear();
    work.loop_count = 0;
    work.timerb_ticks = 0;
    work.timer_b = track.timer_b();

    let board = Board::from_byte(track.lookback()).unwrap_or(Board::Opn);
    for (i, &offset) in track.parts().iter().take(board.max_parts()).enumerate() {
        let ch = i as u16;
        hw.write(reg::MULTIPLIER + ch, 1);
        hw.write(reg::TOTAL_LEVEL + ch, DEFAULT_TOTAL_LEVEL);
        hw.write(reg::DEPTH + ch, DEFAULT_DEPTH);
        hw.write(reg::PAN + ch, Pan::Center.register_bits());
        work.parts.push(PartState::new(i as u8, offset as usize));
    }

    hw.write(reg::TIMER_B, work.timer_b);
    hw.write(reg::TIMER_CONTROL, TIMER_B_RUN | timer_ctl::RESET_B);
    work.initialized = true;
}

/// Run one timer interrupt.
///
/// Returns `false` without touching any state when timer B has not
/// expired; otherwise advances every part by one tick.
pub fn interrupt<B: HardwareBackend>(work: &mut DriverWork, track: TrackView<'_>, hw: &mut B) -> bool {
    if !work.initialized {
        return false;
    }
    if hw.status(work.loop_count) & status::TIMER_B == 0 {
        return false;
    }
    hw.write(reg::TIMER_CONTROL, TIMER_B_RUN | timer_ctl::RESET_B);
    work.timerb_ticks = work.timerb_ticks.wrapping_add(1);

    let body = track.body();
    for part in &mut work.parts {
        step_part(part, body, hw, &mut work.timer_b);
    }
    work.update_loop_count();
    true
}

/// Key register value addressing a channel: slots 0-2, bit 2 for the upper three.
fn key_slot(channel: u8) -> u8 {
    (channel % 3) | if channel >= 3 { 0x04 } else { 0 }
}

fn step_part<B: HardwareBackend>(part: &mut PartState, body: &[u8], hw: &mut B, timer_b: &mut u8) {
    if part.finished {
        return;
    }
    if part.remaining > 1 {
        part.remaining -= 1;
        return;
    }
    if part.note.take().is_some() {
        hw.write(reg::KEY_ON, key_slot(part.channel));
    }

    let ch = part.channel as u16;
    for _ in 0..MAX_COMMANDS_PER_TICK {
        let Ok((command, next)) = decode(body, part.offset) else {
            part.finished = true;
            return;
        };
        part.offset = next;

        match command {
            Command::Note { note, len } => {
                let (block, fnum) = note_to_fnum(note);
                hw.write(reg::FNUM_HIGH + ch, fnum_high(block, fnum));
                hw.write(reg::FNUM_LOW + ch, fnum as u8);
                hw.write(reg::KEY_ON, 0xF0 | key_slot(part.channel));
                part.note = Some(note);
                part.remaining = len as u16;
                return;
            }
            Command::Rest { len } => {
                part.remaining = len as u16;
                return;
            }
            Command::Tempo(tb) => {
                *timer_b = tb;
                hw.write(reg::TIMER_B, tb);
            }
            Command::Volume(tl) => hw.write(reg::TOTAL_LEVEL + ch, tl),
            Command::Multiplier(m) => hw.write(reg::MULTIPLIER + ch, m),
            Command::Depth(d) => hw.write(reg::DEPTH + ch, d),
            Command::Pan(pan) => {
                let current = hw.read(reg::PAN + ch);
                hw.write(reg::PAN + ch, (current & 0x3F) | pan.register_bits());
            }
            Command::LoopPoint => part.loop_offset = Some(part.offset),
            Command::End => match part.loop_offset {
                Some(offset) => {
                    part.offset = offset;
                    part.looped = true;
                }
                None => {
                    part.finished = true;
                    return;
                }
            },
        }
    }

    // Loop bodies without a timed command end the part.
    part.finished = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use op_formats::{load_track, TrackWriter};
    use op_ir::ParsedTrack;

    /// Backend that always reports timer B and records writes.
    #[derive(Default)]
    struct Recorder {
        writes: Vec<(u16, u8)>,
    }

    impl HardwareBackend for Recorder {
        fn write(&mut self, addr: u16, value: u8) {
            self.writes.push((addr, value));
        }
        fn read(&mut self, _addr: u16) -> u8 {
            0
        }
        fn status(&mut self, _loop_count: u32) -> u8 {
            status::TIMER_B
        }
    }

    fn track(parts: &[&[u8]]) -> ParsedTrack {
        let mut writer = TrackWriter::new().timer_b(200);
        for part in parts {
            writer = writer.part(part);
        }
        load_track(&writer.build()).unwrap()
    }

    fn key_ons(rec: &Recorder) -> usize {
        rec.writes
            .iter()
            .filter(|&&(a, v)| a == reg::KEY_ON && v & 0xF0 != 0)
            .count()
    }

    #[test]
    fn init_programs_timer_b() {
        let track = track(&[&[0x30, 4, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);
        assert!(rec.writes.contains(&(reg::TIMER_B, 200)));
        assert!(work.is_initialized());
        assert_eq!(work.parts().len(), 1);
    }

    #[test]
    fn note_holds_for_its_length() {
        let track = track(&[&[0x30, 3, 0x32, 1, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);

        interrupt(&mut work, track.view(), &mut rec);
        assert_eq!(key_ons(&rec), 1);
        interrupt(&mut work, track.view(), &mut rec);
        interrupt(&mut work, track.view(), &mut rec);
        assert_eq!(key_ons(&rec), 1);
        interrupt(&mut work, track.view(), &mut rec);
        assert_eq!(key_ons(&rec), 2);
        assert_eq!(work.parts()[0].note(), Some(0x32));
        assert_eq!(work.timerb_ticks(), 4);
    }

    #[test]
    fn part_without_loop_finishes() {
        let track = track(&[&[0x30, 1, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);
        interrupt(&mut work, track.view(), &mut rec);
        interrupt(&mut work, track.view(), &mut rec);
        assert!(work.is_finished());
        assert_eq!(work.loop_count(), 0);
    }

    #[test]
    fn loop_point_counts_loops() {
        // intro 2 ticks, loop body 3 ticks
        let track = track(&[&[0x30, 2, 0xFE, 0x32, 3, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);

        let mut ticks = 0;
        while work.loop_count() == 0 {
            interrupt(&mut work, track.view(), &mut rec);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(ticks, 6);
        for _ in 0..3 {
            interrupt(&mut work, track.view(), &mut rec);
        }
        assert_eq!(work.loop_count(), 2);
    }

    #[test]
    fn pan_keeps_low_register_bits() {
        let track = track(&[&[0xF4, 1, 0x30, 1, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);
        interrupt(&mut work, track.view(), &mut rec);
        assert!(rec.writes.contains(&(reg::PAN, 0x80)));
    }

    #[test]
    fn tempo_command_updates_timer() {
        let track = track(&[&[0xF0, 180, 0x30, 1, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);
        interrupt(&mut work, track.view(), &mut rec);
        assert_eq!(work.timer_b(), 180);
        assert!(rec.writes.contains(&(reg::TIMER_B, 180)));
    }

    #[test]
    fn uninitialized_work_ignores_interrupts() {
        let track = track(&[&[0x30, 1, 0xFF]]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        assert!(!interrupt(&mut work, track.view(), &mut rec));
        assert!(rec.writes.is_empty());
    }

    #[test]
    fn longest_accepted_run_reaches_its_note() {
        let mut stream = [0xF1, 10].repeat(MAX_COMMANDS_PER_TICK - 1);
        stream.extend_from_slice(&[0x30, 4, 0xFF]);
        let track = track(&[&stream]);
        let mut work = DriverWork::new();
        let mut rec = Recorder::default();
        init(&mut work, track.view(), &mut rec);
        interrupt(&mut work, track.view(), &mut rec);
        assert_eq!(key_ons(&rec), 1);
        assert!(!work.is_finished());
    }

    #[test]
    fn key_slots() {
        assert_eq!(key_slot(0), 0);
        assert_eq!(key_slot(2), 2);
        assert_eq!(key_slot(3), 4);
        assert_eq!(key_slot(5), 6);
    }
}
