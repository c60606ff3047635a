//! opnplay: play FM sequence files, or render them to WAV.
//!
//! Usage:
//!   opnplay path/to/song.ops
//!   opnplay path/to/song.ops --wav output.wav [--seconds N]
//!   opnplay path/to/song.ops --palette 3
//!   opnplay --demo demo.ops
//!
//! Set `RUST_LOG=info` to log each load and its loop length.

mod terminal;

use std::io::Write;
use std::time::{Duration, Instant};
use std::{env, fs, process};

use op_audio::{AudioOutput, CpalOutput};
use op_formats::TrackWriter;
use op_player::{Display, Mixer, Player, PlayerConfig, SAMPLE_RATE};

use terminal::TerminalDisplay;

const DEFAULT_SECONDS: u64 = 120;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const COMMENT_SCROLL_INTERVAL: Duration = Duration::from_secs(3);

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    if let Some(path) = flag("--demo") {
        write_demo(&path);
        return;
    }

    let path = match args.get(1) {
        Some(p) if !p.starts_with("--") => p.clone(),
        _ => {
            eprintln!("Usage: opnplay <file> [--wav output.wav] [--seconds N] [--palette N]");
            eprintln!("       opnplay --demo output.ops");
            process::exit(1);
        }
    };
    let seconds = parse_or_exit(flag("--seconds"), DEFAULT_SECONDS);
    let palette = parse_or_exit(flag("--palette"), 0i32);

    let data = fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        process::exit(1);
    });

    let display = TerminalDisplay::new(std::io::stdout());
    let (mut player, mixer) =
        Player::new(display, PlayerConfig::default()).unwrap_or_else(|e| {
            eprintln!("Failed to initialize: {}", e);
            process::exit(1);
        });

    let name = path.rsplit(['/', '\\']).next().unwrap_or(&path);
    player.load_bytes(name, &data).unwrap_or_else(|e| {
        eprintln!("Failed to load {}: {}", path, e);
        process::exit(1);
    });
    player.set_palette(palette);

    match flag("--wav") {
        Some(wav) => render_to_wav(mixer, &wav, seconds),
        None => play_audio(&mut player, mixer, seconds),
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(v) => v.parse().unwrap_or_else(|_| {
            eprintln!("Invalid number: {}", v);
            process::exit(1);
        }),
    }
}

fn play_audio<D: Display>(player: &mut Player<D>, mixer: Mixer, seconds: u64) {
    let mut output = CpalOutput::new().unwrap_or_else(|e| {
        eprintln!("Failed to open audio: {}", e);
        process::exit(1);
    });
    output.build_stream(mixer).unwrap_or_else(|e| {
        eprintln!("Failed to start audio: {}", e);
        process::exit(1);
    });

    let start = Instant::now();
    let mut last_scroll = start;
    let limit = Duration::from_secs(seconds);
    while start.elapsed() < limit && !player.audio().acquire().work().is_finished() {
        if let Err(e) = player.render() {
            log::warn!("render failed: {}", e);
        }
        if last_scroll.elapsed() >= COMMENT_SCROLL_INTERVAL {
            player.scroll_comment(true);
            last_scroll = Instant::now();
        }
        std::thread::sleep(FRAME_INTERVAL);
    }

    stop_output(&mut output);
    println!();
    println!("Done.");
}

/// Stop playback, logging a failure instead of aborting. Returns whether it stopped cleanly.
fn stop_output<O: AudioOutput>(output: &mut O) -> bool {
    match output.stop() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("audio stop failed: {}", e);
            false
        }
    }
}

fn render_to_wav(mut mixer: Mixer, path: &str, seconds: u64) {
    println!("Rendering to {} at {} Hz...", path, SAMPLE_RATE);

    let mut samples = Vec::new();
    for _ in 0..seconds {
        samples.extend(mixer.render_interleaved(SAMPLE_RATE as usize));
        if mixer.is_finished() {
            break;
        }
    }

    let mut file = fs::File::create(path).unwrap_or_else(|e| {
        eprintln!("Failed to create {}: {}", path, e);
        process::exit(1);
    });
    if let Err(e) = op_formats::write_wav(&mut file, &samples, SAMPLE_RATE).and_then(|_| file.flush()) {
        eprintln!("Failed to write {}: {}", path, e);
        process::exit(1);
    }

    println!("Rendered {} frames", samples.len() / 2);
    println!("Done.");
}

/// Two looping parts: a melody over a bass line.
fn demo_track() -> Vec<u8> {
    TrackWriter::new()
        .timer_b(200)
        .comment("opnplay demo\nmelody over bass")
        .part(&[
            0xF1, 0x08, 0xF4, 0x01, 0xFE, 0x30, 12, 0x34, 12, 0x37, 12, 0x3C, 12, 0x37, 12, 0x34, 12,
            0xFF,
        ])
        .part(&[
            0xF1, 0x0C, 0xF2, 0x02, 0xF4, 0x02, 0xFE, 0x18, 24, 0x1D, 24, 0x1F, 24, 0xFF,
        ])
        .build()
}

fn write_demo(path: &str) {
    fs::write(path, demo_track()).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        process::exit(1);
    });
    println!("Wrote demo track to {}", path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_audio::AudioError;

    struct StuckOutput;

    impl AudioOutput for StuckOutput {
        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }
        fn start(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
        fn stop(&mut self) -> Result<(), AudioError> {
            Err(AudioError::NoDevice)
        }
    }

    #[test]
    fn failed_stop_is_reported_not_fatal() {
        assert!(!stop_output(&mut StuckOutput));
    }

    #[test]
    fn demo_track_loads_and_loops() {
        let (mut player, _mixer) = Player::new(op_player::NullDisplay, PlayerConfig::default()).unwrap();
        player.load_bytes("demo.ops", &demo_track()).unwrap();
        assert!(player.loop_length().ticks().is_some());
    }
}
