//! Nothing is logged while the audio lock is held.
//!
//! Runs as its own test binary because it installs the global logger.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{Log, Metadata, Record};
use op_formats::TrackWriter;
use op_player::{AudioLock, Mixer, NullDisplay, Player, PlayerConfig};

static WATCHED: Mutex<Vec<&'static AudioLock>> = Mutex::new(Vec::new());
static TOTAL: AtomicUsize = AtomicUsize::new(0);
static UNDER_LOCK: AtomicUsize = AtomicUsize::new(0);

struct LockWatcher;

impl Log for LockWatcher {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, _record: &Record<'_>) {
        TOTAL.fetch_add(1, Ordering::SeqCst);
        let held = WATCHED
            .lock()
            .map(|locks| locks.iter().any(|lock| lock.is_locked()))
            .unwrap_or(false);
        if held {
            UNDER_LOCK.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

static LOGGER: LockWatcher = LockWatcher;

fn load_all(config: PlayerConfig) {
    let (mut player, mixer) = Player::new(NullDisplay, config).unwrap();
    let mixer: &'static Mixer = Box::leak(Box::new(mixer));
    WATCHED.lock().unwrap().push(mixer.audio());

    let good = TrackWriter::new()
        .part(&[0x30, 8, 0xFE, 0x34, 4, 0xFF])
        .build();
    let never = TrackWriter::new().part(&[0x30, 8, 0xFF]).build();
    player.load_bytes("good", &good).unwrap();
    player.load_bytes("never", &never).unwrap();
    assert!(player.load_bytes("bad", &[0xAA; 16]).is_err());
}

#[test]
fn load_logs_only_after_unlocking() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Trace);

    load_all(PlayerConfig::default());
    let before = TOTAL.load(Ordering::SeqCst);
    assert!(before > 0);

    // loop target out of range and a ceiling that always trips
    load_all(PlayerConfig {
        loop_target: 0,
        tick_ceiling: 1,
        ..PlayerConfig::default()
    });
    assert!(TOTAL.load(Ordering::SeqCst) > before);
    assert_eq!(UNDER_LOCK.load(Ordering::SeqCst), 0);
}
