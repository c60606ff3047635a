//! Process-wide lookup tables, built once on first use.

use spin::Once;

pub(crate) const SINE_BITS: u32 = 10;
pub(crate) const SINE_LEN: usize = 1 << SINE_BITS;

static SINE: Once<[i16; SINE_LEN]> = Once::new();
static LEVEL: Once<[u16; 128]> = Once::new();

/// Build the sine and level tables ahead of the first chip.
///
/// Optional: [`crate::Opn::new`] builds them on demand. Hosts call it
/// during startup so the first load does not pay for it.
pub fn init_tables() {
    sine();
    level();
}

/// One sine cycle, amplitude ±16383.
pub(crate) fn sine() -> &'static [i16; SINE_LEN] {
    SINE.call_once(|| {
        core::array::from_fn(|i| {
            let phase = 2.0 * core::f64::consts::PI * i as f64 / SINE_LEN as f64;
            libm::round(libm::sin(phase) * 16383.0) as i16
        })
    })
}

/// Total level (0.75 dB steps) to Q15 linear gain.
pub(crate) fn level() -> &'static [u16; 128] {
    LEVEL.call_once(|| {
        core::array::from_fn(|tl| libm::round(libm::pow(2.0, -(tl as f64) / 8.0) * 32767.0) as u16)
    })
}
