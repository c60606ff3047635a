//! Note to fnum/block conversion.

/// F-numbers for C through B at the native output rate.
const FNUM_TABLE: [u16; 12] = [
    0x26A, 0x28F, 0x2B6, 0x2DF, 0x30B, 0x339, 0x36A, 0x39E, 0x3D5, 0x40E, 0x44C, 0x48D,
];

/// Convert a note number to `(block, fnum)`.
///
/// Note 48 (octave 4, C) is middle C, ~261.6 Hz.
pub fn note_to_fnum(note: u8) -> (u8, u16) {
    let octave = (note / 12).min(7);
    (octave, FNUM_TABLE[(note % 12) as usize])
}

/// Pack block and fnum into the value for the high frequency register.
pub(crate) fn fnum_high(block: u8, fnum: u16) -> u8 {
    (block << 3) | ((fnum >> 8) as u8 & 0x07)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octaves_share_fnum() {
        assert_eq!(note_to_fnum(0), (0, 0x26A));
        assert_eq!(note_to_fnum(48), (4, 0x26A));
        assert_eq!(note_to_fnum(59), (4, 0x48D));
    }

    #[test]
    fn packs_high_register() {
        assert_eq!(fnum_high(4, 0x26A), 0x22);
        assert_eq!(fnum_high(7, 0x48D), 0x3C);
    }
}
