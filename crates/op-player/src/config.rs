use op_driver::DEFAULT_TICK_CEILING;

/// Player settings, fixed for the lifetime of a [`crate::Player`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Loops the simulator measures on load. Outside `1..=255` the loop
    /// length is reported as unknown.
    pub loop_target: u32,
    /// Simulated ticks after which a track is declared never to loop.
    pub tick_ceiling: u32,
    /// Number of display palettes; `set_palette` clamps into this range.
    pub palette_count: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            loop_target: 1,
            tick_ceiling: DEFAULT_TICK_CEILING,
            palette_count: 10,
        }
    }
}
