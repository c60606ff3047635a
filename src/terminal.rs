//! One-line terminal display: spectrum bars, position and comment text.

use std::io::Write;

use op_player::{Display, DisplayError, RenderFrame, TrackInfo};

const BARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// ANSI foreground colours, one per palette.
const PALETTE_COLOURS: [u8; 10] = [37, 36, 32, 33, 31, 35, 34, 96, 92, 93];

pub struct TerminalDisplay<W: Write> {
    out: W,
    comment_lines: Vec<String>,
    comment_line: usize,
    colour: u8,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            comment_lines: Vec::new(),
            comment_line: 0,
            colour: PALETTE_COLOURS[0],
        }
    }

    pub fn current_comment_line(&self) -> Option<&str> {
        self.comment_lines.get(self.comment_line).map(String::as_str)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.out.flush()?;
        Ok(())
    }

    fn update_file(&mut self, info: &TrackInfo<'_>) {
        self.comment_lines = info
            .comment
            .map(|c| c.lines().map(str::to_owned).collect())
            .unwrap_or_default();
        let _ = writeln!(self.out, "File:     {}", info.filename);
        let _ = writeln!(self.out, "Board:    {:?}, {} parts", info.board, info.parts);
        let _ = writeln!(self.out, "Timer B:  {}", info.timer_b);
        let _ = writeln!(self.out, "Loop:     {}", info.loop_length);
        for line in &self.comment_lines {
            let _ = writeln!(self.out, "  {}", line);
        }
    }

    fn comment_reset(&mut self) {
        self.comment_line = 0;
    }

    fn comment_scroll(&mut self, down: bool) {
        let last = self.comment_lines.len().saturating_sub(1);
        self.comment_line = if down {
            (self.comment_line + 1).min(last)
        } else {
            self.comment_line.saturating_sub(1)
        };
    }

    fn set_palette(&mut self, index: u8) {
        self.colour = PALETTE_COLOURS[index as usize % PALETTE_COLOURS.len()];
    }

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), DisplayError> {
        let bars: String = frame
            .spectrum
            .bands
            .iter()
            .map(|&b| BARS[b as usize * (BARS.len() - 1) / 255])
            .collect();
        let loop_ticks = match frame.loop_length.ticks() {
            Some(t) => format!("/{}", t),
            None => String::new(),
        };
        let comment = self.current_comment_line().unwrap_or("").to_owned();
        write!(
            self.out,
            "\r\x1b[{}m{}\x1b[0m tick {}{} loop {}{} {}\x1b[K",
            self.colour,
            bars,
            frame.position.ticks,
            loop_ticks,
            frame.position.loops,
            if frame.paused { " [paused]" } else { "" },
            comment,
        )?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_ir::{Board, LoopLength};
    use op_player::{PlaybackPosition, SpectrumSnapshot};

    fn info(comment: Option<&str>) -> TrackInfo<'_> {
        TrackInfo {
            filename: "song.ops",
            board: Board::Opna,
            parts: 2,
            timer_b: 200,
            comment,
            loop_length: LoopLength::Ticks(96),
        }
    }

    #[test]
    fn update_file_prints_summary() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.update_file(&info(Some("line one\nline two")));
        let text = String::from_utf8(display.into_inner()).unwrap();
        assert!(text.contains("song.ops"));
        assert!(text.contains("96 ticks"));
        assert!(text.contains("line two"));
    }

    #[test]
    fn comment_scroll_stays_in_range() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.update_file(&info(Some("a\nb")));
        display.comment_scroll(false);
        assert_eq!(display.current_comment_line(), Some("a"));
        display.comment_scroll(true);
        display.comment_scroll(true);
        assert_eq!(display.current_comment_line(), Some("b"));
        display.comment_reset();
        assert_eq!(display.current_comment_line(), Some("a"));
    }

    #[test]
    fn render_draws_bars() {
        let mut display = TerminalDisplay::new(Vec::new());
        let mut spectrum = SpectrumSnapshot::default();
        spectrum.bands[0] = 255;
        display
            .render(&RenderFrame {
                spectrum: &spectrum,
                paused: true,
                loop_length: LoopLength::Never,
                position: PlaybackPosition { ticks: 5, loops: 0 },
            })
            .unwrap();
        let text = String::from_utf8(display.into_inner()).unwrap();
        assert!(text.contains('█'));
        assert!(text.contains("tick 5 loop 0"));
        assert!(text.contains("[paused]"));
    }
}
