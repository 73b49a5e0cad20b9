//! Full-screen terminal preview for live camera frames.
//!
//! Frames are drawn with upper-half-block characters: each terminal cell shows
//! two vertically stacked pixels, the top one as foreground and the bottom one
//! as background. The image is scaled with nearest-neighbour sampling to fit
//! the screen above a one-line footer.

use crate::backend::Frame;
use crate::capture::FrameDisplay;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::Paragraph};
use std::io::{self, Stdout};
use std::time::Duration;

const FOOTER_HEIGHT: u16 = 1;

/// Live preview in the alternate screen. Quit with `q`, Esc or Ctrl+C.
pub struct TerminalViewer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    frames_shown: u64,
}

impl TerminalViewer {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(TerminalViewer {
            terminal,
            frames_shown: 0,
        })
    }

    /// Restores the terminal. Safe to call more than once.
    pub fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl FrameDisplay for TerminalViewer {
    fn show(&mut self, image: &Frame, camera_id: u32) -> io::Result<()> {
        self.frames_shown += 1;
        let frames_shown = self.frames_shown;

        self.terminal.draw(|frame| {
            let area = frame.area();
            let picture_area = Rect {
                height: area.height.saturating_sub(FOOTER_HEIGHT),
                ..area
            };
            draw_picture(frame.buffer_mut(), picture_area, image);

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(FOOTER_HEIGHT),
                width: area.width,
                height: FOOTER_HEIGHT.min(area.height),
            };
            let footer = Paragraph::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Red)),
                Span::raw(format!(
                    "Camera {camera_id}  {}x{}  frame {frames_shown}",
                    image.width, image.height
                )),
                Span::styled("   q / Esc to quit", Style::default().fg(Color::DarkGray)),
            ]))
            .style(
                Style::default()
                    .fg(Color::Rgb(185, 207, 212))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    fn cancelled(&mut self) -> io::Result<bool> {
        while event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    _ => {}
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalViewer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Size of the picture in (cells wide, pixel rows tall) when fitting a
/// `width`x`height` image into `cols`x`rows` cells, keeping its aspect ratio.
fn fit(width: u32, height: u32, cols: u16, rows: u16) -> (u16, u16) {
    if width == 0 || height == 0 || cols == 0 || rows == 0 {
        return (0, 0);
    }
    let max_w = f64::from(cols);
    let max_h = f64::from(rows) * 2.0;
    let scale = (max_w / f64::from(width)).min(max_h / f64::from(height));

    let out_w = (f64::from(width) * scale).floor().max(1.0) as u16;
    let out_h = (f64::from(height) * scale).floor().max(1.0) as u16;
    (out_w.min(cols), out_h.min(rows * 2))
}

fn draw_picture(buf: &mut Buffer, area: Rect, image: &Frame) {
    let (out_w, out_h) = fit(image.width, image.height, area.width, area.height);
    if out_w == 0 {
        return;
    }

    let offset_x = area.x + (area.width - out_w) / 2;
    let offset_y = area.y + (area.height - out_h.div_ceil(2)) / 2;

    let sample = |px: u16, py: u16| -> Color {
        let x = u32::from(px) * image.width / u32::from(out_w);
        let y = u32::from(py) * image.height / u32::from(out_h);
        let [r, g, b] = image.rgb_at(x, y);
        Color::Rgb(r, g, b)
    };

    for row in 0..out_h.div_ceil(2) {
        for col in 0..out_w {
            let top = sample(col, row * 2);
            let bottom = if row * 2 + 1 < out_h {
                sample(col, row * 2 + 1)
            } else {
                Color::Reset
            };
            buf.set_string(
                offset_x + col,
                offset_y + row,
                "▀",
                Style::default().fg(top).bg(bottom),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PixelOrder;

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        // 640x480 into 80x24 cells: height-bound at 48 pixel rows
        assert_eq!(fit(640, 480, 80, 24), (64, 48));
        // Wide image is width-bound
        assert_eq!(fit(1280, 360, 40, 24), (40, 11));
        assert_eq!(fit(0, 480, 80, 24), (0, 0));
        assert_eq!(fit(640, 480, 80, 0), (0, 0));
    }

    #[test]
    fn test_draw_uses_top_and_bottom_pixels() {
        let image = Frame {
            width: 1,
            height: 2,
            order: PixelOrder::Bgr,
            data: vec![0, 0, 255, 255, 0, 0],
        };
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);

        draw_picture(&mut buf, area, &image);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }
}
