// SPDX-License-Identifier: MPL-2.0

//! Capture button widget implementation

use crate::app::state::CaptureScreen;
use crate::constants::ui;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Paragraph, Widget};
use tracing::debug;

/// Cosmetic styling of the capture button
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureButtonStyle {
    pub border_color: (u8, u8, u8),
    pub border_width: u16,
    pub corner_radius: f32,
    pub clips_to_bounds: bool,
}

impl CaptureButtonStyle {
    /// White border, fully rounded for a button of the given size
    pub fn for_bounds(width: f32, height: f32) -> Self {
        Self {
            border_color: (255, 255, 255),
            border_width: ui::CAPTURE_BUTTON_BORDER_WIDTH,
            corner_radius: width.min(height) / 2.0,
            clips_to_bounds: true,
        }
    }
}

impl CaptureScreen {
    /// One-time cosmetic setup of the capture button
    pub fn style_capture_button(&mut self) {
        let (width, height) = ui::CAPTURE_BUTTON_CELLS;
        let style = CaptureButtonStyle::for_bounds(width as f32, height as f32);
        debug!(?style, "Styled capture button");
        self.capture_button_style = Some(style);
    }
}

/// Terminal rendering of the capture button
pub struct CaptureButton {
    pub style: CaptureButtonStyle,
    /// Grey out while a capture is pending
    pub capturing: bool,
}

impl Widget for CaptureButton {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (r, g, b) = if self.capturing {
            (128, 128, 128)
        } else {
            self.style.border_color
        };
        // Terminal cells cannot draw a 5px stroke; wide borders use the thick glyphs
        let border_type = if self.style.corner_radius > 0.0 {
            BorderType::Rounded
        } else if self.style.border_width > 1 {
            BorderType::Thick
        } else {
            BorderType::Plain
        };

        let block = Block::bordered()
            .border_type(border_type)
            .border_style(Style::default().fg(Color::Rgb(r, g, b)));
        let inner = block.inner(area);
        block.render(area, buf);

        let label = if self.capturing { "…" } else { "●" };
        let inner = if self.style.clips_to_bounds {
            inner.intersection(area)
        } else {
            inner
        };
        let y = inner.y + inner.height / 2;
        Paragraph::new(label)
            .centered()
            .style(Style::default().fg(Color::Rgb(r, g, b)))
            .render(Rect { y, height: 1.min(inner.height), ..inner }, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_button_style() {
        let style = CaptureButtonStyle::for_bounds(80.0, 60.0);
        assert_eq!(style.border_width, 5);
        assert_eq!(style.corner_radius, 30.0);
        assert_eq!(style.border_color, (255, 255, 255));
        assert!(style.clips_to_bounds);
    }
}
