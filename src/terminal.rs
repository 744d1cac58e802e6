// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the capture screen's preview layer with Unicode half-block
//! characters (two pixels per cell), with the zoom gauge, capture button and
//! a status bar drawn on top. A finished capture switches to the preview
//! screen.
//!
//! Keys on the capture screen: space/`p` capture, `f`/`s` flip camera,
//! `+`/`-` or the mouse wheel zoom, `q`/Ctrl+C quit. On the preview screen:
//! `s` save, Esc/`q` back.

use crate::app::{
    CaptureButton, CaptureScreen, LayerFrame, Message, PinchEvent, PreviewScreen, VideoGravity,
    VideoOrientation, preview,
};
use crate::constants::{timing, ui, zoom};
use crate::storage;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Gauge, Widget},
};
use std::io::{self, stdout};
use tracing::{error, info};

/// Run the terminal front end on a loaded capture screen
pub fn run(screen: CaptureScreen) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, screen);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

/// Which screen is showing
enum View {
    Capture,
    Preview(PreviewScreen),
}

/// Outcome of a key press
enum Action {
    Continue,
    Quit,
}

struct TerminalApp {
    screen: CaptureScreen,
    view: View,
    status_message: String,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: CaptureScreen,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TerminalApp {
        screen,
        view: View::Capture,
        status_message: capture_help(),
    };

    loop {
        app.tick();

        terminal.draw(|f| app.draw(f.area(), f.buffer_mut()))?;

        if !event::poll(timing::UI_TICK)? {
            continue;
        }
        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
            Event::Mouse(mouse) => {
                if let View::Capture = app.view {
                    match mouse.kind {
                        MouseEventKind::ScrollUp => app.pinch(zoom::PINCH_STEP),
                        MouseEventKind::ScrollDown => app.pinch(1.0 / zoom::PINCH_STEP),
                        _ => {}
                    }
                }
                Action::Continue
            }
            _ => Action::Continue,
        };
        if let Action::Quit = action {
            break;
        }
    }

    Ok(())
}

impl TerminalApp {
    /// Advance the capture screen and follow any navigation it requests
    fn tick(&mut self) {
        let View::Capture = self.view else {
            return;
        };

        let was_pending = self.screen.is_capture_pending();
        if let Some(navigation) = self.screen.update(Message::Tick) {
            info!(identifier = navigation.identifier(), "Navigating");
            self.view = View::Preview(PreviewScreen::from_navigation(navigation));
            self.status_message = preview_help();
        } else if was_pending && !self.screen.is_capture_pending() {
            // Capture ended without an image
            self.status_message = capture_help();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        // Ctrl+C to quit
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        let View::Preview(preview_screen) = &mut self.view else {
            return self.handle_capture_key(key);
        };

        match key.code {
            KeyCode::Char('s') => {
                let config = self.screen.config();
                let dir = config
                    .photo_dir
                    .clone()
                    .unwrap_or_else(storage::photo_directory);
                match preview_screen.save(&dir, config.photo_codec, config.photo_quality) {
                    Ok(path) => self.status_message = format!("Saved: {}", path.display()),
                    Err(e) => {
                        error!(error = %e, "Failed to save photo");
                        self.status_message = format!("Error: {}", e);
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.view = View::Capture;
                self.status_message = capture_help();
            }
            _ => {}
        }
        Action::Continue
    }

    fn handle_capture_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                self.screen.update(Message::CapturePressed);
                if self.screen.is_capture_pending() {
                    self.status_message = "Capturing...".to_string();
                }
            }
            KeyCode::Char('f') | KeyCode::Char('s') => {
                self.screen.update(Message::FlipPressed);
                self.status_message = capture_help();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.pinch(zoom::PINCH_STEP),
            KeyCode::Char('-') => self.pinch(1.0 / zoom::PINCH_STEP),
            KeyCode::Char('q') => return Action::Quit,
            _ => {}
        }
        Action::Continue
    }

    /// One discrete pinch step: began, changed by `scale`, ended
    fn pinch(&mut self, scale: f64) {
        self.screen.update(Message::Pinch(PinchEvent::began()));
        self.screen.update(Message::Pinch(PinchEvent::changed(scale)));
        self.screen.update(Message::Pinch(PinchEvent::ended(scale)));
    }

    fn draw(&mut self, area: Rect, buf: &mut Buffer) {
        let status_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(ui::STATUS_BAR_HEIGHT),
            width: area.width,
            height: ui::STATUS_BAR_HEIGHT.min(area.height),
        };

        match &self.view {
            View::Capture => draw_capture(&mut self.screen, area, status_area, buf),
            View::Preview(preview_screen) => {
                let image_area = Rect {
                    height: area.height.saturating_sub(ui::STATUS_BAR_HEIGHT),
                    ..area
                };
                draw_preview(preview_screen, image_area, buf);
            }
        }

        StatusBar {
            message: &self.status_message,
        }
        .render(status_area, buf);
    }
}

fn draw_capture(screen: &mut CaptureScreen, area: Rect, status_area: Rect, buf: &mut Buffer) {
    // The preview fills the whole screen beneath the chrome
    if let Some(layer) = screen.preview_layer_mut() {
        layer.set_frame(half_block_bounds(area));
    }
    if let Some(layer) = screen.preview_layer() {
        HalfBlockWidget {
            sampler: &|pixel: (u32, u32)| layer.sample(pixel),
            placeholder: "Waiting for camera...",
        }
        .render(area, buf);
    }

    let gauge_area = Rect {
        y: status_area.y.saturating_sub(ui::ZOOM_GAUGE_HEIGHT),
        height: ui::ZOOM_GAUGE_HEIGHT.min(area.height),
        ..status_area
    };
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Yellow).bg(Color::Black))
        .ratio(f64::from(screen.zoom_progress()).clamp(0.0, 1.0))
        .label(format!("{:.1}x", screen.zoom_factor()))
        .render(gauge_area, buf);

    if let Some(style) = screen.capture_button_style() {
        let (width, height) = ui::CAPTURE_BUTTON_CELLS;
        let button_area = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: gauge_area.y.saturating_sub(height),
            width: width.min(area.width),
            height: height.min(gauge_area.y.saturating_sub(area.y)),
        };
        CaptureButton {
            style,
            capturing: screen.is_capture_pending(),
        }
        .render(button_area, buf);
    }
}

/// Captured photo, letterboxed to fit
fn draw_preview(preview_screen: &PreviewScreen, area: Rect, buf: &mut Buffer) {
    let bounds = half_block_bounds(area);
    let rgb = preview_screen.rgb();
    HalfBlockWidget {
        sampler: &|pixel: (u32, u32)| {
            preview::sample(
                rgb,
                VideoGravity::ResizeAspect,
                VideoOrientation::Portrait,
                bounds,
                pixel,
            )
        },
        placeholder: "",
    }
    .render(area, buf);
}

fn capture_help() -> String {
    "space: capture | f: flip | +/-/wheel: zoom | q: quit".to_string()
}

fn preview_help() -> String {
    "s: save | Esc: back | Ctrl+C: quit".to_string()
}

/// Layer bounds in pixels for a cell area drawn with half blocks
fn half_block_bounds(area: Rect) -> LayerFrame {
    LayerFrame {
        width: u32::from(area.width),
        height: u32::from(area.height) * 2,
    }
}

/// Widget drawing sampled pixels with half-block characters
///
/// Each terminal cell displays 2 vertical pixels:
/// - Upper half (▀) colored with fg
/// - Lower half colored with bg
struct HalfBlockWidget<'a> {
    sampler: &'a dyn Fn((u32, u32)) -> Option<(u8, u8, u8)>,
    placeholder: &'a str,
}

impl Widget for HalfBlockWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut drawn = false;

        for ty in 0..area.height {
            for tx in 0..area.width {
                let top = (self.sampler)((u32::from(tx), u32::from(ty) * 2));
                let bottom = (self.sampler)((u32::from(tx), u32::from(ty) * 2 + 1));
                if top.is_none() && bottom.is_none() {
                    continue;
                }
                drawn = true;

                let to_color = |rgb: Option<(u8, u8, u8)>| {
                    rgb.map(|(r, g, b)| Color::Rgb(r, g, b))
                        .unwrap_or(Color::Black)
                };
                if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(to_color(top));
                    cell.set_bg(to_color(bottom));
                }
            }
        }

        if !drawn && !self.placeholder.is_empty() {
            let msg = self.placeholder;
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
        }
    }
}

/// Widget for the status bar
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{SyntheticBackend, SyntheticOptions};
    use crate::config::Config;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn app(options: SyntheticOptions) -> TerminalApp {
        let mut screen = CaptureScreen::new(Arc::new(SyntheticBackend::new(options)), Config::default());
        screen.load();
        TerminalApp {
            screen,
            view: View::Capture,
            status_message: capture_help(),
        }
    }

    fn press(app: &mut TerminalApp, c: char) -> Action {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    /// Tick until the capture settles or the timeout passes
    fn tick_until_settled(app: &mut TerminalApp) {
        let start = Instant::now();
        while app.screen.is_capture_pending() && start.elapsed() < Duration::from_secs(2) {
            std::thread::sleep(Duration::from_millis(10));
            app.tick();
        }
        app.tick();
    }

    #[test]
    fn test_empty_capture_restores_help() {
        let mut app = app(SyntheticOptions {
            empty_captures: true,
            capture_delay: Duration::from_millis(50),
            ..SyntheticOptions::default()
        });

        press(&mut app, ' ');
        assert_eq!(app.status_message, "Capturing...");

        tick_until_settled(&mut app);
        assert!(matches!(app.view, View::Capture));
        assert_eq!(app.status_message, capture_help());
    }

    #[test]
    fn test_capture_switches_to_preview() {
        let mut app = app(SyntheticOptions {
            capture_delay: Duration::from_millis(50),
            ..SyntheticOptions::default()
        });

        press(&mut app, ' ');
        tick_until_settled(&mut app);

        assert!(matches!(app.view, View::Preview(_)));
        assert_eq!(app.status_message, preview_help());

        assert!(matches!(press(&mut app, 'q'), Action::Continue));
        assert!(matches!(app.view, View::Capture));
        assert!(matches!(press(&mut app, 'q'), Action::Quit));
    }
}
