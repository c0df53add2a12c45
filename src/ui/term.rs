//! Terminal output facade using crossterm.
//!
//! [`Term`] is the character-stream surface the controller writes to:
//! `write`/`writeln` plus a typed list of capabilities (resize-fit, OSC 8
//! hyperlink detection). It is generic over the underlying writer so tests
//! capture output into a `Vec<u8>` while the binary drives raw-mode stdout.
//!
//! [`Screen`] owns the raw-mode/alternate-screen lifecycle and the theme
//! colors, restoring the console on cleanup.

use std::io::{self, Write};

use crossterm::{
    cursor::{MoveTo, SetCursorStyle, Show},
    execute,
    style::{Colors, ResetColor, SetColors},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::config::Color;

/// Optional display capabilities, registered at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Track terminal resize events and refit the display area
    ResizeFit,
    /// Wrap URLs in whole-line writes with OSC 8 hyperlink escapes
    Hyperlinks,
}

/// Character-stream output surface.
pub struct Term<W: Write> {
    out: W,
    capabilities: Vec<Capability>,
    cols: u16,
    rows: u16,
}

impl<W: Write> Term<W> {
    pub fn new(out: W, capabilities: Vec<Capability>, cols: u16, rows: u16) -> Self {
        Self {
            out,
            capabilities,
            cols,
            rows,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Write text as-is (plus hyperlink wrapping when enabled) and flush.
    /// Flushing per call matters: the animation emits single characters and
    /// each must reach the display within its frame.
    pub fn write(&mut self, text: &str) -> io::Result<()> {
        if self.has(Capability::Hyperlinks) {
            let linked = linkify(text);
            self.out.write_all(linked.as_bytes())?;
        } else {
            self.out.write_all(text.as_bytes())?;
        }
        self.out.flush()
    }

    /// Write a single character and flush. Never linkified: animated text
    /// arrives one char per frame, so there is no URL to detect.
    pub fn write_char(&mut self, c: char) -> io::Result<()> {
        let mut buf = [0u8; 4];
        self.out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        self.out.flush()
    }

    /// Write text followed by CRLF.
    pub fn writeln(&mut self, text: &str) -> io::Result<()> {
        if self.has(Capability::Hyperlinks) {
            let linked = linkify(text);
            self.out.write_all(linked.as_bytes())?;
        } else {
            self.out.write_all(text.as_bytes())?;
        }
        self.out.write_all(b"\r\n")?;
        self.out.flush()
    }

    /// Adopt a new display size. Gated on the resize-fit capability;
    /// returns whether the size was adopted.
    pub fn fit(&mut self, cols: u16, rows: u16) -> bool {
        if !self.has(Capability::ResizeFit) {
            return false;
        }
        self.cols = cols;
        self.rows = rows;
        true
    }

    #[allow(dead_code)]
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    #[cfg(test)]
    pub fn out(&self) -> &W {
        &self.out
    }
}

/// Wrap `http://`/`https://` runs in OSC 8 hyperlink escapes.
fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = url_start(rest) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| c.is_whitespace() || c.is_control())
            .unwrap_or(tail.len());
        let url = &tail[..end];
        out.push_str("\x1b]8;;");
        out.push_str(url);
        out.push_str("\x1b\\");
        out.push_str(url);
        out.push_str("\x1b]8;;\x1b\\");
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

fn url_start(s: &str) -> Option<usize> {
    let http = s.find("http://");
    let https = s.find("https://");
    match (http, https) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Raw-mode screen session. Init/cleanup pair around the interactive loop.
pub struct Screen {
    initialized: bool,
}

impl Screen {
    /// Current terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Enter raw mode and the alternate screen, apply theme colors.
    pub fn init(foreground: Color, background: Color, cursor_blink: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;

        // Guard exists before the escape writes: if any of them fail, the
        // drop path runs cleanup and raw mode is not left enabled.
        let screen = Self { initialized: true };
        Self::apply_theme(foreground, background, cursor_blink)?;
        Ok(screen)
    }

    fn apply_theme(foreground: Color, background: Color, cursor_blink: bool) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            SetColors(Colors::new(
                foreground.to_crossterm(),
                background.to_crossterm()
            )),
            Clear(ClearType::All),
            MoveTo(0, 0),
        )?;
        if cursor_blink {
            execute!(stdout, SetCursorStyle::BlinkingBlock)?;
        } else {
            execute!(stdout, SetCursorStyle::SteadyBlock)?;
        }
        stdout.flush()
    }

    /// Restore the console. Safe to call more than once.
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            ResetColor,
            SetCursorStyle::DefaultUserShape,
            Show,
            LeaveAlternateScreen
        )?;
        stdout.flush()?;
        terminal::disable_raw_mode()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
