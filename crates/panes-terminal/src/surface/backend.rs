//! Rendering backends a surface forwards its output to.

use std::io::Write;

use panes_config::TerminalTheme;

use crate::size::TermSize;

/// The widget that actually draws a surface.
///
/// Text arrives verbatim, control sequences included; interpreting them is
/// the backend's business.
pub trait RenderBackend: Send {
    /// Called once when the owning surface is constructed.
    fn attach(&mut self, _theme: &TerminalTheme, _size: TermSize) {}

    fn write(&mut self, text: &str);

    /// The visible grid changed.
    fn fit(&mut self, _size: TermSize) {}

    fn restyle(&mut self, _theme: &TerminalTheme) {}

    /// Release rendering resources. Called at most once.
    fn dispose(&mut self) {}
}

/// Draws nothing; the surface's own scrollback is the only record.
#[derive(Debug, Default)]
pub struct NullBackend;

impl RenderBackend for NullBackend {
    fn write(&mut self, _text: &str) {}
}

/// Streams output to any `io::Write` (stdout for the command-line client).
///
/// Colors are applied with SGR sequences on attach and restyle, and reset on
/// dispose.
pub struct WriterBackend<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> WriterBackend<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            tracing::debug!(error = %e, "render backend write failed");
        }
    }
}

impl<W: Write + Send> RenderBackend for WriterBackend<W> {
    fn attach(&mut self, theme: &TerminalTheme, _size: TermSize) {
        let sgr = theme.sgr();
        self.emit(&sgr);
    }

    fn write(&mut self, text: &str) {
        self.emit(text);
    }

    fn restyle(&mut self, theme: &TerminalTheme) {
        let sgr = theme.sgr();
        self.emit(&sgr);
    }

    fn dispose(&mut self) {
        self.emit("\x1b[0m");
    }
}
