//! Terminal surface: one per pane.
//!
//! Renders text through a [`RenderBackend`], keeps a bounded scrollback of
//! everything written, and fans raw keystrokes out to registered input
//! handlers. A `TerminalSurface` is a cheap handle; clones refer to the same
//! surface, so the pane's stream data handler can hold one.

mod backend;

#[cfg(test)]
mod tests;

pub use backend::{NullBackend, RenderBackend, WriterBackend};

use std::sync::{Arc, Mutex, MutexGuard};

use panes_config::TerminalTheme;

use crate::scrollback::Scrollback;
use crate::size::{CellMetrics, ContainerSize, TermSize};

/// Raw keystroke/paste handler.
pub type InputHandler = Box<dyn FnMut(&str) + Send>;

/// Construction-time settings for a surface.
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    pub size: TermSize,
    pub scrollback_lines: usize,
    /// Colors are read once, here. See [`TerminalSurface::restyle`].
    pub theme: TerminalTheme,
    pub metrics: CellMetrics,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            size: TermSize::default(),
            scrollback_lines: 10_000,
            theme: TerminalTheme::default(),
            metrics: CellMetrics::default(),
        }
    }
}

struct SurfaceInner {
    backend: Box<dyn RenderBackend>,
    scrollback: Scrollback,
    size: TermSize,
    metrics: CellMetrics,
    theme: TerminalTheme,
    input_handlers: Vec<InputHandler>,
    disposed: bool,
}

#[derive(Clone)]
pub struct TerminalSurface {
    inner: Arc<Mutex<SurfaceInner>>,
}

impl TerminalSurface {
    pub fn new(options: SurfaceOptions, mut backend: Box<dyn RenderBackend>) -> Self {
        backend.attach(&options.theme, options.size);
        Self {
            inner: Arc::new(Mutex::new(SurfaceInner {
                backend,
                scrollback: Scrollback::new(options.scrollback_lines),
                size: options.size,
                metrics: options.metrics,
                theme: options.theme,
                input_handlers: Vec::new(),
                disposed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Render `text` at the cursor. Dropped once the surface is disposed.
    pub fn write(&self, text: &str) {
        let mut inner = self.lock();
        if inner.disposed {
            tracing::trace!(len = text.len(), "write to disposed surface dropped");
            return;
        }
        inner.scrollback.append(text);
        inner.backend.write(text);
    }

    pub fn write_line(&self, text: &str) {
        self.write(&format!("{text}\r\n"));
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Register a raw keystroke/paste handler. Handlers run in registration
    /// order for every input event.
    pub fn on_input(&self, handler: impl FnMut(&str) + Send + 'static) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.input_handlers.push(Box::new(handler));
    }

    /// Feed one input event (as produced by the user) to the handlers.
    pub fn input(&self, data: &str) {
        // Handlers run unlocked so they may write back into this surface.
        let mut handlers = {
            let mut inner = self.lock();
            if inner.disposed {
                return;
            }
            std::mem::take(&mut inner.input_handlers)
        };

        for handler in handlers.iter_mut() {
            handler(data);
        }

        let mut inner = self.lock();
        if !inner.disposed {
            handlers.append(&mut inner.input_handlers);
            inner.input_handlers = handlers;
        }
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    pub fn size(&self) -> TermSize {
        self.lock().size
    }

    /// Re-fit to `size`. Scrollback is kept. Returns `false` when the size
    /// did not change.
    pub fn fit(&self, size: TermSize) -> bool {
        let mut inner = self.lock();
        if inner.disposed || inner.size == size {
            return false;
        }
        inner.size = size;
        inner.backend.fit(size);
        tracing::trace!(cols = size.cols, rows = size.rows, "surface re-fit");
        true
    }

    /// Resize observation of the hosting container.
    pub fn observe_container(&self, container: ContainerSize) -> bool {
        let size = self.lock().metrics.fit(container);
        self.fit(size)
    }

    // =========================================================================
    // THEME
    // =========================================================================

    pub fn theme(&self) -> TerminalTheme {
        self.lock().theme.clone()
    }

    /// Explicitly re-color an existing surface. Ambient theme changes are
    /// never picked up on their own.
    pub fn restyle(&self, theme: TerminalTheme) {
        let mut inner = self.lock();
        if inner.disposed || inner.theme == theme {
            return;
        }
        inner.backend.restyle(&theme);
        inner.theme = theme;
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Release rendering resources and drop input handlers. Only the first
    /// call has any effect; returns whether this call disposed the surface.
    pub fn dispose(&self) -> bool {
        let mut inner = self.lock();
        if inner.disposed {
            return false;
        }
        inner.disposed = true;
        inner.input_handlers.clear();
        inner.backend.dispose();
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Everything written so far, as kept in scrollback.
    pub fn contents(&self) -> String {
        self.lock().scrollback.contents()
    }

    /// Number of completed lines in scrollback.
    pub fn scrollback_len(&self) -> usize {
        self.lock().scrollback.len()
    }

    /// `true` if both handles refer to the same surface.
    pub fn same_as(&self, other: &TerminalSurface) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for TerminalSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("TerminalSurface")
            .field("size", &inner.size)
            .field("disposed", &inner.disposed)
            .field("lines", &inner.scrollback.len())
            .finish()
    }
}
