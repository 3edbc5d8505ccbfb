//! Pane-side core of agentpanes.
//!
//! A [`PaneController`] binds one [`SessionStream`] (the transport to a
//! backend session keyed by [`SessionKey`]) to one [`TerminalSurface`] and
//! one [`InputHistory`]. Every pane runs as a single-threaded event loop over
//! its own inbox; transport tasks and input handlers only post events tagged
//! with the generation they were created under.
//!
//! [`SessionKey`]: panes_common::SessionKey

pub mod history;
pub mod pane;
pub mod prompt;
pub mod scrollback;
pub mod size;
pub mod stream;
pub mod surface;

pub use history::InputHistory;
pub use pane::{BackendFactory, PaneController, PaneEvent, PaneHandle, PaneState, Submission};
pub use prompt::{Key, PromptAction, PromptInput};
pub use scrollback::Scrollback;
pub use size::{CellMetrics, ContainerSize, TermSize};
pub use stream::{
    ConnectionState, Connector, Delivery, DeliverySink, Dispatch, Generation, MemoryConnector,
    SessionStream, StreamEvent, TransportLink, WsConnector,
};
pub use surface::{NullBackend, RenderBackend, SurfaceOptions, TerminalSurface, WriterBackend};
