//! Brain Viewer - time-varying activation over a brain surface
//!
//! Takes a triangulated cortical mesh plus per-vertex activation frames and
//! produces per-frame vertex color buffers for an external renderer.
//! Playback, palette choice and hover/emphasis state live in [`BrainViewer`].
//!
//! Data flow: payload -> geometry + activation -> colorize -> render frame.

pub mod activation;
pub mod colorize;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod logging;
pub mod palette;
pub mod payload;
pub mod playback;
pub mod ply;
pub mod viewer;

pub use activation::{ActivationDataset, DataOrigin};
pub use config::Settings;
pub use error::{Result, ViewerError};
pub use geometry::RenderMesh;
pub use interaction::{HoverState, PickEvent};
pub use palette::ColorScale;
pub use payload::BrainPayload;
pub use playback::{ManualTicker, TickScheduler, TokioTicker};
pub use viewer::{BrainViewer, RenderFrame};
