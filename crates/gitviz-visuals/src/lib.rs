//! Layout and animation state for drawing a commit graph: where every commit,
//! edge and branch label sits, and how the canvas eases between layouts.

pub mod error;
pub mod graph;
pub mod render;
pub mod util;

pub use error::{Error, Result};
pub use graph::{GitVisuals, Hsb, Snapshot};
pub use render::{Canvas, CanvasOp, Layer, RecordingCanvas};
pub use util::config::VisualsConfig;
