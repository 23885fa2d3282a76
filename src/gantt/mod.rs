pub mod drag;
pub mod scale;

pub use drag::{DragCommit, DragController, DragError, DragMode, DragPreview};
pub use scale::{TimeScale, Zoom};
