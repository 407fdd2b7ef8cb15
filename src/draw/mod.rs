pub mod input;
pub mod model;
pub mod render;

pub use input::{DrawInput, PointerSample};
pub use model::{PathCollection, PenStyle, Stroke};
pub use render::{paint_paths, stroke_shapes};
