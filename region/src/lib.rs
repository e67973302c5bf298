//! Safe 2D point, rectangle and transform types for pixel coordinates.

mod common;

pub use point::*;
pub mod point;

pub use rect::*;
pub mod rect;

pub use transform::*;
pub mod transform;

pub mod prelude {
    pub use crate::{Point, Rect, Transform};
}
