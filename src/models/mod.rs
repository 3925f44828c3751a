pub mod geometry;
pub mod work_area;

pub use geometry::{BoundingBox, Extent, Point2, Position};
pub use work_area::WorkArea;
