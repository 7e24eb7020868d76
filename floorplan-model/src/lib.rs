//! Geometric model of a floor plan: points, polygons, symbols and the
//! `Layout` aggregate that the annotation stages fill in and the rule
//! engine reads.
//!
//! All coordinates are image-pixel coordinates with the origin at the
//! top-left corner (y grows downward).

mod geometry;
mod layout;

pub use geometry::{GeometryError, Point, Polygon};
pub use layout::{Category, Dimension, Label, Layout, Metadata, Room, Symbol};
