//! Vector geometry used by the native geometry engine
//!
//! - Buffer: polygon approximations of distance zones around points,
//!   lines and polygons, built per source feature (never dissolved here)

mod buffer;

pub use buffer::{buffer_geometry, buffer_point, buffer_segment, BufferParams};
