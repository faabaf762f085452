//! # coopaccess Colormap
//!
//! Colors for graduated point styles. Class colors are sampled by linear
//! RGB interpolation between two end colors; the accessibility style runs
//! from red (poor) to green (good).
//!
//! ## Usage
//!
//! ```ignore
//! use coopaccess_colormap::{lerp_color, Rgb};
//!
//! let mid = lerp_color(Rgb::RED, Rgb::GREEN, 0.5);
//! ```

mod scheme;

pub use scheme::{lerp_color, Rgb};
