//! # coopaccess Algorithms
//!
//! Analysis algorithms for coopaccess.
//!
//! ## Available Algorithm Categories
//!
//! - **accessibility**: Ring-buffer proximity scoring of cooperatives, graduated styling
//! - **classification**: Jenks, quantile and equal-interval class breaks
//! - **imagery**: Change detection between classified rasters
//! - **vector**: Point, line and polygon buffers

pub mod accessibility;
pub mod classification;
pub mod imagery;
pub mod vector;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::accessibility::{
        classify_and_style, compute_scores, create_ring_buffers, ring_score, Accessibility,
        AccessibilityAnalysis, AccessibilityParams, AccessibilityReport, ClassificationEngine,
        Feedback, GeometryEngine, GraduatedStyle, NativeClassificationEngine,
        NativeGeometryEngine, RingSet, StyleParams, SCORE_FIELD,
    };
    pub use crate::classification::{class_breaks, ClassificationMode};
    pub use crate::imagery::{change_detection, ChangeDetection, ChangeDetector, ChangeParams};
    pub use crate::vector::{buffer_geometry, BufferParams};
    pub use coopaccess_core::prelude::*;
}
