//! Cooperative accessibility analysis
//!
//! Scores point features by how close they lie to two infrastructure
//! layers (roads and markets). Each infrastructure layer is turned into
//! concentric ring buffers; a point takes the score of the first ring that
//! contains it, and the two factor scores are blended with a weight.
//!
//! The heavy lifting is delegated to two injected capabilities:
//! [`GeometryEngine`] (buffering and point-in-ring tests) and
//! [`ClassificationEngine`] (class breaks and color ramps). Native
//! implementations of both are provided.

mod engine;
mod feedback;
mod pipeline;
mod rings;
mod scorer;
mod style;

pub use engine::{
    ClassificationEngine, GeometryEngine, NativeClassificationEngine, NativeGeometryEngine,
};
pub use feedback::{CancelFlag, Feedback, LogFeedback, NullFeedback};
pub use pipeline::{
    Accessibility, AccessibilityAnalysis, AccessibilityParams, AccessibilityReport, ScoringMode,
};
pub use rings::{
    create_ring_buffers, expand_distances, validate_distances, RingBuffer, RingBufferParams,
    RingSet, DEFAULT_MULTIPLIERS,
};
pub use scorer::{
    combine_scores, compute_scores, ring_score, scoring_point, ScoreSummary, ScoredFeature,
    ScoringOutcome,
};
#[cfg(feature = "parallel")]
pub use scorer::compute_scores_parallel;
pub use style::{classify_and_style, GraduatedStyle, StyleClass, StyleParams};

/// Attribute written on every scored cooperative
pub const SCORE_FIELD: &str = "accessibility_score";

/// Score of a ring at distance zero; each layer unit costs [`DISTANCE_PENALTY`].
pub const MAX_RING_SCORE: f64 = 100.0;

/// Score lost per unit of ring distance
pub const DISTANCE_PENALTY: f64 = 0.01;
