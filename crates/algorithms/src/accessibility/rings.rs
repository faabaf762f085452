//! Concentric ring buffers around infrastructure features

use super::engine::GeometryEngine;
use coopaccess_core::{Error, FeatureCollection, Result};
use geo::MultiPolygon;
use tracing::debug;

/// Multipliers applied to a base distance: `[d, 2d, 5d]`
pub const DEFAULT_MULTIPLIERS: [f64; 3] = [1.0, 2.0, 5.0];

/// Parameters for a multi-ring buffer
#[derive(Debug, Clone)]
pub struct RingBufferParams {
    /// Outer ring distances, strictly ascending
    pub distances: Vec<f64>,
    /// Segments per quarter circle (default: 5)
    pub segments: usize,
    /// Merge the rings of all sources per distance (default: false)
    pub dissolve: bool,
}

impl Default for RingBufferParams {
    fn default() -> Self {
        Self {
            distances: DEFAULT_MULTIPLIERS.to_vec(),
            segments: 5,
            dissolve: false,
        }
    }
}

/// One ring: the zone between `inner_distance` and `outer_distance`
/// around a single source feature.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Position of the source feature in its layer
    pub source_index: usize,
    /// Id of the source feature, if it had one
    pub source_id: Option<String>,
    /// Zero for the innermost ring
    pub inner_distance: f64,
    pub outer_distance: f64,
    /// Buffer at `outer_distance`
    pub outer: MultiPolygon<f64>,
    /// Buffer at `inner_distance`; `None` for the innermost ring
    pub inner: Option<MultiPolygon<f64>>,
}

impl RingBuffer {
    /// The distance a ring is scored by
    pub fn distance(&self) -> f64 {
        self.outer_distance
    }
}

/// Ordered ring buffers of one infrastructure layer.
///
/// Rings come grouped by source feature in layer order, each group in
/// ascending distance. Rings of different sources may overlap.
#[derive(Debug, Clone, Default)]
pub struct RingSet {
    rings: Vec<RingBuffer>,
}

impl RingSet {
    pub fn new(rings: Vec<RingBuffer>) -> Self {
        Self { rings }
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RingBuffer> {
        self.rings.iter()
    }

    pub fn push(&mut self, ring: RingBuffer) {
        self.rings.push(ring);
    }

    /// Reorder all rings by ascending outer distance.
    ///
    /// The sort is stable, so rings at equal distance keep source order.
    /// After sorting, the first matching ring of a point is also its
    /// nearest one.
    pub fn sort_by_distance(&mut self) {
        self.rings
            .sort_by(|a, b| a.outer_distance.total_cmp(&b.outer_distance));
    }
}

impl<'a> IntoIterator for &'a RingSet {
    type Item = &'a RingBuffer;
    type IntoIter = std::slice::Iter<'a, RingBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.rings.iter()
    }
}

/// Scale a base distance by each multiplier.
pub fn expand_distances(base: f64, multipliers: &[f64]) -> Vec<f64> {
    multipliers.iter().map(|m| base * m).collect()
}

/// Check a ring distance list: non-empty, finite, positive and strictly
/// ascending.
pub fn validate_distances(distances: &[f64]) -> Result<()> {
    if distances.is_empty() {
        return Err(Error::invalid_parameter(
            "distances",
            "[]",
            "at least one ring distance is required",
        ));
    }
    if let Some(d) = distances.iter().find(|d| !d.is_finite() || **d <= 0.0) {
        return Err(Error::invalid_parameter(
            "distances",
            d,
            "ring distances must be positive numbers",
        ));
    }
    if distances.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::invalid_parameter(
            "distances",
            format!("{:?}", distances),
            "ring distances must be strictly ascending",
        ));
    }
    Ok(())
}

/// Build the ring buffers of an infrastructure layer.
///
/// Rings are never dissolved, so each source feature keeps its own set.
///
/// # Errors
/// `InvalidParameter` for a bad distance list. `InvalidBufferResult`
/// when the engine fails, or returns no rings for a non-empty layer.
pub fn create_ring_buffers<G>(
    engine: &G,
    layer: &FeatureCollection,
    distances: &[f64],
    segments: usize,
) -> Result<RingSet>
where
    G: GeometryEngine + ?Sized,
{
    validate_distances(distances)?;

    let params = RingBufferParams {
        distances: distances.to_vec(),
        segments,
        dissolve: false,
    };

    let rings = engine.buffer(layer, &params).map_err(|e| match e {
        Error::InvalidBufferResult(msg) => Error::InvalidBufferResult(msg),
        other => Error::InvalidBufferResult(other.to_string()),
    })?;

    if rings.is_empty() && !layer.is_empty() {
        return Err(Error::InvalidBufferResult(format!(
            "no rings produced for {} source features",
            layer.len()
        )));
    }

    debug!(
        sources = layer.len(),
        rings = rings.len(),
        "ring buffers created"
    );
    Ok(rings)
}
