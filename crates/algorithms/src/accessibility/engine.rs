//! Geometry and classification capabilities used by the analysis

use super::rings::{RingBuffer, RingBufferParams, RingSet};
use crate::classification::{class_breaks, ClassificationMode};
use crate::vector::{buffer_geometry, BufferParams};
use coopaccess_colormap::{lerp_color, Rgb};
use coopaccess_core::{FeatureCollection, Result};
use geo::{Contains, Intersects, MultiPolygon, Point};
use tracing::{debug, warn};

/// Buffering and point-in-ring tests.
pub trait GeometryEngine {
    /// Build ring buffers around every feature of `layer`.
    ///
    /// Without `dissolve`, rings are grouped per source feature in layer
    /// order, each group in ascending distance.
    fn buffer(&self, layer: &FeatureCollection, params: &RingBufferParams) -> Result<RingSet>;

    /// Whether `point` lies in the zone of `ring`
    fn intersects(&self, point: &Point<f64>, ring: &RingBuffer) -> bool;
}

/// Class breaks and color ramps.
pub trait ClassificationEngine {
    /// Ascending class upper bounds for `values`
    fn breaks(
        &self,
        values: &[f64],
        num_classes: usize,
        mode: ClassificationMode,
    ) -> Result<Vec<f64>>;

    /// Jenks natural breaks
    fn natural_breaks(&self, values: &[f64], num_classes: usize) -> Result<Vec<f64>> {
        self.breaks(values, num_classes, ClassificationMode::Jenks)
    }

    /// Color at position `t` in [0, 1] on the ramp from `start` to `end`
    fn ramp_color(&self, start: Rgb, end: Rgb, t: f64) -> Rgb;
}

/// [`GeometryEngine`] built on `geo` polygons.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeGeometryEngine;

impl NativeGeometryEngine {
    pub fn new() -> Self {
        Self
    }

    /// Buffers of one source geometry at each distance
    fn source_buffers(
        geometry: &geo::Geometry<f64>,
        params: &RingBufferParams,
    ) -> Result<Vec<MultiPolygon<f64>>> {
        params
            .distances
            .iter()
            .map(|&distance| {
                buffer_geometry(
                    geometry,
                    &BufferParams {
                        distance,
                        segments: params.segments,
                    },
                )
            })
            .collect()
    }

    fn push_rings(
        set: &mut RingSet,
        source_index: usize,
        source_id: Option<String>,
        distances: &[f64],
        buffers: Vec<MultiPolygon<f64>>,
    ) {
        let mut inner: Option<MultiPolygon<f64>> = None;
        let mut inner_distance = 0.0;
        for (&outer_distance, outer) in distances.iter().zip(buffers) {
            set.push(RingBuffer {
                source_index,
                source_id: source_id.clone(),
                inner_distance,
                outer_distance,
                outer: outer.clone(),
                inner: inner.take(),
            });
            inner = Some(outer);
            inner_distance = outer_distance;
        }
    }
}

impl GeometryEngine for NativeGeometryEngine {
    fn buffer(&self, layer: &FeatureCollection, params: &RingBufferParams) -> Result<RingSet> {
        let mut set = RingSet::default();

        if params.dissolve {
            let mut merged: Vec<MultiPolygon<f64>> =
                vec![MultiPolygon::new(Vec::new()); params.distances.len()];
            for feature in layer.iter() {
                let Some(geometry) = &feature.geometry else {
                    continue;
                };
                for (all, part) in merged.iter_mut().zip(Self::source_buffers(geometry, params)?) {
                    all.0.extend(part.0);
                }
            }
            if merged.iter().any(|m| !m.0.is_empty()) {
                Self::push_rings(&mut set, 0, None, &params.distances, merged);
            }
            return Ok(set);
        }

        for (index, feature) in layer.iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                warn!(index, "source feature without geometry skipped");
                continue;
            };
            let buffers = Self::source_buffers(geometry, params)?;
            Self::push_rings(&mut set, index, feature.id.clone(), &params.distances, buffers);
        }

        debug!(rings = set.len(), "native ring buffers built");
        Ok(set)
    }

    fn intersects(&self, point: &Point<f64>, ring: &RingBuffer) -> bool {
        if !ring.outer.intersects(point) {
            return false;
        }
        // On the inner boundary still counts as this ring
        !ring
            .inner
            .as_ref()
            .is_some_and(|inner| inner.contains(point))
    }
}

/// [`ClassificationEngine`] backed by the in-crate break methods and
/// linear RGB interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeClassificationEngine;

impl NativeClassificationEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ClassificationEngine for NativeClassificationEngine {
    fn breaks(
        &self,
        values: &[f64],
        num_classes: usize,
        mode: ClassificationMode,
    ) -> Result<Vec<f64>> {
        class_breaks(values, num_classes, mode)
    }

    fn ramp_color(&self, start: Rgb, end: Rgb, t: f64) -> Rgb {
        lerp_color(start, end, t)
    }
}
