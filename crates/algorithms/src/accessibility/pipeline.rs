//! End-to-end accessibility analysis
//!
//! Ties the steps together: ring buffers for roads and markets, output
//! sink creation, per-cooperative scoring and the graduated style.
//! Cancellation is checked between steps and before every feature.

use super::engine::{
    ClassificationEngine, GeometryEngine, NativeClassificationEngine, NativeGeometryEngine,
};
use super::feedback::{Feedback, NullFeedback};
use super::rings::{create_ring_buffers, expand_distances, RingSet, DEFAULT_MULTIPLIERS};
use super::scorer::{compute_scores, ScoreSummary, ScoredFeature, ScoringOutcome};
use super::style::{classify_and_style, GraduatedStyle, StyleParams};
use super::SCORE_FIELD;
use coopaccess_core::{
    Algorithm, AttributeValue, Error, FeatureCollection, FeatureSink, Field, FieldKind,
    MemorySink, Result,
};
use tracing::{debug, info, warn};

/// How cooperatives are scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// One feature at a time, polling cancellation before each
    #[default]
    Sequential,
    /// Chunks of features with rayon, polling cancellation before each
    /// chunk. Falls back to sequential without the `parallel` feature.
    Parallel,
}

/// Parameters for the accessibility analysis
#[derive(Debug, Clone)]
pub struct AccessibilityParams {
    /// Base road ring distance (default: 1000)
    pub road_distance: f64,
    /// Base market ring distance (default: 2000)
    pub market_distance: f64,
    /// Weight of the road score, market weight is `1 - road_weight` (default: 0.6)
    pub road_weight: f64,
    /// Ring multipliers applied to both base distances (default: [1, 2, 5])
    pub multipliers: Vec<f64>,
    /// Segments per quarter circle of ring curves (default: 5)
    pub segments: usize,
    /// Score against rings sorted by distance instead of source order (default: false)
    pub sort_by_distance: bool,
    pub scoring: ScoringMode,
    /// Features per cancellation check in parallel mode (default: 256)
    pub parallel_chunk_size: usize,
    pub style: StyleParams,
}

impl Default for AccessibilityParams {
    fn default() -> Self {
        Self {
            road_distance: 1000.0,
            market_distance: 2000.0,
            road_weight: 0.6,
            multipliers: DEFAULT_MULTIPLIERS.to_vec(),
            segments: 5,
            sort_by_distance: false,
            scoring: ScoringMode::Sequential,
            parallel_chunk_size: 256,
            style: StyleParams::default(),
        }
    }
}

impl AccessibilityParams {
    pub fn road_distances(&self) -> Vec<f64> {
        expand_distances(self.road_distance, &self.multipliers)
    }

    pub fn market_distances(&self) -> Vec<f64> {
        expand_distances(self.market_distance, &self.multipliers)
    }
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct AccessibilityReport {
    /// Scores of the features emitted to the sink, in input order
    pub scores: Vec<ScoredFeature>,
    pub summary: ScoreSummary,
    /// `None` when the run was canceled before any feature was emitted
    pub style: Option<GraduatedStyle>,
    pub road_rings: usize,
    pub market_rings: usize,
    pub canceled: bool,
}

impl AccessibilityReport {
    fn canceled() -> Self {
        Self {
            canceled: true,
            ..Default::default()
        }
    }
}

/// The accessibility analysis with its two engines.
pub struct AccessibilityAnalysis<G = NativeGeometryEngine, C = NativeClassificationEngine> {
    geometry: G,
    classification: C,
    params: AccessibilityParams,
}

impl AccessibilityAnalysis {
    /// Analysis backed by the native engines
    pub fn new(params: AccessibilityParams) -> Self {
        Self::with_engines(NativeGeometryEngine, NativeClassificationEngine, params)
    }
}

impl<G, C> AccessibilityAnalysis<G, C>
where
    G: GeometryEngine + Sync,
    C: ClassificationEngine,
{
    pub fn with_engines(geometry: G, classification: C, params: AccessibilityParams) -> Self {
        Self {
            geometry,
            classification,
            params,
        }
    }

    pub fn params(&self) -> &AccessibilityParams {
        &self.params
    }

    /// Run the analysis, writing scored cooperatives to `sink`.
    ///
    /// Each cooperative keeps its geometry and attributes and gains
    /// (or overwrites) `accessibility_score`, always declared as a float
    /// field. On cancellation the features already emitted stay in the
    /// sink and the report has `canceled` set. A failed write closes the
    /// sink with the features written so far before the error is returned.
    ///
    /// # Errors
    /// `InvalidParameter` for bad distances or weight,
    /// `InvalidBufferResult` when ring creation fails, `SinkCreation`
    /// when the sink cannot be created, plus any sink write error.
    pub fn run(
        &self,
        cooperatives: &FeatureCollection,
        roads: &FeatureCollection,
        markets: &FeatureCollection,
        sink: &mut dyn FeatureSink,
        feedback: &dyn Feedback,
    ) -> Result<AccessibilityReport> {
        let params = &self.params;

        if feedback.is_canceled() {
            return Ok(AccessibilityReport::canceled());
        }

        feedback.push_info("Creating road buffers...");
        let mut road_rings = create_ring_buffers(
            &self.geometry,
            roads,
            &params.road_distances(),
            params.segments,
        )?;

        if feedback.is_canceled() {
            return Ok(AccessibilityReport::canceled());
        }

        feedback.push_info("Creating market buffers...");
        let mut market_rings = create_ring_buffers(
            &self.geometry,
            markets,
            &params.market_distances(),
            params.segments,
        )?;

        if params.sort_by_distance {
            road_rings.sort_by_distance();
            market_rings.sort_by_distance();
        }

        if feedback.is_canceled() {
            return Ok(AccessibilityReport::canceled());
        }

        let mut schema = cooperatives.schema.clone();
        schema.ensure_field(Field::new(SCORE_FIELD, FieldKind::Float));
        sink.create(&schema).map_err(|e| match e {
            Error::SinkCreation(msg) => Error::SinkCreation(msg),
            other => Error::SinkCreation(other.to_string()),
        })?;

        info!(
            cooperatives = cooperatives.len(),
            road_rings = road_rings.len(),
            market_rings = market_rings.len(),
            "scoring cooperatives"
        );

        let outcome = self.score(cooperatives, &road_rings, &market_rings, feedback)?;

        for scored in &outcome.scores {
            let mut feature = cooperatives.features[scored.index].clone();
            feature.set_property(SCORE_FIELD, AttributeValue::Float(scored.score));
            if let Err(e) = sink.add_feature(feature) {
                // Leave a closed layer holding the features written so far
                if let Err(close) = sink.finish() {
                    warn!(error = %close, "could not close output after a failed write");
                }
                return Err(e);
            }
        }
        sink.finish()?;

        let values: Vec<f64> = outcome.scores.iter().map(|s| s.score).collect();
        let style = classify_and_style(SCORE_FIELD, &values, &self.classification, &params.style)?;
        let summary = ScoreSummary::from_scores(&outcome.scores);
        debug!(?summary, "accessibility summary");

        Ok(AccessibilityReport {
            scores: outcome.scores,
            summary,
            style: Some(style),
            road_rings: road_rings.len(),
            market_rings: market_rings.len(),
            canceled: outcome.canceled,
        })
    }

    fn score(
        &self,
        cooperatives: &FeatureCollection,
        road_rings: &RingSet,
        market_rings: &RingSet,
        feedback: &dyn Feedback,
    ) -> Result<ScoringOutcome> {
        match self.params.scoring {
            #[cfg(feature = "parallel")]
            ScoringMode::Parallel => super::scorer::compute_scores_parallel(
                &cooperatives.features,
                road_rings,
                market_rings,
                self.params.road_weight,
                &self.geometry,
                feedback,
                self.params.parallel_chunk_size,
            ),
            _ => compute_scores(
                &cooperatives.features,
                road_rings,
                market_rings,
                self.params.road_weight,
                &self.geometry,
                feedback,
            ),
        }
    }
}

/// Accessibility analysis as an [`Algorithm`].
///
/// Input is `(cooperatives, roads, markets)`; output is the scored
/// cooperative layer plus the run report.
#[derive(Debug, Clone, Default)]
pub struct Accessibility;

impl Algorithm for Accessibility {
    type Input = (FeatureCollection, FeatureCollection, FeatureCollection);
    type Output = (FeatureCollection, AccessibilityReport);
    type Params = AccessibilityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "InfrastructureAccessibility"
    }

    fn description(&self) -> &'static str {
        "Score cooperatives by proximity to road and market ring buffers"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (cooperatives, roads, markets) = input;
        let mut sink = MemorySink::new();
        let report = AccessibilityAnalysis::new(params).run(
            &cooperatives,
            &roads,
            &markets,
            &mut sink,
            &NullFeedback,
        )?;
        Ok((sink.into_collection(), report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopaccess_core::Feature;
    use geo::{Geometry, LineString, Point};

    fn layers() -> (FeatureCollection, FeatureCollection, FeatureCollection) {
        let coops = FeatureCollection::from_features(vec![
            Feature::new(Geometry::Point(Point::new(500.0, 500.0)))
                .with_id("coop-1")
                .with_property("name", AttributeValue::String("Umoja".into())),
            Feature::new(Geometry::Point(Point::new(50_000.0, 50_000.0))).with_id("coop-2"),
        ]);
        let roads = FeatureCollection::from_features(vec![Feature::new(Geometry::LineString(
            LineString::from(vec![(0.0, 0.0), (10_000.0, 0.0)]),
        ))]);
        let markets = FeatureCollection::from_features(vec![Feature::new(Geometry::Point(
            Point::new(0.0, 0.0),
        ))]);
        (coops, roads, markets)
    }

    #[test]
    fn test_execute_default() {
        let (layer, report) = Accessibility.execute_default(layers()).unwrap();

        assert_eq!(layer.len(), 2);
        assert!(layer.schema.has_field(SCORE_FIELD));
        assert!(layer.schema.has_field("name"));

        // 500 from the road (ring 1000 -> 90), 707 from the market (ring 2000 -> 80)
        let first = layer.features[0].get_property(SCORE_FIELD).and_then(|v| v.as_f64()).unwrap();
        assert!((first - 86.0).abs() < 1e-9);
        assert_eq!(
            layer.features[0].get_property("name"),
            Some(&AttributeValue::String("Umoja".into()))
        );

        assert_eq!(report.summary.zero_count, 1);
        assert_eq!(report.road_rings, 3);
        assert_eq!(report.market_rings, 3);
        assert!(!report.canceled);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (c, r, m) = layers();
        let sequential = AccessibilityAnalysis::new(AccessibilityParams::default());
        let parallel = AccessibilityAnalysis::new(AccessibilityParams {
            scoring: ScoringMode::Parallel,
            ..Default::default()
        });

        let a = sequential.run(&c, &r, &m, &mut MemorySink::new(), &NullFeedback).unwrap();
        let b = parallel.run(&c, &r, &m, &mut MemorySink::new(), &NullFeedback).unwrap();
        assert_eq!(a.scores, b.scores);
    }

    #[test]
    fn test_existing_score_field_overwritten() {
        let (mut c, r, m) = layers();
        c.features[0].set_property(SCORE_FIELD, AttributeValue::String("n/a".into()));
        c.features[1].set_property(SCORE_FIELD, AttributeValue::Float(55.0));
        c.schema = coopaccess_core::LayerSchema::infer(&c.features);
        assert_eq!(c.schema.field(SCORE_FIELD).map(|f| f.kind), Some(FieldKind::String));

        let mut sink = MemorySink::new();
        AccessibilityAnalysis::new(AccessibilityParams::default())
            .run(&c, &r, &m, &mut sink, &NullFeedback)
            .unwrap();

        let out = sink.into_collection();
        assert_eq!(out.schema.fields.iter().filter(|f| f.name == SCORE_FIELD).count(), 1);
        assert_eq!(out.schema.field(SCORE_FIELD).map(|f| f.kind), Some(FieldKind::Float));
        let first = out.features[0].get_property(SCORE_FIELD).and_then(|v| v.as_f64()).unwrap();
        assert!((first - 86.0).abs() < 1e-9);
        assert_eq!(out.features[1].get_property(SCORE_FIELD), Some(&AttributeValue::Float(0.0)));
    }
}
