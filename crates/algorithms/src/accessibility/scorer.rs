//! Per-feature accessibility scoring

use super::engine::GeometryEngine;
use super::feedback::Feedback;
use super::rings::RingSet;
use super::{DISTANCE_PENALTY, MAX_RING_SCORE};
use coopaccess_core::{Error, Feature, Result};
use geo::{Geometry, Point};
use serde::Serialize;
use tracing::warn;

/// Score of one cooperative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFeature {
    /// Position in the cooperative layer
    pub index: usize,
    pub id: Option<String>,
    pub road_score: f64,
    pub market_score: f64,
    /// Weighted total written to the output layer
    pub score: f64,
}

/// Result of a scoring pass
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    /// One entry per scored feature, in input order
    pub scores: Vec<ScoredFeature>,
    /// Whether the pass stopped early on a cancel request
    pub canceled: bool,
}

/// Point used to score a feature.
///
/// Points score as themselves and multipoints by their first member.
/// Anything else has no scoring location.
pub fn scoring_point(feature: &Feature) -> Option<Point<f64>> {
    match feature.geometry.as_ref()? {
        Geometry::Point(p) => Some(*p),
        Geometry::MultiPoint(mp) => mp.0.first().copied(),
        _ => None,
    }
}

/// Score of `point` against a ring set.
///
/// The first ring (in set order) that the engine reports as containing
/// the point decides: `100 - distance * 0.01`. No match scores 0. The
/// result is not clamped, so rings beyond 10 000 units score negative.
pub fn ring_score<G>(point: &Point<f64>, rings: &RingSet, engine: &G) -> f64
where
    G: GeometryEngine + ?Sized,
{
    rings
        .iter()
        .find(|ring| engine.intersects(point, ring))
        .map(|ring| MAX_RING_SCORE - ring.distance() * DISTANCE_PENALTY)
        .unwrap_or(0.0)
}

/// Weighted blend: `road * w + market * (1 - w)`
pub fn combine_scores(road_score: f64, market_score: f64, road_weight: f64) -> f64 {
    road_score * road_weight + market_score * (1.0 - road_weight)
}

fn check_weight(road_weight: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&road_weight) {
        return Err(Error::invalid_parameter(
            "road_weight",
            road_weight,
            "weight must be between 0 and 1",
        ));
    }
    Ok(())
}

fn score_feature<G>(
    index: usize,
    feature: &Feature,
    road_rings: &RingSet,
    market_rings: &RingSet,
    road_weight: f64,
    engine: &G,
) -> ScoredFeature
where
    G: GeometryEngine + ?Sized,
{
    let (road_score, market_score) = match scoring_point(feature) {
        Some(point) => (
            ring_score(&point, road_rings, engine),
            ring_score(&point, market_rings, engine),
        ),
        None => {
            warn!(index, "cooperative without point geometry scored 0");
            (0.0, 0.0)
        }
    };

    ScoredFeature {
        index,
        id: feature.id.clone(),
        road_score,
        market_score,
        score: combine_scores(road_score, market_score, road_weight),
    }
}

/// Score every cooperative against both ring sets, in input order.
///
/// Cancellation is polled before each feature; a cancel request stops the
/// pass and returns what was scored so far. Progress is reported after
/// each feature as `current * 100 / total`.
///
/// # Errors
/// `InvalidParameter` when `road_weight` is outside [0, 1].
pub fn compute_scores<G>(
    cooperatives: &[Feature],
    road_rings: &RingSet,
    market_rings: &RingSet,
    road_weight: f64,
    engine: &G,
    feedback: &dyn Feedback,
) -> Result<ScoringOutcome>
where
    G: GeometryEngine + ?Sized,
{
    check_weight(road_weight)?;

    let total = cooperatives.len();
    let mut outcome = ScoringOutcome {
        scores: Vec::with_capacity(total),
        canceled: false,
    };

    for (current, feature) in cooperatives.iter().enumerate() {
        if feedback.is_canceled() {
            outcome.canceled = true;
            break;
        }

        outcome.scores.push(score_feature(
            current,
            feature,
            road_rings,
            market_rings,
            road_weight,
            engine,
        ));

        feedback.set_progress(current as f64 * 100.0 / total as f64);
    }

    Ok(outcome)
}

/// Parallel variant of [`compute_scores`].
///
/// Features are scored with rayon in consecutive chunks of `chunk_size`.
/// Cancellation is polled before each chunk, so a cancel request keeps
/// the chunks already finished. Progress is reported for every feature
/// of a finished chunk, in the same sequence as the sequential pass.
///
/// # Errors
/// `InvalidParameter` when `road_weight` is outside [0, 1].
#[cfg(feature = "parallel")]
pub fn compute_scores_parallel<G>(
    cooperatives: &[Feature],
    road_rings: &RingSet,
    market_rings: &RingSet,
    road_weight: f64,
    engine: &G,
    feedback: &dyn Feedback,
    chunk_size: usize,
) -> Result<ScoringOutcome>
where
    G: GeometryEngine + Sync + ?Sized,
{
    use rayon::prelude::*;

    check_weight(road_weight)?;

    let chunk_size = chunk_size.max(1);
    let total = cooperatives.len();
    let mut outcome = ScoringOutcome {
        scores: Vec::with_capacity(total),
        canceled: false,
    };

    for (chunk_index, chunk) in cooperatives.chunks(chunk_size).enumerate() {
        if feedback.is_canceled() {
            outcome.canceled = true;
            break;
        }

        let offset = chunk_index * chunk_size;
        let scored: Vec<ScoredFeature> = chunk
            .par_iter()
            .enumerate()
            .map(|(i, f)| {
                score_feature(offset + i, f, road_rings, market_rings, road_weight, engine)
            })
            .collect();

        for current in offset..offset + scored.len() {
            feedback.set_progress(current as f64 * 100.0 / total as f64);
        }
        outcome.scores.extend(scored);
    }

    Ok(outcome)
}

/// Summary statistics of a score column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Features outside every ring of both layers
    pub zero_count: usize,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[ScoredFeature]) -> Self {
        let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
        if values.is_empty() {
            return Self::default();
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Self {
            count: values.len(),
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
            zero_count: values.iter().filter(|v| **v == 0.0).count(),
        }
    }
}
