//! Weighted multi-criteria ranking of a single coordinate.

use std::fmt;
use std::sync::Arc;

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use heatgrid_core::{Coordinate, CriteriaSet, Mark};
use serde::{Deserialize, Serialize};

/// One weighted criterion evaluation handed to a [`MarkCombiner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    /// Criterion weight, strictly positive.
    pub weight: f64,
    /// Criterion score in `[0, 1]`.
    pub score: f64,
}

/// Folds weighted criterion scores into a mark in `[0, 1]`.
///
/// Terms arrive in criterion-name order and are never empty. Implementations
/// must be pure so that identical inputs give bit-identical marks.
pub trait MarkCombiner: Send + Sync {
    /// Combines the terms into a mark.
    fn combine(&self, terms: &[Term]) -> Mark;
}

/// Power of two bringing the largest weight into `[1, 2)`.
///
/// Dividing by it is exact, so weight sums stay finite without changing
/// marks computed from ordinary weights.
fn weight_scale(terms: &[Term]) -> f64 {
    let largest = terms.iter().fold(0.0_f64, |max, term| max.max(term.weight));
    if largest <= 0.0 || !largest.is_finite() {
        return 1.0;
    }
    2.0_f64.powi((largest.log2().floor() as i32).clamp(-1_000, 1_023))
}

/// Weighted arithmetic mean, `Σ wᵢ sᵢ / Σ wᵢ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMean;

impl MarkCombiner for WeightedMean {
    fn combine(&self, terms: &[Term]) -> Mark {
        let scale = weight_scale(terms);
        let (weighted, total) = terms.iter().fold((0.0, 0.0), |(acc, total), term| {
            let weight = term.weight / scale;
            (acc + weight * term.score, total + weight)
        });
        (weighted / total).clamp(0.0, 1.0)
    }
}

/// Weighted geometric mean, `exp(Σ wᵢ ln sᵢ / Σ wᵢ)`.
///
/// A single criterion scoring zero pulls the mark to (almost) zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedGeometric;

const GEOMETRIC_FLOOR: f64 = 1e-9;

impl MarkCombiner for WeightedGeometric {
    fn combine(&self, terms: &[Term]) -> Mark {
        let scale = weight_scale(terms);
        let (log_sum, total) = terms.iter().fold((0.0, 0.0), |(acc, total), term| {
            let weight = term.weight / scale;
            (
                acc + weight * term.score.max(GEOMETRIC_FLOOR).ln(),
                total + weight,
            )
        });
        (log_sum / total).exp().clamp(0.0, 1.0)
    }
}

/// Named combiners selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CombinerKind {
    /// [`WeightedMean`].
    #[default]
    WeightedMean,
    /// [`WeightedGeometric`].
    WeightedGeometric,
}

impl CombinerKind {
    fn build(self) -> Arc<dyn MarkCombiner> {
        match self {
            CombinerKind::WeightedMean => Arc::new(WeightedMean),
            CombinerKind::WeightedGeometric => Arc::new(WeightedGeometric),
        }
    }
}

/// Scores coordinates against criteria sets.
#[derive(Clone)]
pub struct Scorer {
    combiner: Arc<dyn MarkCombiner>,
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scorer").finish_non_exhaustive()
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::from_kind(CombinerKind::default())
    }
}

impl Scorer {
    /// Scorer using a custom combination function.
    pub fn new(combiner: Arc<dyn MarkCombiner>) -> Self {
        Self { combiner }
    }

    /// Scorer using one of the built-in combiners.
    pub fn from_kind(kind: CombinerKind) -> Self {
        Self::new(kind.build())
    }

    /// Ranks `point` against every criterion of `criteria`.
    pub fn rank(&self, point: &Coordinate, criteria: &CriteriaSet) -> Result<Mark, HeatgridError> {
        point.validate()?;
        ensure_not_empty(criteria)?;
        let terms: Vec<Term> = criteria
            .iter()
            .map(|criterion| Term {
                weight: criterion.weight(),
                score: criterion.evaluate(point),
            })
            .collect();
        Ok(self.combiner.combine(&terms))
    }
}

/// Fails with `EmptyCriteriaSet` when the set has no criteria.
pub fn ensure_not_empty(criteria: &CriteriaSet) -> Result<(), HeatgridError> {
    if criteria.is_empty() {
        return Err(HeatgridError::EmptyCriteriaSet(
            ErrorInfo::new("criteria-empty", "criteria set has no criteria to score with")
                .with_context("criteria", criteria.name()),
        ));
    }
    Ok(())
}
