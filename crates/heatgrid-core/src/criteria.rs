//! Declarative weighted criteria and the immutable registry that holds them.
//!
//! Criteria sets are written as YAML documents:
//!
//! ```yaml
//! name: schools
//! criteria:
//!   nearby_school:
//!     weight: 2.0
//!     kind: proximity
//!     radius_m: 800
//!     dataset: schools
//!   calm:
//!     weight: 1.0
//!     kind: avoidance
//!     radius_m: 300
//!     features: [[4.832, 45.757]]
//! ```
//!
//! A [`CriteriaSetDef`] is resolved into a [`CriteriaSet`] once dataset
//! references have been looked up; after that the set never changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::errors::{ErrorInfo, HeatgridError};
use crate::geo::haversine_m;

/// Serialized form of a single criterion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RuleDef {
    /// Closer to a feature is better.
    Proximity {
        /// Distance at which the score reaches zero.
        radius_m: f64,
        /// Inline features.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        features: Vec<Coordinate>,
        /// Named dataset appended to the inline features.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dataset: Option<String>,
    },
    /// Further from every feature is better.
    Avoidance {
        /// Distance beyond which the score is one.
        radius_m: f64,
        /// Inline features.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        features: Vec<Coordinate>,
        /// Named dataset appended to the inline features.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dataset: Option<String>,
    },
    /// More features nearby is better, up to a saturation count.
    Density {
        /// Neighbourhood radius.
        radius_m: f64,
        /// Feature count mapped to a score of one.
        saturation: u32,
        /// Inline features.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        features: Vec<Coordinate>,
        /// Named dataset appended to the inline features.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dataset: Option<String>,
    },
    /// Fixed score, mostly useful as a baseline term.
    Constant {
        /// Score in `[0, 1]`.
        value: f64,
    },
}

/// Serialized form of a weighted criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDef {
    /// Relative weight, strictly positive.
    pub weight: f64,
    /// Scoring rule.
    #[serde(flatten)]
    pub rule: RuleDef,
}

/// Serialized form of a criteria set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaSetDef {
    /// Registry key of the set.
    pub name: String,
    /// Criteria keyed by name.
    #[serde(default)]
    pub criteria: BTreeMap<String, CriterionDef>,
}

/// Evaluation rule of a resolved criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CriterionKind {
    /// `1 - d / radius` to the nearest feature, clamped to `[0, 1]`.
    Proximity {
        /// Feature locations.
        features: Vec<Coordinate>,
        /// Distance at which the score reaches zero.
        radius_m: f64,
    },
    /// `1 - proximity`.
    Avoidance {
        /// Feature locations.
        features: Vec<Coordinate>,
        /// Distance beyond which the score is one.
        radius_m: f64,
    },
    /// Features within `radius_m` divided by `saturation`, clamped to `[0, 1]`.
    Density {
        /// Feature locations.
        features: Vec<Coordinate>,
        /// Neighbourhood radius.
        radius_m: f64,
        /// Feature count mapped to a score of one.
        saturation: u32,
    },
    /// Fixed score.
    Constant {
        /// Score in `[0, 1]`.
        value: f64,
    },
}

impl CriterionKind {
    /// Scores a coordinate in `[0, 1]`.
    pub fn evaluate(&self, point: &Coordinate) -> f64 {
        match self {
            CriterionKind::Proximity { features, radius_m } => proximity(features, *radius_m, point),
            CriterionKind::Avoidance { features, radius_m } => {
                1.0 - proximity(features, *radius_m, point)
            }
            CriterionKind::Density {
                features,
                radius_m,
                saturation,
            } => {
                let count = features
                    .iter()
                    .filter(|feature| haversine_m(point, feature) <= *radius_m)
                    .count();
                (count as f64 / f64::from(*saturation)).clamp(0.0, 1.0)
            }
            CriterionKind::Constant { value } => value.clamp(0.0, 1.0),
        }
    }
}

fn proximity(features: &[Coordinate], radius_m: f64, point: &Coordinate) -> f64 {
    let nearest = features
        .iter()
        .map(|feature| haversine_m(point, feature))
        .fold(f64::INFINITY, f64::min);
    if nearest.is_infinite() {
        return 0.0;
    }
    (1.0 - nearest / radius_m).clamp(0.0, 1.0)
}

/// A named, weighted scoring rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    name: String,
    weight: f64,
    kind: CriterionKind,
}

impl Criterion {
    /// Creates a validated criterion.
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        kind: CriterionKind,
    ) -> Result<Self, HeatgridError> {
        let name = name.into();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(HeatgridError::InvalidCriteria(
                ErrorInfo::new("criterion-weight", "weight must be finite and strictly positive")
                    .with_context("criterion", name)
                    .with_context("weight", weight),
            ));
        }
        match &kind {
            CriterionKind::Proximity { radius_m, .. }
            | CriterionKind::Avoidance { radius_m, .. }
            | CriterionKind::Density { radius_m, .. }
                if !radius_m.is_finite() || *radius_m <= 0.0 =>
            {
                return Err(HeatgridError::InvalidCriteria(
                    ErrorInfo::new("criterion-radius", "radius_m must be finite and positive")
                        .with_context("criterion", name)
                        .with_context("radius_m", radius_m),
                ));
            }
            CriterionKind::Density { saturation: 0, .. } => {
                return Err(HeatgridError::InvalidCriteria(
                    ErrorInfo::new("criterion-saturation", "saturation must be at least 1")
                        .with_context("criterion", name),
                ));
            }
            CriterionKind::Constant { value } if !value.is_finite() => {
                return Err(HeatgridError::InvalidCriteria(
                    ErrorInfo::new("criterion-value", "constant value must be finite")
                        .with_context("criterion", name),
                ));
            }
            _ => {}
        }
        Ok(Self { name, weight, kind })
    }

    /// Name of the criterion.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Evaluation rule.
    pub fn kind(&self) -> &CriterionKind {
        &self.kind
    }

    /// Scores a coordinate in `[0, 1]`, ignoring the weight.
    pub fn evaluate(&self, point: &Coordinate) -> f64 {
        self.kind.evaluate(point)
    }
}

/// Named mapping from criterion name to [`Criterion`].
///
/// Iteration follows the lexical order of criterion names, independent of
/// the order criteria were supplied in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaSet {
    name: String,
    criteria: BTreeMap<String, Criterion>,
}

impl CriteriaSet {
    /// Builds a set, rejecting duplicate criterion names.
    pub fn new(
        name: impl Into<String>,
        criteria: impl IntoIterator<Item = Criterion>,
    ) -> Result<Self, HeatgridError> {
        let name = name.into();
        let mut map = BTreeMap::new();
        for criterion in criteria {
            let key = criterion.name.clone();
            if map.insert(key.clone(), criterion).is_some() {
                return Err(HeatgridError::InvalidCriteria(
                    ErrorInfo::new("criterion-duplicate", "criterion defined twice")
                        .with_context("set", name)
                        .with_context("criterion", key),
                ));
            }
        }
        Ok(Self {
            name,
            criteria: map,
        })
    }

    /// Resolves a serialized definition, loading dataset references through `datasets`.
    pub fn from_def<F>(def: CriteriaSetDef, mut datasets: F) -> Result<Self, HeatgridError>
    where
        F: FnMut(&str) -> Result<Vec<Coordinate>, HeatgridError>,
    {
        let mut criteria = Vec::with_capacity(def.criteria.len());
        for (name, criterion) in def.criteria {
            let kind = match criterion.rule {
                RuleDef::Proximity {
                    radius_m,
                    features,
                    dataset,
                } => CriterionKind::Proximity {
                    features: merge_features(features, dataset.as_deref(), &mut datasets)?,
                    radius_m,
                },
                RuleDef::Avoidance {
                    radius_m,
                    features,
                    dataset,
                } => CriterionKind::Avoidance {
                    features: merge_features(features, dataset.as_deref(), &mut datasets)?,
                    radius_m,
                },
                RuleDef::Density {
                    radius_m,
                    saturation,
                    features,
                    dataset,
                } => CriterionKind::Density {
                    features: merge_features(features, dataset.as_deref(), &mut datasets)?,
                    radius_m,
                    saturation,
                },
                RuleDef::Constant { value } => CriterionKind::Constant { value },
            };
            criteria.push(Criterion::new(name, criterion.weight, kind)?);
        }
        Self::new(def.name, criteria)
    }

    /// Registry key of the set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Whether the set holds no criteria.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Looks up a criterion by name.
    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.criteria.get(name)
    }

    /// Criteria in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.values()
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.iter().map(Criterion::weight).sum()
    }
}

fn merge_features<F>(
    mut features: Vec<Coordinate>,
    dataset: Option<&str>,
    datasets: &mut F,
) -> Result<Vec<Coordinate>, HeatgridError>
where
    F: FnMut(&str) -> Result<Vec<Coordinate>, HeatgridError>,
{
    if let Some(name) = dataset {
        features.extend(datasets(name)?);
    }
    Ok(features)
}

/// Immutable lookup table of criteria sets, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CriteriaRegistry {
    sets: BTreeMap<String, Arc<CriteriaSet>>,
}

impl CriteriaRegistry {
    /// Builds a registry, rejecting duplicate set names.
    pub fn new(sets: impl IntoIterator<Item = CriteriaSet>) -> Result<Self, HeatgridError> {
        let mut map = BTreeMap::new();
        for set in sets {
            let name = set.name.clone();
            if map.insert(name.clone(), Arc::new(set)).is_some() {
                return Err(HeatgridError::InvalidCriteria(
                    ErrorInfo::new("criteria-duplicate", "criteria set defined twice")
                        .with_context("set", name),
                ));
            }
        }
        Ok(Self { sets: map })
    }

    /// Looks up a set by name.
    pub fn get(&self, name: &str) -> Result<Arc<CriteriaSet>, HeatgridError> {
        self.sets.get(name).cloned().ok_or_else(|| {
            HeatgridError::CriteriaNotFound(
                ErrorInfo::new("criteria-missing", "no criteria set with this name")
                    .with_context("criteria", name)
                    .with_hint(format!("known sets: {}", self.names().join(", "))),
            )
        })
    }

    /// Set names in lexical order.
    pub fn names(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    /// Sets in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CriteriaSet>> {
        self.sets.values()
    }

    /// Number of registered sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no set is registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
