//! Top-N consolidation with a synthetic "Other" bucket.

use serde::{Deserialize, Serialize};

/// Number of entities kept individually by the pie, bar, scatter and line charts.
pub const DEFAULT_TOP_N: usize = 7;

/// Display name of the consolidated bucket.
pub const OTHER_LABEL: &str = "Other";

/// A named total, as delivered by the project and subproject tally endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTotal {
    pub name: String,
    pub total_time: f64,
}

impl EntityTotal {
    pub fn new(name: impl Into<String>, total_time: f64) -> Self {
        Self {
            name: name.into(),
            total_time,
        }
    }
}

/// An entry of a consolidated ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "RankedRecord")]
pub enum Ranked {
    Entity(EntityTotal),
    /// Everything past the top N, summed.
    Other { total_time: f64, merged_count: usize },
}

impl Ranked {
    pub fn name(&self) -> &str {
        match self {
            Self::Entity(entity) => &entity.name,
            Self::Other { .. } => OTHER_LABEL,
        }
    }

    pub const fn total_time(&self) -> f64 {
        match self {
            Self::Entity(entity) => entity.total_time,
            Self::Other { total_time, .. } => *total_time,
        }
    }

    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other { .. })
    }
}

/// Flat wire form of [`Ranked`].
#[derive(Debug, Clone, PartialEq, Serialize)]
struct RankedRecord {
    name: String,
    total_time: f64,
    is_other: bool,
    merged_count: usize,
}

impl From<Ranked> for RankedRecord {
    fn from(ranked: Ranked) -> Self {
        match ranked {
            Ranked::Entity(entity) => Self {
                name: entity.name,
                total_time: entity.total_time,
                is_other: false,
                merged_count: 0,
            },
            Ranked::Other {
                total_time,
                merged_count,
            } => Self {
                name: OTHER_LABEL.to_string(),
                total_time,
                is_other: true,
                merged_count,
            },
        }
    }
}

/// Splits `items` into the `n` largest by `weight` and the remainder.
///
/// The sort is stable, so ties keep their input order.
pub(crate) fn split_top_n<T>(mut items: Vec<T>, n: usize, weight: impl Fn(&T) -> f64) -> (Vec<T>, Vec<T>) {
    items.sort_by(|a, b| weight(b).total_cmp(&weight(a)));
    let rest = items.split_off(n.min(items.len()));
    (items, rest)
}

/// Keeps the `n` largest entities and merges the rest into one "Other" entry.
///
/// When there are at most `n` entities they come back untouched, in their
/// original order. Otherwise the result is the top `n` by `total_time`
/// descending, followed by the "Other" entry regardless of its size.
pub fn consolidate_top_n(entities: Vec<EntityTotal>, n: usize) -> Vec<Ranked> {
    if entities.len() <= n {
        return entities.into_iter().map(Ranked::Entity).collect();
    }

    let (kept, rest) = split_top_n(entities, n, |e| e.total_time);
    let other = Ranked::Other {
        total_time: rest.iter().map(|e| e.total_time).sum(),
        merged_count: rest.len(),
    };

    tracing::debug!(kept = kept.len(), merged = rest.len(), "consolidated top entities");

    kept.into_iter()
        .map(Ranked::Entity)
        .chain(std::iter::once(other))
        .collect()
}
