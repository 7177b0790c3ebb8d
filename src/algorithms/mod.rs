pub mod filter;
pub mod slope_one;
pub mod sparse;

pub use filter::{Outcome, RecommendationFilter};
pub use slope_one::{Deviations, SlopeOne};
pub use sparse::SparseMatrix;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Score reported for [`Prediction::NoBasis`] by [`Prediction::legacy_score`].
pub const LEGACY_NO_BASIS: f64 = -1.0;

/// Predicted rating of one item for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "score", rename_all = "snake_case")]
pub enum Prediction {
    /// The user already rated the item; this is that rating, unchanged.
    Known(f64),
    /// Weighted slope-one estimate.
    Estimated(f64),
    /// None of the user's rated items was co-rated with this item.
    NoBasis,
}

impl Prediction {
    pub fn score(&self) -> Option<f64> {
        match *self {
            Prediction::Known(score) | Prediction::Estimated(score) => Some(score),
            Prediction::NoBasis => None,
        }
    }

    pub fn has_basis(&self) -> bool {
        !matches!(self, Prediction::NoBasis)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Prediction::Known(_))
    }

    /// Flat score with `-1.0` standing in for "no basis".
    pub fn legacy_score(&self) -> f64 {
        self.score().unwrap_or(LEGACY_NO_BASIS)
    }
}

pub type PredictionVector<I> = HashMap<I, Prediction>;

/// Predicts every item of a rating matrix for one target user.
///
/// Implementations are pure: they must not retain or mutate the matrix and
/// must return a (possibly degenerate) result for any input.
pub trait RatingPredictor<U, I, R>: Send + Sync {
    fn predict(&self, matrix: &HashMap<U, HashMap<I, R>>, target: &U) -> PredictionVector<I>;
}
