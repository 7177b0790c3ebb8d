//! Weighted slope-one collaborative filtering.
//!
//! For every pair of items (i, j) the average offset `rating(i) - rating(j)`
//! is learned from all users who rated both. A user's unknown rating of `k`
//! is then the average of `rating(j) + offset(k, j)` over the items `j` the
//! user did rate, weighted by how many users back each offset.

use std::collections::HashMap;
use std::hash::Hash;

use super::sparse::SparseMatrix;
use super::{Prediction, PredictionVector, RatingPredictor};

/// Average pairwise rating differences together with their support counts.
#[derive(Debug, Clone)]
pub struct Deviations<I> {
    differences: SparseMatrix<I, f64>,
    frequencies: SparseMatrix<I, u32>,
}

impl<I> Deviations<I>
where
    I: Eq + Hash + Copy,
{
    pub fn from_ratings<U, R>(matrix: &HashMap<U, HashMap<I, R>>) -> Self
    where
        R: Copy + Into<f64>,
    {
        let mut differences = SparseMatrix::new();
        let mut frequencies = SparseMatrix::new();

        // (i, i) is included on purpose: it gives every rated item a row.
        for ratings in matrix.values() {
            for (&i, &ri) in ratings {
                let ri: f64 = ri.into();
                for (&j, &rj) in ratings {
                    let rj: f64 = rj.into();
                    differences.accumulate(i, j, ri - rj);
                    frequencies.accumulate(i, j, 1u32);
                }
            }
        }

        differences.update_each(|i, j, sum| {
            if let Some(&count) = frequencies.get(i, j) {
                if count > 0 {
                    *sum /= f64::from(count);
                }
            }
        });

        Self {
            differences,
            frequencies,
        }
    }

    /// Mean of `rating(i) - rating(j)` over users who rated both.
    pub fn difference(&self, i: &I, j: &I) -> Option<f64> {
        self.differences.get(i, j).copied()
    }

    /// Number of users who rated both `i` and `j`.
    pub fn frequency(&self, i: &I, j: &I) -> u32 {
        self.frequencies.get(i, j).copied().unwrap_or(0)
    }

    pub fn items(&self) -> impl Iterator<Item = &I> {
        self.differences.row_keys()
    }

    pub fn item_count(&self) -> usize {
        self.differences.row_count()
    }

    pub fn pair_count(&self) -> usize {
        self.differences.len()
    }

    /// Predicts every known item for a user whose own ratings are `ratings`.
    pub fn predict_for<R>(&self, ratings: &HashMap<I, R>) -> PredictionVector<I>
    where
        R: Copy + Into<f64>,
    {
        let mut predictions = HashMap::with_capacity(self.differences.row_count());

        for (item, row) in self.differences.rows() {
            let prediction = match ratings.get(item) {
                Some(&own) => Prediction::Known(own.into()),
                None => self.estimate(item, row, ratings),
            };
            predictions.insert(*item, prediction);
        }

        predictions
    }

    fn estimate<R>(&self, item: &I, row: &HashMap<I, f64>, ratings: &HashMap<I, R>) -> Prediction
    where
        R: Copy + Into<f64>,
    {
        let mut weighted_sum = 0.0f64;
        let mut weight = 0u64;

        for (rated, &rating) in ratings {
            let Some(&difference) = row.get(rated) else {
                continue;
            };
            let frequency = self.frequency(item, rated);
            if frequency == 0 {
                continue;
            }
            let rating: f64 = rating.into();
            weighted_sum += (difference + rating) * f64::from(frequency);
            weight += u64::from(frequency);
        }

        if weight > 0 {
            Prediction::Estimated(weighted_sum / weight as f64)
        } else {
            Prediction::NoBasis
        }
    }
}

/// Stateless slope-one predictor. Each call builds and drops its own
/// [`Deviations`], so one instance may be shared across threads freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlopeOne;

impl SlopeOne {
    pub fn new() -> Self {
        Self
    }
}

impl<U, I, R> RatingPredictor<U, I, R> for SlopeOne
where
    U: Eq + Hash + Sync,
    I: Eq + Hash + Copy + Sync,
    R: Copy + Into<f64> + Sync,
{
    fn predict(&self, matrix: &HashMap<U, HashMap<I, R>>, target: &U) -> PredictionVector<I> {
        if matrix.is_empty() {
            return HashMap::new();
        }

        let deviations = Deviations::from_ratings(matrix);
        tracing::debug!(
            users = matrix.len(),
            items = deviations.item_count(),
            pairs = deviations.pair_count(),
            "slope-one deviations built"
        );

        match matrix.get(target) {
            Some(ratings) => deviations.predict_for(ratings),
            None => deviations.predict_for::<R>(&HashMap::new()),
        }
    }
}
