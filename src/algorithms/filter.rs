//! Turns raw predictions into a recommendation list.
//!
//! The policy is a chain of small steps: [`exclude_rated`] drops what the
//! user already rated, [`above_threshold`] keeps estimates strictly above the
//! cut, [`rank`] orders the survivors, and [`Outcome`] decides between the
//! ranked list and the caller's fallback.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use super::{PredictionVector, RatingPredictor};

/// Removes every item present in `rated`, whatever its predicted value.
pub fn exclude_rated<I, R>(
    mut predictions: PredictionVector<I>,
    rated: &HashMap<I, R>,
) -> PredictionVector<I>
where
    I: Eq + Hash,
{
    predictions.retain(|item, _| !rated.contains_key(item));
    predictions
}

/// Items whose score is strictly greater than `threshold`. Items without a
/// prediction basis never pass.
pub fn above_threshold<I>(predictions: &PredictionVector<I>, threshold: f64) -> Vec<(I, f64)>
where
    I: Copy,
{
    predictions
        .iter()
        .filter_map(|(item, prediction)| prediction.score().map(|score| (*item, score)))
        .filter(|(_, score)| *score > threshold)
        .collect()
}

/// Sorts by descending score, breaking ties by ascending item id.
pub fn rank<I>(mut scored: Vec<(I, f64)>) -> Vec<(I, f64)>
where
    I: Ord,
{
    scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    scored
}

/// Result of one recommendation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<I> {
    Predicted(Vec<(I, f64)>),
    Fallback(Vec<I>),
}

impl<I> Outcome<I> {
    pub fn or_fallback(ranked: Vec<(I, f64)>, fallback: &[I]) -> Self
    where
        I: Clone,
    {
        if ranked.is_empty() {
            Outcome::Fallback(fallback.to_vec())
        } else {
            Outcome::Predicted(ranked)
        }
    }

    pub fn into_items(self) -> Vec<I> {
        match self {
            Outcome::Predicted(ranked) => ranked.into_iter().map(|(item, _)| item).collect(),
            Outcome::Fallback(items) => items,
        }
    }
}

/// Recommendation policy layered on a [`RatingPredictor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationFilter<P> {
    predictor: P,
}

impl<P> RecommendationFilter<P> {
    pub fn new(predictor: P) -> Self {
        Self { predictor }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Predictions for every item the target has not rated yet.
    pub fn filtered_predict<U, I, R>(
        &self,
        matrix: &HashMap<U, HashMap<I, R>>,
        target: &U,
    ) -> PredictionVector<I>
    where
        P: RatingPredictor<U, I, R>,
        U: Eq + Hash,
        I: Eq + Hash,
    {
        let predictions = self.predictor.predict(matrix, target);
        match matrix.get(target) {
            Some(rated) => exclude_rated(predictions, rated),
            None => predictions,
        }
    }

    pub fn evaluate<U, I, R>(
        &self,
        matrix: &HashMap<U, HashMap<I, R>>,
        target: &U,
        threshold: f64,
        fallback: &[I],
    ) -> Outcome<I>
    where
        P: RatingPredictor<U, I, R>,
        U: Eq + Hash,
        I: Eq + Hash + Ord + Copy,
    {
        let has_ratings = matrix.get(target).is_some_and(|rated| !rated.is_empty());
        if !has_ratings {
            return Outcome::Fallback(fallback.to_vec());
        }

        let candidates = self.filtered_predict(matrix, target);
        let ranked = rank(above_threshold(&candidates, threshold));
        Outcome::or_fallback(ranked, fallback)
    }

    /// Ranked items predicted strictly above `threshold`, or `fallback`
    /// unchanged when the target rated nothing or nothing qualifies.
    pub fn recommend<U, I, R>(
        &self,
        matrix: &HashMap<U, HashMap<I, R>>,
        target: &U,
        threshold: f64,
        fallback: &[I],
    ) -> Vec<I>
    where
        P: RatingPredictor<U, I, R>,
        U: Eq + Hash,
        I: Eq + Hash + Ord + Copy,
    {
        self.evaluate(matrix, target, threshold, fallback).into_items()
    }
}
