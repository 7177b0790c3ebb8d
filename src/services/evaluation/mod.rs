//! Offline hold-out evaluation of a predictor against known ratings.
//!
//! Each eligible user gets their `holdout` highest-id ratings hidden, the
//! predictor runs on the remaining matrix, and the hidden ratings are
//! compared with what it produced. Users are evaluated in parallel; every
//! user works on its own copy of the matrix.

use crate::algorithms::{RatingPredictor, RecommendationFilter};
use crate::models::*;
use crate::utils::metrics::{ErrorMetrics, MetricsCalculator, RecommendationMetrics};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Score a hidden rating must exceed to count as relevant, and the
    /// recommendation threshold.
    pub threshold: f64,
    pub k: usize,
    pub holdout: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            k: 10,
            holdout: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub users_evaluated: usize,
    pub ratings_held_out: usize,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub coverage: f64,
    /// Averaged over users with at least one relevant hidden rating.
    pub ranking: RecommendationMetrics,
    pub ranked_users: usize,
}

struct UserEvaluation {
    errors: ErrorMetrics,
    ranking: Option<RecommendationMetrics>,
}

pub struct Evaluator<P> {
    filter: RecommendationFilter<P>,
    settings: EvaluationSettings,
    calculator: MetricsCalculator,
}

impl<P> Evaluator<P>
where
    P: RatingPredictor<UserId, FilmId, Rating>,
{
    pub fn new(predictor: P, settings: EvaluationSettings) -> Self {
        Self {
            filter: RecommendationFilter::new(predictor),
            calculator: MetricsCalculator::new(settings.k),
            settings,
        }
    }

    pub fn evaluate(&self, matrix: &RatingMatrix) -> EvaluationReport {
        let holdout = self.settings.holdout.max(1);
        let mut users: Vec<UserId> = matrix
            .iter()
            .filter(|(_, films)| films.len() > holdout)
            .map(|(user, _)| *user)
            .collect();
        users.sort_unstable();

        info!("Evaluating {} of {} users", users.len(), matrix.len());

        let results: Vec<UserEvaluation> = users
            .par_iter()
            .map(|user| self.evaluate_user(matrix, *user, holdout))
            .collect();

        let ranked: Vec<&RecommendationMetrics> =
            results.iter().filter_map(|r| r.ranking.as_ref()).collect();
        let ranking = average(&ranked);
        let ranked_users = ranked.len();

        let errors = results
            .into_iter()
            .fold(ErrorMetrics::new(), |acc, r| acc.merge(r.errors));

        EvaluationReport {
            users_evaluated: users.len(),
            ratings_held_out: errors.predicted + errors.unpredictable,
            mae: errors.mae(),
            rmse: errors.rmse(),
            coverage: errors.coverage(),
            ranking,
            ranked_users,
        }
    }

    fn evaluate_user(&self, matrix: &RatingMatrix, user: UserId, holdout: usize) -> UserEvaluation {
        let own = &matrix[&user];
        let mut films: Vec<FilmId> = own.keys().copied().collect();
        films.sort_unstable();
        let hidden: HashMap<FilmId, Rating> = films
            .split_off(films.len() - holdout)
            .into_iter()
            .map(|film| (film, own[&film]))
            .collect();

        let mut training = matrix.clone();
        if let Some(visible) = training.get_mut(&user) {
            visible.retain(|film, _| !hidden.contains_key(film));
        }

        let predictions = self.filter.predictor().predict(&training, &user);
        let mut errors = ErrorMetrics::new();
        for (film, &actual) in &hidden {
            let predicted = predictions.get(film).and_then(|p| p.score());
            errors.record(predicted, f64::from(actual));
        }

        let relevant: Vec<FilmId> = hidden
            .iter()
            .filter(|(_, &rating)| f64::from(rating) > self.settings.threshold)
            .map(|(film, _)| *film)
            .collect();
        let ranking = if relevant.is_empty() {
            None
        } else {
            let recommended = self
                .filter
                .recommend(&training, &user, self.settings.threshold, &[]);
            let relevance: HashMap<FilmId, f64> = hidden
                .iter()
                .map(|(film, &rating)| (*film, f64::from(rating)))
                .collect();
            Some(self.calculator.calculate_all(&recommended, &relevant, &relevance))
        };

        UserEvaluation { errors, ranking }
    }
}

fn average(metrics: &[&RecommendationMetrics]) -> RecommendationMetrics {
    if metrics.is_empty() {
        return RecommendationMetrics::default();
    }
    let n = metrics.len() as f64;
    RecommendationMetrics {
        precision_at_k: metrics.iter().map(|m| m.precision_at_k).sum::<f64>() / n,
        recall_at_k: metrics.iter().map(|m| m.recall_at_k).sum::<f64>() / n,
        f1_score: metrics.iter().map(|m| m.f1_score).sum::<f64>() / n,
        ndcg_at_k: metrics.iter().map(|m| m.ndcg_at_k).sum::<f64>() / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::SlopeOne;

    #[test]
    fn test_evaluate_consistent_offsets() {
        // film 2 is always rated exactly 2 below film 1
        let matrix: RatingMatrix = HashMap::from([
            (1, HashMap::from([(1, 9), (2, 7)])),
            (2, HashMap::from([(1, 8), (2, 6)])),
            (3, HashMap::from([(1, 6), (2, 4)])),
        ]);

        let report = Evaluator::new(SlopeOne, EvaluationSettings::default()).evaluate(&matrix);

        assert_eq!(report.users_evaluated, 3);
        assert_eq!(report.ratings_held_out, 3);
        assert!(report.mae.unwrap() < 1e-9);
        assert!((report.coverage - 1.0).abs() < 1e-9);
        // hidden film 2 ratings 7 and 6 are relevant and recommended first
        assert_eq!(report.ranked_users, 2);
        assert!((report.ranking.recall_at_k - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_users_with_too_few_ratings_are_skipped() {
        let matrix: RatingMatrix = HashMap::from([
            (1, HashMap::from([(1, 9)])),
            (2, HashMap::new()),
        ]);

        let report = Evaluator::new(SlopeOne, EvaluationSettings::default()).evaluate(&matrix);
        assert_eq!(report.users_evaluated, 0);
        assert_eq!(report.mae, None);
        assert_eq!(report.coverage, 0.0);
    }

    #[test]
    fn test_unconnected_hidden_rating_lowers_coverage() {
        let matrix: RatingMatrix = HashMap::from([
            (1, HashMap::from([(1, 9), (2, 7)])),
            (2, HashMap::from([(1, 8), (2, 6)])),
            (3, HashMap::from([(1, 5), (3, 4)])),
        ]);

        let report = Evaluator::new(SlopeOne, EvaluationSettings::default()).evaluate(&matrix);
        assert_eq!(report.users_evaluated, 3);
        // user 3's hidden film 3 is rated by nobody else
        assert!((report.coverage - 2.0 / 3.0).abs() < 1e-9);
    }
}
