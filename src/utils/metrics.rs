use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::FilmId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub f1_score: f64,
    pub ndcg_at_k: f64,
}

#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    k: usize,
}

impl MetricsCalculator {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn calculate_precision_at_k(&self, recommended: &[FilmId], relevant: &[FilmId]) -> f64 {
        if recommended.is_empty() || self.k == 0 {
            return 0.0;
        }

        let relevant_set: HashSet<_> = relevant.iter().collect();
        let hits = recommended
            .iter()
            .take(self.k)
            .filter(|item| relevant_set.contains(item))
            .count();

        hits as f64 / self.k.min(recommended.len()) as f64
    }

    pub fn calculate_recall_at_k(&self, recommended: &[FilmId], relevant: &[FilmId]) -> f64 {
        if relevant.is_empty() {
            return 0.0;
        }

        let relevant_set: HashSet<_> = relevant.iter().collect();
        let hits = recommended
            .iter()
            .take(self.k)
            .filter(|item| relevant_set.contains(item))
            .count();

        hits as f64 / relevant.len() as f64
    }

    pub fn calculate_f1_score(&self, precision: f64, recall: f64) -> f64 {
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    pub fn calculate_ndcg_at_k(
        &self,
        recommended: &[FilmId],
        relevance: &HashMap<FilmId, f64>,
    ) -> f64 {
        let dcg = self.calculate_dcg(recommended, relevance);
        let idcg = self.calculate_ideal_dcg(relevance);

        if idcg == 0.0 {
            0.0
        } else {
            dcg / idcg
        }
    }

    // Rank 1 is discounted by log2(2).
    fn calculate_dcg(&self, recommended: &[FilmId], relevance: &HashMap<FilmId, f64>) -> f64 {
        recommended
            .iter()
            .take(self.k)
            .enumerate()
            .map(|(i, item)| {
                let gain = relevance.get(item).copied().unwrap_or(0.0);
                gain / ((i + 2) as f64).log2()
            })
            .sum()
    }

    fn calculate_ideal_dcg(&self, relevance: &HashMap<FilmId, f64>) -> f64 {
        let mut gains: Vec<f64> = relevance.values().copied().collect();
        gains.sort_by(|a, b| b.total_cmp(a));

        gains
            .iter()
            .take(self.k)
            .enumerate()
            .map(|(i, gain)| gain / ((i + 2) as f64).log2())
            .sum()
    }

    pub fn calculate_all(
        &self,
        recommended: &[FilmId],
        relevant: &[FilmId],
        relevance: &HashMap<FilmId, f64>,
    ) -> RecommendationMetrics {
        let precision = self.calculate_precision_at_k(recommended, relevant);
        let recall = self.calculate_recall_at_k(recommended, relevant);

        RecommendationMetrics {
            precision_at_k: precision,
            recall_at_k: recall,
            f1_score: self.calculate_f1_score(precision, recall),
            ndcg_at_k: self.calculate_ndcg_at_k(recommended, relevance),
        }
    }
}

/// Running accuracy of predicted against actual ratings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub predicted: usize,
    pub unpredictable: usize,
    absolute_error: f64,
    squared_error: f64,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, predicted: Option<f64>, actual: f64) {
        match predicted {
            Some(predicted) => {
                let error = predicted - actual;
                self.absolute_error += error.abs();
                self.squared_error += error * error;
                self.predicted += 1;
            }
            None => self.unpredictable += 1,
        }
    }

    pub fn merge(mut self, other: ErrorMetrics) -> Self {
        self.predicted += other.predicted;
        self.unpredictable += other.unpredictable;
        self.absolute_error += other.absolute_error;
        self.squared_error += other.squared_error;
        self
    }

    pub fn mae(&self) -> Option<f64> {
        (self.predicted > 0).then(|| self.absolute_error / self.predicted as f64)
    }

    pub fn rmse(&self) -> Option<f64> {
        (self.predicted > 0).then(|| (self.squared_error / self.predicted as f64).sqrt())
    }

    /// Share of attempted predictions that had a basis.
    pub fn coverage(&self) -> f64 {
        let total = self.predicted + self.unpredictable;
        if total == 0 {
            0.0
        } else {
            self.predicted as f64 / total as f64
        }
    }
}
