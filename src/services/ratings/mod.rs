use crate::config::RatingsConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::validation::validate_film_rating;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Supplies the rating matrix the engine consumes.
#[async_trait]
pub trait RatingSource: Send + Sync {
    /// A consistent copy of every user's ratings. Callers own the result.
    async fn snapshot(&self) -> AppResult<RatingMatrix>;

    async fn contains_user(&self, user_id: UserId) -> AppResult<bool>;

    /// Snapshot with at most `cap` ratings per user (0 = no cap). `exempt`
    /// keeps all of its ratings.
    async fn snapshot_capped(&self, cap: usize, exempt: UserId) -> AppResult<RatingMatrix> {
        let mut matrix = self.snapshot().await?;
        crate::utils::cap_ratings(&mut matrix, cap, Some(&exempt));
        Ok(matrix)
    }
}

/// Supplies the list offered when nothing can be predicted.
#[async_trait]
pub trait TopItemsSource: Send + Sync {
    async fn top_items(&self, count: usize) -> AppResult<Vec<FilmId>>;
}

/// In-process rating storage: users, films and their 1..=10 ratings.
pub struct InMemoryRatingStore {
    bounds: RatingsConfig,
    users: RwLock<HashSet<UserId>>,
    films: RwLock<HashSet<FilmId>>,
    ratings: RwLock<HashMap<UserId, HashMap<FilmId, FilmRating>>>,
}

impl InMemoryRatingStore {
    pub fn new(bounds: RatingsConfig) -> Self {
        Self {
            bounds,
            users: RwLock::new(HashSet::new()),
            films: RwLock::new(HashSet::new()),
            ratings: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_user(&self, user_id: UserId) -> bool {
        self.users.write().insert(user_id)
    }

    pub fn add_film(&self, film_id: FilmId) -> bool {
        self.films.write().insert(film_id)
    }

    pub fn has_user(&self, user_id: UserId) -> bool {
        self.users.read().contains(&user_id)
    }

    pub fn has_film(&self, film_id: FilmId) -> bool {
        self.films.read().contains(&film_id)
    }

    /// Stores a rating, replacing any earlier rating of the same film by the
    /// same user. Returns the replaced rating.
    pub fn rate(&self, film_rating: FilmRating) -> AppResult<Option<Rating>> {
        validate_film_rating(&film_rating, &self.bounds)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        if !self.has_user(film_rating.user_id) {
            return Err(AppError::NotFound(format!("user {}", film_rating.user_id)));
        }
        if !self.has_film(film_rating.film_id) {
            return Err(AppError::NotFound(format!("film {}", film_rating.film_id)));
        }

        debug!(
            "Adding rate {} to film {} from user {}",
            film_rating.rating, film_rating.film_id, film_rating.user_id
        );

        let previous = self
            .ratings
            .write()
            .entry(film_rating.user_id)
            .or_default()
            .insert(film_rating.film_id, film_rating);

        Ok(previous.map(|r| r.rating))
    }

    pub fn remove_rating(&self, user_id: UserId, film_id: FilmId) -> AppResult<Rating> {
        let mut ratings = self.ratings.write();
        let removed = ratings
            .get_mut(&user_id)
            .and_then(|films| films.remove(&film_id))
            .ok_or_else(|| {
                AppError::NotFound(format!("rating of film {} by user {}", film_id, user_id))
            })?;

        if ratings.get(&user_id).is_some_and(HashMap::is_empty) {
            ratings.remove(&user_id);
        }

        debug!("Removed rate of film {} from user {}", film_id, user_id);
        Ok(removed.rating)
    }

    pub fn user_ratings(&self, user_id: UserId) -> HashMap<FilmId, Rating> {
        self.ratings
            .read()
            .get(&user_id)
            .map(|films| films.iter().map(|(film, r)| (*film, r.rating)).collect())
            .unwrap_or_default()
    }

    pub fn film_stats(&self, film_id: FilmId) -> AppResult<FilmStats> {
        if !self.has_film(film_id) {
            return Err(AppError::NotFound(format!("film {}", film_id)));
        }
        Ok(self.collect_stats().remove(&film_id).unwrap_or(FilmStats {
            film_id,
            mean_rating: None,
            rating_count: 0,
        }))
    }

    /// Registers every user and film of `matrix` and stores its ratings.
    pub fn import(&self, matrix: &RatingMatrix) -> AppResult<usize> {
        crate::utils::validation::validate_rating_matrix(matrix, &self.bounds)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let mut imported = 0;
        for (&user_id, films) in matrix {
            self.add_user(user_id);
            for (&film_id, &rating) in films {
                self.add_film(film_id);
                self.rate(FilmRating::new(user_id, film_id, rating))?;
                imported += 1;
            }
        }

        info!("Imported {} ratings from {} users", imported, matrix.len());
        Ok(imported)
    }

    fn collect_stats(&self) -> HashMap<FilmId, FilmStats> {
        let mut sums: HashMap<FilmId, (i64, usize)> = HashMap::new();
        for films in self.ratings.read().values() {
            for (film_id, r) in films {
                let entry = sums.entry(*film_id).or_default();
                entry.0 += i64::from(r.rating);
                entry.1 += 1;
            }
        }

        sums.into_iter()
            .map(|(film_id, (sum, count))| {
                let stats = FilmStats {
                    film_id,
                    mean_rating: Some(sum as f64 / count as f64),
                    rating_count: count,
                };
                (film_id, stats)
            })
            .collect()
    }
}

#[async_trait]
impl RatingSource for InMemoryRatingStore {
    async fn snapshot(&self) -> AppResult<RatingMatrix> {
        let ratings = self.ratings.read();
        Ok(ratings
            .iter()
            .map(|(user, films)| (*user, films.iter().map(|(film, r)| (*film, r.rating)).collect()))
            .collect())
    }

    async fn contains_user(&self, user_id: UserId) -> AppResult<bool> {
        Ok(self.has_user(user_id))
    }

    /// Keeps each user's most recent ratings.
    async fn snapshot_capped(&self, cap: usize, exempt: UserId) -> AppResult<RatingMatrix> {
        if cap == 0 {
            return self.snapshot().await;
        }

        let ratings = self.ratings.read();
        let mut matrix = RatingMatrix::with_capacity(ratings.len());
        for (&user_id, films) in ratings.iter() {
            let mut rows: Vec<&FilmRating> = films.values().collect();
            if user_id != exempt && rows.len() > cap {
                rows.sort_by(|a, b| b.rated_at.cmp(&a.rated_at).then(a.film_id.cmp(&b.film_id)));
                rows.truncate(cap);
            }
            matrix.insert(user_id, rows.into_iter().map(|r| (r.film_id, r.rating)).collect());
        }
        Ok(matrix)
    }
}

#[async_trait]
impl TopItemsSource for InMemoryRatingStore {
    /// Films by mean rating, then by number of ratings, then by id. Films
    /// nobody rated come last.
    async fn top_items(&self, count: usize) -> AppResult<Vec<FilmId>> {
        let stats = self.collect_stats();
        let mut films: Vec<FilmStats> = self
            .films
            .read()
            .iter()
            .map(|&film_id| {
                stats.get(&film_id).cloned().unwrap_or(FilmStats {
                    film_id,
                    mean_rating: None,
                    rating_count: 0,
                })
            })
            .collect();

        films.sort_by(|a, b| {
            let by_mean = match (a.mean_rating, b.mean_rating) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_mean
                .then(b.rating_count.cmp(&a.rating_count))
                .then(a.film_id.cmp(&b.film_id))
        });

        Ok(films.into_iter().take(count).map(|s| s.film_id).collect())
    }
}
