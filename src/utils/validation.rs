use crate::config::RatingsConfig;
use crate::models::*;
use anyhow::{anyhow, Result};

pub const MAX_RECOMMENDATIONS: usize = 1000;

pub fn validate_rating(rating: Rating, bounds: &RatingsConfig) -> Result<()> {
    if !bounds.contains(rating) {
        return Err(anyhow!(
            "Rating {} is outside the allowed range {}..={}",
            rating,
            bounds.min_rating,
            bounds.max_rating
        ));
    }

    Ok(())
}

pub fn validate_film_rating(film_rating: &FilmRating, bounds: &RatingsConfig) -> Result<()> {
    if film_rating.user_id <= 0 {
        return Err(anyhow!("User ID must be positive"));
    }

    if film_rating.film_id <= 0 {
        return Err(anyhow!("Film ID must be positive"));
    }

    validate_rating(film_rating.rating, bounds)?;

    let max_future = chrono::Utc::now() + chrono::Duration::hours(1);
    if film_rating.rated_at > max_future {
        return Err(anyhow!("Rating timestamp cannot be more than 1 hour in the future"));
    }

    Ok(())
}

pub fn validate_recommendation_request(request: &RecommendationRequest) -> Result<()> {
    if request.user_id <= 0 {
        return Err(anyhow!("User ID must be positive"));
    }

    if request.count == 0 {
        return Err(anyhow!("Number of recommendations must be greater than 0"));
    }

    if request.count > MAX_RECOMMENDATIONS {
        return Err(anyhow!("Number of recommendations too large (max {})", MAX_RECOMMENDATIONS));
    }

    if let Some(threshold) = request.threshold {
        if !threshold.is_finite() {
            return Err(anyhow!("Threshold must be a finite number"));
        }
    }

    Ok(())
}

/// Checks every id and rating of an imported matrix and returns how many
/// ratings there were.
pub fn validate_rating_matrix(matrix: &RatingMatrix, bounds: &RatingsConfig) -> Result<usize> {
    let mut total = 0;
    for (user_id, ratings) in matrix {
        if *user_id <= 0 {
            return Err(anyhow!("User ID must be positive, got {}", user_id));
        }
        for (film_id, &rating) in ratings {
            if *film_id <= 0 {
                return Err(anyhow!("user {}: Film ID must be positive, got {}", user_id, film_id));
            }
            validate_rating(rating, bounds)
                .map_err(|e| anyhow!("user {} film {}: {}", user_id, film_id, e))?;
            total += 1;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn bounds() -> RatingsConfig {
        RatingsConfig {
            min_rating: 1,
            max_rating: 10,
        }
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1, &bounds()).is_ok());
        assert!(validate_rating(10, &bounds()).is_ok());
        assert!(validate_rating(0, &bounds()).is_err());
        assert!(validate_rating(11, &bounds()).is_err());
    }

    #[test]
    fn test_validate_film_rating() {
        assert!(validate_film_rating(&FilmRating::new(1, 2, 7), &bounds()).is_ok());
        assert!(validate_film_rating(&FilmRating::new(0, 2, 7), &bounds()).is_err());
        assert!(validate_film_rating(&FilmRating::new(1, -2, 7), &bounds()).is_err());

        let future = FilmRating::new(1, 2, 7).at(chrono::Utc::now() + chrono::Duration::days(1));
        assert!(validate_film_rating(&future, &bounds()).is_err());
    }

    #[test]
    fn test_validate_recommendation_request() {
        assert!(validate_recommendation_request(&RecommendationRequest::new(1, 10)).is_ok());
        assert!(validate_recommendation_request(&RecommendationRequest::new(1, 0)).is_err());
        assert!(validate_recommendation_request(&RecommendationRequest::new(1, 5000)).is_err());

        let nan = RecommendationRequest::new(1, 10).with_threshold(f64::NAN);
        assert!(validate_recommendation_request(&nan).is_err());
    }

    #[test]
    fn test_validate_rating_matrix() {
        let mut m: RatingMatrix = HashMap::new();
        m.insert(1, HashMap::from([(1, 5), (2, 9)]));
        m.insert(2, HashMap::new());
        assert_eq!(validate_rating_matrix(&m, &bounds()).unwrap(), 2);

        m.insert(3, HashMap::from([(1, 42)]));
        assert!(validate_rating_matrix(&m, &bounds()).is_err());
    }

    #[test]
    fn test_validate_rating_matrix_ids() {
        let bad_user: RatingMatrix = HashMap::from([(0, HashMap::from([(10, 5)]))]);
        assert!(validate_rating_matrix(&bad_user, &bounds()).is_err());

        let bad_film: RatingMatrix = HashMap::from([(1, HashMap::from([(-4, 5)]))]);
        assert!(validate_rating_matrix(&bad_film, &bounds()).is_err());

        // users without ratings still need a valid id
        let empty_bad_user: RatingMatrix = HashMap::from([(-1, HashMap::new())]);
        assert!(validate_rating_matrix(&empty_bad_user, &bounds()).is_err());
    }
}
