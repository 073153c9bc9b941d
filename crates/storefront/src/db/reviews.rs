//! Review repository for database operations.
//!
//! Queries use the runtime `sqlx` API so builds never need a live database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vale_acai_core::{ProductId, ReviewId};

use super::RepositoryError;
use crate::models::review::{MAX_RATING, MIN_RATING, NewReview, Review};

/// Row shape for the `reviews` table.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    author: String,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Result<Review, RepositoryError> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(RepositoryError::DataCorruption(format!(
                "review {} has rating {} outside {MIN_RATING}..={MAX_RATING}",
                self.id, self.rating
            )));
        }

        Ok(Review {
            id: ReviewId::new(self.id),
            product_id: ProductId::new(self.product_id),
            author: self.author,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an out-of-range stored rating.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r"
            SELECT id, product_id, author, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ReviewRow::into_review).collect()
    }

    /// Average rating for a product, if it has any reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn average_rating(
        &self,
        product_id: ProductId,
    ) -> Result<Option<f64>, RepositoryError> {
        let average: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating)::float8 FROM reviews WHERE product_id = $1")
                .bind(product_id.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(average)
    }

    /// Insert a validated review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(
            r"
            INSERT INTO reviews (product_id, author, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, author, rating, comment, created_at
            ",
        )
        .bind(review.product_id.as_i32())
        .bind(&review.author)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(self.pool)
        .await?;

        row.into_review()
    }
}
