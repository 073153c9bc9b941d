//! Product review models.
//!
//! Reviews are the one thing this storefront persists locally; the delivery
//! API has no review endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vale_acai_core::{ProductId, ReviewId};

/// Lowest accepted rating.
pub const MIN_RATING: i16 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i16 = 5;
/// Upper bound on comment length.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// A stored product review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author: String,
    /// Star rating, 1-5.
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validation failures for a submitted review.
#[derive(Debug, Error)]
pub enum ReviewValidationError {
    #[error("informe seu nome")]
    EmptyAuthor,
    #[error("a nota deve estar entre {MIN_RATING} e {MAX_RATING}")]
    RatingOutOfRange,
    #[error("o comentário deve ter no máximo {MAX_COMMENT_LENGTH} caracteres")]
    CommentTooLong,
}

/// A review as submitted through the form, validated before insertion.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub author: String,
    pub rating: i16,
    pub comment: Option<String>,
}

impl NewReview {
    /// Validate form input into an insertable review.
    ///
    /// Blank comments collapse to `None`; author names are trimmed.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewValidationError`] describing the first failed check.
    pub fn parse(
        product_id: ProductId,
        author: &str,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Self, ReviewValidationError> {
        let author = author.trim();
        if author.is_empty() {
            return Err(ReviewValidationError::EmptyAuthor);
        }

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewValidationError::RatingOutOfRange);
        }

        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);
        if let Some(ref c) = comment
            && c.chars().count() > MAX_COMMENT_LENGTH
        {
            return Err(ReviewValidationError::CommentTooLong);
        }

        Ok(Self {
            product_id,
            author: author.to_string(),
            rating,
            comment,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let review =
            NewReview::parse(ProductId::new(3), "  Ana  ", 5, Some("Muito bom!")).unwrap();
        assert_eq!(review.author, "Ana");
        assert_eq!(review.rating, 5);
        assert_eq!(review.comment.as_deref(), Some("Muito bom!"));
    }

    #[test]
    fn test_parse_blank_comment_collapses() {
        let review = NewReview::parse(ProductId::new(3), "Ana", 4, Some("   ")).unwrap();
        assert!(review.comment.is_none());
    }

    #[test]
    fn test_parse_empty_author() {
        assert!(matches!(
            NewReview::parse(ProductId::new(3), "   ", 4, None),
            Err(ReviewValidationError::EmptyAuthor)
        ));
    }

    #[test]
    fn test_parse_rating_out_of_range() {
        assert!(matches!(
            NewReview::parse(ProductId::new(3), "Ana", 0, None),
            Err(ReviewValidationError::RatingOutOfRange)
        ));
        assert!(matches!(
            NewReview::parse(ProductId::new(3), "Ana", 6, None),
            Err(ReviewValidationError::RatingOutOfRange)
        ));
    }

    #[test]
    fn test_parse_comment_too_long() {
        let long = "a".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(matches!(
            NewReview::parse(ProductId::new(3), "Ana", 4, Some(&long)),
            Err(ReviewValidationError::CommentTooLong)
        ));
    }
}
