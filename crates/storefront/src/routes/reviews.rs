//! Review route handlers (HTMX fragments).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use vale_acai_core::ProductId;

use crate::db::ReviewRepository;
use crate::error::Result;
use crate::filters;
use crate::models::review::NewReview;
use crate::routes::products::ReviewView;
use crate::state::AppState;

/// Review list fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/reviews_list.html")]
pub struct ReviewsListTemplate {
    pub product_id: i32,
    pub reviews: Vec<ReviewView>,
    pub error: Option<String>,
}

/// Review submission form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub author: String,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Review list fragment (HTMX).
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ReviewsListTemplate> {
    let product_id = ProductId::new(id);
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;

    Ok(ReviewsListTemplate {
        product_id: id,
        reviews: reviews.iter().map(ReviewView::from).collect(),
        error: None,
    })
}

/// Submit a review and return the refreshed list (HTMX).
///
/// Validation failures render inline and leave the stored reviews untouched.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let product_id = ProductId::new(id);
    let repository = ReviewRepository::new(state.pool());

    let review = match NewReview::parse(product_id, &form.author, form.rating, form.comment.as_deref())
    {
        Ok(review) => review,
        Err(e) => {
            let reviews = repository.list_for_product(product_id).await?;
            return Ok(ReviewsListTemplate {
                product_id: id,
                reviews: reviews.iter().map(ReviewView::from).collect(),
                error: Some(e.to_string()),
            }
            .into_response());
        }
    };

    repository.create(&review).await?;
    let reviews = repository.list_for_product(product_id).await?;

    Ok(ReviewsListTemplate {
        product_id: id,
        reviews: reviews.iter().map(ReviewView::from).collect(),
        error: None,
    }
    .into_response())
}
