//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::routes::products::{ProductView, catalog_order};
use crate::state::AppState;

/// Number of products highlighted on the home page.
const FEATURED_COUNT: usize = 3;

/// Hero section content (static).
#[derive(Clone)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub button_url: String,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            title: "Açaí batido na hora".to_string(),
            subtitle: "Da tigela clássica ao copo montado do seu jeito, entregue em Ubatuba."
                .to_string(),
            button_text: "Ver cardápio".to_string(),
            button_url: "/produtos".to_string(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub hero: Hero,
    pub featured: Vec<ProductView>,
}

/// Display home page.
///
/// A catalog failure degrades to an empty featured section rather than an
/// error page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let featured = match state.api().list_products().await {
        Ok(products) => {
            let mut ordered = catalog_order(&products);
            ordered.retain(|p| p.available);
            ordered.truncate(FEATURED_COUNT);
            ordered
        }
        Err(e) => {
            tracing::warn!("failed to load catalog for home page: {e}");
            Vec::new()
        }
    };

    HomeTemplate {
        hero: Hero::default(),
        featured,
    }
}
