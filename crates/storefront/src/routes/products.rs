//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use vale_acai_core::ProductId;

use crate::api::types::Product;
use crate::db::ReviewRepository;
use crate::error::Result;
use crate::filters;
use crate::models::review::Review;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub image: Option<String>,
    pub variations: Vec<VariationView>,
    /// Lowest variation price, pre-formatted.
    pub price_from: String,
}

/// Variation display data for templates.
#[derive(Clone)]
pub struct VariationView {
    pub size_label: String,
    pub size_ml: u32,
    pub price: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let price_from = product
            .variacoes
            .iter()
            .map(|v| v.preco)
            .min()
            .unwrap_or_default();

        Self {
            id: product.produto_id.as_i32(),
            name: product.nome.clone(),
            description: product.descricao.clone(),
            available: product.disponivel,
            image: product.imagem.clone(),
            variations: product
                .variacoes
                .iter()
                .map(|v| VariationView {
                    size_label: v.tamanho.clone(),
                    size_ml: v.tamanho_ml,
                    price: v.preco.to_string(),
                })
                .collect(),
            price_from: price_from.to_string(),
        }
    }
}

/// Review display data for templates.
#[derive(Clone)]
pub struct ReviewView {
    pub author: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            author: review.author.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            date: review.created_at.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Catalog products in display order, available ones first.
pub fn catalog_order(products: &[Product]) -> Vec<ProductView> {
    let mut ordered: Vec<&Product> = products.iter().collect();
    ordered.sort_by_key(|p| (!p.disponivel, p.ordem));
    ordered.into_iter().map(ProductView::from).collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
}

/// Product detail page template.
///
/// The review list itself loads lazily as an HTMX fragment; the page only
/// carries the aggregates.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub review_count: usize,
    pub average_rating: Option<i16>,
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<ProductsIndexTemplate> {
    let products = state.api().list_products().await?;

    Ok(ProductsIndexTemplate {
        products: catalog_order(&products),
    })
}

/// Display product detail page with its reviews.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductShowTemplate> {
    let product_id = ProductId::new(id);
    let product = state.api().get_product(product_id).await?;

    let repository = ReviewRepository::new(state.pool());
    let reviews = repository.list_for_product(product_id).await?;
    #[allow(clippy::cast_possible_truncation)] // ratings average within 1..=5
    let average_rating = repository
        .average_rating(product_id)
        .await?
        .map(|avg| avg.round() as i16);

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
        review_count: reviews.len(),
        average_rating,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::Variation;
    use vale_acai_core::Price;

    fn product(id: i32, ordem: i32, disponivel: bool) -> Product {
        Product {
            produto_id: ProductId::new(id),
            nome: format!("Produto {id}"),
            descricao: String::new(),
            disponivel,
            ordem,
            imagem: None,
            variacoes: vec![
                Variation {
                    tamanho: "500ml".to_string(),
                    tamanho_ml: 500,
                    preco: Price::from_centavos(1700),
                },
                Variation {
                    tamanho: "300ml".to_string(),
                    tamanho_ml: 300,
                    preco: Price::from_centavos(1200),
                },
            ],
        }
    }

    #[test]
    fn test_catalog_order_sorts_by_display_order() {
        let products = vec![product(1, 2, true), product(2, 1, true)];
        let ordered = catalog_order(&products);
        assert_eq!(ordered[0].id, 2);
        assert_eq!(ordered[1].id, 1);
    }

    #[test]
    fn test_catalog_order_sinks_unavailable() {
        let products = vec![product(1, 1, false), product(2, 2, true)];
        let ordered = catalog_order(&products);
        assert_eq!(ordered[0].id, 2);
        assert!(!ordered[1].available);
    }

    #[test]
    fn test_product_view_price_from_is_cheapest() {
        let view = ProductView::from(&product(1, 1, true));
        assert_eq!(view.price_from, "R$ 12,00");
        assert_eq!(view.variations.len(), 2);
    }
}
