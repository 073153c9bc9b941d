//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session (one writer per session); handlers
//! load it, apply one mutation, and save it back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vale_acai_core::{Price, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::cart::{Cart, CartItem};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub size_label: String,
    pub size_ml: u32,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Build the display cart, deriving totals with the configured flat fee.
    #[must_use]
    pub fn build(cart: &Cart, delivery_fee: Price) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product_id.as_i32(),
                    name: item.product_name.clone(),
                    size_label: item.size_label.clone(),
                    size_ml: item.size_ml,
                    quantity: item.quantity,
                    unit_price: item.unit_price.to_string(),
                    line_total: item.line_total().to_string(),
                    image: item.image.clone(),
                })
                .collect(),
            subtotal: cart.subtotal().to_string(),
            delivery_fee: delivery_fee.to_string(),
            total: cart.total(delivery_fee).to_string(),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub size_ml: u32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub size_ml: u32,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
    pub size_ml: u32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub nonce: String,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let cart = Cart::load(&session).await;

    CartShowTemplate {
        cart: CartView::build(&cart, state.config().store.delivery_fee),
        nonce,
    }
}

/// Add item to cart (HTMX).
///
/// The variation is resolved against the catalog so the stored line always
/// carries the current unit price. Returns an HTMX trigger to update the
/// cart count badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let product = state.api().get_product(product_id).await?;

    if !product.disponivel {
        return Err(AppError::BadRequest("produto indisponível".to_string()));
    }

    let variation = product.variation(form.size_ml).ok_or_else(|| {
        AppError::BadRequest(format!(
            "tamanho {}ml não existe para {}",
            form.size_ml, product.nome
        ))
    })?;

    let mut cart = Cart::load(&session).await;
    cart.add_item(CartItem {
        product_id,
        product_name: product.nome.clone(),
        size_label: variation.tamanho.clone(),
        size_ml: variation.tamanho_ml,
        unit_price: variation.preco,
        quantity: form.quantity.unwrap_or(1).max(1),
        image: product.imagem.clone(),
    });
    cart.save(&session).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
///
/// A requested quantity of zero or less removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = Cart::load(&session).await;
    cart.set_quantity(ProductId::new(form.product_id), form.size_ml, form.quantity);
    cart.save(&session).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&cart, state.config().store.delivery_fee),
        },
    )
        .into_response())
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = Cart::load(&session).await;
    cart.remove_item(ProductId::new(form.product_id), form.size_ml);
    cart.save(&session).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&cart, state.config().store.delivery_fee),
        },
    )
        .into_response())
}

/// Clear the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Response> {
    Cart::erase(&session).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&Cart::default(), state.config().store.delivery_fee),
        },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = Cart::load(&session).await;

    CartCountTemplate {
        count: cart.item_count(),
    }
}
