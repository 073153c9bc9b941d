//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Health check
//!
//! # Catalog
//! GET  /produtos                 - Product listing
//! GET  /produtos/{id}            - Product detail (with reviews)
//!
//! # Reviews (HTMX fragments)
//! GET  /produtos/{id}/avaliacoes - Review list fragment
//! POST /produtos/{id}/avaliacoes - Submit review (returns review list fragment)
//!
//! # Cart (HTMX fragments)
//! GET  /carrinho                 - Cart page
//! POST /carrinho/adicionar       - Add item (returns count fragment, triggers cart-updated)
//! POST /carrinho/atualizar       - Update quantity (returns cart_items fragment)
//! POST /carrinho/remover         - Remove item (returns cart_items fragment)
//! POST /carrinho/limpar          - Clear the cart (returns cart_items fragment)
//! GET  /carrinho/quantidade      - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout                 - Redirect to the current step
//! GET  /checkout/cliente         - Client step
//! POST /checkout/cliente/busca   - Phone lookup (fragment)
//! POST /checkout/cliente         - Resolve/register client, advance
//! POST /checkout/endereco/cep    - CEP lookup (fragment)
//! POST /checkout/endereco/confirmar - Confirm pinned location (fragment)
//! GET  /checkout/pagamento       - Payment step
//! POST /checkout/pagamento/metodo   - Select payment method (fragment)
//! POST /checkout/pagamento/pix      - Generate PIX code (fragment)
//! GET  /checkout/pagamento/pix/status  - Countdown fragment (1s poll)
//! POST /checkout/pagamento/pix/confirmar - Submit PIX order
//! POST /checkout/pagamento/cartao   - Generate card link, submit order
//! POST /checkout/pagamento/dinheiro - Submit cash order
//! POST /checkout/voltar          - Retreat one step
//! GET  /checkout/confirmacao     - Confirmation step
//!
//! # Orders
//! GET  /pedidos                  - Order list
//! POST /pedidos/{id}/avancar     - Request next linear status (fragment)
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{browse_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the product routes router (catalog + reviews).
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/avaliacoes",
            get(reviews::list).post(reviews::create),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/adicionar", post(cart::add))
        .route("/atualizar", post(cart::update))
        .route("/remover", post(cart::remove))
        .route("/limpar", post(cart::clear))
        .route("/quantidade", get(cart::count))
        .layer(browse_rate_limiter())
}

/// Create the checkout routes router.
///
/// Everything here fans out to the delivery API, so the strict limiter
/// applies to the whole router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::entry))
        .route("/cliente", get(checkout::client_step).post(checkout::submit_client))
        .route("/cliente/busca", post(checkout::lookup_client))
        .route("/endereco/cep", post(checkout::lookup_cep))
        .route("/endereco/confirmar", post(checkout::confirm_address))
        .route("/pagamento", get(checkout::payment_step))
        .route("/pagamento/metodo", post(checkout::select_method))
        .route("/pagamento/pix", post(checkout::generate_pix))
        .route("/pagamento/pix/status", get(checkout::pix_status))
        .route("/pagamento/pix/confirmar", post(checkout::confirm_pix))
        .route("/pagamento/cartao", post(checkout::pay_with_card))
        .route("/pagamento/dinheiro", post(checkout::pay_with_cash))
        .route("/voltar", post(checkout::retreat))
        .route("/confirmacao", get(checkout::confirmation))
        .layer(checkout_rate_limiter())
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/avancar", post(orders::advance_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog routes
        .nest("/produtos", product_routes())
        // Cart routes
        .nest("/carrinho", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Order routes
        .nest("/pedidos", order_routes())
}
