//! Order route handlers.
//!
//! The storefront never validates status transitions locally; the action
//! button only requests the next linear status from the server.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use vale_acai_core::{OrderId, OrderStatus};

use crate::api::types::Order;
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: i32,
    pub status: String,
    pub status_label: String,
    pub next_status: Option<String>,
    pub next_status_label: Option<String>,
    pub payment_label: String,
    pub total: String,
    pub change_for: Option<String>,
    pub notes: Option<String>,
    pub date: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.pedido_id.as_i32(),
            status: order.status.to_string(),
            status_label: order.status.label().to_string(),
            next_status: order.status.next().map(|s| s.to_string()),
            next_status_label: order.status.next().map(|s| s.label().to_string()),
            payment_label: order.forma_pagamento.label().to_string(),
            total: order.total.to_string(),
            change_for: order.troco_para.map(|t| t.to_string()),
            notes: order.observacoes.clone(),
            date: order.criado_em.format("%d/%m/%Y %H:%M").to_string(),
        }
    }
}

/// Order list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderView>,
}

/// Single order row fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_row.html")]
pub struct OrderRowTemplate {
    pub order: OrderView,
}

/// Form carrying the status the row was rendered with.
#[derive(Debug, Deserialize)]
pub struct AdvanceStatusForm {
    pub status: String,
}

/// Display the order list.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<OrdersIndexTemplate> {
    let orders = state.api().list_orders().await?;

    Ok(OrdersIndexTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Request the next linear status for an order (HTMX).
#[instrument(skip(state))]
pub async fn advance_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<AdvanceStatusForm>,
) -> Result<impl IntoResponse> {
    let current = form
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::BadRequest)?;

    let next = current
        .next()
        .ok_or_else(|| AppError::BadRequest(format!("pedido já está {}", current.label())))?;

    let order = state
        .api()
        .update_order_status(OrderId::new(id), next)
        .await?;

    Ok(OrderRowTemplate {
        order: OrderView::from(&order),
    })
}
