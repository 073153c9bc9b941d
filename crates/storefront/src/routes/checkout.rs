//! Checkout route handlers.
//!
//! A linear three-step flow (client, payment, confirmation) over the
//! session-persisted [`Checkout`] state. Lookups and payment actions are
//! HTMX fragments; step changes are full redirects.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vale_acai_core::{Cep, ClientId, PaymentMethod, Phone, Price};

use crate::api::ApiError;
use crate::api::types::{
    CardLinkRequest, NewClientRequest, Order, OrderItemPayload, OrderRequest, PixChargeRequest,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::cart::{Cart, DeliveryAddress};
use crate::models::checkout::{Checkout, CheckoutStep, ResolvedClient};
use crate::models::pix::StoredPixCharge;
use crate::models::session::keys;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Charge description shown at the payment provider.
const CHARGE_DESCRIPTION: &str = "Pedido Vale Açaí";

// =============================================================================
// View data
// =============================================================================

/// Address form fields, prefilled from a lookup or the stored cart address.
#[derive(Clone, Default)]
pub struct AddressFormView {
    pub cep: String,
    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    /// The lookup carried coordinates and the user has not confirmed the
    /// pinned location yet.
    pub needs_confirmation: bool,
    pub error: Option<String>,
}

impl AddressFormView {
    fn from_address(address: &DeliveryAddress) -> Self {
        Self {
            cep: address.postal_code.clone(),
            city: address.city.clone(),
            neighborhood: address.neighborhood.clone(),
            street: address.street.clone(),
            number: address.number.clone(),
            complement: address.complement.clone().unwrap_or_default(),
            needs_confirmation: !address.confirmed,
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}

/// The client form, rendered after a phone lookup.
#[derive(Clone, Default)]
pub struct ClientFormView {
    pub phone: String,
    /// Present when the client pre-existed.
    pub client_id: Option<i32>,
    pub name: String,
    pub cpf: String,
    pub address: AddressFormView,
    pub error: Option<String>,
}

/// PIX panel display data.
#[derive(Clone)]
pub struct PixPanelView {
    pub payload: String,
    pub encoded_image: String,
    pub remaining_seconds: u64,
}

/// Confirmation page order summary.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub id: i32,
    pub status_label: String,
    pub payment_label: String,
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub change_for: Option<String>,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.pedido_id.as_i32(),
            status_label: order.status.label().to_string(),
            payment_label: order.forma_pagamento.label().to_string(),
            subtotal: order.subtotal.to_string(),
            delivery_fee: order.taxa_entrega.to_string(),
            total: order.total.to_string(),
            change_for: order.troco_para.map(|t| t.to_string()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Client step page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/client.html")]
pub struct ClientStepTemplate {
    pub cart: CartView,
    pub phone: String,
    pub error: Option<String>,
}

/// Client form fragment, swapped in after a phone lookup.
#[derive(Template, WebTemplate)]
#[template(path = "partials/client_form.html")]
pub struct ClientFormTemplate {
    pub form: ClientFormView,
}

/// Address fields fragment, swapped in after a CEP lookup.
#[derive(Template, WebTemplate)]
#[template(path = "partials/address_fields.html")]
pub struct AddressFieldsTemplate {
    pub address: AddressFormView,
}

/// Payment step page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentStepTemplate {
    pub cart: CartView,
    pub client_name: String,
    pub selected: String,
    pub pix: Option<PixPanelView>,
    pub nonce: String,
}

/// Payment panel fragment (per selected method).
#[derive(Template, WebTemplate)]
#[template(path = "partials/payment_panel.html")]
pub struct PaymentPanelTemplate {
    pub selected: String,
    pub total: String,
}

/// PIX panel fragment with QR code and countdown.
#[derive(Template, WebTemplate)]
#[template(path = "partials/pix_panel.html")]
pub struct PixPanelTemplate {
    pub pix: PixPanelView,
}

/// PIX countdown fragment (1-second poll).
#[derive(Template, WebTemplate)]
#[template(path = "partials/pix_status.html")]
pub struct PixStatusTemplate {
    pub remaining_seconds: u64,
}

/// PIX expired fragment; replaces the whole panel via `HX-Retarget`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/pix_expired.html")]
pub struct PixExpiredTemplate;

/// Hosted card-link fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/card_link.html")]
pub struct CardLinkTemplate {
    pub url: String,
}

/// Inline error fragment for payment actions.
#[derive(Template, WebTemplate)]
#[template(path = "partials/form_error.html")]
pub struct FormErrorTemplate {
    pub message: String,
}

/// Confirmation step page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: OrderSummaryView,
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PhoneLookupForm {
    pub telefone: String,
}

#[derive(Debug, Deserialize)]
pub struct CepLookupForm {
    pub cep: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientSubmitForm {
    pub telefone: String,
    pub cliente_id: Option<i32>,
    pub nome: String,
    pub cpf: Option<String>,
    pub cep: String,
    pub numero: String,
    pub complemento: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MethodForm {
    pub forma: String,
}

#[derive(Debug, Deserialize)]
pub struct CardForm {
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CashForm {
    pub troco_para: Option<String>,
    pub observacoes: Option<String>,
}

// =============================================================================
// Step pages
// =============================================================================

/// Entry point: redirect to wherever the flow currently stands.
#[instrument(skip(session))]
pub async fn entry(session: Session) -> Response {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/carrinho").into_response();
    }

    let checkout = Checkout::load(&session).await;
    Redirect::to(checkout.step.path()).into_response()
}

/// Display the client step.
#[instrument(skip(state, session))]
pub async fn client_step(State(state): State<AppState>, session: Session) -> Response {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/carrinho").into_response();
    }

    let checkout = Checkout::load(&session).await;
    let phone = checkout
        .client
        .as_ref()
        .map(|c| c.phone.as_str().to_string())
        .unwrap_or_default();

    ClientStepTemplate {
        cart: CartView::build(&cart, state.config().store.delivery_fee),
        phone,
        error: None,
    }
    .into_response()
}

/// Display the payment step.
///
/// Advancing past `client` requires a resolved client; there is no
/// equivalent predicate on this step.
#[instrument(skip(state, session, nonce))]
pub async fn payment_step(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Response {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/carrinho").into_response();
    }

    let checkout = Checkout::load(&session).await;
    let Some(client) = checkout.client else {
        return Redirect::to("/checkout/cliente").into_response();
    };

    let now = Utc::now();
    let pix = StoredPixCharge::load(&session)
        .await
        .filter(|charge| !charge.is_expired(now))
        .map(|charge| PixPanelView {
            payload: charge.payload.clone(),
            encoded_image: charge.encoded_image.clone(),
            remaining_seconds: charge.remaining_seconds(now),
        });

    PaymentStepTemplate {
        cart: CartView::build(&cart, state.config().store.delivery_fee),
        client_name: client.name,
        selected: cart
            .payment_method
            .map(|m| m.to_string())
            .unwrap_or_default(),
        pix,
        nonce,
    }
    .into_response()
}

/// Display the confirmation step.
#[instrument(skip(session))]
pub async fn confirmation(session: Session) -> Response {
    let order = session
        .get::<Order>(keys::LAST_ORDER)
        .await
        .ok()
        .flatten();

    match order {
        Some(order) => ConfirmationTemplate {
            order: OrderSummaryView::from(&order),
        }
        .into_response(),
        None => Redirect::to("/").into_response(),
    }
}

/// Retreat one step. A no-op at the first step.
#[instrument(skip(session))]
pub async fn retreat(session: Session) -> Result<Redirect> {
    let mut checkout = Checkout::load(&session).await;
    checkout.retreat();
    checkout.save(&session).await?;
    Ok(Redirect::to(checkout.step.path()))
}

// =============================================================================
// Client resolution
// =============================================================================

/// Phone lookup fragment (HTMX).
///
/// Each lookup is tagged with a monotonically increasing sequence number.
/// When the response comes back, the sequence is compared against the latest
/// issued one; a stale response renders nothing instead of overwriting newer
/// input.
#[instrument(skip(state, session))]
pub async fn lookup_client(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PhoneLookupForm>,
) -> Result<Response> {
    // Still typing: stay quiet instead of flashing a validation error
    let Ok(phone) = Phone::parse(&form.telefone) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let mut checkout = Checkout::load(&session).await;
    let seq = checkout.next_lookup_seq();
    checkout.save(&session).await?;

    let lookup = state.api().find_client(&phone).await;

    // Discard stale responses: a newer lookup has been issued meanwhile
    let latest = Checkout::load(&session).await.lookup_seq;
    if latest != seq {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let form_view = match lookup {
        Ok(record) => {
            // Prefill the stored default address; its absence is not an error
            let address = match state.api().find_client_address(&phone).await {
                Ok(stored) if stored.cep.is_some() => {
                    // A stored address carries no coordinates, so it is
                    // usable without a confirmation step
                    let address = DeliveryAddress {
                        postal_code: stored
                            .cep
                            .map(|c| c.as_str().to_string())
                            .unwrap_or_default(),
                        city: stored.cidade.unwrap_or_default(),
                        neighborhood: stored.bairro.unwrap_or_default(),
                        street: stored.logradouro.unwrap_or_default(),
                        number: stored.numero.unwrap_or_default(),
                        complement: stored.complemento.filter(|c| !c.is_empty()),
                        latitude: None,
                        longitude: None,
                        confirmed: true,
                    };

                    let mut cart = Cart::load(&session).await;
                    cart.set_address(address.clone());
                    cart.save(&session).await?;

                    AddressFormView::from_address(&address)
                }
                Ok(_) | Err(ApiError::NotFound(_)) => AddressFormView::default(),
                Err(e) => {
                    tracing::warn!("address prefill failed: {e}");
                    AddressFormView::default()
                }
            };

            ClientFormView {
                phone: phone.as_str().to_string(),
                client_id: Some(record.cliente_id.as_i32()),
                name: record.nome,
                cpf: record.cpf.unwrap_or_default(),
                address,
                error: None,
            }
        }
        // Unknown phone: empty registration form scoped to it
        Err(ApiError::NotFound(_)) => ClientFormView {
            phone: phone.as_str().to_string(),
            ..ClientFormView::default()
        },
        Err(e) => {
            tracing::warn!("client lookup failed: {e}");
            ClientFormView {
                phone: phone.as_str().to_string(),
                error: Some("Não foi possível buscar seu cadastro. Tente novamente.".to_string()),
                ..ClientFormView::default()
            }
        }
    };

    Ok(ClientFormTemplate { form: form_view }.into_response())
}

/// Resolve or register the client and advance to the payment step.
#[instrument(skip(state, session, form))]
pub async fn submit_client(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ClientSubmitForm>,
) -> Result<Response> {
    let mut cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/carrinho").into_response());
    }

    let step_error = |state: &AppState, cart: &Cart, phone: String, message: String| {
        ClientStepTemplate {
            cart: CartView::build(cart, state.config().store.delivery_fee),
            phone,
            error: Some(message),
        }
        .into_response()
    };

    let phone = match Phone::parse(&form.telefone) {
        Ok(phone) => phone,
        Err(e) => {
            return Ok(step_error(&state, &cart, form.telefone, e.to_string()));
        }
    };

    let name = form.nome.trim().to_string();
    if name.is_empty() {
        return Ok(step_error(
            &state,
            &cart,
            phone.as_str().to_string(),
            "Informe seu nome.".to_string(),
        ));
    }

    let address = match resolve_address(&cart, &form) {
        Ok(address) => address,
        Err(message) => {
            return Ok(step_error(&state, &cart, phone.as_str().to_string(), message));
        }
    };

    let client = if let Some(id) = form.cliente_id {
        // Pre-existing client: proceed immediately with the found identifier
        ResolvedClient {
            id: ClientId::new(id),
            name,
            phone,
        }
    } else {
        let request = NewClientRequest {
            nome: name.clone(),
            telefone: phone.clone(),
            cpf: form.cpf.clone().filter(|c| !c.trim().is_empty()),
            endereco: address.to_payload(),
        };
        match state.api().create_client(&request).await {
            Ok(record) => ResolvedClient {
                id: record.cliente_id,
                name,
                phone,
            },
            // Remote failure: surface the message and stay on this step
            Err(e) => {
                tracing::warn!("client creation failed: {e}");
                let message = match e {
                    ApiError::Rejected(message) => message,
                    _ => "Não foi possível concluir seu cadastro. Tente novamente.".to_string(),
                };
                return Ok(step_error(&state, &cart, phone.as_str().to_string(), message));
            }
        }
    };

    add_breadcrumb(
        "checkout",
        "Client resolved",
        Some(&[("cliente_id", &client.id.to_string())]),
    );

    cart.set_address(address);
    cart.save(&session).await?;

    let mut checkout = Checkout::load(&session).await;
    checkout.set_client(client);
    // Resubmitting from a later step must not advance it further
    if checkout.step == CheckoutStep::Client {
        checkout.advance();
    }
    checkout.save(&session).await?;

    Ok(Redirect::to(checkout.step.path()).into_response())
}

/// Merge the submitted form fields with the looked-up address in the cart.
///
/// The confirmation requirement only exists for lookup results that carried
/// coordinates; a manually entered address is usable immediately.
fn resolve_address(cart: &Cart, form: &ClientSubmitForm) -> std::result::Result<DeliveryAddress, String> {
    let cep = Cep::parse(&form.cep).map_err(|e| e.to_string())?;

    let number = form.numero.trim().to_string();
    if number.is_empty() {
        return Err("Informe o número do endereço.".to_string());
    }

    let complement = form
        .complemento
        .clone()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    match &cart.address {
        Some(stored) if stored.postal_code == cep.as_str() => {
            if !stored.confirmed {
                return Err("Confirme a localização no mapa antes de continuar.".to_string());
            }
            Ok(DeliveryAddress {
                number,
                complement,
                ..stored.clone()
            })
        }
        // No lookup behind this CEP; nothing to confirm
        _ => Err("Busque o CEP para preencher o endereço.".to_string()),
    }
}

// =============================================================================
// Address resolution
// =============================================================================

/// Case-insensitive serviced-city check.
fn city_is_serviced(city: &str, serviced: &str) -> bool {
    city.trim().eq_ignore_ascii_case(serviced.trim())
}

/// CEP lookup fragment (HTMX).
///
/// Fired from the browser once the cleaned CEP reaches exactly 8 digits,
/// debounced; a pending request is cancelled on further input (`hx-sync`).
#[instrument(skip(state, session))]
pub async fn lookup_cep(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CepLookupForm>,
) -> Result<Response> {
    // The lookup only fires once the cleaned code reaches exactly 8 digits;
    // anything shorter means the user is still typing
    let Ok(cep) = Cep::parse(&form.cep) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let resolved = match state.api().lookup_cep(&cep).await {
        Ok(resolved) => resolved,
        Err(ApiError::NotFound(_)) => {
            return Ok(AddressFieldsTemplate {
                address: AddressFormView::error("CEP não encontrado.".to_string()),
            }
            .into_response());
        }
        Err(e) => {
            tracing::warn!("CEP lookup failed: {e}");
            return Ok(AddressFieldsTemplate {
                address: AddressFormView::error(
                    "Não foi possível consultar o CEP. Tente novamente.".to_string(),
                ),
            }
            .into_response());
        }
    };

    // Out-of-area addresses are rejected with no fields populated
    let serviced = &state.config().store.serviced_city;
    if !city_is_serviced(&resolved.cidade, serviced) {
        return Ok(AddressFieldsTemplate {
            address: AddressFormView::error(format!(
                "Ainda não entregamos em {}. Atendemos somente {serviced}.",
                resolved.cidade
            )),
        }
        .into_response());
    }

    let address = DeliveryAddress {
        postal_code: cep.as_str().to_string(),
        city: resolved.cidade.clone(),
        neighborhood: resolved.bairro.clone().unwrap_or_default(),
        street: resolved.logradouro.clone().unwrap_or_default(),
        number: String::new(),
        complement: None,
        latitude: resolved.latitude,
        longitude: resolved.longitude,
        // With coordinates the user must confirm the pinned location first
        confirmed: !resolved.has_coordinates(),
    };

    let mut cart = Cart::load(&session).await;
    cart.set_address(address.clone());
    cart.save(&session).await?;

    Ok(AddressFieldsTemplate {
        address: AddressFormView::from_address(&address),
    }
    .into_response())
}

/// Confirm the pinned location (HTMX).
#[instrument(skip(session))]
pub async fn confirm_address(session: Session) -> Result<Response> {
    let mut cart = Cart::load(&session).await;

    let Some(address) = cart.address.as_mut() else {
        return Ok(AddressFieldsTemplate {
            address: AddressFormView::error("Busque o CEP primeiro.".to_string()),
        }
        .into_response());
    };

    address.confirmed = true;
    let view = AddressFormView::from_address(address);
    cart.save(&session).await?;

    Ok(AddressFieldsTemplate { address: view }.into_response())
}

// =============================================================================
// Payment
// =============================================================================

/// Select the payment method (HTMX).
#[instrument(skip(state, session))]
pub async fn select_method(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MethodForm>,
) -> Result<Response> {
    let method = form
        .forma
        .parse::<PaymentMethod>()
        .map_err(AppError::BadRequest)?;

    let mut cart = Cart::load(&session).await;
    cart.set_payment_method(method);
    cart.save(&session).await?;

    Ok(PaymentPanelTemplate {
        selected: method.to_string(),
        total: cart.total(state.config().store.delivery_fee).to_string(),
    }
    .into_response())
}

/// Generate a PIX code for the order total (HTMX).
#[instrument(skip(state, session))]
pub async fn generate_pix(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Ok(FormErrorTemplate {
            message: "Seu carrinho está vazio.".to_string(),
        }
        .into_response());
    }

    let store = &state.config().store;
    let total = cart.total(store.delivery_fee);
    let request =
        PixChargeRequest::for_total(CHARGE_DESCRIPTION, total, store.pix_expiration_seconds);

    let qr = match state.api().create_pix_charge(&request).await {
        Ok(qr) => qr,
        Err(e) => {
            tracing::warn!("PIX charge failed: {e}");
            return Ok(FormErrorTemplate {
                message: "Não foi possível gerar o código Pix. Tente novamente.".to_string(),
            }
            .into_response());
        }
    };

    let charge = StoredPixCharge::new(qr, store.pix_expiration_seconds, Utc::now());
    charge.save(&session).await?;

    add_breadcrumb("checkout", "Generated PIX charge", Some(&[("id", &charge.id)]));

    Ok(PixPanelTemplate {
        pix: PixPanelView {
            payload: charge.payload.clone(),
            encoded_image: charge.encoded_image.clone(),
            remaining_seconds: charge.remaining_seconds(Utc::now()),
        },
    }
    .into_response())
}

/// PIX countdown fragment, polled once per second (HTMX).
///
/// On expiry the stored code is discarded and the whole panel is replaced
/// with a regeneration prompt via `HX-Retarget`.
#[instrument(skip(session))]
pub async fn pix_status(session: Session) -> Result<Response> {
    let now = Utc::now();

    match StoredPixCharge::load(&session).await {
        Some(charge) if !charge.is_expired(now) => Ok(PixStatusTemplate {
            remaining_seconds: charge.remaining_seconds(now),
        }
        .into_response()),
        Some(_) => {
            StoredPixCharge::discard(&session).await?;
            Ok((
                AppendHeaders([("HX-Retarget", "#pix-panel"), ("HX-Reswap", "outerHTML")]),
                PixExpiredTemplate,
            )
                .into_response())
        }
        None => Ok((
            AppendHeaders([("HX-Retarget", "#pix-panel"), ("HX-Reswap", "outerHTML")]),
            PixExpiredTemplate,
        )
            .into_response()),
    }
}

/// Submit the order after the PIX code was paid.
#[instrument(skip(state, session))]
pub async fn confirm_pix(State(state): State<AppState>, session: Session) -> Result<Response> {
    let now = Utc::now();
    let Some(charge) = StoredPixCharge::load(&session).await.filter(|c| !c.is_expired(now))
    else {
        return Ok(FormErrorTemplate {
            message: "O código Pix expirou. Gere um novo código.".to_string(),
        }
        .into_response());
    };

    let cart = Cart::load(&session).await;
    let checkout = Checkout::load(&session).await;
    let store = &state.config().store;

    let request = match build_order_request(
        &checkout,
        &cart,
        store.delivery_fee,
        PaymentMethod::Pix,
        None,
        Some(charge.id.clone()),
        None,
    ) {
        Ok(request) => request,
        Err(message) => {
            return Ok(FormErrorTemplate { message }.into_response());
        }
    };

    let order = match state.api().submit_order(&request).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!("order submission failed: {e}");
            return Ok(FormErrorTemplate {
                message: submission_error_message(&e),
            }
            .into_response());
        }
    };
    StoredPixCharge::discard(&session).await?;
    finish_order(&session, order).await?;

    Ok((
        AppendHeaders([("HX-Redirect", "/checkout/confirmacao")]),
        StatusCode::OK,
    )
        .into_response())
}

/// Generate the hosted card link and submit the order (HTMX).
///
/// The cart is cleared as soon as the link exists; no payment confirmation
/// from the provider is awaited.
#[instrument(skip(state, session))]
pub async fn pay_with_card(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CardForm>,
) -> Result<Response> {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Ok(FormErrorTemplate {
            message: "Seu carrinho está vazio.".to_string(),
        }
        .into_response());
    }

    let checkout = Checkout::load(&session).await;
    let store = &state.config().store;
    let total = cart.total(store.delivery_fee);

    let link_request = CardLinkRequest::for_total("Vale Açaí", CHARGE_DESCRIPTION, total);
    let link = match state.api().create_card_link(&link_request).await {
        Ok(link) => link,
        Err(e) => {
            tracing::warn!("card link failed: {e}");
            return Ok(FormErrorTemplate {
                message: "Não foi possível gerar o link de pagamento. Tente novamente."
                    .to_string(),
            }
            .into_response());
        }
    };

    let request = match build_order_request(
        &checkout,
        &cart,
        store.delivery_fee,
        PaymentMethod::CartaoDeCredito,
        None,
        Some(link.id.clone()),
        normalize_notes(form.observacoes),
    ) {
        Ok(request) => request,
        Err(message) => {
            return Ok(FormErrorTemplate { message }.into_response());
        }
    };

    let order = match state.api().submit_order(&request).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!("order submission failed: {e}");
            return Ok(FormErrorTemplate {
                message: submission_error_message(&e),
            }
            .into_response());
        }
    };
    finish_order(&session, order).await?;

    Ok(CardLinkTemplate { url: link.url }.into_response())
}

/// Submit a cash order (HTMX).
#[instrument(skip(state, session))]
pub async fn pay_with_cash(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CashForm>,
) -> Result<Response> {
    let cart = Cart::load(&session).await;
    if cart.is_empty() {
        return Ok(FormErrorTemplate {
            message: "Seu carrinho está vazio.".to_string(),
        }
        .into_response());
    }

    let checkout = Checkout::load(&session).await;
    let store = &state.config().store;
    let total = cart.total(store.delivery_fee);

    let change_for = match parse_brl_input(form.troco_para.as_deref().unwrap_or_default()) {
        Ok(change_for) => change_for,
        Err(()) => {
            return Ok(FormErrorTemplate {
                message: "Valor de troco inválido.".to_string(),
            }
            .into_response());
        }
    };

    // A requested change amount must cover the order total
    if let Some(change) = change_for
        && change < total
    {
        return Ok(FormErrorTemplate {
            message: format!("O troco deve ser para um valor de pelo menos {total}."),
        }
        .into_response());
    }

    let request = match build_order_request(
        &checkout,
        &cart,
        store.delivery_fee,
        PaymentMethod::Dinheiro,
        change_for,
        None,
        normalize_notes(form.observacoes),
    ) {
        Ok(request) => request,
        Err(message) => {
            return Ok(FormErrorTemplate { message }.into_response());
        }
    };

    let order = match state.api().submit_order(&request).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!("order submission failed: {e}");
            return Ok(FormErrorTemplate {
                message: submission_error_message(&e),
            }
            .into_response());
        }
    };
    finish_order(&session, order).await?;

    Ok((
        AppendHeaders([("HX-Redirect", "/checkout/confirmacao")]),
        StatusCode::OK,
    )
        .into_response())
}

// =============================================================================
// Order assembly
// =============================================================================

/// User-facing message for a failed order submission.
fn submission_error_message(error: &ApiError) -> String {
    match error {
        ApiError::Rejected(message) => message.clone(),
        _ => "Não foi possível enviar seu pedido. Tente novamente.".to_string(),
    }
}

/// Record the submitted order, clear the cart wholesale, and move the flow
/// to confirmation.
///
/// The terminal step is entered directly by the successful payment action,
/// not through `advance()`.
async fn finish_order(session: &Session, order: Order) -> Result<()> {
    session.insert(keys::LAST_ORDER, &order).await?;
    Cart::erase(session).await?;

    let mut checkout = Checkout::load(session).await;
    checkout.step = CheckoutStep::Confirmation;
    checkout.save(session).await?;
    Ok(())
}

/// Build the order payload all three payment flows share.
fn build_order_request(
    checkout: &Checkout,
    cart: &Cart,
    delivery_fee: Price,
    method: PaymentMethod,
    change_for: Option<Price>,
    payment_reference: Option<String>,
    notes: Option<String>,
) -> std::result::Result<OrderRequest, String> {
    let Some(client) = &checkout.client else {
        return Err("Identifique-se antes de finalizar o pedido.".to_string());
    };

    if cart.is_empty() {
        return Err("Seu carrinho está vazio.".to_string());
    }

    let Some(address) = &cart.address else {
        return Err("Informe o endereço de entrega.".to_string());
    };
    if !address.confirmed {
        return Err("Confirme a localização do endereço.".to_string());
    }

    Ok(OrderRequest {
        cliente_id: client.id,
        endereco: address.to_payload(),
        itens: cart
            .items
            .iter()
            .map(|item| OrderItemPayload {
                produto_id: item.product_id,
                quantidade: item.quantity,
                preco_unitario: item.unit_price,
            })
            .collect(),
        subtotal: cart.subtotal(),
        taxa_entrega: delivery_fee,
        total: cart.total(delivery_fee),
        forma_pagamento: method,
        troco_para: change_for,
        observacoes: notes,
        referencia_pagamento: payment_reference,
    })
}

/// Collapse an optional free-text notes field.
fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Parse a user-entered BRL amount ("50", "50,00", "1.234,56") into centavos.
///
/// An empty input means no amount was provided.
fn parse_brl_input(input: &str) -> std::result::Result<Option<Price>, ()> {
    let cleaned = input.trim().trim_start_matches("R$").trim();
    if cleaned.is_empty() {
        return Ok(None);
    }

    // Thousands separators drop out; the decimal comma splits reais from
    // centavos
    let cleaned = cleaned.replace('.', "");
    let (reais, centavos) = match cleaned.split_once(',') {
        Some((reais, centavos)) => (reais, centavos),
        None => (cleaned.as_str(), ""),
    };

    let reais: i64 = if reais.is_empty() {
        0
    } else {
        reais.parse().map_err(|_| ())?
    };

    let centavos: i64 = match centavos.len() {
        0 => 0,
        1 => centavos.parse::<i64>().map_err(|_| ())? * 10,
        2 => centavos.parse().map_err(|_| ())?,
        _ => return Err(()),
    };

    Ok(Some(Price::from_centavos(reais * 100 + centavos)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::cart::CartItem;
    use vale_acai_core::ProductId;

    fn stocked_cart() -> Cart {
        let mut cart = Cart::default();
        cart.add_item(CartItem {
            product_id: ProductId::new(3),
            product_name: "Açaí tradicional".to_string(),
            size_label: "500ml".to_string(),
            size_ml: 500,
            unit_price: Price::from_centavos(1700),
            quantity: 2,
            image: None,
        });
        cart.set_address(DeliveryAddress {
            postal_code: "11680000".to_string(),
            city: "Ubatuba".to_string(),
            neighborhood: "Itaguá".to_string(),
            street: "Rua Guarani".to_string(),
            number: "120".to_string(),
            complement: None,
            latitude: None,
            longitude: None,
            confirmed: true,
        });
        cart
    }

    fn ready_checkout() -> Checkout {
        let mut checkout = Checkout::default();
        checkout.set_client(ResolvedClient {
            id: ClientId::new(7),
            name: "Maria Souza".to_string(),
            phone: Phone::parse("12998765432").unwrap(),
        });
        checkout
    }

    #[test]
    fn test_city_is_serviced() {
        assert!(city_is_serviced("Ubatuba", "Ubatuba"));
        assert!(city_is_serviced("  ubatuba ", "Ubatuba"));
        assert!(!city_is_serviced("Caraguatatuba", "Ubatuba"));
    }

    #[test]
    fn test_parse_brl_input() {
        assert_eq!(parse_brl_input("").unwrap(), None);
        assert_eq!(parse_brl_input("  "), Ok(None));
        assert_eq!(
            parse_brl_input("50").unwrap(),
            Some(Price::from_centavos(5000))
        );
        assert_eq!(
            parse_brl_input("50,00").unwrap(),
            Some(Price::from_centavos(5000))
        );
        assert_eq!(
            parse_brl_input("R$ 50,5").unwrap(),
            Some(Price::from_centavos(5050))
        );
        assert_eq!(
            parse_brl_input("1.234,56").unwrap(),
            Some(Price::from_centavos(123_456))
        );
        assert!(parse_brl_input("abc").is_err());
        assert!(parse_brl_input("50,123").is_err());
    }

    #[test]
    fn test_build_order_request_happy_path() {
        let request = build_order_request(
            &ready_checkout(),
            &stocked_cart(),
            Price::from_centavos(500),
            PaymentMethod::Pix,
            None,
            Some("pix_abc".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(request.subtotal, Price::from_centavos(3400));
        assert_eq!(request.total, Price::from_centavos(3900));
        assert_eq!(request.itens.len(), 1);
        assert_eq!(request.referencia_pagamento.as_deref(), Some("pix_abc"));
    }

    #[test]
    fn test_build_order_request_requires_client() {
        let result = build_order_request(
            &Checkout::default(),
            &stocked_cart(),
            Price::from_centavos(500),
            PaymentMethod::Dinheiro,
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_build_order_request_requires_confirmed_address() {
        let mut cart = stocked_cart();
        if let Some(address) = cart.address.as_mut() {
            address.latitude = Some(-23.43);
            address.longitude = Some(-45.08);
            address.confirmed = false;
        }

        let result = build_order_request(
            &ready_checkout(),
            &cart,
            Price::from_centavos(500),
            PaymentMethod::Dinheiro,
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_build_order_request_requires_items() {
        let mut cart = stocked_cart();
        cart.items.clear();

        let result = build_order_request(
            &ready_checkout(),
            &cart,
            Price::from_centavos(500),
            PaymentMethod::Pix,
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_insufficient_change_is_rejected() {
        let cart = stocked_cart();
        let total = cart.total(Price::from_centavos(500));
        let change = parse_brl_input("30,00").unwrap().unwrap();

        // The handler refuses to submit when the change is below the total
        assert!(change < total);
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes(None), None);
        assert_eq!(normalize_notes(Some("  ".to_string())), None);
        assert_eq!(
            normalize_notes(Some(" sem granola ".to_string())),
            Some("sem granola".to_string())
        );
    }
}
