//! Delivery API client implementation.
//!
//! Plain REST/JSON over `reqwest`. The product catalog is cached with `moka`
//! (5-minute TTL); everything else goes straight to the API.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use vale_acai_core::{Cep, OrderId, OrderStatus, Phone, ProductId};

use crate::config::DeliveryApiConfig;

use super::ApiError;
use super::types::{
    CardLink, CardLinkRequest, CepAddress, ClientAddress, ClientRecord, Envelope, NewClientRequest,
    Order, OrderList, OrderRequest, PixChargeRequest, PixQrCode, Product, ProductList,
    StatusUpdateRequest,
};

/// Catalog cache TTL.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Cache key for the full product list (the catalog is one cached value).
const CATALOG_KEY: &str = "produtos";

/// Client for the delivery API.
///
/// Cheaply cloneable via `Arc`; holds a connection-pooling `reqwest::Client`
/// with the API key installed as a default header.
#[derive(Clone)]
pub struct DeliveryClient {
    inner: Arc<DeliveryClientInner>,
}

struct DeliveryClientInner {
    client: reqwest::Client,
    base_url: String,
    catalog: Cache<&'static str, Arc<Vec<Product>>>,
}

impl DeliveryClient {
    /// Create a new delivery API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &DeliveryApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Api-Key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| ApiError::Parse(format!("invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATALOG_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(DeliveryClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Check the status line, mapping 404 and other non-2xx responses.
    async fn check_status(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// GET an enveloped resource.
    async fn get_enveloped<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        let response = Self::check_status(response, what).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        envelope.into_result()
    }

    /// GET a bare (non-enveloped) resource.
    async fn get_plain<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        let response = Self::check_status(response, what).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// POST a body, expecting an enveloped resource back.
    async fn post_enveloped<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response, what).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        envelope.into_result()
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Look up a client by phone number.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when no client exists for the phone.
    #[instrument(skip(self))]
    pub async fn find_client(&self, phone: &Phone) -> Result<ClientRecord, ApiError> {
        let path = format!("/clientes/{}", urlencoding::encode(phone.as_str()));
        self.get_enveloped(&path, "cliente").await
    }

    /// Fetch a client's stored default address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the client has no stored address.
    #[instrument(skip(self))]
    pub async fn find_client_address(&self, phone: &Phone) -> Result<ClientAddress, ApiError> {
        let path = format!("/clientes/{}/endereco", urlencoding::encode(phone.as_str()));
        self.get_plain(&path, "endereço do cliente").await
    }

    /// Register a new client.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a domain rejection.
    #[instrument(skip(self, request), fields(telefone = %request.telefone))]
    pub async fn create_client(
        &self,
        request: &NewClientRequest,
    ) -> Result<ClientRecord, ApiError> {
        self.post_enveloped("/clientes", request, "cliente").await
    }

    // =========================================================================
    // CEP lookup
    // =========================================================================

    /// Resolve a CEP to its canonical address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown CEP.
    #[instrument(skip(self))]
    pub async fn lookup_cep(&self, cep: &Cep) -> Result<CepAddress, ApiError> {
        let path = format!("/cep/{}", cep.as_str());
        self.get_plain(&path, "CEP").await
    }

    // =========================================================================
    // Billing
    // =========================================================================

    /// Generate a static PIX QR code for a charge.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a domain rejection.
    #[instrument(skip(self, request), fields(value = %request.value))]
    pub async fn create_pix_charge(
        &self,
        request: &PixChargeRequest,
    ) -> Result<PixQrCode, ApiError> {
        self.post_enveloped("/cobranca/pix/qrCode/estatico", request, "cobrança PIX")
            .await
    }

    /// Create a hosted credit-card payment link.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a domain rejection.
    #[instrument(skip(self, request), fields(value = %request.value))]
    pub async fn create_card_link(&self, request: &CardLinkRequest) -> Result<CardLink, ApiError> {
        self.post_enveloped("/cobranca/cartao-de-credito", request, "link de pagamento")
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a domain rejection.
    #[instrument(skip(self, request), fields(total = %request.total))]
    pub async fn submit_order(&self, request: &OrderRequest) -> Result<Order, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/pedidos"))
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(response, "pedido").await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// List orders.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let list: OrderList = self.get_enveloped("/pedidos", "pedidos").await?;
        Ok(list.pedidos)
    }

    /// Request a status change for an order.
    ///
    /// The storefront only ever requests the next linear status; the server
    /// owns transition validation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown order.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let path = format!("/pedidos/{id}/status");
        let response = self
            .inner
            .client
            .put(self.url(&path))
            .json(&StatusUpdateRequest { status })
            .send()
            .await?;
        let response = Self::check_status(response, "pedido").await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch the product catalog, serving from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure when the cache is cold.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(products) = self.inner.catalog.get(CATALOG_KEY).await {
            debug!("catalog cache hit");
            return Ok(products);
        }

        let list: ProductList = self.get_enveloped("/produtos", "produtos").await?;
        let products = Arc::new(list.produtos);
        self.inner
            .catalog
            .insert(CATALOG_KEY, Arc::clone(&products))
            .await;
        Ok(products)
    }

    /// Fetch one product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the catalog has no such product.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.list_products()
            .await?
            .iter()
            .find(|p| p.produto_id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("produto {id}")))
    }

    /// Drop the cached catalog so the next read refetches.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate(CATALOG_KEY).await;
    }
}
