//! Wire types for the delivery API.
//!
//! Field names follow the API's Portuguese camelCase JSON. Money crosses the
//! wire in integer centavos except billing charge values, which the payment
//! provider expects in decimal reais.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vale_acai_core::{Cep, ClientId, OrderId, OrderStatus, PaymentMethod, Phone, Price, ProductId};

use super::ApiError;

/// Generic `{ success, message, data }` response envelope.
///
/// `success: false` with a 2xx status is a domain rejection; the payload is
/// in `message` rather than `data`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the envelope, surfacing domain rejections as [`ApiError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` on `success: false`, or `ApiError::Parse`
    /// when a successful envelope carries no data.
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "requisição recusada".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Parse("response envelope missing data".to_string()))
    }
}

// =============================================================================
// Clients
// =============================================================================

/// A client record as returned by `GET /clientes/{phone}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub cliente_id: ClientId,
    pub nome: String,
    pub telefone: Phone,
    #[serde(default)]
    pub cpf: Option<String>,
}

/// A client's stored default address (`GET /clientes/{phone}/endereco`).
///
/// Every field is optional; a partially-filled record still prefills the
/// checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAddress {
    #[serde(default)]
    pub cep: Option<Cep>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub complemento: Option<String>,
}

/// Payload for `POST /clientes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClientRequest {
    pub nome: String,
    pub telefone: Phone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    pub endereco: AddressPayload,
}

/// Address fields as sent to the API (client creation and order submission).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub cep: String,
    pub cidade: String,
    pub bairro: String,
    pub logradouro: String,
    pub numero: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complemento: Option<String>,
}

// =============================================================================
// CEP lookup
// =============================================================================

/// Canonical address resolved from a CEP (`GET /cep/{code}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CepAddress {
    pub cidade: String,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl CepAddress {
    /// Whether the lookup carried geographic coordinates.
    ///
    /// With coordinates the user must explicitly confirm the pinned location
    /// before the address becomes usable; without them the address is
    /// confirmed immediately.
    #[must_use]
    pub const fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

// =============================================================================
// Billing (PIX and credit card)
// =============================================================================

/// Payload for `POST /cobranca/pix/qrCode/estatico`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixChargeRequest {
    pub description: String,
    /// Charge value in decimal reais (provider wire format).
    pub value: Decimal,
    pub expiration_seconds: u64,
    pub external_reference: String,
}

impl PixChargeRequest {
    /// Build a charge request for an order total.
    #[must_use]
    pub fn for_total(description: &str, total: Price, expiration_seconds: u64) -> Self {
        Self {
            description: description.to_string(),
            value: total.to_reais(),
            expiration_seconds,
            external_reference: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// A generated static PIX QR code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixQrCode {
    pub id: String,
    /// Base64-encoded PNG of the QR code.
    pub encoded_image: String,
    /// Copy-and-paste PIX payload string.
    pub payload: String,
    #[serde(default)]
    pub expiration_seconds: Option<u64>,
}

/// Payload for `POST /cobranca/cartao-de-credito`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinkRequest {
    pub name: String,
    pub description: String,
    pub billing_type: String,
    pub charge_type: String,
    /// Charge value in decimal reais (provider wire format).
    pub value: Decimal,
    pub external_reference: String,
}

impl CardLinkRequest {
    /// Build a hosted payment-link request for an order total.
    #[must_use]
    pub fn for_total(name: &str, description: &str, total: Price) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            billing_type: "CREDIT_CARD".to_string(),
            charge_type: "DETACHED".to_string(),
            value: total.to_reais(),
            external_reference: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// A hosted credit-card payment link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLink {
    pub id: String,
    pub url: String,
}

// =============================================================================
// Orders
// =============================================================================

/// One line item inside an order submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub produto_id: ProductId,
    pub quantidade: u32,
    /// Unit price in centavos.
    pub preco_unitario: Price,
}

/// Payload for `POST /pedidos`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub cliente_id: ClientId,
    pub endereco: AddressPayload,
    pub itens: Vec<OrderItemPayload>,
    /// Totals in centavos.
    pub subtotal: Price,
    pub taxa_entrega: Price,
    pub total: Price,
    pub forma_pagamento: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troco_para: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referencia_pagamento: Option<String>,
}

/// A server-owned order resource.
///
/// Also serializable: the confirmation page keeps the submitted order in the
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub pedido_id: OrderId,
    #[serde(default)]
    pub cliente_id: Option<ClientId>,
    pub status: OrderStatus,
    pub subtotal: Price,
    pub taxa_entrega: Price,
    pub total: Price,
    pub forma_pagamento: PaymentMethod,
    #[serde(default)]
    pub troco_para: Option<Price>,
    #[serde(default)]
    pub observacoes: Option<String>,
    #[serde(default)]
    pub referencia_pagamento: Option<String>,
    #[serde(default)]
    pub status_pagamento: Option<String>,
    pub criado_em: DateTime<Utc>,
    #[serde(default)]
    pub atualizado_em: Option<DateTime<Utc>>,
}

/// Wrapper inside the order-list envelope.
#[derive(Debug, Deserialize)]
pub struct OrderList {
    pub pedidos: Vec<Order>,
}

/// Payload for `PUT /pedidos/{id}/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

// =============================================================================
// Catalog
// =============================================================================

/// A sellable size of a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    /// Size label (e.g., "500ml").
    pub tamanho: String,
    pub tamanho_ml: u32,
    /// Unit price in centavos.
    pub preco: Price,
}

/// A catalog product. Fetched from the API, never mutated locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub produto_id: ProductId,
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
    pub disponivel: bool,
    /// Display order on the catalog page.
    #[serde(default)]
    pub ordem: i32,
    #[serde(default)]
    pub imagem: Option<String>,
    pub variacoes: Vec<Variation>,
}

impl Product {
    /// Find the variation with the given size, if the product sells it.
    #[must_use]
    pub fn variation(&self, size_ml: u32) -> Option<&Variation> {
        self.variacoes.iter().find(|v| v.tamanho_ml == size_ml)
    }
}

/// Wrapper inside the catalog envelope.
#[derive(Debug, Deserialize)]
pub struct ProductList {
    pub produtos: Vec<Product>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let envelope: Envelope<ClientRecord> = serde_json::from_str(
            r#"{
                "success": true,
                "data": {
                    "clienteId": 7,
                    "nome": "Maria Souza",
                    "telefone": "12998765432",
                    "cpf": "123.456.789-00"
                }
            }"#,
        )
        .unwrap();

        let record = envelope.into_result().unwrap();
        assert_eq!(record.cliente_id, ClientId::new(7));
        assert_eq!(record.nome, "Maria Souza");
        assert_eq!(record.telefone.as_str(), "12998765432");
    }

    #[test]
    fn test_envelope_implicit_success() {
        // Some endpoints omit the success flag entirely
        let envelope: Envelope<PixQrCode> = serde_json::from_str(
            r#"{
                "data": {
                    "id": "pix_abc",
                    "encodedImage": "aGVsbG8=",
                    "payload": "00020126...6304",
                    "expirationSeconds": 300
                }
            }"#,
        )
        .unwrap();

        let qr = envelope.into_result().unwrap();
        assert_eq!(qr.id, "pix_abc");
        assert_eq!(qr.expiration_seconds, Some(300));
    }

    #[test]
    fn test_envelope_domain_rejection() {
        let envelope: Envelope<ClientRecord> = serde_json::from_str(
            r#"{ "success": false, "message": "CPF inválido" }"#,
        )
        .unwrap();

        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Rejected(msg) if msg == "CPF inválido"));
    }

    #[test]
    fn test_envelope_missing_data() {
        let envelope: Envelope<ClientRecord> =
            serde_json::from_str(r#"{ "success": true }"#).unwrap();
        assert!(matches!(
            envelope.into_result(),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn test_cep_address_coordinates() {
        let with: CepAddress = serde_json::from_str(
            r#"{
                "cidade": "Ubatuba",
                "bairro": "Itaguá",
                "logradouro": "Rua Guarani",
                "latitude": -23.4336,
                "longitude": -45.0838
            }"#,
        )
        .unwrap();
        assert!(with.has_coordinates());

        let without: CepAddress =
            serde_json::from_str(r#"{ "cidade": "Ubatuba" }"#).unwrap();
        assert!(!without.has_coordinates());
    }

    #[test]
    fn test_order_request_wire_shape() {
        let request = OrderRequest {
            cliente_id: ClientId::new(7),
            endereco: AddressPayload {
                cep: "11680000".to_string(),
                cidade: "Ubatuba".to_string(),
                bairro: "Itaguá".to_string(),
                logradouro: "Rua Guarani".to_string(),
                numero: "120".to_string(),
                complemento: None,
            },
            itens: vec![OrderItemPayload {
                produto_id: ProductId::new(3),
                quantidade: 2,
                preco_unitario: Price::from_centavos(1700),
            }],
            subtotal: Price::from_centavos(3400),
            taxa_entrega: Price::from_centavos(500),
            total: Price::from_centavos(3900),
            forma_pagamento: PaymentMethod::Dinheiro,
            troco_para: Some(Price::from_centavos(5000)),
            observacoes: None,
            referencia_pagamento: None,
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["clienteId"], 7);
        assert_eq!(json["itens"][0]["produtoId"], 3);
        assert_eq!(json["itens"][0]["precoUnitario"], 1700);
        assert_eq!(json["formaPagamento"], "DINHEIRO");
        assert_eq!(json["trocoPara"], 5000);
        assert_eq!(json["total"], 3900);
        // Omitted optionals do not appear on the wire
        assert!(json.get("observacoes").is_none());
    }

    #[test]
    fn test_pix_charge_request_value_in_reais() {
        let request =
            PixChargeRequest::for_total("Pedido Vale Açaí", Price::from_centavos(3900), 300);
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["value"], "39.00");
        assert_eq!(json["expirationSeconds"], 300);
        assert!(!request.external_reference.is_empty());
    }

    #[test]
    fn test_product_variation_lookup() {
        let product: Product = serde_json::from_str(
            r#"{
                "produtoId": 3,
                "nome": "Açaí tradicional",
                "descricao": "Com banana e granola",
                "disponivel": true,
                "ordem": 1,
                "variacoes": [
                    { "tamanho": "300ml", "tamanhoMl": 300, "preco": 1200 },
                    { "tamanho": "500ml", "tamanhoMl": 500, "preco": 1700 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            product.variation(500).map(|v| v.preco),
            Some(Price::from_centavos(1700))
        );
        assert!(product.variation(700).is_none());
    }

    #[test]
    fn test_order_deserialization() {
        let order: Order = serde_json::from_str(
            r#"{
                "pedidoId": 41,
                "clienteId": 7,
                "status": "EM_PREPARO",
                "subtotal": 3400,
                "taxaEntrega": 500,
                "total": 3900,
                "formaPagamento": "PIX",
                "referenciaPagamento": "pix_abc",
                "statusPagamento": "PENDING",
                "criadoEm": "2025-11-03T18:22:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(order.pedido_id, OrderId::new(41));
        assert_eq!(order.status, OrderStatus::EmPreparo);
        assert_eq!(order.total, Price::from_centavos(3900));
        assert_eq!(order.referencia_pagamento.as_deref(), Some("pix_abc"));
        assert!(order.troco_para.is_none());
    }
}
