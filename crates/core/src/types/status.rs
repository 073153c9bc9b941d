//! Status and payment-method enums.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Matches the delivery API's status values. The storefront never validates
/// transitions locally; it only offers UI actions that request the next
/// linear status from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Recebido,
    EmPreparo,
    SaiuParaEntrega,
    Entregue,
    Cancelado,
}

impl OrderStatus {
    /// The next status on the linear happy path, if any.
    ///
    /// `Entregue` and `Cancelado` are terminal.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Recebido => Some(Self::EmPreparo),
            Self::EmPreparo => Some(Self::SaiuParaEntrega),
            Self::SaiuParaEntrega => Some(Self::Entregue),
            Self::Entregue | Self::Cancelado => None,
        }
    }

    /// Whether no further status can be requested.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Human-readable pt-BR label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recebido => "Recebido",
            Self::EmPreparo => "Em preparo",
            Self::SaiuParaEntrega => "Saiu para entrega",
            Self::Entregue => "Entregue",
            Self::Cancelado => "Cancelado",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recebido => write!(f, "RECEBIDO"),
            Self::EmPreparo => write!(f, "EM_PREPARO"),
            Self::SaiuParaEntrega => write!(f, "SAIU_PARA_ENTREGA"),
            Self::Entregue => write!(f, "ENTREGUE"),
            Self::Cancelado => write!(f, "CANCELADO"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEBIDO" => Ok(Self::Recebido),
            "EM_PREPARO" => Ok(Self::EmPreparo),
            "SAIU_PARA_ENTREGA" => Ok(Self::SaiuParaEntrega),
            "ENTREGUE" => Ok(Self::Entregue),
            "CANCELADO" => Ok(Self::Cancelado),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment method selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Pix,
    CartaoDeCredito,
    Dinheiro,
}

impl PaymentMethod {
    /// Human-readable pt-BR label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pix => "Pix",
            Self::CartaoDeCredito => "Cartão de crédito",
            Self::Dinheiro => "Dinheiro",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pix => write!(f, "PIX"),
            Self::CartaoDeCredito => write!(f, "CARTAO_DE_CREDITO"),
            Self::Dinheiro => write!(f, "DINHEIRO"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PIX" => Ok(Self::Pix),
            "CARTAO_DE_CREDITO" => Ok(Self::CartaoDeCredito),
            "DINHEIRO" => Ok(Self::Dinheiro),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_linear_path() {
        assert_eq!(OrderStatus::Recebido.next(), Some(OrderStatus::EmPreparo));
        assert_eq!(
            OrderStatus::EmPreparo.next(),
            Some(OrderStatus::SaiuParaEntrega)
        );
        assert_eq!(
            OrderStatus::SaiuParaEntrega.next(),
            Some(OrderStatus::Entregue)
        );
        assert_eq!(OrderStatus::Entregue.next(), None);
        assert_eq!(OrderStatus::Cancelado.next(), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(OrderStatus::Entregue.is_terminal());
        assert!(OrderStatus::Cancelado.is_terminal());
        assert!(!OrderStatus::Recebido.is_terminal());
    }

    #[test]
    fn test_status_serde_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::SaiuParaEntrega).unwrap(),
            "\"SAIU_PARA_ENTREGA\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"EM_PREPARO\"").unwrap();
        assert_eq!(parsed, OrderStatus::EmPreparo);
    }

    #[test]
    fn test_status_from_str_roundtrip() {
        for status in [
            OrderStatus::Recebido,
            OrderStatus::EmPreparo,
            OrderStatus::SaiuParaEntrega,
            OrderStatus::Entregue,
            OrderStatus::Cancelado,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("PREPARANDO".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Dinheiro).unwrap(),
            "\"DINHEIRO\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CartaoDeCredito).unwrap(),
            "\"CARTAO_DE_CREDITO\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"PIX\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Pix);
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Pix.label(), "Pix");
        assert_eq!(PaymentMethod::CartaoDeCredito.label(), "Cartão de crédito");
        assert_eq!(PaymentMethod::Dinheiro.label(), "Dinheiro");
    }
}
