//! Checkout step machine.
//!
//! A linear three-step flow: client info, payment, confirmation. No branching
//! and no cycles; `advance`/`retreat` clamp at the boundaries.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use vale_acai_core::{ClientId, Phone};

use crate::models::session::keys;

/// The three checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Client,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    const ORDER: [Self; 3] = [Self::Client, Self::Payment, Self::Confirmation];

    /// Zero-based position in the flow.
    #[must_use]
    pub fn index(self) -> usize {
        // Self::ORDER covers every variant, so the position always exists
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// The following step, clamped at the last one.
    #[must_use]
    pub fn next(self) -> Self {
        let index = (self.index() + 1).min(Self::ORDER.len() - 1);
        Self::ORDER[index]
    }

    /// The preceding step, clamped at the first one.
    #[must_use]
    pub fn previous(self) -> Self {
        Self::ORDER[self.index().saturating_sub(1)]
    }

    /// Route path serving this step.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Client => "/checkout/cliente",
            Self::Payment => "/checkout/pagamento",
            Self::Confirmation => "/checkout/confirmacao",
        }
    }

    /// Human-readable pt-BR label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "Seus dados",
            Self::Payment => "Pagamento",
            Self::Confirmation => "Confirmação",
        }
    }
}

/// The client resolved (found or created) during the first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedClient {
    pub id: ClientId,
    pub name: String,
    pub phone: Phone,
}

/// Session-persisted checkout flow state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkout {
    pub step: CheckoutStep,
    pub client: Option<ResolvedClient>,
    /// Monotonically increasing phone-lookup sequence. A completed lookup
    /// whose captured sequence no longer matches is stale and gets discarded.
    pub lookup_seq: u64,
}

impl Checkout {
    /// Whether the current step's completion predicate is satisfied.
    ///
    /// Leaving `client` requires a resolved client. The payment transition
    /// carries no predicate; `confirmation` is the end of the line and
    /// `advance` clamps there regardless.
    #[must_use]
    pub const fn can_advance(&self) -> bool {
        match self.step {
            CheckoutStep::Client => self.client.is_some(),
            CheckoutStep::Payment | CheckoutStep::Confirmation => true,
        }
    }

    /// Move to the next step if the current step's predicate allows it.
    /// A no-op at the last step.
    pub fn advance(&mut self) {
        if self.can_advance() {
            self.step = self.step.next();
        }
    }

    /// Move to the previous step. A no-op at the first step.
    pub fn retreat(&mut self) {
        self.step = self.step.previous();
    }

    /// Record a resolved client.
    pub fn set_client(&mut self, client: ResolvedClient) {
        self.client = Some(client);
    }

    /// Issue the next lookup sequence number.
    pub const fn next_lookup_seq(&mut self) -> u64 {
        self.lookup_seq += 1;
        self.lookup_seq
    }

    // =========================================================================
    // Session persistence
    // =========================================================================

    /// Rehydrate checkout state from the session, defaulting when absent.
    pub async fn load(session: &Session) -> Self {
        session
            .get::<Self>(keys::CHECKOUT)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Persist checkout state to the session.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the write fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::CHECKOUT, self).await
    }

    /// Erase checkout state (after a completed or abandoned order).
    ///
    /// # Errors
    ///
    /// Returns the session store error if the removal fails.
    pub async fn erase(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(keys::CHECKOUT).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolved_client() -> ResolvedClient {
        ResolvedClient {
            id: ClientId::new(7),
            name: "Maria Souza".to_string(),
            phone: Phone::parse("12998765432").unwrap(),
        }
    }

    #[test]
    fn test_advance_blocked_without_client() {
        let mut checkout = Checkout::default();
        assert_eq!(checkout.step, CheckoutStep::Client);

        checkout.advance();
        assert_eq!(checkout.step, CheckoutStep::Client);
    }

    #[test]
    fn test_advance_permitted_after_client_set() {
        let mut checkout = Checkout::default();
        checkout.set_client(resolved_client());

        checkout.advance();
        assert_eq!(checkout.step, CheckoutStep::Payment);
    }

    #[test]
    fn test_payment_step_is_unguarded() {
        let mut checkout = Checkout {
            step: CheckoutStep::Payment,
            ..Checkout::default()
        };

        checkout.advance();
        assert_eq!(checkout.step, CheckoutStep::Confirmation);
    }

    #[test]
    fn test_advance_clamps_at_last_step() {
        let mut checkout = Checkout {
            step: CheckoutStep::Confirmation,
            ..Checkout::default()
        };

        checkout.advance();
        assert_eq!(checkout.step, CheckoutStep::Confirmation);
    }

    #[test]
    fn test_retreat_clamps_at_first_step() {
        let mut checkout = Checkout::default();

        checkout.retreat();
        assert_eq!(checkout.step, CheckoutStep::Client);
    }

    #[test]
    fn test_retreat_moves_back() {
        let mut checkout = Checkout {
            step: CheckoutStep::Confirmation,
            ..Checkout::default()
        };

        checkout.retreat();
        assert_eq!(checkout.step, CheckoutStep::Payment);
        checkout.retreat();
        assert_eq!(checkout.step, CheckoutStep::Client);
    }

    #[test]
    fn test_steps_never_leave_bounds() {
        let mut checkout = Checkout::default();
        checkout.set_client(resolved_client());

        for _ in 0..10 {
            checkout.advance();
            assert!(checkout.step.index() <= 2);
        }
        for _ in 0..10 {
            checkout.retreat();
            assert!(checkout.step.index() <= 2);
        }
        assert_eq!(checkout.step, CheckoutStep::Client);
    }

    #[test]
    fn test_lookup_seq_is_monotonic() {
        let mut checkout = Checkout::default();
        let first = checkout.next_lookup_seq();
        let second = checkout.next_lookup_seq();
        assert!(second > first);
    }
}
