//! Session-stored PIX charge with expiration.
//!
//! The generated code lives in the session while the countdown runs. The
//! countdown endpoint recomputes remaining seconds from the stored creation
//! instant; when it hits zero the code is discarded and the user must
//! regenerate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::types::PixQrCode;
use crate::models::session::keys;

/// A generated PIX charge held in the session until paid or expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPixCharge {
    /// Charge id at the payment provider (goes on the order as the payment
    /// reference).
    pub id: String,
    /// Copy-and-paste PIX payload string.
    pub payload: String,
    /// Base64-encoded PNG of the QR code.
    pub encoded_image: String,
    pub created_at: DateTime<Utc>,
    pub expiration_seconds: u64,
}

impl StoredPixCharge {
    /// Store a freshly generated QR code.
    ///
    /// The API may echo its own expiration; otherwise the configured default
    /// applies.
    #[must_use]
    pub fn new(qr: PixQrCode, default_expiration_seconds: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: qr.id,
            payload: qr.payload,
            encoded_image: qr.encoded_image,
            created_at: now,
            expiration_seconds: qr.expiration_seconds.unwrap_or(default_expiration_seconds),
        }
    }

    /// Whole seconds left on the countdown, clamped at zero.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = now.signed_duration_since(self.created_at).num_seconds();
        // A clock behind the creation instant means nothing has elapsed yet
        let elapsed = u64::try_from(elapsed).unwrap_or(0);
        self.expiration_seconds.saturating_sub(elapsed)
    }

    /// Whether the countdown has reached zero.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds(now) == 0
    }

    // =========================================================================
    // Session persistence
    // =========================================================================

    /// The charge currently held in the session, if any.
    pub async fn load(session: &Session) -> Option<Self> {
        session.get::<Self>(keys::PIX_CHARGE).await.ok().flatten()
    }

    /// Persist this charge to the session.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the write fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::PIX_CHARGE, self).await
    }

    /// Discard the stored charge (expiry or successful payment).
    ///
    /// # Errors
    ///
    /// Returns the session store error if the removal fails.
    pub async fn discard(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(keys::PIX_CHARGE).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn charge_at(created_at: DateTime<Utc>) -> StoredPixCharge {
        StoredPixCharge {
            id: "pix_abc".to_string(),
            payload: "00020126...6304".to_string(),
            encoded_image: "aGVsbG8=".to_string(),
            created_at,
            expiration_seconds: 300,
        }
    }

    #[test]
    fn test_countdown_starts_at_expiration() {
        let t0 = Utc.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap();
        let charge = charge_at(t0);

        assert_eq!(charge.remaining_seconds(t0), 300);
        assert!(!charge.is_expired(t0));
    }

    #[test]
    fn test_countdown_reaches_zero_after_300_ticks() {
        let t0 = Utc.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap();
        let charge = charge_at(t0);

        // One tick per second: after the 299th the clock still shows 1
        let almost = t0 + chrono::Duration::seconds(299);
        assert_eq!(charge.remaining_seconds(almost), 1);

        let expired = t0 + chrono::Duration::seconds(300);
        assert_eq!(charge.remaining_seconds(expired), 0);
        assert!(charge.is_expired(expired));
    }

    #[test]
    fn test_countdown_clamps_past_expiry() {
        let t0 = Utc.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap();
        let charge = charge_at(t0);

        let long_after = t0 + chrono::Duration::hours(2);
        assert_eq!(charge.remaining_seconds(long_after), 0);
    }

    #[test]
    fn test_new_prefers_api_expiration() {
        let t0 = Utc.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap();

        let with_echo = StoredPixCharge::new(
            PixQrCode {
                id: "a".to_string(),
                encoded_image: String::new(),
                payload: String::new(),
                expiration_seconds: Some(120),
            },
            300,
            t0,
        );
        assert_eq!(with_echo.expiration_seconds, 120);

        let without_echo = StoredPixCharge::new(
            PixQrCode {
                id: "b".to_string(),
                encoded_image: String::new(),
                payload: String::new(),
                expiration_seconds: None,
            },
            300,
            t0,
        );
        assert_eq!(without_echo.expiration_seconds, 300);
    }
}
