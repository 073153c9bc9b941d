//! Money in integer centavos.
//!
//! All money math in the storefront happens on integer minor-currency units
//! to avoid floating-point rounding. The only place decimals appear is at the
//! wire boundary, where the billing API expects values in reais.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in integer centavos (BRL minor units).
///
/// ## Examples
///
/// ```
/// use vale_acai_core::Price;
///
/// let unit = Price::from_centavos(1700);
/// let line = unit.times(2);
/// assert_eq!(line.centavos(), 3400);
/// assert_eq!((line + Price::from_centavos(500)).centavos(), 3900);
/// assert_eq!(unit.to_string(), "R$ 17,00");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero centavos.
    pub const ZERO: Self = Self(0);

    /// Create a price from integer centavos.
    #[must_use]
    pub const fn from_centavos(centavos: i64) -> Self {
        Self(centavos)
    }

    /// The amount in centavos.
    #[must_use]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Multiply by a line-item quantity, saturating on overflow.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// The amount as decimal reais for the billing API wire format.
    #[must_use]
    pub fn to_reais(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}R$ {},{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_brl() {
        assert_eq!(Price::from_centavos(1700).to_string(), "R$ 17,00");
        assert_eq!(Price::from_centavos(500).to_string(), "R$ 5,00");
        assert_eq!(Price::from_centavos(9).to_string(), "R$ 0,09");
        assert_eq!(Price::from_centavos(123_456).to_string(), "R$ 1234,56");
        assert_eq!(Price::ZERO.to_string(), "R$ 0,00");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::from_centavos(-250).to_string(), "-R$ 2,50");
    }

    #[test]
    fn test_times_and_add() {
        let line = Price::from_centavos(1700).times(2);
        assert_eq!(line.centavos(), 3400);
        assert_eq!((line + Price::from_centavos(500)).centavos(), 3900);
    }

    #[test]
    fn test_sum() {
        let total: Price = [700, 800, 900]
            .into_iter()
            .map(Price::from_centavos)
            .sum();
        assert_eq!(total.centavos(), 2400);
    }

    #[test]
    fn test_to_reais() {
        assert_eq!(Price::from_centavos(3900).to_reais().to_string(), "39.00");
        assert_eq!(Price::from_centavos(9).to_reais().to_string(), "0.09");
    }

    #[test]
    fn test_serde_transparent() {
        let price = Price::from_centavos(1700);
        assert_eq!(serde_json::to_string(&price).unwrap(), "1700");

        let parsed: Price = serde_json::from_str("1700").unwrap();
        assert_eq!(parsed, price);
    }
}
