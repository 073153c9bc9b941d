//! Session-persisted cart.
//!
//! The cart is a plain synchronous reducer: each request loads it from the
//! session, applies one mutation, and saves it back. There is exactly one
//! writer per session, so no locking discipline is needed.
//!
//! Persistence uses three independent session keys (items, address, payment
//! method). A missing or corrupt value falls back to that field's default
//! without touching the others.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use vale_acai_core::{PaymentMethod, Price, ProductId};

use crate::api::types::AddressPayload;
use crate::models::session::keys;

/// One cart line: a product in one specific size.
///
/// Uniqueness invariant: at most one item per `(product_id, size_ml)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    /// Size label shown in the UI (e.g., "500ml").
    pub size_label: String,
    pub size_ml: u32,
    /// Unit price in centavos.
    pub unit_price: Price,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The delivery address attached to the cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// Bare 8-digit CEP.
    pub postal_code: String,
    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Whether the user confirmed the pinned location. Addresses resolved
    /// without coordinates are confirmed immediately.
    pub confirmed: bool,
}

impl DeliveryAddress {
    /// Convert to the API wire shape.
    #[must_use]
    pub fn to_payload(&self) -> AddressPayload {
        AddressPayload {
            cep: self.postal_code.clone(),
            cidade: self.city.clone(),
            bairro: self.neighborhood.clone(),
            logradouro: self.street.clone(),
            numero: self.number.clone(),
            complemento: self.complement.clone(),
        }
    }
}

/// The cart: ordered line items plus delivery address and payment selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub address: Option<DeliveryAddress>,
    pub payment_method: Option<PaymentMethod>,
}

impl Cart {
    /// Add an item. An existing `(product_id, size_ml)` entry has its
    /// quantity incremented instead of being duplicated.
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id && i.size_ml == item.size_ml)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Remove all entries matching `(product_id, size_ml)`. Removing a pair
    /// that is not present is a no-op.
    pub fn remove_item(&mut self, product_id: ProductId, size_ml: u32) {
        self.items
            .retain(|i| !(i.product_id == product_id && i.size_ml == size_ml));
    }

    /// Replace the quantity of the matching entry in place. A requested
    /// quantity of zero or less behaves as remove.
    pub fn set_quantity(&mut self, product_id: ProductId, size_ml: u32, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity) else {
            // Negative requested quantity
            self.remove_item(product_id, size_ml);
            return;
        };
        if quantity == 0 {
            self.remove_item(product_id, size_ml);
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id && i.size_ml == size_ml)
        {
            item.quantity = quantity;
        }
    }

    pub fn set_address(&mut self, address: DeliveryAddress) {
        self.address = Some(address);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    /// Reset to the initial empty state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sum over items of `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Subtotal plus the flat delivery fee.
    #[must_use]
    pub fn total(&self, delivery_fee: Price) -> Price {
        self.subtotal() + delivery_fee
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |acc, i| acc.saturating_add(i.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // =========================================================================
    // Session persistence
    // =========================================================================

    /// Rehydrate the cart from the session.
    ///
    /// Each key falls back to its default when absent or unreadable.
    pub async fn load(session: &Session) -> Self {
        let items = session
            .get::<Vec<CartItem>>(keys::CART_ITEMS)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        let address = session
            .get::<DeliveryAddress>(keys::CART_ADDRESS)
            .await
            .ok()
            .flatten();
        let payment_method = session
            .get::<PaymentMethod>(keys::CART_PAYMENT_METHOD)
            .await
            .ok()
            .flatten();

        Self {
            items,
            address,
            payment_method,
        }
    }

    /// Persist the cart to the session, one key per field.
    ///
    /// # Errors
    ///
    /// Returns the session store error if a write fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::CART_ITEMS, &self.items).await?;
        match &self.address {
            Some(address) => session.insert(keys::CART_ADDRESS, address).await?,
            None => {
                session.remove::<DeliveryAddress>(keys::CART_ADDRESS).await?;
            }
        }
        match self.payment_method {
            Some(method) => session.insert(keys::CART_PAYMENT_METHOD, method).await?,
            None => {
                session
                    .remove::<PaymentMethod>(keys::CART_PAYMENT_METHOD)
                    .await?;
            }
        }
        Ok(())
    }

    /// Erase all persisted cart keys.
    ///
    /// # Errors
    ///
    /// Returns the session store error if a removal fails.
    pub async fn erase(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Vec<CartItem>>(keys::CART_ITEMS).await?;
        session.remove::<DeliveryAddress>(keys::CART_ADDRESS).await?;
        session
            .remove::<PaymentMethod>(keys::CART_PAYMENT_METHOD)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product_id: i32, size_ml: u32, unit_price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(product_id),
            product_name: format!("Produto {product_id}"),
            size_label: format!("{size_ml}ml"),
            size_ml,
            unit_price: Price::from_centavos(unit_price),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_add_same_pair_increments_quantity() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 500, 1700, 1));
        cart.add_item(item(1, 500, 1700, 1));

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn test_add_different_size_is_new_line() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 300, 1200, 1));
        cart.add_item(item(1, 500, 1700, 1));

        assert_eq!(cart.items.len(), 2);
    }

    #[test]
    fn test_remove_missing_pair_is_noop() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 500, 1700, 2));

        cart.remove_item(ProductId::new(9), 500);
        cart.remove_item(ProductId::new(1), 300);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn test_set_quantity_replaces_in_place() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 300, 1200, 1));
        cart.add_item(item(1, 500, 1700, 1));

        cart.set_quantity(ProductId::new(1), 500, 4);

        assert_eq!(cart.items[0].quantity, 1);
        assert_eq!(cart.items[1].quantity, 4);
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 500, 1700, 2));
        cart.set_quantity(ProductId::new(1), 500, 0);
        assert!(cart.is_empty());

        cart.add_item(item(1, 500, 1700, 2));
        cart.set_quantity(ProductId::new(1), 500, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal_and_total() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 500, 1700, 2));

        // Worked example: 1700 × 2 + fee 500
        assert_eq!(cart.subtotal(), Price::from_centavos(3400));
        assert_eq!(
            cart.total(Price::from_centavos(500)),
            Price::from_centavos(3900)
        );
    }

    #[test]
    fn test_subtotal_across_lines() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 300, 1200, 1));
        cart.add_item(item(2, 500, 1700, 3));

        assert_eq!(cart.subtotal(), Price::from_centavos(1200 + 3 * 1700));
    }

    #[test]
    fn test_item_count() {
        let mut cart = Cart::default();
        assert_eq!(cart.item_count(), 0);

        cart.add_item(item(1, 300, 1200, 2));
        cart.add_item(item(2, 500, 1700, 3));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = Cart::default();
        cart.add_item(item(1, 500, 1700, 1));
        cart.set_payment_method(PaymentMethod::Pix);
        cart.set_address(DeliveryAddress {
            postal_code: "11680000".to_string(),
            city: "Ubatuba".to_string(),
            ..DeliveryAddress::default()
        });

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.address.is_none());
        assert!(cart.payment_method.is_none());
    }
}
