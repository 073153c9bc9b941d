//! Session-related types.
//!
//! The cart persists under three independent keys, mirroring the lifecycle
//! the UI expects: each field rehydrates on its own and a corrupt or absent
//! value only costs that one field.

/// Session keys for persisted state.
pub mod keys {
    /// Key for the cart line items.
    pub const CART_ITEMS: &str = "cart_items";

    /// Key for the delivery address.
    pub const CART_ADDRESS: &str = "cart_address";

    /// Key for the selected payment method.
    pub const CART_PAYMENT_METHOD: &str = "cart_payment_method";

    /// Key for checkout flow state (step, resolved client, lookup sequence).
    pub const CHECKOUT: &str = "checkout";

    /// Key for the currently displayed PIX charge.
    pub const PIX_CHARGE: &str = "pix_charge";

    /// Key for the last successfully submitted order (confirmation page).
    pub const LAST_ORDER: &str = "last_order";
}
