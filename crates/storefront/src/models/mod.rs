//! Domain models for storefront.

pub mod cart;
pub mod checkout;
pub mod pix;
pub mod review;
pub mod session;

pub use cart::{Cart, CartItem, DeliveryAddress};
pub use checkout::{Checkout, CheckoutStep, ResolvedClient};
pub use pix::StoredPixCharge;
pub use review::{NewReview, Review, ReviewValidationError};
