//! Core types for Vale Açaí.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cep;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use cep::{Cep, CepError};
pub use id::*;
pub use money::Price;
pub use phone::{Phone, PhoneError};
pub use status::*;
