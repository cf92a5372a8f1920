//! Core types for the product bridge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod title;

pub use id::*;
pub use price::{Price, PriceError};
pub use title::{VariationTitle, VariationTitleError};
