//! Product Bridge Core - Shared types library.
//!
//! This crate provides the types shared by the product bridge components:
//! - `bridge` - HTTP service that creates products on Shopify and mirrors them locally
//! - `cli` - Command-line tools for migrations and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and variation titles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
