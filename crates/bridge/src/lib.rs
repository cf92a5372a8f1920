//! Product bridge library.
//!
//! Accepts product-creation requests over HTTP, creates the product with its
//! variants and images through the Shopify Admin GraphQL API, and mirrors the
//! result into `PostgreSQL`.
//!
//! # Security
//!
//! Shopify credentials are never configured server-side: every request
//! supplies its own shop domain and Admin API token in headers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod sync;
