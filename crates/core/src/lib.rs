//! Almacen Core - Shared domain types.
//!
//! This crate provides common types used across all Almacen components:
//! - `catalog` - Query/filter/pagination/search engine for product listings
//! - `integration-tests` - Cross-component test suite
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs and the product/category domain model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
