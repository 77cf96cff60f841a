//! Core types for Almacen.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;
pub mod product;

pub use category::Category;
pub use id::*;
pub use product::Product;
