//! Almacen catalog engine.
//!
//! Turns an immutable [`filter::FilterState`] into a consistent, paginated,
//! race-free view of matching products, in numbered-page and
//! infinite-scroll modes, plus a debounced autocomplete search session.
//!
//! # Architecture
//!
//! - [`query::translate`] is the single predicate-building path; the row
//!   count and the data fetch both consume its output, so they cannot
//!   drift apart.
//! - [`page::PageFetcher`] and [`search::SearchSession`] discard stale
//!   responses via monotonic generation tokens;
//!   [`scroll::IncrementalFetcher`] enforces a single in-flight batch.
//! - [`facade::CatalogFacade`] composes the above over any
//!   [`store::ProductStore`] backend and applies a bounded timeout with a
//!   single retry at the fetch boundary.
//!
//! Backends: [`memory::MemoryStore`] (reference semantics, test fixture)
//! and, behind the `postgres` feature, [`postgres::PgStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod directory;
pub mod error;
pub mod facade;
pub mod filter;
pub mod memory;
pub mod page;
pub mod query;
pub mod scroll;
pub mod search;
pub mod store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::CatalogConfig;
pub use directory::CategoryDirectory;
pub use error::{CatalogError, StoreError};
pub use facade::{CatalogFacade, ListingMode, PageInfo, ReadModel};
pub use filter::{CategorySelector, FacetFlags, FilterState, PriceField, SortKey};
pub use memory::MemoryStore;
pub use query::{Predicate, ProductQuery, WHOLESALE_PRICE_FLOOR};
pub use search::{KeyOutcome, KeyPress, SearchHit, SearchSession, Segment};
pub use store::ProductStore;
