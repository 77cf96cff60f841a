//! The consumed read-path capability of the backing product store.

use almacen_core::{Category, Product};

use crate::error::StoreError;
use crate::filter::{PriceField, SortKey};
use crate::query::{Ordering, Predicate, ProductQuery};

/// Read-path capability of a product data store.
///
/// `count` and `fetch` take the *same* predicate descriptor, built once by
/// [`crate::query::translate`]; implementations must not re-derive filter
/// logic for one of the two.
pub trait ProductStore {
    /// Count rows matching the predicate set. No ordering, no projection.
    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError>;

    /// Fetch one `(limit, offset)` window of matching rows, ordered.
    async fn fetch(
        &self,
        query: &ProductQuery,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Product>, StoreError>;

    /// All categories, in store order.
    async fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Autocomplete search: active products whose name or description
    /// contains `term`, capped at `limit`.
    ///
    /// The default implementation routes through [`ProductStore::fetch`]
    /// so that search shares the predicate semantics of listings.
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Product>, StoreError> {
        let query = ProductQuery {
            predicates: vec![
                Predicate::Active,
                Predicate::TextContains(term.to_string()),
            ],
            order: Ordering {
                key: SortKey::NameAsc,
                price_field: PriceField::Retail,
            },
        };
        self.fetch(&query, limit, 0).await
    }
}

/// Stores are usable behind shared references, e.g. one store serving
/// several listings.
impl<S: ProductStore> ProductStore for &S {
    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        (**self).count(predicates).await
    }

    async fn fetch(
        &self,
        query: &ProductQuery,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Product>, StoreError> {
        (**self).fetch(query, limit, offset).await
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        (**self).categories().await
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Product>, StoreError> {
        (**self).search(term, limit).await
    }
}
