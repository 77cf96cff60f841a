//! In-memory product store.
//!
//! The reference [`ProductStore`] backend: predicate evaluation and
//! ordering delegate to the descriptors in [`crate::query`], so its
//! behavior is the contract other backends are tested against. Used as the
//! fixture store throughout the test suite.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use almacen_core::{Category, Product};

use crate::error::StoreError;
use crate::query::{Predicate, ProductQuery};
use crate::store::ProductStore;

/// A product store over an in-memory collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    categories: Vec<Category>,
    products: Vec<Product>,
    /// Queued failures, consumed one per store call. Lets tests exercise
    /// the fetch-boundary error and retry paths; queue two failures to
    /// defeat the single retry.
    failures: Mutex<VecDeque<StoreError>>,
    count_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(categories: Vec<Category>, products: Vec<Product>) -> Self {
        Self {
            categories,
            products,
            failures: Mutex::new(VecDeque::new()),
            count_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Queue a failure for an upcoming store call.
    pub fn fail_next(&self, error: StoreError) {
        if let Ok(mut queue) = self.failures.lock() {
            queue.push_back(error);
        }
    }

    /// How many times `count` has been called.
    #[must_use]
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(AtomicOrdering::SeqCst)
    }

    /// How many times `fetch` has been called (searches included).
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(AtomicOrdering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.failures.lock() {
            Ok(mut queue) => queue.pop_front().map_or(Ok(()), Err),
            Err(_) => Ok(()),
        }
    }
}

impl ProductStore for MemoryStore {
    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        self.count_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        let count = self
            .products
            .iter()
            .filter(|p| predicates.iter().all(|pred| pred.matches(p)))
            .count();
        Ok(count as u64)
    }

    async fn fetch(
        &self,
        query: &ProductQuery,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Product>, StoreError> {
        self.fetch_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        let mut matching: Vec<Product> = self
            .products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.order.compare(a, b));
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.take_failure()?;
        Ok(self.categories.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use almacen_core::{CategoryId, ProductId};

    use super::*;
    use crate::filter::{FilterState, SortKey};
    use crate::query::translate;
    use crate::{directory::CategoryDirectory, filter::CategoryScope};

    fn product(id: i32, name: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            long_description: String::new(),
            price: Decimal::from(price),
            wholesale_price: None,
            category_id: CategoryId::new(1),
            category_name: "aseo".to_string(),
            image_url: None,
            featured: false,
            on_offer: false,
            wholesale_eligible: false,
            active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("ts"),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![Category::new(1, "aseo")],
            vec![
                product(3, "crema", 3000),
                product(1, "jabon", 500),
                product(2, "shampoo", 1500),
            ],
        )
    }

    fn query_sorted(sort: SortKey) -> ProductQuery {
        let filter = FilterState {
            sort,
            ..FilterState::default()
        };
        let directory = CategoryDirectory::from_categories(vec![Category::new(1, "aseo")]);
        let resolved = filter.resolve(&directory);
        assert_eq!(resolved.category, CategoryScope::All);
        translate(&resolved)
    }

    #[tokio::test]
    async fn test_fetch_orders_and_windows() {
        let store = store();
        let query = query_sorted(SortKey::PriceAsc);

        let page = store.fetch(&query, 2, 0).await.expect("fetch");
        let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["jabon", "shampoo"]);

        let page = store.fetch(&query, 2, 2).await.expect("fetch");
        let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["crema"]);
    }

    #[tokio::test]
    async fn test_count_and_fetch_share_predicates() {
        let store = store();
        let query = query_sorted(SortKey::NameAsc);
        let count = store.count(&query.predicates).await.expect("count");
        let all = store.fetch(&query, 100, 0).await.expect("fetch");
        assert_eq!(count as usize, all.len());
    }

    #[tokio::test]
    async fn test_search_is_active_only_and_capped() {
        let mut inactive = product(9, "jabon viejo", 100);
        inactive.active = false;
        let store = MemoryStore::new(
            vec![Category::new(1, "aseo")],
            vec![product(1, "jabon", 500), inactive],
        );

        let hits = store.search("jabon", 20).await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().map(|p| p.id), Some(ProductId::new(1)));
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let store = store();
        store.fail_next(StoreError::Unreachable("down".to_string()));
        assert!(store.categories().await.is_err());
        assert!(store.categories().await.is_ok());
    }
}
