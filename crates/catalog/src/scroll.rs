//! Infinite-scroll pagination controller.
//!
//! Unlike [`crate::page::PageFetcher`], at most one batch fetch is in
//! flight at a time (single-flight): a viewport trigger while loading is
//! ignored rather than superseded, so no generation token is needed.

use tracing::debug;

use almacen_core::Product;

use crate::error::StoreError;
use crate::query::ProductQuery;

/// A pending batch fetch.
#[derive(Debug, Clone)]
pub struct BatchTicket {
    pub query: ProductQuery,
    pub limit: u32,
    pub offset: u32,
}

/// Infinite-scroll controller accumulating batches under one predicate set.
#[derive(Debug)]
pub struct IncrementalFetcher {
    batch_size: u32,
    offset: u32,
    items: Vec<Product>,
    loading: bool,
    has_more: bool,
    error: Option<StoreError>,
}

impl IncrementalFetcher {
    #[must_use]
    pub const fn new(batch_size: u32) -> Self {
        Self {
            batch_size,
            offset: 0,
            items: Vec::new(),
            loading: false,
            has_more: true,
            error: None,
        }
    }

    /// Begin a fresh accumulation: clear the list, reset the cursor to 0,
    /// and issue the first batch. Used on initial load and after any
    /// predicate-relevant filter change.
    pub fn reset(&mut self, query: &ProductQuery) -> BatchTicket {
        self.items.clear();
        self.offset = 0;
        self.has_more = true;
        self.error = None;
        self.loading = true;
        BatchTicket {
            query: query.clone(),
            limit: self.batch_size,
            offset: 0,
        }
    }

    /// Viewport trigger: request the next batch.
    ///
    /// Returns `None` while a fetch is in flight or when the listing is
    /// exhausted; concurrent triggers are ignored, not queued.
    pub fn request_next(&mut self, query: &ProductQuery) -> Option<BatchTicket> {
        if self.loading || !self.has_more {
            debug!(
                loading = self.loading,
                has_more = self.has_more,
                "batch trigger ignored"
            );
            return None;
        }
        self.loading = true;
        Some(BatchTicket {
            query: query.clone(),
            limit: self.batch_size,
            offset: self.offset,
        })
    }

    /// Apply a batch outcome for the ticket issued at `offset`.
    ///
    /// A batch at offset 0 replaces the accumulated list; any other offset
    /// appends. `has_more` stays true iff the batch exactly filled the
    /// requested size - an approximation: when the listing's true end
    /// lands on a batch boundary, one extra empty fetch occurs before
    /// `has_more` turns false. Accepted, not special-cased.
    pub fn apply(&mut self, offset: u32, outcome: Result<Vec<Product>, StoreError>) {
        self.loading = false;
        match outcome {
            Ok(batch) => {
                self.has_more = batch.len() as u32 == self.batch_size;
                self.offset = offset + batch.len() as u32;
                if offset == 0 {
                    self.items = batch;
                } else {
                    self.items.extend(batch);
                }
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err);
            }
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use almacen_core::{CategoryId, ProductId};

    use super::*;
    use crate::filter::{PriceField, SortKey};
    use crate::query::Ordering;

    fn any_query() -> ProductQuery {
        ProductQuery {
            predicates: Vec::new(),
            order: Ordering {
                key: SortKey::NameAsc,
                price_field: PriceField::Retail,
            },
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("producto {id}"),
            long_description: String::new(),
            price: Decimal::from(100),
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

    fn batch(ids: std::ops::Range<i32>) -> Vec<Product> {
        ids.map(product).collect()
    }

    #[test]
    fn test_full_batch_appends_and_keeps_has_more() {
        let mut fetcher = IncrementalFetcher::new(2);
        let t = fetcher.reset(&any_query());
        fetcher.apply(t.offset, Ok(batch(1..3)));
        assert!(fetcher.has_more());

        let t = fetcher.request_next(&any_query()).expect("ticket");
        assert_eq!(t.offset, 2);
        fetcher.apply(t.offset, Ok(batch(3..5)));
        assert_eq!(fetcher.items().len(), 4);
    }

    #[test]
    fn test_short_batch_ends_listing() {
        let mut fetcher = IncrementalFetcher::new(2);
        let t = fetcher.reset(&any_query());
        fetcher.apply(t.offset, Ok(batch(1..2)));
        assert!(!fetcher.has_more());
        assert!(fetcher.request_next(&any_query()).is_none());
    }

    #[test]
    fn test_single_flight_while_loading() {
        let mut fetcher = IncrementalFetcher::new(2);
        let t = fetcher.reset(&any_query());
        // Trigger fires again before the first batch resolves.
        assert!(fetcher.request_next(&any_query()).is_none());
        fetcher.apply(t.offset, Ok(batch(1..3)));
        assert!(fetcher.request_next(&any_query()).is_some());
    }

    #[test]
    fn test_reset_clears_accumulated_list() {
        let mut fetcher = IncrementalFetcher::new(2);
        let t = fetcher.reset(&any_query());
        fetcher.apply(t.offset, Ok(batch(1..3)));
        assert_eq!(fetcher.items().len(), 2);

        let t = fetcher.reset(&any_query());
        assert!(fetcher.items().is_empty());
        assert_eq!(t.offset, 0);
        fetcher.apply(t.offset, Ok(batch(10..12)));
        assert_eq!(fetcher.items().len(), 2);
        assert_eq!(fetcher.items().first().map(|p| p.id), Some(ProductId::new(10)));
    }

    #[test]
    fn test_error_is_terminal_until_retriggered() {
        let mut fetcher = IncrementalFetcher::new(2);
        let t = fetcher.reset(&any_query());
        fetcher.apply(t.offset, Err(StoreError::Unreachable("down".to_string())));
        assert!(fetcher.error().is_some());
        assert!(!fetcher.is_loading());
    }
}
