//! Single entry point for product listings.
//!
//! The facade owns the filter state, the category directory, and one
//! listing controller, and runs every store call through the same bounded
//! timeout + single retry. It is also the one place that enforces the
//! reset-on-filter-change rule, so the paged and infinite variants can
//! never diverge in behavior.

use tracing::{instrument, warn};

use almacen_core::Product;

use crate::config::CatalogConfig;
use crate::directory::CategoryDirectory;
use crate::error::{Result, StoreError};
use crate::filter::FilterState;
use crate::page::{PageData, PageFetcher, PageTicket};
use crate::query::{ProductQuery, translate};
use crate::scroll::{BatchTicket, IncrementalFetcher};
use crate::search::{SearchQuery, SearchSession};
use crate::store::ProductStore;

/// How a listing presents its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// Numbered pages with a page-button window.
    Paged,
    /// Infinite scroll accumulating batches.
    Infinite,
}

enum Listing {
    Paged(PageFetcher),
    Infinite(IncrementalFetcher),
}

/// Page-navigation metadata for paged listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    /// The visible page buttons, centered on the current page.
    pub window: Vec<u32>,
}

/// The read model consumed by presentation.
#[derive(Debug)]
pub struct ReadModel<'a> {
    pub items: &'a [Product],
    pub loading: bool,
    /// Terminal fetch failure; replaces the listing until the shopper
    /// re-triggers a filter change or an explicit reload.
    pub error: Option<String>,
    /// Present in paged mode.
    pub page_info: Option<PageInfo>,
    /// Present in infinite mode.
    pub has_more: Option<bool>,
}

/// Composes translator, store, and one listing controller behind a single
/// read model.
pub struct CatalogFacade<S> {
    store: S,
    directory: CategoryDirectory,
    config: CatalogConfig,
    filter: FilterState,
    listing: Listing,
    search: SearchSession,
}

impl<S: ProductStore> CatalogFacade<S> {
    /// Build a facade and run the initial fetch.
    ///
    /// A failed initial fetch is not fatal: it surfaces as the read
    /// model's `error` state like any later fetch.
    ///
    /// # Errors
    ///
    /// Returns an error when the filter is invalid or the category
    /// directory cannot be loaded.
    pub async fn new(
        store: S,
        config: CatalogConfig,
        mode: ListingMode,
        filter: FilterState,
    ) -> Result<Self> {
        filter.validate()?;
        let directory = CategoryDirectory::load(&store).await?;
        let listing = match mode {
            ListingMode::Paged => Listing::Paged(PageFetcher::new(config.page_size)),
            ListingMode::Infinite => Listing::Infinite(IncrementalFetcher::new(config.batch_size)),
        };
        let search = SearchSession::new(config.search_limit);
        let mut facade = Self {
            store,
            directory,
            config,
            filter,
            listing,
            search,
        };
        facade.reload().await;
        Ok(facade)
    }

    /// Replace the filter state.
    ///
    /// Any predicate-relevant change resets the listing to its start
    /// (page 1 or an empty accumulation) and refetches. An identical
    /// filter is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CatalogError::InvalidPriceBounds`] before any query when
    /// the bounds are malformed; the previous filter stays in effect.
    #[instrument(skip(self, filter))]
    pub async fn set_filter(&mut self, filter: FilterState) -> Result<()> {
        filter.validate()?;
        if filter == self.filter {
            return Ok(());
        }
        self.filter = filter;
        self.reload().await;
        Ok(())
    }

    /// Re-run the current listing from its start. Also the shopper's
    /// explicit retry action after an error.
    pub async fn reload(&mut self) {
        let query = self.current_query();
        match &mut self.listing {
            Listing::Paged(fetcher) => {
                let ticket = fetcher.request_reset(&query);
                self.run_page_ticket(ticket).await;
            }
            Listing::Infinite(fetcher) => {
                let ticket = fetcher.reset(&query);
                self.run_batch_ticket(ticket).await;
            }
        }
    }

    /// Navigate to a numbered page.
    ///
    /// Returns `Ok(false)` when the page is outside `[1, total_pages]`
    /// (the navigation is rejected, nothing is fetched) or the listing is
    /// not in paged mode.
    pub async fn go_to_page(&mut self, page: u32) -> Result<bool> {
        let query = self.current_query();
        let Listing::Paged(fetcher) = &mut self.listing else {
            return Ok(false);
        };
        let Some(ticket) = fetcher.request_page(page, &query) else {
            return Ok(false);
        };
        self.run_page_ticket(ticket).await;
        Ok(true)
    }

    /// Viewport trigger in infinite mode: fetch the next batch.
    ///
    /// Returns `Ok(false)` when ignored (already loading, exhausted, or
    /// not in infinite mode).
    pub async fn load_more(&mut self) -> Result<bool> {
        let query = self.current_query();
        let Listing::Infinite(fetcher) = &mut self.listing else {
            return Ok(false);
        };
        let Some(ticket) = fetcher.request_next(&query) else {
            return Ok(false);
        };
        self.run_batch_ticket(ticket).await;
        Ok(true)
    }

    /// Register the presentation callback fired on accepted page changes.
    pub fn set_page_change_callback(&mut self, callback: impl Fn() + Send + 'static) {
        if let Listing::Paged(fetcher) = &mut self.listing {
            fetcher.set_page_change_callback(callback);
        }
    }

    /// The read model for the current listing state.
    #[must_use]
    pub fn read(&self) -> ReadModel<'_> {
        match &self.listing {
            Listing::Paged(fetcher) => ReadModel {
                items: fetcher.items(),
                loading: fetcher.phase() == crate::page::FetchPhase::Loading,
                error: fetcher.error().map(ToString::to_string),
                page_info: Some(PageInfo {
                    current_page: fetcher.state().current_page,
                    total_pages: fetcher.state().total_pages(),
                    total_count: fetcher.state().total_count,
                    window: fetcher.page_window(self.config.visible_page_buttons),
                }),
                has_more: None,
            },
            Listing::Infinite(fetcher) => ReadModel {
                items: fetcher.items(),
                loading: fetcher.is_loading(),
                error: fetcher.error().map(ToString::to_string),
                page_info: None,
                has_more: Some(fetcher.has_more()),
            },
        }
    }

    /// The current filter state.
    #[must_use]
    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The category directory snapshot.
    #[must_use]
    pub const fn directory(&self) -> &CategoryDirectory {
        &self.directory
    }

    // ------------------------------------------------------------------
    // Autocomplete session
    // ------------------------------------------------------------------

    /// The shopper edited the search input. Arms the debounce and returns
    /// the generation to pass to [`Self::run_search`].
    pub fn search_input(&mut self, text: &str) -> u64 {
        self.search.input_changed(text)
    }

    /// Drive one keystroke's debounce-and-query cycle: sleep the debounce
    /// delay, then [`Self::execute_search`].
    ///
    /// A serialized-driver convenience: it holds the facade across the
    /// sleep, so keystrokes arriving meanwhile must already have been
    /// reported via [`Self::search_input`] before this is awaited (each
    /// pending generation then falls out as stale when its turn comes).
    /// Callers running their own timers should call `search_input`, sleep
    /// on their side, and then call `execute_search` directly.
    pub async fn run_search(&mut self, generation: u64) {
        tokio::time::sleep(self.config.search_debounce).await;
        self.execute_search(generation).await;
    }

    /// Execute the query for a debounce timer that has already elapsed.
    ///
    /// A no-op when `generation` has been superseded by a later keystroke;
    /// the response is likewise applied only if still current on arrival.
    pub async fn execute_search(&mut self, generation: u64) {
        let Some(SearchQuery { generation, term }) = self.search.debounce_elapsed(generation)
        else {
            return;
        };
        let limit = self.config.search_limit as u32;
        let outcome = self
            .with_retry(|| self.store.search(&term, limit))
            .await;
        self.search.apply_results(generation, outcome);
    }

    /// The autocomplete session, for keyboard and rendering.
    pub const fn search_session(&self) -> &SearchSession {
        &self.search
    }

    /// Mutable access for the keyboard/pointer contract.
    pub const fn search_session_mut(&mut self) -> &mut SearchSession {
        &mut self.search
    }

    // ------------------------------------------------------------------
    // Fetch plumbing
    // ------------------------------------------------------------------

    /// Resolve the category once and translate. The single
    /// predicate-building path for count and data alike.
    fn current_query(&self) -> ProductQuery {
        translate(&self.filter.resolve(&self.directory))
    }

    #[instrument(skip_all, fields(generation = ticket.generation, offset = ticket.offset))]
    async fn run_page_ticket(&mut self, ticket: PageTicket) {
        let outcome = self
            .with_retry(|| async {
                let total_count = self.store.count(&ticket.query.predicates).await?;
                let items = self
                    .store
                    .fetch(&ticket.query, ticket.limit, ticket.offset)
                    .await?;
                Ok(PageData { total_count, items })
            })
            .await;
        if let Listing::Paged(fetcher) = &mut self.listing {
            fetcher.apply(ticket.generation, outcome);
        }
    }

    #[instrument(skip_all, fields(offset = ticket.offset))]
    async fn run_batch_ticket(&mut self, ticket: BatchTicket) {
        let outcome = self
            .with_retry(|| self.store.fetch(&ticket.query, ticket.limit, ticket.offset))
            .await;
        if let Listing::Infinite(fetcher) = &mut self.listing {
            fetcher.apply(ticket.offset, outcome);
        }
    }

    /// Run a store call under the configured timeout, retrying once on
    /// failure or timeout. Cancellation stays cooperative: a superseded
    /// caller simply discards the result via the generation check.
    async fn with_retry<T, F, Fut>(&self, mut op: F) -> std::result::Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let attempts = self.config.fetch_retries + 1;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match tokio::time::timeout(self.config.fetch_timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => {
                    warn!(attempt, error = %err, "store fetch failed");
                    last_error = Some(err);
                }
                Err(_elapsed) => {
                    warn!(attempt, "store fetch timed out");
                    last_error = Some(StoreError::TimedOut { attempts });
                }
            }
        }
        Err(last_error.unwrap_or(StoreError::TimedOut { attempts }))
    }
}
