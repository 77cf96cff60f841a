//! Numbered-page pagination controller.
//!
//! The fetcher hands out tickets and applies outcomes rather than calling
//! the store itself: every ticket carries a generation token, and an
//! outcome is applied only when its token is still the latest issued. A
//! filter change mid-flight supersedes the old ticket, and the stale
//! response is discarded on arrival.

use tracing::debug;

use almacen_core::Product;

use crate::error::StoreError;
use crate::query::ProductQuery;

/// Per-request fetch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Pagination state for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page_size: u32,
    pub current_page: u32,
    pub total_count: u64,
}

impl PageState {
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            page_size,
            current_page: 1,
            total_count: 0,
        }
    }

    /// Number of pages, `ceil(total_count / page_size)`.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        (self.total_count.div_ceil(self.page_size as u64)) as u32
    }

    /// Row offset of the current page.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        (self.current_page - 1) * self.page_size
    }

    /// Clamp `current_page` so it never exceeds `max(1, total_pages)`.
    fn clamp_current(&mut self) {
        let ceiling = self.total_pages().max(1);
        if self.current_page > ceiling {
            self.current_page = ceiling;
        }
    }
}

/// A pending page fetch. Hand the generation back via
/// [`PageFetcher::apply`] with the store's outcome.
#[derive(Debug, Clone)]
pub struct PageTicket {
    pub generation: u64,
    pub query: ProductQuery,
    pub limit: u32,
    pub offset: u32,
}

/// One fetched page: the matching total plus the page window.
#[derive(Debug, Clone)]
pub struct PageData {
    pub total_count: u64,
    pub items: Vec<Product>,
}

/// Numbered-page pagination controller.
pub struct PageFetcher {
    state: PageState,
    phase: FetchPhase,
    generation: u64,
    items: Vec<Product>,
    error: Option<StoreError>,
    /// Presentation hook fired when a page navigation is accepted
    /// (the storefront scrolls the viewport back to the top).
    on_page_change: Option<Box<dyn Fn() + Send>>,
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("items", &self.items.len())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl PageFetcher {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            state: PageState::new(page_size),
            phase: FetchPhase::Idle,
            generation: 0,
            items: Vec::new(),
            error: None,
            on_page_change: None,
        }
    }

    /// Register the scroll-to-top (or equivalent) presentation callback.
    pub fn set_page_change_callback(&mut self, callback: impl Fn() + Send + 'static) {
        self.on_page_change = Some(Box::new(callback));
    }

    /// Begin a fresh fetch at page 1. Used on initial load and whenever
    /// the predicate-relevant filter state changes. Supersedes any fetch
    /// still in flight.
    pub fn request_reset(&mut self, query: &ProductQuery) -> PageTicket {
        self.state.current_page = 1;
        self.issue(query)
    }

    /// Request navigation to `page`.
    ///
    /// A page outside `[1, total_pages]` is rejected and `None` is
    /// returned; the caller sees the rejection rather than a silent clamp
    /// to an adjacent page.
    pub fn request_page(&mut self, page: u32, query: &ProductQuery) -> Option<PageTicket> {
        if page < 1 || page > self.state.total_pages() {
            debug!(page, total_pages = self.state.total_pages(), "page out of range, rejected");
            return None;
        }
        self.state.current_page = page;
        if let Some(callback) = &self.on_page_change {
            callback();
        }
        Some(self.issue(query))
    }

    fn issue(&mut self, query: &ProductQuery) -> PageTicket {
        self.generation += 1;
        self.phase = FetchPhase::Loading;
        self.error = None;
        PageTicket {
            generation: self.generation,
            query: query.clone(),
            limit: self.state.page_size,
            offset: self.state.offset(),
        }
    }

    /// Apply a fetch outcome.
    ///
    /// Returns `false` (and changes nothing) when the ticket's generation
    /// has been superseded by a newer request.
    pub fn apply(&mut self, generation: u64, outcome: Result<PageData, StoreError>) -> bool {
        if generation != self.generation {
            debug!(generation, latest = self.generation, "stale page response discarded");
            return false;
        }
        match outcome {
            Ok(data) => {
                self.state.total_count = data.total_count;
                self.state.clamp_current();
                self.items = data.items;
                self.error = None;
            }
            Err(err) => {
                self.items.clear();
                self.error = Some(err);
            }
        }
        self.phase = FetchPhase::Ready;
        true
    }

    /// The sliding window of visible page buttons, centered on the current
    /// page and clamped at both ends of `[1, total_pages]`.
    #[must_use]
    pub fn page_window(&self, visible: u32) -> Vec<u32> {
        page_window(self.state.current_page, self.state.total_pages(), visible)
    }

    #[must_use]
    pub const fn state(&self) -> &PageState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> FetchPhase {
        self.phase
    }

    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub const fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }
}

/// Compute the visible page-button window.
#[must_use]
pub fn page_window(current_page: u32, total_pages: u32, visible: u32) -> Vec<u32> {
    if total_pages == 0 || visible == 0 {
        return Vec::new();
    }
    let mut start = current_page.saturating_sub(visible / 2).max(1);
    let end = total_pages.min(start + visible - 1);
    // Re-anchor when the window runs short at the upper boundary.
    if end - start + 1 < visible {
        start = end.saturating_sub(visible - 1).max(1);
    }
    (start..=end).collect()
}
