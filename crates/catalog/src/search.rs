//! Debounced, cancellable autocomplete search session.
//!
//! Two races are handled with one monotonic generation counter:
//!
//! - Debounce: every keystroke bumps the generation; when a debounce timer
//!   elapses it reports the generation it was armed with, and only the
//!   latest one is allowed to execute a query.
//! - Stale responses: an executed query carries its generation, and a
//!   response is applied only while that generation is still the latest.
//!   A slow response for an old query can never overwrite a newer one.

use regex::RegexBuilder;
use tracing::debug;

use almacen_core::Product;

use crate::error::StoreError;

/// A piece of a result's display name, split around the matched term.
///
/// Structured segments instead of markup strings: the term is user input
/// and must never be concatenated into HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Match(String),
}

/// One autocomplete result with its highlighted name.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub product: Product,
    pub name_segments: Vec<Segment>,
}

/// Keys the session reacts to while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Session closed or key not applicable.
    Ignored,
    /// The selection moved (or was cleared).
    SelectionMoved,
    /// Enter on a valid selection: the caller should navigate to the
    /// product. The session is now closed.
    Committed(Product),
    /// Escape: closed without committing; input focus should be dropped.
    Dismissed,
}

/// A query the session decided to execute, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub generation: u64,
    pub term: String,
}

/// Autocomplete session state machine:
/// Closed -> Open(no selection) -> Open(selected), and back to Closed.
#[derive(Debug)]
pub struct SearchSession {
    query_text: String,
    generation: u64,
    open: bool,
    loading: bool,
    results: Vec<SearchHit>,
    selected: Option<usize>,
    limit: usize,
}

impl SearchSession {
    /// Create a closed session with the given result cap.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            query_text: String::new(),
            generation: 0,
            open: false,
            loading: false,
            results: Vec::new(),
            selected: None,
            limit,
        }
    }

    /// The shopper edited the input. Opens the session, clears the
    /// selection, and arms a new debounce generation. The caller starts
    /// its debounce timer and reports back via [`Self::debounce_elapsed`].
    pub fn input_changed(&mut self, text: &str) -> u64 {
        self.query_text = text.to_string();
        self.open = true;
        self.selected = None;
        self.generation += 1;
        self.generation
    }

    /// A debounce timer armed at `generation` elapsed.
    ///
    /// Returns the query to execute, or `None` when the timer was
    /// superseded by a later keystroke or the term is empty. Only the
    /// timer that fired last for a keystroke burst gets a query.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<SearchQuery> {
        if generation != self.generation {
            debug!(generation, latest = self.generation, "debounce superseded");
            return None;
        }
        let term = self.query_text.trim();
        if term.is_empty() {
            self.results.clear();
            self.loading = false;
            return None;
        }
        self.loading = true;
        Some(SearchQuery {
            generation,
            term: term.to_string(),
        })
    }

    /// Apply a query response.
    ///
    /// Returns `false` (discarding the response) when a newer generation
    /// has been issued since the query was executed, even if no newer
    /// response has arrived yet.
    pub fn apply_results(
        &mut self,
        generation: u64,
        outcome: Result<Vec<Product>, StoreError>,
    ) -> bool {
        if generation != self.generation {
            debug!(generation, latest = self.generation, "stale search response discarded");
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(products) => {
                let term = self.query_text.trim();
                self.results = products
                    .into_iter()
                    .take(self.limit)
                    .map(|product| {
                        let name_segments = highlight(&product.name, term);
                        SearchHit {
                            product,
                            name_segments,
                        }
                    })
                    .collect();
            }
            Err(err) => {
                debug!(error = %err, "search query failed");
                self.results.clear();
            }
        }
        true
    }

    /// Keyboard contract while the session is open.
    pub fn handle_key(&mut self, key: KeyPress) -> KeyOutcome {
        if !self.open {
            return KeyOutcome::Ignored;
        }
        match key {
            KeyPress::ArrowDown => {
                let last = self.results.len().checked_sub(1);
                self.selected = match (self.selected, last) {
                    (_, None) => None,
                    (None, Some(_)) => Some(0),
                    (Some(i), Some(last)) if i < last => Some(i + 1),
                    (Some(i), Some(_)) => Some(i),
                };
                KeyOutcome::SelectionMoved
            }
            KeyPress::ArrowUp => {
                self.selected = match self.selected {
                    Some(i) if i > 0 => Some(i - 1),
                    _ => None,
                };
                KeyOutcome::SelectionMoved
            }
            KeyPress::Enter => match self.selected.and_then(|i| self.results.get(i)) {
                Some(hit) => {
                    let product = hit.product.clone();
                    self.close();
                    self.query_text.clear();
                    KeyOutcome::Committed(product)
                }
                None => KeyOutcome::Ignored,
            },
            KeyPress::Escape => {
                self.close();
                KeyOutcome::Dismissed
            }
        }
    }

    /// A pointer or touch event landed outside the session's region:
    /// close without committing.
    pub fn pointer_outside(&mut self) {
        self.close();
    }

    /// Close the session. Results are dropped; the next focus starts a
    /// fresh session.
    pub fn close(&mut self) {
        self.open = false;
        self.loading = false;
        self.results.clear();
        self.selected = None;
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    /// Selected index, `None` meaning no selection (the -1 state).
    #[must_use]
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn query_text(&self) -> &str {
        &self.query_text
    }
}

/// Split `text` into plain and matched segments around every
/// case-insensitive occurrence of `term`.
///
/// The term is regex-escaped first; shopper input carries no pattern
/// syntax into the matcher.
#[must_use]
pub fn highlight(text: &str, term: &str) -> Vec<Segment> {
    let term = term.trim();
    if term.is_empty() {
        return vec![Segment::Plain(text.to_string())];
    }
    let Ok(matcher) = RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    else {
        return vec![Segment::Plain(text.to_string())];
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in matcher.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::Plain(text[cursor..found.start()].to_string()));
        }
        segments.push(Segment::Match(found.as_str().to_string()));
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(Segment::Plain(text[cursor..].to_string()));
    }
    if segments.is_empty() {
        segments.push(Segment::Plain(text.to_string()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use almacen_core::{CategoryId, ProductId};

    use super::*;

    fn product(id: i32, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
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

    #[test]
    fn test_only_last_debounce_timer_fires() {
        let mut session = SearchSession::new(20);
        let t1 = session.input_changed("a");
        let t2 = session.input_changed("ab");
        let t3 = session.input_changed("abc");

        assert!(session.debounce_elapsed(t1).is_none());
        assert!(session.debounce_elapsed(t2).is_none());
        let query = session.debounce_elapsed(t3).expect("latest fires");
        assert_eq!(query.term, "abc");
    }

    #[test]
    fn test_blank_input_clears_without_querying() {
        let mut session = SearchSession::new(20);
        let t = session.input_changed("jabon");
        session.debounce_elapsed(t);
        session.apply_results(t, Ok(vec![product(1, "jabon")]));
        assert_eq!(session.results().len(), 1);

        let t = session.input_changed("   ");
        assert!(session.debounce_elapsed(t).is_none());
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_slow_stale_response_never_overwrites() {
        let mut session = SearchSession::new(20);
        let shampoo = session.input_changed("shampoo");
        session.debounce_elapsed(shampoo);
        let soap = session.input_changed("soap");
        session.debounce_elapsed(soap);

        // The newer query resolves first.
        assert!(session.apply_results(soap, Ok(vec![product(2, "soap bar")])));
        // The older one arrives late and must be dropped.
        assert!(!session.apply_results(shampoo, Ok(vec![product(1, "shampoo")])));

        assert_eq!(session.results().len(), 1);
        assert_eq!(
            session.results().first().map(|h| h.product.id),
            Some(ProductId::new(2))
        );
    }

    #[test]
    fn test_results_capped() {
        let mut session = SearchSession::new(2);
        let t = session.input_changed("x");
        session.debounce_elapsed(t);
        session.apply_results(
            t,
            Ok(vec![product(1, "x1"), product(2, "x2"), product(3, "x3")]),
        );
        assert_eq!(session.results().len(), 2);
    }

    #[test]
    fn test_keyboard_walk_and_commit() {
        let mut session = SearchSession::new(20);
        let t = session.input_changed("ja");
        session.debounce_elapsed(t);
        session.apply_results(
            t,
            Ok(vec![
                product(1, "jabon"),
                product(2, "jarra"),
                product(3, "jalea"),
            ]),
        );
        assert_eq!(session.selected_index(), None);

        session.handle_key(KeyPress::ArrowDown);
        session.handle_key(KeyPress::ArrowDown);
        assert_eq!(session.selected_index(), Some(1));

        let outcome = session.handle_key(KeyPress::Enter);
        let KeyOutcome::Committed(committed) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(committed.id, ProductId::new(2));
        assert!(!session.is_open());
    }

    #[test]
    fn test_arrow_clamping() {
        let mut session = SearchSession::new(20);
        let t = session.input_changed("j");
        session.debounce_elapsed(t);
        session.apply_results(t, Ok(vec![product(1, "jabon"), product(2, "jarra")]));

        // Down past the end stays on the last result.
        for _ in 0..5 {
            session.handle_key(KeyPress::ArrowDown);
        }
        assert_eq!(session.selected_index(), Some(1));

        // Up past the start clears the selection.
        for _ in 0..5 {
            session.handle_key(KeyPress::ArrowUp);
        }
        assert_eq!(session.selected_index(), None);
    }

    #[test]
    fn test_enter_without_selection_is_ignored() {
        let mut session = SearchSession::new(20);
        let t = session.input_changed("j");
        session.debounce_elapsed(t);
        session.apply_results(t, Ok(vec![product(1, "jabon")]));
        assert_eq!(session.handle_key(KeyPress::Enter), KeyOutcome::Ignored);
        assert!(session.is_open());
    }

    #[test]
    fn test_escape_and_outside_pointer_close_without_commit() {
        let mut session = SearchSession::new(20);
        let t = session.input_changed("j");
        session.debounce_elapsed(t);
        session.apply_results(t, Ok(vec![product(1, "jabon")]));
        session.handle_key(KeyPress::ArrowDown);

        assert_eq!(session.handle_key(KeyPress::Escape), KeyOutcome::Dismissed);
        assert!(!session.is_open());
        assert!(session.results().is_empty());

        let t = session.input_changed("j");
        assert!(session.is_open());
        session.debounce_elapsed(t);
        session.pointer_outside();
        assert!(!session.is_open());
    }

    #[test]
    fn test_highlight_case_insensitive_all_occurrences() {
        let segments = highlight("Jabon jabonoso", "jab");
        assert_eq!(
            segments,
            vec![
                Segment::Match("Jab".to_string()),
                Segment::Plain("on ".to_string()),
                Segment::Match("jab".to_string()),
                Segment::Plain("onoso".to_string()),
            ]
        );
    }

    #[test]
    fn test_highlight_escapes_regex_metacharacters() {
        let segments = highlight("precio (oferta)", "(oferta)");
        assert_eq!(
            segments,
            vec![
                Segment::Plain("precio ".to_string()),
                Segment::Match("(oferta)".to_string()),
            ]
        );
    }

    #[test]
    fn test_highlight_no_match_is_single_plain_segment() {
        let segments = highlight("jabon", "zz");
        assert_eq!(segments, vec![Segment::Plain("jabon".to_string())]);
    }
}
