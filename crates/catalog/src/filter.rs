//! The shopper's view request as an immutable value object.
//!
//! A `FilterState` is created on page entry and replaced wholesale on every
//! edit; nothing mutates one in place. Consumers receive it as an argument,
//! never read it from ambient state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use almacen_core::CategoryId;

use crate::directory::CategoryDirectory;
use crate::error::CatalogError;

/// How the shopper selected a category.
///
/// The legacy storefront passed either a numeric id or a category name in
/// the same field; `parse` preserves that input shape. The ambiguity is
/// resolved exactly once, at the [`FilterState::resolve`] boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategorySelector {
    Id(CategoryId),
    Name(String),
    All,
}

impl From<String> for CategorySelector {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<CategorySelector> for String {
    fn from(selector: CategorySelector) -> Self {
        match selector {
            CategorySelector::All => "all".to_string(),
            CategorySelector::Id(id) => id.to_string(),
            CategorySelector::Name(name) => name,
        }
    }
}

impl CategorySelector {
    /// Parse a raw selector string: `"all"`, a numeric id, or a name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        trimmed
            .parse::<i32>()
            .map_or_else(|_| Self::Name(trimmed.to_string()), |id| Self::Id(id.into()))
    }
}

impl Default for CategorySelector {
    fn default() -> Self {
        Self::All
    }
}

/// The canonical category scope after directory resolution.
///
/// Downstream code never branches on the selector's shape again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScope {
    /// No category predicate.
    All,
    /// Filter to one category.
    Id(CategoryId),
    /// The selector named a category that does not exist. Selects zero
    /// rows, never "all rows".
    Unresolved,
}

/// Which price column a listing filters and sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    #[default]
    Retail,
    Wholesale,
}

/// Sort keys for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl SortKey {
    /// Parse from a URL parameter value. Unknown values fall back to
    /// name-ascending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "name-desc" => Self::NameDesc,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "newest" => Self::Newest,
            _ => Self::NameAsc,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
        }
    }
}

/// Optional boolean product facets.
///
/// A flag set to `true` narrows the listing; `false` contributes nothing.
/// Flags never exclude rows when false - this asymmetry is intentional and
/// matches how the storefront's facet checkboxes behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetFlags {
    pub featured: bool,
    pub on_offer: bool,
    pub wholesale_eligible: bool,
}

/// The shopper's current view request.
///
/// Every field is predicate-relevant: any change to a `FilterState` resets
/// pagination to page 1. Page size lives in [`crate::config::CatalogConfig`]
/// precisely because changing it must *not* reset pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub category: CategorySelector,
    pub price_min: Decimal,
    pub price_max: Decimal,
    /// Retail listings filter/sort on `price`; the wholesale listing uses
    /// `wholesale_price`.
    pub price_field: PriceField,
    pub sort: SortKey,
    pub search: Option<String>,
    pub facets: FacetFlags,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: CategorySelector::All,
            price_min: Decimal::ZERO,
            price_max: Decimal::MAX,
            price_field: PriceField::Retail,
            sort: SortKey::NameAsc,
            search: None,
            facets: FacetFlags::default(),
        }
    }
}

impl FilterState {
    /// A default filter constrained to a price range.
    #[must_use]
    pub fn with_price_range(price_min: Decimal, price_max: Decimal) -> Self {
        Self {
            price_min,
            price_max,
            ..Self::default()
        }
    }

    /// Reject malformed price bounds before any query is issued.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPriceBounds`] when `price_min`
    /// exceeds `price_max`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.price_min > self.price_max {
            return Err(CatalogError::InvalidPriceBounds {
                min: self.price_min,
                max: self.price_max,
            });
        }
        Ok(())
    }

    /// Resolve the category selector against the directory, producing a
    /// filter whose category scope is canonical.
    #[must_use]
    pub fn resolve(&self, directory: &CategoryDirectory) -> ResolvedFilter {
        ResolvedFilter {
            category: directory.resolve(&self.category),
            price_min: self.price_min,
            price_max: self.price_max,
            price_field: self.price_field,
            sort: self.sort,
            search: self.search.clone(),
            facets: self.facets,
        }
    }
}

/// A [`FilterState`] whose category has been resolved to a canonical scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub category: CategoryScope,
    pub price_min: Decimal,
    pub price_max: Decimal,
    pub price_field: PriceField,
    pub sort: SortKey,
    pub search: Option<String>,
    pub facets: FacetFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse_all() {
        assert_eq!(CategorySelector::parse("all"), CategorySelector::All);
        assert_eq!(CategorySelector::parse(""), CategorySelector::All);
        assert_eq!(CategorySelector::parse("  All "), CategorySelector::All);
    }

    #[test]
    fn test_selector_parse_numeric_is_id() {
        assert_eq!(
            CategorySelector::parse("12"),
            CategorySelector::Id(CategoryId::new(12))
        );
    }

    #[test]
    fn test_selector_parse_name() {
        assert_eq!(
            CategorySelector::parse("aseo"),
            CategorySelector::Name("aseo".to_string())
        );
    }

    #[test]
    fn test_sort_key_parse_defaults_to_name_asc() {
        assert_eq!(SortKey::parse("price-desc"), SortKey::PriceDesc);
        assert_eq!(SortKey::parse("newest"), SortKey::Newest);
        assert_eq!(SortKey::parse("bogus"), SortKey::NameAsc);
        assert_eq!(SortKey::parse(""), SortKey::NameAsc);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let filter = FilterState::with_price_range(Decimal::from(100), Decimal::from(10));
        assert!(matches!(
            filter.validate(),
            Err(CatalogError::InvalidPriceBounds { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_equal_bounds() {
        let filter = FilterState::with_price_range(Decimal::from(10), Decimal::from(10));
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_filter_state_serde_round_trip() {
        let filter = FilterState {
            category: CategorySelector::Name("aseo".to_string()),
            price_field: PriceField::Wholesale,
            sort: SortKey::PriceDesc,
            search: Some("jabon".to_string()),
            ..FilterState::default()
        };
        let json = serde_json::to_string(&filter).expect("serialize");
        assert!(json.contains("\"aseo\""));
        assert!(json.contains("price-desc"));
        let back: FilterState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, filter);
    }

    #[test]
    fn test_selector_serde_uses_url_strings() {
        let all: CategorySelector = serde_json::from_str("\"all\"").expect("deserialize");
        assert_eq!(all, CategorySelector::All);
        let id: CategorySelector = serde_json::from_str("\"7\"").expect("deserialize");
        assert_eq!(id, CategorySelector::Id(CategoryId::new(7)));
        assert_eq!(
            serde_json::to_string(&CategorySelector::Id(CategoryId::new(7))).expect("serialize"),
            "\"7\""
        );
    }
}
