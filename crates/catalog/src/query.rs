//! Translation from a resolved filter into a query descriptor.
//!
//! `translate` is the single predicate-building path: both the count query
//! and the data fetch consume its output, so the two can never drift apart.

use std::cmp::Ordering as CmpOrdering;

use rust_decimal::Decimal;

use almacen_core::{CategoryId, Product};

use crate::filter::{CategoryScope, PriceField, ResolvedFilter, SortKey};

/// Minimum wholesale price for a product to appear in the wholesale
/// listing. Strict: a product priced exactly at the floor is excluded.
pub const WHOLESALE_PRICE_FLOOR: Decimal = Decimal::ONE_HUNDRED;

/// A single filter condition against the product collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Only active products are ever visible.
    Active,
    /// Product belongs to the given category.
    Category(CategoryId),
    /// Selects zero rows. Emitted when a category name failed to resolve.
    MatchNone,
    /// Price floor, inclusive.
    PriceAtLeast { field: PriceField, value: Decimal },
    /// Price floor, exclusive. Used for the wholesale listing's minimum.
    PriceAbove { field: PriceField, value: Decimal },
    /// Price ceiling, inclusive.
    PriceAtMost { field: PriceField, value: Decimal },
    /// The product has a wholesale price at all.
    HasWholesalePrice,
    /// A facet flag is set.
    Flag(FacetPredicate),
    /// Case-insensitive substring match over name OR long description.
    TextContains(String),
}

/// Facet flags usable as equality predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetPredicate {
    Featured,
    OnOffer,
    WholesaleEligible,
}

impl Predicate {
    /// Evaluate this predicate against a product row.
    ///
    /// This is the reference semantics; store backends must agree with it.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::Active => product.active,
            Self::Category(id) => product.category_id == *id,
            Self::MatchNone => false,
            Self::PriceAtLeast { field, value } => {
                price_of(product, *field).is_some_and(|p| p >= *value)
            }
            Self::PriceAbove { field, value } => {
                price_of(product, *field).is_some_and(|p| p > *value)
            }
            Self::PriceAtMost { field, value } => {
                price_of(product, *field).is_some_and(|p| p <= *value)
            }
            Self::HasWholesalePrice => product.wholesale_price.is_some(),
            Self::Flag(FacetPredicate::Featured) => product.featured,
            Self::Flag(FacetPredicate::OnOffer) => product.on_offer,
            Self::Flag(FacetPredicate::WholesaleEligible) => product.wholesale_eligible,
            Self::TextContains(term) => {
                let needle = term.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product.long_description.to_lowercase().contains(&needle)
            }
        }
    }
}

/// The price column a listing operates on.
fn price_of(product: &Product, field: PriceField) -> Option<Decimal> {
    match field {
        PriceField::Retail => Some(product.price),
        PriceField::Wholesale => product.wholesale_price,
    }
}

/// An ordering directive.
///
/// Every ordering carries an implicit tie-break on id ascending so that
/// paginated windows are stable across repeated calls with identical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub key: SortKey,
    pub price_field: PriceField,
}

impl Ordering {
    /// Compare two products under this ordering, tie-breaking on id.
    #[must_use]
    pub fn compare(&self, a: &Product, b: &Product) -> CmpOrdering {
        let primary = match self.key {
            SortKey::NameAsc => a.name.cmp(&b.name),
            SortKey::NameDesc => b.name.cmp(&a.name),
            SortKey::PriceAsc => cmp_price(a, b, self.price_field),
            SortKey::PriceDesc => cmp_price(b, a, self.price_field),
            SortKey::Newest => b.created_at.cmp(&a.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Missing wholesale prices sort last under ascending price.
fn cmp_price(a: &Product, b: &Product, field: PriceField) -> CmpOrdering {
    match (price_of(a, field), price_of(b, field)) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

/// A full query descriptor: predicates plus an ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub predicates: Vec<Predicate>,
    pub order: Ordering,
}

impl ProductQuery {
    /// Evaluate the predicate set against a product row.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.predicates.iter().all(|p| p.matches(product))
    }
}

/// Translate a resolved filter into a query descriptor.
#[must_use]
pub fn translate(filter: &ResolvedFilter) -> ProductQuery {
    let mut predicates = vec![Predicate::Active];

    match filter.category {
        CategoryScope::All => {}
        CategoryScope::Id(id) => predicates.push(Predicate::Category(id)),
        CategoryScope::Unresolved => predicates.push(Predicate::MatchNone),
    }

    // The wholesale listing only carries products that are actually sold
    // in bulk: a non-null wholesale price strictly above the floor.
    if filter.price_field == PriceField::Wholesale {
        predicates.push(Predicate::HasWholesalePrice);
        predicates.push(Predicate::PriceAbove {
            field: PriceField::Wholesale,
            value: WHOLESALE_PRICE_FLOOR,
        });
    }

    predicates.push(Predicate::PriceAtLeast {
        field: filter.price_field,
        value: filter.price_min,
    });
    predicates.push(Predicate::PriceAtMost {
        field: filter.price_field,
        value: filter.price_max,
    });

    if filter.facets.featured {
        predicates.push(Predicate::Flag(FacetPredicate::Featured));
    }
    if filter.facets.on_offer {
        predicates.push(Predicate::Flag(FacetPredicate::OnOffer));
    }
    if filter.facets.wholesale_eligible {
        predicates.push(Predicate::Flag(FacetPredicate::WholesaleEligible));
    }

    if let Some(term) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        predicates.push(Predicate::TextContains(term.to_string()));
    }

    ProductQuery {
        predicates,
        order: Ordering {
            key: filter.sort,
            price_field: filter.price_field,
        },
    }
}
