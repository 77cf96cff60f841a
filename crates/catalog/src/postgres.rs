//! `PostgreSQL`-backed product store.
//!
//! Reads from the `catalog_products` view (products joined with their
//! category name) and the `categories` table. The predicate list renders
//! to one parameterized `WHERE` clause used by both the count and the data
//! query; the category directory is cached with a short TTL since it is
//! read on every name-selector resolution but changes only through the
//! admin path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use almacen_core::{Category, CategoryId, Product, ProductId};

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::filter::{PriceField, SortKey};
use crate::query::{FacetPredicate, Ordering, Predicate, ProductQuery};
use crate::store::ProductStore;

/// How long a category directory snapshot stays fresh.
const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
}

/// A product store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    categories: Cache<CacheKey, Arc<Vec<Category>>>,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            categories: Cache::builder()
                .max_capacity(1)
                .time_to_live(CATEGORY_CACHE_TTL)
                .build(),
        }
    }

    /// Connect a new pool with the storefront's defaults.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(config.database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }
}

impl ProductStore for PgStore {
    #[instrument(skip_all)]
    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM catalog_products WHERE TRUE");
        push_predicates(&mut builder, predicates);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip_all, fields(limit, offset))]
    async fn fetch(
        &self,
        query: &ProductQuery,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Product>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, name, long_description, price, wholesale_price, \
             category_id, category_name, image_url, featured, on_offer, \
             wholesale_eligible, active, created_at \
             FROM catalog_products WHERE TRUE",
        );
        push_predicates(&mut builder, &query.predicates);
        builder.push(" ORDER BY ");
        builder.push(order_sql(&query.order));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(offset));

        let rows: Vec<PgProductRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let snapshot = self
            .categories
            .try_get_with(CacheKey::Categories, async {
                let rows: Vec<(i32, String)> =
                    sqlx::query_as("SELECT id, name FROM categories ORDER BY name")
                        .fetch_all(&self.pool)
                        .await?;
                let categories = rows
                    .into_iter()
                    .map(|(id, name)| Category::new(id, name))
                    .collect::<Vec<_>>();
                Ok::<_, sqlx::Error>(Arc::new(categories))
            })
            .await
            .map_err(|e: Arc<sqlx::Error>| {
                StoreError::Unreachable(format!("category query failed: {e}"))
            })?;
        Ok(snapshot.as_ref().clone())
    }
}

/// Render the predicate list onto the builder as `AND ...` clauses.
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for predicate in predicates {
        match predicate {
            Predicate::Active => {
                builder.push(" AND active = TRUE");
            }
            Predicate::Category(id) => {
                builder.push(" AND category_id = ");
                builder.push_bind(id.as_i32());
            }
            Predicate::MatchNone => {
                builder.push(" AND FALSE");
            }
            Predicate::PriceAtLeast { field, value } => {
                builder.push(" AND ");
                builder.push(price_column(*field));
                builder.push(" >= ");
                builder.push_bind(*value);
            }
            Predicate::PriceAbove { field, value } => {
                builder.push(" AND ");
                builder.push(price_column(*field));
                builder.push(" > ");
                builder.push_bind(*value);
            }
            Predicate::PriceAtMost { field, value } => {
                builder.push(" AND ");
                builder.push(price_column(*field));
                builder.push(" <= ");
                builder.push_bind(*value);
            }
            Predicate::HasWholesalePrice => {
                builder.push(" AND wholesale_price IS NOT NULL");
            }
            Predicate::Flag(flag) => {
                builder.push(" AND ");
                builder.push(flag_column(*flag));
                builder.push(" = TRUE");
            }
            Predicate::TextContains(term) => {
                let pattern = like_pattern(term);
                builder.push(" AND (name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR long_description ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }
    }
}

const fn price_column(field: PriceField) -> &'static str {
    match field {
        PriceField::Retail => "price",
        PriceField::Wholesale => "wholesale_price",
    }
}

const fn flag_column(flag: FacetPredicate) -> &'static str {
    match flag {
        FacetPredicate::Featured => "featured",
        FacetPredicate::OnOffer => "on_offer",
        FacetPredicate::WholesaleEligible => "wholesale_eligible",
    }
}

/// The `ORDER BY` body for an ordering directive, id tie-break included.
fn order_sql(order: &Ordering) -> String {
    let price = price_column(order.price_field);
    let primary = match order.key {
        SortKey::NameAsc => "name ASC".to_string(),
        SortKey::NameDesc => "name DESC".to_string(),
        // NULLS LAST keeps retail-only rows at the end of wholesale
        // listings, matching the in-memory comparator.
        SortKey::PriceAsc => format!("{price} ASC NULLS LAST"),
        SortKey::PriceDesc => format!("{price} DESC NULLS LAST"),
        SortKey::Newest => "created_at DESC".to_string(),
    };
    format!("{primary}, id ASC")
}

/// Wrap a search term in `%...%`, escaping LIKE metacharacters so shopper
/// input cannot widen the match.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Row shape of the `catalog_products` view.
#[derive(Debug, sqlx::FromRow)]
struct PgProductRow {
    id: i32,
    name: String,
    long_description: Option<String>,
    price: Decimal,
    wholesale_price: Option<Decimal>,
    category_id: i32,
    category_name: String,
    image_url: Option<String>,
    featured: bool,
    on_offer: bool,
    wholesale_eligible: bool,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<PgProductRow> for Product {
    fn from(row: PgProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            long_description: row.long_description.unwrap_or_default(),
            price: row.price,
            wholesale_price: row.wholesale_price,
            category_id: CategoryId::new(row.category_id),
            category_name: row.category_name,
            image_url: row.image_url,
            featured: row.featured,
            on_offer: row.on_offer,
            wholesale_eligible: row.wholesale_eligible,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("jabon"), "%jabon%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_order_sql_always_tie_breaks_on_id() {
        let order = Ordering {
            key: SortKey::PriceDesc,
            price_field: PriceField::Wholesale,
        };
        assert_eq!(order_sql(&order), "wholesale_price DESC NULLS LAST, id ASC");

        let order = Ordering {
            key: SortKey::NameAsc,
            price_field: PriceField::Retail,
        };
        assert_eq!(order_sql(&order), "name ASC, id ASC");
    }
}
