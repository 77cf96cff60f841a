//! Integration tests for the Almacen catalog engine.
//!
//! All tests run in-process against [`MemoryStore`], the reference
//! `ProductStore` backend; no database or server is needed.
//!
//! ```bash
//! cargo test -p almacen-integration-tests
//! ```

use std::sync::Once;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use almacen_catalog::MemoryStore;
use almacen_core::{Category, CategoryId, Product, ProductId};

/// Initialize tracing once for the whole test binary. Controlled via
/// `RUST_LOG`, silent by default.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A fixed timestamp offset by `days` so `newest` ordering is
/// deterministic in fixtures.
#[must_use]
pub fn day(days: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("fixture timestamp")
        + chrono::Duration::days(i64::from(days))
}

/// A product fixture with sensible defaults; tweak fields via struct
/// update syntax.
#[must_use]
pub fn product(id: i32, name: &str, price: i64) -> Product {
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
        created_at: day(0),
    }
}

/// The standard category set used across fixtures.
#[must_use]
pub fn categories() -> Vec<Category> {
    vec![
        Category::new(1, "aseo"),
        Category::new(2, "perfumeria"),
        Category::new(3, "paqueteria"),
    ]
}

/// The five-product price-ladder store: prices 500, 1500, 3000, 7000 and
/// 12000, ids in price order.
#[must_use]
pub fn price_ladder_store() -> MemoryStore {
    MemoryStore::new(
        categories(),
        vec![
            product(1, "jabon", 500),
            product(2, "shampoo", 1500),
            product(3, "crema", 3000),
            product(4, "perfume", 7000),
            product(5, "set de regalo", 12000),
        ],
    )
}

/// A store with `n` products, ids `1..=n`, all priced 100.
#[must_use]
pub fn bulk_store(n: i32) -> MemoryStore {
    let products = (1..=n)
        .map(|id| product(id, &format!("producto {id:03}"), 100))
        .collect();
    MemoryStore::new(categories(), products)
}
