//! The product row as exposed by the catalog read path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// Fallback image shown when a product has no image of its own.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A single product as returned by catalog queries.
///
/// Rows with `active == false` are filtered out by every query path and
/// must never reach consumers of the read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub long_description: String,
    /// Retail unit price.
    pub price: Decimal,
    /// Wholesale price, when the product is sold in bulk.
    pub wholesale_price: Option<Decimal>,
    pub category_id: CategoryId,
    pub category_name: String,
    pub image_url: Option<String>,
    pub featured: bool,
    pub on_offer: bool,
    pub wholesale_eligible: bool,
    /// Lifecycle flag. Inactive products are invisible to the catalog.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The product image, falling back to the shared placeholder.
    #[must_use]
    pub fn image_or_placeholder(&self) -> &str {
        self.image_url.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Jabon de tocador".to_string(),
            long_description: String::new(),
            price: Decimal::from(500),
            wholesale_price: None,
            category_id: CategoryId::new(3),
            category_name: "aseo".to_string(),
            image_url: None,
            featured: false,
            on_offer: false,
            wholesale_eligible: false,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_image_falls_back_to_placeholder() {
        let mut product = sample();
        assert_eq!(product.image_or_placeholder(), PLACEHOLDER_IMAGE);

        product.image_url = Some("/img/1.jpg".to_string());
        assert_eq!(product.image_or_placeholder(), "/img/1.jpg");
    }
}
