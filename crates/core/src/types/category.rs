//! Product categories ("familias" in the legacy data model).

use serde::{Deserialize, Serialize};

use super::id::CategoryId;

/// A product category.
///
/// Every active product references exactly one existing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
