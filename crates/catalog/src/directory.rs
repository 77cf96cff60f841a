//! The category id <-> name directory.
//!
//! Loaded once from the store at facade construction, like the storefront's
//! category dropdown: a small, read-mostly snapshot. Admin-side category
//! edits trigger a full facade rebuild rather than incremental patching.

use std::collections::HashMap;

use almacen_core::{Category, CategoryId};

use crate::error::StoreError;
use crate::filter::{CategoryScope, CategorySelector};
use crate::store::ProductStore;

/// An in-memory snapshot of all categories, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct CategoryDirectory {
    categories: Vec<Category>,
    by_name: HashMap<String, CategoryId>,
}

impl CategoryDirectory {
    /// Build a directory from a category list.
    #[must_use]
    pub fn from_categories(mut categories: Vec<Category>) -> Self {
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        let by_name = categories
            .iter()
            .map(|c| (c.name.clone(), c.id))
            .collect();
        Self {
            categories,
            by_name,
        }
    }

    /// Load the directory snapshot from a product store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the category fetch fails.
    pub async fn load<S: ProductStore>(store: &S) -> Result<Self, StoreError> {
        let categories = store.categories().await?;
        Ok(Self::from_categories(categories))
    }

    /// Resolve a selector to its canonical scope.
    ///
    /// A numeric selector is taken as an id directly; a name is looked up
    /// by exact match. A name that does not resolve yields
    /// [`CategoryScope::Unresolved`], which selects zero rows.
    #[must_use]
    pub fn resolve(&self, selector: &CategorySelector) -> CategoryScope {
        match selector {
            CategorySelector::All => CategoryScope::All,
            CategorySelector::Id(id) => CategoryScope::Id(*id),
            CategorySelector::Name(name) => self
                .by_name
                .get(name)
                .map_or(CategoryScope::Unresolved, |id| CategoryScope::Id(*id)),
        }
    }

    /// Look up a category's name.
    #[must_use]
    pub fn name_of(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// All categories, sorted by name.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> CategoryDirectory {
        CategoryDirectory::from_categories(vec![
            Category::new(2, "perfumeria"),
            Category::new(1, "aseo"),
            Category::new(3, "paqueteria"),
        ])
    }

    #[test]
    fn test_categories_sorted_by_name() {
        let dir = directory();
        let names: Vec<_> = dir.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["aseo", "paqueteria", "perfumeria"]);
    }

    #[test]
    fn test_resolve_by_name() {
        let dir = directory();
        assert_eq!(
            dir.resolve(&CategorySelector::Name("aseo".to_string())),
            CategoryScope::Id(CategoryId::new(1))
        );
    }

    #[test]
    fn test_resolve_id_passthrough() {
        let dir = directory();
        assert_eq!(
            dir.resolve(&CategorySelector::Id(CategoryId::new(99))),
            CategoryScope::Id(CategoryId::new(99))
        );
    }

    #[test]
    fn test_unknown_name_is_unresolved_not_all() {
        let dir = directory();
        assert_eq!(
            dir.resolve(&CategorySelector::Name("juguetes".to_string())),
            CategoryScope::Unresolved
        );
    }
}
