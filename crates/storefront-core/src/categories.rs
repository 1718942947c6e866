use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::slugify;
use crate::CoreError;

/// Gap left between auto-assigned sort keys so new categories land at the
/// end without renumbering their siblings.
pub const SORT_STEP: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    /// Display label and the key products reference.
    pub name: String,
    pub slug: String,
    pub sort: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub sort: i32,
    pub is_active: bool,
}

impl NewCategory {
    /// Builds a new active category. When `sort` is omitted the category is
    /// placed after `max_existing_sort`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the trimmed name is empty.
    pub fn new(
        name: &str,
        sort: Option<i32>,
        max_existing_sort: Option<i32>,
    ) -> Result<Self, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("name is required".to_string()));
        }

        Ok(Self {
            name: name.to_owned(),
            slug: slugify(name),
            sort: sort.unwrap_or_else(|| {
                max_existing_sort.map_or(SORT_STEP, |max| max.saturating_add(SORT_STEP))
            }),
            is_active: true,
        })
    }
}

/// Raw PATCH body for a category. Blank strings are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryPatchInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryPatchInput {
    /// A new name without an explicit slug regenerates the slug; an explicit
    /// slug always wins.
    #[must_use]
    pub fn normalize(self) -> CategoryChanges {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToOwned::to_owned);

        let explicit_slug = self
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty());

        let slug = explicit_slug.or_else(|| name.as_deref().map(slugify));

        CategoryChanges {
            name,
            slug,
            sort: self.sort,
            is_active: self.is_active,
        }
    }
}

impl CategoryChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the new name when it differs from `current`.
    #[must_use]
    pub fn renames<'a>(&'a self, current: &str) -> Option<&'a str> {
        self.name.as_deref().filter(|n| *n != current)
    }
}

impl Category {
    pub fn apply(&mut self, changes: &CategoryChanges) {
        if let Some(ref name) = changes.name {
            self.name.clone_from(name);
        }
        if let Some(ref slug) = changes.slug {
            self.slug.clone_from(slug);
        }
        if let Some(sort) = changes.sort {
            self.sort = sort;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_category_defaults_sort_after_max() {
        let first = NewCategory::new("Shoes", None, None).unwrap();
        assert_eq!(first.sort, 10);
        assert_eq!(first.slug, "shoes");
        assert!(first.is_active);

        let next = NewCategory::new("Bags", None, Some(25)).unwrap();
        assert_eq!(next.sort, 35);
    }

    #[test]
    fn new_category_keeps_explicit_sort() {
        let cat = NewCategory::new("  Bags ", Some(5), Some(100)).unwrap();
        assert_eq!(cat.sort, 5);
        assert_eq!(cat.name, "Bags");
    }

    #[test]
    fn new_category_rejects_blank_name() {
        assert!(matches!(
            NewCategory::new("   ", None, None),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rename_regenerates_slug() {
        let changes = CategoryPatchInput {
            name: Some("Evening Bags".to_string()),
            ..CategoryPatchInput::default()
        }
        .normalize();
        assert_eq!(changes.slug.as_deref(), Some("evening-bags"));
    }

    #[test]
    fn explicit_slug_wins_over_generated() {
        let changes = CategoryPatchInput {
            name: Some("Evening Bags".to_string()),
            slug: Some("night".to_string()),
            ..CategoryPatchInput::default()
        }
        .normalize();
        assert_eq!(changes.slug.as_deref(), Some("night"));
    }

    #[test]
    fn blank_fields_are_ignored() {
        let changes = CategoryPatchInput {
            name: Some("  ".to_string()),
            slug: Some(String::new()),
            ..CategoryPatchInput::default()
        }
        .normalize();
        assert!(changes.is_empty());
    }

    #[test]
    fn renames_only_reports_a_different_name() {
        let changes = CategoryPatchInput {
            name: Some("Shoes".to_string()),
            ..CategoryPatchInput::default()
        }
        .normalize();
        assert_eq!(changes.renames("Shoes"), None);
        assert_eq!(changes.renames("Boots"), Some("Shoes"));
    }
}
