//! Stable category-string to integer-id registries.

use std::collections::HashMap;
use std::fmt;

/// Which categorical column a registry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDomain {
    /// Weather conditions (a predictor).
    Weather,
    /// Beverages (the prediction target).
    Product,
}

impl fmt::Display for CategoryDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CategoryDomain::Weather => "weather",
            CategoryDomain::Product => "product",
        })
    }
}

/// Integer id standing in for a raw category string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct CategoryId(usize);

impl CategoryId {
    /// Create a new id from a zero-based index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional mapping between raw category strings and stable ids.
///
/// Ids are handed out in first-seen order starting at 0 and are never
/// reassigned, reused or removed; the registry only grows.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    domain: CategoryDomain,
    names: Vec<String>,
    ids: HashMap<String, CategoryId>,
}

impl CategoryRegistry {
    /// Create an empty registry for one domain.
    #[must_use]
    pub fn new(domain: CategoryDomain) -> Self {
        Self {
            domain,
            names: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Return the id of `raw`, assigning the next free id if it is new.
    pub fn register(&mut self, raw: &str) -> CategoryId {
        if let Some(&id) = self.ids.get(raw) {
            return id;
        }
        let id = CategoryId(self.names.len());
        self.names.push(raw.to_string());
        self.ids.insert(raw.to_string(), id);
        id
    }

    /// Look up the id of `raw` without registering it.
    #[must_use]
    pub fn id_of(&self, raw: &str) -> Option<CategoryId> {
        self.ids.get(raw).copied()
    }

    /// Look up the raw string behind `id`.
    #[must_use]
    pub fn name_of(&self, id: CategoryId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Return `true` if `id` has been assigned.
    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        id.0 < self.names.len()
    }

    /// Iterate `(name, id)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, CategoryId)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), CategoryId(idx)))
    }

    /// Return the number of registered categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return `true` if nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Return the domain this registry serves.
    #[must_use]
    pub fn domain(&self) -> CategoryDomain {
        self.domain
    }
}
