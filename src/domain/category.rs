use serde::Serialize;

/// The category that absorbs transactions whose category gets deleted.
/// It is always present and can never be removed.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Categories available before the user has customised anything.
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Food",
    "Transportation",
    "Housing",
    "Utilities",
    "Entertainment",
    "Income",
    FALLBACK_CATEGORY,
];

/// Ordered set of category names, unique by case-insensitive comparison.
/// Stored sets are rebuilt through [`CategorySet::from_names`] so the
/// invariants hold after every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySet {
    names: Vec<String>,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CategorySet {
    /// Build a set from stored names, dropping blanks and duplicates and
    /// making sure the fallback category is present.
    /// Returns the set and whether anything had to be repaired.
    pub fn from_names(names: Vec<String>) -> (Self, bool) {
        let original_len = names.len();
        let mut set = Self { names: Vec::new() };
        for name in names {
            let name = name.trim();
            if !name.is_empty() && set.resolve(name).is_none() {
                set.names.push(name.to_string());
            }
        }
        let mut repaired = set.names.len() != original_len;
        if set.resolve(FALLBACK_CATEGORY).is_none() {
            set.names.push(FALLBACK_CATEGORY.to_string());
            repaired = true;
        }
        (set, repaired)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Find the canonical spelling of `name`, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Append a new category. The caller trims and validates `name`.
    pub fn insert(&mut self, name: &str) -> Result<(), CategoryError> {
        if self.contains(name) {
            return Err(CategoryError::AlreadyExists(name.to_string()));
        }
        self.names.push(name.to_string());
        Ok(())
    }

    /// Remove a category, returning its canonical name.
    pub fn remove(&mut self, name: &str) -> Result<String, CategoryError> {
        if self.names.len() <= 1 {
            return Err(CategoryError::LastCategory);
        }
        if is_fallback(name) {
            return Err(CategoryError::Fallback);
        }
        let index = self
            .names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CategoryError::NotFound(name.to_string()))?;
        Ok(self.names.remove(index))
    }
}

/// True if `name` refers to the protected fallback category.
pub fn is_fallback(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(FALLBACK_CATEGORY)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    AlreadyExists(String),
    NotFound(String),
    LastCategory,
    Fallback,
}

impl std::fmt::Display for CategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryError::AlreadyExists(name) => write!(f, "category already exists: {}", name),
            CategoryError::NotFound(name) => write!(f, "category not found: {}", name),
            CategoryError::LastCategory => write!(f, "at least one category is required"),
            CategoryError::Fallback => {
                write!(f, "the {} category cannot be deleted", FALLBACK_CATEGORY)
            }
        }
    }
}

impl std::error::Error for CategoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contains_fallback() {
        let set = CategorySet::default();
        assert_eq!(set.len(), 7);
        assert!(set.contains(FALLBACK_CATEGORY));
        assert_eq!(set.names()[0], "Food");
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let set = CategorySet::default();
        assert_eq!(set.resolve("food"), Some("Food"));
        assert_eq!(set.resolve("  TRANSPORTATION "), Some("Transportation"));
        assert_eq!(set.resolve("Travel"), None);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = CategorySet::default();
        set.insert("Travel").unwrap();
        assert_eq!(set.names().last().map(String::as_str), Some("Travel"));
        assert_eq!(
            set.insert("travel"),
            Err(CategoryError::AlreadyExists("travel".into()))
        );
    }

    #[test]
    fn test_remove_protects_fallback() {
        let mut set = CategorySet::default();
        assert_eq!(set.remove("other"), Err(CategoryError::Fallback));
        assert_eq!(
            set.remove("Travel"),
            Err(CategoryError::NotFound("Travel".into()))
        );
        assert_eq!(set.remove("food"), Ok("Food".to_string()));
        assert!(!set.contains("Food"));
    }

    #[test]
    fn test_remove_refuses_last_category() {
        let (mut set, _) = CategorySet::from_names(vec![]);
        assert_eq!(set.names(), &["Other".to_string()]);
        assert_eq!(set.remove("Other"), Err(CategoryError::LastCategory));
    }

    #[test]
    fn test_from_names_repairs_stored_set() {
        let (set, repaired) =
            CategorySet::from_names(vec!["Food".into(), "food".into(), " ".into()]);
        assert!(repaired);
        assert_eq!(set.names(), &["Food".to_string(), "Other".to_string()]);

        let (_, repaired) = CategorySet::from_names(vec!["Food".into(), "Other".into()]);
        assert!(!repaired);
    }
}
