//! Read-only table of document types, in registration order.

use indexmap::IndexMap;

use crate::document_type::{DocumentTypeDef, FilePathPattern};

/// Type name -> file-path pattern, in registration order.
pub type FilePathPatternMap = IndexMap<String, String>;

/// Registry of document types, built once at startup.
///
/// Registration order is significant: path resolution tries patterns in
/// this order and the first match wins.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    defs: Vec<DocumentTypeDef>,
}

impl TypeRegistry {
    /// Build the registry from the configured definitions.
    pub fn new(defs: Vec<DocumentTypeDef>) -> Self {
        Self { defs }
    }

    /// Get a document type by name.
    pub fn get(&self, name: &str) -> Option<&DocumentTypeDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Get the file-path pattern of a document type.
    pub fn file_path_pattern(&self, name: &str) -> Option<&FilePathPattern> {
        self.get(name).map(|d| &d.file_path_pattern)
    }

    /// The full name -> pattern mapping.
    pub fn file_path_pattern_map(&self) -> FilePathPatternMap {
        self.defs
            .iter()
            .map(|d| (d.name.clone(), d.file_path_pattern.as_str().to_string()))
            .collect()
    }

    /// Iterate over the definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentTypeDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(vec![
            DocumentTypeDef::new("post", "posts/*.md").unwrap(),
            DocumentTypeDef::new("page", "pages/**/*.mdx").unwrap(),
        ])
    }

    #[test]
    fn test_pattern_lookup() {
        let registry = registry();

        assert_eq!(
            registry.file_path_pattern("page").map(FilePathPattern::as_str),
            Some("pages/**/*.mdx")
        );
        assert!(registry.file_path_pattern("author").is_none());
    }

    #[test]
    fn test_pattern_map_keeps_registration_order() {
        let map = registry().file_path_pattern_map();
        let names: Vec<_> = map.keys().map(String::as_str).collect();

        assert_eq!(names, vec!["post", "page"]);
        assert_eq!(map["post"], "posts/*.md");
    }
}
