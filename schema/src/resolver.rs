//! Resolution of a relative file path to its owning document type.

use crate::registry::TypeRegistry;

/// Canonical form of a path relative to the content directory: `/`
/// separators and no leading `./`.
pub fn normalize_relative_path(relative_file_path: &str) -> String {
    relative_file_path
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_string()
}

/// Find the document type that owns `relative_file_path`.
///
/// Patterns are tried in registration order and the first match wins, so
/// overlapping patterns resolve deterministically.
pub fn resolve_type<'a>(relative_file_path: &str, registry: &'a TypeRegistry) -> Option<&'a str> {
    registry
        .iter()
        .find(|def| def.file_path_pattern.matches(relative_file_path))
        .map(|def| def.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_type::DocumentTypeDef;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolves_matching_type() {
        let registry = TypeRegistry::new(vec![
            DocumentTypeDef::new("post", "posts/*.md").unwrap(),
            DocumentTypeDef::new("author", "authors/*.yaml").unwrap(),
        ]);

        assert_eq!(resolve_type("posts/hello.md", &registry), Some("post"));
        assert_eq!(resolve_type("authors/ada.yaml", &registry), Some("author"));
    }

    #[test]
    fn test_unmatched_path_resolves_to_none() {
        let registry = TypeRegistry::new(vec![DocumentTypeDef::new("post", "posts/*.md").unwrap()]);

        assert_eq!(resolve_type("drafts/hello.md", &registry), None);
        assert_eq!(resolve_type("posts/hello.txt", &registry), None);
    }

    #[test]
    fn test_first_registered_wins_on_overlap() {
        let registry = TypeRegistry::new(vec![
            DocumentTypeDef::new("featured", "posts/featured-*.md").unwrap(),
            DocumentTypeDef::new("post", "posts/*.md").unwrap(),
        ]);

        assert_eq!(
            resolve_type("posts/featured-launch.md", &registry),
            Some("featured")
        );

        let reversed = TypeRegistry::new(vec![
            DocumentTypeDef::new("post", "posts/*.md").unwrap(),
            DocumentTypeDef::new("featured", "posts/featured-*.md").unwrap(),
        ]);

        assert_eq!(
            resolve_type("posts/featured-launch.md", &reversed),
            Some("post")
        );
    }

    #[test]
    fn test_normalize_relative_path() {
        assert_eq!(normalize_relative_path("posts/a.md"), "posts/a.md");
        assert_eq!(normalize_relative_path("./posts/a.md"), "posts/a.md");
        assert_eq!(normalize_relative_path("././posts/a.md"), "posts/a.md");
        assert_eq!(normalize_relative_path("posts\\a.md"), "posts/a.md");
    }

    #[test]
    fn test_non_canonical_path_resolves() {
        let registry = TypeRegistry::new(vec![DocumentTypeDef::new("post", "posts/*.md").unwrap()]);

        assert_eq!(resolve_type("./posts/a.md", &registry), Some("post"));
    }

    #[test]
    fn test_empty_registry() {
        assert_eq!(resolve_type("posts/a.md", &TypeRegistry::default()), None);
    }
}
