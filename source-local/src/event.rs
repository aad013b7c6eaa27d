//! Synchronization events consumed by the cache synchronizer.

use serde::{Deserialize, Serialize};

/// The normalized unit of change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Reload everything from disk.
    Init,

    /// A file was created or modified.
    #[serde(rename = "update")]
    Updated { relative_file_path: String },

    /// A file was removed.
    Deleted { relative_file_path: String },
}

impl SyncEvent {
    pub fn updated(relative_file_path: impl Into<String>) -> Self {
        Self::Updated {
            relative_file_path: relative_file_path.into(),
        }
    }

    pub fn deleted(relative_file_path: impl Into<String>) -> Self {
        Self::Deleted {
            relative_file_path: relative_file_path.into(),
        }
    }

    /// Short tag used in log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Updated { .. } => "update",
            Self::Deleted { .. } => "deleted",
        }
    }

    /// The affected path, if the event targets a single file.
    pub fn relative_file_path(&self) -> Option<&str> {
        match self {
            Self::Init => None,
            Self::Updated { relative_file_path } | Self::Deleted { relative_file_path } => {
                Some(relative_file_path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tags_and_paths() {
        let updated = SyncEvent::updated("posts/a.md");

        assert_eq!(updated.tag(), "update");
        assert_eq!(updated.relative_file_path(), Some("posts/a.md"));
        assert_eq!(SyncEvent::deleted("posts/a.md").tag(), "deleted");
        assert_eq!(SyncEvent::Init.relative_file_path(), None);
    }

    #[test]
    fn test_serialized_tag_matches_log_tag() {
        let value = serde_json::to_value(SyncEvent::updated("posts/a.md")).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "_tag": "update", "relative_file_path": "posts/a.md" })
        );
        assert_eq!(
            serde_json::to_value(SyncEvent::Init).unwrap(),
            serde_json::json!({ "_tag": "init" })
        );
    }
}
