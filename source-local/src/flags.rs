//! Flags controlling how loading problems are reported.

use serde::{Deserialize, Serialize};

/// What to do when a file carries fields its type does not declare.
///
/// Extra fields are always kept on the document; this only controls the
/// warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnExtraData {
    /// Log a warning naming the extra fields.
    Warn,

    /// Stay silent.
    Ignore,
}

impl Default for OnExtraData {
    fn default() -> Self {
        Self::Warn
    }
}

/// What to do when a file misses required fields or has mistyped values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnMissingOrIncompatibleData {
    /// Log a warning and leave the file out of the cache.
    Skip,

    /// Abort synchronization with an error.
    Fail,

    /// Leave the file out of the cache without logging.
    SkipIgnore,
}

impl Default for OnMissingOrIncompatibleData {
    fn default() -> Self {
        Self::Skip
    }
}

/// Loader flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncFlags {
    pub on_extra_data: OnExtraData,
    pub on_missing_or_incompatible_data: OnMissingOrIncompatibleData,
}

impl SyncFlags {
    pub fn with_on_extra_data(mut self, on_extra_data: OnExtraData) -> Self {
        self.on_extra_data = on_extra_data;
        self
    }

    pub fn with_on_missing_or_incompatible_data(
        mut self,
        on_missing_or_incompatible_data: OnMissingOrIncompatibleData,
    ) -> Self {
        self.on_missing_or_incompatible_data = on_missing_or_incompatible_data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let flags = SyncFlags::default();

        assert_eq!(flags.on_extra_data, OnExtraData::Warn);
        assert_eq!(
            flags.on_missing_or_incompatible_data,
            OnMissingOrIncompatibleData::Skip
        );
    }

    #[test]
    fn test_kebab_case_values() {
        let flags: SyncFlags = toml::from_str(
            r#"
            on_extra_data = "ignore"
            on_missing_or_incompatible_data = "skip-ignore"
            "#,
        )
        .unwrap();

        assert_eq!(
            flags,
            SyncFlags::default()
                .with_on_extra_data(OnExtraData::Ignore)
                .with_on_missing_or_incompatible_data(OnMissingOrIncompatibleData::SkipIgnore)
        );
    }

    #[test]
    fn test_partial_flags_keep_defaults() {
        let flags: SyncFlags = toml::from_str(r#"on_missing_or_incompatible_data = "fail""#).unwrap();

        assert_eq!(flags.on_extra_data, OnExtraData::Warn);
        assert_eq!(
            flags.on_missing_or_incompatible_data,
            OnMissingOrIncompatibleData::Fail
        );
    }
}
