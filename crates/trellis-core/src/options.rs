/*
 * options.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Per-document configuration.

use crate::registry::DuplicatePolicy;
use serde::{Deserialize, Serialize};

/// Name reported for documents constructed without a file name.
pub const DEFAULT_FILE_NAME: &str = "<template>";

/// Options for one [`Document`](crate::Document).
///
/// Every field has a default, so partial configurations deserialize:
///
/// ```
/// use trellis_core::{DocumentOptions, DuplicatePolicy};
///
/// let options: DocumentOptions =
///     serde_json::from_str(r#"{ "duplicate_policy": "warn" }"#).unwrap();
/// assert_eq!(options.duplicate_policy, DuplicatePolicy::Warn);
/// assert!(options.import_element);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Identity of the markup source in errors and snippets.
    pub file_name: Option<String>,
    pub duplicate_policy: DuplicatePolicy,
    /// Whether `<import library="..."/>` children of the root are honoured.
    pub import_element: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            duplicate_policy: DuplicatePolicy::default(),
            import_element: true,
        }
    }
}

impl DocumentOptions {
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub(crate) fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = DocumentOptions::default();
        assert_eq!(options.duplicate_policy, DuplicatePolicy::Overwrite);
        assert!(options.import_element);
        assert_eq!(options.display_name(), "<template>");
    }

    #[test]
    fn test_deserialize_full() {
        let options: DocumentOptions = serde_json::from_str(
            r#"{ "file_name": "menu.xml", "duplicate_policy": "reject", "import_element": false }"#,
        )
        .unwrap();
        assert_eq!(
            options,
            DocumentOptions::default()
                .with_file_name("menu.xml")
                .with_duplicate_policy(DuplicatePolicy::Reject)
                .import_element_disabled()
        );
    }

    impl DocumentOptions {
        fn import_element_disabled(mut self) -> Self {
            self.import_element = false;
            self
        }
    }
}
