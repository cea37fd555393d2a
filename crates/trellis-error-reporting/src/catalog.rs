//! Error code catalog and lookup.
//!
//! Maps error codes (like "T-2-1") to their metadata. Codes are grouped by
//! subsystem: `T-0` internal, `T-1` markup, `T-2` engine.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "markup", "parsing", "lookup")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message used when no problem statement is given
    pub message_template: String,

    /// URL to documentation (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded at compile time.
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid, which the
/// catalog tests rule out.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("embedded error catalog is not valid JSON")
});

/// Look up error code information.
///
/// # Example
///
/// ```
/// use trellis_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("T-2-4").unwrap();
/// assert_eq!(info.title, "Duplicate Identifier");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get documentation URL for an error code.
pub fn get_docs_url(code: &str) -> Option<&str> {
    ERROR_CATALOG
        .get(code)
        .and_then(|info| info.docs_url.as_deref())
}

/// Get the subsystem name for an error code.
///
/// ```
/// use trellis_error_reporting::catalog::get_subsystem;
///
/// assert_eq!(get_subsystem("T-1-1"), Some("markup"));
/// ```
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert!(!ERROR_CATALOG.is_empty());
    }

    #[test]
    fn test_codes_match_subsystem_prefix() {
        for (code, info) in ERROR_CATALOG.iter() {
            let expected = match info.subsystem.as_str() {
                "internal" => "T-0-",
                "markup" => "T-1-",
                _ => "T-2-",
            };
            assert!(
                code.starts_with(expected),
                "{} is filed under subsystem {}",
                code,
                info.subsystem
            );
        }
    }

    #[test]
    fn test_docs_urls_point_at_their_code() {
        for (code, info) in ERROR_CATALOG.iter() {
            let url = info.docs_url.as_deref().unwrap_or_default();
            assert!(url.ends_with(code.as_str()), "{} has docs url {}", code, url);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(get_subsystem("T-2-1"), Some("parsing"));
        assert_eq!(get_error_info("T-2-33").map(|i| i.title.as_str()), Some("Unknown Function"));
        assert!(get_docs_url("T-0-1").is_some());
    }

    #[test]
    fn test_nonexistent_code() {
        assert!(get_error_info("T-99-99").is_none());
        assert!(get_docs_url("T-99-99").is_none());
        assert!(get_subsystem("T-99-99").is_none());
    }
}
