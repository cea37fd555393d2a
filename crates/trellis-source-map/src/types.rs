//! Core types for source mapping

use serde::{Deserialize, Serialize};

/// A unique identifier for a source file registered in a
/// [`SourceContext`](crate::SourceContext).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A resolved position in source text (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in bytes from the start of the row)
    pub column: usize,
}
