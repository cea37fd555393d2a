//! Byte-span source information

use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// A half-open byte span `[start, end)` inside a registered file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The file the span points into
    pub file_id: FileId,
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl SourceInfo {
    /// Create source info for a span in an original file
    pub fn original(file_id: FileId, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted span {}..{}", start, end);
        SourceInfo { file_id, start, end }
    }

    /// Start byte offset of the span.
    pub fn start_offset(&self) -> usize {
        self.start
    }

    /// End byte offset of the span.
    pub fn end_offset(&self) -> usize {
        self.end
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// Spans from different files cannot be joined; `self` is returned unchanged.
    pub fn join(&self, other: &SourceInfo) -> SourceInfo {
        if self.file_id != other.file_id {
            return self.clone();
        }
        SourceInfo {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice the spanned text out of the file content.
    pub fn slice<'a>(&self, content: &'a str) -> Option<&'a str> {
        content.get(self.start..self.end)
    }
}
