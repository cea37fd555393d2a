//! Offset to row/column lookups

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Newline index over a file's content.
///
/// Stores the byte offset of every `\n` so that offsets can be turned into
/// rows and columns with a binary search instead of rescanning the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineIndex {
    line_breaks: Vec<usize>,
    total_length: usize,
}

impl LineIndex {
    /// Build the index for `content`.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("hello\nworld");
    /// let loc = index.offset_to_location(6).unwrap();
    /// assert_eq!(loc.row, 1);
    /// assert_eq!(loc.column, 0);
    /// ```
    pub fn new(content: &str) -> Self {
        let line_breaks = content
            .bytes()
            .enumerate()
            .filter_map(|(idx, byte)| (byte == b'\n').then_some(idx))
            .collect();

        LineIndex {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a [`Location`].
    ///
    /// Returns `None` if the offset lies past the end of the content.
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        // A newline belongs to the row it terminates.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };

        let row_start = if row == 0 {
            0
        } else {
            self.line_breaks[row - 1] + 1
        };

        Some(Location {
            offset,
            row,
            column: offset - row_start,
        })
    }

    /// Total length of the indexed content in bytes.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of rows in the indexed content.
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}
