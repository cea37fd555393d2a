//! Source context for managing files

use crate::line_index::LineIndex;
use crate::source_info::SourceInfo;
use crate::types::{FileId, Location};
use serde::{Deserialize, Serialize};

/// Registry of the source files diagnostics may point into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A registered source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path or display name (e.g. `<anonymous>`)
    pub path: String,
    /// Full file content
    pub content: String,
    /// Newline index for location lookups
    #[serde(skip)]
    line_index: Option<LineIndex>,
}

impl SourceFile {
    /// Newline index of this file, built on registration.
    ///
    /// Files restored from serialized form have no index until
    /// [`SourceContext::reindex`] is called.
    pub fn line_index(&self) -> Option<&LineIndex> {
        self.line_index.as_ref()
    }
}

impl SourceContext {
    /// Create a new empty source context
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id. Ids are handed out sequentially.
    pub fn add_file(&mut self, path: String, content: String) -> FileId {
        let id = FileId(self.files.len());
        let line_index = Some(LineIndex::new(&content));
        self.files.push(SourceFile {
            path,
            content,
            line_index,
        });
        id
    }

    /// Get a file by id
    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file has been registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolve the start of `info` to a row/column location.
    pub fn locate(&self, info: &SourceInfo) -> Option<Location> {
        self.get_file(info.file_id)?
            .line_index()?
            .offset_to_location(info.start)
    }

    /// Resolve both ends of `info`.
    pub fn locate_range(&self, info: &SourceInfo) -> Option<(Location, Location)> {
        let index = self.get_file(info.file_id)?.line_index()?;
        Some((
            index.offset_to_location(info.start)?,
            index.offset_to_location(info.end)?,
        ))
    }

    /// Text covered by `info`, if the span is valid for its file.
    pub fn snippet(&self, info: &SourceInfo) -> Option<&str> {
        info.slice(&self.get_file(info.file_id)?.content)
    }

    /// Rebuild the line indexes after deserialization.
    pub fn reindex(&mut self) {
        for file in &mut self.files {
            if file.line_index.is_none() {
                file.line_index = Some(LineIndex::new(&file.content));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let ctx = SourceContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.get_file(FileId(0)).is_none());
    }

    #[test]
    fn test_multiple_files() {
        let mut ctx = SourceContext::new();
        let first = ctx.add_file("first.xml".to_string(), "<a/>".to_string());
        let second = ctx.add_file("second.xml".to_string(), "<b/>".to_string());

        assert_eq!(first, FileId(0));
        assert_eq!(second, FileId(1));
        assert_eq!(ctx.get_file(second).unwrap().path, "second.xml");
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_locate_and_snippet() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file(
            "doc.xml".to_string(),
            "<template>\n  <label text=\"hi\"/>\n</template>".to_string(),
        );

        let info = SourceInfo::original(id, 14, 19);
        assert_eq!(ctx.snippet(&info), Some("label"));

        let (start, end) = ctx.locate_range(&info).unwrap();
        assert_eq!((start.row, start.column), (1, 3));
        assert_eq!((end.row, end.column), (1, 8));
    }

    #[test]
    fn test_reindex_after_round_trip() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("doc.xml".to_string(), "<a>\n</a>".to_string());

        let json = serde_json::to_string(&ctx).unwrap();
        let mut restored: SourceContext = serde_json::from_str(&json).unwrap();
        assert!(restored.locate(&SourceInfo::original(id, 4, 5)).is_none());

        restored.reindex();
        let loc = restored.locate(&SourceInfo::original(id, 4, 5)).unwrap();
        assert_eq!(loc.row, 1);
    }
}
