//! Builder API for diagnostic messages.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
use trellis_source_map::SourceInfo;

/// Chainable constructor for [`DiagnosticMessage`].
///
/// # Example
///
/// ```
/// use trellis_error_reporting::{DiagnosticKind, DiagnosticMessageBuilder};
///
/// let msg = DiagnosticMessageBuilder::warning("Macro Overwritten")
///     .problem("`Func` was declared by two imported libraries")
///     .add_note("The later import wins")
///     .build();
///
/// assert_eq!(msg.kind, DiagnosticKind::Warning);
/// assert_eq!(msg.details.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    /// Start an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Start a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Start an informational diagnostic.
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    /// Set the problem statement. A later call replaces an earlier one.
    pub fn problem(mut self, problem: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error bullet.
    pub fn add_detail(self, content: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Error, content.into(), None)
    }

    /// Add an error bullet pointing at its own span.
    pub fn add_detail_at(self, content: impl Into<MessageContent>, location: SourceInfo) -> Self {
        self.push_detail(DetailKind::Error, content.into(), Some(location))
    }

    pub fn add_info(self, content: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Info, content.into(), None)
    }

    /// Add an info bullet pointing at its own span.
    pub fn add_info_at(self, content: impl Into<MessageContent>, location: SourceInfo) -> Self {
        self.push_detail(DetailKind::Info, content.into(), Some(location))
    }

    pub fn add_note(self, content: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Note, content.into(), None)
    }

    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: MessageContent,
        location: Option<SourceInfo>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_source_map::FileId;

    #[test]
    fn test_builder_collects_everything() {
        let first = SourceInfo::original(FileId(0), 10, 15);
        let second = SourceInfo::original(FileId(0), 40, 45);

        let msg = DiagnosticMessageBuilder::error("Duplicate Identifier")
            .with_code("T-2-4")
            .with_location(second.clone())
            .problem("Identifier `x` is declared twice")
            .add_info_at("first declared here", first.clone())
            .add_hint("Rename one of the elements?")
            .build();

        assert_eq!(msg.code.as_deref(), Some("T-2-4"));
        assert_eq!(msg.location, Some(second));
        assert_eq!(
            msg.details,
            vec![DetailItem {
                kind: DetailKind::Info,
                content: MessageContent::Markdown("first declared here".to_string()),
                location: Some(first),
            }]
        );
        assert_eq!(msg.hints.len(), 1);
    }

    #[test]
    fn test_problem_is_replaced() {
        let msg = DiagnosticMessageBuilder::info("Parsed")
            .problem("first")
            .problem("second")
            .build();

        assert_eq!(msg.kind, DiagnosticKind::Info);
        assert_eq!(msg.problem.as_ref().map(MessageContent::as_str), Some("second"));
    }

    #[test]
    fn test_detail_order_is_preserved() {
        let msg = DiagnosticMessageBuilder::error("Test")
            .add_detail("one")
            .add_note("two")
            .add_detail_at("three", SourceInfo::default())
            .build();

        let kinds: Vec<DetailKind> = msg.details.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DetailKind::Error, DetailKind::Note, DetailKind::Error]);
    }
}
