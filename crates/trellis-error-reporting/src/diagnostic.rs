//! Core diagnostic message types.
//!
//! A diagnostic follows a tidyverse-style layout: a short title, an optional
//! problem statement, bulleted details and closing hints. Rendering is
//! available as plain text (with an ariadne snippet when the source is known)
//! or as JSON.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use trellis_source_map::{SourceContext, SourceInfo};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A warning that doesn't prevent completion but indicates a problem
    Warning,
    /// Informational message
    Info,
    /// A note providing additional context
    Note,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
            DiagnosticKind::Note => "Note",
        }
    }
}

/// How detail items should be presented (x/i bullet style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (ℹ bullet)
    Info,
    /// Note detail (plain bullet)
    Note,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
            DetailKind::Note => "•",
        }
    }
}

/// The content of a message or detail item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Plain text content
    Plain(String),
    /// Markdown content (backticks mark code spans)
    Markdown(String),
}

impl MessageContent {
    /// Get the raw string content for display
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(s) | MessageContent::Markdown(s) => s,
        }
    }

    /// Convert to JSON value with type information
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            MessageContent::Plain(s) => json!({ "type": "plain", "content": s }),
            MessageContent::Markdown(s) => json!({ "type": "markdown", "content": s }),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Markdown(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Markdown(s.to_string())
    }
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    /// The kind of detail (error, info, note)
    pub kind: DetailKind,
    /// The content of the detail
    pub content: MessageContent,
    /// Optional source location this detail refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A structured diagnostic message.
///
/// Structure:
/// 1. **Code**: optional error code (e.g., "T-2-1") listed in the catalog
/// 2. **Title**: brief error message
/// 3. **Kind**: Error, Warning, Info, Note
/// 4. **Problem**: what went wrong
/// 5. **Details**: specific information, optionally located
/// 6. **Hints**: guidance for fixing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Optional error code (e.g., "T-2-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Brief title for the error
    pub title: String,

    /// The kind of diagnostic
    pub kind: DiagnosticKind,

    /// The problem statement
    pub problem: Option<MessageContent>,

    /// Specific error details
    pub details: Vec<DetailItem>,

    /// Optional hints for fixing
    pub hints: Vec<MessageContent>,

    /// Primary source location for this diagnostic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    ///
    /// Prefer [`DiagnosticMessageBuilder`](crate::DiagnosticMessageBuilder)
    /// for anything with details or hints.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Create a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Get the documentation URL for this error, if it has a catalogued code.
    ///
    /// ```
    /// use trellis_error_reporting::DiagnosticMessage;
    ///
    /// let msg = DiagnosticMessage::error("Internal Error").with_code("T-0-1");
    /// assert!(msg.docs_url().is_some());
    /// ```
    pub fn docs_url(&self) -> Option<&str> {
        self.code
            .as_deref()
            .and_then(crate::catalog::get_docs_url)
    }

    /// Render this diagnostic as text.
    ///
    /// Without a usable location the whole message is written in bullet
    /// form:
    ///
    /// ```text
    /// Error [T-2-1]: Undefined Macro
    /// Macro `Bogus` is not declared
    /// ✖ Error detail
    /// ℹ Info detail
    /// ? Hint
    /// ```
    ///
    /// With a location and a [`SourceContext`] that knows the file, an
    /// ariadne snippet replaces the header, the problem and the located
    /// details; unlocated details and hints follow it.
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        let mut result = String::new();

        let snippet = ctx.and_then(|ctx| {
            let location = self
                .location
                .as_ref()
                .or_else(|| self.details.iter().find_map(|d| d.location.as_ref()))?;
            self.render_ariadne_source_context(location, ctx)
        });

        match snippet {
            Some(snippet) => {
                result.push_str(&snippet);
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    let _ = writeln!(result, "{} {}", detail.kind.bullet(), detail.content.as_str());
                }
            }
            None => {
                match &self.code {
                    Some(code) => {
                        let _ = writeln!(result, "{} [{}]: {}", self.kind.label(), code, self.title);
                    }
                    None => {
                        let _ = writeln!(result, "{}: {}", self.kind.label(), self.title);
                    }
                }
                if let Some(problem) = &self.problem {
                    let _ = writeln!(result, "{}", problem.as_str());
                }
                for detail in &self.details {
                    let _ = writeln!(result, "{} {}", detail.kind.bullet(), detail.content.as_str());
                }
            }
        }

        for hint in &self.hints {
            let _ = writeln!(result, "? {}", hint.as_str());
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// ```
    /// use trellis_error_reporting::DiagnosticMessage;
    ///
    /// let json = DiagnosticMessage::error("Something went wrong").to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let kind_str = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
            DiagnosticKind::Note => "note",
        };

        let mut obj = json!({
            "kind": kind_str,
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }

        if let Some(problem) = &self.problem {
            obj["problem"] = problem.to_json();
        }

        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let detail_kind = match d.kind {
                        DetailKind::Error => "error",
                        DetailKind::Info => "info",
                        DetailKind::Note => "note",
                    };
                    let mut detail_obj = json!({
                        "kind": detail_kind,
                        "content": d.content.to_json()
                    });
                    if let Some(location) = &d.location {
                        detail_obj["location"] = json!(location);
                    }
                    detail_obj
                })
                .collect();
            obj["details"] = json!(details);
        }

        if !self.hints.is_empty() {
            let hints: Vec<_> = self.hints.iter().map(MessageContent::to_json).collect();
            obj["hints"] = json!(hints);
        }

        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        obj
    }

    fn render_ariadne_source_context(
        &self,
        main_location: &SourceInfo,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file = ctx.get_file(main_location.file_id)?;
        let content_len = file.content.len();
        if main_location.end > content_len {
            return None;
        }

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let mut report = Report::build(report_kind, file.path.clone(), main_location.start)
            .with_config(Config::default().with_color(false));

        report = match &self.code {
            Some(code) => report.with_message(format!("[{}] {}", code, self.title)),
            None => report.with_message(&self.title),
        };

        let main_message = self
            .problem
            .as_ref()
            .map_or(self.title.as_str(), MessageContent::as_str);

        report = report.with_label(
            Label::new((file.path.clone(), main_location.start..main_location.end))
                .with_message(main_message)
                .with_color(main_color),
        );

        for detail in &self.details {
            let Some(detail_loc) = &detail.location else {
                continue;
            };
            if detail_loc.file_id != main_location.file_id || detail_loc.end > content_len {
                continue;
            }
            let detail_color = match detail.kind {
                DetailKind::Error => Color::Red,
                DetailKind::Info => Color::Cyan,
                DetailKind::Note => Color::Blue,
            };
            report = report.with_label(
                Label::new((file.path.clone(), detail_loc.start..detail_loc.end))
                    .with_message(detail.content.as_str())
                    .with_color(detail_color),
            );
        }

        let mut output = Vec::new();
        report
            .finish()
            .write(
                (file.path.clone(), Source::from(file.content.as_str())),
                &mut output,
            )
            .ok()?;

        String::from_utf8(output).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticMessageBuilder;
    use pretty_assertions::assert_eq;
    use trellis_source_map::FileId;

    #[test]
    fn test_message_content_from_str() {
        let content: MessageContent = "test".into();
        assert_eq!(content.as_str(), "test");
        assert_eq!(content, MessageContent::Markdown("test".to_string()));
    }

    #[test]
    fn test_to_text_without_location() {
        let msg = DiagnosticMessageBuilder::error("Duplicate Identifier")
            .with_code("T-2-4")
            .problem("Identifier `x` is declared twice")
            .add_detail("First declared on `label`")
            .add_info("Identifiers must be unique per document")
            .add_hint("Rename one of the elements?")
            .build();

        insta::assert_snapshot!(msg.to_text(None), @r"
        Error [T-2-4]: Duplicate Identifier
        Identifier `x` is declared twice
        ✖ First declared on `label`
        ℹ Identifiers must be unique per document
        ? Rename one of the elements?
        ");
    }

    #[test]
    fn test_to_text_without_code() {
        let msg = DiagnosticMessage::warning("Macro overwritten");
        assert_eq!(msg.to_text(None), "Warning: Macro overwritten\n");
    }

    #[test]
    fn test_to_text_with_source_context() {
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file(
            "menu.xml".to_string(),
            "<template>\n  <label text=\"Bogus(1)\"/>\n</template>".to_string(),
        );

        let msg = DiagnosticMessageBuilder::error("Undefined Macro")
            .with_code("T-2-1")
            .with_location(SourceInfo::original(file_id, 25, 35))
            .problem("Macro `Bogus` is not declared")
            .add_hint("Import the library that declares it?")
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("[T-2-1] Undefined Macro"), "{}", text);
        assert!(text.contains("menu.xml"), "{}", text);
        assert!(text.contains("Macro `Bogus` is not declared"), "{}", text);
        assert!(text.ends_with("? Import the library that declares it?\n"), "{}", text);
    }

    #[test]
    fn test_to_text_falls_back_for_unknown_file() {
        let ctx = SourceContext::new();
        let msg = DiagnosticMessageBuilder::error("Undefined Macro")
            .with_code("T-2-1")
            .with_location(SourceInfo::original(FileId(7), 0, 3))
            .build();

        assert_eq!(msg.to_text(Some(&ctx)), "Error [T-2-1]: Undefined Macro\n");
    }

    #[test]
    fn test_to_json() {
        let msg = DiagnosticMessageBuilder::error("Unknown Library")
            .with_code("T-2-5")
            .with_location(SourceInfo::original(FileId(0), 3, 9))
            .problem("Library `extras` is not available")
            .add_hint("Register it as an available library?")
            .build();

        let json = msg.to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "T-2-5");
        assert_eq!(json["problem"]["type"], "markdown");
        assert_eq!(json["problem"]["content"], "Library `extras` is not available");
        assert_eq!(json["hints"][0]["content"], "Register it as an available library?");
        assert_eq!(json["location"]["start"], 3);
        assert_eq!(json["location"]["end"], 9);
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_docs_url() {
        let msg = DiagnosticMessage::error("Undefined Macro").with_code("T-2-1");
        assert_eq!(msg.docs_url(), Some("https://trellis.dev/docs/errors/T-2-1"));
        assert_eq!(DiagnosticMessage::error("No code").docs_url(), None);
    }
}
