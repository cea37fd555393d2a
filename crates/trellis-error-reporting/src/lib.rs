//! Error reporting and diagnostic messages for Trellis.
//!
//! Every failure surfaced by the markup reader and the template engine can be
//! turned into a [`DiagnosticMessage`]: a titled, coded message with a
//! problem statement, bulleted details and hints, optionally anchored to a
//! [`SourceInfo`](trellis_source_map::SourceInfo) span.
//!
//! Messages render two ways:
//! - [`DiagnosticMessage::to_text`]: terminal output, with an ariadne source
//!   snippet when a [`SourceContext`](trellis_source_map::SourceContext) is
//!   available;
//! - [`DiagnosticMessage::to_json`]: machine-readable output.
//!
//! Error codes (`T-<subsystem>-<number>`) are listed in the embedded
//! [`ERROR_CATALOG`].
//!
//! # Example
//!
//! ```
//! use trellis_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Undefined Macro")
//!     .with_code("T-2-1")
//!     .problem("Macro `Bogus` is not declared by any imported library")
//!     .add_hint("Did you mean `Func`?")
//!     .build();
//!
//! assert!(error.to_text(None).contains("[T-2-1]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_docs_url, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
