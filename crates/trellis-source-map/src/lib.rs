//! Source locations for Trellis.
//!
//! Every markup node, attribute and diagnostic in Trellis points back into
//! the document it came from through a [`SourceInfo`]: a file id plus a byte
//! span. A [`SourceContext`] owns the registered files and turns those byte
//! offsets into rows and columns for error rendering.
//!
//! # Example
//!
//! ```rust
//! use trellis_source_map::{SourceContext, SourceInfo};
//!
//! let mut ctx = SourceContext::new();
//! let file_id = ctx.add_file("menu.xml".into(), "<template>\n  <label/>\n</template>".into());
//!
//! let info = SourceInfo::original(file_id, 13, 21);
//! let start = ctx.locate(&info).unwrap();
//! assert_eq!(start.row, 1);
//! assert_eq!(start.column, 2);
//! ```

pub mod context;
pub mod line_index;
pub mod source_info;
pub mod types;

pub use context::{SourceContext, SourceFile};
pub use line_index::LineIndex;
pub use source_info::SourceInfo;
pub use types::{FileId, Location};
