//! Output formatting for modscope
//!
//! Both pipelines render their collection once, either as JSON or as an
//! aligned text table. Every function returns the finished text; printing is
//! left to the caller.

mod logs;
mod snippets;
mod table;

pub use logs::{DEFAULT_MAX_URI, TableOptions, render_json, render_table, sorted_records};
pub use snippets::{
    DEFAULT_MAX_SNIPPET, explain, render_snippets_json, render_snippets_table,
};
pub use table::truncate;
