use std::borrow::Cow;

use tabled::Tabled;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Padding, Style};
use unicode_width::UnicodeWidthStr;

/// Spaces between columns
const PADDING: usize = 2;

/// Left-aligned text table with a header and a dashed separator row
///
/// Every column but the last is padded to its widest cell plus [`PADDING`];
/// trailing blanks are dropped so the last column is written as is.
pub(crate) fn render_rows<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    let headers = T::headers();

    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    builder.push_record(headers.iter().map(|h| "-".repeat(h.width())));
    for row in rows {
        builder.push_record(row.fields().into_iter().map(Cow::into_owned));
    }

    let mut table = builder.build();
    table
        .with(Style::empty())
        .with(Padding::new(0, PADDING, 0, 0))
        .modify(Columns::last(), Padding::zero());

    let mut out = String::new();
    for line in table.to_string().lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Cut `s` to at most `max` characters, marking the cut with `...`
pub fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &s[..idx])),
        None => Cow::Borrowed(s),
    }
}
