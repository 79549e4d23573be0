//! Surrounding-line windows for matched lines

use serde::Serialize;

/// Context lines shown on each side of a match by default
pub const DEFAULT_CONTEXT_SIZE: usize = 3;

/// Requested context sizes are clamped to this
pub const MAX_CONTEXT_SIZE: usize = 10;

/// One line of a context window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextLine {
    /// 1-based line number in the analyzed input
    pub line_number: usize,
    pub content: String,
    pub is_match: bool,
}

/// The matched line plus up to `size` lines on each side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextWindow {
    pub before: Vec<ContextLine>,
    pub current: ContextLine,
    pub after: Vec<ContextLine>,
}

impl ContextWindow {
    /// All lines of the window in input order
    pub fn lines(&self) -> impl Iterator<Item = &ContextLine> {
        self.before
            .iter()
            .chain(std::iter::once(&self.current))
            .chain(self.after.iter())
    }
}

/// Build the window around the line at 0-based `index`
///
/// `size` is clamped to [`MAX_CONTEXT_SIZE`]; the window is clamped to the
/// bounds of `lines`. Returns `None` if `index` is out of range.
pub fn extract_context<S: AsRef<str>>(
    lines: &[S],
    index: usize,
    size: usize,
) -> Option<ContextWindow> {
    let current = lines.get(index)?;
    let size = size.min(MAX_CONTEXT_SIZE);

    let start = index.saturating_sub(size);
    let end = (index + size + 1).min(lines.len());

    let to_line = |i: usize| ContextLine {
        line_number: i + 1,
        content: lines[i].as_ref().to_string(),
        is_match: false,
    };

    Some(ContextWindow {
        before: (start..index).map(to_line).collect(),
        current: ContextLine {
            line_number: index + 1,
            content: current.as_ref().to_string(),
            is_match: true,
        },
        after: (index + 1..end).map(to_line).collect(),
    })
}
