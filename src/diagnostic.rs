use std::fmt;

/// A JSON parse failure pinned to a source position.
///
/// `line` and `column` are 1-indexed. A `line` of 0 means the offset could
/// not be mapped to a position (empty input, or an offset past the last
/// byte); 0 is a sentinel, never a valid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax error at row {} col {}: {}",
            self.line, self.column, self.message
        )
    }
}

/// A window of source lines around an issue, with a synthetic marker line
/// inserted after the offending one. `marker_index` is the 0-indexed
/// position of the marker within `lines`.
#[derive(Debug, PartialEq, Eq)]
pub struct DiagnosticContext {
    pub lines: Vec<String>,
    pub marker_index: usize,
}

/// Structurally parse `data` as JSON, mapping any failure to a located
/// [`SyntaxIssue`] rather than the parser's raw position.
pub fn validate(data: &[u8]) -> Result<(), SyntaxIssue> {
    match serde_json::from_slice::<serde_json::Value>(data) {
        Ok(_) => Ok(()),
        Err(err) => {
            let offset = offset_of(data, err.line(), err.column());
            let (line, column) = locate(data, offset);
            Err(SyntaxIssue {
                offset,
                line,
                column,
                message: bare_message(&err),
            })
        }
    }
}

/// Map a 0-based byte offset to a 1-indexed (line, column) pair.
///
/// Lines are delimited by `\n` and a line's span includes its trailing
/// newline. If no line contains the offset the unknown-position sentinel
/// `(0, offset)` is returned; callers must treat line 0 as "unlocated",
/// not as the first line.
pub fn locate(data: &[u8], offset: usize) -> (usize, usize) {
    let mut consumed = 0;
    for (index, span) in data.split_inclusive(|&b| b == b'\n').enumerate() {
        let end = consumed + span.len();
        if end > offset {
            return (index + 1, offset - consumed + 1);
        }
        consumed = end;
    }
    (0, offset)
}

/// Build a context window of at most `before + after + 1` source lines
/// around `issue.line`, clamped to the document, plus one marker line of
/// `column - 1` spaces followed by `^-` and the issue message.
pub fn annotate(
    data: &[u8],
    issue: &SyntaxIssue,
    before: usize,
    after: usize,
) -> DiagnosticContext {
    let mut lines = Vec::new();
    let mut marker_index = 0;
    let first = issue.line.saturating_sub(before).max(1);
    let last = issue.line.saturating_add(after);

    for (index, span) in data.split_inclusive(|&b| b == b'\n').enumerate() {
        let number = index + 1;
        if number < first || number > last {
            continue;
        }
        let text = span.strip_suffix(b"\n").unwrap_or(span);
        lines.push(String::from_utf8_lossy(text).into_owned());
        if number == issue.line {
            lines.push(format!(
                "{}^-{}",
                " ".repeat(issue.column.saturating_sub(1)),
                issue.message
            ));
            marker_index = lines.len() - 1;
        }
    }

    DiagnosticContext {
        lines,
        marker_index,
    }
}

// serde_json reports 1-indexed line/column pairs (column 0 for some
// end-of-input failures); collapse that back into a 0-based byte offset.
fn offset_of(data: &[u8], line: usize, column: usize) -> usize {
    let mut consumed = 0;
    for (index, span) in data.split_inclusive(|&b| b == b'\n').enumerate() {
        if index + 1 == line {
            return consumed + column.saturating_sub(1);
        }
        consumed += span.len();
    }
    consumed + column.saturating_sub(1)
}

// serde_json appends " at line L column C" to every message; the position
// is carried separately here, so strip it.
fn bare_message(err: &serde_json::Error) -> String {
    let text = err.to_string();
    match text.rfind(" at line ") {
        Some(pos) => text[..pos].to_string(),
        None => text,
    }
}
