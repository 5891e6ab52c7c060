//! Renders an [`Error`] against its source text as a rustc-like snippet.

use annotate_snippets::{renderer::DecorStyle, AnnotationKind, Level, Renderer, Snippet};

use crate::error::Error;

/// Render `err` with a few lines of `source` around its location.
///
/// Errors without a location (or a location outside `source`) render as
/// their plain message.
///
/// ```rust
/// let yaml = "ok: 1\nbad: *missing\n";
/// let err = yaml_anchor_codec::parse(yaml).unwrap_err();
/// let text = yaml_anchor_codec::render_error(&err, yaml, "config.yaml");
/// assert!(text.contains("config.yaml:2:6"));
/// assert!(text.contains("bad: *missing"));
/// ```
#[cold]
pub fn render_error(err: &Error, source: &str, path: &str) -> String {
    let msg = err.to_string();
    let Some(location) = err.location() else {
        return msg;
    };
    let bare = bare_message(&msg);

    let row = location.line() as usize;
    let col = location.column() as usize;
    let starts = line_starts(source);
    if row == 0 || row > starts.len() {
        return msg;
    }
    let Some(start) = line_col_to_byte_offset(source, &starts, row, col) else {
        return msg;
    };
    // One character, or an empty span at end of line.
    let end = match source.as_bytes().get(start) {
        Some(b'\n') | Some(b'\r') | None => start,
        Some(_) => next_char_boundary(source, start),
    };

    // Two lines before, two lines after.
    let first_row = row.saturating_sub(2).max(1);
    let last_row = (row + 2).min(starts.len());
    let window_start = starts[first_row - 1];
    let window_end = starts.get(last_row).copied().unwrap_or(source.len());
    let window = &source[window_start..window_end];

    let report = &[Level::ERROR.primary_title(bare).element(
        Snippet::source(window)
            .line_start(first_row)
            .path(path)
            .fold(false)
            .annotation(
                AnnotationKind::Primary
                    .span(start - window_start..end - window_start)
                    .label(bare),
            ),
    )];

    // Plain caret output keeps the text stable outside terminals.
    let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
    renderer.render(report).to_string()
}

/// The message without the " at line X, column Y" suffix; the snippet shows it.
fn bare_message(msg: &str) -> &str {
    match msg.rfind(" at line ") {
        Some(cut) => &msg[..cut],
        None => msg,
    }
}

/// Byte offsets of all line starts in `source`.
fn line_starts(source: &str) -> Vec<usize> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0usize];
    starts.extend(
        source
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

/// 1-based line and character column to a byte offset. Column `len + 1`
/// points at the end of the line.
fn line_col_to_byte_offset(source: &str, starts: &[usize], row: usize, col: usize) -> Option<usize> {
    if col == 0 {
        return None;
    }
    let line_start = starts[row - 1];
    let mut line_end = starts
        .get(row)
        .map_or(source.len(), |next| next.saturating_sub(1));
    if line_end > line_start && source.as_bytes().get(line_end - 1) == Some(&b'\r') {
        line_end -= 1;
    }
    let line = &source[line_start..line_end];
    let offset = match line.char_indices().nth(col - 1) {
        Some((i, _)) => i,
        None if line.chars().count() + 1 == col => line.len(),
        None => return None,
    };
    Some(line_start + offset)
}

fn next_char_boundary(source: &str, start: usize) -> usize {
    source[start..]
        .char_indices()
        .nth(1)
        .map_or(source.len(), |(i, _)| start + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    #[test]
    fn renders_caret_under_alias() {
        let yaml = "ok: 1\nbad: *missing\nnext: 2\n";
        let err = crate::parse(yaml).unwrap_err();
        let rendered = render_error(&err, yaml, "<input>");
        assert!(rendered.contains("<input>:2:6"), "{rendered}");
        assert!(rendered.contains("ok: 1"), "{rendered}");
        assert!(rendered.contains("next: 2"), "{rendered}");
        assert!(rendered.contains('^'), "{rendered}");
        assert!(rendered.contains("undefined anchor `missing`"), "{rendered}");
    }

    #[test]
    fn unknown_location_falls_back_to_message() {
        let err = Error::InvalidMerge {
            location: Location::UNKNOWN,
        };
        assert_eq!(render_error(&err, "a: 1\n", "x.yaml"), err.to_string());
    }

    #[test]
    fn multibyte_columns_map_to_bytes() {
        let src = "ключ: значение\n";
        let starts = line_starts(src);
        let off = line_col_to_byte_offset(src, &starts, 1, 7).unwrap();
        assert_eq!(&src[off..off + 2], "з");
    }
}
