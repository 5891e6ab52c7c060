//! Recovers anchor and alias names from the source text.
//!
//! saphyr-parser numbers anchors and reports only the number on node and
//! alias events. The names are read back from the text: an anchor lexeme
//! sits between the previous node and the node it annotates, separated from
//! it only by whitespace, comments, indicators and tags.

use saphyr_parser::Marker;

/// Characters that end an anchor or alias name.
fn ends_name(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Byte position of a parser marker within `source`.
pub(crate) fn byte_position(source: &str, marker: &Marker) -> usize {
    marker.byte_offset().unwrap_or_else(|| {
        source
            .char_indices()
            .nth(marker.index())
            .map_or(source.len(), |(byte, _)| byte)
    })
}

/// Read the name of an alias at `offset` (pointing at `*` or at the name itself).
pub(crate) fn alias_name_at(source: &str, offset: usize) -> Option<String> {
    let rest = source.get(offset..)?;
    let rest = rest.strip_prefix('*').unwrap_or(rest);
    let end = rest.find(ends_name).unwrap_or(rest.len());
    (end > 0).then(|| rest[..end].to_string())
}

/// Find the next anchor lexeme at or after `from`.
///
/// Returns the name and the byte position just past it. Scanning stops at
/// the first character that belongs to node content.
pub(crate) fn next_anchor(source: &str, from: usize) -> Option<(String, usize)> {
    let bytes = source.as_bytes();
    let mut i = from;
    let mut line_start = from == 0 || bytes.get(from.wrapping_sub(1)) == Some(&b'\n');

    while i < bytes.len() {
        let b = bytes[i];
        let next_is_blank = bytes
            .get(i + 1)
            .is_none_or(|n| n.is_ascii_whitespace() || matches!(n, b',' | b']' | b'}'));
        match b {
            b'\n' => {
                line_start = true;
                i += 1;
                continue;
            }
            b' ' | b'\t' | b'\r' => {
                i += 1;
                continue;
            }
            b'#' => {
                i = skip_line(bytes, i);
                continue;
            }
            b'%' if line_start => {
                i = skip_line(bytes, i);
                continue;
            }
            b'-' | b'.' if line_start && source[i..].starts_with(if b == b'-' { "---" } else { "..." }) => {
                i += 3;
            }
            b'-' | b'?' | b':' if next_is_blank => {
                i += 1;
            }
            b',' | b'[' | b'{' | b']' | b'}' => {
                i += 1;
            }
            b'!' => {
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
            }
            b'&' => {
                let start = i + 1;
                let rest = &source[start..];
                let len = rest.find(ends_name).unwrap_or(rest.len());
                if len == 0 {
                    return None;
                }
                return Some((rest[..len].to_string(), start + len));
            }
            _ => return None,
        }
        line_start = false;
    }
    None
}

fn skip_line(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}
