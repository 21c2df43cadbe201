//! Injective encoding of cache names into single path components.

use std::borrow::Cow;

/// Encode `name` so it contains no separator and distinct names stay
/// distinct.
///
/// `%` and the separators `/`, `\` and NUL are percent-encoded. The names
/// `.` and `..` are encoded in full, and the empty name becomes a lone `%`,
/// which no other input can produce.
pub(crate) fn escape_component(name: &str) -> Cow<'_, str> {
    match name {
        "" => return Cow::Borrowed("%"),
        "." => return Cow::Borrowed("%2E"),
        ".." => return Cow::Borrowed("%2E%2E"),
        _ => {}
    }
    if !name.contains(['%', '/', '\\', '\0']) {
        return Cow::Borrowed(name);
    }

    let mut escaped = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            '\0' => escaped.push_str("%00"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
