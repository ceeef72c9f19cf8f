/// Marker appended to text cut by [`shorten`].
pub const ELLIPSIS: &str = " [...]";

/// Collapse runs of whitespace and cut the result to at most `width`
/// characters, breaking on a word boundary and appending [`ELLIPSIS`].
///
/// Text that already fits is returned with its whitespace collapsed.
pub fn shorten(text: &str, width: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(ELLIPSIS.chars().count());
    let mut out = String::new();
    for word in collapsed.split(' ') {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    if out.is_empty() {
        // A single word longer than the budget; cut it mid-word.
        out = collapsed.chars().take(budget).collect();
    }
    out.push_str(ELLIPSIS);
    out
}

/// Replace line breaks with spaces so page text reads as one line.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// A horizontal rule of `width` box-drawing characters.
pub fn rule(width: usize) -> String {
    "─".repeat(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_keeps_short_text() {
        assert_eq!(shorten("hello   world", 40), "hello world");
    }

    #[test]
    fn shorten_breaks_on_words() {
        let out = shorten("the quick brown fox jumps over the lazy dog", 20);
        assert_eq!(out, "the quick [...]");
        assert!(out.chars().count() <= 20);
    }

    #[test]
    fn shorten_cuts_single_long_word() {
        let out = shorten(&"a".repeat(50), 16);
        assert_eq!(out, format!("{}{ELLIPSIS}", "a".repeat(10)));
    }

    #[test]
    fn normalize_newlines_joins_lines() {
        assert_eq!(normalize_newlines("a\nb\r\nc\rd"), "a b c d");
    }

    #[test]
    fn rule_has_requested_width() {
        assert_eq!(rule(5).chars().count(), 5);
    }
}
