//! Greedy word wrap for the text digest.

/// Column width used for wrapped paragraphs in the text digest.
pub const WRAP_WIDTH: usize = 78;

/// Wrap `text` to lines of at most `width` characters.
///
/// Words are never split or hyphenated: a single word longer than `width`
/// sits alone on its own line. Runs of whitespace, newlines included,
/// collapse to one space. Empty input yields an empty string.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if line_len > 0 && line_len + 1 + len > width {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += len;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wrap_fills_greedily() {
        assert_eq!(wrap_text("aaa bbb ccc ddd", 7), "aaa bbb\nccc ddd");
        assert_eq!(wrap_text("aaa bbb ccc", 8), "aaa bbb\nccc");
    }

    #[test]
    fn test_wrap_keeps_long_words_whole() {
        assert_eq!(wrap_text("a supercalifragilistic b", 10), "a\nsupercalifragilistic\nb");
    }

    #[test]
    fn test_wrap_collapses_whitespace_and_handles_empty() {
        assert_eq!(wrap_text("  one\n\ntwo\tthree  ", 78), "one two three");
        assert_eq!(wrap_text("", 78), "");
        assert_eq!(wrap_text("   ", 78), "");
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        // Each word is 5 chars but 10 bytes
        let text = "ééééé ééééé";
        assert_eq!(wrap_text(text, 11), text);
    }
}
