use regex::Regex;
use std::sync::LazyLock;

static LINE_ENDINGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());

/// Normalize a raw transcription before line classification.
///
/// - CRLF / CR become LF
/// - form feeds (page breaks from text extraction) become a line break
/// - control characters other than `\n` and `\t` are dropped
/// - private-use characters are dropped; the reconstructor uses them internally
/// - non-breaking spaces become plain spaces
pub fn normalize_input(text: &str) -> String {
    let text = LINE_ENDINGS.replace_all(text, "\n");

    text.chars()
        .filter_map(|c| match c {
            '\x0C' => Some('\n'),
            '\n' | '\t' => Some(c),
            '\u{a0}' | '\u{202f}' => Some(' '),
            '\u{E000}'..='\u{F8FF}' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Split text into pages on form feed, dropping pages that are only whitespace.
pub fn split_pages(text: &str) -> Vec<String> {
    text.split('\x0C')
        .filter(|page| !page.trim().is_empty())
        .map(|page| page.to_string())
        .collect()
}

/// Count of characters that are not whitespace.
pub fn visible_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_input("uno\r\ndos\rtres"), "uno\ndos\ntres");
    }

    #[test]
    fn test_normalize_strips_control_and_sentinels() {
        let raw = "a\x00b\u{E000}c\u{E002}d\te";
        assert_eq!(normalize_input(raw), "abcd\te");
    }

    #[test]
    fn test_form_feed_becomes_line_break() {
        assert_eq!(normalize_input("fin de página\x0Cinicio"), "fin de página\ninicio");
    }

    #[test]
    fn test_nbsp_becomes_space() {
        assert_eq!(normalize_input("cien\u{a0}mil"), "cien mil");
    }

    #[test]
    fn test_split_pages_skips_blank_pages() {
        let pages = split_pages("uno\x0C  \n\x0Cdos");
        assert_eq!(pages, vec!["uno".to_string(), "dos".to_string()]);
    }

    #[test]
    fn test_visible_char_count() {
        assert_eq!(visible_char_count(" a b\nc "), 3);
    }
}
