use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_V2_SPECIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([_*\[\]()~`>#+\-=|{}.!\\])").expect("valid markdown escape regex")
});

/// Prefixes every MarkdownV2 reserved character with a backslash.
pub fn escape_markdown_v2(text: &str) -> String {
    MARKDOWN_V2_SPECIAL.replace_all(text, r"\$1").into_owned()
}

/// Splits escaped text into chunks of at most `max_chars` characters, in order.
///
/// An escape pair (`\` plus the escaped character) is never split across chunks, so
/// `max_chars` must be at least 2 for the bound to hold.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut len = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let width = if ch == '\\' && chars.peek().is_some() { 2 } else { 1 };
        if len > 0 && len + width > max_chars {
            chunks.push(text[start..idx].to_string());
            start = idx;
            len = 0;
        }
        len += width;
        if width == 2 {
            chars.next();
        }
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }
    chunks
}
