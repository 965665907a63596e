use crate::models::WordColor;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:p|div|li|h[1-6]|blockquote)\s*>|<br\s*/?>").expect("block break pattern")
});
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color pattern"));

/// Chapter content with markup removed, as the editor shows it. Block ends
/// and `<br>` become line breaks so words in adjacent paragraphs stay apart.
pub fn plain_text(html: &str) -> String {
    let broken = BLOCK_BREAK.replace_all(html, "\n");
    decode_entities(&TAG.replace_all(&broken, ""))
}

pub fn count_words(html: &str) -> usize {
    plain_text(html).split_whitespace().count()
}

/// Line breaks introduced for block boundaries are not counted.
pub fn count_chars(html: &str) -> usize {
    plain_text(html).chars().filter(|ch| *ch != '\n').count()
}

pub fn is_hex_color(color: &str) -> bool {
    HEX_COLOR.is_match(color)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    /// Offset in characters into the plain text.
    pub start: usize,
    pub len: usize,
    pub word: String,
    pub color: String,
}

/// Finds whole-word, case-insensitive occurrences of every mapped word.
pub fn find_highlights(text: &str, words: &[WordColor]) -> Vec<Highlight> {
    let mut highlights = Vec::new();
    for entry in words {
        let word = entry.word.trim();
        if word.is_empty() {
            continue;
        }
        let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
        let matcher = match Regex::new(&pattern) {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!(word, "skipping unmatchable word: {err}");
                continue;
            }
        };
        for found in matcher.find_iter(text) {
            highlights.push(Highlight {
                start: text[..found.start()].chars().count(),
                len: found.as_str().chars().count(),
                word: entry.word.clone(),
                color: entry.color.clone(),
            });
        }
    }
    highlights.sort_by_key(|highlight| highlight.start);
    highlights
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
