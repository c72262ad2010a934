// src/text.rs
//! Deterministic cleanup of social-media text for matching and display.
//!
//! Both entry points are idempotent: running the output through again yields
//! the same string.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").expect("url regex"));
static RE_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("mention regex"));
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("non-word regex"));

/// Minimum length (chars) a token needs to survive the word-cloud variant.
const WORDCLOUD_MIN_CHARS: usize = 3;

/// Lowercase; drop URLs, @-mentions, the `#` sigil, punctuation/symbols and purely
/// numeric tokens; collapse whitespace. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    clean_tokens(text).join(" ")
}

/// Same as [`normalize`], but tokens of two chars or fewer are also dropped.
pub fn normalize_for_wordcloud(text: &str) -> String {
    clean_tokens(text)
        .into_iter()
        .filter(|t| t.chars().count() >= WORDCLOUD_MIN_CHARS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convenience for optional corpus fields.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn clean_tokens(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    // 1) Scraped text still carries HTML entities (&amp;, &quot;).
    let decoded = html_escape::decode_html_entities(text);
    let lowered = decoded.to_lowercase();

    // 2) URLs and mentions go entirely; hashtags keep their body.
    let out = RE_URL.replace_all(&lowered, " ");
    let out = RE_MENTION.replace_all(&out, " ");
    let out = RE_NON_WORD.replace_all(&out, " ");

    // 3) Collapse whitespace, drop numeric-only tokens.
    out.split_whitespace()
        .filter(|t| !t.chars().all(|c| c.is_numeric()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordcloud_strips_urls_hashtags_and_short_tokens() {
        assert_eq!(
            normalize_for_wordcloud("¡Visita https://example.com #Ecuador ahora!"),
            "visita ecuador ahora"
        );
        assert_eq!(normalize_for_wordcloud("RT @user: Ganamos 100%"), "ganamos");
    }

    #[test]
    fn plain_normalize_keeps_short_tokens() {
        assert_eq!(normalize("RT @user: Ganamos 100%"), "rt ganamos");
        assert_eq!(normalize("Sí,   SEÑOR  #Vamos"), "sí señor vamos");
    }

    #[test]
    fn empty_and_link_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("https://t.co/abc @alguien www.x.com"), "");
        assert_eq!(normalize_opt(None), "");
    }

    #[test]
    fn html_entities_are_decoded_then_stripped() {
        assert_eq!(normalize("Correa &amp; Noboa"), "correa noboa");
    }

    #[test]
    fn idempotent_on_samples() {
        for s in [
            "¡Visita https://example.com #Ecuador ahora!",
            "RT @user: Ganamos 100%",
            "&amp;amp; 2025 año_nuevo",
            "İstanbul ÑANDÚ",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {s:?}");
            let wc = normalize_for_wordcloud(s);
            assert_eq!(normalize_for_wordcloud(&wc), wc);
        }
    }
}
