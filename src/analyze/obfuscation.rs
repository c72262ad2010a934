//! Canonical form of disguised tokens (`h3uv0n`, `m!3rd@`), used only for
//! insult matching and never for display.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritics (NFD, drop combining marks), then apply the leet table
/// left-to-right in a single pass.
pub fn denoise(token: &str) -> String {
    token
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(leet)
        .collect()
}

#[inline]
fn leet(c: char) -> char {
    match c {
        '1' => 'i',
        '3' => 'e',
        '4' => 'a',
        '5' => 's',
        '7' => 't',
        '0' => 'o',
        '@' => 'a',
        '$' => 's',
        '!' => 'i',
        'x' => 'a',
        '*' => 'a',
        '?' => 'a',
        'ñ' => 'n',
        other => other,
    }
}
