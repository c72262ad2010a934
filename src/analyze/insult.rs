//! Disguised-profanity detection.
//!
//! A token is an insult when its denoised form either contains an entry of the
//! insult list (substring) or fully matches one of the lexicon's obfuscation
//! patterns. Any insult in a text forces the text to `(NEG, 1.0)`.

use crate::analyze::obfuscation::denoise;
use crate::lexicon::Lexicon;

#[derive(Debug, Clone, Copy)]
pub struct InsultDetector<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> InsultDetector<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Check a single whitespace-delimited token.
    pub fn is_insult(&self, token: &str) -> bool {
        let lowered = token.to_lowercase();
        let full = denoise(&lowered);
        if full.is_empty() {
            return false;
        }
        if self.lexicon.insults().iter().any(|w| full.contains(w.as_str())) {
            return true;
        }

        // Patterns are anchored, so try the token with and without surrounding
        // punctuation ("h3uv0n," must still match).
        let bare = denoise(lowered.trim_matches(|c: char| !c.is_alphanumeric()));
        self.lexicon
            .insult_patterns()
            .iter()
            .any(|re| re.is_match(&full) || (!bare.is_empty() && re.is_match(&bare)))
    }

    /// True if any whitespace token of `text` is an insult.
    pub fn contains_insult(&self, text: &str) -> bool {
        text.split_whitespace().any(|t| self.is_insult(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lx() -> Lexicon {
        Lexicon::builtin()
    }

    #[test]
    fn plain_accented_and_leet_forms() {
        let lx = lx();
        let d = InsultDetector::new(&lx);
        assert!(d.is_insult("huevón"));
        assert!(d.is_insult("huxv0n"));
        assert!(d.is_insult("h3uv0n"));
        assert!(d.is_insult("HUEVON"));
        assert!(d.is_insult("m13rd4"));
        assert!(d.is_insult("#idiota"));
        assert!(!d.is_insult("excelente"));
        assert!(!d.is_insult("candidato"));
    }

    #[test]
    fn trailing_punctuation_does_not_hide_pattern_match() {
        let lx = lx();
        let d = InsultDetector::new(&lx);
        assert!(d.is_insult("h3uv0n,"));
        assert!(d.is_insult("(3stup1d0)"));
    }

    #[test]
    fn innocent_words_pass() {
        let lx = lx();
        let d = InsultDetector::new(&lx);
        for w in ["disputa", "vergara", "cobran", "estupendo", "américa", "habano"] {
            assert!(!d.is_insult(w), "false positive on {w}");
        }
    }

    #[test]
    fn empty_lexicon_never_flags() {
        let lx = Lexicon::default();
        let d = InsultDetector::new(&lx);
        assert!(!d.contains_insult("huevón idiota"));
    }
}
