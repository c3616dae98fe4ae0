// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw text before tokenisation. Transcribed corpora
// carry non-breaking spaces, zero-width spaces, Windows line
// endings and stray control characters; if we don't clean these,
// they become vocabulary entries of their own.
//
// Tokenisation itself is whitespace splitting — the corpora this
// model targets are already word-tokenised, one sentence per
// line. Optional lowercasing folds case variants into one
// vocabulary entry; the surface form is preserved elsewhere for
// output reconstruction.

pub struct Preprocessor {
    lowercase: bool,
}

impl Preprocessor {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    /// Clean a raw text string for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Normalise individual characters ───────────────────────────
        let step1: String = text
            .chars()
            .map(|c| match c {
                '\t' => ' ',
                // Non-breaking space → regular space
                '\u{00A0}' => ' ',
                // Zero-width space → regular space
                '\u{200B}' => ' ',
                // Byte order mark → space
                '\u{FEFF}' => ' ',
                // Windows carriage return → Unix newline
                '\r' => '\n',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        // ── Step 2: Collapse runs of spaces, trim each line ───────────────────
        step1
            .lines()
            .map(|line| {
                let mut out        = String::with_capacity(line.len());
                let mut last_space = false;
                for c in line.chars() {
                    if c == ' ' {
                        if !last_space {
                            out.push(' ');
                        }
                        last_space = true;
                    } else {
                        out.push(c);
                        last_space = false;
                    }
                }
                out.trim().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Normalise one token for vocabulary lookup.
    pub fn normalize(&self, token: &str) -> String {
        if self.lowercase {
            token.to_lowercase()
        } else {
            token.to_string()
        }
    }

    /// Clean, split on whitespace and normalise one sentence.
    pub fn tokenize(&self, sentence: &str) -> Vec<String> {
        self.clean(sentence)
            .split_whitespace()
            .map(|t| self.normalize(t))
            .collect()
    }

    /// Tokenise a whole document, one token list per sentence.
    /// Sentences that clean down to nothing are dropped.
    pub fn tokenize_document(&self, sentences: &[String]) -> Vec<Vec<String>> {
        sentences
            .iter()
            .map(|s| self.tokenize(s))
            .filter(|tokens| !tokens.is_empty())
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(true)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new(false);
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new(false);
        assert_eq!(p.clean("  hello world  "), "hello world");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new(false);
        assert_eq!(p.clean("hello\x01world"), "hello world");
    }

    #[test]
    fn test_lowercase_applies_to_tokens_only_when_enabled() {
        let lower = Preprocessor::new(true);
        let keep  = Preprocessor::new(false);
        assert_eq!(lower.tokenize("The CAT"), vec!["the", "cat"]);
        assert_eq!(keep.tokenize("The CAT"), vec!["The", "CAT"]);
    }

    #[test]
    fn test_empty_sentences_are_dropped_from_documents() {
        let p = Preprocessor::new(true);
        let sentences = vec![
            "one two".to_string(),
            "   ".to_string(),
            "three".to_string(),
        ];
        let tokenized = p.tokenize_document(&sentences);
        assert_eq!(tokenized.len(), 2);
        assert_eq!(tokenized[1], vec!["three"]);
    }
}
