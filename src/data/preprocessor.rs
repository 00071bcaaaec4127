// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises one sentence before tokenisation.
//
// Corpus files scraped from the web carry non-breaking spaces,
// zero-width spaces, BOMs, stray tabs and \r from Windows line
// endings. Left alone, "man\u{00A0}" and "man" would become two
// vocabulary entries.
//
// Cleaning steps (applied in order):
//   1. Map Unicode whitespace variants and control chars to space
//   2. Collapse runs of spaces into one
//   3. Trim both ends
//   4. Lowercase
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a single sentence. Line breaks are treated as spaces.
    pub fn clean(&self, text: &str) -> String {

        // ── Step 1: Normalise individual characters ───────────────────────────
        let normalised = text.chars().map(|c| match c {
            '\t' | '\r' | '\n'                 => ' ',
            '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            c if c.is_control()                => ' ',
            c                                  => c,
        });

        // ── Step 2: Collapse repeated spaces ──────────────────────────────────
        let mut out        = String::with_capacity(text.len());
        let mut last_space = false;

        for c in normalised {
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

        // ── Step 3 + 4: Trim, lowercase ───────────────────────────────────────
        out.trim().to_lowercase()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("zwei   männer"), "zwei männer");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  two men  "), "two men");
    }

    #[test]
    fn test_unicode_spaces_and_controls() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("ein\u{00A0}hund\x01läuft\r\n"), "ein hund läuft");
    }

    #[test]
    fn test_lowercases_unicode() {
        assert_eq!(Preprocessor::new().clean("Zwei MÄNNER"), "zwei männer");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
        assert_eq!(p.clean(" \t "), "");
    }
}
