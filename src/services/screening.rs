//! Prohibited-term screening for campaign text.
//!
//! The term list is configuration data, not logic: the embedded defaults can
//! be replaced wholesale via a one-term-per-line file. Matching is
//! case-insensitive on word boundaries.

use std::path::Path;

/// Default prohibited terms for ad copy. Covers unsubstantiated medical and
/// financial claims plus restricted product categories.
const DEFAULT_PROHIBITED_TERMS: &[&str] = &[
    // Medical / health claims
    "cure",
    "cures",
    "miracle cure",
    "clinically proven",
    "doctor recommended",
    "fda approved",
    "guaranteed results",
    "instant relief",
    "anti-aging breakthrough",
    "weight loss guarantee",
    "burns fat",
    "detox",
    "heals",
    "pain free forever",
    "medical grade",
    "prescription strength",
    // Financial claims
    "get rich quick",
    "guaranteed returns",
    "risk free",
    "double your money",
    "financial freedom guaranteed",
    "passive income guarantee",
    "no risk investment",
    "insider tip",
    "crypto pump",
    "ponzi",
    // Absolute / superlative claims
    "best in the world",
    "number one guaranteed",
    "100% effective",
    "never fails",
    "scientifically perfect",
    "zero side effects",
    // Restricted categories
    "firearm",
    "firearms",
    "ammunition",
    "explosives",
    "tobacco",
    "cigarette",
    "cigarettes",
    "vape",
    "vaping",
    "e-cigarette",
    "narcotic",
    "narcotics",
    "steroids",
    "gambling jackpot",
    "betting odds",
    "casino bonus",
    "payday loan",
    "debt erasure",
    // Deceptive urgency
    "act now or lose",
    "limited time miracle",
    "secret formula",
    "banned by doctors",
    "they don't want you to know",
];

/// Screens free text against a prohibited-term list.
pub struct TermScreen {
    terms: Vec<String>,
}

impl TermScreen {
    /// Screen with the embedded default term set.
    pub fn with_defaults() -> Self {
        Self {
            terms: DEFAULT_PROHIBITED_TERMS
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    /// Load terms from a file: one term per line, `#` starts a comment,
    /// blank lines ignored.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let terms: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        Ok(Self { terms })
    }

    /// Return every prohibited term found in `text`, in list order.
    pub fn scan(&self, text: &str) -> Vec<String> {
        let words: Vec<String> = tokenize(text);
        self.terms
            .iter()
            .filter(|term| contains_term(&words, term))
            .cloned()
            .collect()
    }

    /// Scan multiple fields, deduplicating matched terms.
    pub fn scan_fields<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut found = Vec::new();
        for field in fields {
            for term in self.scan(field) {
                if !found.contains(&term) {
                    found.push(term);
                }
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whole-word match: multi-word terms match as a consecutive word window.
fn contains_term(words: &[String], term: &str) -> bool {
    let term_words: Vec<&str> = term.split_whitespace().collect();
    if term_words.is_empty() || words.len() < term_words.len() {
        return false;
    }
    words
        .windows(term_words.len())
        .any(|window| window.iter().map(String::as_str).eq(term_words.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_passes() {
        let screen = TermScreen::with_defaults();
        assert!(screen
            .scan("Premium running shoes for everyday athletes")
            .is_empty());
    }

    #[test]
    fn single_word_term_matches_case_insensitively() {
        let screen = TermScreen::with_defaults();
        let found = screen.scan("This energy drink CURES everything");
        assert_eq!(found, vec!["cures"]);
    }

    #[test]
    fn multi_word_term_matches_across_punctuation() {
        let screen = TermScreen::with_defaults();
        let found = screen.scan("Get rich quick, with our new app!");
        assert!(found.contains(&"get rich quick".to_string()));
    }

    #[test]
    fn substrings_of_words_do_not_match() {
        let screen = TermScreen::with_defaults();
        // "securely" contains "cure" but is not the word "cure"
        assert!(screen.scan("Pay securely online").is_empty());
    }

    #[test]
    fn scan_fields_deduplicates() {
        let screen = TermScreen::with_defaults();
        let found = screen.scan_fields(["miracle cure gel", "a true miracle cure"]);
        // "cure" and "miracle cure" each match once across both fields
        assert_eq!(found, vec!["cure", "miracle cure"]);
    }

    #[test]
    fn loads_terms_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, "# custom list\nFoo Bar\n\nbaz\n").unwrap();
        let screen = TermScreen::from_file(&path).unwrap();
        assert_eq!(screen.len(), 2);
        assert_eq!(screen.scan("foo bar and baz"), vec!["foo bar", "baz"]);
    }
}
