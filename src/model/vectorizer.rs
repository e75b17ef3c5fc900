//! Bag-of-words feature extraction.

use std::collections::HashMap;

use regex::Regex;

/// Token pattern: runs of two or more word characters.
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Stateless term-frequency extractor.
///
/// Splits a document into tokens and counts occurrences. The vocabulary
/// itself is not tracked here; the classifier owns all mutable state, so the
/// extraction stage can be shared and re-run freely.
#[derive(Debug, Clone)]
pub struct BagOfWords {
    lowercase: bool,
    token_pattern: Regex,
}

impl BagOfWords {
    /// Creates an extractor that lowercases input before tokenizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lowercase(true)
    }

    /// Creates an extractor with explicit case handling.
    #[must_use]
    pub fn with_lowercase(lowercase: bool) -> Self {
        Self {
            lowercase,
            token_pattern: Regex::new(TOKEN_PATTERN).expect("token pattern must compile"),
        }
    }

    /// Extracts term frequencies from one document.
    #[must_use]
    pub fn transform_one(&self, text: &str) -> HashMap<String, u64> {
        let normalized;
        let haystack = if self.lowercase {
            normalized = text.to_lowercase();
            &normalized
        } else {
            text
        };

        let mut counts = HashMap::new();
        for token in self.token_pattern.find_iter(haystack) {
            *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for BagOfWords {
    fn default() -> Self {
        Self::new()
    }
}
