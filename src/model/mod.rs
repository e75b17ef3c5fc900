//! The online sentiment model.
//!
//! A two-stage pipeline: bag-of-words feature extraction feeding an
//! incremental Naive Bayes classifier. The model is single-writer state owned
//! by the learner's consume loop; it is constructed once at startup and
//! threaded through explicitly.
//!
//! The ordering contract matters more than the stages themselves: a
//! prediction for a record must be taken before that record's label is
//! learned, otherwise the label leaks into the prediction it is meant to
//! score.

/// Incremental Naive Bayes classifier.
pub mod bayes;
/// Term-frequency feature extraction.
pub mod vectorizer;

pub use bayes::MultinomialNb;
pub use vectorizer::BagOfWords;

use crate::error::ValidationError;
use crate::record::Sentiment;

/// Feature extraction composed with an incremental classifier.
#[derive(Debug, Clone)]
pub struct SentimentModel {
    vectorizer: BagOfWords,
    classifier: MultinomialNb,
}

impl SentimentModel {
    /// Creates a model with default stages (lowercasing extractor, Laplace
    /// smoothing of 1.0).
    #[must_use]
    pub fn new() -> Self {
        Self {
            vectorizer: BagOfWords::new(),
            classifier: MultinomialNb::new(),
        }
    }

    /// Creates a model with an explicit smoothing factor.
    pub fn with_smoothing(alpha: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            vectorizer: BagOfWords::new(),
            classifier: MultinomialNb::with_smoothing(alpha)?,
        })
    }

    /// Predicts a label for `text`, or `None` in the cold-start state.
    #[must_use]
    pub fn predict(&self, text: &str) -> Option<Sentiment> {
        let features = self.vectorizer.transform_one(text);
        self.classifier.predict_one(&features)
    }

    /// Updates the model with a labeled document.
    pub fn learn(&mut self, text: &str, label: Sentiment) {
        let features = self.vectorizer.transform_one(text);
        self.classifier.learn_one(&features, label);
    }

    /// Number of documents learned so far.
    #[must_use]
    pub const fn instances(&self) -> u64 {
        self.classifier.instances()
    }
}

impl Default for SentimentModel {
    fn default() -> Self {
        Self::new()
    }
}
