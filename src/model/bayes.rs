//! Incremental multinomial Naive Bayes.
//!
//! The classifier keeps per-class instance counts, per-class token frequency
//! tables, and the observed vocabulary, all updated one document at a time.
//! Scoring happens in log space with Laplace smoothing. Before any document
//! has been learned there is nothing to score against, so prediction returns
//! `None` (the cold-start state).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::ValidationError;
use crate::record::Sentiment;

/// Default Laplace smoothing factor.
const DEFAULT_ALPHA: f64 = 1.0;

/// Online multinomial Naive Bayes over binary sentiment labels.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    alpha: f64,
    // BTreeMap so class iteration order is fixed; prediction ties break
    // toward the lower wire encoding, keeping the model deterministic.
    class_counts: BTreeMap<Sentiment, u64>,
    token_counts: BTreeMap<Sentiment, HashMap<String, u64>>,
    token_mass: BTreeMap<Sentiment, u64>,
    vocabulary: HashSet<String>,
    instances: u64,
}

impl MultinomialNb {
    /// Creates a classifier with the default smoothing factor.
    #[must_use]
    pub fn new() -> Self {
        Self::with_smoothing(DEFAULT_ALPHA).expect("default smoothing factor is positive")
    }

    /// Creates a classifier with an explicit smoothing factor.
    pub fn with_smoothing(alpha: f64) -> Result<Self, ValidationError> {
        if alpha <= 0.0 || !alpha.is_finite() {
            return Err(ValidationError::NonPositiveSmoothing { value: alpha });
        }

        Ok(Self {
            alpha,
            class_counts: BTreeMap::new(),
            token_counts: BTreeMap::new(),
            token_mass: BTreeMap::new(),
            vocabulary: HashSet::new(),
            instances: 0,
        })
    }

    /// Number of documents learned so far.
    #[must_use]
    pub const fn instances(&self) -> u64 {
        self.instances
    }

    /// Number of distinct tokens observed so far.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Predicts the most likely label for a term-frequency vector.
    ///
    /// Returns `None` until at least one document has been learned.
    #[must_use]
    pub fn predict_one(&self, features: &HashMap<String, u64>) -> Option<Sentiment> {
        if self.instances == 0 {
            return None;
        }

        let mut best: Option<(Sentiment, f64)> = None;
        for (&label, &count) in &self.class_counts {
            let score = self.joint_log_likelihood(label, count, features);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((label, score)),
            }
        }

        best.map(|(label, _)| label)
    }

    /// Updates the model with one labeled document.
    pub fn learn_one(&mut self, features: &HashMap<String, u64>, label: Sentiment) {
        self.instances += 1;
        *self.class_counts.entry(label).or_insert(0) += 1;

        let counts = self.token_counts.entry(label).or_default();
        let mass = self.token_mass.entry(label).or_insert(0);
        for (token, &count) in features {
            *counts.entry(token.clone()).or_insert(0) += count;
            *mass += count;
            self.vocabulary.insert(token.clone());
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn joint_log_likelihood(
        &self,
        label: Sentiment,
        class_count: u64,
        features: &HashMap<String, u64>,
    ) -> f64 {
        let prior = class_count as f64 / self.instances as f64;
        let mut score = prior.ln();

        let counts = self.token_counts.get(&label);
        let mass = self.token_mass.get(&label).copied().unwrap_or(0) as f64;
        let denominator = mass + self.alpha * self.vocabulary.len() as f64;
        if denominator <= 0.0 {
            return score;
        }

        for (token, &count) in features {
            let token_count = counts
                .and_then(|c| c.get(token))
                .copied()
                .unwrap_or(0) as f64;
            let likelihood = (token_count + self.alpha) / denominator;
            score += count as f64 * likelihood.ln();
        }

        score
    }
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new()
    }
}
