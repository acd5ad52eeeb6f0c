// src/sentiment/mod.rs
//! Sentiment classifier: fragment heuristics + polarity + emphasis, reduced to a label.
//!
//! score = 0.2 * pos_fragments - 0.2 * neg_fragments + polarity
//! then x1.3 if the text has '!', then x1.5 if it is all caps.
//! score > 0.3 -> positive, score < -0.3 -> negative, otherwise neutral.

pub mod lexicon;
pub mod polarity;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::logging::anon_hash;
use lexicon::{count_fragments, NEGATIVE_FRAGMENTS, POSITIVE_FRAGMENTS};
pub use polarity::{LexiconPolarity, PolarityModel};

pub const FRAGMENT_WEIGHT: f64 = 0.2;
pub const EXCLAMATION_BOOST: f64 = 1.3;
pub const ALL_CAPS_BOOST: f64 = 1.5;
pub const LABEL_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Negative,
    Neutral,
}

impl SentimentClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentClass::Positive => "positive",
            SentimentClass::Negative => "negative",
            SentimentClass::Neutral => "neutral",
        }
    }

    /// Strict thresholds: exactly +/-0.3 stays neutral.
    pub fn from_score(score: f64) -> Self {
        if score > LABEL_THRESHOLD {
            SentimentClass::Positive
        } else if score < -LABEL_THRESHOLD {
            SentimentClass::Negative
        } else {
            SentimentClass::Neutral
        }
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the label was derived from. Internal to the service; never sent over HTTP.
#[derive(Debug, Clone, PartialEq)]
pub struct Signals {
    pub pos_count: usize,
    pub neg_count: usize,
    pub has_exclamation: bool,
    /// Detected but carries no weight.
    pub has_question: bool,
    pub all_caps: bool,
    pub polarity: f64,
    pub score: f64,
}

impl Signals {
    pub fn class(&self) -> SentimentClass {
        SentimentClass::from_score(self.score)
    }
}

/// Titlecase letters ("ǅ") are cased but neither upper- nor lower-case.
fn is_titlecase(c: char) -> bool {
    c.is_alphabetic()
        && !c.is_uppercase()
        && !c.is_lowercase()
        && c.to_lowercase().ne(c.to_uppercase())
}

/// True when the text has at least one cased character and all cased characters are
/// upper-case. Strings without cased characters ("", "123 !!") are not all caps, and a
/// titlecase letter makes the whole text not all caps.
pub fn is_all_caps(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() || is_titlecase(c) {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

#[derive(Clone)]
pub struct SentimentClassifier {
    polarity: Arc<dyn PolarityModel>,
}

impl fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentClassifier").finish_non_exhaustive()
    }
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier {
    pub fn new() -> Self {
        Self::with_model(Arc::new(LexiconPolarity::builtin()))
    }

    pub fn with_model(polarity: Arc<dyn PolarityModel>) -> Self {
        Self { polarity }
    }

    /// Full breakdown. Errors only if the polarity model fails.
    pub fn signals(&self, text: &str) -> anyhow::Result<Signals> {
        let lowered = text.to_lowercase();
        let pos_count = count_fragments(&lowered, POSITIVE_FRAGMENTS);
        let neg_count = count_fragments(&lowered, NEGATIVE_FRAGMENTS);

        let has_exclamation = text.contains('!');
        let has_question = text.contains('?');
        let all_caps = is_all_caps(text);

        let polarity = self.polarity.polarity(text)?;

        let mut score = pos_count as f64 * FRAGMENT_WEIGHT;
        score -= neg_count as f64 * FRAGMENT_WEIGHT;
        score += polarity;

        if has_exclamation {
            score *= EXCLAMATION_BOOST;
        }
        if all_caps {
            score *= ALL_CAPS_BOOST;
        }

        Ok(Signals {
            pos_count,
            neg_count,
            has_exclamation,
            has_question,
            all_caps,
            polarity,
            score,
        })
    }

    /// Never fails: empty text and scoring errors both land on `Neutral`.
    pub fn classify(&self, text: &str) -> SentimentClass {
        if text.is_empty() {
            return SentimentClass::Neutral;
        }

        match self.signals(text) {
            Ok(s) => {
                let class = s.class();
                debug!(
                    id = %anon_hash(text),
                    pos = s.pos_count,
                    neg = s.neg_count,
                    polarity = s.polarity,
                    exclamation = s.has_exclamation,
                    question = s.has_question,
                    all_caps = s.all_caps,
                    score = s.score,
                    %class,
                    "sentiment scored"
                );
                class
            }
            Err(e) => {
                warn!(id = %anon_hash(text), error = %e, "sentiment scoring failed; falling back to neutral");
                SentimentClass::Neutral
            }
        }
    }

    /// Boundary variant: `None` stands for a missing or non-string message.
    pub fn classify_message(&self, message: Option<&str>) -> SentimentClass {
        message.map_or(SentimentClass::Neutral, |t| self.classify(t))
    }
}

static DEFAULT_CLASSIFIER: Lazy<SentimentClassifier> = Lazy::new(SentimentClassifier::new);

/// Classify with the process-wide default classifier.
pub fn classify(text: &str) -> SentimentClass {
    DEFAULT_CLASSIFIER.classify(text)
}
