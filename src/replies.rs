// src/replies.rs
//! Reply selector: classify once, then serve a prefix of the matching canned list.
//!
//! The bank is embedded from `config/replies.toml` and parsed once. Neutral
//! sentiment draws from `generic`.

use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::logging::anon_hash;
use crate::sentiment::{SentimentClass, SentimentClassifier};

pub const MIN_REPLIES: i64 = 1;
pub const MAX_REPLIES: i64 = 5;
pub const DEFAULT_REPLIES: i64 = 3;

/// Returned for empty or non-text messages, whatever the requested count.
pub const UNREADABLE_REPLIES: &[&str] = &[
    "I'm not sure how to respond to that.",
    "Interesting!",
    "Tell me more.",
];

/// Returned when selection itself goes wrong.
pub const TROUBLE_REPLIES: &[&str] = &[
    "I'm having trouble thinking of a response right now.",
    "Let me think about that...",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplyBank {
    pub positive: Vec<String>,
    pub neutral: Vec<String>,
    pub negative: Vec<String>,
    pub generic: Vec<String>,
}

impl ReplyBank {
    /// Parse and validate a bank; every list must have at least one entry.
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let bank: ReplyBank = toml::from_str(raw).context("parse reply bank")?;
        for (name, list) in [
            ("positive", &bank.positive),
            ("neutral", &bank.neutral),
            ("negative", &bank.negative),
            ("generic", &bank.generic),
        ] {
            if list.is_empty() {
                bail!("reply bank list '{name}' is empty");
            }
        }
        Ok(bank)
    }

    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(include_str!("../config/replies.toml"))
    }

    /// List served for a sentiment class.
    pub fn for_class(&self, class: SentimentClass) -> &[String] {
        match class {
            SentimentClass::Positive => &self.positive,
            SentimentClass::Negative => &self.negative,
            SentimentClass::Neutral => &self.generic,
        }
    }
}

/// Clamp a requested count into `[MIN_REPLIES, MAX_REPLIES]`; zero and negatives become 1.
pub fn effective_count(requested: i64) -> usize {
    requested.clamp(MIN_REPLIES, MAX_REPLIES) as usize
}

fn fixed(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct ReplySelector {
    classifier: Arc<SentimentClassifier>,
    bank: Arc<ReplyBank>,
}

impl ReplySelector {
    pub fn new(classifier: Arc<SentimentClassifier>, bank: Arc<ReplyBank>) -> Self {
        Self { classifier, bank }
    }

    /// Default classifier over the embedded bank.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(SentimentClassifier::new()),
            Arc::new(ReplyBank::builtin()?),
        ))
    }

    pub fn classifier(&self) -> &Arc<SentimentClassifier> {
        &self.classifier
    }

    pub fn bank(&self) -> &ReplyBank {
        &self.bank
    }

    fn try_select(&self, text: &str, count: usize) -> anyhow::Result<Vec<String>> {
        let class = self.classifier.classify(text);
        let list = self.bank.for_class(class);
        if list.is_empty() {
            bail!("no replies configured for {class} sentiment");
        }
        Ok(list.iter().take(count).cloned().collect())
    }

    /// Never fails. Empty text gets `UNREADABLE_REPLIES`; internal trouble gets
    /// `TROUBLE_REPLIES`.
    pub fn select(&self, text: &str, count: i64) -> Vec<String> {
        if text.is_empty() {
            return fixed(UNREADABLE_REPLIES);
        }
        match self.try_select(text, effective_count(count)) {
            Ok(replies) => replies,
            Err(e) => {
                warn!(id = %anon_hash(text), error = %e, "reply selection failed; using fallback");
                fixed(TROUBLE_REPLIES)
            }
        }
    }

    /// Boundary variant: `None` stands for a non-string message.
    pub fn select_message(&self, message: Option<&str>, count: i64) -> Vec<String> {
        match message {
            Some(text) => self.select(text, count),
            None => fixed(UNREADABLE_REPLIES),
        }
    }
}

static DEFAULT_SELECTOR: Lazy<Result<ReplySelector, String>> =
    Lazy::new(|| ReplySelector::builtin().map_err(|e| e.to_string()));

/// Select with the process-wide default selector.
pub fn select_replies(text: &str, count: i64) -> Vec<String> {
    match DEFAULT_SELECTOR.as_ref() {
        Ok(sel) => sel.select(text, count),
        Err(e) => {
            warn!(error = %e, "default reply selector unavailable; using fallback");
            fixed(TROUBLE_REPLIES)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> ReplyBank {
        ReplyBank::builtin().unwrap()
    }

    #[test]
    fn builtin_bank_has_expected_shape() {
        let b = bank();
        assert_eq!(b.positive.len(), 3);
        assert_eq!(b.neutral.len(), 5);
        assert_eq!(b.negative.len(), 5);
        assert_eq!(b.generic.len(), 5);
        assert_eq!(b.positive[0], "That's great to hear!");
        assert_eq!(b.generic[0], "Could you tell me more about that?");
    }

    #[test]
    fn neutral_class_uses_generic_list() {
        let b = bank();
        assert_eq!(b.for_class(SentimentClass::Neutral), b.generic.as_slice());
    }

    #[test]
    fn count_clamp_policy() {
        assert_eq!(effective_count(-3), 1);
        assert_eq!(effective_count(0), 1);
        assert_eq!(effective_count(1), 1);
        assert_eq!(effective_count(4), 4);
        assert_eq!(effective_count(5), 5);
        assert_eq!(effective_count(99), 5);
        assert_eq!(effective_count(i64::MIN), 1);
    }

    #[test]
    fn positive_prefix_in_declared_order() {
        let b = bank();
        assert_eq!(select_replies("I love this!!", 3), b.positive[..3].to_vec());
        assert_eq!(select_replies("I love this!!", 2), b.positive[..2].to_vec());
    }

    #[test]
    fn short_list_is_not_padded() {
        // positive only has three entries
        let got = select_replies("I love this!!", 5);
        assert_eq!(got, bank().positive);
    }

    #[test]
    fn negative_and_neutral_lists() {
        let b = bank();
        assert_eq!(
            select_replies("I hate this, it's terrible", 4),
            b.negative[..4].to_vec()
        );
        assert_eq!(
            select_replies("The meeting is at noon", 5),
            b.generic.clone()
        );
    }

    #[test]
    fn empty_text_gets_unreadable_list_regardless_of_count() {
        for n in [-1, 1, 3, 5, 50] {
            assert_eq!(select_replies("", n), fixed(UNREADABLE_REPLIES));
        }
    }

    #[test]
    fn missing_message_gets_unreadable_list() {
        let sel = ReplySelector::builtin().unwrap();
        assert_eq!(sel.select_message(None, 3), fixed(UNREADABLE_REPLIES));
    }

    #[test]
    fn zero_and_negative_counts_return_one() {
        assert_eq!(select_replies("I love this!!", 0).len(), 1);
        assert_eq!(select_replies("I love this!!", -7).len(), 1);
    }

    #[test]
    fn empty_list_falls_back_to_trouble() {
        let mut b = bank();
        b.positive.clear();
        let sel = ReplySelector::new(Arc::new(SentimentClassifier::new()), Arc::new(b));
        assert_eq!(sel.select("I love this!!", 3), fixed(TROUBLE_REPLIES));
        // other classes unaffected
        assert_eq!(sel.select("The meeting is at noon", 1).len(), 1);
    }

    #[test]
    fn bank_rejects_empty_lists() {
        let raw = r#"
            positive = []
            neutral = ["a"]
            negative = ["b"]
            generic = ["c"]
        "#;
        let err = ReplyBank::from_toml_str(raw).unwrap_err();
        assert!(err.to_string().contains("positive"), "{err}");
    }

    #[test]
    fn bank_rejects_missing_lists() {
        assert!(ReplyBank::from_toml_str(r#"positive = ["a"]"#).is_err());
    }
}
