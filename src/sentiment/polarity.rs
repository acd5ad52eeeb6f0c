//! General-purpose polarity scoring in [-1.0, 1.0].
//!
//! `LexiconPolarity` averages prior polarities of known words, scaled by an intensifier
//! directly in front and flipped-and-damped (x -0.5) when a negator sits within the
//! previous three tokens. Texts without any lexicon word score 0.0.

use anyhow::{anyhow, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Anything that can put a polarity on a piece of text.
pub trait PolarityModel: Send + Sync {
    fn polarity(&self, text: &str) -> anyhow::Result<f64>;
}

const NEGATION_FACTOR: f64 = -0.5;
const NEGATION_WINDOW: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    pub words: HashMap<String, f64>,
    #[serde(default)]
    pub intensifiers: HashMap<String, f64>,
    #[serde(default)]
    pub negations: HashSet<String>,
}

impl Lexicon {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let lex: Lexicon = serde_json::from_str(raw)?;
        if let Some((w, p)) = lex.words.iter().find(|(_, p)| !(-1.0..=1.0).contains(*p)) {
            bail!("lexicon polarity for '{w}' out of range: {p}");
        }
        Ok(lex)
    }

    fn is_negator(&self, tok: &str) -> bool {
        self.negations.contains(tok) || tok.ends_with("n't")
    }
}

// Kept as a String error so every caller gets its own anyhow::Error on failure.
static BUILTIN: Lazy<Result<Lexicon, String>> = Lazy::new(|| {
    let raw = include_str!("../../config/polarity_lexicon.json");
    Lexicon::from_json_str(raw).map_err(|e| e.to_string())
});

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)[\w'’]+").expect("token regex"));

/// Lower-case word tokens; apostrophes stay inside the token ("isn't"), and the
/// typographic apostrophe is folded to ASCII ("isn’t" -> "isn't").
fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().replace('’', "'"))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconPolarity {
    custom: Option<&'static Lexicon>,
}

impl LexiconPolarity {
    /// Model over the lexicon embedded from `config/polarity_lexicon.json`.
    pub fn builtin() -> Self {
        Self { custom: None }
    }

    /// Model over a caller-provided lexicon (tests, tools).
    pub fn with_lexicon(lexicon: &'static Lexicon) -> Self {
        Self {
            custom: Some(lexicon),
        }
    }

    fn lexicon(&self) -> anyhow::Result<&'static Lexicon> {
        if let Some(lex) = self.custom {
            return Ok(lex);
        }
        BUILTIN
            .as_ref()
            .map_err(|e| anyhow!("polarity lexicon unavailable: {e}"))
    }
}

impl PolarityModel for LexiconPolarity {
    fn polarity(&self, text: &str) -> anyhow::Result<f64> {
        let lex = self.lexicon()?;
        let tokens = tokenize(text);

        let mut contributions = Vec::new();
        for (i, tok) in tokens.iter().enumerate() {
            let Some(&prior) = lex.words.get(tok.as_str()) else {
                continue;
            };

            let intensity = i
                .checked_sub(1)
                .and_then(|j| lex.intensifiers.get(tokens[j].as_str()))
                .copied()
                .unwrap_or(1.0);

            let negated =
                (1..=NEGATION_WINDOW).any(|k| i >= k && lex.is_negator(tokens[i - k].as_str()));

            let mut value = prior * intensity;
            if negated {
                value *= NEGATION_FACTOR;
            }
            contributions.push(value.clamp(-1.0, 1.0));
        }

        if contributions.is_empty() {
            return Ok(0.0);
        }

        let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
        if !mean.is_finite() {
            bail!("non-finite polarity ({mean})");
        }
        Ok(mean.clamp(-1.0, 1.0))
    }
}
