//! Recognition hints: boosted phrases and class vocabularies.
//!
//! Phrases may reference classes with `${name}` placeholders. The defaults bias
//! the recognizer towards the assistant's invocation phrase ("Hey Kit").

use serde::{Deserialize, Serialize};

/// Boost applied to the default phrase set.
pub const DEFAULT_PHRASE_BOOST: f32 = 19.0;

/// A custom class usable from phrases as `${class_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintClass {
    pub class_id: String,
    pub items: Vec<String>,
}

impl HintClass {
    pub fn new(class_id: impl Into<String>, items: &[&str]) -> Self {
        Self {
            class_id: class_id.into(),
            items: items.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Phrase list plus class vocabularies sent with every session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionHints {
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default = "default_boost")]
    pub boost: f32,
    #[serde(default)]
    pub classes: Vec<HintClass>,
}

fn default_boost() -> f32 {
    DEFAULT_PHRASE_BOOST
}

impl Default for RecognitionHints {
    fn default() -> Self {
        Self {
            phrases: vec![
                "${hello} ${gpt}".to_string(),
                "${gpt}".to_string(),
                "Hey ${gpt}".to_string(),
            ],
            boost: DEFAULT_PHRASE_BOOST,
            classes: vec![
                HintClass::new("hello", &["Hi", "Hello", "Hey"]),
                HintClass::new(
                    "gpt",
                    &[
                        "Kit", "KITT", "GPT", "Live Kit", "Live GPT", "LiveKit", "LiveGPT",
                        "Live-Kit", "Live-GPT",
                    ],
                ),
            ],
        }
    }
}

impl RecognitionHints {
    /// Hints with no phrases and no classes.
    pub fn empty() -> Self {
        Self {
            phrases: Vec::new(),
            boost: DEFAULT_PHRASE_BOOST,
            classes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.classes.is_empty()
    }

    /// Class ids referenced by phrases that no declared class provides.
    pub fn undeclared_classes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for phrase in &self.phrases {
            let mut rest = phrase.as_str();
            while let Some(start) = rest.find("${") {
                let after = &rest[start + 2..];
                let Some(end) = after.find('}') else {
                    break;
                };
                let id = &after[..end];
                if !self.classes.iter().any(|c| c.class_id == id)
                    && !missing.iter().any(|m| m == id)
                {
                    missing.push(id.to_string());
                }
                rest = &after[end + 1..];
            }
        }
        missing
    }
}
