use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of typing test a target was generated for
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Timer,
    Words,
    Quote,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timer" => Ok(Mode::Timer),
            "words" => Ok(Mode::Words),
            "quote" => Ok(Mode::Quote),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Mode-specific details carried alongside the text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMetadata {
    pub word_count: usize,
    pub seconds: u64,
    pub quote_id: Option<String>,
    pub source: Option<String>,
}

/// What the user is asked to type. Built once by the text generator and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub text: String,
    pub mode: Mode,
    pub metadata: TargetMetadata,
}

impl Target {
    pub fn new(text: impl Into<String>, mode: Mode, metadata: TargetMetadata) -> Self {
        Self {
            text: text.into(),
            mode,
            metadata,
        }
    }

    /// Plain words target, mostly useful for custom prompts and tests
    pub fn words(text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = text.split_whitespace().count();
        Self::new(
            text,
            Mode::Words,
            TargetMetadata {
                word_count,
                ..TargetMetadata::default()
            },
        )
    }

    pub fn timer(text: impl Into<String>, seconds: u64) -> Self {
        let text = text.into();
        let word_count = text.split_whitespace().count();
        Self::new(
            text,
            Mode::Timer,
            TargetMetadata {
                word_count,
                seconds,
                ..TargetMetadata::default()
            },
        )
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
