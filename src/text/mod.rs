//! Typing prompts: random words from a word list, or quotes.

mod quotes;
mod words;

pub use quotes::{Quote, QuoteList};
pub use words::WordList;

use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::target::{Mode, Target, TargetMetadata};

static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/text/assets");

const WORDS_ASSET: &str = "words.txt";
const QUOTES_ASSET: &str = "quotes.json";

/// Timer prompts assume a very fast typist (~4 words per second) and never
/// drop below this many words
pub const MIN_TIMER_WORDS: usize = 50;
const TIMER_WORDS_PER_SECOND: u64 = 4;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("word count must be positive")]
    ZeroWords,
    #[error("seconds must be positive")]
    ZeroSeconds,
    #[error("word list is empty")]
    EmptyWordList,
    #[error("no quotes available")]
    NoQuotes,
    #[error("quote with id {0:?} not found")]
    UnknownQuote(String),
    #[error("embedded asset {0} is missing")]
    MissingAsset(&'static str),
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid quotes file")]
    Json(#[from] serde_json::Error),
}

fn embedded_asset(name: &'static str) -> Result<&'static str, TextError> {
    ASSETS
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .ok_or(TextError::MissingAsset(name))
}

/// Where the generator takes its corpora from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub words_file: Option<PathBuf>,
    pub quotes_file: Option<PathBuf>,
    /// Fixed seed for reproducible prompts
    pub seed: Option<u64>,
}

pub fn timer_word_count(seconds: u64) -> usize {
    let count = seconds.saturating_mul(TIMER_WORDS_PER_SECOND);
    usize::try_from(count)
        .unwrap_or(usize::MAX)
        .max(MIN_TIMER_WORDS)
}

pub struct TextGenerator {
    words: WordList,
    quotes: QuoteList,
    rng: StdRng,
}

impl TextGenerator {
    pub fn new(opts: &GeneratorOptions) -> Result<Self, TextError> {
        let words = match &opts.words_file {
            Some(path) => WordList::from_file(path)?,
            None => WordList::embedded()?,
        };
        let quotes = match &opts.quotes_file {
            Some(path) => QuoteList::from_file(path)?,
            None => QuoteList::embedded()?,
        };
        debug!(
            target: "text",
            words = words.len(),
            quotes = quotes.len(),
            seeded = opts.seed.is_some(),
            "corpus_loaded"
        );

        Ok(Self::from_parts(words, quotes, opts.seed))
    }

    pub fn from_parts(words: WordList, quotes: QuoteList, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { words, quotes, rng }
    }

    pub fn generate_words(&mut self, count: usize) -> Result<Target, TextError> {
        if count == 0 {
            return Err(TextError::ZeroWords);
        }
        let text = self.words.generate_text(&mut self.rng, count);
        Ok(Target::new(
            text,
            Mode::Words,
            TargetMetadata {
                word_count: count,
                ..TargetMetadata::default()
            },
        ))
    }

    pub fn generate_for_timer(&mut self, seconds: u64) -> Result<Target, TextError> {
        if seconds == 0 {
            return Err(TextError::ZeroSeconds);
        }
        let word_count = timer_word_count(seconds);
        let text = self.words.generate_text(&mut self.rng, word_count);
        Ok(Target::new(
            text,
            Mode::Timer,
            TargetMetadata {
                word_count,
                seconds,
                ..TargetMetadata::default()
            },
        ))
    }

    pub fn random_quote(&mut self) -> Result<Target, TextError> {
        let quote = self
            .quotes
            .random(&mut self.rng)
            .ok_or(TextError::NoQuotes)?;
        Ok(quote_target(quote))
    }

    pub fn quote_by_id(&self, id: &str) -> Result<Target, TextError> {
        self.quotes
            .by_id(id)
            .map(quote_target)
            .ok_or_else(|| TextError::UnknownQuote(id.to_string()))
    }

    /// Build the target for a test in `mode`. A `quote_id` pins the quote
    /// and is ignored by the other modes.
    pub fn for_mode(
        &mut self,
        mode: Mode,
        words: usize,
        seconds: u64,
        quote_id: Option<&str>,
    ) -> Result<Target, TextError> {
        match (mode, quote_id) {
            (Mode::Words, _) => self.generate_words(words),
            (Mode::Timer, _) => self.generate_for_timer(seconds),
            (Mode::Quote, Some(id)) => self.quote_by_id(id),
            (Mode::Quote, None) => self.random_quote(),
        }
    }

    pub fn quotes(&self) -> &QuoteList {
        &self.quotes
    }
}

fn quote_target(quote: &Quote) -> Target {
    let source = (!quote.source.is_empty()).then(|| quote.source.clone());
    Target::new(
        quote.text.clone(),
        Mode::Quote,
        TargetMetadata {
            word_count: quote.text.split_whitespace().count(),
            quote_id: Some(quote.id.clone()),
            source,
            ..TargetMetadata::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    fn seeded(seed: u64) -> TextGenerator {
        TextGenerator::new(&GeneratorOptions {
            seed: Some(seed),
            ..GeneratorOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_generate_words() {
        let mut gen = seeded(7);
        let target = gen.generate_words(10).unwrap();
        assert_eq!(target.mode, Mode::Words);
        assert_eq!(target.metadata.word_count, 10);
        assert_eq!(target.text.split(' ').count(), 10);
        assert!(!target.text.is_empty());
    }

    #[test]
    fn test_same_seed_same_prompt() {
        let a = seeded(42).generate_words(25).unwrap();
        let b = seeded(42).generate_words(25).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_counts_rejected() {
        let mut gen = seeded(1);
        assert_matches!(gen.generate_words(0), Err(TextError::ZeroWords));
        assert_matches!(gen.generate_for_timer(0), Err(TextError::ZeroSeconds));
    }

    #[test]
    fn test_timer_word_count() {
        assert_eq!(timer_word_count(1), MIN_TIMER_WORDS);
        assert_eq!(timer_word_count(12), MIN_TIMER_WORDS);
        assert_eq!(timer_word_count(30), 120);
        assert_eq!(timer_word_count(60), 240);
    }

    #[test]
    fn test_generate_for_timer() {
        let target = seeded(3).generate_for_timer(15).unwrap();
        assert_eq!(target.mode, Mode::Timer);
        assert_eq!(target.metadata.seconds, 15);
        assert_eq!(target.metadata.word_count, 60);
        assert_eq!(target.text.split(' ').count(), 60);
    }

    #[test]
    fn test_quote_by_id() {
        let gen = seeded(1);
        let target = gen.quote_by_id("q004").unwrap();
        assert_eq!(target.mode, Mode::Quote);
        assert_eq!(target.metadata.quote_id.as_deref(), Some("q004"));
        assert_eq!(target.metadata.source.as_deref(), Some("Donald Knuth"));
        assert_matches!(
            gen.quote_by_id("nope"),
            Err(TextError::UnknownQuote(id)) if id == "nope"
        );
    }

    #[test]
    fn test_random_quote_is_from_corpus() {
        let mut gen = seeded(9);
        let target = gen.random_quote().unwrap();
        let id = target.metadata.quote_id.clone().unwrap();
        assert_eq!(gen.quotes().by_id(&id).map(|q| &q.text), Some(&target.text));
    }

    #[test]
    fn test_for_mode_dispatch() {
        let mut gen = seeded(5);
        assert_eq!(gen.for_mode(Mode::Words, 3, 30, None).unwrap().mode, Mode::Words);
        assert_eq!(gen.for_mode(Mode::Timer, 3, 30, None).unwrap().metadata.seconds, 30);
        let quote = gen.for_mode(Mode::Quote, 3, 30, Some("q001")).unwrap();
        assert_eq!(quote.metadata.quote_id.as_deref(), Some("q001"));
    }

    #[test]
    fn test_custom_files() {
        let dir = tempdir().unwrap();
        let words_path = dir.path().join("words.txt");
        let quotes_path = dir.path().join("quotes.json");
        fs::write(&words_path, "ferris\ncrab\n").unwrap();
        fs::write(
            &quotes_path,
            r#"[{"id": "mine", "text": "own words", "source": "me"}]"#,
        )
        .unwrap();

        let mut gen = TextGenerator::new(&GeneratorOptions {
            words_file: Some(words_path),
            quotes_file: Some(quotes_path),
            seed: Some(1),
        })
        .unwrap();

        let words = gen.generate_words(20).unwrap();
        assert!(words.text.split(' ').all(|w| w == "ferris" || w == "crab"));
        assert_eq!(gen.random_quote().unwrap().text, "own words");
    }

    #[test]
    fn test_empty_quotes_file() {
        let dir = tempdir().unwrap();
        let quotes_path = dir.path().join("quotes.json");
        fs::write(&quotes_path, "[]").unwrap();
        let mut gen = TextGenerator::new(&GeneratorOptions {
            quotes_file: Some(quotes_path),
            ..GeneratorOptions::default()
        })
        .unwrap();
        assert_matches!(gen.random_quote(), Err(TextError::NoQuotes));
        // words still work with a useless quotes corpus
        assert!(gen.generate_words(1).is_ok());
    }
}
