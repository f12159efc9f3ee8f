use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::TextError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteList {
    quotes: Vec<Quote>,
}

impl QuoteList {
    /// Parse a JSON array of quotes. Entries with blank text are dropped.
    pub fn from_json(json: &str) -> Result<Self, TextError> {
        let quotes: Vec<Quote> = serde_json::from_str(json)?;
        Ok(Self {
            quotes: quotes
                .into_iter()
                .filter(|q| !q.text.trim().is_empty())
                .collect(),
        })
    }

    pub fn embedded() -> Result<Self, TextError> {
        Self::from_json(super::embedded_asset(super::QUOTES_ASSET)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, TextError> {
        let json = fs::read_to_string(path).map_err(|source| TextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Quote> {
        self.quotes.choose(rng)
    }

    pub fn by_id(&self, id: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.quotes.iter().map(|q| q.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn embedded_quotes_have_unique_ids() {
        let list = QuoteList::embedded().unwrap();
        assert!(!list.is_empty());
        let mut ids: Vec<&str> = list.ids().collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), list.len());
    }

    #[test]
    fn lookup_by_id() {
        let list = QuoteList::from_json(
            r#"[{"id": "a", "text": "first", "source": "x"}, {"id": "b", "text": "second"}]"#,
        )
        .unwrap();
        assert_eq!(list.by_id("b").map(|q| q.text.as_str()), Some("second"));
        assert_eq!(list.by_id("b").map(|q| q.source.as_str()), Some(""));
        assert!(list.by_id("zzz").is_none());
    }

    #[test]
    fn blank_quotes_are_dropped() {
        let list = QuoteList::from_json(r#"[{"id": "a", "text": "   ", "source": "x"}]"#).unwrap();
        assert!(list.is_empty());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(list.random(&mut rng).is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert_matches!(QuoteList::from_json("{not json"), Err(TextError::Json(_)));
    }
}
