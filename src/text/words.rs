use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::Path;

use super::TextError;

/// Pool of words to draw typing prompts from
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Words are separated by any whitespace, so both one-per-line and
    /// space separated files work
    pub fn from_text(text: &str) -> Result<Self, TextError> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return Err(TextError::EmptyWordList);
        }
        Ok(Self { words })
    }

    pub fn embedded() -> Result<Self, TextError> {
        Self::from_text(super::embedded_asset(super::WORDS_ASSET)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, TextError> {
        let text = fs::read_to_string(path).map_err(|source| TextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    /// `count` words drawn with replacement, joined by single spaces
    pub fn generate_text<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> String {
        (0..count)
            .filter_map(|_| self.words.choose(rng))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn embedded_list_loads() {
        let list = WordList::embedded().unwrap();
        assert!(list.len() > 100);
        assert!(list.contains("the"));
    }

    #[test]
    fn splits_on_any_whitespace() {
        let list = WordList::from_text("alpha beta\ngamma\r\n\n  delta\t").unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.contains("delta"));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_matches!(WordList::from_text(" \n\t"), Err(TextError::EmptyWordList));
    }

    #[test]
    fn generates_requested_word_count() {
        let list = WordList::from_text("one two three").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let text = list.generate_text(&mut rng, 12);
        let words: Vec<&str> = text.split(' ').collect();
        assert_eq!(words.len(), 12);
        assert!(words.iter().all(|w| list.contains(w)));
        assert_eq!(list.generate_text(&mut rng, 0), "");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = WordList::from_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert_matches!(err, TextError::Io { ref path, .. } if path.ends_with("here.txt"));
    }
}
