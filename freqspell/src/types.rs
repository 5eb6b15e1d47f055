//! Records stored in a dictionary.
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Observed occurrence count of a word or word pair.
pub type Frequency = u64;

/// Edit distance between a query and a suggestion.
pub type Distance = usize;

/// Caller-defined metadata attached to a word, e.g. `{"type": "noun"}`.
///
/// Keys are strings, values are whatever JSON value the caller stores. The
/// engine never inspects the values; it only stores and returns them.
pub type WordData = HashMap<SmolStr, serde_json::Value>;

/// A single dictionary word with its frequency and metadata.
///
/// Field aliases accept the capitalised keys used by exported word lists
/// (`{"Word": "near", "Frequency": 120, "WordData": {...}}`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(alias = "Word")]
    pub word: SmolStr,
    #[serde(default, alias = "Frequency")]
    pub frequency: Frequency,
    #[serde(default, alias = "WordData", skip_serializing_if = "HashMap::is_empty")]
    pub word_data: WordData,
}

impl Entry {
    pub fn new(word: impl Into<SmolStr>, frequency: Frequency) -> Entry {
        Entry {
            word: word.into(),
            frequency,
            word_data: WordData::new(),
        }
    }

    /// Builder-style helper attaching one metadata pair.
    pub fn with_data(mut self, key: impl Into<SmolStr>, value: impl Into<serde_json::Value>) -> Entry {
        self.word_data.insert(key.into(), value.into());
        self
    }
}

/// Many words sharing the same frequency and metadata, used for bulk tagging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entries {
    #[serde(alias = "Words")]
    pub words: Vec<SmolStr>,
    #[serde(default = "default_batch_frequency", alias = "Frequency")]
    pub frequency: Frequency,
    #[serde(default, alias = "WordsData")]
    pub word_data: WordData,
}

fn default_batch_frequency() -> Frequency {
    1
}

impl Entries {
    pub fn new<I, S>(words: I) -> Entries
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Entries {
            words: words.into_iter().map(Into::into).collect(),
            frequency: default_batch_frequency(),
            word_data: WordData::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<SmolStr>, value: impl Into<serde_json::Value>) -> Entries {
        self.word_data.insert(key.into(), value.into());
        self
    }
}

/// An ordered pair of adjacent words with its observed frequency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigramEntry {
    pub first: SmolStr,
    pub second: SmolStr,
    pub frequency: Frequency,
}

impl BigramEntry {
    pub fn new(first: impl Into<SmolStr>, second: impl Into<SmolStr>, frequency: Frequency) -> BigramEntry {
        BigramEntry {
            first: first.into(),
            second: second.into(),
            frequency,
        }
    }

    /// Splits a `"word1 word2"` record into a pair. Anything other than exactly
    /// two whitespace-separated words yields `None`.
    pub fn from_joined(joined: &str, frequency: Frequency) -> Option<BigramEntry> {
        let mut parts = joined.split_whitespace();
        let first = parts.next()?;
        let second = parts.next()?;

        if parts.next().is_some() {
            return None;
        }

        Some(BigramEntry::new(first, second, frequency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_accepts_capitalised_keys() {
        let entry: Entry =
            serde_json::from_str(r#"{"Frequency":100,"Word":"word","WordData":{"type":"noun"}}"#)
                .unwrap();
        assert_eq!(entry.word, "word");
        assert_eq!(entry.frequency, 100);
        assert_eq!(entry.word_data["type"], "noun");

        let entry: Entry = serde_json::from_str(r#"{"word":"quindici"}"#).unwrap();
        assert_eq!(entry.frequency, 0);
        assert!(entry.word_data.is_empty());
    }

    #[test]
    fn bigram_from_joined() {
        assert_eq!(
            BigramEntry::from_joined("sea shore", 4),
            Some(BigramEntry::new("sea", "shore", 4))
        );
        assert_eq!(BigramEntry::from_joined("sea", 4), None);
        assert_eq!(BigramEntry::from_joined("a b c", 4), None);
    }
}
