//! Suggestion for a spelling correction.
use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::{Distance, Entry, Frequency, WordData};

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Suggestion for a spelling correction
pub struct Suggestion {
    /// the suggested word-form
    pub word: SmolStr,
    /// edit distance from the query
    pub distance: Distance,
    /// frequency of the suggested word
    pub frequency: Frequency,
    /// metadata stored with the suggested word
    #[serde(default, skip_serializing_if = "WordData::is_empty")]
    pub word_data: WordData,
    /// byte range of the query this suggestion replaces, for compound results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Range<usize>>,
    /// per-word breakdown of a compound correction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Suggestion>,
}

impl Suggestion {
    pub fn new(word: SmolStr, distance: Distance, frequency: Frequency) -> Suggestion {
        Suggestion {
            word,
            distance,
            frequency,
            word_data: WordData::new(),
            span: None,
            parts: vec![],
        }
    }

    pub(crate) fn from_entry(entry: &Entry, distance: Distance) -> Suggestion {
        Suggestion {
            word_data: entry.word_data.clone(),
            ..Suggestion::new(entry.word.clone(), distance, entry.frequency)
        }
    }

    /// gets the suggested word-form
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.word)
    }
}

impl PartialOrd for Suggestion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Closest first, then most frequent, then alphabetical.
impl Ord for Suggestion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| other.frequency.cmp(&self.frequency))
            .then_with(|| self.word.cmp(&other.word))
    }
}

impl PartialEq for Suggestion {
    fn eq(&self, other: &Self) -> bool {
        self.word == other.word && self.distance == other.distance && self.frequency == other.frequency
    }
}

impl Eq for Suggestion {}
