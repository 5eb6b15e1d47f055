//! A named partition of words, word pairs and their fuzzy index.
use hashbrown::HashMap;
use smol_str::SmolStr;

use crate::types::{BigramEntry, Entry, Frequency};

pub mod import;
mod index;

pub(crate) use self::index::FuzzyIndex;

/// Words, bigrams and the delete-variant index derived from the words.
///
/// Every mutation of the word set updates the index in the same call, so the
/// two never disagree for anyone holding a shared reference.
#[derive(Clone, Debug)]
pub struct Dictionary {
    name: SmolStr,
    entries: HashMap<SmolStr, Entry>,
    bigrams: HashMap<SmolStr, HashMap<SmolStr, Frequency>>,
    index: FuzzyIndex,
    total_frequency: Frequency,
}

impl Dictionary {
    pub(crate) fn new(
        name: SmolStr,
        max_edit_distance: usize,
        prefix_length: Option<usize>,
    ) -> Dictionary {
        Dictionary {
            name,
            entries: HashMap::new(),
            bigrams: HashMap::new(),
            index: FuzzyIndex::new(max_edit_distance, prefix_length),
            total_frequency: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all word frequencies, the corpus size used for probabilities.
    pub fn total_frequency(&self) -> Frequency {
        self.total_frequency
    }

    pub fn max_word_length(&self) -> usize {
        self.index.max_word_length()
    }

    pub(crate) fn index(&self) -> &FuzzyIndex {
        &self.index
    }

    pub(crate) fn index_size(&self) -> usize {
        self.index.bucket_count()
    }

    pub fn get(&self, word: &str) -> Option<&Entry> {
        self.entries.get(word)
    }

    pub fn bigram(&self, first: &str, second: &str) -> Option<Frequency> {
        self.bigrams
            .get(first)
            .and_then(|seconds| seconds.get(second))
            .copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn bigrams(&self) -> impl Iterator<Item = BigramEntry> + '_ {
        self.bigrams.iter().flat_map(|(first, seconds)| {
            seconds
                .iter()
                .map(move |(second, frequency)| BigramEntry::new(first.clone(), second.clone(), *frequency))
        })
    }

    /// Inserts or updates a word and returns the stored entry.
    ///
    /// Accumulate mode adds the frequency and merges metadata keys; override
    /// mode replaces both.
    pub(crate) fn add_entry(&mut self, entry: Entry, override_frequency: bool) -> &Entry {
        let Entry {
            word,
            frequency,
            word_data,
        } = entry;

        let is_new = !self.entries.contains_key(word.as_str());
        if is_new {
            self.index.insert(&word);
        }

        let stored = self
            .entries
            .entry(word.clone())
            .or_insert_with(|| Entry::new(word, 0));

        self.total_frequency = self.total_frequency.saturating_sub(stored.frequency);

        if override_frequency {
            stored.frequency = frequency;
            stored.word_data = word_data;
        } else {
            stored.frequency = stored.frequency.saturating_add(frequency);
            stored.word_data.extend(word_data);
        }

        self.total_frequency = self.total_frequency.saturating_add(stored.frequency);
        stored
    }

    pub(crate) fn remove_entry(&mut self, word: &str) -> Option<Entry> {
        let removed = self.entries.remove(word)?;
        self.index.remove(word);
        self.total_frequency = self.total_frequency.saturating_sub(removed.frequency);
        Some(removed)
    }

    pub(crate) fn add_bigram(&mut self, bigram: BigramEntry, override_frequency: bool) -> Frequency {
        let stored = self
            .bigrams
            .entry(bigram.first)
            .or_default()
            .entry(bigram.second)
            .or_insert(0);

        if override_frequency {
            *stored = bigram.frequency;
        } else {
            *stored = stored.saturating_add(bigram.frequency);
        }

        *stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> Dictionary {
        Dictionary::new(SmolStr::new("test"), 2, None)
    }

    #[test]
    fn accumulate_and_override() {
        let mut dict = dictionary();
        dict.add_entry(Entry::new("word", 1).with_data("type", "noun"), false);
        dict.add_entry(Entry::new("word", 1).with_data("lang", "en"), false);

        let entry = dict.get("word").unwrap();
        assert_eq!(entry.frequency, 2);
        assert_eq!(entry.word_data.len(), 2);
        assert_eq!(dict.total_frequency(), 2);

        dict.add_entry(Entry::new("word", 7).with_data("type", "other"), true);
        let entry = dict.get("word").unwrap();
        assert_eq!(entry.frequency, 7);
        assert_eq!(entry.word_data.len(), 1);
        assert_eq!(entry.word_data["type"], "other");
        assert_eq!(dict.total_frequency(), 7);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn reinsert_does_not_duplicate_index() {
        let mut dict = dictionary();
        dict.add_entry(Entry::new("word", 1), false);
        dict.add_entry(Entry::new("word", 1), false);

        assert_eq!(dict.index().bucket("word").len(), 1);
        assert_eq!(dict.index().bucket("wd").len(), 1);
    }

    #[test]
    fn remove_clears_index() {
        let mut dict = dictionary();
        dict.add_entry(Entry::new("near", 3), false);
        dict.add_entry(Entry::new("the", 2), false);

        let removed = dict.remove_entry("near").unwrap();
        assert_eq!(removed.frequency, 3);
        assert!(dict.get("near").is_none());
        assert!(dict.index().bucket("nar").is_empty());
        assert_eq!(dict.total_frequency(), 2);
        assert!(dict.remove_entry("near").is_none());
    }

    #[test]
    fn bigrams_accumulate() {
        let mut dict = dictionary();
        dict.add_bigram(BigramEntry::new("sea", "shore", 3), false);
        dict.add_bigram(BigramEntry::new("sea", "shore", 2), false);
        assert_eq!(dict.bigram("sea", "shore"), Some(5));
        assert_eq!(dict.bigram("shore", "sea"), None);

        dict.add_bigram(BigramEntry::new("sea", "shore", 1), true);
        assert_eq!(dict.bigram("sea", "shore"), Some(1));
        assert_eq!(dict.bigrams().count(), 1);
    }
}
