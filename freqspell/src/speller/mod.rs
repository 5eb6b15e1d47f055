use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;
use itertools::Itertools;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use self::segment::Composition;
use self::worker::LookupWorker;
use crate::constants::{DEFAULT_COMPOUND_CANDIDATES, DEFAULT_DICTIONARY, DEFAULT_MAX_EDIT_DISTANCE};
use crate::dictionary::{import, Dictionary};
use crate::error::SpellError;
use crate::speller::suggestion::Suggestion;
use crate::tokenizer::case_handling::lower_case;
use crate::types::{BigramEntry, Entries, Entry, Frequency};

pub mod compound;
pub mod segment;
pub mod suggestion;
mod worker;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellerConfig {
    /// Largest edit distance the index is built for.
    pub max_edit_distance: usize,
    /// Only the first `n` characters of a word are indexed.
    pub prefix_length: Option<usize>,
    pub case_sensitive: bool,
    /// Longest part the segmenter tries; defaults to the longest known word.
    pub max_segment_token_length: Option<usize>,
    /// Equally close candidates per token kept by the compound corrector.
    pub compound_candidates: usize,
}

impl SpellerConfig {
    pub const fn default() -> SpellerConfig {
        SpellerConfig {
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            prefix_length: None,
            case_sensitive: true,
            max_segment_token_length: None,
            compound_candidates: DEFAULT_COMPOUND_CANDIDATES,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionLevel {
    /// Only the top suggestion
    Best,
    /// Every suggestion at the smallest distance found
    Closest,
    /// Every suggestion within the distance limit
    All,
}

impl Default for SuggestionLevel {
    fn default() -> Self {
        SuggestionLevel::Best
    }
}

impl std::str::FromStr for SuggestionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(SuggestionLevel::Best),
            "closest" => Ok(SuggestionLevel::Closest),
            "all" => Ok(SuggestionLevel::All),
            other => Err(format!("unknown suggestion level '{}'", other)),
        }
    }
}

/// Per-call lookup settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
    pub level: SuggestionLevel,
    /// Dictionaries to search, highest priority first. Empty means the
    /// default dictionary.
    #[serde(default)]
    pub dictionaries: Vec<SmolStr>,
    /// Lowers the configured edit distance for this call.
    #[serde(default)]
    pub max_edit_distance: Option<usize>,
}

impl LookupOptions {
    pub fn level(level: SuggestionLevel) -> LookupOptions {
        LookupOptions {
            level,
            ..LookupOptions::default()
        }
    }

    pub fn in_dictionary(mut self, name: impl Into<SmolStr>) -> LookupOptions {
        self.dictionaries.push(name.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddOptions {
    /// Replace the stored frequency and metadata instead of accumulating.
    pub override_frequency: bool,
    pub dictionary: SmolStr,
}

impl Default for AddOptions {
    fn default() -> Self {
        AddOptions {
            override_frequency: false,
            dictionary: SmolStr::new(DEFAULT_DICTIONARY),
        }
    }
}

impl AddOptions {
    pub fn in_dictionary(name: impl Into<SmolStr>) -> AddOptions {
        AddOptions {
            dictionary: name.into(),
            ..AddOptions::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub add: AddOptions,
    /// Records below this frequency are dropped before insertion.
    pub min_frequency: Frequency,
}

pub trait Speller {
    fn is_correct(self: Arc<Self>, word: &str, options: LookupOptions) -> bool;
    fn lookup(self: Arc<Self>, query: &str, options: LookupOptions) -> Vec<Suggestion>;
    fn lookup_compound(self: Arc<Self>, query: &str, options: LookupOptions) -> Vec<Suggestion>;
    fn segment(self: Arc<Self>, text: &str, options: LookupOptions) -> Composition;
}

#[derive(Debug)]
pub(crate) struct Store {
    pub(crate) config: SpellerConfig,
    pub(crate) dictionaries: HashMap<SmolStr, Arc<RwLock<Dictionary>>>,
}

impl Store {
    fn new(config: SpellerConfig) -> Store {
        Store {
            config,
            dictionaries: HashMap::new(),
        }
    }
}

/// An in-memory spelling model: named dictionaries behind one shared store.
///
/// Each dictionary sits behind its own readers-writer lock, so a lookup sees
/// a word either with its index entries or not at all. Loading a saved model
/// builds a complete new store and swaps it in, so in-flight lookups finish on
/// the old one.
#[derive(Debug)]
pub struct SpellModel {
    store: RwLock<Store>,
}

impl SpellModel {
    pub fn new() -> Arc<SpellModel> {
        SpellModel::with_config(SpellerConfig::default())
    }

    pub fn with_config(config: SpellerConfig) -> Arc<SpellModel> {
        Arc::new(SpellModel {
            store: RwLock::new(Store::new(config)),
        })
    }

    pub fn config(&self) -> SpellerConfig {
        self.store.read().config.clone()
    }

    /// Names of all dictionaries, sorted.
    pub fn dictionaries(&self) -> Vec<SmolStr> {
        self.store
            .read()
            .dictionaries
            .keys()
            .cloned()
            .sorted()
            .collect()
    }

    /// Number of words in a dictionary; zero when it does not exist.
    pub fn len(&self, dictionary: &str) -> usize {
        let store = self.store.read();
        store
            .dictionaries
            .get(dictionary)
            .map(|d| d.read().len())
            .unwrap_or(0)
    }

    pub fn add_entry(&self, entry: Entry, options: AddOptions) -> Result<Entry, SpellError> {
        if entry.word.is_empty() {
            return Err(SpellError::InvalidInput("empty word".into()));
        }

        let (config, dictionary) = self.dictionary_for_write(&options.dictionary);
        let entry = fold_entry(&config, entry);

        let mut dictionary = dictionary.write();
        Ok(dictionary.add_entry(entry, options.override_frequency).clone())
    }

    /// Tags many words with one frequency and one set of metadata. All words
    /// become visible together.
    pub fn add_entries(&self, batch: Entries, options: AddOptions) -> Result<usize, SpellError> {
        if batch.words.iter().any(|w| w.is_empty()) {
            return Err(SpellError::InvalidInput("empty word in batch".into()));
        }

        let Entries {
            words,
            frequency,
            word_data,
        } = batch;

        let entries = words.into_iter().map(|word| Entry {
            word,
            frequency,
            word_data: word_data.clone(),
        });

        Ok(self.insert_entries(entries, &options))
    }

    pub fn add_bigram(&self, bigram: BigramEntry, options: AddOptions) -> Result<Frequency, SpellError> {
        if bigram.first.is_empty() || bigram.second.is_empty() {
            return Err(SpellError::InvalidInput("empty word in bigram".into()));
        }

        let (config, dictionary) = self.dictionary_for_write(&options.dictionary);
        let bigram = fold_bigram(&config, bigram);

        let mut dictionary = dictionary.write();
        Ok(dictionary.add_bigram(bigram, options.override_frequency))
    }

    /// Exact lookup, searching the scoped dictionaries in priority order.
    pub fn get_entry(&self, word: &str, options: LookupOptions) -> Result<Entry, SpellError> {
        self.with_views(&options.dictionaries, |config, views| {
            let word = match config.case_sensitive {
                true => SmolStr::from(word),
                false => lower_case(word),
            };

            views
                .iter()
                .find_map(|d| d.get(&word))
                .cloned()
                .ok_or(SpellError::NotFound(word))
        })
    }

    /// Removes a word from a dictionary and from its fuzzy index. Bigrams
    /// mentioning the word are kept.
    pub fn remove_entry(&self, word: &str, dictionary: &str) -> Result<Entry, SpellError> {
        let store = self.store.read();
        let word = match store.config.case_sensitive {
            true => SmolStr::from(word),
            false => lower_case(word),
        };

        store
            .dictionaries
            .get(dictionary)
            .and_then(|d| d.write().remove_entry(&word))
            .ok_or(SpellError::NotFound(word))
    }

    /// Imports a word list, merging with what is already stored.
    pub fn create_dictionary<P: AsRef<Path>>(
        &self,
        path: P,
        options: AddOptions,
    ) -> Result<usize, SpellError> {
        self.import_entries(
            path,
            ImportOptions {
                add: options,
                min_frequency: 0,
            },
        )
    }

    pub fn import_entries<P: AsRef<Path>>(
        &self,
        path: P,
        options: ImportOptions,
    ) -> Result<usize, SpellError> {
        let path = path.as_ref();
        let entries =
            import::read_entries(import::open(path)?).map_err(|e| SpellError::io(path, e))?;

        let read = entries.len();
        let entries = entries
            .into_iter()
            .filter(|e| e.frequency >= options.min_frequency);

        let count = self.insert_entries(entries, &options.add);

        log::debug!(
            "Imported {} of {} words from {} into {:?} ({} index buckets)",
            count,
            read,
            path.display(),
            options.add.dictionary,
            self.index_size(&options.add.dictionary)
        );

        Ok(count)
    }

    pub fn import_bigrams<P: AsRef<Path>>(
        &self,
        path: P,
        options: ImportOptions,
    ) -> Result<usize, SpellError> {
        let path = path.as_ref();
        let bigrams =
            import::read_bigrams(import::open(path)?).map_err(|e| SpellError::io(path, e))?;

        let (config, dictionary) = self.dictionary_for_write(&options.add.dictionary);
        let mut dictionary = dictionary.write();
        let mut count = 0;

        for bigram in bigrams
            .into_iter()
            .filter(|b| b.frequency >= options.min_frequency)
        {
            dictionary.add_bigram(fold_bigram(&config, bigram), options.add.override_frequency);
            count += 1;
        }

        log::debug!(
            "Imported {} bigrams from {} into {:?}",
            count,
            path.display(),
            options.add.dictionary
        );

        Ok(count)
    }

    /// Writes every dictionary to `path`. Writers wait until the file is
    /// complete.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SpellError> {
        let store = self.store.read();
        let guards = store
            .dictionaries
            .iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, d)| d.read())
            .collect::<Vec<_>>();
        let views = guards.iter().map(|g| &**g).collect::<Vec<_>>();

        crate::archive::write_model(path.as_ref(), &store.config, &views)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Arc<SpellModel>, SpellError> {
        let store = crate::archive::read_model(path.as_ref())?;
        Ok(Arc::new(SpellModel {
            store: RwLock::new(store),
        }))
    }

    /// Replaces the whole model with the one saved at `path`. On error the
    /// current model is left untouched.
    pub fn reload<P: AsRef<Path>>(&self, path: P) -> Result<(), SpellError> {
        let store = crate::archive::read_model(path.as_ref())?;
        *self.store.write() = store;
        Ok(())
    }

    fn index_size(&self, dictionary: &str) -> usize {
        self.store
            .read()
            .dictionaries
            .get(dictionary)
            .map(|d| d.read().index_size())
            .unwrap_or(0)
    }

    fn insert_entries<I>(&self, entries: I, options: &AddOptions) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        let (config, dictionary) = self.dictionary_for_write(&options.dictionary);
        let mut dictionary = dictionary.write();
        let mut count = 0;

        for entry in entries {
            if entry.word.is_empty() {
                continue;
            }

            dictionary.add_entry(fold_entry(&config, entry), options.override_frequency);
            count += 1;
        }

        count
    }

    /// The named dictionary, created on first use.
    fn dictionary_for_write(&self, name: &str) -> (SpellerConfig, Arc<RwLock<Dictionary>>) {
        {
            let store = self.store.read();
            if let Some(dictionary) = store.dictionaries.get(name) {
                return (store.config.clone(), Arc::clone(dictionary));
            }
        }

        let mut store = self.store.write();
        let Store {
            config,
            dictionaries,
        } = &mut *store;

        let dictionary = dictionaries
            .entry(SmolStr::from(name))
            .or_insert_with(|| {
                log::debug!("Creating dictionary {:?}", name);
                Arc::new(RwLock::new(Dictionary::new(
                    SmolStr::from(name),
                    config.max_edit_distance,
                    config.prefix_length,
                )))
            });

        (config.clone(), Arc::clone(dictionary))
    }

    /// Runs `f` over read views of the scoped dictionaries, in priority
    /// order. Unknown names are skipped.
    fn with_views<R, F>(&self, names: &[SmolStr], f: F) -> R
    where
        F: FnOnce(&SpellerConfig, &[&Dictionary]) -> R,
    {
        let (config, scoped) = {
            let store = self.store.read();
            let scoped = if names.is_empty() {
                store
                    .dictionaries
                    .get(DEFAULT_DICTIONARY)
                    .map(|d| (SmolStr::new(DEFAULT_DICTIONARY), Arc::clone(d)))
                    .into_iter()
                    .collect::<Vec<_>>()
            } else {
                names
                    .iter()
                    .unique()
                    .filter_map(|name| {
                        store
                            .dictionaries
                            .get(name)
                            .map(|d| (name.clone(), Arc::clone(d)))
                    })
                    .collect::<Vec<_>>()
            };
            (store.config.clone(), scoped)
        };

        // Locked in name order, viewed in priority order.
        let mut guards = scoped
            .iter()
            .enumerate()
            .sorted_by(|(_, (a, _)), (_, (b, _))| a.cmp(b))
            .map(|(priority, (_, d))| (priority, d.read()))
            .collect::<Vec<_>>();
        guards.sort_by_key(|(priority, _)| *priority);
        let views = guards.iter().map(|(_, g)| &**g).collect::<Vec<_>>();

        f(&config, &views)
    }
}

impl Speller for SpellModel {
    fn is_correct(self: Arc<Self>, word: &str, options: LookupOptions) -> bool {
        self.with_views(&options.dictionaries, |config, views| {
            let worker = LookupWorker::new(config, views, &options);
            worker.contains(&worker.fold(word))
        })
    }

    fn lookup(self: Arc<Self>, query: &str, options: LookupOptions) -> Vec<Suggestion> {
        if query.is_empty() {
            return vec![];
        }

        self.with_views(&options.dictionaries, |config, views| {
            LookupWorker::new(config, views, &options).suggest(query, options.level)
        })
    }

    fn lookup_compound(self: Arc<Self>, query: &str, options: LookupOptions) -> Vec<Suggestion> {
        self.with_views(&options.dictionaries, |config, views| {
            let worker = LookupWorker::new(config, views, &options);
            compound::lookup_compound(&worker, query)
        })
    }

    fn segment(self: Arc<Self>, text: &str, options: LookupOptions) -> Composition {
        self.with_views(&options.dictionaries, |config, views| {
            let worker = LookupWorker::new(config, views, &options);
            segment::segment(&worker, text)
        })
    }
}

impl Store {
    /// Rebuilds a store from saved parts; later duplicates replace earlier ones.
    pub(crate) fn from_parts<I>(config: SpellerConfig, parts: I) -> Store
    where
        I: IntoIterator<Item = (SmolStr, Vec<Entry>, Vec<BigramEntry>)>,
    {
        let mut store = Store::new(config);

        for (name, entries, bigrams) in parts {
            let mut dictionary =
                Dictionary::new(name.clone(), store.config.max_edit_distance, store.config.prefix_length);

            for entry in entries {
                dictionary.add_entry(entry, true);
            }

            for bigram in bigrams {
                dictionary.add_bigram(bigram, true);
            }

            log::debug!(
                "Rebuilt dictionary {:?}: {} words, {} index buckets",
                name,
                dictionary.len(),
                dictionary.index_size()
            );

            store.dictionaries.insert(name, Arc::new(RwLock::new(dictionary)));
        }

        store
    }
}

fn fold_entry(config: &SpellerConfig, mut entry: Entry) -> Entry {
    if !config.case_sensitive {
        entry.word = lower_case(&entry.word);
    }
    entry
}

fn fold_bigram(config: &SpellerConfig, mut bigram: BigramEntry) -> BigramEntry {
    if !config.case_sensitive {
        bigram.first = lower_case(&bigram.first);
        bigram.second = lower_case(&bigram.second);
    }
    bigram
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn model(words: &[(&str, Frequency)]) -> Arc<SpellModel> {
        let model = SpellModel::new();
        for (word, frequency) in words {
            model
                .add_entry(Entry::new(*word, *frequency), AddOptions::default())
                .unwrap();
        }
        model
    }

    fn words(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.word()).collect()
    }

    #[test]
    fn inserted_words_are_found_first() {
        let model = model(&[("word", 40), ("world", 70), ("ward", 3)]);

        for (word, frequency) in &[("word", 40), ("world", 70), ("ward", 3)] {
            let entry = model.get_entry(word, LookupOptions::default()).unwrap();
            assert_eq!(entry.frequency, *frequency);

            let best = model.clone().lookup(word, LookupOptions::default());
            assert_eq!(best.len(), 1);
            assert_eq!(best[0].word(), *word);
            assert_eq!(best[0].distance(), 0);
        }
    }

    #[test]
    fn empty_words_are_rejected() {
        let model = SpellModel::new();

        assert!(matches!(
            model.add_entry(Entry::new("", 1), AddOptions::default()),
            Err(SpellError::InvalidInput(_))
        ));
        assert!(matches!(
            model.add_entries(Entries::new(vec!["ok", ""]), AddOptions::default()),
            Err(SpellError::InvalidInput(_))
        ));
        assert!(matches!(
            model.add_bigram(BigramEntry::new("ok", "", 1), AddOptions::default()),
            Err(SpellError::InvalidInput(_))
        ));
        assert_eq!(model.len(DEFAULT_DICTIONARY), 0);
    }

    #[test]
    fn missing_word_is_not_found() {
        let model = model(&[("word", 1)]);

        match model.get_entry("wurd", LookupOptions::default()) {
            Err(SpellError::NotFound(word)) => assert_eq!(word, "wurd"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(model.clone().lookup("zzzzzz", LookupOptions::default()).is_empty());
        assert!(model.clone().lookup("", LookupOptions::default()).is_empty());
    }

    #[test]
    fn accumulate_and_override() {
        let model = SpellModel::new();

        model.add_entry(Entry::new("word", 1), AddOptions::default()).unwrap();
        let entry = model.add_entry(Entry::new("word", 1), AddOptions::default()).unwrap();
        assert_eq!(entry.frequency, 2);

        let options = AddOptions {
            override_frequency: true,
            ..AddOptions::default()
        };
        let entry = model.add_entry(Entry::new("word", 9), options).unwrap();
        assert_eq!(entry.frequency, 9);
        assert_eq!(
            model.get_entry("word", LookupOptions::default()).unwrap().frequency,
            9
        );
    }

    #[test]
    fn batch_tagging() {
        let model = model(&[("cat", 5)]);

        let batch = Entries::new(vec!["cat", "dog", "bird"]).with_data("type", "animal");
        assert_eq!(model.add_entries(batch, AddOptions::default()).unwrap(), 3);

        let cat = model.get_entry("cat", LookupOptions::default()).unwrap();
        assert_eq!(cat.frequency, 6);
        assert_eq!(cat.word_data["type"], "animal");

        let dog = model.get_entry("dog", LookupOptions::default()).unwrap();
        assert_eq!(dog.frequency, 1);
        assert_eq!(dog.word_data["type"], "animal");
    }

    #[test]
    fn single_edits_are_recalled() {
        let model = model(&[("correction", 10), ("spelling", 4)]);

        let edits = [
            ("corection", "correction", 1),
            ("correctoin", "correction", 1),
            ("corrrection", "correction", 1),
            ("corrextion", "correction", 1),
            ("corextion", "correction", 2),
            ("spleling", "spelling", 1),
            ("speling", "spelling", 1),
            ("spellling", "spelling", 1),
            ("spelinng", "spelling", 2),
        ];

        for (query, expected, k) in &edits {
            let all = model.clone().lookup(query, LookupOptions::level(SuggestionLevel::All));
            let found = all
                .iter()
                .find(|s| s.word() == *expected)
                .unwrap_or_else(|| panic!("{} not found for {}", expected, query));
            assert!(found.distance() <= *k, "{} -> {}", query, found.distance());
        }
    }

    #[test]
    fn levels_nest() {
        let model = model(&[("word", 100), ("world", 1), ("ward", 50), ("sword", 3), ("wort", 20)]);

        let best = model.clone().lookup("wordd", LookupOptions::level(SuggestionLevel::Best));
        let closest = model
            .clone()
            .lookup("wordd", LookupOptions::level(SuggestionLevel::Closest));
        let all = model.clone().lookup("wordd", LookupOptions::level(SuggestionLevel::All));

        assert_eq!(words(&best), vec!["word"]);
        assert_eq!(words(&closest), vec!["word", "world"]);
        assert!(closest.iter().all(|s| all.contains(s)));
        assert!(best.iter().all(|s| closest.contains(s)));
        assert!(all.iter().all(|s| s.distance() >= best[0].distance()));

        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(sorted, all);
    }

    #[test]
    fn dictionaries_are_isolated() {
        let model = model(&[("the", 10)]);
        model
            .add_entry(Entry::new("quindici", 3), AddOptions::in_dictionary("italian"))
            .unwrap();

        assert!(model.clone().lookup("quindici", LookupOptions::default()).is_empty());

        let found = model
            .clone()
            .lookup("quindici", LookupOptions::default().in_dictionary("italian"));
        assert_eq!(words(&found), vec!["quindici"]);
        assert_eq!(found[0].distance(), 0);

        assert_eq!(model.dictionaries(), vec![SmolStr::new(""), SmolStr::new("italian")]);
        assert_eq!(model.len("italian"), 1);
        assert_eq!(model.len("missing"), 0);
    }

    #[test]
    fn scoped_lookup_merges_dictionaries() {
        let model = model(&[("cot", 5)]);
        model
            .add_entry(Entry::new("cat", 5), AddOptions::in_dictionary("extra"))
            .unwrap();

        let options = LookupOptions::level(SuggestionLevel::All)
            .in_dictionary("extra")
            .in_dictionary(DEFAULT_DICTIONARY);
        let found = model.clone().lookup("cit", options);
        assert_eq!(words(&found), vec!["cat", "cot"]);
    }

    #[test]
    fn remove_entry() {
        let model = model(&[("near", 3), ("neat", 2)]);

        let removed = model.remove_entry("near", DEFAULT_DICTIONARY).unwrap();
        assert_eq!(removed.frequency, 3);
        assert!(model.get_entry("near", LookupOptions::default()).is_err());

        let found = model.clone().lookup("near", LookupOptions::level(SuggestionLevel::All));
        assert_eq!(words(&found), vec!["neat"]);
        assert!(matches!(
            model.remove_entry("near", DEFAULT_DICTIONARY),
            Err(SpellError::NotFound(_))
        ));
    }

    #[test]
    fn case_insensitive_model() {
        let config = SpellerConfig {
            case_sensitive: false,
            ..SpellerConfig::default()
        };
        let model = SpellModel::with_config(config);
        model.add_entry(Entry::new("Paris", 4), AddOptions::default()).unwrap();

        assert_eq!(model.get_entry("PARIS", LookupOptions::default()).unwrap().word, "paris");
        assert!(model.clone().is_correct("paris", LookupOptions::default()));

        let found = model.clone().lookup("Pariss", LookupOptions::default());
        assert_eq!(words(&found), vec!["Paris"]);
    }

    #[test]
    fn case_insensitive_compound_and_segment() {
        let config = SpellerConfig {
            case_sensitive: false,
            ..SpellerConfig::default()
        };
        let model = SpellModel::with_config(config);
        for (word, frequency) in &[("hello", 10), ("world", 10), ("near", 1), ("the", 1)] {
            model
                .add_entry(Entry::new(*word, *frequency), AddOptions::default())
                .unwrap();
        }

        let corrected = model
            .clone()
            .lookup_compound("Helo WORLD", LookupOptions::default());
        assert_eq!(words(&corrected), vec!["Hello WORLD"]);
        assert_eq!(corrected[0].distance(), 1);
        assert_eq!(words(&corrected[0].parts), vec!["Hello", "WORLD"]);

        let split = model
            .clone()
            .lookup_compound("HelloWorld", LookupOptions::default());
        assert_eq!(words(&split), vec!["Hello World"]);

        let composition = model.clone().segment("NearTHE", LookupOptions::default());
        assert_eq!(composition.corrected, "Near THE");
        assert_eq!(composition.segmented, "Near THE");
        assert_eq!(composition.distance_sum, 0);
    }

    #[test]
    fn prefix_index_recalls_edits() {
        let config = SpellerConfig {
            prefix_length: Some(3),
            ..SpellerConfig::default()
        };
        let model = SpellModel::with_config(config);
        for (word, frequency) in &[("fireplace", 10), ("firefly", 4), ("replace", 6)] {
            model
                .add_entry(Entry::new(*word, *frequency), AddOptions::default())
                .unwrap();
        }

        let edits = [
            ("fireplaxe", 1),
            ("firepalce", 1),
            ("fjreplace", 1),
            ("freplace", 1),
            ("fjreplaxe", 2),
            ("firepalxe", 2),
            ("xxreplace", 2),
            ("frplace", 2),
        ];

        for (query, k) in &edits {
            let all = model.clone().lookup(query, LookupOptions::level(SuggestionLevel::All));
            let found = all
                .iter()
                .find(|s| s.word() == "fireplace")
                .unwrap_or_else(|| panic!("fireplace not found for {}", query));
            assert_eq!(found.distance(), *k, "{}", query);
        }

        let best = model.clone().lookup("fireplaxe", LookupOptions::default());
        assert_eq!(words(&best), vec!["fireplace"]);
    }

    #[test]
    fn import_with_minimum_frequency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"Word\":\"near\",\"Frequency\":120}}").unwrap();
        writeln!(file, "{{\"Word\":\"rare\",\"Frequency\":2}}").unwrap();
        writeln!(file, "not a record at all").unwrap();
        writeln!(file, "fireplace 60").unwrap();

        let model = SpellModel::new();
        let options = ImportOptions {
            min_frequency: 50,
            ..ImportOptions::default()
        };
        assert_eq!(model.import_entries(file.path(), options).unwrap(), 2);
        assert!(model.get_entry("rare", LookupOptions::default()).is_err());

        assert_eq!(model.create_dictionary(file.path(), AddOptions::default()).unwrap(), 3);
        assert_eq!(
            model.get_entry("near", LookupOptions::default()).unwrap().frequency,
            240
        );

        let mut bigrams = tempfile::NamedTempFile::new().unwrap();
        writeln!(bigrams, "{{\"Word\":\"sea shore\",\"Frequency\":90}}").unwrap();
        writeln!(bigrams, "of the 10").unwrap();
        let options = ImportOptions {
            min_frequency: 50,
            ..ImportOptions::default()
        };
        assert_eq!(model.import_bigrams(bigrams.path(), options).unwrap(), 1);

        assert!(matches!(
            model.import_entries("/nonexistent/words.ndjson", ImportOptions::default()),
            Err(SpellError::Io { .. })
        ));
    }

    #[test]
    fn segments_concatenated_text() {
        let model = model(&[("near", 1), ("the", 1), ("fireplace", 1)]);

        let composition = model
            .clone()
            .segment("nearthefireplace", LookupOptions::default());
        assert_eq!(composition.corrected, "near the fireplace");
        assert_eq!(composition.segmented, "near the fireplace");
        assert_eq!(composition.words(), vec!["near", "the", "fireplace"]);
        assert_eq!(composition.distance_sum, 0);

        let empty = model.clone().segment("", LookupOptions::default());
        assert!(empty.tokens.is_empty());
    }

    #[test]
    fn compound_merges_and_shifts() {
        let model = model(&[("word", 10), ("world", 10), ("hello", 10)]);

        let merged = model.clone().lookup_compound("wor d", LookupOptions::default());
        assert_eq!(words(&merged), vec!["word"]);

        let shifted = model
            .clone()
            .lookup_compound("hellow orld", LookupOptions::default());
        assert_eq!(words(&shifted), vec!["hello world"]);
        assert_eq!(shifted[0].parts.len(), 2);

        assert!(model.clone().lookup_compound("   ", LookupOptions::default()).is_empty());
    }

    #[test]
    fn compound_uses_bigrams() {
        let model = model(&[("sea", 10), ("see", 50), ("shore", 10)]);

        let plain = model.clone().lookup_compound("sey shore", LookupOptions::default());
        assert_eq!(words(&plain), vec!["see shore"]);

        model
            .add_bigram(BigramEntry::new("sea", "shore", 100), AddOptions::default())
            .unwrap();
        let informed = model.clone().lookup_compound("sey shore", LookupOptions::default());
        assert_eq!(words(&informed), vec!["sea shore"]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let model = model(&[
            ("near", 1),
            ("the", 1),
            ("fireplace", 1),
            ("sea", 10),
            ("see", 50),
            ("shore", 10),
        ]);
        model
            .add_entry(
                Entry::new("quindici", 3).with_data("type", "number"),
                AddOptions::in_dictionary("italian"),
            )
            .unwrap();
        model
            .add_bigram(BigramEntry::new("near", "the", 4), AddOptions::default())
            .unwrap();
        model
            .add_bigram(BigramEntry::new("sea", "shore", 100), AddOptions::default())
            .unwrap();
        model.save(&path).unwrap();

        let loaded = SpellModel::load(&path).unwrap();
        assert_eq!(loaded.dictionaries(), model.dictionaries());
        assert_eq!(loaded.config(), model.config());

        let italian = LookupOptions::default().in_dictionary("italian");
        let entry = loaded.get_entry("quindici", italian.clone()).unwrap();
        assert_eq!(entry, model.get_entry("quindici", italian).unwrap());
        assert_eq!(entry.word_data["type"], "number");

        for query in &["nera", "fireplcae", "teh"] {
            let options = LookupOptions::level(SuggestionLevel::All);
            assert_eq!(
                model.clone().lookup(query, options.clone()),
                loaded.clone().lookup(query, options)
            );
        }

        assert_eq!(
            model.clone().segment("nearthefireplace", LookupOptions::default()),
            loaded.clone().segment("nearthefireplace", LookupOptions::default())
        );

        // "sea shore" only beats the more frequent "see" through its bigram.
        let before = model.clone().lookup_compound("sey shore", LookupOptions::default());
        let after = loaded.clone().lookup_compound("sey shore", LookupOptions::default());
        assert_eq!(words(&after), vec!["sea shore"]);
        assert_eq!(before, after);

        assert_eq!(
            model.clone().lookup_compound("nera teh", LookupOptions::default()),
            loaded.clone().lookup_compound("nera teh", LookupOptions::default())
        );
    }

    #[test]
    fn failed_reload_keeps_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let model = model(&[("word", 1)]);
        assert!(matches!(model.reload(&path), Err(SpellError::Corrupt { .. })));
        assert!(model.get_entry("word", LookupOptions::default()).is_ok());

        let good = dir.path().join("good.json");
        let other = self::model(&[("other", 2)]);
        other.save(&good).unwrap();
        model.reload(&good).unwrap();
        assert!(model.get_entry("word", LookupOptions::default()).is_err());
        assert!(model.get_entry("other", LookupOptions::default()).is_ok());
    }

    #[test]
    fn concurrent_reads_never_see_half_inserts() {
        let model = model(&[("seed", 1)]);
        let writer_model = Arc::clone(&model);

        let writer = std::thread::spawn(move || {
            for i in 0..200 {
                let word = format!("word{}", i);
                writer_model
                    .add_entry(
                        Entry::new(word.as_str(), 7).with_data("n", i),
                        AddOptions::default(),
                    )
                    .unwrap();
                writer_model
                    .add_entries(
                        Entries::new(vec![format!("pair{}a", i), format!("pair{}b", i)]),
                        AddOptions::default(),
                    )
                    .unwrap();
            }
        });

        let readers = (0..4)
            .map(|_| {
                let model = Arc::clone(&model);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let options = LookupOptions::level(SuggestionLevel::All);
                        for s in model.clone().lookup(&format!("word{}", i), options.clone()) {
                            if s.word().starts_with("word") {
                                assert_eq!(s.frequency(), 7);
                                assert!(s.word_data.contains_key("n"));
                            }
                        }

                        let pair = model.clone().lookup(&format!("pair{}a", i), options);
                        let has_a = pair.iter().any(|s| s.word() == format!("pair{}a", i));
                        let has_b = pair.iter().any(|s| s.word() == format!("pair{}b", i));
                        assert_eq!(has_a, has_b);
                    }
                })
            })
            .collect::<Vec<_>>();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(model.len(DEFAULT_DICTIONARY), 601);
        let found = model.clone().lookup("word199", LookupOptions::default());
        assert_eq!(words(&found), vec!["word199"]);
    }

    #[test]
    fn opposite_scopes_do_not_deadlock() {
        let model = SpellModel::new();
        for name in &["a", "b"] {
            let words = (0..300).map(|i| format!("{}word{}", name, i)).collect::<Vec<_>>();
            model
                .add_entries(Entries::new(words), AddOptions::in_dictionary(*name))
                .unwrap();
        }

        let readers = (0..4)
            .map(|t| {
                let model = Arc::clone(&model);
                std::thread::spawn(move || {
                    let (first, second) = if t % 2 == 0 { ("a", "b") } else { ("b", "a") };
                    let options = LookupOptions::level(SuggestionLevel::All)
                        .in_dictionary(first)
                        .in_dictionary(second);

                    for i in 0..2000 {
                        let query = format!("{}word{}", first, i % 300);
                        let found = model.clone().lookup(&query, options.clone());
                        assert_eq!(found[0].word(), query);
                    }
                })
            })
            .collect::<Vec<_>>();

        let writers = (0..4)
            .map(|t| {
                let model = Arc::clone(&model);
                std::thread::spawn(move || {
                    let name = if t % 2 == 0 { "a" } else { "b" };
                    for i in 0..2000 {
                        let word = format!("{}new{}x{}", name, t, i);
                        model
                            .add_entry(Entry::new(word.as_str(), 1), AddOptions::in_dictionary(name))
                            .unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();

        let saver = {
            let model = Arc::clone(&model);
            std::thread::spawn(move || {
                let dir = tempfile::tempdir().unwrap();
                for _ in 0..20 {
                    model.save(dir.path().join("model.json")).unwrap();
                }
            })
        };

        for handle in readers.into_iter().chain(writers).chain(std::iter::once(saver)) {
            handle.join().unwrap();
        }

        assert_eq!(model.len("a"), 300 + 2 * 2000);
        assert_eq!(model.len("b"), 300 + 2 * 2000);
    }

    #[test]
    fn reload_swaps_whole_model_under_readers() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        self::model(&[("cat", 1), ("shared", 1)]).save(&first).unwrap();
        self::model(&[("cot", 2), ("shared", 2)]).save(&second).unwrap();

        let model = SpellModel::load(&first).unwrap();

        let reloader = {
            let model = Arc::clone(&model);
            let (first, second) = (first.clone(), second.clone());
            std::thread::spawn(move || {
                for i in 0..200 {
                    let path = if i % 2 == 0 { &second } else { &first };
                    model.reload(path).unwrap();
                }
            })
        };

        let readers = (0..4)
            .map(|_| {
                let model = Arc::clone(&model);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let found = model
                            .clone()
                            .lookup("cit", LookupOptions::level(SuggestionLevel::All));
                        let found = found
                            .iter()
                            .map(|s| (s.word(), s.frequency()))
                            .collect::<Vec<_>>();
                        assert!(
                            found == vec![("cat", 1)] || found == vec![("cot", 2)],
                            "mixed or empty result {:?}",
                            found
                        );

                        let shared = model.get_entry("shared", LookupOptions::default()).unwrap();
                        assert!(shared.frequency == 1 || shared.frequency == 2);
                    }
                })
            })
            .collect::<Vec<_>>();

        reloader.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(model.dictionaries(), vec![SmolStr::new("")]);
        assert_eq!(model.len(DEFAULT_DICTIONARY), 2);
        assert!(model.get_entry("cat", LookupOptions::default()).is_ok());
    }
}
