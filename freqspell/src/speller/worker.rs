use std::borrow::Cow;

use hashbrown::HashSet;
use itertools::Itertools;
use smol_str::SmolStr;

use super::{LookupOptions, SpellerConfig, SuggestionLevel};
use crate::dictionary::Dictionary;
use crate::speller::suggestion::Suggestion;
use crate::tokenizer::case_handling::{lower_case, CaseMutation};
use crate::types::{Distance, Frequency};

/// One lookup pass over a fixed set of dictionary views.
///
/// The views are borrowed from read guards held by the caller, so every
/// candidate a worker produces comes from a single consistent state.
pub(crate) struct LookupWorker<'a> {
    config: &'a SpellerConfig,
    views: &'a [&'a Dictionary],
    max_distance: Distance,
    corpus_size: f64,
}

impl<'a> LookupWorker<'a> {
    pub(crate) fn new(
        config: &'a SpellerConfig,
        views: &'a [&'a Dictionary],
        options: &LookupOptions,
    ) -> LookupWorker<'a> {
        let max_distance = options
            .max_edit_distance
            .unwrap_or(config.max_edit_distance)
            .min(config.max_edit_distance);

        let corpus_size = views
            .iter()
            .map(|d| d.total_frequency())
            .fold(0 as Frequency, Frequency::saturating_add)
            .max(1) as f64;

        LookupWorker {
            config,
            views,
            max_distance,
            corpus_size,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &SpellerConfig {
        self.config
    }

    #[inline(always)]
    pub fn max_distance(&self) -> Distance {
        self.max_distance
    }

    pub fn max_word_length(&self) -> usize {
        self.views
            .iter()
            .map(|d| d.max_word_length())
            .max()
            .unwrap_or(0)
    }

    /// Brings text into the form words are stored in.
    pub fn fold<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.config.case_sensitive {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(lower_case(text).to_string())
        }
    }

    /// `word` with the capitalisation of `original` when the model ignores
    /// case.
    pub fn restore_case(&self, original: &str, word: &str) -> SmolStr {
        if self.config.case_sensitive {
            SmolStr::new(word)
        } else {
            CaseMutation::of(original).apply(word)
        }
    }

    /// Suggestions for a single word at the requested level. In
    /// case-insensitive mode the query's capitalisation is carried over.
    pub fn suggest(&self, query: &str, level: SuggestionLevel) -> Vec<Suggestion> {
        log::trace!("Beginning suggest for {:?}", query);

        let mut suggestions = self.candidates(&self.fold(query));

        match level {
            SuggestionLevel::Best => suggestions.truncate(1),
            SuggestionLevel::Closest => {
                if let Some(closest) = suggestions.first().map(|s| s.distance) {
                    suggestions.retain(|s| s.distance == closest);
                }
            }
            SuggestionLevel::All => {}
        }

        if !self.config.case_sensitive {
            let mutation = CaseMutation::of(query);
            if mutation != CaseMutation::None {
                suggestions
                    .iter_mut()
                    .for_each(|s| s.word = mutation.apply(&s.word));
            }
        }

        suggestions
    }

    pub fn contains(&self, word: &str) -> bool {
        self.views.iter().any(|d| d.get(word).is_some())
    }

    /// The single best suggestion for an already folded word.
    pub fn best(&self, word: &str) -> Option<Suggestion> {
        self.candidates(word).into_iter().next()
    }

    /// Every dictionary word within the distance limit, ranked by distance,
    /// then frequency, then dictionary priority, and deduplicated by word.
    pub fn candidates(&self, query: &str) -> Vec<Suggestion> {
        if query.is_empty() {
            return vec![];
        }

        let query_len = query.chars().count();
        let mut found: Vec<(usize, Suggestion)> = vec![];

        for (priority, dictionary) in self.views.iter().enumerate() {
            if query_len > dictionary.max_word_length() + self.max_distance {
                continue;
            }

            let index = dictionary.index();
            let mut seen: HashSet<&str> = HashSet::new();

            if let Some(entry) = dictionary.get(query) {
                seen.insert(entry.word.as_str());
                found.push((priority, Suggestion::from_entry(entry, 0)));
            }

            for variant in index.query_variants(query, self.max_distance) {
                for word in index.bucket(&variant) {
                    if !seen.insert(word.as_str()) {
                        continue;
                    }

                    let word_len = word.chars().count();
                    if word_len.max(query_len) - word_len.min(query_len) > self.max_distance {
                        continue;
                    }

                    // The delete count only bounds the distance.
                    let distance = strsim::damerau_levenshtein(query, word);
                    if distance > self.max_distance {
                        continue;
                    }

                    match dictionary.get(word) {
                        Some(entry) => found.push((priority, Suggestion::from_entry(entry, distance))),
                        None => log::error!(
                            "{:?}: index refers to missing word {:?}",
                            dictionary.name(),
                            word
                        ),
                    }
                }
            }
        }

        found.sort_by(|(pa, a), (pb, b)| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| pa.cmp(pb))
                .then_with(|| a.word.cmp(&b.word))
        });

        found
            .into_iter()
            .map(|(_, suggestion)| suggestion)
            .unique_by(|s| s.word.clone())
            .collect()
    }

    /// Frequency of a word pair, from the highest-priority dictionary that
    /// knows it.
    pub fn bigram(&self, first: &str, second: &str) -> Option<Frequency> {
        self.views.iter().find_map(|d| d.bigram(first, second))
    }

    pub fn corpus_size(&self) -> f64 {
        self.corpus_size
    }

    /// log10 probability of a known word.
    pub fn log_prob(&self, frequency: Frequency) -> f64 {
        (frequency.max(1) as f64 / self.corpus_size).log10()
    }

    /// log10 probability estimate for a word of `len` characters that is not
    /// in any dictionary: P = 10 / (N * 10^len).
    pub fn unknown_log_prob(&self, len: usize) -> f64 {
        1.0 - len as f64 - self.corpus_size.log10()
    }

    /// log10 adjacency plausibility of two words; zero without bigram data.
    pub fn plausibility(&self, first: &str, second: &str) -> f64 {
        self.bigram(first, second)
            .map(|frequency| (1.0 + frequency as f64).log10())
            .unwrap_or(0.0)
    }
}
