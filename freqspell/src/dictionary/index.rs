//! Symmetric-delete index from delete variants to dictionary words.
use hashbrown::{HashMap, HashSet};
use smol_str::SmolStr;

/// Every string obtainable from `word` by deleting up to `max_distance`
/// characters, the word itself included. Only the first `prefix_length`
/// characters take part when a prefix length is set.
pub(crate) fn delete_variants(
    word: &str,
    max_distance: usize,
    prefix_length: Option<usize>,
) -> HashSet<SmolStr> {
    let chars = word
        .chars()
        .take(prefix_length.unwrap_or(usize::MAX))
        .collect::<Vec<_>>();

    let mut variants = HashSet::new();
    variants.insert(chars.iter().copied().collect::<SmolStr>());
    collect_deletes(&chars, max_distance, &mut variants);
    variants
}

fn collect_deletes(chars: &[char], remaining: usize, variants: &mut HashSet<SmolStr>) {
    if remaining == 0 || chars.is_empty() {
        return;
    }

    for i in 0..chars.len() {
        let mut shorter = chars.to_vec();
        shorter.remove(i);

        // A variant's length fixes its depth, so one already seen has
        // already had its own deletes collected.
        if variants.insert(shorter.iter().copied().collect::<SmolStr>()) {
            collect_deletes(&shorter, remaining - 1, variants);
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FuzzyIndex {
    max_edit_distance: usize,
    prefix_length: Option<usize>,
    buckets: HashMap<SmolStr, Vec<SmolStr>>,
    max_word_length: usize,
}

impl FuzzyIndex {
    pub fn new(max_edit_distance: usize, prefix_length: Option<usize>) -> FuzzyIndex {
        FuzzyIndex {
            max_edit_distance,
            prefix_length,
            buckets: HashMap::new(),
            max_word_length: 0,
        }
    }

    /// Records a word under each of its delete variants. Callers insert a
    /// word once; re-inserting pushes duplicates into the buckets.
    pub fn insert(&mut self, word: &SmolStr) {
        for variant in delete_variants(word, self.max_edit_distance, self.prefix_length) {
            self.buckets.entry(variant).or_default().push(word.clone());
        }

        self.max_word_length = self.max_word_length.max(word.chars().count());
    }

    /// Drops a word from every bucket it occupies. The longest-word bound is
    /// left as is; it only has to stay an upper bound.
    pub fn remove(&mut self, word: &str) {
        for variant in delete_variants(word, self.max_edit_distance, self.prefix_length) {
            let now_empty = match self.buckets.get_mut(variant.as_str()) {
                Some(bucket) => {
                    bucket.retain(|w| w != word);
                    bucket.is_empty()
                }
                None => false,
            };

            if now_empty {
                self.buckets.remove(variant.as_str());
            }
        }
    }

    /// Delete variants of a query, generated the same way words are indexed.
    pub fn query_variants(&self, query: &str, max_distance: usize) -> HashSet<SmolStr> {
        delete_variants(
            query,
            max_distance.min(self.max_edit_distance),
            self.prefix_length,
        )
    }

    pub fn bucket(&self, variant: &str) -> &[SmolStr] {
        self.buckets
            .get(variant)
            .map(|words| words.as_slice())
            .unwrap_or(&[])
    }

    #[inline]
    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(variants: HashSet<SmolStr>) -> Vec<String> {
        let mut out = variants.into_iter().map(|v| v.to_string()).collect::<Vec<_>>();
        out.sort();
        out
    }

    #[test]
    fn variants_up_to_distance() {
        assert_eq!(sorted(delete_variants("abc", 0, None)), vec!["abc"]);
        assert_eq!(
            sorted(delete_variants("abc", 1, None)),
            vec!["ab", "abc", "ac", "bc"]
        );
        assert_eq!(
            sorted(delete_variants("abc", 2, None)),
            vec!["a", "ab", "abc", "ac", "b", "bc", "c"]
        );
        assert_eq!(sorted(delete_variants("ab", 2, None)), vec!["", "a", "ab", "b"]);
    }

    #[test]
    fn variants_respect_prefix() {
        assert_eq!(
            sorted(delete_variants("abcdef", 1, Some(3))),
            vec!["ab", "abc", "ac", "bc"]
        );
    }

    #[test]
    fn variants_are_char_based() {
        assert_eq!(sorted(delete_variants("åø", 1, None)), vec!["å", "åø", "ø"]);
    }

    #[test]
    fn insert_and_remove() {
        let mut index = FuzzyIndex::new(2, None);
        let word = SmolStr::new("word");
        let world = SmolStr::new("world");
        index.insert(&word);
        index.insert(&world);

        assert_eq!(index.bucket("wrd"), &[word.clone(), world.clone()]);
        assert_eq!(index.bucket("wld"), &[world.clone()]);
        assert_eq!(index.max_word_length(), 5);

        index.remove("world");
        assert_eq!(index.bucket("wrd"), &[word]);
        assert!(index.bucket("wld").is_empty());
        assert_eq!(index.max_word_length(), 5);
    }
}
