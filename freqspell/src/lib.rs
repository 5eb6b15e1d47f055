/*! Frequency-ranked spelling correction.

Suggests corrections for single words with a symmetric-delete index over
in-memory dictionaries, corrects multi-word queries (including wrongly split
and wrongly joined words, guided by word-pair frequencies), and segments text
written without spaces into its most probable words.

# Usage examples

```
use freqspell::speller::{AddOptions, LookupOptions, SpellModel, Speller, SuggestionLevel};
use freqspell::types::Entry;

let model = SpellModel::new();
model.add_entry(Entry::new("word", 100).with_data("type", "noun"), AddOptions::default()).unwrap();
model.add_entry(Entry::new("world", 1), AddOptions::default()).unwrap();

let best = model.clone().lookup("wortd", LookupOptions::default());
assert_eq!(best[0].word(), "word");
assert_eq!(best[0].word_data["type"], "noun");

let all = model.clone().lookup("wortd", LookupOptions::level(SuggestionLevel::All));
assert_eq!(all.len(), 2);
```

A command-line front end and a line-based JSON server live in
`freqspell-bin` in the same repository.
*/

mod archive;
pub mod dictionary;
pub mod error;
pub mod service;
pub mod speller;
pub mod tokenizer;
pub mod types;

pub(crate) mod constants;

pub use crate::constants::DEFAULT_DICTIONARY;
pub use crate::error::SpellError;
pub use crate::speller::{SpellModel, Speller};
