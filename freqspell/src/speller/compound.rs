//! Multi-word correction.
//!
//! The query is split on whitespace and rebuilt left to right from units,
//! each covering one or two tokens:
//!
//! * a token replaced by one of its closest corrections,
//! * two tokens merged into one word (`"wor d"` -> `"word"`),
//! * one token split into two words (`"helloworld"` -> `"hello world"`),
//! * two tokens with their boundary moved (`"hellow orld"` -> `"hello world"`).
//!
//! Units are chained with a Viterbi pass keyed on the last emitted word, so
//! bigram plausibility between neighbours can be scored exactly. Paths are
//! compared by total edit cost first and by summed log probability second.
use std::ops::Range;

use hashbrown::HashMap;
use smol_str::SmolStr;

use super::worker::LookupWorker;
use crate::speller::suggestion::Suggestion;
use crate::tokenizer::Tokenize;
use crate::types::Distance;

const SCORE_EPSILON: f64 = 1e-9;

struct Token<'q> {
    text: &'q str,
    span: Range<usize>,
}

/// One way of covering `tokens` with one or two words.
#[derive(Clone, Debug)]
struct Unit {
    tokens: Range<usize>,
    words: Vec<Suggestion>,
    cost: Distance,
    log_prob: f64,
}

#[derive(Clone, Debug)]
struct Path {
    cost: Distance,
    log_prob: f64,
    units: Vec<Unit>,
}

impl Path {
    fn words(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .flat_map(|u| u.words.iter().map(|w| w.word.as_str()))
    }

    fn word_count(&self) -> usize {
        self.units.iter().map(|u| u.words.len()).sum()
    }

    fn is_better_than(&self, other: &Path) -> bool {
        if self.cost != other.cost {
            return self.cost < other.cost;
        }

        if (self.log_prob - other.log_prob).abs() > SCORE_EPSILON {
            return self.log_prob > other.log_prob;
        }

        if self.word_count() != other.word_count() {
            return self.word_count() < other.word_count();
        }

        self.words().lt(other.words())
    }
}

pub(crate) fn lookup_compound(worker: &LookupWorker, query: &str) -> Vec<Suggestion> {
    let tokens = query
        .whitespace_tokens()
        .map(|(offset, text)| Token {
            text,
            span: offset..offset + text.len(),
        })
        .collect::<Vec<_>>();

    if tokens.is_empty() {
        return vec![];
    }

    let mut states: Vec<HashMap<Option<SmolStr>, Path>> = vec![HashMap::new(); tokens.len() + 1];
    states[0].insert(
        None,
        Path {
            cost: 0,
            log_prob: 0.0,
            units: vec![],
        },
    );

    for position in 0..tokens.len() {
        let units = units_at(worker, &tokens, position);
        let current = std::mem::take(&mut states[position]);

        for (last, path) in current.iter() {
            for unit in units.iter() {
                let first_word = unit.words[0].word.as_str();
                let link = last
                    .as_ref()
                    .map(|last| worker.plausibility(last, first_word))
                    .unwrap_or(0.0);

                let mut units = path.units.clone();
                units.push(unit.clone());
                let candidate = Path {
                    cost: path.cost + unit.cost,
                    log_prob: path.log_prob + unit.log_prob + link,
                    units,
                };

                let key = unit.words.last().map(|w| w.word.clone());
                let slot = &mut states[unit.tokens.end];
                match slot.get(&key) {
                    Some(existing) if !candidate.is_better_than(existing) => {}
                    _ => {
                        slot.insert(key, candidate);
                    }
                }
            }
        }
    }

    let best = states[tokens.len()]
        .values()
        .fold(None::<&Path>, |best, path| match best {
            Some(best) if !path.is_better_than(best) => Some(best),
            _ => Some(path),
        });

    match best {
        Some(path) => vec![assemble(worker, query, &tokens, path)],
        None => vec![],
    }
}

/// All units that start at `position`.
fn units_at(worker: &LookupWorker, tokens: &[Token], position: usize) -> Vec<Unit> {
    let token = &tokens[position];
    let max_distance = worker.max_distance();
    let mut units = vec![];

    let mut closest = worker.candidates(&worker.fold(token.text));
    if let Some(min) = closest.first().map(|s| s.distance) {
        closest.retain(|s| s.distance == min);
    }
    closest.truncate(worker.config().compound_candidates.max(1));

    let is_exact = closest.first().map(|s| s.distance == 0).unwrap_or(false);

    if closest.is_empty() {
        let len = token.text.chars().count();
        let mut unknown = Suggestion::new(token.text.into(), max_distance + 1, 0);
        unknown.span = Some(token.span.clone());
        units.push(Unit {
            tokens: position..position + 1,
            words: vec![unknown],
            cost: max_distance + 1,
            log_prob: worker.unknown_log_prob(len),
        });
    }

    for mut suggestion in closest {
        suggestion.span = Some(token.span.clone());
        units.push(Unit {
            tokens: position..position + 1,
            cost: suggestion.distance,
            log_prob: worker.log_prob(suggestion.frequency),
            words: vec![suggestion],
        });
    }

    if !is_exact {
        if let Some(unit) = best_split(worker, &[token], position) {
            units.push(unit);
        }
    }

    if let Some(next) = tokens.get(position + 1) {
        let joined = [token.text, next.text].concat();

        if let Some(mut merged) = worker.best(&worker.fold(&joined)) {
            merged.span = Some(token.span.start..next.span.end);
            units.push(Unit {
                tokens: position..position + 2,
                cost: merged.distance + 1,
                log_prob: worker.log_prob(merged.frequency),
                words: vec![merged],
            });
        }

        let next_is_exact = worker.contains(&worker.fold(next.text));
        if !(is_exact && next_is_exact) {
            if let Some(unit) = best_split(worker, &[token, next], position) {
                units.push(unit);
            }
        }
    }

    units
}

/// Best two-word reading of one token (a split) or of two tokens whose
/// boundary sits elsewhere (a shift). Moving an existing boundary by one
/// character costs a transposition; further moves cost a delete and an
/// insert.
fn best_split(worker: &LookupWorker, tokens: &[&Token], position: usize) -> Option<Unit> {
    // (byte offset in the query, char) of every character covered
    let chars = tokens
        .iter()
        .flat_map(|t| t.text.char_indices().map(move |(i, c)| (t.span.start + i, c)))
        .collect::<Vec<_>>();

    let boundary = tokens.get(1).map(|_| tokens[0].text.chars().count());
    let end = tokens[tokens.len() - 1].span.end;
    let mut best: Option<Unit> = None;

    for j in 1..chars.len() {
        let boundary_cost = match boundary {
            None => 1,
            Some(b) if b == j => continue,
            Some(b) => (b.max(j) - b.min(j)).min(2),
        };

        let left = chars[..j].iter().map(|(_, c)| c).collect::<String>();
        let right = chars[j..].iter().map(|(_, c)| c).collect::<String>();

        let (mut first, mut second) =
            match (worker.best(&worker.fold(&left)), worker.best(&worker.fold(&right))) {
                (Some(first), Some(second)) => (first, second),
                _ => continue,
            };

        let (last_offset, last_char) = chars[j - 1];
        first.span = Some(chars[0].0..last_offset + last_char.len_utf8());
        second.span = Some(chars[j].0..end);

        let unit = Unit {
            tokens: position..position + tokens.len(),
            cost: first.distance + second.distance + boundary_cost,
            log_prob: worker.log_prob(first.frequency)
                + worker.log_prob(second.frequency)
                + worker.plausibility(&first.word, &second.word),
            words: vec![first, second],
        };

        let replace = match &best {
            None => true,
            Some(current) => {
                unit.cost < current.cost
                    || (unit.cost == current.cost && unit.log_prob > current.log_prob + SCORE_EPSILON)
            }
        };

        if replace {
            best = Some(unit);
        }
    }

    best
}

fn assemble(worker: &LookupWorker, query: &str, tokens: &[Token], path: &Path) -> Suggestion {
    let mut text = String::new();
    let mut parts = vec![];
    let mut probability = worker.corpus_size();

    for (i, unit) in path.units.iter().enumerate() {
        if i > 0 {
            let previous = &tokens[unit.tokens.start - 1];
            text.push_str(&query[previous.span.end..tokens[unit.tokens.start].span.start]);
        }

        for (k, word) in unit.words.iter().enumerate() {
            if k > 0 {
                // A shift keeps the original separator; a split inserts a space.
                if unit.tokens.len() == 2 {
                    let first = &tokens[unit.tokens.start];
                    let second = &tokens[unit.tokens.start + 1];
                    text.push_str(&query[first.span.end..second.span.start]);
                } else {
                    text.push(' ');
                }
            }

            let mut part = word.clone();
            if let Some(span) = &word.span {
                part.word = worker.restore_case(&query[span.clone()], &word.word);
            }

            text.push_str(&part.word);
            probability *= word.frequency as f64 / worker.corpus_size();
            parts.push(part);
        }
    }

    let start = tokens[0].span.start;
    let end = tokens[tokens.len() - 1].span.end;
    let original = &query[start..end];

    let mut suggestion = Suggestion::new(
        SmolStr::from(text.as_str()),
        strsim::damerau_levenshtein(&worker.fold(original), &worker.fold(&text)),
        probability.round() as u64,
    );
    suggestion.span = Some(start..end);
    suggestion.parts = parts;

    log::trace!(
        "compound {:?} -> {:?} (cost {}, log prob {:.3})",
        original,
        suggestion.word,
        path.cost,
        path.log_prob
    );

    suggestion
}
