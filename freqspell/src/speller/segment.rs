//! Word segmentation of text without reliable word boundaries.
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::worker::LookupWorker;
use crate::speller::suggestion::Suggestion;
use crate::types::Distance;

const SCORE_EPSILON: f64 = 1e-9;

/// The most probable decomposition of a text into words.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// the input split at the chosen boundaries
    pub segmented: String,
    /// the corrected words joined with single spaces
    pub corrected: String,
    /// the corrected words, with distances and input spans
    pub tokens: Vec<Suggestion>,
    /// summed edit distance; unknown parts count their own length
    pub distance_sum: Distance,
    /// summed log10 word probabilities
    pub log_prob_sum: f64,
}

impl Composition {
    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.word()).collect()
    }
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.corrected)
    }
}

#[derive(Clone, Debug)]
struct Cell {
    distance: Distance,
    log_prob: f64,
    count: usize,
    previous: usize,
    part: String,
    token: Option<Suggestion>,
}

impl Cell {
    fn is_better_than(&self, other: &Cell) -> bool {
        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        if (self.log_prob - other.log_prob).abs() > SCORE_EPSILON {
            return self.log_prob > other.log_prob;
        }

        self.count < other.count
    }
}

/// Dynamic programme over start positions. `best[i]` holds the best
/// decomposition of the first `i` characters; every part up to the maximum
/// token length is looked up and extends it. Whitespace in the input is
/// ignored.
pub(crate) fn segment(worker: &LookupWorker, text: &str) -> Composition {
    let chars = text
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .collect::<Vec<_>>();

    if chars.is_empty() {
        return Composition::default();
    }

    let max_len = worker
        .config()
        .max_segment_token_length
        .unwrap_or_else(|| worker.max_word_length() + worker.max_distance())
        .max(1);

    let mut best: Vec<Option<Cell>> = vec![None; chars.len() + 1];
    best[0] = Some(Cell {
        distance: 0,
        log_prob: 0.0,
        count: 0,
        previous: 0,
        part: String::new(),
        token: None,
    });

    for start in 0..chars.len() {
        let (distance, log_prob, count) = match &best[start] {
            Some(cell) => (cell.distance, cell.log_prob, cell.count),
            None => continue,
        };

        for len in 1..=max_len.min(chars.len() - start) {
            let end = start + len;
            let part = chars[start..end].iter().map(|(_, c)| c).collect::<String>();
            let (last_offset, last_char) = chars[end - 1];
            let span = chars[start].0..last_offset + last_char.len_utf8();

            let (mut token, part_distance, part_log_prob) =
                match worker.best(&worker.fold(&part)) {
                    Some(found) => {
                        let distance = found.distance;
                        let log_prob = worker.log_prob(found.frequency);
                        (found, distance, log_prob)
                    }
                    None => (
                        Suggestion::new(SmolStr::from(part.as_str()), len, 0),
                        len,
                        worker.unknown_log_prob(len),
                    ),
                };
            token.span = Some(span);

            let candidate = Cell {
                distance: distance + part_distance,
                log_prob: log_prob + part_log_prob,
                count: count + 1,
                previous: start,
                part,
                token: Some(token),
            };

            let replace = match &best[end] {
                Some(existing) => candidate.is_better_than(existing),
                None => true,
            };

            if replace {
                best[end] = Some(candidate);
            }
        }
    }

    let (distance_sum, log_prob_sum) = match &best[chars.len()] {
        Some(cell) => (cell.distance, cell.log_prob),
        None => return Composition::default(),
    };

    let mut tokens = vec![];
    let mut parts = vec![];
    let mut position = chars.len();

    while position > 0 {
        let cell = match best[position].take() {
            Some(cell) => cell,
            None => break,
        };

        position = cell.previous;
        if let Some(mut token) = cell.token {
            token.word = worker.restore_case(&cell.part, &token.word);
            tokens.push(token);
        }
        parts.push(cell.part);
    }

    tokens.reverse();
    parts.reverse();

    Composition {
        segmented: parts.join(" "),
        corrected: tokens.iter().map(|t| t.word.as_str()).collect::<Vec<_>>().join(" "),
        tokens,
        distance_sum,
        log_prob_sum,
    }
}
