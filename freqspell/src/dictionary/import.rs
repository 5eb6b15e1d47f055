//! Newline-delimited word and bigram lists.
//!
//! A line is either a JSON record (`{"word": "near", "frequency": 120}`,
//! capitalised keys accepted) or plain text: `word [count]` for words and
//! `first second [count]` for bigrams. Blank lines and `#` comments are
//! ignored, malformed lines are skipped with a warning.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::SpellError;
use crate::types::{BigramEntry, Entry, Frequency};

pub fn parse_entry_line(line: &str) -> Option<Entry> {
    let line = line.trim();

    let entry = if line.starts_with('{') {
        serde_json::from_str::<Entry>(line).ok()?
    } else {
        let mut parts = line.split_whitespace();
        let word = parts.next()?;
        let frequency = match parts.next() {
            Some(count) => count.parse::<Frequency>().ok()?,
            None => 1,
        };

        if parts.next().is_some() {
            return None;
        }

        Entry::new(word, frequency)
    };

    if entry.word.is_empty() {
        return None;
    }

    Some(entry)
}

pub fn parse_bigram_line(line: &str) -> Option<BigramEntry> {
    let line = line.trim();

    if line.starts_with('{') {
        let entry = serde_json::from_str::<Entry>(line).ok()?;
        return BigramEntry::from_joined(&entry.word, entry.frequency);
    }

    let parts = line.split_whitespace().collect::<Vec<_>>();
    match parts.as_slice() {
        [first, second] => Some(BigramEntry::new(*first, *second, 1)),
        [first, second, count] => count
            .parse::<Frequency>()
            .ok()
            .map(|frequency| BigramEntry::new(*first, *second, frequency)),
        _ => None,
    }
}

pub fn read_entries<R: BufRead>(reader: R) -> std::io::Result<Vec<Entry>> {
    read_records(reader, parse_entry_line)
}

pub fn read_bigrams<R: BufRead>(reader: R) -> std::io::Result<Vec<BigramEntry>> {
    read_records(reader, parse_bigram_line)
}

pub(crate) fn open(path: &Path) -> Result<BufReader<File>, SpellError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| SpellError::io(path, e))
}

fn read_records<R, T, F>(reader: R, parse: F) -> std::io::Result<Vec<T>>
where
    R: BufRead,
    F: Fn(&str) -> Option<T>,
{
    let mut records = vec![];
    let mut skipped = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                log::warn!("line {}: not valid UTF-8, skipping", number + 1);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse(trimmed) {
            Some(record) => records.push(record),
            None => {
                log::warn!("line {}: malformed record {:?}, skipping", number + 1, trimmed);
                skipped += 1;
            }
        }
    }

    log::debug!("read {} records, skipped {}", records.len(), skipped);
    Ok(records)
}
