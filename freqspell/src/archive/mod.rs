//! Saved models.
//!
//! A model is stored as one JSON document holding the configuration and, per
//! dictionary, its words and word pairs sorted for stable output. The fuzzy
//! index is not stored; it is a function of the words and the configuration
//! and is rebuilt on load.
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::constants::ARCHIVE_VERSION;
use crate::dictionary::Dictionary;
use crate::error::SpellError;
use crate::speller::{SpellerConfig, Store};
use crate::types::{BigramEntry, Entry};

#[derive(Serialize, Deserialize)]
struct ModelFile {
    version: u32,
    config: SpellerConfig,
    dictionaries: Vec<DictionaryRecord>,
}

#[derive(Serialize, Deserialize)]
struct DictionaryRecord {
    name: SmolStr,
    entries: Vec<Entry>,
    #[serde(default)]
    bigrams: Vec<BigramEntry>,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl DictionaryRecord {
    fn from_dictionary(dictionary: &Dictionary) -> DictionaryRecord {
        let mut entries = dictionary.entries().cloned().collect::<Vec<_>>();
        entries.sort_by(|a, b| a.word.cmp(&b.word));

        let mut bigrams = dictionary.bigrams().collect::<Vec<_>>();
        bigrams.sort_by(|a, b| (&a.first, &a.second).cmp(&(&b.first, &b.second)));

        DictionaryRecord {
            name: SmolStr::from(dictionary.name()),
            entries,
            bigrams,
        }
    }
}

/// Writes the model next to `path` and renames it into place, so readers of
/// `path` see either the previous file or the complete new one.
pub(crate) fn write_model(
    path: &Path,
    config: &SpellerConfig,
    dictionaries: &[&Dictionary],
) -> Result<(), SpellError> {
    let mut dictionaries = dictionaries
        .iter()
        .map(|d| DictionaryRecord::from_dictionary(d))
        .collect::<Vec<_>>();
    dictionaries.sort_by(|a, b| a.name.cmp(&b.name));

    let model = ModelFile {
        version: ARCHIVE_VERSION,
        config: config.clone(),
        dictionaries,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let file = tempfile::NamedTempFile::new_in(dir).map_err(|e| SpellError::io(path, e))?;
    {
        let mut writer = BufWriter::new(file.as_file());
        serde_json::to_writer(&mut writer, &model).map_err(|e| SpellError::io(path, e.into()))?;
        writer.flush().map_err(|e| SpellError::io(path, e))?;
    }
    file.as_file().sync_all().map_err(|e| SpellError::io(path, e))?;
    file.persist(path).map_err(|e| SpellError::io(path, e.error))?;

    log::debug!(
        "Saved {} dictionaries to {}",
        model.dictionaries.len(),
        path.display()
    );

    Ok(())
}

/// Reads a saved model into a fresh store. Nothing is shared with any live
/// model until the caller swaps the result in.
pub(crate) fn read_model(path: &Path) -> Result<Store, SpellError> {
    let data = fs::read_to_string(path).map_err(|e| SpellError::io(path, e))?;

    let corrupt = |source| SpellError::Corrupt {
        path: path.to_path_buf(),
        source,
    };

    let header: VersionHeader = serde_json::from_str(&data).map_err(corrupt)?;
    if header.version != ARCHIVE_VERSION {
        return Err(SpellError::UnsupportedVersion(header.version));
    }

    let model: ModelFile = serde_json::from_str(&data).map_err(corrupt)?;

    log::debug!(
        "Loading {} dictionaries from {}",
        model.dictionaries.len(),
        path.display()
    );

    let parts = model
        .dictionaries
        .into_iter()
        .map(|d| (d.name, d.entries, d.bigrams));

    Ok(Store::from_parts(model.config, parts))
}
