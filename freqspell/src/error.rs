//! Engine errors.
use std::path::PathBuf;

use smol_str::SmolStr;

/// Errors returned by the fallible engine operations.
///
/// Lookups never fail; an empty result is the normal "no suggestion" outcome.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SpellError {
    /// Structurally invalid input, such as an empty word
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The word is absent from every targeted dictionary
    #[error("Word not found: '{0}'")]
    NotFound(SmolStr),

    /// The persisted model could not be parsed
    #[error("Corrupt model file '{}'", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The persisted model was written by an unknown format version
    #[error("Unsupported model version {0}")]
    UnsupportedVersion(u32),

    /// Underlying storage failed during save, load or import
    #[error("I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpellError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> SpellError {
        SpellError::Io {
            path: path.into(),
            source,
        }
    }
}
