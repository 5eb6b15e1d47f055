//! Request handler for a correction service.
use std::sync::Arc;

use language_tags::LanguageTag;
use serde::{Deserialize, Serialize};

use crate::speller::{LookupOptions, Speller};
use crate::tokenizer::normalize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub query: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResponse {
    /// Corrected text, empty when the query needs no correction
    pub result: String,
    pub is_corrected: bool,
    /// Frequency estimate of the corrected text
    pub probability: f64,
    pub language: String,
}

/// Normalises queries and answers them with the best compound correction.
pub struct Corrector {
    speller: Arc<dyn Speller + Send + Sync>,
    language: LanguageTag,
    options: LookupOptions,
}

impl Corrector {
    pub fn new(speller: Arc<dyn Speller + Send + Sync>, language: LanguageTag) -> Corrector {
        Corrector {
            speller,
            language,
            options: LookupOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LookupOptions) -> Corrector {
        self.options = options;
        self
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn correct(&self, request: &CorrectionRequest) -> CorrectionResponse {
        let query = normalize(&request.query);

        let best = if query.is_empty() {
            None
        } else {
            Arc::clone(&self.speller)
                .lookup_compound(&query, self.options.clone())
                .into_iter()
                .next()
        };

        match best {
            Some(suggestion) if suggestion.word() != query => {
                log::trace!("corrected {:?} -> {:?}", query, suggestion.word());
                CorrectionResponse {
                    result: suggestion.word().to_string(),
                    is_corrected: true,
                    probability: suggestion.frequency() as f64,
                    language: self.language.to_string(),
                }
            }
            Some(suggestion) => CorrectionResponse {
                result: String::new(),
                is_corrected: false,
                probability: suggestion.frequency() as f64,
                language: self.language.to_string(),
            },
            None => CorrectionResponse {
                result: String::new(),
                is_corrected: false,
                probability: 0.0,
                language: self.language.to_string(),
            },
        }
    }
}
