//! Query tokenization and normalization.
use unic_ucd_category::GeneralCategory;

pub mod case_handling;

/// Byte offset and text of each whitespace-delimited token.
pub struct WhitespaceTokens<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Iterator for WhitespaceTokens<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.offset..];
        let start = self.offset + rest.find(|c: char| !c.is_whitespace())?;
        let len = self.source[start..]
            .find(char::is_whitespace)
            .unwrap_or(self.source.len() - start);

        self.offset = start + len;
        Some((start, &self.source[start..start + len]))
    }
}

pub trait Tokenize {
    fn whitespace_tokens(&self) -> WhitespaceTokens<'_>;
}

impl Tokenize for str {
    fn whitespace_tokens(&self) -> WhitespaceTokens<'_> {
        WhitespaceTokens {
            source: self,
            offset: 0,
        }
    }
}

/// Keeps letters, numbers and whitespace, lower-cases, and collapses runs of
/// whitespace into a single space.
pub fn normalize(text: &str) -> String {
    let kept = text
        .chars()
        .filter(|&c| {
            let category = GeneralCategory::of(c);
            c.is_whitespace() || category.is_letter() || category.is_number()
        })
        .collect::<String>();

    kept.whitespace_tokens()
        .map(|(_, token)| case_handling::lower_case(token))
        .collect::<Vec<_>>()
        .join(" ")
}
