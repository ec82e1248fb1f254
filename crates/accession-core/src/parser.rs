//! # Parser
//!
//! Turns free-form input into accession number `Components`.
//!
//! Input is normalized first: ASCII letters are lowercased and every
//! character that is not `a-z` or `0-9` is dropped. The normalized string
//! must then begin with five alternating runs:
//!
//! ```text
//! <digits:year> <letters:type> <digits:year_count> <letters:collection> <digits:collection_count>
//! ```
//!
//! Anything after the fifth run is ignored.

use crate::{AccessionError, Components};

/// A successfully parsed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccession {
    pub components: Components,
    /// The input exactly as submitted (not trimmed).
    pub as_submitted: String,
}

impl ParsedAccession {
    #[must_use]
    pub fn canonical(&self) -> String {
        self.components.canonical()
    }
}

/// Character class of a run.
#[derive(Debug, Clone, Copy)]
enum Class {
    Digits,
    Letters,
}

impl Class {
    fn matches(self, byte: u8) -> bool {
        match self {
            Self::Digits => byte.is_ascii_digit(),
            Self::Letters => byte.is_ascii_lowercase(),
        }
    }
}

/// Cursor over a normalized string.
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    fn new(normalized: &'a str) -> Self {
        Self { rest: normalized }
    }

    /// Take the maximal non-empty run of `class`, or fail.
    fn take(&mut self, class: Class) -> Result<&'a str, AccessionError> {
        let len = self.rest.bytes().take_while(|b| class.matches(*b)).count();
        if len == 0 {
            return Err(AccessionError::Unparsable);
        }
        let (run, rest) = self.rest.split_at(len);
        self.rest = rest;
        Ok(run)
    }

    fn number(&mut self) -> Result<u64, AccessionError> {
        // Overflowing u64 is treated as malformed input.
        self.take(Class::Digits)?
            .parse()
            .map_err(|_| AccessionError::Unparsable)
    }

    fn code(&mut self) -> Result<String, AccessionError> {
        self.take(Class::Letters).map(str::to_string)
    }
}

/// Lowercase ASCII letters and keep only `a-z0-9`.
#[must_use]
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Parse a submitted accession number.
///
/// Returns `AccessionError::Unparsable` if the input does not match.
pub fn parse(input: &str) -> Result<ParsedAccession, AccessionError> {
    let normalized = normalize(input);
    let mut runs = Runs::new(&normalized);

    let year = runs.number()?;
    let record_type = runs.code()?;
    let year_count = runs.number()?;
    let collection = runs.code()?;
    let collection_count = runs.number()?;

    Ok(ParsedAccession {
        components: Components {
            year,
            record_type,
            year_count,
            collection,
            collection_count,
        },
        as_submitted: input.to_string(),
    })
}

// =============================================================================
// MINT ARGUMENT VALIDATION
// =============================================================================

/// Validate a type abbreviation or collection code for minting.
///
/// Surrounding whitespace is ignored and letters are lowercased; the
/// result must be a non-empty run of `a-z`.
pub fn parse_code(input: &str) -> Result<String, AccessionError> {
    let code = input.trim().to_ascii_lowercase();
    if code.is_empty() || !code.bytes().all(|b| Class::Letters.matches(b)) {
        return Err(AccessionError::Unparsable);
    }
    Ok(code)
}

/// Validate a year for minting: a non-empty run of ASCII digits.
pub fn parse_year(input: &str) -> Result<u64, AccessionError> {
    let year = input.trim();
    if year.is_empty() || !year.bytes().all(|b| Class::Digits.matches(b)) {
        return Err(AccessionError::Unparsable);
    }
    year.parse().map_err(|_| AccessionError::Unparsable)
}
