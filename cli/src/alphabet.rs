//! Symbol alphabets
//!
//! An alphabet maps each symbol of an application's random output to its
//! position, so "0123456789abcdef" turns the text "c0ffee" into
//! `[12, 0, 15, 15, 14, 14]` and implies a limit of 16.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("The alphabet is empty")]
    Empty,

    #[error("The alphabet contains '{0}' more than once")]
    DuplicateSymbol(char),

    #[error("The input contains '{0}', which is not in the alphabet")]
    UnknownSymbol(char),

    #[error("Value {0} has no symbol in the alphabet")]
    ValueOutOfRange(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    pub fn new(text: &str) -> Result<Self, AlphabetError> {
        let symbols: Vec<char> = text.chars().collect();
        if symbols.is_empty() {
            return Err(AlphabetError::Empty);
        }
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[i + 1..].contains(symbol) {
                return Err(AlphabetError::DuplicateSymbol(*symbol));
            }
        }
        Ok(Self { symbols })
    }

    /// Number of symbols, used as the bounded-output limit
    pub fn len(&self) -> u64 {
        self.symbols.len() as u64
    }

    /// Positions of each symbol of `text`
    ///
    /// Whitespace that is not itself part of the alphabet is skipped.
    pub fn decode(&self, text: &str) -> Result<Vec<u64>, AlphabetError> {
        let mut values = Vec::with_capacity(text.len());
        for symbol in text.chars() {
            match self.symbols.iter().position(|&s| s == symbol) {
                Some(index) => values.push(index as u64),
                None if symbol.is_whitespace() => continue,
                None => return Err(AlphabetError::UnknownSymbol(symbol)),
            }
        }
        Ok(values)
    }

    pub fn encode(&self, values: &[u64]) -> Result<String, AlphabetError> {
        values
            .iter()
            .map(|&value| {
                usize::try_from(value)
                    .ok()
                    .and_then(|index| self.symbols.get(index).copied())
                    .ok_or(AlphabetError::ValueOutOfRange(value))
            })
            .collect()
    }
}
