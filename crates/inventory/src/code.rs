//! Inventory code normalization and validation.
//!
//! Codes reach the system from scanners and from operators typing on a
//! keyboard, so they carry stray whitespace and the occasional garbage
//! character. A code is only used as a lookup key after it has been trimmed
//! ([`normalize`]) and checked against the whitelist ([`try_validate`]).
//!
//! Error messages are user-facing and are shown to operators verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;

use countops_core::{DomainError, ValueObject};

use crate::digits::project_digits;

/// Maximum length of a code, in characters (not bytes).
pub const MAX_CODE_LENGTH: usize = 64;

/// Symbols accepted in addition to letters, digits and whitespace.
pub const ALLOWED_SYMBOLS: [char; 6] = ['_', '-', '#', '°', '\'', '.'];

/// Validation failure for an inventory code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("Le code ne peut pas être vide.")]
    Empty,

    #[error(
        "Le code '{code}' dépasse la longueur maximale de {} caractères ({length} caractères).",
        MAX_CODE_LENGTH
    )]
    TooLong { code: String, length: usize },

    #[error(
        "Le code '{code}' contient des caractères non autorisés ('{offending}'). Seuls les lettres, les chiffres, les espaces et les symboles {} sont autorisés.",
        allowed_symbols_display()
    )]
    InvalidCharacters { code: String, offending: char },
}

impl From<CodeError> for DomainError {
    fn from(value: CodeError) -> Self {
        DomainError::validation(value.to_string())
    }
}

/// The symbol whitelist as shown to users, e.g. `_ - # ° ' .`.
pub fn allowed_symbols_display() -> String {
    let mut out = String::with_capacity(ALLOWED_SYMBOLS.len() * 3);
    for (idx, symbol) in ALLOWED_SYMBOLS.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push(*symbol);
    }
    out
}

/// Trim a raw code.
///
/// Returns `None` for empty or whitespace-only input. Internal whitespace is
/// preserved.
pub fn normalize(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Validate a code against the length limit and the character whitelist.
///
/// Validation does not normalize: callers that want trimming call
/// [`normalize`] first (or use [`InventoryCode::parse`]).
pub fn try_validate(code: &str) -> Result<(), CodeError> {
    if code.trim().is_empty() {
        return Err(CodeError::Empty);
    }

    let length = code.chars().count();
    if length > MAX_CODE_LENGTH {
        return Err(CodeError::TooLong {
            code: code.to_string(),
            length,
        });
    }

    if let Some(offending) = code.chars().find(|c| !is_allowed(*c)) {
        return Err(CodeError::InvalidCharacters {
            code: code.to_string(),
            offending,
        });
    }

    Ok(())
}

fn is_allowed(c: char) -> bool {
    is_letter(c) || c.is_ascii_digit() || c.is_whitespace() || ALLOWED_SYMBOLS.contains(&c)
}

/// Alphabetic, minus letter-like numerals (`Ⅷ`) and combining marks.
fn is_letter(c: char) -> bool {
    c.is_alphabetic() && !c.is_numeric() && !is_combining_mark(c)
}

/// A normalized, validated inventory code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InventoryCode {
    value: String,
    digits: Option<String>,
}

impl InventoryCode {
    /// Normalize then validate `raw`.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let value = normalize(raw).ok_or(CodeError::Empty)?;
        try_validate(value)?;
        Ok(Self {
            value: value.to_string(),
            digits: project_digits(value),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Digits-only projection, used for approximate matching.
    pub fn digits(&self) -> Option<&str> {
        self.digits.as_deref()
    }
}

impl ValueObject for InventoryCode {}

impl core::fmt::Display for InventoryCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.value)
    }
}

impl core::str::FromStr for InventoryCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InventoryCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InventoryCode> for String {
    fn from(value: InventoryCode) -> Self {
        value.value
    }
}
