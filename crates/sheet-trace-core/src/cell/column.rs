//! Column identifier type

use crate::error::{Error, Result};
use crate::MAX_COLS;
use std::fmt;
use std::str::FromStr;

/// A spreadsheet column (e.g., "A", "$AB"), independent of any row.
///
/// Stored as a 0-based index (A=0, B=1, ..., XFD=16383). Parsing strips the
/// absolute marker (`$`) and is case-insensitive, so `$ab` and `AB` are the
/// same column. The display form is always the uppercase letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(u16);

impl ColumnId {
    /// Create from a 0-based column index
    pub fn new(index: u16) -> Result<Self> {
        if index >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(index as u32, MAX_COLS - 1));
        }
        Ok(Self(index))
    }

    /// Create from a 1-based column number (A = 1)
    pub fn from_number(number: u32) -> Result<Self> {
        if number == 0 || number > MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(number, MAX_COLS));
        }
        Ok(Self((number - 1) as u16))
    }

    /// Parse column letters, ignoring `$` markers and case
    ///
    /// # Examples
    /// ```
    /// use sheet_trace_core::ColumnId;
    ///
    /// let col = ColumnId::parse("$ab").unwrap();
    /// assert_eq!(col.index(), 27);
    /// assert_eq!(col.number(), 28);
    /// assert_eq!(col.to_string(), "AB");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let letters = s.trim().trim_start_matches('$');
        Self::letters_to_column(letters).map(Self)
    }

    /// 0-based column index
    pub fn index(self) -> u16 {
        self.0
    }

    /// 1-based column number
    pub fn number(self) -> u32 {
        self.0 as u32 + 1
    }

    /// Uppercase column letters
    pub fn letters(self) -> String {
        Self::column_to_letters(self.0)
    }

    /// Inclusive range of columns from `self` to `end`.
    ///
    /// Returns `None` when the range is reversed (`C:A`).
    pub fn span_to(self, end: ColumnId) -> Option<Vec<ColumnId>> {
        if end.0 < self.0 {
            return None;
        }
        Some((self.0..=end.0).map(ColumnId).collect())
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1; // 1-based for calculation

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }
        if letters.len() > 3 {
            return Err(Error::InvalidAddress(format!(
                "too many column letters in '{}'",
                letters
            )));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        let col = col - 1; // Convert to 0-based

        if col >= MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }

        Ok(col as u16)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl FromStr for ColumnId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ColumnId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.letters())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ColumnId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let letters = String::deserialize(deserializer)?;
        ColumnId::parse(&letters).map_err(serde::de::Error::custom)
    }
}
