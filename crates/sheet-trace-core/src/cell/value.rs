//! Cell value types

use std::fmt;

/// Leading character that marks a cell's text as a formula
pub const FORMULA_MARKER: char = '=';

/// Represents the raw content stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value (all numbers stored as f64, including dates)
    Number(f64),

    /// String value
    String(String),

    /// Error value (#VALUE!, #REF!, etc.), kept as its display text
    Error(String),

    /// Formula text, including the leading `=`
    Formula(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Create a new formula value, adding the leading `=` if missing
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        if text.starts_with(FORMULA_MARKER) {
            CellValue::Formula(text)
        } else {
            CellValue::Formula(format!("{}{}", FORMULA_MARKER, text))
        }
    }

    /// Check if the cell is empty
    ///
    /// A string of only whitespace counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Check if the cell holds a formula
    ///
    /// Text beginning with `=` counts too: delimited-text sources store
    /// formulas as plain strings.
    pub fn is_formula(&self) -> bool {
        self.formula_text().is_some()
    }

    /// Get the formula text (with its leading `=`) if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula(text) => Some(text),
            CellValue::String(s) if s.starts_with(FORMULA_MARKER) => Some(s),
            _ => None,
        }
    }

    /// Convert a non-empty, non-formula value into a [`Scalar`]
    pub fn as_scalar(&self) -> Option<Scalar> {
        if self.is_empty() || self.is_formula() {
            return None;
        }
        match self {
            CellValue::Boolean(b) => Some(Scalar::Boolean(*b)),
            CellValue::Number(n) => Some(Scalar::Number(*n)),
            CellValue::String(s) => Some(Scalar::Text(s.clone())),
            CellValue::Error(e) => Some(Scalar::Error(e.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
            CellValue::Error(e) => f.write_str(e),
            CellValue::Formula(text) => f.write_str(text),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

/// A plain value sitting in a column's analysis row
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Scalar {
    /// TRUE/FALSE
    Boolean(bool),
    /// Number
    Number(f64),
    /// Text
    Text(String),
    /// Error literal such as `#N/A`
    Error(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) | Scalar::Error(s) => f.write_str(s),
        }
    }
}
