//! Formula tokenizer
//!
//! A single forward pass that splits formula text into typed tokens carrying
//! their byte spans. It recognizes just enough syntax to locate references:
//! string literals and bracketed text are opaque, and anything it does not
//! understand becomes an [`TokenKind::Unknown`] token. Tokenizing never fails.

use std::ops::Range;

use sheet_trace_core::{ColumnId, MAX_ROWS};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// String literal, quotes included
    Text,
    /// Sheet qualifier such as `Sheet1!` or `'Q1 Sales'!` (name unquoted)
    SheetPrefix(String),
    /// Cell reference such as `B2` or `$B$2` (1-based row)
    Cell { col: ColumnId, row: u32 },
    /// A word that is a column on its own (`B`, `$AB`, `ab`).
    ///
    /// `explicit` is set when the word is uppercase or carries a `$`.
    Column { col: ColumnId, explicit: bool },
    /// Identifier directly followed by `(`, uppercased
    Function(String),
    /// Any other identifier (defined names, TRUE/FALSE, ...)
    Name,
    /// Numeric literal
    Number(f64),
    /// Error literal (`#N/A`, `#REF!`)
    ErrorLiteral,
    /// Structured reference or external workbook text in `[...]`
    Bracketed,
    Colon,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    /// Arithmetic, comparison, concatenation or array braces
    Operator,
    Unknown,
}

/// A token and the byte range it covers in the formula
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    /// The source text of this token
    pub fn text<'a>(&self, formula: &'a str) -> &'a str {
        &formula[self.span.clone()]
    }
}

/// Split `formula` into tokens. A leading `=` is skipped.
pub fn tokenize(formula: &str) -> Vec<Token> {
    Tokenizer::new(formula).run()
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        self.skip_whitespace();
        if self.peek_char() == Some('=') {
            self.advance();
        }

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            let start = self.pos;
            let kind = self.scan_token();
            tokens.push(Token {
                kind,
                span: start..self.pos,
            });
        }

        tokens
    }

    // === Token scanning ===

    fn scan_token(&mut self) -> TokenKind {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return TokenKind::Unknown,
        };

        match c {
            ':' => {
                self.advance();
                return TokenKind::Colon;
            }
            ',' => {
                self.advance();
                return TokenKind::Comma;
            }
            ';' => {
                self.advance();
                return TokenKind::Semicolon;
            }
            '(' => {
                self.advance();
                return TokenKind::LeftParen;
            }
            ')' => {
                self.advance();
                return TokenKind::RightParen;
            }
            '+' | '-' | '*' | '/' | '^' | '%' | '&' | '=' | '<' | '>' | '{' | '}' => {
                self.advance();
                return TokenKind::Operator;
            }
            '"' => return self.scan_string(),
            '\'' => return self.scan_quoted_sheet(),
            '[' => return self.scan_bracketed(),
            '#' => return self.scan_error(),
            _ => {}
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        self.advance();
        TokenKind::Unknown
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // Skip opening quote

        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '"' {
                // Escaped quote ("")
                if self.peek_char() == Some('"') {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        TokenKind::Text
    }

    fn scan_quoted_sheet(&mut self) -> TokenKind {
        self.advance(); // Skip opening quote

        let mut name = String::new();
        let mut closed = false;
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '\'' {
                // Escaped quote ('')
                if self.peek_char() == Some('\'') {
                    name.push('\'');
                    self.advance();
                } else {
                    closed = true;
                    break;
                }
            } else {
                name.push(c);
            }
        }

        if closed && self.peek_char() == Some('!') {
            self.advance();
            return TokenKind::SheetPrefix(name);
        }
        TokenKind::Unknown
    }

    fn scan_bracketed(&mut self) -> TokenKind {
        let mut depth = 0usize;
        while let Some(c) = self.peek_char() {
            self.advance();
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        TokenKind::Bracketed
    }

    fn scan_error(&mut self) -> TokenKind {
        self.advance(); // Skip '#'
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?' || c == '_'
        }) {
            self.advance();
        }
        TokenKind::ErrorLiteral
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let digits_at = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self
                .peek_char_at(digits_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digits_at {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num: f64 = self.input[start..self.pos].parse().unwrap_or(0.0);
        TokenKind::Number(num)
    }

    fn scan_identifier_or_ref(&mut self) -> TokenKind {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Sheet qualifier (ends with !)
        if self.peek_char() == Some('!') {
            self.advance();
            return TokenKind::SheetPrefix(text.to_string());
        }

        // Function call, even when the name looks like a cell (LOG10)
        if self.peek_char() == Some('(') {
            let upper = text.to_ascii_uppercase();
            let name = upper.strip_prefix("_XLFN.").unwrap_or(&upper);
            return TokenKind::Function(name.to_string());
        }

        if let Some((col, row)) = parse_cell(text) {
            return TokenKind::Cell { col, row };
        }

        if let Some((col, explicit)) = parse_column(text) {
            return TokenKind::Column { col, explicit };
        }

        TokenKind::Name
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

/// Split `[$]letters[$]digits` into its column and 1-based row
fn parse_cell(text: &str) -> Option<(ColumnId, u32)> {
    let rest = text.strip_prefix('$').unwrap_or(text);
    let letters_end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (letters, rest) = rest.split_at(letters_end);
    let digits = rest.strip_prefix('$').unwrap_or(rest);

    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let col = ColumnId::parse(letters).ok()?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }
    Some((col, row))
}

/// Recognize `[$]letters` naming a valid column
fn parse_column(text: &str) -> Option<(ColumnId, bool)> {
    let (letters, anchored) = match text.strip_prefix('$') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let col = ColumnId::parse(letters).ok()?;
    let explicit = anchored || letters.bytes().all(|b| b.is_ascii_uppercase());
    Some((col, explicit))
}
