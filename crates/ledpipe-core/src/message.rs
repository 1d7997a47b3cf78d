#![forbid(unsafe_code)]

//! Wire codec for status messages.
//!
//! A message is one textual line of four `|`-separated fields:
//!
//! ```text
//! text1|text2|r1,g1,b1|r2,g2,b2
//! ```
//!
//! Only `|` separates fields; text may contain commas or be empty. The
//! colors are decimal triples in `0..=255`. Parsing is all-or-nothing: a
//! rejected buffer yields no partial values.
//!
//! Message boundaries are whatever one bounded read captured. No
//! terminator is required, but a single trailing newline is dropped so
//! that line-oriented writers (`echo ... > fifo`) work unchanged.

use std::fmt;
use std::str::{FromStr, Utf8Error};

use crate::color::{ColorParseError, Rgb};

/// Upper bound on one message, in bytes. Reads are capped at this size.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Field separator.
pub const FIELD_SEPARATOR: char = '|';

const FIELD_COUNT: usize = 4;

/// A validated message, consumed once to update the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub text1: String,
    pub text2: String,
    pub color1: Rgb,
    pub color2: Rgb,
}

impl ParsedMessage {
    #[must_use]
    pub fn new(
        text1: impl Into<String>,
        text2: impl Into<String>,
        color1: Rgb,
        color2: Rgb,
    ) -> Self {
        Self {
            text1: text1.into(),
            text2: text2.into(),
            color1,
            color2,
        }
    }

    /// Serialize into the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if a text field contains the separator or the
    /// encoded form would not fit in one bounded read.
    pub fn encode(&self) -> Result<String, EncodeError> {
        for (index, text) in [&self.text1, &self.text2].into_iter().enumerate() {
            if text.contains(FIELD_SEPARATOR) {
                return Err(EncodeError::SeparatorInText { line: index + 1 });
            }
        }
        let encoded = self.to_string();
        if encoded.len() > MAX_MESSAGE_LEN {
            return Err(EncodeError::TooLong(encoded.len()));
        }
        Ok(encoded)
    }
}

/// Writes the wire form verbatim. Use [`ParsedMessage::encode`] when the
/// result must be guaranteed to re-parse.
impl fmt::Display for ParsedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.text1,
            self.text2,
            self.color1,
            self.color2,
            sep = FIELD_SEPARATOR
        )
    }
}

impl FromStr for ParsedMessage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = strip_line_ending(s);
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount(fields.len()));
        }

        let color1 = fields[2].parse::<Rgb>().map_err(|source| ParseError::Color {
            field: ColorField::Primary,
            source,
        })?;
        let color2 = fields[3].parse::<Rgb>().map_err(|source| ParseError::Color {
            field: ColorField::Secondary,
            source,
        })?;

        Ok(Self::new(fields[0], fields[1], color1, color2))
    }
}

/// Parse one raw read into a message.
///
/// # Errors
///
/// Returns [`ParseError`] if the bytes are not UTF-8, do not split into
/// exactly four fields, or either color field is malformed.
pub fn parse(raw: &[u8]) -> Result<ParsedMessage, ParseError> {
    let text = std::str::from_utf8(raw).map_err(ParseError::Encoding)?;
    text.parse()
}

fn strip_line_ending(s: &str) -> &str {
    match s.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => s,
    }
}

/// Which color field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorField {
    Primary,
    Secondary,
}

impl fmt::Display for ColorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("color1"),
            Self::Secondary => f.write_str("color2"),
        }
    }
}

/// A rejected message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer is not valid UTF-8.
    Encoding(Utf8Error),
    /// Number of `|`-separated fields found (4 required).
    FieldCount(usize),
    /// A color field is malformed.
    Color {
        field: ColorField,
        source: ColorParseError,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding(err) => write!(f, "message is not valid UTF-8: {err}"),
            Self::FieldCount(n) => {
                write!(f, "expected {FIELD_COUNT} '|'-separated fields, found {n}")
            }
            Self::Color { field, source } => write!(f, "invalid {field}: {source}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            Self::FieldCount(_) => None,
            Self::Color { source, .. } => Some(source),
        }
    }
}

/// A message that cannot be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Text of line 1 or 2 contains `|`.
    SeparatorInText { line: usize },
    /// Encoded length in bytes, over [`MAX_MESSAGE_LEN`].
    TooLong(usize),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeparatorInText { line } => {
                write!(f, "text{line} contains the field separator '{FIELD_SEPARATOR}'")
            }
            Self::TooLong(len) => write!(
                f,
                "encoded message is {len} bytes, limit is {MAX_MESSAGE_LEN}"
            ),
        }
    }
}

impl std::error::Error for EncodeError {}
