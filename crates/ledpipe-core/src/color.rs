#![forbid(unsafe_code)]

//! RGB color triple and its `r,g,b` textual form.

use std::fmt;
use std::str::FromStr;

/// RGB color (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel (0–255).
    pub r: u8,
    /// Green channel (0–255).
    pub g: u8,
    /// Blue channel (0–255).
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a new RGB color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Parses the `r,g,b` form.
///
/// Exactly three comma-separated decimal components are required, each in
/// `0..=255`. ASCII whitespace around a component is ignored.
impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(ColorParseError::WrongArity(parts.len()));
        }
        let component = |raw: &str| -> Result<u8, ColorParseError> {
            let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ColorParseError::InvalidComponent(raw.to_string()));
            }
            trimmed
                .parse::<u8>()
                .map_err(|_| ColorParseError::InvalidComponent(raw.to_string()))
        };
        Ok(Self::new(
            component(parts[0])?,
            component(parts[1])?,
            component(parts[2])?,
        ))
    }
}

/// A color field that is not exactly three integers in `0..=255`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Number of comma-separated components found.
    WrongArity(usize),
    /// A component that is not a decimal integer in range.
    InvalidComponent(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongArity(n) => write!(f, "expected 3 color components, found {n}"),
            Self::InvalidComponent(raw) => {
                write!(f, "color component {raw:?} is not an integer in 0..=255")
            }
        }
    }
}

impl std::error::Error for ColorParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_triple() {
        assert_eq!("255,0,128".parse::<Rgb>(), Ok(Rgb::new(255, 0, 128)));
    }

    #[test]
    fn tolerates_whitespace_and_trailing_newline_in_component() {
        assert_eq!(" 1, 2 ,3\n".parse::<Rgb>(), Ok(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert_eq!("1,2".parse::<Rgb>(), Err(ColorParseError::WrongArity(2)));
        assert_eq!(
            "1,2,3,4".parse::<Rgb>(),
            Err(ColorParseError::WrongArity(4))
        );
    }

    #[test]
    fn rejects_out_of_range_and_non_numeric() {
        assert!("300,0,0".parse::<Rgb>().is_err());
        assert!("a,b,c".parse::<Rgb>().is_err());
        assert!("-1,0,0".parse::<Rgb>().is_err());
        assert!("+1,0,0".parse::<Rgb>().is_err());
        assert!(",0,0".parse::<Rgb>().is_err());
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Rgb::new(40, 170, 5).to_string(), "40,170,5");
        assert_eq!(Rgb::WHITE.to_string().parse::<Rgb>(), Ok(Rgb::WHITE));
    }
}
