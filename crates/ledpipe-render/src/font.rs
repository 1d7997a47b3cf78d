#![forbid(unsafe_code)]

//! BDF bitmap font loading.
//!
//! Only the subset needed to draw text is read: the font bounding box and,
//! per glyph, `ENCODING`, `DWIDTH`, `BBX` and the `BITMAP` rows. Properties
//! and unencoded glyphs (`ENCODING -1`) are skipped.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::SplitAsciiWhitespace;

use ledpipe_core::document::LineMetrics;

/// One glyph bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// Horizontal pen advance.
    pub advance: i32,
    pub width: u32,
    pub height: u32,
    /// Offset of the bitmap's left edge from the pen position.
    pub x_offset: i32,
    /// Offset of the bitmap's bottom edge above the baseline.
    pub y_offset: i32,
    rows: Vec<Vec<u8>>,
}

impl Glyph {
    /// Whether the bit at (`x`, `y`) is set; `y` counts down from the top row.
    #[must_use]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.rows
            .get(y as usize)
            .and_then(|row| row.get((x / 8) as usize))
            .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0)
    }
}

/// A parsed BDF font.
#[derive(Debug, Clone)]
pub struct Font {
    height: i32,
    baseline: i32,
    default_advance: i32,
    glyphs: HashMap<char, Glyph>,
}

impl Font {
    /// Load a BDF file.
    ///
    /// # Errors
    ///
    /// Returns [`FontError`] if the file cannot be read or is not a usable
    /// BDF font.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Self::parse(&source)?;
        tracing::info!(
            path = %path.display(),
            glyphs = font.glyphs.len(),
            height = font.height,
            baseline = font.baseline,
            "loaded font"
        );
        Ok(font)
    }

    /// Parse BDF source text.
    ///
    /// # Errors
    ///
    /// Returns [`FontError`] on malformed statements or a missing
    /// `FONTBOUNDINGBOX`.
    pub fn parse(source: &str) -> Result<Self, FontError> {
        let mut bounding_box: Option<[i32; 4]> = None;
        let mut glyphs = HashMap::new();
        let mut current: Option<GlyphBuilder> = None;

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            let mut words = line.split_ascii_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };

            if let Some(glyph) = current.as_mut() {
                if glyph.in_bitmap && keyword != "ENDCHAR" {
                    glyph.rows.push(parse_hex_row(keyword, line_no)?);
                    continue;
                }
                match keyword {
                    "ENCODING" => {
                        let [code] = numbers::<1>(words, line_no, keyword)?;
                        glyph.encoding = u32::try_from(code).ok().and_then(char::from_u32);
                    }
                    "DWIDTH" => {
                        let [dx] = numbers::<1>(words, line_no, keyword)?;
                        glyph.advance = Some(dx);
                    }
                    "BBX" => glyph.bbx = Some(numbers::<4>(words, line_no, keyword)?),
                    "BITMAP" => glyph.in_bitmap = true,
                    "ENDCHAR" => {
                        let builder = current.take().unwrap_or_default();
                        if let Some((ch, glyph)) = builder.finish(line_no)? {
                            glyphs.insert(ch, glyph);
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match keyword {
                "FONTBOUNDINGBOX" => bounding_box = Some(numbers::<4>(words, line_no, keyword)?),
                "STARTCHAR" => current = Some(GlyphBuilder::default()),
                _ => {}
            }
        }

        if current.is_some() {
            return Err(FontError::Missing("ENDCHAR"));
        }
        let [bbx_width, bbx_height, _, bbx_y_offset] =
            bounding_box.ok_or(FontError::Missing("FONTBOUNDINGBOX"))?;

        Ok(Self {
            height: bbx_height,
            baseline: bbx_height.saturating_add(bbx_y_offset),
            default_advance: bbx_width,
            glyphs,
        })
    }

    /// Line height in pixels.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Distance from the top of a line to the baseline.
    #[must_use]
    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    #[must_use]
    pub fn metrics(&self) -> LineMetrics {
        LineMetrics {
            baseline: self.baseline,
            height: self.height,
        }
    }

    /// Glyph for `ch`, falling back to `?`.
    #[must_use]
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch).or_else(|| self.glyphs.get(&'?'))
    }

    /// Pen advance for `text`.
    #[must_use]
    pub fn text_width(&self, text: &str) -> i32 {
        text.chars()
            .filter_map(|ch| self.glyph(ch))
            .fold(0i32, |width, glyph| width.saturating_add(glyph.advance))
    }
}

#[derive(Default)]
struct GlyphBuilder {
    encoding: Option<char>,
    advance: Option<i32>,
    bbx: Option<[i32; 4]>,
    in_bitmap: bool,
    rows: Vec<Vec<u8>>,
}

impl GlyphBuilder {
    fn finish(self, line_no: usize) -> Result<Option<(char, Glyph)>, FontError> {
        let Some(ch) = self.encoding else {
            return Ok(None);
        };
        let [width, height, x_offset, y_offset] = self.bbx.ok_or(FontError::Syntax {
            line: line_no,
            message: format!("glyph U+{:04X} has no BBX", ch as u32),
        })?;
        let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(FontError::Syntax {
                line: line_no,
                message: format!("glyph U+{:04X} has a negative BBX size", ch as u32),
            });
        };
        if self.rows.len() != height as usize {
            return Err(FontError::Syntax {
                line: line_no,
                message: format!(
                    "glyph U+{:04X} has {} bitmap rows, BBX says {height}",
                    ch as u32,
                    self.rows.len()
                ),
            });
        }
        Ok(Some((
            ch,
            Glyph {
                advance: self.advance.unwrap_or(width as i32),
                width,
                height,
                x_offset,
                y_offset,
                rows: self.rows,
            },
        )))
    }
}

fn numbers<const N: usize>(
    mut words: SplitAsciiWhitespace<'_>,
    line_no: usize,
    keyword: &str,
) -> Result<[i32; N], FontError> {
    let mut out = [0i32; N];
    for slot in &mut out {
        *slot = words
            .next()
            .and_then(|word| word.parse().ok())
            .ok_or_else(|| FontError::Syntax {
                line: line_no,
                message: format!("{keyword} expects {N} integer(s)"),
            })?;
    }
    Ok(out)
}

fn parse_hex_row(word: &str, line_no: usize) -> Result<Vec<u8>, FontError> {
    let bad = || FontError::Syntax {
        line: line_no,
        message: format!("invalid bitmap row {word:?}"),
    };
    if word.len() % 2 != 0 || !word.is_ascii() {
        return Err(bad());
    }
    (0..word.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&word[i..i + 2], 16).map_err(|_| bad()))
        .collect()
}

/// Font loading failures.
#[derive(Debug)]
pub enum FontError {
    Io { path: PathBuf, source: io::Error },
    Syntax { line: usize, message: String },
    /// A required statement never appeared.
    Missing(&'static str),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "couldn't load font '{}': {source}", path.display())
            }
            Self::Syntax { line, message } => write!(f, "BDF error at line {line}: {message}"),
            Self::Missing(what) => write!(f, "BDF font has no {what}"),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Syntax { .. } | Self::Missing(_) => None,
        }
    }
}
