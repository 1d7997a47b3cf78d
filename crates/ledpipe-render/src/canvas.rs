#![forbid(unsafe_code)]

//! Pixel canvas with BDF text drawing.

use ledpipe_core::color::Rgb;
use ledpipe_core::document::DisplayDocument;
use ledpipe_core::renderer::RenderError;

use crate::font::Font;

/// Physical panel arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    /// Rows per panel.
    pub rows: u32,
    /// Columns per panel.
    pub cols: u32,
    /// Panels chained left to right.
    pub chain: u32,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            chain: 1,
        }
    }
}

impl PanelGeometry {
    /// Total width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.cols.saturating_mul(self.chain)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.rows
    }
}

/// Row-major RGB pixel buffer. Out-of-bounds writes are clipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    /// A black canvas of the panel's size.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] for a zero-sized panel.
    pub fn new(geometry: PanelGeometry) -> Result<Self, RenderError> {
        let (width, height) = (geometry.width(), geometry.height());
        if width == 0 || height == 0 {
            return Err(RenderError::Surface(format!(
                "panel geometry {width}x{height} has no pixels"
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width as usize * height as usize],
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Pixel at (`x`, `y`), or `None` outside the canvas.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Draw `text` with its baseline at `y`, starting at pen position `x`.
    /// Only set glyph bits are painted. Returns the total pen advance.
    ///
    /// Coordinates saturate, so text placed far off the canvas is clipped.
    pub fn draw_text(&mut self, font: &Font, x: i32, y: i32, color: Rgb, text: &str) -> i32 {
        let mut pen = x;
        for ch in text.chars() {
            let Some(glyph) = font.glyph(ch) else {
                continue;
            };
            let left = pen.saturating_add(glyph.x_offset);
            let top = y
                .saturating_sub(glyph.y_offset)
                .saturating_sub_unsigned(glyph.height);
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    if glyph.is_set(col, row) {
                        self.set_pixel(
                            left.saturating_add_unsigned(col),
                            top.saturating_add_unsigned(row),
                            color,
                        );
                    }
                }
            }
            pen = pen.saturating_add(glyph.advance);
        }
        pen.saturating_sub(x)
    }

    /// Background, then both lines in order.
    pub fn draw_document(&mut self, font: &Font, document: &DisplayDocument) {
        self.fill(document.background());
        for line in document.lines() {
            let right = line.x.saturating_add(font.text_width(&line.text));
            if i64::from(right) > i64::from(self.width) {
                tracing::debug!(text = %line.text, right, width = self.width, "line clipped");
            }
            self.draw_text(font, line.x, line.y, line.color, &line.text);
        }
    }
}
