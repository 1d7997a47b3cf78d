#![forbid(unsafe_code)]

//! The two-line display model.
//!
//! A [`DisplayDocument`] always holds exactly two [`TextLine`]s: index 0 is
//! the primary line, index 1 the secondary line. Positions are fixed when
//! the document is built; messages only replace text and color.

use crate::color::Rgb;
use crate::message::ParsedMessage;

/// Vertical gap in pixels between the bottom of line 1 and the top of line 2.
pub const LINE_GAP: i32 = 2;

/// One line of text at a fixed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    /// Left edge in pixels.
    pub x: i32,
    /// Baseline in pixels.
    pub y: i32,
    pub color: Rgb,
}

impl TextLine {
    fn blank(x: i32, y: i32) -> Self {
        Self {
            text: String::new(),
            x,
            y,
            color: Rgb::WHITE,
        }
    }
}

/// Vertical font metrics used to place the two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    /// Distance from the top of a line to its baseline.
    pub baseline: i32,
    /// Full line height.
    pub height: i32,
}

/// Two text lines plus a background color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDocument {
    lines: [TextLine; 2],
    background: Rgb,
}

impl DisplayDocument {
    /// Build the startup document: empty white lines stacked from `origin`.
    ///
    /// Line 1 sits on `origin.y + baseline`; line 2 one line height plus
    /// [`LINE_GAP`] below it. Positions saturate at the `i32` range.
    #[must_use]
    pub fn new(origin: (i32, i32), metrics: LineMetrics, background: Rgb) -> Self {
        let (x, y) = origin;
        let primary_y = y.saturating_add(metrics.baseline);
        let secondary_y = primary_y
            .saturating_add(metrics.height)
            .saturating_add(LINE_GAP);
        Self {
            lines: [TextLine::blank(x, primary_y), TextLine::blank(x, secondary_y)],
            background,
        }
    }

    /// Replace text and color of both lines. Positions are untouched.
    pub fn apply(&mut self, message: ParsedMessage) {
        let ParsedMessage {
            text1,
            text2,
            color1,
            color2,
        } = message;
        let [primary, secondary] = &mut self.lines;
        primary.text = text1;
        primary.color = color1;
        secondary.text = text2;
        secondary.color = color2;
    }

    /// Re-derive the message that would produce the current text and colors.
    #[must_use]
    pub fn to_message(&self) -> ParsedMessage {
        let [primary, secondary] = &self.lines;
        ParsedMessage::new(
            primary.text.clone(),
            secondary.text.clone(),
            primary.color,
            secondary.color,
        )
    }

    #[must_use]
    pub fn primary(&self) -> &TextLine {
        &self.lines[0]
    }

    #[must_use]
    pub fn secondary(&self) -> &TextLine {
        &self.lines[1]
    }

    /// Both lines in paint order.
    #[must_use]
    pub fn lines(&self) -> &[TextLine; 2] {
        &self.lines
    }

    #[must_use]
    pub fn background(&self) -> Rgb {
        self.background
    }
}
