#![forbid(unsafe_code)]

//! Surface without an output device: rasterizes, logs, keeps the pixels.

use ledpipe_core::color::Rgb;
use ledpipe_core::document::DisplayDocument;
use ledpipe_core::renderer::{RenderError, Renderer};

use crate::canvas::{Canvas, PanelGeometry};
use crate::font::Font;

pub struct HeadlessSurface {
    canvas: Canvas,
    font: Font,
    frames: u64,
}

impl HeadlessSurface {
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] for a zero-sized panel.
    pub fn new(geometry: PanelGeometry, font: Font) -> Result<Self, RenderError> {
        Ok(Self {
            canvas: Canvas::new(geometry)?,
            font,
            frames: 0,
        })
    }

    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Frames painted so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for HeadlessSurface {
    fn paint(&mut self, document: &DisplayDocument) -> Result<(), RenderError> {
        self.canvas.draw_document(&self.font, document);
        self.frames += 1;
        let [primary, secondary] = document.lines();
        tracing::info!(
            frame = self.frames,
            line1 = %primary.text,
            color1 = %primary.color,
            line2 = %secondary.text,
            color2 = %secondary.color,
            "frame"
        );
        Ok(())
    }

    fn blank(&mut self) -> Result<(), RenderError> {
        self.canvas.fill(Rgb::BLACK);
        tracing::debug!("blanked");
        Ok(())
    }
}
