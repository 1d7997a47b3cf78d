#![forbid(unsafe_code)]

//! Terminal preview of the LED panel.
//!
//! Each terminal cell shows two vertically stacked pixels with an upper
//! half block: foreground is the top pixel, background the bottom one.
//! The surface lives in the alternate screen and restores the terminal on
//! [`Renderer::release`] or on drop, whichever comes first.
//!
//! Raw mode stays off: Ctrl+C must still raise SIGINT and reach the
//! interrupt flag.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use ledpipe_core::color::Rgb;
use ledpipe_core::document::DisplayDocument;
use ledpipe_core::renderer::{RenderError, Renderer};

use crate::canvas::{Canvas, PanelGeometry};
use crate::font::Font;

const UPPER_HALF_BLOCK: char = '▀';

pub struct TerminalSurface<W: Write> {
    out: W,
    canvas: Canvas,
    font: Font,
    active: bool,
}

impl TerminalSurface<Stdout> {
    /// Preview on standard output.
    ///
    /// # Errors
    ///
    /// See [`TerminalSurface::new`].
    pub fn stdout(geometry: PanelGeometry, font: Font) -> Result<Self, RenderError> {
        Self::new(io::stdout(), geometry, font)
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Enter the alternate screen on `out` and show a black panel.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] for a zero-sized panel or if the terminal
    /// cannot be set up.
    pub fn new(mut out: W, geometry: PanelGeometry, font: Font) -> Result<Self, RenderError> {
        let canvas = Canvas::new(geometry)?;
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        let mut surface = Self {
            out,
            canvas,
            font,
            active: true,
        };
        surface.present()?;
        tracing::info!(
            width = geometry.width(),
            height = geometry.height(),
            "terminal surface ready"
        );
        Ok(surface)
    }

    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The underlying writer.
    #[must_use]
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn present(&mut self) -> io::Result<()> {
        let mut last: Option<(Rgb, Rgb)> = None;
        for cell_row in 0..self.canvas.height().div_ceil(2) {
            let row = u16::try_from(cell_row).unwrap_or(u16::MAX);
            queue!(self.out, MoveTo(0, row))?;
            let top_y = cell_row as i32 * 2;
            for x in 0..self.canvas.width() as i32 {
                let top = self.canvas.pixel(x, top_y).unwrap_or(Rgb::BLACK);
                let bottom = self.canvas.pixel(x, top_y + 1).unwrap_or(Rgb::BLACK);
                if last != Some((top, bottom)) {
                    queue!(
                        self.out,
                        SetForegroundColor(to_color(top)),
                        SetBackgroundColor(to_color(bottom))
                    )?;
                    last = Some((top, bottom));
                }
                queue!(self.out, Print(UPPER_HALF_BLOCK))?;
            }
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.out, ResetColor, Show, LeaveAlternateScreen)
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

impl<W: Write + Send> Renderer for TerminalSurface<W> {
    fn paint(&mut self, document: &DisplayDocument) -> Result<(), RenderError> {
        if !self.active {
            return Err(RenderError::Surface("terminal surface released".into()));
        }
        self.canvas.draw_document(&self.font, document);
        self.present()?;
        Ok(())
    }

    fn blank(&mut self) -> Result<(), RenderError> {
        if !self.active {
            return Ok(());
        }
        self.canvas.fill(Rgb::BLACK);
        self.present()?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), RenderError> {
        self.restore()?;
        tracing::info!("terminal surface released");
        Ok(())
    }
}

impl<W: Write> Drop for TerminalSurface<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
