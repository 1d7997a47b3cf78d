#![forbid(unsafe_code)]

//! Rendering bridge.
//!
//! The core never draws pixels itself. It hands a [`DisplayDocument`] to a
//! [`Renderer`] after every accepted message, and asks it to blank the
//! surface once at shutdown before releasing it.

use std::fmt;
use std::io;

use crate::document::DisplayDocument;

/// A surface that can show a [`DisplayDocument`].
pub trait Renderer: Send {
    /// Clear to the document background and draw both lines.
    fn paint(&mut self, document: &DisplayDocument) -> Result<(), RenderError>;

    /// Turn every pixel off.
    fn blank(&mut self) -> Result<(), RenderError>;

    /// Give the output device back (restore terminal state, close
    /// handles). Called once at shutdown, after [`Renderer::blank`].
    fn release(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Renderer failures.
#[derive(Debug)]
pub enum RenderError {
    /// Writing to the output device failed.
    Io(io::Error),
    /// The surface rejected the operation.
    Surface(String),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "render I/O error: {err}"),
            Self::Surface(msg) => write!(f, "render surface error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Surface(_) => None,
        }
    }
}
