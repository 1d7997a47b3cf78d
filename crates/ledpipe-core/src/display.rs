#![forbid(unsafe_code)]

//! Shared display context.
//!
//! [`Display`] is the single object shared between the ingestion thread and
//! the lifecycle controller. The document and the renderer each sit behind
//! their own mutex; the lock order is always document, then renderer, and an
//! update repaints while still holding the document lock, so paints can never
//! observe or reorder a half-applied message.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::document::DisplayDocument;
use crate::message::ParsedMessage;
use crate::renderer::{RenderError, Renderer};

pub struct Display<R> {
    document: Mutex<DisplayDocument>,
    renderer: Mutex<R>,
}

impl<R: Renderer> Display<R> {
    #[must_use]
    pub fn new(document: DisplayDocument, renderer: R) -> Self {
        Self {
            document: Mutex::new(document),
            renderer: Mutex::new(renderer),
        }
    }

    /// Apply a message and repaint.
    ///
    /// The document is updated even if the repaint fails; the next
    /// successful paint shows the current state.
    pub fn update(&self, message: ParsedMessage) -> Result<(), RenderError> {
        let mut document = lock(&self.document);
        document.apply(message);
        lock(&self.renderer).paint(&document)
    }

    /// Paint the current document without changing it.
    pub fn repaint(&self) -> Result<(), RenderError> {
        let document = lock(&self.document);
        lock(&self.renderer).paint(&document)
    }

    /// Blank the surface.
    pub fn blank(&self) -> Result<(), RenderError> {
        let _document = lock(&self.document);
        lock(&self.renderer).blank()
    }

    /// Release the surface. The renderer must not be painted afterwards.
    pub fn release(&self) -> Result<(), RenderError> {
        let _document = lock(&self.document);
        lock(&self.renderer).release()
    }

    /// Copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> DisplayDocument {
        lock(&self.document).clone()
    }

    #[cfg(test)]
    fn into_renderer(self) -> R {
        self.renderer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// Poisoning is ignored: apply is a plain field swap and never leaves the
// document half-written.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
