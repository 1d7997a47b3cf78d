#![forbid(unsafe_code)]

//! Rendering surfaces for ledpipe.
//!
//! Everything here sits behind [`ledpipe_core::Renderer`]: a BDF font
//! loader, a pixel [`canvas::Canvas`] that knows how to draw a
//! [`ledpipe_core::DisplayDocument`], and two surfaces that present it.
//!
//! | Surface | Output |
//! |---------|--------|
//! | [`terminal::TerminalSurface`] | live half-block preview in the alternate screen |
//! | [`headless::HeadlessSurface`] | canvas only, one log line per frame |

pub mod canvas;
pub mod font;
pub mod headless;
pub mod terminal;

pub use canvas::{Canvas, PanelGeometry};
pub use font::{Font, FontError};
