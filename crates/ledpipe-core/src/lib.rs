#![forbid(unsafe_code)]

//! Core: status message codec, display document, named-pipe reader, and
//! process lifecycle for a two-line LED matrix display.
//!
//! Data flows in one direction:
//!
//! ```text
//! named pipe ──► message::parse ──► DisplayDocument ──► Renderer
//! ```
//!
//! The [`reader::ChannelReader`] owns the ingestion thread; the
//! [`lifecycle`] module wires it to signals and tears everything down.

#[cfg(not(unix))]
compile_error!("ledpipe-core requires a Unix platform with named pipes");

pub mod channel;
pub mod color;
pub mod display;
pub mod document;
pub mod lifecycle;
pub mod message;
pub mod reader;
pub mod renderer;
pub mod stop;

pub use color::Rgb;
pub use document::{DisplayDocument, TextLine};
pub use message::{ParseError, ParsedMessage};
pub use renderer::{RenderError, Renderer};
