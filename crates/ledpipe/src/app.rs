#![forbid(unsafe_code)]

//! Startup wiring: font, document, surface, then the core lifecycle.

use std::fmt;

use ledpipe_core::DisplayDocument;
use ledpipe_core::lifecycle::{self, InterruptFlag, LifecycleConfig, LifecycleError};
use ledpipe_core::reader::ReaderStats;
use ledpipe_core::renderer::RenderError;
use ledpipe_render::font::{Font, FontError};
use ledpipe_render::headless::HeadlessSurface;
use ledpipe_render::terminal::TerminalSurface;

use crate::cli::{Opts, RendererKind};

/// Load resources, open the surface, and run until `interrupt` is raised.
///
/// Every error is a startup failure: nothing has been shown yet.
pub fn run(opts: &Opts, interrupt: &InterruptFlag) -> Result<ReaderStats, StartupError> {
    for flag in &opts.panel_flags {
        tracing::debug!(flag = %flag, "ignoring panel driver flag");
    }

    let font = Font::load(&opts.font)?;
    let document = DisplayDocument::new(opts.origin, font.metrics(), opts.background);
    let config = LifecycleConfig {
        fifo_path: opts.fifo.clone(),
        ..LifecycleConfig::default()
    };

    tracing::info!(
        font = %opts.font.display(),
        width = opts.geometry.width(),
        height = opts.geometry.height(),
        renderer = ?opts.renderer,
        "starting"
    );

    let stats = match opts.renderer {
        RendererKind::Terminal => {
            let surface =
                TerminalSurface::stdout(opts.geometry, font).map_err(StartupError::Surface)?;
            lifecycle::run(&config, document, surface, interrupt)?
        }
        RendererKind::Headless => {
            let surface =
                HeadlessSurface::new(opts.geometry, font).map_err(StartupError::Surface)?;
            lifecycle::run(&config, document, surface, interrupt)?
        }
    };
    Ok(stats)
}

/// Process status: 0 after a clean shutdown, 1 after a startup failure.
pub fn exit_status(outcome: &Result<ReaderStats, StartupError>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

#[derive(Debug)]
pub enum StartupError {
    Font(FontError),
    Surface(RenderError),
    Lifecycle(LifecycleError),
}

impl From<FontError> for StartupError {
    fn from(err: FontError) -> Self {
        Self::Font(err)
    }
}

impl From<LifecycleError> for StartupError {
    fn from(err: LifecycleError) -> Self {
        Self::Lifecycle(err)
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Font(err) => write!(f, "couldn't load font: {err}"),
            Self::Surface(err) => write!(f, "couldn't set up display: {err}"),
            Self::Lifecycle(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Font(err) => Some(err),
            Self::Surface(err) => Some(err),
            Self::Lifecycle(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use ledpipe_core::Rgb;
    use ledpipe_render::canvas::PanelGeometry;
    use tempfile::TempDir;

    const FONT: &str = "\
FONTBOUNDINGBOX 4 6 0 -1
STARTCHAR question
ENCODING 63
DWIDTH 4 0
BBX 3 5 0 0
BITMAP
E0
20
40
00
40
ENDCHAR
";

    fn opts(dir: &Path, font: &str) -> Opts {
        Opts {
            font: dir.join(font),
            origin: (0, 0),
            background: Rgb::BLACK,
            geometry: PanelGeometry::default(),
            fifo: dir.join("led_fifo"),
            renderer: RendererKind::Headless,
            panel_flags: vec!["--led-gpio-mapping=adafruit-hat".into()],
        }
    }

    #[test]
    fn missing_font_fails_before_the_pipe_exists() {
        let dir = TempDir::new().unwrap();
        let opts = opts(dir.path(), "absent.bdf");
        let outcome = run(&opts, &InterruptFlag::new());

        assert!(matches!(outcome, Err(StartupError::Font(FontError::Io { .. }))));
        assert_eq!(exit_status(&outcome), 1);
        assert!(!opts.fifo.exists());
    }

    #[test]
    fn regular_file_at_pipe_path_is_a_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("font.bdf"), FONT).unwrap();
        let opts = opts(dir.path(), "font.bdf");
        fs::write(&opts.fifo, b"not a pipe").unwrap();

        let outcome = run(&opts, &InterruptFlag::new());
        assert!(matches!(
            outcome,
            Err(StartupError::Lifecycle(LifecycleError::Channel(_)))
        ));
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn zero_sized_panel_is_a_surface_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("font.bdf"), FONT).unwrap();
        let mut opts = opts(dir.path(), "font.bdf");
        opts.geometry.chain = 0;

        let outcome = run(&opts, &InterruptFlag::new());
        assert!(matches!(outcome, Err(StartupError::Surface(_))));
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn early_interrupt_shuts_down_cleanly() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("font.bdf"), FONT).unwrap();
        let opts = opts(dir.path(), "font.bdf");
        let interrupt = InterruptFlag::new();
        interrupt.raise();

        let outcome = run(&opts, &interrupt);
        assert_eq!(outcome.as_ref().ok().map(|stats| stats.applied), Some(0));
        assert_eq!(exit_status(&outcome), 0);
        assert!(!opts.fifo.exists());
    }
}
