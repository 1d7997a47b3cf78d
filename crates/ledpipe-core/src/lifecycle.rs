#![forbid(unsafe_code)]

//! Process lifecycle: signals, startup, idle wait, and shutdown.
//!
//! [`run`] owns the whole sequence:
//!
//! 1. create the named pipe (fatal on failure);
//! 2. paint the startup document and start the [`ChannelReader`];
//! 3. poll the [`InterruptFlag`] every `poll_interval`;
//! 4. stop the reader (bounded by `shutdown_timeout`), blank and release the
//!    surface, and unlink the pipe.
//!
//! Signal handlers only store into the interrupt flag. Everything else
//! happens on ordinary threads.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::{SIGINT, SIGTERM};

use crate::channel::{ChannelError, DEFAULT_FIFO_PATH, NamedPipe};
use crate::display::Display;
use crate::document::DisplayDocument;
use crate::reader::{ChannelReader, ReaderConfig, ReaderStats};
use crate::renderer::Renderer;

/// Shared "please shut down" flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// A flag not connected to any signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag raised by SIGINT and SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler cannot be registered.
    pub fn install() -> io::Result<Self> {
        let interrupt = Self::new();
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&interrupt.flag))?;
        }
        Ok(interrupt)
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Lifecycle tunables.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub fifo_path: PathBuf,
    /// How often the main thread checks the interrupt flag.
    pub poll_interval: Duration,
    /// Upper bound on waiting for the reader at shutdown.
    pub shutdown_timeout: Duration,
    pub reader: ReaderConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            fifo_path: PathBuf::from(DEFAULT_FIFO_PATH),
            poll_interval: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(2),
            reader: ReaderConfig::default(),
        }
    }
}

/// Run until `interrupt` is raised.
///
/// # Errors
///
/// Returns [`LifecycleError`] for startup failures only. Once the reader is
/// running, problems are logged and shutdown always completes.
pub fn run<R>(
    config: &LifecycleConfig,
    document: DisplayDocument,
    renderer: R,
    interrupt: &InterruptFlag,
) -> Result<ReaderStats, LifecycleError>
where
    R: Renderer + 'static,
{
    let pipe = Arc::new(NamedPipe::create(&config.fifo_path)?);
    let display = Arc::new(Display::new(document, renderer));

    if let Err(err) = display.repaint() {
        tracing::error!(error = %err, "initial paint failed");
    }

    let reader = match ChannelReader::spawn(pipe.clone(), display.clone(), config.reader.clone()) {
        Ok(reader) => reader,
        Err(err) => {
            shutdown_surface(&display);
            remove_pipe(&pipe);
            return Err(LifecycleError::Spawn(err));
        }
    };
    tracing::info!(path = %pipe.path().display(), "listening for messages");

    while !interrupt.is_set() {
        thread::sleep(config.poll_interval);
    }

    tracing::info!("interrupt received, shutting down");
    let stats = reader.stop(config.shutdown_timeout);
    shutdown_surface(&display);
    remove_pipe(&pipe);
    tracing::info!(
        applied = stats.applied,
        rejected = stats.rejected,
        empty_reads = stats.empty_reads,
        open_failures = stats.open_failures,
        "shutdown complete"
    );
    Ok(stats)
}

fn shutdown_surface<R: Renderer>(display: &Display<R>) {
    if let Err(err) = display.blank() {
        tracing::warn!(error = %err, "failed to blank surface");
    }
    if let Err(err) = display.release() {
        tracing::warn!(error = %err, "failed to release surface");
    }
}

fn remove_pipe(pipe: &NamedPipe) {
    if let Err(err) = pipe.remove() {
        tracing::warn!(path = %pipe.path().display(), error = %err, "failed to remove named pipe");
    }
}

/// Fatal startup failures.
#[derive(Debug)]
pub enum LifecycleError {
    /// Signal handlers could not be installed.
    Signal(io::Error),
    /// The named pipe could not be set up.
    Channel(ChannelError),
    /// The reader thread could not be started.
    Spawn(io::Error),
}

impl From<ChannelError> for LifecycleError {
    fn from(err: ChannelError) -> Self {
        Self::Channel(err)
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(err) => write!(f, "failed to install signal handlers: {err}"),
            Self::Channel(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start channel reader: {err}"),
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Signal(err) | Self::Spawn(err) => Some(err),
            Self::Channel(err) => Some(err),
        }
    }
}
