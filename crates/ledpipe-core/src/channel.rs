#![forbid(unsafe_code)]

//! Named-pipe plumbing.
//!
//! The reader talks to its input through the [`Channel`] trait so that the
//! loop can be driven by something other than a real FIFO. [`NamedPipe`] is
//! the production implementation: a file-system FIFO created world
//! read/write and removed on shutdown.
//!
//! One read is one candidate message. Writers must deliver each message in
//! a single write of at most [`MAX_MESSAGE_LEN`] bytes; [`send`] does that.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use crate::message::{EncodeError, MAX_MESSAGE_LEN, ParsedMessage};

/// Where the daemon listens unless configured otherwise.
pub const DEFAULT_FIFO_PATH: &str = "/tmp/led_matrix_fifo";

/// Readable and writable by every user.
const FIFO_MODE: u32 = 0o666;

/// A source of message bytes, opened once per message.
pub trait Channel: Send + Sync {
    type Stream: Read;

    /// Open the read side. May block until a writer appears.
    fn open(&self) -> io::Result<Self::Stream>;

    /// Release a reader parked in [`Channel::open`]. Called repeatedly while
    /// the reader is being stopped; must never block.
    fn wake(&self) {}
}

/// A FIFO at a fixed path.
#[derive(Debug)]
pub struct NamedPipe {
    path: PathBuf,
}

impl NamedPipe {
    /// Create the FIFO (or adopt an existing one) and force mode `0666`.
    ///
    /// # Errors
    ///
    /// Fails if the FIFO cannot be created, the path exists but is not a
    /// FIFO, or the permissions cannot be set.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ChannelError> {
        let path = path.into();
        match nix::unistd::mkfifo(path.as_path(), Mode::from_bits_truncate(FIFO_MODE)) {
            Ok(()) => tracing::info!(path = %path.display(), "created named pipe"),
            Err(Errno::EEXIST) => {
                let metadata = fs::metadata(&path).map_err(|source| ChannelError::Create {
                    path: path.clone(),
                    source,
                })?;
                if !metadata.file_type().is_fifo() {
                    return Err(ChannelError::NotAFifo(path));
                }
                tracing::info!(path = %path.display(), "reusing existing named pipe");
            }
            Err(errno) => {
                return Err(ChannelError::Create {
                    path,
                    source: io::Error::from(errno),
                });
            }
        }

        // mkfifo is subject to the umask.
        fs::set_permissions(&path, fs::Permissions::from_mode(FIFO_MODE)).map_err(|source| {
            ChannelError::Permissions {
                path: path.clone(),
                source,
            }
        })?;

        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the FIFO from the file system.
    pub fn remove(&self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }
}

impl Channel for NamedPipe {
    type Stream = File;

    fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }

    fn wake(&self) {
        // Opening the write side completes a pending open(2) on the read
        // side; dropping it right away makes the reader see EOF. With no
        // reader waiting the non-blocking open fails with ENXIO.
        match OpenOptions::new()
            .write(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(&self.path)
        {
            Ok(_writer) => tracing::trace!(path = %self.path.display(), "woke pipe reader"),
            Err(err) => tracing::trace!(error = %err, "no pipe reader to wake"),
        }
    }
}

/// Encode `message` and deliver it to the FIFO at `path` in one write.
///
/// Blocks until a reader has the FIFO open.
///
/// # Errors
///
/// Returns [`SendError::Encode`] before touching the FIFO if the message
/// cannot be encoded, or [`SendError::Io`] if opening or writing fails.
pub fn send(path: &Path, message: &ParsedMessage) -> Result<(), SendError> {
    let encoded = message.encode()?;
    debug_assert!(encoded.len() <= MAX_MESSAGE_LEN);
    let mut fifo = OpenOptions::new().write(true).open(path)?;
    fifo.write_all(encoded.as_bytes())?;
    fifo.flush()?;
    tracing::debug!(path = %path.display(), bytes = encoded.len(), "message sent");
    Ok(())
}

/// Fatal named-pipe setup failures.
#[derive(Debug)]
pub enum ChannelError {
    /// `mkfifo` failed for a reason other than "already exists".
    Create { path: PathBuf, source: io::Error },
    /// Something other than a FIFO occupies the path.
    NotAFifo(PathBuf),
    /// The FIFO exists but its mode could not be set.
    Permissions { path: PathBuf, source: io::Error },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path, source } => {
                write!(f, "failed to create named pipe {}: {source}", path.display())
            }
            Self::NotAFifo(path) => {
                write!(f, "{} exists and is not a named pipe", path.display())
            }
            Self::Permissions { path, source } => write!(
                f,
                "failed to set permissions on named pipe {}: {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Create { source, .. } | Self::Permissions { source, .. } => Some(source),
            Self::NotAFifo(_) => None,
        }
    }
}

/// Failures delivering a message.
#[derive(Debug)]
pub enum SendError {
    Encode(EncodeError),
    Io(io::Error),
}

impl From<EncodeError> for SendError {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<io::Error> for SendError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "cannot encode message: {err}"),
            Self::Io(err) => write!(f, "cannot write to named pipe: {err}"),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}
