#![forbid(unsafe_code)]

//! The channel reader thread.
//!
//! Each iteration:
//!
//! 1. check the stop signal;
//! 2. open the channel, backing off and retrying if that fails;
//! 3. perform one bounded read, then drop the handle; bytes past
//!    `buffer_size` are dropped;
//! 4. skip empty reads without delay (a writer that opened and closed);
//! 5. parse and apply, or log and discard a malformed message.
//!
//! Applying a message repaints synchronously, so the N-th accepted message
//! is on the surface before the read for message N+1 starts.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::channel::Channel;
use crate::display::Display;
use crate::message::{self, MAX_MESSAGE_LEN};
use crate::renderer::Renderer;
use crate::stop::{StopSignal, StopTrigger};

/// Reader tunables.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Largest accepted message; longer writes are cut at this size.
    pub buffer_size: usize,
    /// Pause after a failed open before trying again.
    pub retry_backoff: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: MAX_MESSAGE_LEN,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Counters describing what the reader has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub applied: u64,
    pub rejected: u64,
    pub empty_reads: u64,
    pub open_failures: u64,
}

#[derive(Default)]
struct Counters {
    applied: AtomicU64,
    rejected: AtomicU64,
    empty_reads: AtomicU64,
    open_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ReaderStats {
        ReaderStats {
            applied: self.applied.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
        }
    }
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Applied,
    Rejected,
    Empty,
    Unavailable,
}

/// Reads messages from a [`Channel`] and applies them to a [`Display`].
pub struct ChannelReader<C, R> {
    channel: Arc<C>,
    display: Arc<Display<R>>,
    config: ReaderConfig,
    counters: Arc<Counters>,
    stop: StopSignal,
}

impl<C, R> ChannelReader<C, R>
where
    C: Channel + 'static,
    R: Renderer + 'static,
{
    /// Start the reader on its own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(
        channel: Arc<C>,
        display: Arc<Display<R>>,
        config: ReaderConfig,
    ) -> io::Result<ReaderHandle<C>> {
        let (stop, trigger) = StopSignal::new();
        let counters = Arc::new(Counters::default());
        let reader = Self {
            channel: channel.clone(),
            display,
            config,
            counters: counters.clone(),
            stop,
        };
        // Events from the reader go to the subscriber of the spawning thread.
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let thread = thread::Builder::new()
            .name("ledpipe-reader".into())
            .spawn(move || tracing::dispatcher::with_default(&dispatch, || reader.run()))?;
        tracing::info!("channel reader started");
        Ok(ReaderHandle {
            channel,
            trigger,
            counters,
            thread: Some(thread),
        })
    }

    fn run(self) {
        // One spare byte tells an over-long write from one that fits exactly.
        let mut buf = vec![0u8; self.config.buffer_size.max(1) + 1];
        while !self.stop.is_stopped() {
            if self.step(&mut buf) == Step::Unavailable {
                self.stop.wait_timeout(self.config.retry_backoff);
            }
        }
        tracing::info!("channel reader stopped");
    }

    fn step(&self, buf: &mut [u8]) -> Step {
        let mut stream = match self.channel.open() {
            Ok(stream) => stream,
            Err(err) => {
                self.counters.open_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, "failed to open channel, retrying");
                return Step::Unavailable;
            }
        };
        let read = read_once(&mut stream, buf);
        drop(stream);

        let mut len = match read {
            Ok(0) => {
                self.counters.empty_reads.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("empty read");
                return Step::Empty;
            }
            Ok(len) => len,
            Err(err) => {
                // A failed read releases the handle like an empty one; the
                // next open starts fresh.
                self.counters.empty_reads.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(error = %err, "channel read failed");
                return Step::Empty;
            }
        };
        let cap = self.config.buffer_size.max(1);
        if len > cap {
            tracing::warn!(limit = cap, "message longer than the limit, truncating");
            len = cap;
        }

        match message::parse(&buf[..len]) {
            Ok(parsed) => {
                tracing::debug!(
                    text1 = %parsed.text1,
                    text2 = %parsed.text2,
                    "applying message"
                );
                if let Err(err) = self.display.update(parsed) {
                    tracing::error!(error = %err, "repaint failed");
                }
                self.counters.applied.fetch_add(1, Ordering::Relaxed);
                Step::Applied
            }
            Err(err) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, bytes = len, "discarding malformed message");
                Step::Rejected
            }
        }
    }
}

/// Exactly one read, retried only if interrupted before any byte arrived.
fn read_once(stream: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Owner-side handle of a running reader.
pub struct ReaderHandle<C: Channel> {
    channel: Arc<C>,
    trigger: StopTrigger,
    counters: Arc<Counters>,
    thread: Option<JoinHandle<()>>,
}

impl<C: Channel> ReaderHandle<C> {
    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ReaderStats {
        self.counters.snapshot()
    }

    /// Whether the reader thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the reader and wait up to `timeout` for it to exit.
    ///
    /// The channel is woken repeatedly so a reader parked in `open` returns.
    /// A reader still blocked after `timeout` (e.g. a writer holding the
    /// pipe open without writing) is detached and left to die with the
    /// process.
    pub fn stop(mut self, timeout: Duration) -> ReaderStats {
        self.trigger.stop();
        let deadline = Instant::now() + timeout;
        if let Some(thread) = self.thread.take() {
            while !thread.is_finished() && Instant::now() < deadline {
                self.channel.wake();
                thread::sleep(Duration::from_millis(10));
            }
            if thread.is_finished() {
                if thread.join().is_err() {
                    tracing::error!("channel reader panicked");
                }
            } else {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "channel reader did not stop in time, detaching"
                );
            }
        }
        self.counters.snapshot()
    }
}

impl<C: Channel> Drop for ReaderHandle<C> {
    fn drop(&mut self) {
        // No join: the thread may be parked in open. `stop` is the orderly path.
        self.trigger.stop();
    }
}
