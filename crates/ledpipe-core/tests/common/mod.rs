//! Shared fakes for the reader and lifecycle tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ledpipe_core::channel::Channel;
use ledpipe_core::color::Rgb;
use ledpipe_core::document::{DisplayDocument, LineMetrics};
use ledpipe_core::renderer::{RenderError, Renderer};
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::TRACE)
        .try_init();
}

/// In-memory log sink. Install with `tracing::subscriber::with_default`;
/// the reader thread inherits it from the thread that spawns it.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .with_writer(move || sink.clone())
            .finish()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Level column of a captured line.
pub fn level(line: &str) -> &str {
    line.split_whitespace()
        .find(|word| ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"].contains(word))
        .unwrap_or("")
}

pub fn document() -> DisplayDocument {
    DisplayDocument::new(
        (4, 2),
        LineMetrics {
            baseline: 11,
            height: 13,
        },
        Rgb::BLACK,
    )
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Paint(DisplayDocument),
    Blank,
    Release,
}

/// Renderer that records every call.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paints(&self) -> Vec<DisplayDocument> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Paint(doc) => Some(doc),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for Recorder {
    fn paint(&mut self, document: &DisplayDocument) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(Call::Paint(document.clone()));
        Ok(())
    }

    fn blank(&mut self) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(Call::Blank);
        Ok(())
    }

    fn release(&mut self) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(Call::Release);
        Ok(())
    }
}

/// One scripted outcome of [`Channel::open`].
pub enum Open {
    Fail(io::ErrorKind),
    Deliver(Vec<u8>),
}

/// Channel that replays a script, then reports "not found" forever.
pub struct Scripted {
    script: Mutex<VecDeque<Open>>,
    opens: Mutex<Vec<Instant>>,
}

impl Scripted {
    pub fn new(script: Vec<Open>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            opens: Mutex::new(Vec::new()),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.lock().unwrap().len()
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.opens.lock().unwrap().clone()
    }
}

impl Channel for Scripted {
    type Stream = Cursor<Vec<u8>>;

    fn open(&self) -> io::Result<Self::Stream> {
        self.opens.lock().unwrap().push(Instant::now());
        match self.script.lock().unwrap().pop_front() {
            Some(Open::Deliver(bytes)) => Ok(Cursor::new(bytes)),
            Some(Open::Fail(kind)) => Err(io::Error::from(kind)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}
