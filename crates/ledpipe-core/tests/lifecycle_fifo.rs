//! End-to-end: a real named pipe, a writer, and signal-free shutdown.

mod common;

use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::thread;
use std::time::{Duration, Instant};

use common::{Call, Recorder, document, init_tracing, wait_until};
use ledpipe_core::channel::{self, NamedPipe};
use ledpipe_core::color::Rgb;
use ledpipe_core::lifecycle::{self, InterruptFlag, LifecycleConfig, LifecycleError};
use ledpipe_core::message::ParsedMessage;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

fn config(tmp: &TempDir) -> LifecycleConfig {
    LifecycleConfig {
        fifo_path: tmp.path().join("led_matrix_fifo"),
        poll_interval: Duration::from_millis(10),
        ..LifecycleConfig::default()
    }
}

#[test]
fn messages_flow_from_pipe_to_renderer_and_shutdown_cleans_up() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let fifo = config.fifo_path.clone();
    let recorder = Recorder::default();
    let interrupt = InterruptFlag::new();

    let daemon = {
        let config = config.clone();
        let recorder = recorder.clone();
        let interrupt = interrupt.clone();
        thread::spawn(move || lifecycle::run(&config, document(), recorder, &interrupt))
    };

    assert!(wait_until(WAIT, || fifo.exists()));
    let metadata = std::fs::metadata(&fifo).unwrap();
    assert!(metadata.file_type().is_fifo());
    assert_eq!(metadata.permissions().mode() & 0o777, 0o666);

    let first = ParsedMessage::new(
        "1)G 4min",
        "2)F 9min",
        Rgb::new(40, 170, 5),
        Rgb::new(190, 50, 5),
    );
    channel::send(&fifo, &first).unwrap();
    // Startup paint plus the message. The reader has closed its end by the
    // time it paints, so the next writer cannot share its read.
    assert!(wait_until(WAIT, || recorder.paints().len() == 2));

    let second = ParsedMessage::new("HELLO", "WORLD", Rgb::new(255, 0, 0), Rgb::new(0, 255, 0));
    channel::send(&fifo, &second).unwrap();
    assert!(wait_until(WAIT, || recorder.paints().len() == 3));

    interrupt.raise();
    let stats = daemon.join().unwrap().unwrap();
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.rejected, 0);

    let paints = recorder.paints();
    assert_eq!(paints[0], document());
    assert_eq!(paints[1].to_message(), first);
    assert_eq!(paints[2].to_message(), second);

    let calls = recorder.calls();
    assert_eq!(&calls[calls.len() - 2..], &[Call::Blank, Call::Release]);
    assert!(!fifo.exists(), "named pipe must be removed on shutdown");
}

#[test]
fn shutdown_with_no_writer_is_prompt() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let fifo = config.fifo_path.clone();
    let interrupt = InterruptFlag::new();

    let daemon = {
        let config = config.clone();
        let interrupt = interrupt.clone();
        thread::spawn(move || lifecycle::run(&config, document(), Recorder::default(), &interrupt))
    };
    assert!(wait_until(WAIT, || fifo.exists()));
    // Let the reader park in open(2).
    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    interrupt.raise();
    let stats = daemon.join().unwrap().unwrap();
    assert!(start.elapsed() < config.shutdown_timeout + Duration::from_secs(1));
    assert_eq!(stats.applied, 0);
    assert!(!fifo.exists());
}

#[test]
fn existing_fifo_is_adopted() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let _existing = NamedPipe::create(&config.fifo_path).unwrap();
    let interrupt = InterruptFlag::new();
    interrupt.raise();

    let stats = lifecycle::run(&config, document(), Recorder::default(), &interrupt).unwrap();
    assert_eq!(stats.applied, 0);
}

#[test]
fn regular_file_at_fifo_path_is_fatal() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    std::fs::write(&config.fifo_path, b"stale").unwrap();
    let recorder = Recorder::default();

    let result = lifecycle::run(&config, document(), recorder.clone(), &InterruptFlag::new());
    assert!(matches!(result, Err(LifecycleError::Channel(_))));
    assert!(recorder.calls().is_empty(), "nothing is rendered on startup failure");
}
