#![forbid(unsafe_code)]

//! Write one message into a running ledpipe's named pipe.
//!
//! ```text
//! ledpipe-send [--fifo PATH] TEXT1 TEXT2 [R,G,B] [R,G,B]
//! ```
//!
//! Colors default to white. Blocks until the daemon opens the pipe.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use ledpipe_core::channel::{self, DEFAULT_FIFO_PATH};
use ledpipe_core::{ParsedMessage, Rgb};

#[derive(Debug)]
struct Config {
    fifo: PathBuf,
    message: ParsedMessage,
}

fn print_usage() {
    eprintln!("Usage: ledpipe-send [--fifo PATH] TEXT1 TEXT2 [R,G,B] [R,G,B]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --fifo PATH   Named pipe to write");
    eprintln!("                (default: $LEDPIPE_FIFO or {DEFAULT_FIFO_PATH})");
    eprintln!("  -h, --help    Show this help");
}

fn parse_args() -> Result<Config, String> {
    let mut fifo = env::var("LEDPIPE_FIFO")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FIFO_PATH));
    let mut positional = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fifo" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--fifo requires a value".to_string())?;
                fifo = PathBuf::from(value);
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--fifo=") => {
                fifo = PathBuf::from(&other["--fifo=".len()..]);
            }
            _ => positional.push(arg),
        }
    }

    let message = message_from(&positional)?;
    Ok(Config { fifo, message })
}

fn message_from(positional: &[String]) -> Result<ParsedMessage, String> {
    let color = |index: usize| -> Result<Rgb, String> {
        match positional.get(index) {
            Some(raw) => raw
                .parse()
                .map_err(|err| format!("invalid color '{raw}': {err}")),
            None => Ok(Rgb::WHITE),
        }
    };
    match positional {
        [text1, text2, rest @ ..] if rest.len() <= 2 => Ok(ParsedMessage::new(
            text1.as_str(),
            text2.as_str(),
            color(2)?,
            color(3)?,
        )),
        _ => Err(format!(
            "expected TEXT1 TEXT2 and up to two colors, got {} arguments",
            positional.len()
        )),
    }
}

fn main() -> ExitCode {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match channel::send(&config.fifo, &config.message) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}: {err}", config.fifo.display());
            ExitCode::FAILURE
        }
    }
}
