#![forbid(unsafe_code)]

//! Command line for the `ledpipe` daemon.
//!
//! Flags follow the LED-matrix tools (`-f`, `-x`, `-y`, `-B`, `-L`,
//! `--led-*`). Panel flags this binary has no use for are kept in
//! [`Opts::panel_flags`] so existing launch scripts keep working. Defaults
//! can come from `LEDPIPE_*` variables; flags win over the environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

use ledpipe_core::channel::DEFAULT_FIFO_PATH;
use ledpipe_core::color::Rgb;
use ledpipe_render::canvas::PanelGeometry;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Panel driver flags that take a value. Other `--led-*` flags without an
/// inline `=value` are switches.
const PANEL_VALUE_FLAGS: &[&str] = &[
    "--led-gpio-mapping",
    "--led-slowdown-gpio",
    "--led-brightness",
    "--led-parallel",
    "--led-multiplexing",
    "--led-pixel-mapper",
    "--led-pwm-bits",
    "--led-pwm-lsb-nanoseconds",
    "--led-pwm-dither-bits",
    "--led-panel-type",
    "--led-row-addr-type",
    "--led-rgb-sequence",
    "--led-scan-mode",
    "--led-limit-refresh",
];

const HELP_TEXT: &str = "\
ledpipe: show two-line status messages from a named pipe on an LED panel

USAGE:
    ledpipe -f <font-file> [OPTIONS]

OPTIONS:
    -f, --font=PATH         BDF font file (required)
    -x, --x=N               X origin of the text (default: 0)
    -y, --y=N               Y origin of the text (default: 0)
    -B, --background=R,G,B  Background color (default: 0,0,0)
    -L, --layout=N          Number of chained panels (default: 1)
    --led-rows=N            Rows per panel (default: 32)
    --led-cols=N            Columns per panel (default: 32)
    --led-*                 Other panel driver flags are accepted and ignored
    --fifo=PATH             Named pipe to read (default: /tmp/led_matrix_fifo)
    --renderer=KIND         'terminal' (default) or 'headless'
    --help, -h              Show this help message
    --version, -V           Show version

MESSAGE FORMAT:
    text1|text2|r1,g1,b1|r2,g2,b2
    e.g.  echo '1)G 4min|2)F 9min|40,170,5|190,50,5' > /tmp/led_matrix_fifo

ENVIRONMENT VARIABLES:
    LEDPIPE_FONT        Override the default for --font
    LEDPIPE_FIFO        Override the default for --fifo
    LEDPIPE_RENDERER    Override the default for --renderer
    LEDPIPE_LOG         Log filter (default: info). Logs go to stderr;
                        redirect it when using the terminal renderer.";

/// Which surface to render on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Terminal,
    Headless,
}

impl RendererKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "terminal" => Some(Self::Terminal),
            "headless" => Some(Self::Headless),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub font: PathBuf,
    /// Text origin (x, y).
    pub origin: (i32, i32),
    pub background: Rgb,
    pub geometry: PanelGeometry,
    pub fifo: PathBuf,
    pub renderer: RendererKind,
    /// `--led-*` driver flags accepted for compatibility, as given.
    pub panel_flags: Vec<String>,
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

/// Bad command lines.
#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    MissingValue(String),
    InvalidValue { flag: String, value: String },
    Unknown(String),
    MissingFont,
    OriginOutsidePanel {
        origin: (i32, i32),
        width: u32,
        height: u32,
    },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue(flag) => write!(f, "{flag} requires a value"),
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            Self::Unknown(arg) => write!(f, "Unknown argument: {arg}"),
            Self::MissingFont => write!(f, "Need to specify BDF font-file with -f"),
            Self::OriginOutsidePanel {
                origin: (x, y),
                width,
                height,
            } => write!(f, "Text origin {x},{y} is outside the {width}x{height} panel"),
        }
    }
}

impl std::error::Error for CliError {}

impl Opts {
    /// Parse the process arguments and environment, exiting on `--help`,
    /// `--version`, or a bad command line.
    pub fn parse() -> Self {
        let args = env::args().skip(1);
        match Self::parse_from(args, |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("ledpipe {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` (without the program name), reading environment
    /// defaults through `env`.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Command, CliError> {
        let mut font = env("LEDPIPE_FONT").map(PathBuf::from);
        let mut origin = (0, 0);
        let mut background = Rgb::BLACK;
        let mut geometry = PanelGeometry::default();
        let mut fifo = env("LEDPIPE_FIFO")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FIFO_PATH));
        let mut renderer = RendererKind::Terminal;
        let mut panel_flags = Vec::new();
        if let Some(name) = env("LEDPIPE_RENDERER") {
            renderer = RendererKind::from_name(&name).ok_or(CliError::InvalidValue {
                flag: "LEDPIPE_RENDERER".into(),
                value: name,
            })?;
        }

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let value = |args: &mut dyn Iterator<Item = String>| {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| CliError::MissingValue(flag.clone()))
            };

            match flag.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "-f" | "--font" => font = Some(PathBuf::from(value(&mut args)?)),
                "-x" | "--x" => origin.0 = number(&flag, value(&mut args)?)?,
                "-y" | "--y" => origin.1 = number(&flag, value(&mut args)?)?,
                "-B" | "--background" => {
                    let raw = value(&mut args)?;
                    background = raw.parse().map_err(|_| CliError::InvalidValue {
                        flag: flag.clone(),
                        value: raw,
                    })?;
                }
                "-L" | "--layout" | "--led-chain" => {
                    geometry.chain = positive(&flag, value(&mut args)?)?;
                }
                "--led-rows" => geometry.rows = positive(&flag, value(&mut args)?)?,
                "--led-cols" => geometry.cols = positive(&flag, value(&mut args)?)?,
                "--fifo" => fifo = PathBuf::from(value(&mut args)?),
                "--renderer" => {
                    let raw = value(&mut args)?;
                    renderer = RendererKind::from_name(&raw).ok_or(CliError::InvalidValue {
                        flag: flag.clone(),
                        value: raw,
                    })?;
                }
                other if other.starts_with("--led-") => {
                    let passed = match &inline {
                        Some(_) => arg.clone(),
                        None if PANEL_VALUE_FLAGS.contains(&other) => {
                            format!("{other}={}", value(&mut args)?)
                        }
                        None => flag.clone(),
                    };
                    panel_flags.push(passed);
                }
                _ => return Err(CliError::Unknown(arg)),
            }
        }

        let font = font.ok_or(CliError::MissingFont)?;
        check_origin(origin, geometry)?;
        Ok(Command::Run(Self {
            font,
            origin,
            background,
            geometry,
            fifo,
            renderer,
            panel_flags,
        }))
    }
}

fn number<T: std::str::FromStr>(flag: &str, value: String) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

/// The text origin must lie within one panel span of the top-left corner
/// in either direction.
fn check_origin(origin: (i32, i32), geometry: PanelGeometry) -> Result<(), CliError> {
    let (width, height) = (geometry.width(), geometry.height());
    let within = |value: i32, span: u32| i64::from(value).abs() < i64::from(span);
    if within(origin.0, width) && within(origin.1, height) {
        Ok(())
    } else {
        Err(CliError::OriginOutsidePanel {
            origin,
            width,
            height,
        })
    }
}

fn positive(flag: &str, value: String) -> Result<u32, CliError> {
    match number::<u32>(flag, value.clone())? {
        0 => Err(CliError::InvalidValue {
            flag: flag.to_string(),
            value,
        }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, CliError> {
        Opts::parse_from(args.iter().map(|s| s.to_string()), |_| None)
    }

    fn run(args: &[&str]) -> Opts {
        match parse(args) {
            Ok(Command::Run(opts)) => opts,
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn defaults_with_font_only() {
        let opts = run(&["-f", "6x13.bdf"]);
        assert_eq!(opts.font, PathBuf::from("6x13.bdf"));
        assert_eq!(opts.origin, (0, 0));
        assert_eq!(opts.background, Rgb::BLACK);
        assert_eq!(opts.geometry, PanelGeometry::default());
        assert_eq!(opts.fifo, PathBuf::from("/tmp/led_matrix_fifo"));
        assert_eq!(opts.renderer, RendererKind::Terminal);
    }

    #[test]
    fn reference_deployment_command_line() {
        let opts = run(&[
            "--led-rows=32",
            "--led-cols=64",
            "-f",
            "fonts/6x13.bdf",
            "--led-gpio-mapping=adafruit-hat",
            "-x",
            "4",
            "-y",
            "2",
        ]);
        assert_eq!(opts.origin, (4, 2));
        assert_eq!(opts.geometry.width(), 64);
        assert_eq!(opts.geometry.height(), 32);
        assert_eq!(opts.panel_flags, vec!["--led-gpio-mapping=adafruit-hat"]);
    }

    #[test]
    fn panel_driver_flags_are_collected() {
        let opts = run(&[
            "-f",
            "a.bdf",
            "--led-slowdown-gpio",
            "2",
            "--led-brightness=60",
            "--led-parallel",
            "1",
            "--led-no-hardware-pulse",
            "--led-show-refresh",
        ]);
        assert_eq!(
            opts.panel_flags,
            vec![
                "--led-slowdown-gpio=2",
                "--led-brightness=60",
                "--led-parallel=1",
                "--led-no-hardware-pulse",
                "--led-show-refresh",
            ]
        );
        assert_eq!(
            parse(&["-f", "a.bdf", "--led-gpio-mapping"]),
            Err(CliError::MissingValue("--led-gpio-mapping".into()))
        );
    }

    #[test]
    fn origin_must_lie_within_the_panel() {
        assert_eq!(run(&["-f", "a", "-x", "31", "-y", "-31"]).origin, (31, -31));
        assert_eq!(
            parse(&["-f", "a", "-y", "2147483642"]),
            Err(CliError::OriginOutsidePanel {
                origin: (0, 2_147_483_642),
                width: 32,
                height: 32,
            })
        );
        assert!(matches!(
            parse(&["-f", "a", "--x=-2147483648"]),
            Err(CliError::OriginOutsidePanel { .. })
        ));
        // Geometry flags given after the origin still count.
        assert_eq!(run(&["-f", "a", "-x", "40", "--led-cols=64"]).origin, (40, 0));
    }

    #[test]
    fn long_flags_take_inline_values() {
        let opts = run(&[
            "--font=a.bdf",
            "--background=0,0,40",
            "--layout=2",
            "--fifo=/run/led",
            "--renderer=headless",
            "--x=-3",
        ]);
        assert_eq!(opts.background, Rgb::new(0, 0, 40));
        assert_eq!(opts.geometry.chain, 2);
        assert_eq!(opts.fifo, PathBuf::from("/run/led"));
        assert_eq!(opts.renderer, RendererKind::Headless);
        assert_eq!(opts.origin.0, -3);
    }

    #[test]
    fn font_is_required() {
        assert_eq!(parse(&["-x", "1"]), Err(CliError::MissingFont));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(&["-f", "a", "-B", "1,2"]),
            Err(CliError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(&["-f", "a", "--led-rows=0"]),
            Err(CliError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(&["-f", "a", "--renderer=matrix"]),
            Err(CliError::InvalidValue { .. })
        ));
        assert_eq!(parse(&["-f"]), Err(CliError::MissingValue("-f".into())));
        assert_eq!(
            parse(&["-f", "a", "--bogus"]),
            Err(CliError::Unknown("--bogus".into()))
        );
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["--help"]), Ok(Command::Help));
        assert_eq!(parse(&["-V"]), Ok(Command::Version));
    }

    #[test]
    fn environment_is_overridden_by_flags() {
        let env = |key: &str| match key {
            "LEDPIPE_FONT" => Some("env.bdf".to_string()),
            "LEDPIPE_FIFO" => Some("/env/fifo".to_string()),
            "LEDPIPE_RENDERER" => Some("headless".to_string()),
            _ => None,
        };
        let from_env = match Opts::parse_from(Vec::<String>::new(), env) {
            Ok(Command::Run(opts)) => opts,
            other => panic!("unexpected: {other:?}"),
        };
        assert_eq!(from_env.font, PathBuf::from("env.bdf"));
        assert_eq!(from_env.fifo, PathBuf::from("/env/fifo"));
        assert_eq!(from_env.renderer, RendererKind::Headless);

        let overridden = match Opts::parse_from(vec!["--fifo=/flag".to_string()], env) {
            Ok(Command::Run(opts)) => opts,
            other => panic!("unexpected: {other:?}"),
        };
        assert_eq!(overridden.fifo, PathBuf::from("/flag"));
    }

    #[test]
    fn help_text_documents_env_vars() {
        assert!(HELP_TEXT.contains("LEDPIPE_FONT"));
        assert!(HELP_TEXT.contains("LEDPIPE_LOG"));
        assert!(!VERSION.is_empty());
    }
}
