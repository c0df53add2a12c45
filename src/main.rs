//! cvterm - an interactive terminal-styled CV
//!
//! cvterm presents a personal CV as an emulated terminal session: commands
//! typed at the prompt (`about`, `experience`, ...) play the matching CV
//! section back character-by-character, typewriter-style.
//!
//! # Quick Start
//!
//! ```text
//! cvterm                   # built-in sample CV
//! cvterm -c my-cv.toml     # explicit config
//! cvterm -s 4              # faster typing (4ms per character)
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | Enter | Run the typed command |
//! | Backspace | Erase one character |
//! | Ctrl+C | Interrupt a running animation |
//! | Ctrl+D | Quit (at the prompt) |
//!
//! Configuration lives in `~/.cvterm/config.toml`; see `config.rs` for the
//! schema.

mod config;
mod core;
mod ui;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{Color, Config};
use crate::core::{Controller, Flow, FrameClock};
use crate::ui::{Capability, Screen, Term};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Poll timeout while idle at the prompt
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Command line options
#[derive(Default)]
struct Args {
    /// Explicit config file path
    config: Option<PathBuf>,
    /// Typing interval override, milliseconds per character
    speed: Option<u64>,
}

fn print_version() {
    eprintln!("cvterm {}", VERSION);
}

fn print_help() {
    eprintln!("cvterm {} - an interactive terminal-styled CV", VERSION);
    eprintln!();
    eprintln!("Usage: cvterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <FILE>   Config file (default: ~/.cvterm/config.toml)");
    eprintln!("  -s, --speed <MS>      Milliseconds per animated character");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Inside the terminal:");
    eprintln!("  help                  List available commands");
    eprintln!("  fullcv                Play every CV section in order");
    eprintln!("  Ctrl+C                Interrupt a running animation");
    eprintln!("  Ctrl+D                Quit");
    eprintln!();
    eprintln!("Configuration: ~/.cvterm/config.toml");
}

fn parse_args() -> Result<Args, String> {
    let argv: Vec<String> = env::args().collect();
    let mut args = Args::default();
    let mut i = 1;

    while i < argv.len() {
        match argv[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= argv.len() {
                    return Err("Missing config file argument".to_string());
                }
                args.config = Some(PathBuf::from(&argv[i]));
            }
            "-s" | "--speed" => {
                i += 1;
                if i >= argv.len() {
                    return Err("Missing speed argument".to_string());
                }
                args.speed = Some(
                    argv[i]
                        .parse()
                        .map_err(|_| format!("Invalid speed: {}", argv[i]))?,
                );
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(args)
}

/// Initialize logging to `~/.cvterm/cvterm.log`. Stdout is the display
/// surface, so logs never go there.
fn init_logging() {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);

    let log_path = home
        .map(|h| h.join(".cvterm").join("cvterm.log"))
        .unwrap_or_else(|| PathBuf::from("cvterm.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("cvterm {} starting...", VERSION);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(speed) = args.speed {
        config.terminal.typing_interval_ms = speed;
    }
    config.validate()?;

    info!(
        "Commands: {}, sections: {}",
        config.cv.commands.len(),
        config.cv.sections.len()
    );

    run_terminal(config)
}

fn run_terminal(config: Config) -> anyhow::Result<()> {
    let foreground = Color::parse(&config.terminal.foreground)?;
    let background = Color::parse(&config.terminal.background)?;

    let mut capabilities = Vec::new();
    if config.terminal.resize_fit {
        capabilities.push(Capability::ResizeFit);
    }
    if config.terminal.hyperlinks {
        capabilities.push(Capability::Hyperlinks);
    }

    let (cols, rows) = Screen::size()?;
    info!("Terminal size: {}x{}", cols, rows);

    let frame = Duration::from_millis(config.terminal.typing_interval_ms.max(1));

    let mut screen = Screen::init(foreground, background, config.terminal.cursor_blink)?;

    let term = Term::new(io::stdout(), capabilities, cols, rows);
    let mut controller = Controller::new(term, config.cv);

    let result = run_main_loop(&mut controller, frame);

    // Cleanup, then reset via raw escapes in case the guard path failed
    let _ = screen.cleanup();
    print!("\x1b[?1049l"); // Leave alternate screen
    print!("\x1b[?25h"); // Show cursor
    print!("\x1b[0m"); // Reset attributes
    let _ = io::stdout().flush();

    result
}

/// Main event loop: the frame source for the typewriter animation. While a
/// section is playing, at most one character is emitted per elapsed frame
/// interval; input and resize events are observed between characters. Frame
/// pacing is wall-clock based, so event bursts (key autorepeat wakes the
/// poll early) do not speed up the typing.
fn run_main_loop(controller: &mut Controller<io::Stdout>, frame: Duration) -> anyhow::Result<()> {
    controller.start()?;
    let mut clock = FrameClock::new(frame);

    loop {
        if controller.is_animating() && clock.due() {
            controller.tick()?;
        }

        let timeout = if controller.is_animating() {
            clock.timeout()
        } else {
            IDLE_POLL
        };

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key_event) => {
                    if key_event.kind != KeyEventKind::Press {
                        continue;
                    }
                    if controller.handle_key(key_event)? == Flow::Exit {
                        info!("Exiting on Ctrl+D");
                        break;
                    }
                }
                Event::Resize(cols, rows) => {
                    info!("Resize: {}x{}", cols, rows);
                    controller.fit(cols, rows);
                }
                _ => {}
            }
        }
    }

    Ok(())
}
