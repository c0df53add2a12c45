//! Configuration management for cvterm.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.cvterm/config.toml`
//! - Terminal visual settings (colors, cursor, typing speed)
//! - The CV payload: prompt, command registry, section registry, content map
//! - Fail-fast validation of the registries against the content map
//!
//! # Configuration File
//!
//! The configuration file is located at `~/.cvterm/config.toml` (or passed
//! explicitly with `-c <path>`):
//!
//! ```toml
//! [terminal]
//! foreground = "#fafffa"
//! background = "#012456"
//! cursor_blink = true
//! typing_interval_ms = 16
//! resize_fit = true
//! hyperlinks = true
//!
//! [cv]
//! prompt = "root > "
//! welcome = ["Hello...Hello...Hello", "Type 'help' to see available commands."]
//! commands = ["about", "contact", "help", "fullcv"]
//! sections = ["about", "contact"]
//!
//! [cv.content]
//! about = ["Name: ...", "Role: ..."]
//! contact = ["GitHub: ..."]
//! ```
//!
//! Every command other than the built-ins (`help`, `fullcv`) must have a
//! matching entry in `[cv.content]`, and so must every section. A registry
//! entry without content is rejected at startup instead of failing at
//! lookup time mid-session.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands handled by the controller itself rather than the content map.
pub const BUILTIN_COMMANDS: &[&str] = &["help", "fullcv"];

/// Configuration errors reported before the screen is initialized.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid color {0:?}: expected #rrggbb")]
    InvalidColor(String),

    #[error("Command {0:?} has no entry in [cv.content]")]
    CommandWithoutContent(String),

    #[error("Section {0:?} has no entry in [cv.content]")]
    SectionWithoutContent(String),

    #[error("Prompt must not be empty")]
    EmptyPrompt,
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Terminal visual settings
    pub terminal: TerminalConfig,
    /// CV payload: prompt, registries, content
    pub cv: CvConfig,
}

/// Terminal visual settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Foreground color, "#rrggbb"
    pub foreground: String,
    /// Background color, "#rrggbb"
    pub background: String,
    /// Blinking block cursor
    pub cursor_blink: bool,
    /// Delay between animated characters, in milliseconds
    pub typing_interval_ms: u64,
    /// Refit the display on terminal resize
    pub resize_fit: bool,
    /// Wrap URLs in OSC 8 hyperlink escapes
    pub hyperlinks: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            foreground: "#fafffa".to_string(),
            background: "#012456".to_string(),
            cursor_blink: true,
            typing_interval_ms: 16,
            resize_fit: true,
            hyperlinks: true,
        }
    }
}

/// The CV payload consumed by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// Prompt string shown before user input
    pub prompt: String,
    /// Banner lines printed before the first prompt
    pub welcome: Vec<String>,
    /// Command registry; order drives the `help` listing
    pub commands: Vec<String>,
    /// Section registry; order drives `fullcv` playback
    pub sections: Vec<String>,
    /// Section name -> lines of text
    pub content: HashMap<String, Vec<String>>,
}

impl Default for CvConfig {
    fn default() -> Self {
        let mut content = HashMap::new();
        content.insert(
            "about".to_string(),
            vec![
                "Name: Alex Reyes".to_string(),
                "Role: Systems Engineer".to_string(),
                "A systems engineer who enjoys terminals enough to ship a CV as one. \
                 Day job: keeping fleets of Linux boxes honest; after hours: small \
                 Rust tools and the occasional emulator."
                    .to_string(),
            ],
        );
        content.insert(
            "experience".to_string(),
            vec![
                "Systems Engineer | Northwind Hosting (2021 - Present)".to_string(),
                "• Automation for provisioning and fleet upgrades.".to_string(),
                "• On-call tooling, incident runbooks, capacity planning.".to_string(),
                "Junior Administrator | Contoso ISP (2018 - 2021)".to_string(),
                "• Mail, DNS and monitoring for ~200 customer domains.".to_string(),
            ],
        );
        content.insert(
            "education".to_string(),
            vec!["B.Sc. Computer Science, State Technical University (2014 - 2018)".to_string()],
        );
        content.insert(
            "certifications".to_string(),
            vec!["LPIC-2 Linux Engineer".to_string()],
        );
        content.insert(
            "contact".to_string(),
            vec![
                "GitHub: https://github.com/alexreyes-sys".to_string(),
                "Email: alex@example.com".to_string(),
            ],
        );

        Self {
            prompt: "root > ".to_string(),
            welcome: vec![
                "Hello...Hello...Hello".to_string(),
                "Type 'help' to see available commands.".to_string(),
            ],
            commands: vec![
                "about".to_string(),
                "experience".to_string(),
                "education".to_string(),
                "certifications".to_string(),
                "contact".to_string(),
                "help".to_string(),
                "fullcv".to_string(),
            ],
            sections: vec![
                "about".to_string(),
                "experience".to_string(),
                "education".to_string(),
                "certifications".to_string(),
                "contact".to_string(),
            ],
            content,
        }
    }
}

impl Config {
    /// Load configuration. An explicit path is an error if unreadable;
    /// the default path silently falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_file(p),
            None => match Self::get_config_path() {
                Some(p) if p.exists() => Self::load_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".cvterm").join("config.toml"))
    }

    /// Validate the registries against the content map. Called once at
    /// startup so a bad registry entry never surfaces mid-session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cv.prompt.is_empty() {
            return Err(ConfigError::EmptyPrompt);
        }
        for cmd in &self.cv.commands {
            if BUILTIN_COMMANDS.contains(&cmd.as_str()) {
                continue;
            }
            if !self.cv.content.contains_key(cmd) {
                return Err(ConfigError::CommandWithoutContent(cmd.clone()));
            }
        }
        for section in &self.cv.sections {
            if !self.cv.content.contains_key(section) {
                return Err(ConfigError::SectionWithoutContent(section.clone()));
            }
        }
        Color::parse(&self.terminal.foreground)?;
        Color::parse(&self.terminal.background)?;
        Ok(())
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a "#rrggbb" string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(s.to_string()));
        }
        // Indexing is safe: length and digit class checked above.
        let byte = |range| u8::from_str_radix(&hex[range], 16).unwrap_or(0);
        Ok(Self {
            r: byte(0..2),
            g: byte(2..4),
            b: byte(4..6),
        })
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
