//! # NovaSVG CLI
//!
//! The `novasvg` command-line tool.
//!
//! ## Usage
//!
//! ```bash
//! novasvg convert input.svg output.png
//! novasvg convert -w 800 -H 600 input.svg output.png
//! novasvg info input.svg
//! novasvg query "rect" input.svg
//! novasvg apply-css styles.css input.svg output.svg
//! novasvg font add "Arial" regular.ttf
//! novasvg batch data/ output/
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ConvertOptions` - Render settings shared by `convert`, `apply-css` and `batch`
//! - [`commands`] - One function per subcommand, writing to any `io::Write`
//! - [`report`] - Serializable `info` and `query` results

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;
pub mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use commands::run;

/// Command-line arguments for `novasvg`.
#[derive(Debug, Clone, Parser)]
#[command(name = "novasvg")]
#[command(about = "NovaSVG CLI - SVG processing tool")]
#[command(version)]
pub struct CliArgs {
    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Font file to register before running the command (repeatable)
    #[arg(long = "font", value_name = "FILE", global = true)]
    pub fonts: Vec<PathBuf>,

    /// Directory of fonts to register before running the command
    #[arg(long, value_name = "DIR", env = "NOVASVG_FONT_DIR", global = true)]
    pub font_dir: Option<PathBuf>,

    /// Register the fonts installed on this system
    #[arg(long, global = true)]
    pub system_fonts: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Convert SVG to PNG or JPEG
    Convert(ConvertArgs),

    /// Display SVG information
    Info {
        /// Input SVG file
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Query elements using CSS selectors
    Query {
        /// CSS selector, e.g. "g > rect.shape"
        selector: String,
        /// Input SVG file
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Apply a CSS stylesheet to SVG
    ApplyCss {
        /// CSS file
        css: PathBuf,
        /// Input SVG file
        input: PathBuf,
        /// Output file: `.svg` writes restyled markup, `.png`/`.jpg` renders
        output: PathBuf,
        /// Render settings for image output
        #[command(flatten)]
        render: RenderArgs,
    },

    /// Manage fonts
    #[command(subcommand)]
    Font(FontCommand),

    /// Convert every SVG file in a directory to PNG
    Batch {
        /// Directory containing `.svg` files
        input_dir: PathBuf,
        /// Directory for the PNG files
        #[arg(default_value = "output")]
        output_dir: PathBuf,
        /// Render settings
        #[command(flatten)]
        render: RenderArgs,
    },
}

/// Arguments of `convert`.
#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Input SVG file
    pub input: PathBuf,
    /// Output image (`.png`, `.jpg` or `.jpeg`)
    pub output: PathBuf,
    /// Render settings
    #[command(flatten)]
    pub render: RenderArgs,
}

/// Render settings shared by several commands.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Output width in pixels (default: auto)
    #[arg(short, long)]
    pub width: Option<i32>,

    /// Output height in pixels (default: auto)
    #[arg(short = 'H', long)]
    pub height: Option<i32>,

    /// Background colour as hex RRGGBBAA (default: transparent)
    #[arg(short, long = "bg", value_parser = parse_color)]
    pub background: Option<u32>,

    /// Scale factor applied to the intrinsic size
    #[arg(short, long)]
    pub scale: Option<f32>,

    /// Overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

/// Font management subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum FontCommand {
    /// Add a font face from a file
    Add {
        /// Family name to register the face under
        family: String,
        /// Font file (TTF, OTF or collection)
        file: PathBuf,
        /// Register as bold
        #[arg(long)]
        bold: bool,
        /// Register as italic
        #[arg(long)]
        italic: bool,
    },

    /// List registered font families
    List {
        /// Include the fonts installed on this system
        #[arg(long)]
        system: bool,
    },
}

/// Render settings resolved from [`RenderArgs`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Target width; zero or less is automatic.
    pub width: i32,
    /// Target height; zero or less is automatic.
    pub height: i32,
    /// Background as `0xRRGGBBAA`.
    pub background: u32,
    /// Multiplier for the intrinsic size. Overrides width and height.
    pub scale: Option<f32>,
    /// Overwrite existing output files.
    pub force: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            width: novasvg::AUTO_SIZE,
            height: novasvg::AUTO_SIZE,
            background: novasvg::TRANSPARENT,
            scale: None,
            force: false,
        }
    }
}

impl From<&RenderArgs> for ConvertOptions {
    fn from(args: &RenderArgs) -> Self {
        let defaults = Self::default();
        Self {
            width: args.width.unwrap_or(defaults.width),
            height: args.height.unwrap_or(defaults.height),
            background: args.background.unwrap_or(defaults.background),
            scale: args.scale,
            force: args.force,
        }
    }
}

/// Parse a hex colour: `RRGGBBAA` or `RRGGBB` (opaque), optionally
/// prefixed with `#` or `0x`.
///
/// # Errors
///
/// Returns a message describing the problem.
pub fn parse_color(text: &str) -> Result<u32, String> {
    let hex = text
        .strip_prefix('#')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let value = u32::from_str_radix(hex, 16)
        .map_err(|e| format!("invalid hex colour {text:?}: {e}"))?;
    match hex.len() {
        8 => Ok(value),
        6 => Ok((value << 8) | 0xFF),
        _ => Err(format!(
            "invalid hex colour {text:?}: expected RRGGBBAA or RRGGBB"
        )),
    }
}
