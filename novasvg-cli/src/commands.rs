//! Subcommand implementations.
//!
//! Every command writes its report to the given writer, so the binary
//! passes stdout and tests pass a buffer.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use novasvg::{
    add_font_face_from_file, font_face_count, font_families, load_font_file, load_fonts_dir,
    load_system_fonts, Bitmap, BitmapExporter, Document, ExportConfig, ExportFormat, NovaResult,
};
use tracing::{debug, info, warn};

use crate::report::{DocumentInfo, MatchInfo};
use crate::{CliArgs, Command, ConvertArgs, ConvertOptions, FontCommand};

/// Register the requested fonts, then run the subcommand.
///
/// With `--quiet` nothing is written to `out`.
///
/// # Errors
///
/// Returns the first failure with context describing the file involved.
/// `batch` fails if any file failed.
pub fn run(args: &CliArgs, out: &mut dyn Write) -> Result<()> {
    let mut sink = io::sink();
    let out: &mut dyn Write = if args.quiet { &mut sink } else { &mut *out };

    register_fonts(args)?;

    match &args.command {
        Command::Convert(convert_args) => convert(convert_args, out),
        Command::Info { input, json } => info_command(input, *json, out),
        Command::Query {
            selector,
            input,
            json,
        } => query(selector, input, *json, out),
        Command::ApplyCss {
            css,
            input,
            output,
            render,
        } => apply_css(css, input, output, &ConvertOptions::from(render), out),
        Command::Font(font_command) => font(font_command, out),
        Command::Batch {
            input_dir,
            output_dir,
            render,
        } => batch(input_dir, output_dir, &ConvertOptions::from(render), out),
    }
}

fn register_fonts(args: &CliArgs) -> Result<()> {
    for path in &args.fonts {
        let faces = load_font_file(path)
            .with_context(|| format!("failed to load font {}", path.display()))?;
        debug!(path = %path.display(), faces, "registered font file");
    }

    if let Some(dir) = &args.font_dir {
        if load_fonts_dir(dir) == 0 {
            warn!(dir = %dir.display(), "no fonts found in font directory");
        }
    }

    if args.system_fonts {
        let faces = load_system_fonts();
        debug!(faces, "registered system fonts");
    }

    Ok(())
}

fn load(path: &Path) -> Result<Document> {
    novasvg::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        bail!(
            "{} already exists (use -f to overwrite)",
            path.display()
        );
    }
    Ok(())
}

fn convert(args: &ConvertArgs, out: &mut dyn Write) -> Result<()> {
    let options = ConvertOptions::from(&args.render);
    ensure_writable(&args.output, options.force)?;

    writeln!(
        out,
        "Converting: {} -> {}",
        args.input.display(),
        args.output.display()
    )?;

    let document = load(&args.input)?;
    let bitmap = render(&document, &options)?;
    writeln!(out, "Size: {}x{}", bitmap.width(), bitmap.height())?;

    export(&bitmap, &args.output, &options)?;
    info!(output = %args.output.display(), "converted SVG");
    writeln!(out, "Successfully converted to: {}", args.output.display())?;
    Ok(())
}

/// Render the whole document at the requested size.
///
/// A scale multiplies the intrinsic size and takes precedence over
/// explicit width and height.
fn render(document: &Document, options: &ConvertOptions) -> Result<Bitmap> {
    let (width, height) = match options.scale {
        Some(scale) => {
            if !(scale.is_finite() && scale > 0.0) {
                bail!("scale must be a positive number, got {scale}");
            }
            let (width, height) = document.size()?;
            (scaled(width, scale), scaled(height, scale))
        }
        None => (options.width, options.height),
    };

    Ok(document.render_to_bitmap(width, height, options.background)?)
}

#[allow(clippy::cast_possible_truncation)]
fn scaled(length: f32, scale: f32) -> i32 {
    (length * scale).ceil() as i32
}

fn export(bitmap: &Bitmap, output: &Path, options: &ConvertOptions) -> Result<ExportFormat> {
    let mut config = ExportConfig::default();
    // JPEG flattens onto the requested background unless it is transparent.
    if options.background & 0xFF != 0 {
        config.background = options.background.to_be_bytes();
    }

    BitmapExporter::new(config)
        .export_to_file(bitmap, output)
        .with_context(|| format!("failed to write {}", output.display()))
}

fn info_command(input: &Path, json: bool, out: &mut dyn Write) -> Result<()> {
    let document = load(input)?;
    let info = DocumentInfo::collect(input, &document)?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &info)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{info}")?;
    }
    Ok(())
}

fn query(selector: &str, input: &Path, json: bool, out: &mut dyn Write) -> Result<()> {
    let document = load(input)?;
    let matches = document
        .query_selector_all(selector)
        .with_context(|| format!("invalid selector {selector:?}"))?;

    let infos = matches
        .iter()
        .enumerate()
        .map(|(i, element)| MatchInfo::collect(i + 1, element))
        .collect::<NovaResult<Vec<_>>>()?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &infos)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "Found {} element(s) matching: {selector}",
        infos.len()
    )?;
    for info in &infos {
        writeln!(out)?;
        writeln!(out, "{info}")?;
    }
    Ok(())
}

fn apply_css(
    css: &Path,
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let style_sheet = fs::read_to_string(css)
        .with_context(|| format!("failed to read stylesheet {}", css.display()))?;
    ensure_writable(output, options.force)?;

    let mut document = load(input)?;
    document.apply_style_sheet(&style_sheet);
    document.force_layout()?;
    writeln!(out, "Applied stylesheet: {}", css.display())?;

    if has_extension(output, "svg") {
        fs::write(output, document.to_svg_string()?)
            .with_context(|| format!("failed to write {}", output.display()))?;
    } else {
        let bitmap = render(&document, options)?;
        export(&bitmap, output, options)?;
    }

    writeln!(out, "Saved to: {}", output.display())?;
    Ok(())
}

fn font(command: &FontCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        FontCommand::Add {
            family,
            file,
            bold,
            italic,
        } => {
            let faces = add_font_face_from_file(family, *bold, *italic, file)
                .with_context(|| format!("failed to add font {}", file.display()))?;
            writeln!(
                out,
                "Added {faces} face(s) from {} as \"{family}\"",
                file.display()
            )?;
        }
        FontCommand::List { system } => {
            if *system {
                load_system_fonts();
            }
            let families = font_families();
            writeln!(
                out,
                "{} font families ({} faces)",
                families.len(),
                font_face_count()
            )?;
            for family in families {
                writeln!(out, "  {family}")?;
            }
        }
    }
    Ok(())
}

/// Convert every `.svg` file in `input_dir` to a PNG in `output_dir`.
///
/// Existing PNGs are overwritten. Failures are reported and counted; the
/// command fails once all files have been tried.
fn batch(
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read directory {}", input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_extension(path, "svg"))
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        writeln!(out, "No SVG files found in {}", input_dir.display())?;
        return Ok(());
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut failed = 0;
    for input in &inputs {
        let output = png_path(input, output_dir);
        let result = load(input)
            .and_then(|document| render(&document, options))
            .and_then(|bitmap| export(&bitmap, &output, options));

        match result {
            Ok(_) => writeln!(out, "  {} -> {}", input.display(), output.display())?,
            Err(e) => {
                failed += 1;
                warn!(input = %input.display(), error = %e, "batch conversion failed");
                writeln!(out, "  {} FAILED: {e:#}", input.display())?;
            }
        }
    }

    writeln!(
        out,
        "Processed {} file(s): {} succeeded, {failed} failed",
        inputs.len(),
        inputs.len() - failed
    )?;

    if failed > 0 {
        bail!("{failed} of {} file(s) failed to convert", inputs.len());
    }
    Ok(())
}

fn png_path(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map_or_else(|| OsString::from("output"), ToOwned::to_owned);
    name.push(".png");
    output_dir.join(name)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
