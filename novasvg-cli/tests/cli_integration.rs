//! Integration tests for the novasvg CLI.
//!
//! Commands run in-process against temp directories; output is captured
//! in a buffer.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use novasvg_cli::{run, CliArgs};

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
  <rect id="left" class="half" x="0" y="0" width="20" height="20" fill="#ff0000"/>
  <g transform="translate(20 0)">
    <rect id="right" class="half" width="20" height="20" stroke="black"/>
  </g>
</svg>"##;

const PNG_MAGIC: [u8; 4] = [137, 80, 78, 71];

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn novasvg(args: &[&str]) -> (anyhow::Result<()>, String) {
    let args = CliArgs::try_parse_from(std::iter::once("novasvg").chain(args.iter().copied()))
        .expect("valid arguments");
    let mut out = Vec::new();
    let result = run(&args, &mut out);
    (result, String::from_utf8(out).expect("utf8 output"))
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

// ==========================================================================
// convert
// ==========================================================================

#[test]
fn test_convert_to_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let output = dir.path().join("logo.png");

    let (result, out) = novasvg(&["convert", arg(&input), arg(&output)]);
    result.expect("convert");
    assert!(out.contains("Converting:"));
    assert!(out.contains("Size: 40x20"));
    assert!(out.contains("Successfully converted to:"));
    assert_eq!(fs::read(&output).expect("png")[..4], PNG_MAGIC);
}

#[test]
fn test_convert_with_width_and_scale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);

    let output = dir.path().join("wide.png");
    let (result, out) = novasvg(&["convert", "-w", "80", arg(&input), arg(&output)]);
    result.expect("convert");
    assert!(out.contains("Size: 80x40"));

    let output = dir.path().join("half.png");
    let (result, out) = novasvg(&["convert", "-s", "0.5", arg(&input), arg(&output)]);
    result.expect("convert");
    assert!(out.contains("Size: 20x10"));
}

#[test]
fn test_convert_refuses_overwrite_without_force() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let output = write(dir.path(), "logo.png", "existing");

    let (result, _) = novasvg(&["convert", arg(&input), arg(&output)]);
    let err = result.expect_err("existing output");
    assert!(err.to_string().contains("already exists"));
    assert_eq!(fs::read_to_string(&output).expect("read"), "existing");

    let (result, _) = novasvg(&["convert", "-f", arg(&input), arg(&output)]);
    result.expect("forced convert");
    assert_eq!(fs::read(&output).expect("png")[..4], PNG_MAGIC);
}

#[test]
fn test_convert_to_jpeg_with_background() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let output = dir.path().join("logo.jpg");

    let (result, _) = novasvg(&["convert", "--bg", "FFFFFFFF", arg(&input), arg(&output)]);
    result.expect("convert");
    assert_eq!(fs::read(&output).expect("jpeg")[..2], [0xFF, 0xD8]);
}

#[test]
fn test_convert_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);

    let (result, _) = novasvg(&["convert", arg(&input), arg(&dir.path().join("logo.gif"))]);
    assert!(result.is_err());

    let missing = dir.path().join("missing.svg");
    let (result, _) = novasvg(&["convert", arg(&missing), arg(&dir.path().join("m.png"))]);
    let err = result.expect_err("missing input");
    assert!(format!("{err:#}").contains("failed to load"));
}

// ==========================================================================
// info and query
// ==========================================================================

#[test]
fn test_info_text_and_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);

    let (result, out) = novasvg(&["info", arg(&input)]);
    result.expect("info");
    assert!(out.contains("Size: 40x20"));
    assert!(out.contains("Elements: 4"));
    assert!(out.contains("  rect: 2"));

    let (result, out) = novasvg(&["info", "--json", arg(&input)]);
    result.expect("info");
    let json: serde_json::Value = serde_json::from_str(&out).expect("json");
    assert_eq!(json["width"], 40.0);
    assert_eq!(json["elements_by_tag"]["g"], 1);
    assert_eq!(json["text_nodes"], 0);
}

#[test]
fn test_query_reports_boxes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);

    let (result, out) = novasvg(&["query", "rect.half", arg(&input)]);
    result.expect("query");
    assert!(out.starts_with("Found 2 element(s) matching: rect.half"));
    assert!(out.contains("  ID: left"));
    assert!(out.contains("  Fill: #ff0000"));
    assert!(out.contains("  Stroke: black"));

    let (result, out) = novasvg(&["query", "--json", "g > rect", arg(&input)]);
    result.expect("query");
    let json: serde_json::Value = serde_json::from_str(&out).expect("json");
    let matches = json.as_array().expect("array");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["id"], "right");
    assert_eq!(matches[0]["bounding_box"]["x"], 0.0);
    assert_eq!(matches[0]["global_bounding_box"]["x"], 20.0);
    assert!(matches[0].get("fill").is_none());
}

#[test]
fn test_query_invalid_selector() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);

    let (result, _) = novasvg(&["query", "rect[", arg(&input)]);
    let err = result.expect_err("bad selector");
    assert!(err.to_string().contains("invalid selector"));
}

// ==========================================================================
// apply-css
// ==========================================================================

#[test]
fn test_apply_css_writes_svg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let css = write(dir.path(), "style.css", "#right { fill: blue }");
    let output = dir.path().join("styled.svg");

    let (result, out) = novasvg(&["apply-css", arg(&css), arg(&input), arg(&output)]);
    result.expect("apply-css");
    assert!(out.contains("Saved to:"));

    let markup = fs::read_to_string(&output).expect("svg");
    assert!(markup.contains("<style>#right { fill: blue }</style>"));
    assert!(markup.contains("id=\"left\""));
}

#[test]
fn test_apply_css_renders_image() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let css = write(dir.path(), "style.css", "rect { fill: green }");
    let output = dir.path().join("styled.png");

    let (result, _) = novasvg(&["apply-css", arg(&css), arg(&input), arg(&output)]);
    result.expect("apply-css");
    assert_eq!(fs::read(&output).expect("png")[..4], PNG_MAGIC);
}

#[test]
fn test_apply_css_missing_stylesheet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let css = dir.path().join("none.css");

    let (result, _) = novasvg(&["apply-css", arg(&css), arg(&input), arg(&dir.path().join("o.svg"))]);
    let err = result.expect_err("missing css");
    assert!(err.to_string().contains("failed to read stylesheet"));
}

// ==========================================================================
// batch
// ==========================================================================

#[test]
fn test_batch_converts_svg_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).expect("mkdir");
    write(&inputs, "a.svg", LOGO);
    write(&inputs, "B.SVG", LOGO);
    write(&inputs, "notes.txt", "skip me");
    let outputs = dir.path().join("out");

    let (result, out) = novasvg(&["batch", arg(&inputs), arg(&outputs)]);
    result.expect("batch");
    assert!(out.contains("Processed 2 file(s): 2 succeeded, 0 failed"));
    assert!(outputs.join("a.png").exists());
    assert!(outputs.join("B.png").exists());
    assert!(!outputs.join("notes.png").exists());
}

#[test]
fn test_batch_reports_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).expect("mkdir");
    write(&inputs, "good.svg", LOGO);
    write(&inputs, "broken.svg", "<svg");
    let outputs = dir.path().join("out");

    let (result, out) = novasvg(&["batch", arg(&inputs), arg(&outputs)]);
    let err = result.expect_err("one file failed");
    assert!(err.to_string().contains("1 of 2"));
    assert!(out.contains("broken.svg FAILED"));
    assert!(outputs.join("good.png").exists());
}

#[test]
fn test_batch_empty_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (result, out) = novasvg(&["batch", arg(dir.path()), arg(&dir.path().join("out"))]);
    result.expect("batch");
    assert!(out.contains("No SVG files found"));
}

// ==========================================================================
// Global flags and fonts
// ==========================================================================

#[test]
fn test_quiet_suppresses_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);

    let (result, out) = novasvg(&["-q", "info", arg(&input)]);
    result.expect("info");
    assert!(out.is_empty());
}

#[test]
fn test_font_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "logo.svg", LOGO);
    let not_a_font = write(dir.path(), "fake.ttf", "not a font");

    let (result, _) = novasvg(&["font", "add", "Fake", arg(&not_a_font)]);
    assert!(result.is_err());

    let (result, _) = novasvg(&["--font", arg(&not_a_font), "info", arg(&input)]);
    let err = result.expect_err("bad font");
    assert!(err.to_string().contains("failed to load font"));
}

#[test]
fn test_font_list() {
    let (result, out) = novasvg(&["font", "list"]);
    result.expect("list");
    assert!(out.contains("font families"));
}
