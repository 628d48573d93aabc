//! CLI output formatting.
//!
//! Output is **information-centric**: each file leads with its positional
//! index and name, with details on indented context lines.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! Compressing 3 files
//! 001 IMG_0001.jpg
//!     JPEG 4032x3024 → JPEG 2016x1512 (ratio 2)
//!     2.41 MB → 412.8 KB (5.98x)
//!     Output: compressed/IMG_0001.jpg
//! 002 scan.png
//!     PNG 800x600 → PNG 800x600 (ratio 1)
//!     96.0 KB kept (re-encoding would not shrink it)
//!     Output: compressed/scan.png
//! 003 notes.jpg
//!     Failed: Failed to decode: ...
//!
//! Compressed 2 of 3 files: 2.51 MB → 508.8 KB (5.05x)
//! ```
//!
//! ## Detect
//!
//! ```text
//! 001 IMG_0001.HEIC: HEIC/HEIF
//! 002 notes.txt: Unknown
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchReport, FileReport};
use crate::imaging::{ImageFormat, scaled_dimensions};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count (1024-based).
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit >= 2 {
        format!("{:.2} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Original size over compressed size, two decimals.
fn format_ratio(ratio: f64) -> String {
    format!("{:.2}x", ratio)
}

// ============================================================================
// Compress output
// ============================================================================

/// Format the detail lines for one compressed file.
fn file_report_lines(index: usize, report: &FileReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        format_index(index),
        file_name(&report.source)
    )];

    let corrected = if report.orientation_corrected {
        ", orientation corrected"
    } else {
        ""
    };
    lines.push(format!(
        "{}{} {}x{} → {} {}x{} (ratio {}{})",
        indent(1),
        report.input_format,
        report.source_width,
        report.source_height,
        report.format,
        report.width,
        report.height,
        report.ratio,
        corrected
    ));

    if report.kept_original {
        lines.push(format!(
            "{}{} kept (re-encoding would not shrink it)",
            indent(1),
            format_bytes(report.input_bytes)
        ));
    } else {
        lines.push(format!(
            "{}{} → {} ({})",
            indent(1),
            format_bytes(report.input_bytes),
            format_bytes(report.output_bytes),
            format_ratio(report.compression_ratio())
        ));
    }
    lines.push(format!("{}Output: {}", indent(1), report.output.display()));
    lines
}

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Compressing {} {}", total, noun)]
        }
        BatchEvent::FileCompressed { index, report } => file_report_lines(*index, report),
        BatchEvent::FileFailed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

/// Format the end-of-batch summary.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let total = report.files.len() + report.failures.len();
    let mut lines = vec![String::new()];
    if report.files.is_empty() {
        lines.push(format!("Compressed 0 of {} files", total));
    } else {
        lines.push(format!(
            "Compressed {} of {} files: {} → {} ({})",
            report.files.len(),
            total,
            format_bytes(report.input_bytes),
            format_bytes(report.output_bytes),
            format_ratio(report.compression_ratio())
        ));
    }
    let kept = report.files.iter().filter(|f| f.kept_original).count();
    if kept > 0 {
        lines.push(format!("{}{} kept as original", indent(1), kept));
    }
    lines
}

/// Print batch summary to stdout.
pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Detect / ratio output
// ============================================================================

/// Format detected formats, one line per file.
pub fn format_detect_output(results: &[(&Path, ImageFormat)]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(i, (path, format))| {
            format!("{} {}: {}", format_index(i + 1), file_name(path), format)
        })
        .collect()
}

/// Print detected formats to stdout.
pub fn print_detect_output(results: &[(&Path, ImageFormat)]) {
    for line in format_detect_output(results) {
        println!("{}", line);
    }
}

/// Format the Luban ratio for a size and the size it scales to.
pub fn format_ratio_output(width: u32, height: u32, ratio: u32) -> Vec<String> {
    let (target_w, target_h) = scaled_dimensions((width, height), ratio);
    vec![
        format!("{}x{}: ratio {}", width, height, ratio),
        format!("{}Target: {}x{}", indent(1), target_w, target_h),
    ]
}

/// Print ratio output to stdout.
pub fn print_ratio_output(width: u32, height: u32, ratio: u32) {
    for line in format_ratio_output(width, height, ratio) {
        println!("{}", line);
    }
}
