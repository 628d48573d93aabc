//! Batch compression of files on disk.
//!
//! Reads each input, decodes it through the pipeline's backend, compresses it
//! with the original bytes attached, and writes the result into one output
//! directory. Files are processed in parallel with
//! [rayon](https://docs.rs/rayon); progress is streamed as [`BatchEvent`]s
//! over an `mpsc` channel so the CLI can print while work continues.
//!
//! A failing file is reported and skipped. Only problems with the output
//! directory abort the batch.
//!
//! ## Output naming
//!
//! ```text
//! input/IMG_0001.HEIC   →  compressed/IMG_0001.heic
//! input/a/photo.jpeg    →  compressed/photo.jpg
//! input/b/photo.png     →  compressed/photo-2.png
//! ```
//!
//! The extension follows the output format, except when the original bytes
//! were kept, in which case the source extension is preserved. Repeated stems
//! get a numeric suffix in input order.

use crate::imaging::{BackendError, CodecBackend, ImageFormat, OutputFormat, Quality};
use crate::pipeline::{CompressError, CompressionPipeline, CompressionRequest};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions picked up when walking a directory. Explicit file arguments are
/// always taken as-is; detection never relies on the extension.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "heif", "tif", "tiff", "webp",
];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Why a single file could not be compressed.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode: {0}")]
    Decode(#[from] BackendError),
    #[error(transparent)]
    Compress(#[from] CompressError),
    #[error("Refusing to overwrite source file {0}")]
    WouldOverwrite(PathBuf),
}

/// What happened to one successfully compressed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub input_format: ImageFormat,
    pub format: OutputFormat,
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub ratio: u32,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub orientation_corrected: bool,
    pub kept_original: bool,
}

impl FileReport {
    /// Original size divided by compressed size.
    pub fn compression_ratio(&self) -> f64 {
        size_ratio(self.input_bytes, self.output_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Totals and per-file results of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl BatchReport {
    pub fn compression_ratio(&self) -> f64 {
        size_ratio(self.input_bytes, self.output_bytes)
    }

    pub fn to_json(&self) -> Result<String, BatchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn size_ratio(input: u64, output: u64) -> f64 {
    if output == 0 {
        0.0
    } else {
        input as f64 / output as f64
    }
}

/// Progress events. `index` is 1-based input position.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize },
    FileCompressed { index: usize, report: FileReport },
    FileFailed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

/// Expand directories into the image files beneath them.
///
/// Files keep argument order; each directory contributes its images sorted
/// by path. Anything under `exclude` (typically the output directory) is
/// skipped so re-runs do not compress their own output.
pub fn collect_inputs(paths: &[PathBuf], exclude: Option<&Path>) -> Result<Vec<PathBuf>, BatchError> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| exclude.is_none_or(|ex| !e.path().starts_with(ex)))
        {
            let entry = entry?;
            if entry.file_type().is_file() && has_image_extension(entry.path()) {
                inputs.push(entry.into_path());
            }
        }
    }
    Ok(inputs)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Compress every input into `output_dir`.
pub fn compress_files<B: CodecBackend>(
    pipeline: &CompressionPipeline<B>,
    inputs: &[PathBuf],
    output_dir: &Path,
    quality: Quality,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    std::fs::create_dir_all(output_dir)?;
    let output_dir = output_dir.canonicalize()?;

    let send = |event: BatchEvent| {
        if let Some(tx) = &events {
            // A dropped receiver only means nobody is listening.
            tx.send(event).ok();
        }
    };

    send(BatchEvent::Started {
        total: inputs.len(),
    });

    let stems = unique_stems(inputs);
    let results: Vec<Result<FileReport, FileError>> = inputs
        .par_iter()
        .zip(stems.par_iter())
        .enumerate()
        .map(|(i, (source, stem))| {
            let result = compress_file(pipeline, source, &output_dir, stem, quality);
            match &result {
                Ok(report) => send(BatchEvent::FileCompressed {
                    index: i + 1,
                    report: report.clone(),
                }),
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "compression failed");
                    send(BatchEvent::FileFailed {
                        index: i + 1,
                        source: source.clone(),
                        error: e.to_string(),
                    });
                }
            }
            result
        })
        .collect();

    let mut report = BatchReport::default();
    for (source, result) in inputs.iter().zip(results) {
        match result {
            Ok(file) => {
                report.input_bytes += file.input_bytes;
                report.output_bytes += file.output_bytes;
                report.files.push(file);
            }
            Err(e) => report.failures.push(FileFailure {
                source: source.clone(),
                error: e.to_string(),
            }),
        }
    }
    Ok(report)
}

fn compress_file<B: CodecBackend>(
    pipeline: &CompressionPipeline<B>,
    source: &Path,
    output_dir: &Path,
    stem: &str,
    quality: Quality,
) -> Result<FileReport, FileError> {
    let original = std::fs::read(source)?;
    let input_format = ImageFormat::detect(&original);
    let bitmap = pipeline.backend().decode(&original)?;
    let (source_width, source_height) = bitmap.dimensions();

    let request = CompressionRequest::new(bitmap)
        .with_original(&original)
        .with_quality(quality);
    let compressed = pipeline.compress(request)?;

    let extension = if compressed.kept_original {
        source_extension(source).unwrap_or_else(|| compressed.format.extension().to_string())
    } else {
        compressed.format.extension().to_string()
    };
    let output = output_dir.join(format!("{stem}.{extension}"));

    if source.canonicalize()? == output {
        return Err(FileError::WouldOverwrite(output));
    }
    std::fs::write(&output, &compressed.bytes)?;

    Ok(FileReport {
        source: source.to_path_buf(),
        output,
        input_format,
        format: compressed.format,
        source_width,
        source_height,
        width: compressed.width,
        height: compressed.height,
        ratio: compressed.ratio,
        input_bytes: original.len() as u64,
        output_bytes: compressed.bytes.len() as u64,
        orientation_corrected: compressed.orientation_corrected,
        kept_original: compressed.kept_original,
    })
}

fn source_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// File stems with `-2`, `-3`, ... appended to repeats (case-insensitive).
///
/// A suffixed stem never matches another input's own stem, so every output
/// name is distinct.
fn unique_stems(inputs: &[PathBuf]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    inputs
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let key = stem.to_lowercase();
            if taken.insert(key.clone()) {
                return stem;
            }
            let suffix = next_suffix.entry(key).or_insert(1);
            loop {
                *suffix += 1;
                let candidate = format!("{stem}-{suffix}");
                if taken.insert(candidate.to_lowercase()) {
                    return candidate;
                }
            }
        })
        .collect()
}
