use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
#[cfg(not(feature = "heif"))]
use wicompress::imaging::RustBackend;
use wicompress::imaging::{detect, luban_ratio};
use wicompress::pipeline::CompressionPipeline;
use wicompress::{batch, config, output};

#[derive(Parser)]
#[command(name = "wicompress")]
#[command(about = "Compress photos for upload")]
#[command(long_about = "\
Compress photos for upload

Each image is downscaled by an integer ratio chosen from its size and aspect
(Luban bands), re-encoded in its own family (JPEG stays JPEG, PNG stays PNG,
HEIC stays HEIC) and written to the output directory. HEIC Live Photos get
their orientation repaired before encoding.

  wicompress compress photos/ -o upload/ -q 0.7
  wicompress detect IMG_0001.HEIC
  wicompress ratio 4032 3024

Set RUST_LOG=wicompress=debug for per-step logging.

Run 'wicompress gen-config' to generate a documented wicompress.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "wicompress.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress files and directories into the output directory
    Compress {
        /// Files or directories to compress
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output directory (overrides output.directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Lossy quality from 0.0 to 1.0, clamped (overrides quality)
        #[arg(short, long)]
        quality: Option<f32>,
        /// Write re-encoded bytes even when they are larger than the input
        #[arg(long)]
        keep_larger: bool,
        /// Print the batch report as JSON instead of progress lines
        #[arg(long)]
        json: bool,
    },
    /// Print the detected container format of each file
    Detect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the Luban ratio and target size for a width and height
    Ratio { width: u32, height: u32 },
    /// Print a stock wicompress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Compress {
            paths,
            output: output_dir,
            quality,
            keep_larger,
            json,
        } => {
            let mut compress_config = config::load_config(&cli.config)?;
            if let Some(q) = quality {
                compress_config.set_quality(q);
            }
            if keep_larger {
                compress_config.never_grow = false;
            }
            compress_config.validate()?;

            init_thread_pool(&compress_config.processing);
            let output_dir =
                output_dir.unwrap_or_else(|| PathBuf::from(&compress_config.output.directory));
            let inputs = batch::collect_inputs(&paths, Some(&output_dir))?;
            #[cfg(feature = "heif")]
            let backend = wicompress::imaging::HeifBackend::new();
            #[cfg(not(feature = "heif"))]
            let backend = RustBackend;
            let pipeline =
                CompressionPipeline::with_options(backend, compress_config.pipeline_options());

            let report = if json {
                batch::compress_files(
                    &pipeline,
                    &inputs,
                    &output_dir,
                    compress_config.quality(),
                    None,
                )?
            } else {
                let (tx, rx) = std::sync::mpsc::channel();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_batch_event(&event) {
                            println!("{}", line);
                        }
                    }
                });
                let report = batch::compress_files(
                    &pipeline,
                    &inputs,
                    &output_dir,
                    compress_config.quality(),
                    Some(tx),
                );
                printer.join().map_err(|_| "progress printer panicked")?;
                report?
            };

            if json {
                println!("{}", report.to_json()?);
            } else {
                output::print_batch_summary(&report);
            }
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Detect { files } => {
            let mut detected = Vec::with_capacity(files.len());
            for file in &files {
                let bytes = std::fs::read(file)?;
                detected.push((file.as_path(), detect(&bytes)));
            }
            output::print_detect_output(&detected);
        }
        Command::Ratio { width, height } => {
            let ratio = luban_ratio(width, height)?;
            output::print_ratio_output(width, height, ratio);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never exceeds the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
