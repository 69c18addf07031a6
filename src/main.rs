use clap::{Parser, Subcommand};
use folio_images::imaging::RustBackend;
use folio_images::{config, convert, discover, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio-images")]
#[command(about = "Responsive image pipeline for a portfolio site")]
#[command(long_about = "\
Responsive image pipeline for a portfolio site

Walks the input directory for jpg, jpeg, png, gif, tiff and bmp files and
writes, into a mirrored output tree:

  public/images/
  ├── image-manifest.json          # Every derivative with size and mtime
  └── work/
      ├── hero-small.avif          # One AVIF per breakpoint ≤ source width
      ├── hero-small.jpg           # Fallback for JPEG (or .png for PNG) sources
      ├── ...
      └── hero.avif                # Full-size AVIF

Default breakpoints: small=400, medium=800, large=1200, extra-large=1600.
Default quality: avif=80, jpeg=85, png=90.

Settings are read from --config, or folio-images.toml in the working
directory when present. Run 'folio-images gen-config' for a documented file.

Set RUST_LOG=info (or debug) for structured logs on stderr.")]
#[command(version = version_string())]
struct Cli {
    /// Input directory (overrides `input_dir`)
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Output directory (overrides `output_dir`)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file (default: ./folio-images.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every image and write the manifest (default)
    Convert,
    /// List the images a conversion would pick up, without converting
    Check,
    /// Print a stock folio-images.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command.unwrap_or(Command::Convert) {
        Command::Convert => {
            let config = load_config(cli.config, cli.input, cli.output)?;
            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_convert_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = convert::run_with_backend(&RustBackend::new(), &config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let summary = result?;
            println!();
            output::print_summary(&summary);
        }
        Command::Check => {
            let config = load_config(cli.config, cli.input, cli.output)?;
            let images = discover::discover_images(&config.input_dir)?;
            output::print_check_output(&images, &config.input_dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Config file (or stock defaults) with the CLI directory flags applied.
fn load_config(
    file: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<config::Config, config::ConfigError> {
    let config = config::load_config(file.as_deref())?.with_dirs(input, output);
    config.validate()?;
    Ok(config)
}

/// Structured logs go to stderr; stdout carries the progress display.
///
/// Defaults to `warn` so only failures show up next to the progress lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
