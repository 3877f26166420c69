//! sdkgen - generates a typed Rust client crate from an OpenAPI description.

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sdkgen_lib::config::{GeneratorConfig, RunOptions, SpecSource};
use sdkgen_lib::errors::GeneratorError;
use sdkgen_lib::loader::{load_document, load_locations};
use sdkgen_lib::output::generate;

/// Generate a strongly-typed Rust API client from an OpenAPI or Swagger document
#[derive(Parser, Debug)]
#[command(name = "sdkgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use the development API description instead of production
    #[arg(long)]
    dev: bool,

    /// Local file or URL of the API description (overrides --dev)
    #[arg(long, value_name = "PATH_OR_URL")]
    path: Option<String>,

    /// Root directory of the generated crate
    #[arg(short, long, value_name = "DIR", default_value = "generated/solcast")]
    output: PathBuf,

    /// JSON file with the static location table
    #[arg(long, value_name = "FILE")]
    locations: Option<PathBuf>,

    /// TOML generator configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print generated files without writing them
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,sdkgen_lib=info".to_string(),
            2 => "info,sdkgen_lib=debug".to_string(),
            _ => "debug,sdkgen_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

async fn run(config: &GeneratorConfig, options: &RunOptions) -> Result<usize, GeneratorError> {
    let document = load_document(&options.source).await?;
    let locations = match &options.locations {
        Some(path) => load_locations(path)?,
        None => Vec::new(),
    };

    let output = generate(&document, config, &locations)?;
    if options.dry_run {
        output.print();
    } else {
        output.write(&options.output)?;
    }
    Ok(output.files.len())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let config = match &cli.config {
        Some(path) => GeneratorConfig::load(path),
        None => Ok(GeneratorConfig::from_env()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let options = RunOptions {
        source: SpecSource::from_flags(cli.dev, cli.path),
        output: cli.output,
        locations: cli.locations,
        dry_run: cli.dry_run,
    };
    info!(source = %options.source.location(), output = %options.output.display(), "sdkgen starting");

    match run(&config, &options).await {
        Ok(files) if options.dry_run => {
            eprintln!("{} {} files (dry run, nothing written)", "Generated".green().bold(), files);
        }
        Ok(files) => {
            println!(
                "{} {} files for crate '{}' in {}",
                "Generated".green().bold(),
                files,
                config.crate_name,
                options.output.display()
            );
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
