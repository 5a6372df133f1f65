use clap::Parser;
use power_balance::analysis::analyze_with;
use power_balance::analysis::decode::{DecoderConfig, FitDecoder};
use power_balance::report::render_report;
use power_balance::validation::read_fit_file;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Print power balance, torque effectiveness and pedal smoothness for a FIT file.
#[derive(Debug, Parser)]
#[command(name = "parse-fit", version)]
struct Args {
    /// Path to the .fit activity file.
    path: PathBuf,

    /// Print the analysis as JSON instead of a text report.
    #[arg(long)]
    json: bool,

    /// Decode even when the file's CRC checks fail.
    #[arg(long)]
    skip_crc: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let path = std::path::absolute(&args.path).unwrap_or(args.path);

    let bytes = match read_fit_file(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{} is not a usable FIT file: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let config = if args.skip_crc {
        DecoderConfig::lenient()
    } else {
        DecoderConfig::default()
    };

    let result = match analyze_with(&FitDecoder::new(config), &bytes) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Error parsing FIT file: {err}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("Unable to serialize analysis: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", render_report(&result));
    }

    ExitCode::SUCCESS
}
