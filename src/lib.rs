pub mod api;
pub mod cli;
pub mod input;
pub mod output;

use std::{env, sync::OnceLock, time::Duration};

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::Cli;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("rackbeat_units", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

/// Runs the CLI and returns the process exit code: 0 on full success, 2 when
/// the batch completed with per-product fetch errors. Fatal conditions
/// (missing token, missing input, no product numbers, write failure) surface
/// as `Err` and exit with code 1 via `main`.
pub fn run() -> Result<i32> {
    init_logging();
    let cli = Cli::parse();
    execute(&cli)
}

pub fn execute(args: &Cli) -> Result<i32> {
    let token = cli::resolve_token(
        args.token.as_deref(),
        env::var(cli::TOKEN_ENV_VAR).ok().as_deref(),
    )?;
    let base_url = env::var(api::API_BASE_ENV_VAR).unwrap_or_else(|_| api::API_BASE.to_string());
    if args.timeout <= 0.0 {
        bail!("--timeout must be a positive number of seconds");
    }
    let timeout = Duration::try_from_secs_f64(args.timeout)
        .map_err(|err| anyhow!("invalid --timeout value: {err}"))?;
    let output_path = cli::resolve_output_path(&args.input, args.output.as_deref());

    let product_numbers = input::read_product_numbers(&args.input, args.delimiter)?;
    if product_numbers.is_empty() {
        bail!(
            "no product numbers found in input file {}",
            args.input.display()
        );
    }
    info!(
        "Fetching units for {} product number(s) from '{}'",
        product_numbers.len(),
        args.input.display()
    );

    let client = api::UnitsClient::new(&base_url, &token, timeout)?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for product_number in &product_numbers {
        match client.fetch_units(product_number) {
            Ok(units) => {
                debug!("{}: {} unit record(s)", product_number, units.len());
                rows.extend(output::to_output_rows(product_number, units));
            }
            Err(err) => errors.push(err),
        }
    }

    output::write_output_csv(&output_path, &rows)?;
    info!(
        "Wrote {} row(s) to {:?} ({} fetch error(s))",
        rows.len(),
        output_path,
        errors.len()
    );

    println!("Processed products: {}", product_numbers.len());
    println!("Output rows written: {}", rows.len());
    println!("Output file: {}", output_path.display());

    if errors.is_empty() {
        Ok(0)
    } else {
        eprintln!("Errors: {}", errors.len());
        for error in &errors {
            eprintln!("- {error}");
        }
        Ok(2)
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
