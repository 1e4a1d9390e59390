use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;

/// Environment variable consulted when `--token` is not given.
pub const TOKEN_ENV_VAR: &str = "RACKBEAT_BEARER_TOKEN";

/// Output file name used when `--output` is omitted.
pub const DEFAULT_OUTPUT_NAME: &str = "product_units.csv";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Fetch product unit records from the Rackbeat API into a semicolon-separated CSV",
    long_about = None
)]
pub struct Cli {
    /// Bearer token for the Rackbeat API (falls back to RACKBEAT_BEARER_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
    /// Input CSV file containing product numbers
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file; relative paths resolve against the input's directory
    /// (defaults to product_units.csv alongside the input)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30.0)]
    pub timeout: f64,
    /// Input CSV delimiter (supports ',', 'tab', ';', '|'); auto-detected if omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

/// Resolves the bearer token with `--token` taking precedence over the
/// environment. Surrounding whitespace is trimmed; a blank value counts as
/// missing and falls through to the next source.
pub fn resolve_token(flag: Option<&str>, env_value: Option<&str>) -> Result<String> {
    let token = [flag, env_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty());
    match token {
        Some(token) => Ok(token.to_string()),
        None => bail!("bearer token is required via --token or {TOKEN_ENV_VAR}"),
    }
}

/// Resolves the output path. Relative paths are anchored at the input file's
/// parent directory, not the working directory.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => input_dir(input).join(path),
        None => input_dir(input).join(DEFAULT_OUTPUT_NAME),
    }
}

fn input_dir(input: &Path) -> &Path {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
