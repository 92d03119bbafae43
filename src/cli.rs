use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, ValueHint};

use crate::window::{parse_input_datetime, Offset};

/// Generate an invoice PDF from Toggl time entries.
///
/// Rates, identity fields and the output location are read from the
/// environment; see `--generate-env-file`.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Opts {
    /// How far back to invoice
    #[arg(short, long, value_enum, default_value_t = Offset::Month)]
    pub offset: Offset,

    /// Start of a custom window, as YYYY-MM-DDTHH:MM:SS (UTC)
    #[arg(short, long, value_parser = parse_delta)]
    pub delta: Option<NaiveDateTime>,

    /// Write a starter dev.sh with every setting and exit
    #[arg(short = 'g', long = "generate-env-file")]
    pub gen_envfile: bool,

    /// TOML file with settings; environment variables take precedence
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

fn parse_delta(input: &str) -> Result<NaiveDateTime, String> {
    parse_input_datetime(input).map_err(|e| e.to_string())
}
