//! `--generate-env-file`: a starter shell script exporting every setting.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

pub const ENV_FILE_NAME: &str = "dev.sh";

pub const ENV_FILE_TEMPLATE: &str = r#"#!/usr/bin/env bash

# API token from https://track.toggl.com/profile
export TOGGL_API_TOKEN=''

# Hourly rates for billable and non-billable entries
export BILLABLE_RATE='10.0'
export NON_BILLABLE_RATE='5.0'
export FULFILLMENT_DELAY='30'

# Bump the invoice number for every invoice you send
export INVOICE_NUMBER='client-0001'
export OUTPUT_DIR="$PWD"
export INVOICE_FILENAME='Invoice.pdf'

export SERVICE_PROVIDER='Your Name'
export SERVICE_PROVIDER_EMAIL='you@example.com'
export SERVICE_PROVIDER_PHONE=''
export SERVICE_PROVIDER_ADDRESS='1 Example Street'
export SERVICE_PROVIDER_ADDRESS_TWO=''
export SERVICE_PROVIDER_CITY='Seattle'
export SERVICE_PROVIDER_STATE='WA'
export SERVICE_PROVIDER_POSTAL='98103'

export RECIPIENT='Client Name'
export RECIPIENT_EMAIL='billing@example.com'
export RECIPIENT_PHONE=''
export RECIPIENT_ADDRESS='400 Broad Street'
export RECIPIENT_ADDRESS_TWO=''
export RECIPIENT_CITY='Seattle'
export RECIPIENT_STATE='WA'
export RECIPIENT_POSTAL='98109'
"#;

/// Writes [`ENV_FILE_TEMPLATE`] into `dir` and returns the file's path.
pub fn generate(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(ENV_FILE_NAME);
    std::fs::write(&path, ENV_FILE_TEMPLATE)?;
    info!("Generated environment file at {}", path.display());
    Ok(path)
}
