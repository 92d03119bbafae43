//! Configuration loading.
//!
//! Every setting is read once at startup from, in increasing precedence:
//! built-in defaults, an optional TOML file, and the process environment
//! (using the variable names written by `--generate-env-file`).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::Result;
use crate::helpers::toggl::DEFAULT_API_URL;

/// Environment variables (lowercased) that feed [`Config`].
pub const CONFIG_KEYS: &[&str] = &[
    "toggl_api_token",
    "toggl_api_url",
    "billable_rate",
    "non_billable_rate",
    "output_dir",
    "invoice_filename",
    "invoice_number",
    "service_provider",
    "service_provider_email",
    "service_provider_phone",
    "service_provider_address",
    "service_provider_address_two",
    "service_provider_city",
    "service_provider_state",
    "service_provider_postal",
    "recipient",
    "recipient_email",
    "recipient_phone",
    "recipient_address",
    "recipient_address_two",
    "recipient_city",
    "recipient_state",
    "recipient_postal",
    "fulfillment_delay",
];

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "lenient_string")]
    pub toggl_api_token: String,
    #[serde(default = "default_api_url", deserialize_with = "lenient_string")]
    pub toggl_api_url: String,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub billable_rate: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub non_billable_rate: f64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_invoice_filename", deserialize_with = "lenient_string")]
    pub invoice_filename: String,

    #[serde(deserialize_with = "lenient_string")]
    pub invoice_number: String,

    #[serde(deserialize_with = "lenient_string")]
    pub service_provider: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_address_two: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_state: String,
    #[serde(deserialize_with = "lenient_string")]
    pub service_provider_postal: String,

    #[serde(deserialize_with = "lenient_string")]
    pub recipient: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_address_two: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_state: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_postal: String,

    #[serde(deserialize_with = "lenient_string")]
    pub fulfillment_delay: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("toggl_api_token", &"<redacted>")
            .field("toggl_api_url", &self.toggl_api_url)
            .field("billable_rate", &self.billable_rate)
            .field("non_billable_rate", &self.non_billable_rate)
            .field("output_dir", &self.output_dir)
            .field("invoice_filename", &self.invoice_filename)
            .field("invoice_number", &self.invoice_number)
            .finish_non_exhaustive()
    }
}

/// A postal identity printed on the invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub address_two: String,
    pub city: String,
    pub state: String,
    pub postal: String,
}

/// The named fields the renderer prints around the billed entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDetails {
    pub invoice_number: String,
    pub service_provider: Party,
    pub recipient: Party,
    pub fulfillment_delay: String,
}

impl Config {
    /// Loads configuration, optionally layering a TOML file under the
    /// environment.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(config_path))
    }

    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();

        if let Some(path) = config_path {
            info!("Reading configuration file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Serialized::defaults(environment()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        info!("Loaded configuration for invoice {}", config.invoice_number);
        Ok(config)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.invoice_filename)
    }

    pub fn invoice_details(&self) -> InvoiceDetails {
        InvoiceDetails {
            invoice_number: self.invoice_number.clone(),
            service_provider: Party {
                name: self.service_provider.clone(),
                email: self.service_provider_email.clone(),
                phone: self.service_provider_phone.clone(),
                address: self.service_provider_address.clone(),
                address_two: self.service_provider_address_two.clone(),
                city: self.service_provider_city.clone(),
                state: self.service_provider_state.clone(),
                postal: self.service_provider_postal.clone(),
            },
            recipient: Party {
                name: self.recipient.clone(),
                email: self.recipient_email.clone(),
                phone: self.recipient_phone.clone(),
                address: self.recipient_address.clone(),
                address_two: self.recipient_address_two.clone(),
                city: self.recipient_city.clone(),
                state: self.recipient_state.clone(),
                postal: self.recipient_postal.clone(),
            },
            fulfillment_delay: self.fulfillment_delay.clone(),
        }
    }
}

// Values are kept verbatim: `02134` or `+15551234567` must not be read as
// numbers.
fn environment() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| {
            let key = key.into_string().ok()?.to_lowercase();
            if !CONFIG_KEYS.contains(&key.as_str()) {
                return None;
            }
            Some((key, value.into_string().ok()?))
        })
        .collect()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_invoice_filename() -> String {
    "Invoice.pdf".to_string()
}

// A TOML file may spell postal codes and the like as numbers; they are
// still text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

fn lenient_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rate {
        Number(f64),
        Text(String),
    }

    match Rate::deserialize(deserializer)? {
        Rate::Number(rate) => Ok(rate),
        Rate::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid rate '{text}'"))),
    }
}
