use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// The kind of entity a time entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Project,
    Client,
    Workspace,
    User,
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Reference::Project => "project",
            Reference::Client => "client",
            Reference::Workspace => "workspace",
            Reference::User => "user",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Remote request to {url} failed with status {status}")]
    RemoteRequest { url: String, status: StatusCode },

    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Error decoding response: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },

    #[error("Time entry {entry} references unknown {kind} {}", display_id(.id))]
    MissingReference {
        entry: u64,
        kind: Reference,
        id: Option<u64>,
    },

    #[error("Malformed datetime '{input}', expected YYYY-MM-DDTHH:MM:SS: {source}")]
    MalformedDatetime {
        input: String,
        source: chrono::ParseError,
    },

    #[error("A custom offset requires --delta YYYY-MM-DDTHH:MM:SS")]
    MissingCustomDatetime,

    #[error("Time window is empty: {start} is not before {end}")]
    EmptyWindow { start: String, end: String },

    #[error("Time entry {entry} is still running (duration {duration})")]
    RunningTimer { entry: u64, duration: i64 },

    #[error("Invalid billing rate: {rate}")]
    InvalidRate { rate: f64 },

    #[error("Missing configuration: {field}")]
    MissingConfiguration { field: String },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: Box<figment::Error>,
    },

    #[error("PDF error: {source}")]
    Pdf {
        #[from]
        source: lopdf::Error,
    },

    #[error("IO Error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl From<figment::Error> for InvoiceError {
    fn from(error: figment::Error) -> Self {
        if let figment::error::Kind::MissingField(field) = &error.kind {
            return InvoiceError::MissingConfiguration {
                field: field.to_uppercase(),
            };
        }
        InvoiceError::Config {
            source: Box::new(error),
        }
    }
}

fn display_id(id: &Option<u64>) -> String {
    id.map_or_else(|| "(none)".to_string(), |id| id.to_string())
}

pub type Result<T, E = InvoiceError> = std::result::Result<T, E>;
