//! Resolution of the invoicing window from the `--offset`/`--delta` options.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use clap::ValueEnum;
use tracing::info;

use crate::error::{InvoiceError, Result};

/// Format accepted for a custom `--delta` datetime.
pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format of the `start_date`/`end_date` query parameters.
pub const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Offset {
    /// The last 30 days
    #[default]
    Month,
    /// The last 7 days
    Week,
    /// Everything since the `--delta` datetime
    Custom,
}

impl Offset {
    fn fixed_delta(self) -> Option<TimeDelta> {
        match self {
            Offset::Month => Some(TimeDelta::days(30)),
            Offset::Week => Some(TimeDelta::days(7)),
            Offset::Custom => None,
        }
    }
}

pub fn parse_input_datetime(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, INPUT_FORMAT).map_err(|source| {
        InvoiceError::MalformedDatetime {
            input: input.to_string(),
            source,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn resolve(offset: Offset, custom: Option<NaiveDateTime>) -> Result<Self> {
        Self::resolve_at(offset, custom, Utc::now())
    }

    /// Resolves the window ending at `now`.
    ///
    /// A custom datetime is turned into "how far back from now" rather than
    /// used as an absolute start, so all three offsets share one code path.
    pub fn resolve_at(
        offset: Offset,
        custom: Option<NaiveDateTime>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let delta = match offset.fixed_delta() {
            Some(delta) => delta,
            None => {
                let since = custom.ok_or(InvoiceError::MissingCustomDatetime)?;
                now.naive_utc() - since
            }
        };

        let start = now - delta;
        if start >= now {
            return Err(InvoiceError::EmptyWindow {
                start: start.format(QUERY_FORMAT).to_string(),
                end: now.format(QUERY_FORMAT).to_string(),
            });
        }

        info!("Resolved {:?} window: {} to {}", offset, start, now);
        Ok(Self { start, end: now })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn query_bounds(&self) -> (String, String) {
        (
            self.start.format(QUERY_FORMAT).to_string(),
            self.end.format(QUERY_FORMAT).to_string(),
        )
    }
}
