use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use crate::error::{InvoiceError, Result};
use crate::models::invoice::{BilledEntry, EnrichedEntry, Invoice};

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Hourly rates for billable and non-billable time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    billable: Decimal,
    non_billable: Decimal,
}

impl Rates {
    pub fn new(billable: f64, non_billable: f64) -> Result<Self> {
        Ok(Self {
            billable: to_rate(billable)?,
            non_billable: to_rate(non_billable)?,
        })
    }

    pub fn for_entry(&self, billable: bool) -> Decimal {
        if billable {
            self.billable
        } else {
            self.non_billable
        }
    }
}

fn to_rate(rate: f64) -> Result<Decimal> {
    Decimal::from_f64(rate)
        .filter(|rate| !rate.is_sign_negative())
        .ok_or(InvoiceError::InvalidRate { rate })
}

pub fn entry_cost(entry: &EnrichedEntry, rates: &Rates) -> Result<Decimal> {
    if entry.duration < 0 {
        return Err(InvoiceError::RunningTimer {
            entry: entry.id,
            duration: entry.duration,
        });
    }
    let hours = Decimal::from(entry.duration) / Decimal::from(SECONDS_PER_HOUR);
    let rate = rates.for_entry(entry.billable);
    rate.checked_mul(hours).ok_or_else(|| InvoiceError::InvalidRate {
        rate: rate.to_f64().unwrap_or(f64::MAX),
    })
}

/// Bills every entry and folds the numeric costs into the invoice total.
pub fn calculate(entries: Vec<EnrichedEntry>, rates: &Rates) -> Result<Invoice> {
    let mut total = Decimal::ZERO;
    let mut billed = Vec::with_capacity(entries.len());

    for entry in entries {
        let cost = entry_cost(&entry, rates)?;
        total = total
            .checked_add(cost)
            .ok_or_else(|| InvoiceError::InvalidRate {
                rate: rates.for_entry(entry.billable).to_f64().unwrap_or(f64::MAX),
            })?;
        debug!("Entry {} billed at {}", entry.id, cost);

        billed.push(BilledEntry {
            duration_human: format_duration(entry.duration),
            billing: format_currency(cost),
            cost,
            entry,
        });
    }

    let billing_total = format_currency(total);
    info!("Billed {} entries, total {}", billed.len(), billing_total.trim());

    Ok(Invoice {
        entries: billed,
        total,
        billing_total,
    })
}

/// `$` followed by the amount right-aligned in 20 columns, with thousands
/// separators and two decimals.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    let whole = rounded.trunc().abs().to_u64().unwrap_or(u64::MAX);
    let cents = (rounded.fract().abs() * Decimal::ONE_HUNDRED)
        .to_u64()
        .unwrap_or(0);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let amount = format!(
        "{sign}{}.{cents:02}",
        whole.to_formatted_string(&Locale::en)
    );
    format!("${amount:>20}")
}

/// `H:MM:SS`, prefixed with a day count once a duration spans whole days.
pub fn format_duration(seconds: i64) -> String {
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let rest = seconds.rem_euclid(SECONDS_PER_DAY);
    let clock = format!(
        "{}:{:02}:{:02}",
        rest / SECONDS_PER_HOUR,
        rest % SECONDS_PER_HOUR / 60,
        rest % 60
    );

    match days {
        0 => clock,
        1 | -1 => format!("{days} day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}
