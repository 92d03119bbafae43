use std::path::PathBuf;

use chrono::{TimeDelta, Utc};
use tracing::{error, info};

use crate::{
    billing::{self, Rates},
    config::{Config, InvoiceDetails},
    error::Result,
    helpers::{
        aggregate,
        pdf::{InvoiceDocument, InvoiceRenderer},
        toggl::ResourceFetcher,
    },
    models::invoice::Invoice,
    window::TimeWindow,
};

/// Days between the invoice date and its due date.
pub const PAYMENT_TERM_DAYS: i64 = 30;

/// Fetches Toggl data, bills it and writes the invoice PDF.
#[derive(Clone)]
pub struct InvoiceService<F, R> {
    pub fetcher: F,
    pub renderer: R,
    pub config: Config,
    rates: Rates,
}

impl<F, R> InvoiceService<F, R>
where
    F: ResourceFetcher,
    R: InvoiceRenderer,
{
    /// Create a new invoice service; rejects negative or non-finite rates.
    pub fn new(fetcher: F, renderer: R, config: Config) -> Result<Self> {
        let rates = Rates::new(config.billable_rate, config.non_billable_rate)?;
        info!(
            "Creating InvoiceService (billable {}, non-billable {})",
            config.billable_rate, config.non_billable_rate
        );
        Ok(Self {
            fetcher,
            renderer,
            config,
            rates,
        })
    }

    /// Fetch and join the window's entries, then bill them.
    pub async fn build_invoice(&self, window: &TimeWindow) -> Result<Invoice> {
        let entries = aggregate::fetch_entries(&self.fetcher, window).await?;
        info!("Aggregated {} enriched entries", entries.len());
        billing::calculate(entries, &self.rates)
    }

    /// Run the whole pipeline once and return where the PDF was written.
    pub async fn process_invoice(&self, window: &TimeWindow) -> Result<PathBuf> {
        let details: InvoiceDetails = self.config.invoice_details();
        info!("Processing invoice {}", details.invoice_number);

        let invoice = self.build_invoice(window).await?;

        let created = Utc::now().date_naive();
        let document = InvoiceDocument {
            invoice: &invoice,
            details: &details,
            created,
            due: created + TimeDelta::days(PAYMENT_TERM_DAYS),
        };

        let pdf = match self.renderer.render(&document) {
            Ok(pdf) => pdf,
            Err(e) => {
                error!("Failed to render invoice PDF: {}", e);
                return Err(e);
            }
        };

        let output_path = self.config.output_path();
        info!("Writing PDF to {}", output_path.display());
        if let Err(e) = tokio::fs::write(&output_path, &pdf).await {
            error!("Failed to write {}: {}", output_path.display(), e);
            return Err(e.into());
        }

        info!(
            "Invoice {} written, {} entries, total {}",
            details.invoice_number,
            invoice.entries.len(),
            invoice.billing_total.trim()
        );
        Ok(output_path)
    }
}
