//! End-to-end runs of the invoice pipeline against an in-memory Toggl API.

use chrono::{TimeZone, Utc};
use figment::providers::Serialized;
use figment::Figment;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use toggl_invoice::helpers::in_memory::InMemoryFetcher;
use toggl_invoice::{
    Config, InvoiceError, InvoiceService, Offset, PdfRenderer, Reference, Resource, TimeWindow,
};

fn config(output_dir: &std::path::Path) -> Config {
    let value = json!({
        "toggl_api_token": "token",
        "billable_rate": 10.0,
        "non_billable_rate": 5.0,
        "output_dir": output_dir,
        "invoice_filename": "Invoice.pdf",
        "invoice_number": "acme-1",
        "service_provider": "Jo Doe",
        "service_provider_email": "jo@example.test",
        "service_provider_phone": "",
        "service_provider_address": "1 Main St",
        "service_provider_address_two": "",
        "service_provider_city": "Seattle",
        "service_provider_state": "WA",
        "service_provider_postal": "98103",
        "recipient": "Acme",
        "recipient_email": "billing@acme.test",
        "recipient_phone": "",
        "recipient_address": "400 Broad St",
        "recipient_address_two": "",
        "recipient_city": "Seattle",
        "recipient_state": "WA",
        "recipient_postal": "98109",
        "fulfillment_delay": "30",
    });
    Config::from_figment(Figment::from(Serialized::defaults(value))).unwrap()
}

fn window() -> TimeWindow {
    let now = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
    TimeWindow::resolve_at(Offset::Month, None, now).unwrap()
}

fn time_entry(id: u64, pid: u64, duration: i64, billable: bool) -> Value {
    json!({
        "id": id,
        "pid": pid,
        "wid": 1,
        "uid": 5,
        "duration": duration,
        "billable": billable,
        "start": "2024-03-10T09:00:00+00:00",
        "stop": "2024-03-10T10:00:00+00:00",
    })
}

fn toggl(time_entries: Value) -> InMemoryFetcher {
    InMemoryFetcher::new()
        .with("time_entries", time_entries)
        .with("clients", json!([{"id": 100, "name": "Acme", "wid": 1}]))
        .with(
            "projects/10",
            json!({"data": {"id": 10, "cid": 100, "wid": 1, "name": "Website"}}),
        )
        .with(
            "projects/11",
            json!({"data": {"id": 11, "cid": 100, "wid": 1, "name": "Support"}}),
        )
        .with("workspaces", json!([{"id": 1, "name": "Main"}]))
        .with(
            "me",
            json!({"data": {"id": 5, "fullname": "Jo Doe", "email": "jo@example.test"}}),
        )
}

#[tokio::test]
async fn writes_invoice_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let mut described = time_entry(2, 11, 1800, false);
    described["description"] = json!("Phone support");
    let fetcher = toggl(json!([time_entry(1, 10, 3600, true), described]));

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    let path = service.process_invoice(&window()).await.unwrap();

    assert_eq!(path, dir.path().join("Invoice.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test]
async fn bills_billable_and_non_billable_time() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = toggl(json!([
        time_entry(1, 10, 3600, true),
        time_entry(2, 11, 1800, false),
    ]));

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    let invoice = service.build_invoice(&window()).await.unwrap();

    assert_eq!(invoice.entries[0].cost, Decimal::new(1000, 2));
    assert_eq!(invoice.entries[0].billing, "$               10.00");
    assert_eq!(invoice.entries[0].duration_human, "1:00:00");
    assert_eq!(invoice.entries[1].cost, Decimal::new(250, 2));
    assert_eq!(invoice.entries[1].entry.description, "");
    assert_eq!(invoice.total, Decimal::new(1250, 2));
    assert_eq!(invoice.billing_total, "$               12.50");
}

#[tokio::test]
async fn shared_project_is_fetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = toggl(json!([
        time_entry(1, 10, 3600, true),
        time_entry(2, 10, 600, true),
    ]));

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    service.build_invoice(&window()).await.unwrap();

    let requests = service.fetcher.requests().await;
    let projects = requests
        .iter()
        .filter(|r| matches!(r, Resource::Project(_)))
        .count();
    assert_eq!(projects, 1);
    assert_eq!(
        requests[0],
        Resource::TimeEntries {
            start: "2024-03-01T00:00:00+00:00".to_string(),
            end: "2024-03-31T00:00:00+00:00".to_string(),
        }
    );
}

#[tokio::test]
async fn failed_time_entries_request_aborts_before_other_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = toggl(json!([])).with_status("time_entries", StatusCode::NOT_FOUND);

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    let result = service.process_invoice(&window()).await;

    assert!(matches!(
        result,
        Err(InvoiceError::RemoteRequest { status, .. }) if status == StatusCode::NOT_FOUND
    ));
    assert_eq!(service.fetcher.requests().await.len(), 1);
    assert!(!dir.path().join("Invoice.pdf").exists());
}

#[tokio::test]
async fn unknown_project_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = toggl(json!([time_entry(1, 10, 3600, true), time_entry(2, 12, 60, true)]));

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    let result = service.process_invoice(&window()).await;

    assert!(matches!(
        result,
        Err(InvoiceError::RemoteRequest { status, .. }) if status == StatusCode::NOT_FOUND
    ));
    assert!(!dir.path().join("Invoice.pdf").exists());
}

#[tokio::test]
async fn unknown_user_is_a_missing_reference() {
    let dir = tempfile::tempdir().unwrap();
    let mut entry = time_entry(1, 10, 3600, true);
    entry["uid"] = json!(6);
    let fetcher = toggl(json!([entry]));

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    let result = service.process_invoice(&window()).await;

    assert!(matches!(
        result,
        Err(InvoiceError::MissingReference { entry: 1, kind: Reference::User, id: Some(6) })
    ));
    assert!(!dir.path().join("Invoice.pdf").exists());
}

#[tokio::test]
async fn running_timer_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = toggl(json!([time_entry(1, 10, -1_711_000_000, true)]));

    let service = InvoiceService::new(fetcher, PdfRenderer, config(dir.path())).unwrap();
    let result = service.process_invoice(&window()).await;

    assert!(matches!(result, Err(InvoiceError::RunningTimer { entry: 1, .. })));
}

#[test]
fn negative_rate_is_rejected_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.billable_rate = -10.0;

    let result = InvoiceService::new(InMemoryFetcher::new(), PdfRenderer, config);
    assert!(matches!(result, Err(InvoiceError::InvalidRate { .. })));
}
