use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Encoding, Object, Stream, StringFormat};
use tracing::info;

use crate::config::{InvoiceDetails, Party};
use crate::error::Result;
use crate::models::invoice::{BilledEntry, Invoice};

/// Date format used for the created and due dates.
pub const INVOICE_DATE_FORMAT: &str = "%A %d. %B %Y";

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;
const LEADING: f32 = 1.4;
const ROW_SIZE: f32 = 8.0;

/// Everything printed on one invoice.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceDocument<'a> {
    pub invoice: &'a Invoice,
    pub details: &'a InvoiceDetails,
    pub created: NaiveDate,
    pub due: NaiveDate,
}

/// Turns a billed invoice into a printable document.
pub trait InvoiceRenderer {
    fn render(&self, document: &InvoiceDocument<'_>) -> Result<Vec<u8>>;
}

/// Letter-sized PDF built directly with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Mono => "F3",
        }
    }
}

/// Encodes `text` for a WinAnsi font; characters outside the code page become `?`.
fn encode_text(encoding: &Encoding<'_>, text: &str) -> Vec<u8> {
    let mut buf = [0; 4];
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let encoded = Document::encode_text(encoding, ch.encode_utf8(&mut buf));
        if encoded.is_empty() {
            bytes.push(b'?');
        } else {
            bytes.extend(encoded);
        }
    }
    bytes
}

/// Top-down text placement across as many pages as needed.
struct Layout<'a> {
    encoding: &'a Encoding<'a>,
    done: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl<'a> Layout<'a> {
    fn new(encoding: &'a Encoding<'a>) -> Self {
        Self {
            encoding,
            done: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.done.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&mut self, font: Font, size: f32, x: f32, text: &str) {
        let y = self.y - size;
        let text = encode_text(self.encoding, text);
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font.resource_name().as_bytes().to_vec()),
                    Object::Real(size),
                ],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::String(text, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn line(&mut self, font: Font, size: f32, text: &str) {
        self.ensure(size * LEADING);
        self.text_at(font, size, MARGIN, text);
        self.y -= size * LEADING;
    }

    fn rule(&mut self) {
        self.ensure(6.0);
        let y = self.y - 3.0;
        self.current.extend([
            Operation::new("w", vec![Object::Real(0.5)]),
            Operation::new("m", vec![Object::Real(MARGIN), Object::Real(y)]),
            Operation::new("l", vec![Object::Real(PAGE_WIDTH - MARGIN), Object::Real(y)]),
            Operation::new("S", vec![]),
        ]);
        self.y -= 6.0;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn into_pages(mut self) -> Vec<Vec<Operation>> {
        self.done.push(self.current);
        self.done
    }
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut fitted: String = text.chars().take(width.saturating_sub(3)).collect();
    fitted.push_str("...");
    fitted
}

fn party_lines(party: &Party) -> Vec<String> {
    let locality = format!("{}, {} {}", party.city, party.state, party.postal);
    [
        party.name.as_str(),
        party.address.as_str(),
        party.address_two.as_str(),
        locality.trim_matches([',', ' ']),
        party.email.as_str(),
        party.phone.as_str(),
    ]
    .into_iter()
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}

fn row(date: &str, description: &str, project: &str, duration: &str, billing: &str) -> String {
    format!(
        "{:<10} {:<30} {:<20} {:>14} {:>21}",
        fit(date, 10),
        fit(description, 30),
        fit(project, 20),
        duration,
        billing
    )
}

fn entry_row(billed: &BilledEntry) -> String {
    let entry = &billed.entry;
    let date: String = entry.start.chars().take(10).collect();
    let project = format!("{} / {}", entry.client.name, entry.project.name);
    row(
        &date,
        &entry.description,
        &project,
        &billed.duration_human,
        &billed.billing,
    )
}

fn layout<'a>(document: &InvoiceDocument<'_>, encoding: &'a Encoding<'a>) -> Layout<'a> {
    let details = document.details;
    let mut layout = Layout::new(encoding);

    layout.line(Font::Bold, 20.0, "INVOICE");
    layout.line(Font::Regular, 10.0, &format!("Invoice #{}", details.invoice_number));
    layout.line(
        Font::Regular,
        10.0,
        &format!("Created: {}", document.created.format(INVOICE_DATE_FORMAT)),
    );
    layout.line(
        Font::Regular,
        10.0,
        &format!("Due: {}", document.due.format(INVOICE_DATE_FORMAT)),
    );
    layout.gap(10.0);

    for (heading, party) in [
        ("From", &details.service_provider),
        ("Bill to", &details.recipient),
    ] {
        layout.line(Font::Bold, 11.0, heading);
        for line in party_lines(party) {
            layout.line(Font::Regular, 10.0, &line);
        }
        layout.gap(8.0);
    }

    let header = row("Date", "Description", "Client / Project", "Duration", "Amount");
    layout.line(Font::Mono, ROW_SIZE, &header);
    layout.rule();
    for billed in &document.invoice.entries {
        layout.line(Font::Mono, ROW_SIZE, &entry_row(billed));
    }
    layout.rule();
    let total = row("", "", "", "Total", &document.invoice.billing_total);
    layout.line(Font::Mono, ROW_SIZE, &total);
    layout.gap(12.0);

    layout.line(
        Font::Regular,
        10.0,
        &format!("Fulfillment delay: {} days", details.fulfillment_delay),
    );

    layout
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"Type1".to_vec()),
        "BaseFont" => Object::Name(base.as_bytes().to_vec()),
        "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
    }
}

impl InvoiceRenderer for PdfRenderer {
    fn render(&self, document: &InvoiceDocument<'_>) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let regular_font = font("Helvetica");
        let encoding = regular_font.get_font_encoding(&doc)?;
        let pages = layout(document, &encoding).into_pages();

        let pages_id = doc.new_object_id();
        let regular = doc.add_object(regular_font.clone());
        let bold = doc.add_object(font("Helvetica-Bold"));
        let mono = doc.add_object(font("Courier"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                Font::Regular.resource_name() => regular,
                Font::Bold.resource_name() => bold,
                Font::Mono.resource_name() => mono,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        let media_box = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(PAGE_WIDTH),
            Object::Real(PAGE_HEIGHT),
        ]);
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut output_buffer: Vec<u8> = Vec::new();
        doc.save_to(&mut output_buffer)?;
        info!(
            "Rendered invoice {} with {} page(s), {} bytes",
            document.details.invoice_number,
            page_count,
            output_buffer.len()
        );

        Ok(output_buffer)
    }
}
