//! Report generation from stored webhook events.
//!
//! Excel and CSV renderings share one column layout so a row reads the same
//! in both formats.

pub mod csv;
pub mod excel;

pub use csv::build_csv;
pub use excel::build_workbook;

use crate::models::WebhookEvent;

/// Errors raised while rendering a report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("failed to write csv: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("failed to finalize csv buffer: {0}")]
    CsvBuffer(#[from] ::csv::IntoInnerError<::csv::Writer<Vec<u8>>>),
}

/// A single report cell.
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

/// Column headers, in render order.
pub const EXPORT_HEADERS: [&str; 26] = [
    "ID",
    "Platform",
    "Event Type",
    "Webhook ID",
    "Transaction ID",
    "Customer Email",
    "Customer Name",
    "Customer Document",
    "Customer Phone",
    "Product Name",
    "Product ID",
    "Offer ID",
    "Offer Name",
    "Amount",
    "Currency",
    "Commission Amount",
    "Payment Method",
    "Payment Details",
    "Status",
    "Affiliate Email",
    "UTM Source",
    "UTM Medium",
    "UTM Campaign",
    "Sales Link",
    "Attendant Name",
    "Attendant Email",
];

fn text(value: &Option<String>) -> CellValue {
    match value {
        Some(v) => CellValue::Text(v.clone()),
        None => CellValue::Empty,
    }
}

fn number(value: Option<f64>) -> CellValue {
    match value {
        Some(v) => CellValue::Number(v),
        None => CellValue::Empty,
    }
}

/// Render one stored event into the shared column layout. The raw payload is
/// deliberately left out of reports.
pub fn row_cells(event: &WebhookEvent) -> Vec<CellValue> {
    vec![
        CellValue::Text(event.id.to_string()),
        CellValue::Text(event.platform.clone()),
        CellValue::Text(event.event_type.clone()),
        text(&event.webhook_id),
        text(&event.transaction_id),
        text(&event.customer_email),
        text(&event.customer_name),
        text(&event.customer_document),
        text(&event.customer_phone),
        text(&event.product_name),
        text(&event.product_id),
        text(&event.offer_id),
        text(&event.offer_name),
        number(event.amount),
        text(&event.currency),
        number(event.commission_amount),
        text(&event.payment_method),
        text(&event.payment_details),
        text(&event.status),
        text(&event.affiliate_email),
        text(&event.utm_source),
        text(&event.utm_medium),
        text(&event.utm_campaign),
        text(&event.sales_link),
        text(&event.attendant_name),
        text(&event.attendant_email),
    ]
}

impl CellValue {
    /// Textual rendering used by the CSV writer.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(v) => v.clone(),
            CellValue::Number(v) => format!("{:.2}", v),
            CellValue::Empty => String::new(),
        }
    }
}
