//! CSV rendering of stored events.

use crate::models::WebhookEvent;

use super::{CellValue, EXPORT_HEADERS, ExportError, row_cells};

/// Render events as a single CSV document with a header row.
pub fn build_csv(events: &[WebhookEvent]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;

    for event in events {
        let record: Vec<String> = row_cells(event).iter().map(CellValue::as_text).collect();
        writer.write_record(&record)?;
    }

    Ok(writer.into_inner()?)
}
