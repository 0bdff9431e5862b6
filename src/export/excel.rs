//! Excel workbook rendering.
//!
//! Events are grouped into one worksheet per platform, each with a styled
//! header row and fixed column widths. The workbook is serialized in memory.

use std::collections::BTreeMap;
use std::io::Cursor;

use crate::models::WebhookEvent;

use super::{CellValue, EXPORT_HEADERS, ExportError, row_cells};

const HEADER_FILL: &str = "FFDDEBF7";
const MAX_SHEET_NAME_LEN: usize = 31;

/// Build an xlsx workbook from stored events, one sheet per platform when
/// splitting, otherwise a single combined sheet. An empty input still yields
/// a valid workbook with a header-only sheet.
pub fn build_workbook(
    events: &[WebhookEvent],
    split_by_platform: bool,
) -> Result<Vec<u8>, ExportError> {
    let mut book = umya_spreadsheet::new_file();

    let mut by_platform: BTreeMap<String, Vec<&WebhookEvent>> = BTreeMap::new();
    for event in events {
        let sheet_key = if split_by_platform {
            event.platform.clone()
        } else {
            "Events".to_string()
        };
        by_platform.entry(sheet_key).or_default().push(event);
    }

    if by_platform.is_empty() {
        let ws = book
            .get_sheet_mut(&0)
            .ok_or_else(|| ExportError::Spreadsheet("default sheet missing".to_string()))?;
        ws.set_name("Events");
        write_header(ws);
        let mut out = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
            .map_err(|e| ExportError::Spreadsheet(e.to_string()))?;
        return Ok(out.into_inner());
    }

    for (index, (platform, rows)) in by_platform.iter().enumerate() {
        let name = sheet_name(platform);
        if index == 0 {
            let ws = book
                .get_sheet_mut(&0)
                .ok_or_else(|| ExportError::Spreadsheet("default sheet missing".to_string()))?;
            ws.set_name(&name);
        } else {
            book.new_sheet(&name)
                .map_err(|e| ExportError::Spreadsheet(e.to_string()))?;
        }
        let ws = book
            .get_sheet_by_name_mut(&name)
            .ok_or_else(|| ExportError::Spreadsheet(format!("sheet {name} missing")))?;

        write_header(ws);

        for (row_index, event) in rows.iter().enumerate() {
            let row = (row_index + 2) as u32;
            for (col_index, cell) in row_cells(event).iter().enumerate() {
                let col = (col_index + 1) as u32;
                match cell {
                    CellValue::Text(v) => {
                        ws.get_cell_mut((col, row)).set_value(v);
                    }
                    CellValue::Number(v) => {
                        ws.get_cell_mut((col, row)).set_value_number(*v);
                    }
                    CellValue::Empty => {}
                }
            }
        }
    }

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| ExportError::Spreadsheet(e.to_string()))?;
    Ok(out.into_inner())
}

fn write_header(ws: &mut umya_spreadsheet::Worksheet) {
    for (col_index, header) in EXPORT_HEADERS.iter().enumerate() {
        let col = (col_index + 1) as u32;
        ws.get_cell_mut((col, 1)).set_value(*header);

        let style = ws.get_style_mut((col, 1));
        style.get_font_mut().set_bold(true);
        style.set_background_color(HEADER_FILL);

        let letter = column_letter(col);
        ws.get_column_dimension_mut(&letter)
            .set_width(column_width(header));
    }
}

/// Widths roughly sized to the data each column holds.
fn column_width(header: &str) -> f64 {
    match header {
        "ID" => 38.0,
        "Customer Email" | "Affiliate Email" | "Sales Link" | "Payment Details" => 30.0,
        "Customer Name" | "Product Name" | "Offer Name" => 24.0,
        _ => 16.0,
    }
}

/// Excel sheet names may not contain certain characters and cap at 31 chars.
fn sheet_name(platform: &str) -> String {
    let cleaned: String = platform
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    cleaned.chars().take(MAX_SHEET_NAME_LEN).collect()
}

fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_event;
    use super::*;

    #[test]
    fn column_letters_cover_multi_char_range() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
    }

    #[test]
    fn sheet_names_are_sanitized_and_capped() {
        assert_eq!(sheet_name("kirvano"), "kirvano");
        assert_eq!(sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn workbook_has_one_sheet_per_platform() {
        let events = vec![
            sample_event("kirvano", Some(99.90)),
            sample_event("hubla", Some(150.0)),
            sample_event("kirvano", None),
        ];
        let bytes = build_workbook(&events, true).unwrap();

        let book =
            umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        assert!(book.get_sheet_by_name("kirvano").is_some());
        assert!(book.get_sheet_by_name("hubla").is_some());

        let ws = book.get_sheet_by_name("kirvano").unwrap();
        assert_eq!(ws.get_value((1, 1)), "ID");
        assert_eq!(ws.get_value((2, 2)), "kirvano");
        // two kirvano rows below the header
        assert_eq!(ws.get_value((2, 3)), "kirvano");
    }

    #[test]
    fn unsplit_workbook_combines_platforms_into_one_sheet() {
        let events = vec![
            sample_event("kirvano", Some(99.90)),
            sample_event("hubla", Some(150.0)),
        ];
        let bytes = build_workbook(&events, false).unwrap();

        let book =
            umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        let ws = book.get_sheet_by_name("Events").expect("combined sheet");
        assert_eq!(ws.get_value((2, 2)), "kirvano");
        assert_eq!(ws.get_value((2, 3)), "hubla");
        assert!(book.get_sheet_by_name("kirvano").is_none());
    }

    #[test]
    fn amount_is_written_as_number() {
        let events = vec![sample_event("cakto", Some(89.9))];
        let bytes = build_workbook(&events, true).unwrap();

        let book =
            umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        let ws = book.get_sheet_by_name("cakto").unwrap();
        let amount_col = (EXPORT_HEADERS.iter().position(|h| *h == "Amount").unwrap() + 1) as u32;
        assert_eq!(ws.get_value((amount_col, 2)), "89.9");
    }

    #[test]
    fn empty_input_yields_header_only_workbook() {
        let bytes = build_workbook(&[], true).unwrap();
        let book =
            umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        let ws = book.get_sheet_by_name("Events").unwrap();
        assert_eq!(ws.get_value((1, 1)), "ID");
        assert_eq!(ws.get_value((1, 2)), "");
    }
}
