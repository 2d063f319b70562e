//! Excel report of classified helpdesk requests.

use crate::error::ReportError;
use atta_core::HelpdeskRequest;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Helpdesk Requests";

pub const HEADERS: [&str; 6] = [
    "raw_id",
    "request_category",
    "request_type",
    "short_description",
    "sla_value",
    "sla_unit",
];

enum Cell {
    Text(String),
    Number(u32),
}

impl Cell {
    fn width(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
        }
    }
}

fn text(value: &Option<String>) -> Cell {
    Cell::Text(value.clone().unwrap_or_default())
}

/// Rows sorted case-insensitively by (category, type, short description).
fn rows(requests: &[HelpdeskRequest]) -> Vec<[Cell; 6]> {
    let mut sorted: Vec<&HelpdeskRequest> = requests.iter().collect();
    sorted.sort_by_cached_key(|r| {
        (
            r.request_category.as_deref().unwrap_or("").to_lowercase(),
            r.request_type.as_deref().unwrap_or("").to_lowercase(),
            r.short_description.as_deref().unwrap_or("").to_lowercase(),
        )
    });

    sorted
        .into_iter()
        .map(|r| {
            [
                text(&r.id),
                text(&r.request_category),
                text(&r.request_type),
                text(&r.short_description),
                r.sla_value.map_or_else(|| Cell::Text(String::new()), Cell::Number),
                text(&r.sla_unit),
            ]
        })
        .collect()
}

fn build_workbook(requests: &[HelpdeskRequest]) -> Result<Workbook, ReportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, row) in rows(requests).iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => worksheet.write_string(row_num, col as u16, s.as_str())?,
                Cell::Number(n) => worksheet.write_number(row_num, col as u16, f64::from(*n))?,
            };
            widths[col] = widths[col].max(cell.width());
        }
    }

    for (col, width) in widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, (width + 2) as f64)?;
    }
    Ok(workbook)
}

/// Builds the report workbook in memory.
pub fn build_excel(requests: &[HelpdeskRequest]) -> Result<Vec<u8>, ReportError> {
    let mut workbook = build_workbook(requests)?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes `<output_dir>/<prefix>classified_requests_<YYYYmmdd_HHMMSS>.xlsx` and returns the path.
pub fn save_excel(
    requests: &[HelpdeskRequest],
    output_dir: &Path,
    filename_prefix: &str,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(output_dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("{}classified_requests_{}.xlsx", filename_prefix, timestamp));

    let bytes = build_excel(requests)?;
    std::fs::write(&path, bytes)?;
    tracing::info!("Excel report saved to {} ({} rows)", path.display(), requests.len());
    Ok(path)
}

/// Two fixed rows used by `atta --example-report`.
pub fn example_requests() -> Vec<HelpdeskRequest> {
    vec![
        HelpdeskRequest::new("req_1", "User cannot log in to Okta")
            .with_category("Access Management")
            .with_type("Reset forgotten password")
            .with_sla("hours", 4),
        HelpdeskRequest::new("req_2", "Laptop not turning on")
            .with_category("Hardware Support")
            .with_type("Laptop Repair/Replacement")
            .with_sla("days", 7),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_text(cell: &Cell) -> String {
        match cell {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }

    #[test]
    fn test_rows_sorted_case_insensitively() {
        let requests = vec![
            HelpdeskRequest::new("3", "b").with_category("hardware").with_type("Laptop"),
            HelpdeskRequest::new("1", "z").with_category("Access").with_type("VPN"),
            HelpdeskRequest::new("2", "a").with_category("access").with_type("vpn"),
            HelpdeskRequest::new("4", "unclassified"),
        ];
        let ids: Vec<String> = rows(&requests).iter().map(|r| cell_text(&r[0])).collect();
        assert_eq!(ids, vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn test_missing_sla_value_is_blank_and_zero_is_kept() {
        let requests = vec![
            HelpdeskRequest::new("a", "x"),
            HelpdeskRequest::new("b", "y").with_category("Z").with_sla("hours", 0),
        ];
        let rows = rows(&requests);
        assert_eq!(cell_text(&rows[0][4]), "");
        assert!(matches!(rows[1][4], Cell::Number(0)));
        assert_eq!(cell_text(&rows[1][5]), "hours");
    }

    #[test]
    fn test_build_excel_produces_xlsx_bytes() {
        let bytes = build_excel(&example_requests()).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_save_excel_names_file_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let path = save_excel(&example_requests(), &out, "example_").unwrap();

        assert!(path.is_file());
        assert_eq!(path.parent().unwrap(), out.as_path());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("example_classified_requests_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "example_classified_requests_".len() + "YYYYmmdd_HHMMSS".len() + ".xlsx".len());
    }
}
