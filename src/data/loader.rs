use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::RawRecord;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the raw rows of a sales file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-separated, first row is the header
pub fn load_file(path: &Path) -> Result<Vec<RawRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_records(file)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Parse delimited text into raw records keyed by header name.
///
/// Rows are not validated here: short rows yield records without the
/// trailing columns, extra cells beyond the header are ignored.
pub fn read_records<R: Read>(input: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_keyed_by_header() {
        let csv = "created,short_desc,total_sold\n2023-01-05,Widget,10\n2023-02-03,Widget,15\n";
        let rows = read_records(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["created"], "2023-01-05");
        assert_eq!(rows[1]["total_sold"], "15");
    }

    #[test]
    fn short_rows_pass_through_without_missing_columns() {
        let csv = "created,short_desc,total_sold\n2023-01-05,Widget\n";
        let rows = read_records(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("total_sold"));
        assert_eq!(rows[0]["short_desc"], "Widget");
    }

    #[test]
    fn header_only_file_yields_no_rows() {
        let rows = read_records("created,short_desc,total_sold\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_records("".as_bytes()).is_err());
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_file(Path::new("sales.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_file(Path::new("/nonexistent/sales.csv")).is_err());
    }
}
