use crate::config::ColumnConfig;

use super::model::{Dataset, RawRecord, SalesPoint};

// ---------------------------------------------------------------------------
// Normalization: raw rows → sales points
// ---------------------------------------------------------------------------

/// Turn raw rows into a [`Dataset`].
///
/// Only the first `row_limit` rows are considered.  A row survives when its
/// date, description and quantity cells are all present, the description is
/// not a bare number, the date has a month segment (`YYYY-MM-...`) in
/// `1..=12`, and the quantity is a finite positive number.  Anything else is
/// dropped without error.
pub fn normalize(records: &[RawRecord], columns: &ColumnConfig, row_limit: usize) -> Dataset {
    let considered = &records[..records.len().min(row_limit)];

    let points: Vec<SalesPoint> = considered
        .iter()
        .enumerate()
        .filter_map(|(row_no, rec)| {
            let point = to_sales_point(rec, columns);
            if point.is_none() {
                log::debug!("Dropping row {row_no}: {rec:?}");
            }
            point
        })
        .collect();

    log::info!(
        "Normalized {} of {} rows ({} dropped, {} beyond limit)",
        points.len(),
        considered.len(),
        considered.len() - points.len(),
        records.len() - considered.len()
    );

    Dataset::from_points(points, considered.len())
}

fn to_sales_point(rec: &RawRecord, columns: &ColumnConfig) -> Option<SalesPoint> {
    let date = field(rec, &columns.date)?;
    let product = field(rec, &columns.description)?;
    let quantity = field(rec, &columns.quantity)?;

    if is_numeric(product) {
        return None;
    }

    let month = month_of(date)?;
    let quantity = leading_float(quantity).filter(|q| q.is_finite() && *q > 0.0)?;

    Some(SalesPoint {
        month,
        product: product.to_string(),
        quantity,
    })
}

/// Non-empty, trimmed cell value.
fn field<'a>(rec: &'a RawRecord, column: &str) -> Option<&'a str> {
    rec.get(column).map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Whether a description is really a number (header/garbage row).
fn is_numeric(s: &str) -> bool {
    s.parse::<f64>().map(|v| !v.is_nan()).unwrap_or(false)
}

/// Month from the second `-` segment of a date string.
pub fn month_of(date: &str) -> Option<u32> {
    let mut parts = date.split('-');
    let _year = parts.next()?;
    let month = leading_int(parts.next()?)?;
    (1..=12).contains(&month).then_some(month)
}

/// Parse the leading digits of `s` (`"02T10"` → 2).
fn leading_int(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Parse the longest numeric prefix of `s` (`"12.5 units"` → 12.5).
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let c = bytes[end];
        match c {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if seen_exp && matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    // Back off a dangling exponent or sign ("5e", "5e-").
    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(v) = candidate.parse::<f64>() {
            return Some(v);
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    None
}
