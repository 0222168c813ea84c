//! Text rendering for the shell: SELECT results and schema listings.

use minipg_core::Row;
use minipg_core::storage::Schema;

/// Left-alignment width buckets for result columns.
const WIDTH_BUCKETS: [usize; 4] = [5, 10, 20, 50];

fn bucket_width(width: usize) -> usize {
    for bucket in WIDTH_BUCKETS {
        if width <= bucket {
            return bucket;
        }
    }
    *WIDTH_BUCKETS.last().expect("buckets are non-empty")
}

/// Render a SELECT result: header, separator, one line per row. Columns are
/// left-aligned into the width bucket fitting their widest value. Empty
/// results render as an empty string.
pub fn render_rows(columns: &[String], rows: &[Row]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, field) in row.iter().enumerate() {
            if i < widths.len() && field.as_str().len() > widths[i] {
                widths[i] = field.as_str().len();
            }
        }
    }
    let widths: Vec<usize> = widths.into_iter().map(bucket_width).collect();

    let mut out = String::from("| ");
    for (column, &width) in columns.iter().zip(&widths) {
        out.push_str(&format!("{column:<width$} | "));
    }
    out.push('\n');

    out.push_str("|-");
    for (i, width) in widths.iter().enumerate() {
        out.push_str(&"-".repeat(*width));
        if i < widths.len() - 1 {
            out.push_str("-+-");
        } else {
            out.push_str("--");
        }
    }
    out.push('\n');

    for row in rows {
        out.push_str("| ");
        for (field, &width) in row.iter().zip(&widths) {
            out.push_str(&format!("{:<width$} | ", field.as_str()));
        }
        out.push('\n');
    }
    out
}

/// Render a schema as the two-column Column|Type table of `\d`.
pub fn render_schema(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {:<10} | {:<20}|\n", "Column", "Type"));
    out.push_str(&format!("|-{}-+-{}|\n", "-".repeat(10), "-".repeat(20)));
    for column in &schema.columns {
        out.push_str(&format!(
            "| {:<10} | {:<20}|\n",
            column.name,
            column.kind.to_string()
        ));
    }
    out
}
