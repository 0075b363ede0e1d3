use crate::domain::model::{Record, Table};
use crate::utils::error::Result;
use serde_json::Value;

/// Parses CSV bytes with a header row. Cells stay text; empty cells become null.
pub fn read_csv(data: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut table = Table::new(headers.clone());

    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (column, cell) in headers.iter().zip(row.iter()) {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            record.insert(column.clone(), value);
        }
        table.push_row(record);
    }

    tracing::debug!("Parsed {} CSV rows with {} columns", table.len(), table.columns().len());
    Ok(table)
}

/// Writes a table as CSV in column order. Nested values are written as JSON text.
pub fn write_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;

    for row in table.rows() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|column| row.get(column).map(format_cell).unwrap_or_default())
            .collect();
        writer.write_record(&cells)?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
