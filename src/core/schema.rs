use crate::domain::model::{ColumnType, Record, Table};
use crate::utils::error::{LogHubError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Mandatory,
    Optional,
    /// Lenient float conversion; rows drop the key when the value is missing.
    Coerced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    presence: Presence,
}

impl ColumnSpec {
    pub fn is_mandatory(&self) -> bool {
        self.presence == Presence::Mandatory
    }
}

/// Column contract of one input table.
///
/// Columns not named by the contract pass through untouched, unless the schema is
/// strict, in which case they are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    table: String,
    columns: Vec<ColumnSpec>,
    strict: bool,
}

impl TableSchema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            strict: false,
        }
    }

    pub fn mandatory(mut self, columns: &[(&str, ColumnType)]) -> Self {
        for (name, column_type) in columns {
            self.push_spec(name, *column_type, Presence::Mandatory);
        }
        self
    }

    pub fn optional(mut self, columns: &[(&str, ColumnType)]) -> Self {
        for (name, column_type) in columns {
            self.push_spec(name, *column_type, Presence::Optional);
        }
        self
    }

    pub fn coerced_floats(mut self, columns: &[&str]) -> Self {
        for name in columns {
            self.push_spec(name, ColumnType::Float, Presence::Coerced);
        }
        self
    }

    /// Every column must be declared; missing values are left out of the record.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn push_spec(&mut self, name: &str, column_type: ColumnType, presence: Presence) {
        let spec = ColumnSpec {
            name: name.to_string(),
            column_type,
            presence,
        };
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = spec,
            None => self.columns.push(spec),
        }
    }

    fn spec(&self, column: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == column)
    }

    /// Validates the table and returns the JSON records for the request body.
    pub fn apply(&self, table: &Table) -> Result<Vec<Value>> {
        for spec in self.columns.iter().filter(|c| c.is_mandatory()) {
            if !table.has_column(&spec.name) {
                tracing::error!("Missing required column: {} ({})", spec.name, self.table);
                return Err(LogHubError::MissingColumn {
                    table: self.table.clone(),
                    column: spec.name.clone(),
                });
            }
        }

        if self.strict {
            if let Some(column) = table.columns().iter().find(|c| self.spec(c).is_none()) {
                tracing::error!("Unexpected column: {} ({})", column, self.table);
                return Err(LogHubError::UnexpectedColumn {
                    table: self.table.clone(),
                    column: column.clone(),
                });
            }
        }

        let mut records = Vec::with_capacity(table.len());
        for (index, row) in table.rows().iter().enumerate() {
            records.push(Value::Object(self.convert_row(table, index, row)?));
        }
        Ok(records)
    }

    fn convert_row(&self, table: &Table, index: usize, row: &Record) -> Result<Record> {
        let mut record = Record::new();
        for column in table.columns() {
            let value = row.get(column).cloned().unwrap_or(Value::Null);
            let Some(spec) = self.spec(column) else {
                record.insert(column.clone(), value);
                continue;
            };

            if self.strict || spec.presence == Presence::Coerced {
                let converted = match spec.column_type {
                    ColumnType::Float => coerce_float(&value),
                    column_type => self.convert(column_type, column, index, &value)?,
                };
                if !converted.is_null() {
                    record.insert(column.clone(), converted);
                }
            } else {
                let converted = self.convert(spec.column_type, column, index, &value)?;
                record.insert(column.clone(), converted);
            }
        }
        Ok(record)
    }

    fn convert(
        &self,
        column_type: ColumnType,
        column: &str,
        row: usize,
        value: &Value,
    ) -> Result<Value> {
        convert_value(column_type, value).map_err(|reason| {
            tracing::error!(
                "Data type conversion failed for column '{}': {}",
                column,
                reason
            );
            LogHubError::ColumnConversion {
                table: self.table.clone(),
                column: column.to_string(),
                row,
                reason,
            }
        })
    }
}

/// Converts one cell to the given type. Nulls stay null except for `Int`.
pub fn convert_value(column_type: ColumnType, value: &Value) -> std::result::Result<Value, String> {
    match column_type {
        ColumnType::Str => Ok(to_str(value)),
        ColumnType::Float => to_float(value),
        ColumnType::Int => to_int(value),
        ColumnType::Bool => to_bool(value),
        ColumnType::Date => to_date(value),
        ColumnType::Timestamp => Ok(to_timestamp(value)),
    }
}

/// Float conversion that maps anything unparseable to null.
pub fn coerce_float(value: &Value) -> Value {
    to_float(value).unwrap_or(Value::Null)
}

fn float_value(number: f64) -> Value {
    Number::from_f64(number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn format_number(number: &Number) -> String {
    match number.as_f64() {
        Some(f) if !number.is_i64() && !number.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => number.to_string(),
    }
}

fn to_str(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(_) => value.clone(),
        Value::Number(n) => Value::String(format_number(n)),
        Value::Bool(b) => Value::String(b.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn to_float(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => Ok(n.as_f64().map(float_value).unwrap_or(Value::Null)),
        Value::Bool(b) => Ok(float_value(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            trimmed
                .parse::<f64>()
                .map(float_value)
                .map_err(|_| format!("could not convert string to float: '{}'", s))
        }
        other => Err(format!("could not convert {} to float", other)),
    }
}

fn to_int(value: &Value) -> std::result::Result<Value, String> {
    let as_int = |f: f64| -> std::result::Result<Value, String> {
        if f.is_finite() && f.fract() == 0.0 {
            Ok(Value::from(f as i64))
        } else {
            Err(format!("cannot convert non-integral value {} to int", f))
        }
    };

    match value {
        Value::Null => Err("cannot convert missing value to int".to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => as_int(n.as_f64().unwrap_or(f64::NAN)),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| format!("invalid literal for int: '{}'", s))
                .and_then(as_int)
        }
        other => Err(format!("could not convert {} to int", other)),
    }
}

fn to_bool(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Null | Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Ok(Value::Bool(false)),
            Some(f) if f == 1.0 => Ok(Value::Bool(true)),
            _ => Err(format!("cannot convert {} to bool", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            "" => Ok(Value::Null),
            _ => Err(format!("cannot convert '{}' to bool", s)),
        },
        other => Err(format!("cannot convert {} to bool", other)),
    }
}

fn to_date(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => parse_date(s)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| format!("unknown date format: '{}'", s)),
        other => Err(format!("cannot convert {} to date", other)),
    }
}

fn to_timestamp(value: &Value) -> Value {
    match value {
        Value::String(s) => parse_datetime(s)
            .map(|dt| Value::String(dt.format(TIMESTAMP_FORMAT).to_string()))
            .unwrap_or_else(|| value.clone()),
        other => to_str(other),
    }
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    parse_datetime(raw).map(|dt| dt.date()).or_else(|| {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ColumnType::*;
    use serde_json::json;

    fn table(value: Value) -> Table {
        Table::from_json(&value).unwrap()
    }

    #[test]
    fn test_missing_mandatory_column_fails() {
        let schema = TableSchema::new("addresses").mandatory(&[("country", Str)]);
        let err = schema.apply(&table(json!([{"city": "Bern"}]))).unwrap_err();

        match err {
            LogHubError::MissingColumn { table, column } => {
                assert_eq!(table, "addresses");
                assert_eq!(column, "country");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_columns_converted_only_when_present() {
        let schema = TableSchema::new("addresses")
            .mandatory(&[("country", Str)])
            .optional(&[("postalCode", Str), ("street", Str)]);

        let records = schema
            .apply(&table(json!([{"country": "CH", "postalCode": 8001}])))
            .unwrap();

        assert_eq!(records, vec![json!({"country": "CH", "postalCode": "8001"})]);
    }

    #[test]
    fn test_float_conversion_rejects_text() {
        let schema = TableSchema::new("coordinates").mandatory(&[("latitude", Float)]);

        let ok = schema.apply(&table(json!([{"latitude": " 47.37 "}]))).unwrap();
        assert_eq!(ok, vec![json!({"latitude": 47.37})]);

        let err = schema
            .apply(&table(json!([{"latitude": "47.37"}, {"latitude": "north"}])))
            .unwrap_err();
        assert!(matches!(err, LogHubError::ColumnConversion { row: 1, .. }));
    }

    #[test]
    fn test_int_conversion() {
        let schema = TableSchema::new("vehicles").mandatory(&[("availableVehicles", Int)]);

        let records = schema
            .apply(&table(json!([{"availableVehicles": "3"}, {"availableVehicles": 4.0}])))
            .unwrap();
        assert_eq!(
            records,
            vec![json!({"availableVehicles": 3}), json!({"availableVehicles": 4})]
        );

        assert!(schema
            .apply(&table(json!([{"availableVehicles": 2.5}])))
            .is_err());
        assert!(schema
            .apply(&table(json!([{"availableVehicles": null}])))
            .is_err());
    }

    #[test]
    fn test_coerced_floats_drop_missing_values() {
        let schema = TableSchema::new("shipments")
            .mandatory(&[("shipmentId", Str)])
            .coerced_floats(&["weight", "volume"]);

        let records = schema
            .apply(&table(json!([
                {"shipmentId": 1, "weight": "12.5", "volume": ""},
                {"shipmentId": 2, "weight": "heavy", "volume": 3}
            ])))
            .unwrap();

        assert_eq!(
            records,
            vec![
                json!({"shipmentId": "1", "weight": 12.5}),
                json!({"shipmentId": "2", "volume": 3.0}),
            ]
        );
    }

    #[test]
    fn test_strict_schema_rejects_unknown_columns() {
        let schema = TableSchema::new("customers")
            .optional(&[("name", Str), ("weight", Float)])
            .strict();

        let err = schema
            .apply(&table(json!([{"name": "A", "colour": "red"}])))
            .unwrap_err();
        assert!(matches!(err, LogHubError::UnexpectedColumn { .. }));

        let records = schema
            .apply(&table(json!([{"name": "A", "weight": null}, {"name": 7, "weight": "2"}])))
            .unwrap();
        assert_eq!(
            records,
            vec![json!({"name": "A"}), json!({"name": "7", "weight": 2.0})]
        );
    }

    #[test]
    fn test_date_columns_formatted() {
        let schema = TableSchema::new("past demand data").mandatory(&[("date", Date)]);

        let records = schema
            .apply(&table(json!([
                {"date": "2024-03-01 00:00:00"},
                {"date": "05.04.2024"},
                {"date": "2024-06-30"}
            ])))
            .unwrap();

        assert_eq!(
            records,
            vec![
                json!({"date": "2024-03-01"}),
                json!({"date": "2024-04-05"}),
                json!({"date": "2024-06-30"}),
            ]
        );

        assert!(schema.apply(&table(json!([{"date": "soon"}]))).is_err());
    }

    #[test]
    fn test_timestamps_normalized_when_parseable() {
        let schema = TableSchema::new("breaks").optional(&[("earliestBreakStart", Timestamp)]);

        let records = schema
            .apply(&table(json!([
                {"earliestBreakStart": "2024-01-15 08:30:00"},
                {"earliestBreakStart": "08:30"}
            ])))
            .unwrap();

        assert_eq!(
            records,
            vec![
                json!({"earliestBreakStart": "2024-01-15T08:30:00.000000Z"}),
                json!({"earliestBreakStart": "08:30"}),
            ]
        );
    }

    #[test]
    fn test_relative_timestamps_sent_as_text() {
        let schema = TableSchema::new("breaks").optional(&[
            ("earliestRelativeBreakStart", Timestamp),
            ("latestRelativeBreakStart", Timestamp),
        ]);

        let records = schema
            .apply(&table(json!([
                {"earliestRelativeBreakStart": 3600, "latestRelativeBreakStart": null},
                {"earliestRelativeBreakStart": 5400.0, "latestRelativeBreakStart": 7200}
            ])))
            .unwrap();

        assert_eq!(
            records,
            vec![
                json!({"earliestRelativeBreakStart": "3600", "latestRelativeBreakStart": null}),
                json!({"earliestRelativeBreakStart": "5400", "latestRelativeBreakStart": "7200"}),
            ]
        );
    }

    #[test]
    fn test_bool_conversion() {
        assert_eq!(convert_value(Bool, &json!("TRUE")).unwrap(), json!(true));
        assert_eq!(convert_value(Bool, &json!(0)).unwrap(), json!(false));
        assert!(convert_value(Bool, &json!("maybe")).is_err());
    }

    #[test]
    fn test_undeclared_columns_pass_through() {
        let schema = TableSchema::new("geocodes").mandatory(&[("latitude", Float)]);
        let records = schema
            .apply(&table(json!([{"latitude": 1, "note": "keep me"}])))
            .unwrap();
        assert_eq!(records, vec![json!({"latitude": 1.0, "note": "keep me"})]);
    }
}
