use crate::utils::error::{LogHubError, Result};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// One row of a table, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Column-ordered rows exchanged with the applications.
///
/// A column missing from a row reads as null. Serializes as an array of records,
/// which is the shape every application expects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.push_row(record);
        }
        table
    }

    /// Accepts an array of objects or a column-oriented object of arrays.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let mut table = Self::default();
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::Object(record) => table.push_row(record.clone()),
                        other => {
                            return Err(LogHubError::validation(format!(
                                "row {} is not an object: {}",
                                index, other
                            )))
                        }
                    }
                }
                Ok(table)
            }
            Value::Object(map) if map.values().all(Value::is_array) => {
                let mut table = Self::new(map.keys().cloned());
                let height = map
                    .values()
                    .filter_map(Value::as_array)
                    .map(Vec::len)
                    .max()
                    .unwrap_or(0);
                for index in 0..height {
                    let mut record = Record::new();
                    for (column, values) in map {
                        if let Some(cell) = values.as_array().and_then(|v| v.get(index)) {
                            record.insert(column.clone(), cell.clone());
                        }
                    }
                    table.rows.push(record);
                }
                Ok(table)
            }
            Value::Object(map) => Ok(Self::from_records(vec![map.clone()])),
            Value::Null => Ok(Self::default()),
            other => Err(LogHubError::validation(format!(
                "expected a list of records, got: {}",
                other
            ))),
        }
    }

    pub fn push_row(&mut self, row: Record) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn extend(&mut self, other: Table) {
        for row in other.rows {
            self.push_row(row);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Cell value, with missing keys and nulls both reported as `None`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .filter(|v| !v.is_null())
    }

    pub fn into_records(self) -> Vec<Record> {
        self.rows
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Str,
    Float,
    Int,
    Bool,
    /// Calendar date sent as `YYYY-MM-DD`.
    Date,
    /// Free text that is normalized to an ISO-8601 UTC timestamp when it parses as one.
    Timestamp,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Str => "str",
            ColumnType::Float => "float",
            ColumnType::Int => "int",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Scenario settings passed through to the platform as `saveScenarioParameters`.
///
/// Every field is optional; unset fields take the application's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_scenario: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite_scenario: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_with_existing_scenario: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,
}

impl SaveScenario {
    pub fn saved(workspace_id: impl Into<String>, scenario_name: impl Into<String>) -> Self {
        Self {
            save_scenario: Some(true),
            overwrite_scenario: Some(false),
            merge_with_existing_scenario: None,
            workspace_id: Some(workspace_id.into()),
            scenario_name: Some(scenario_name.into()),
        }
    }

    /// Placeholder settings shown to users as a starting point.
    pub fn template(map_application: bool) -> Self {
        Self {
            save_scenario: Some(map_application),
            overwrite_scenario: Some(false),
            merge_with_existing_scenario: map_application.then_some(false),
            workspace_id: Some("Your workspace id".to_string()),
            scenario_name: Some("Your scenario name".to_string()),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.save_scenario.unwrap_or(false)
    }
}

/// Links to the results of a saved scenario on the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceLinks {
    pub map: Option<String>,
    pub dashboard: Option<String>,
    pub input_dataset: Option<String>,
    pub output_dataset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub workspace_id: String,
}

/// Where a long-running calculation reports its progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunHandle {
    pub api_server: String,
    pub url: String,
}

/// Bounded retry applied to throttled or failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Caller input for one operation run.
#[derive(Debug, Clone, Default)]
pub struct OperationRequest {
    pub tables: HashMap<String, Table>,
    pub parameters: Option<Value>,
    pub save_scenario: Option<SaveScenario>,
    pub fetch_links: bool,
}

impl OperationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn save_scenario(mut self, save_scenario: SaveScenario) -> Self {
        self.save_scenario = Some(save_scenario);
        self
    }

    pub fn fetch_links(mut self, fetch_links: bool) -> Self {
        self.fetch_links = fetch_links;
        self
    }

    pub fn is_saving_scenario(&self) -> bool {
        self.save_scenario
            .as_ref()
            .map(SaveScenario::is_saved)
            .unwrap_or(false)
    }
}

/// Result tables in the order the application documents them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationOutput {
    pub tables: Vec<(String, Table)>,
    pub links: Option<WorkspaceLinks>,
}

impl OperationOutput {
    pub fn get(&self, key: &str) -> Option<&Table> {
        self.tables.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn take(&mut self, key: &str) -> Result<Table> {
        let index = self
            .tables
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| LogHubError::validation(format!("no result table named '{}'", key)))?;
        Ok(self.tables.remove(index).1)
    }

    pub fn into_tables(self) -> Vec<(String, Table)> {
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_records_keeps_first_seen_column_order() {
        let value = json!([
            {"name": "Berlin", "country": "DE"},
            {"name": "Zurich", "country": "CH", "city": "Zurich"}
        ]);

        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.columns(), ["name", "country", "city"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "city"), Some(&json!("Zurich")));
        assert_eq!(table.get(0, "city"), None);
    }

    #[test]
    fn test_from_json_column_oriented() {
        let value = json!({"distance": [10.5, 20.0], "duration": [12, 24]});

        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "distance"), Some(&json!(20.0)));
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        assert!(Table::from_json(&json!("oops")).is_err());
        assert!(Table::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_table_serializes_as_records() {
        let mut table = Table::new(["id"]);
        let mut row = Record::new();
        row.insert("id".to_string(), json!(1));
        table.push_row(row);

        assert_eq!(serde_json::to_value(&table).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn test_save_scenario_template() {
        let template = SaveScenario::template(true);
        assert!(template.is_saved());
        assert_eq!(template.merge_with_existing_scenario, Some(false));

        let template = SaveScenario::template(false);
        assert!(!template.is_saved());
        assert_eq!(template.merge_with_existing_scenario, None);
    }
}
