use crate::core::schema::{parse_date, TableSchema};
use crate::domain::model::{ColumnType, Table};
use crate::utils::error::{LogHubError, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const DEFAULT_DATASET_API: &str = "https://production.supply-chain-apps.log-hub.com";
const DEFAULT_TABLE_NAME: &str = "Table 01";

/// Column description as stored with a platform table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    #[serde(default)]
    pub name: String,
    pub property_name: String,
    pub data_type: String,
    #[serde(default = "general_format")]
    pub format: String,
}

fn general_format() -> String {
    "General".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnOverride {
    pub name: Option<String>,
    pub data_type: Option<String>,
    pub format: Option<String>,
}

/// Table name and column layout sent with an update.
///
/// Without explicit `columns` the layout is inferred from the data and then
/// patched with `overrides`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableMetadata {
    pub table_name: Option<String>,
    pub columns: Option<Vec<ColumnMetadata>>,
    pub overrides: HashMap<String, ColumnOverride>,
}

/// Reads and replaces tables of platform datasets.
#[derive(Debug, Clone)]
pub struct DatasetClient {
    http: Client,
    api_server: String,
    email: String,
    api_key: String,
}

impl DatasetClient {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_server: DEFAULT_DATASET_API.to_string(),
            email: email.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_api_server(mut self, api_server: impl Into<String>) -> Self {
        let api_server: String = api_server.into();
        self.api_server = api_server.trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    async fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        Ok(self
            .http
            .get(url)
            .basic_auth(&self.email, Some(&self.api_key))
            .send()
            .await?)
    }

    /// Downloads a table, typing its columns from the dataset metadata.
    ///
    /// `table_link` points at the rows endpoint of the table.
    pub async fn read_table(&self, table_link: &str) -> Result<Table> {
        let metadata_link = metadata_link(table_link)?;

        let response = self.get(&metadata_link).await?;
        if !response.status().is_success() {
            return Err(http_error("metadata request", response).await);
        }
        let metadata: Value = response.json().await?;
        let column_types = column_types(&metadata)?;

        let response = self.get(table_link).await?;
        if !response.status().is_success() {
            return Err(http_error("data request", response).await);
        }
        let data: Value = response.json().await?;
        let table = Table::from_json(&data)?;

        let declared: Vec<(&str, ColumnType)> = column_types
            .iter()
            .filter(|(name, _)| table.has_column(name))
            .map(|(name, column_type)| (name.as_str(), *column_type))
            .collect();
        let schema = TableSchema::new("dataset").optional(&declared);

        let mut typed = Table::new(table.columns().to_vec());
        for value in schema.apply(&table)? {
            if let Value::Object(record) = value {
                typed.push_row(record);
            }
        }
        tracing::info!("Read {} rows from {}", typed.len(), table_link);
        Ok(typed)
    }

    /// Replaces the rows of a table.
    pub async fn update_table(
        &self,
        table_link: &str,
        table: &Table,
        metadata: &TableMetadata,
    ) -> Result<()> {
        let (dataset_id, table_id) = extract_ids_from_link(table_link)?;
        let columns = match &metadata.columns {
            Some(columns) => columns.clone(),
            None => create_metadata(table, &metadata.overrides),
        };

        let body = json!({
            "name": metadata.table_name.as_deref().unwrap_or(DEFAULT_TABLE_NAME),
            "columns": columns,
            "rows": table,
        });

        let url = format!(
            "{}/api/v1/datasets/{}/tables/{}",
            self.api_server, dataset_id, table_id
        );
        tracing::debug!("PATCH {}", url);
        let response = self
            .http
            .patch(&url)
            .basic_auth(&self.email, Some(&self.api_key))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!("Table updated successfully.");
            Ok(())
        } else {
            Err(http_error("table update", response).await)
        }
    }
}

async fn http_error(context: &str, response: Response) -> LogHubError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("HTTP Error in {}: {} - {}", context, status, body);
    LogHubError::Api {
        application: format!("dataset {}", context),
        status,
        body,
    }
}

/// The table link without its last two path segments.
pub fn metadata_link(table_link: &str) -> Result<String> {
    let segments: Vec<&str> = table_link.trim_end_matches('/').split('/').collect();
    if segments.len() < 4 {
        return Err(LogHubError::validation(format!(
            "'{}' is not a dataset table link",
            table_link
        )));
    }
    Ok(segments[..segments.len() - 2].join("/"))
}

/// Dataset and table ids from a link such as `.../datasets/{dataset}/tables/{table}/rows`.
pub fn extract_ids_from_link(table_link: &str) -> Result<(String, String)> {
    let url = url::Url::parse(table_link)?;
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

    let after = |marker: &str| -> Result<String> {
        segments
            .iter()
            .position(|s| *s == marker)
            .and_then(|i| segments.get(i + 1))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                LogHubError::validation(format!("no '{}' id in link '{}'", marker, table_link))
            })
    };

    Ok((after("datasets")?, after("tables")?))
}

fn column_types(metadata: &Value) -> Result<Vec<(String, ColumnType)>> {
    let first = metadata
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .ok_or_else(|| {
            tracing::error!("Metadata JSON does not contain 'data' key or it's empty");
            LogHubError::validation("dataset metadata has no 'data' entries")
        })?;

    let columns: Vec<ColumnMetadata> = match first.get("columns") {
        Some(columns) => serde_json::from_value(columns.clone())?,
        None => Vec::new(),
    };

    Ok(columns
        .into_iter()
        .map(|c| {
            let column_type = match c.data_type.as_str() {
                "number" => ColumnType::Float,
                "date" => ColumnType::Date,
                "boolean" => ColumnType::Bool,
                _ => ColumnType::Str,
            };
            (c.property_name, column_type)
        })
        .collect())
}

/// Infers the column layout of a table, applying per-column overrides.
pub fn create_metadata(table: &Table, overrides: &HashMap<String, ColumnOverride>) -> Vec<ColumnMetadata> {
    table
        .columns()
        .iter()
        .map(|column| {
            let mut metadata = ColumnMetadata {
                name: column.clone(),
                property_name: column.clone(),
                data_type: infer_data_type(table, column).to_string(),
                format: general_format(),
            };
            if let Some(o) = overrides.get(column) {
                if let Some(name) = &o.name {
                    metadata.name = name.clone();
                }
                if let Some(data_type) = &o.data_type {
                    metadata.data_type = data_type.clone();
                }
                if let Some(format) = &o.format {
                    metadata.format = format.clone();
                }
            }
            metadata
        })
        .collect()
}

fn infer_data_type(table: &Table, column: &str) -> &'static str {
    let values: Vec<&Value> = (0..table.len()).filter_map(|i| table.get(i, column)).collect();
    if values.is_empty() {
        return "string";
    }
    if values.iter().all(|v| v.is_boolean()) {
        "boolean"
    } else if values.iter().all(|v| v.is_number()) {
        "number"
    } else if values
        .iter()
        .all(|v| v.as_str().and_then(parse_date).is_some())
    {
        "date"
    } else {
        "string"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_link_drops_last_two_segments() {
        assert_eq!(
            metadata_link("https://host/api/v1/datasets/d1/tables/t1/rows").unwrap(),
            "https://host/api/v1/datasets/d1/tables"
        );
        assert!(metadata_link("rows").is_err());
    }

    #[test]
    fn test_extract_ids_from_link() {
        let (dataset, table) =
            extract_ids_from_link("https://host/api/v1/datasets/d1/tables/t1/rows").unwrap();
        assert_eq!(dataset, "d1");
        assert_eq!(table, "t1");

        assert!(extract_ids_from_link("https://host/api/v1/datasets/d1").is_err());
    }

    #[test]
    fn test_create_metadata_infers_types_and_applies_overrides() {
        let table = Table::from_json(&json!([
            {"sku": "A-1", "amount": 10, "active": true, "day": "2024-01-31"},
            {"sku": "B-2", "amount": 12.5, "active": false, "day": null}
        ]))
        .unwrap();

        let mut overrides = HashMap::new();
        overrides.insert(
            "amount".to_string(),
            ColumnOverride {
                format: Some("Currency".to_string()),
                ..Default::default()
            },
        );

        let metadata = create_metadata(&table, &overrides);
        let types: Vec<&str> = metadata.iter().map(|c| c.data_type.as_str()).collect();
        assert_eq!(types, ["string", "number", "boolean", "date"]);
        assert_eq!(metadata[1].format, "Currency");
        assert_eq!(metadata[0].format, "General");
    }

    #[test]
    fn test_column_types_require_data() {
        assert!(column_types(&json!({"data": []})).is_err());

        let types = column_types(&json!({"data": [{"columns": [
            {"name": "Qty", "propertyName": "qty", "dataType": "number"},
            {"name": "Note", "propertyName": "note", "dataType": "string"}
        ]}]}))
        .unwrap();
        assert_eq!(
            types,
            vec![
                ("qty".to_string(), ColumnType::Float),
                ("note".to_string(), ColumnType::Str)
            ]
        );
    }
}
