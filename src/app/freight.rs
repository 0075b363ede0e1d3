use super::{run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Float, Str};
use crate::domain::model::{SaveScenario, Table};
use crate::utils::error::{LogHubError, Result};
use serde_json::{json, Value};

const MEASURES: &[&str] = &["distance", "weight", "volume", "pallets", "loadingMeters"];

fn check_matrix(matrix: &Value) -> Result<()> {
    match matrix.get("matrixId").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => Ok(()),
        _ => {
            tracing::error!("Invalid 'matrixId' in matrix. It should be a non-empty string.");
            Err(LogHubError::validation("matrix.matrixId must be a non-empty string"))
        }
    }
}

fn freight_matrix(name: &str, application: &str, label: &str, shipments: TableSchema) -> Operation {
    Operation::new(name, application, label)
        .input(InputTable::new(shipments.coerced_floats(MEASURES)))
        .returns(&["evaluatedShipments"])
        .parameters_under("matrix", json!({"matrixId": ""}))
        .check_parameters(check_matrix)
}

pub fn forward() -> Operation {
    freight_matrix(
        "forward_freight_matrix_plus",
        "freightmatrixplus",
        "freight matrix plus",
        TableSchema::new("shipments")
            .mandatory(&[
                ("shipmentId", Str),
                ("fromLocationId", Str),
                ("fromCountry", Str),
                ("toLocationId", Str),
                ("toCountry", Str),
            ])
            .optional(&[
                ("fromState", Str),
                ("fromCity", Str),
                ("fromPostalCode", Str),
                ("fromStreet", Str),
                ("fromZone", Str),
                ("toState", Str),
                ("toCity", Str),
                ("toPostalCode", Str),
                ("toStreet", Str),
                ("toZone", Str),
            ]),
    )
}

pub fn reverse() -> Operation {
    freight_matrix(
        "reverse_freight_matrix_plus",
        "reversefreightmatrixplus",
        "reverse freight matrix plus",
        TableSchema::new("shipments")
            .mandatory(&[
                ("shipmentId", Str),
                ("fromLocationId", Str),
                ("fromLatitude", Float),
                ("fromLongitude", Float),
                ("toLocationId", Str),
                ("toLatitude", Float),
                ("toLongitude", Float),
            ])
            .optional(&[("fromState", Str), ("fromZone", Str), ("toZone", Str)]),
    )
}

fn options(matrix_id: &str, save_scenario: Option<SaveScenario>) -> RunOptions {
    RunOptions {
        parameters: Some(json!({ "matrixId": matrix_id })),
        save_scenario,
    }
}

/// Prices each shipment with the freight matrix `matrix_id` stored on the platform.
pub async fn forward_freight_matrix_plus(
    client: &LogHubClient,
    shipments: Table,
    matrix_id: &str,
    save_scenario: Option<SaveScenario>,
) -> Result<Table> {
    run_single(
        client,
        forward(),
        vec![("shipments", shipments)],
        options(matrix_id, save_scenario),
    )
    .await
}

pub async fn reverse_freight_matrix_plus(
    client: &LogHubClient,
    shipments: Table,
    matrix_id: &str,
    save_scenario: Option<SaveScenario>,
) -> Result<Table> {
    run_single(
        client,
        reverse(),
        vec![("shipments", shipments)],
        options(matrix_id, save_scenario),
    )
    .await
}
