use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Date, Str};
use crate::domain::model::Table;
use crate::utils::error::{LogHubError, Result};
use serde_json::{json, Value};

const DATE_COLUMNS: &[&str] = &["shippingDate", "expectedDeliveryDate", "actualDeliveryDate"];

const SHIPMENT_TEXT: &[&str] = &[
    "shipmentId",
    "shipmentLeg",
    "fromId",
    "toId",
    "shippingMode",
    "carrier",
    "truckShipPlaneType",
    "speedProfile",
    "benchmarkTariff",
    "surcharges",
];

const ADDRESS_TEXT: &[&str] = &[
    "fromCountry",
    "toCountry",
    "fromState",
    "toState",
    "fromCity",
    "toCity",
    "fromPostalCode",
    "toPostalCode",
    "fromStreet",
    "toStreet",
    "fromUnLocode",
    "toUnLocode",
    "fromIataCode",
    "toIataCode",
];

const MEASURES: &[&str] = &["weight", "volume", "pallets", "shipmentValue", "freightCosts"];

const COORDINATES: &[&str] = &["fromLatitude", "fromLongitude", "toLatitude", "toLongitude"];

fn check_consolidation(parameters: &Value) -> Result<()> {
    match parameters.get("consolidation") {
        Some(value) if !value.is_boolean() => {
            tracing::error!(
                "Invalid type for 'consolidation' in parameters. It should be boolean."
            );
            Err(LogHubError::validation(format!(
                "parameters.consolidation must be a boolean, got {}",
                value
            )))
        }
        _ => Ok(()),
    }
}

fn shipments(text: &[&str], floats: &[&str]) -> InputTable {
    let dates: Vec<(&str, _)> = DATE_COLUMNS.iter().map(|c| (*c, Date)).collect();
    let strings: Vec<(&str, _)> = text.iter().map(|c| (*c, Str)).collect();
    InputTable::new(
        TableSchema::new("shipments")
            .optional(&dates)
            .optional(&strings)
            .coerced_floats(floats),
    )
}

fn analyzer(name: &str, application: &str, label: &str, shipments: InputTable) -> Operation {
    Operation::new(name, application, label)
        .input(shipments)
        .input(
            InputTable::new(
                TableSchema::new("transportCostAdjustments").coerced_floats(&["factor", "flatOnTop"]),
            )
            .keyed("costAdjustment"),
        )
        .input(InputTable::new(TableSchema::new("consolidation").coerced_floats(&[
            "capacityWeight",
            "capacityVolume",
            "capacityPallets",
        ])))
        .input(InputTable::new(TableSchema::new("surcharges").coerced_floats(&["flatOnTop"])))
        .returns(&["shipments", "transports"])
        .parameters(json!({"consolidation": false}))
        .check_parameters(check_consolidation)
}

pub fn forward() -> Operation {
    let text: Vec<&str> = SHIPMENT_TEXT.iter().chain(ADDRESS_TEXT).copied().collect();
    analyzer(
        "forward_shipment_analyzer",
        "shipmentanalyzerplus",
        "shipment analyzer plus",
        shipments(&text, MEASURES),
    )
}

pub fn reverse() -> Operation {
    let floats: Vec<&str> = COORDINATES.iter().chain(MEASURES).copied().collect();
    analyzer(
        "reverse_shipment_analyzer",
        "reverseshipmentanalyzerplus",
        "reverse shipment analyzer plus",
        shipments(SHIPMENT_TEXT, &floats),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentAnalysis {
    pub shipments: Table,
    pub transports: Table,
}

/// Input tables of the shipment analyzer.
#[derive(Debug, Clone, Default)]
pub struct ShipmentAnalyzerInput {
    pub shipments: Table,
    pub transport_cost_adjustments: Table,
    pub consolidation: Table,
    pub surcharges: Table,
}

async fn analyze(
    client: &LogHubClient,
    operation: Operation,
    input: ShipmentAnalyzerInput,
    options: RunOptions,
) -> Result<ShipmentAnalysis> {
    let mut output = run(
        client,
        operation,
        vec![
            ("shipments", input.shipments),
            ("transportCostAdjustments", input.transport_cost_adjustments),
            ("consolidation", input.consolidation),
            ("surcharges", input.surcharges),
        ],
        options,
    )
    .await?;
    Ok(ShipmentAnalysis {
        shipments: output.take("shipments")?,
        transports: output.take("transports")?,
    })
}

pub async fn forward_shipment_analyzer(
    client: &LogHubClient,
    input: ShipmentAnalyzerInput,
    options: RunOptions,
) -> Result<ShipmentAnalysis> {
    analyze(client, forward(), input, options).await
}

pub async fn reverse_shipment_analyzer(
    client: &LogHubClient,
    input: ShipmentAnalyzerInput,
    options: RunOptions,
) -> Result<ShipmentAnalysis> {
    analyze(client, reverse(), input, options).await
}
