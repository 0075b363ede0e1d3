use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

fn parameters() -> Value {
    json!({
        "distanceUnit": "km",
        "vehicleType": "car",
        "streetLevel": false,
        "weightUnit": "kg",
        "volumeUnit": "cbm",
        "minWarehouses": 5,
        "maxWarehouses": 6
    })
}

fn costs_adjustments() -> InputTable {
    InputTable::new(
        TableSchema::new("costsAdjustments")
            .optional(&[
                ("id", Float),
                ("customerCountryIso2", Str),
                ("warehouseCountryIso2", Str),
                ("customerName", Str),
                ("warehouseName", Str),
                ("adjustmentFactor", Float),
                ("flatOnTop", Float),
            ])
            .strict(),
    )
    .keyed("costsAdjustmentTransportationCostsStandard")
}

pub fn forward() -> Operation {
    Operation::new(
        "forward_location_planning",
        "locationplanninglongrun",
        "location planning",
    )
    .input(InputTable::new(
        TableSchema::new("customers")
            .mandatory(&[
                ("name", Str),
                ("country", Str),
                ("weight", Float),
                ("volume", Float),
                ("numberOfShipments", Float),
            ])
            .optional(&[
                ("id", Float),
                ("state", Str),
                ("postalCode", Str),
                ("city", Str),
                ("street", Str),
            ])
            .strict(),
    ))
    .input(InputTable::new(
        TableSchema::new("warehouses")
            .mandatory(&[
                ("name", Str),
                ("country", Str),
                ("fixed", Float),
                ("minWeight", Float),
                ("maxWeight", Float),
                ("minVolume", Float),
                ("maxVolume", Float),
                ("fixedCosts", Float),
                ("costsPerWeightUnit", Float),
                ("costsPerVolumeUnit", Float),
            ])
            .optional(&[
                ("id", Float),
                ("state", Str),
                ("postalCode", Str),
                ("city", Str),
                ("street", Str),
                ("penaltyCostsWeight", Float),
                ("penaltyCostsVolume", Float),
            ])
            .strict(),
    ))
    .input(costs_adjustments())
    .returns(&["openWarehouses", "customerAssignment", "solutionKpis"])
    .parameters(parameters())
    .long_run()
}

pub fn reverse() -> Operation {
    Operation::new(
        "reverse_location_planning",
        "reverselocationplanninglongrun",
        "reverse location planning",
    )
    .input(InputTable::new(
        TableSchema::new("customers")
            .optional(&[
                ("id", Float),
                ("name", Str),
                ("latitude", Float),
                ("longitude", Float),
                ("weight", Float),
                ("volume", Float),
                ("numberOfShipments", Float),
            ])
            .strict(),
    ))
    .input(InputTable::new(
        TableSchema::new("warehouses")
            .optional(&[
                ("id", Float),
                ("name", Str),
                ("latitude", Float),
                ("longitude", Float),
                ("fixed", Float),
                ("minWeight", Float),
                ("maxWeight", Float),
                ("penaltyCostsWeight", Float),
                ("minVolume", Float),
                ("maxVolume", Float),
                ("penaltyCostsVolume", Float),
                ("fixedCosts", Float),
                ("costsPerWeightUnit", Float),
                ("costsPerVolumeUnit", Float),
            ])
            .strict(),
    ))
    .input(costs_adjustments())
    .returns(&["openWarehouses", "customerAssignment", "solutionKpis"])
    .parameters(parameters())
    .long_run()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPlan {
    pub open_warehouses: Table,
    pub customer_assignment: Table,
    pub solution_kpis: Table,
}

async fn plan(
    client: &LogHubClient,
    operation: Operation,
    customers: Table,
    warehouses: Table,
    costs_adjustments: Table,
    options: RunOptions,
) -> Result<LocationPlan> {
    let mut output = run(
        client,
        operation,
        vec![
            ("customers", customers),
            ("warehouses", warehouses),
            ("costsAdjustments", costs_adjustments),
        ],
        options,
    )
    .await?;
    Ok(LocationPlan {
        open_warehouses: output.take("openWarehouses")?,
        customer_assignment: output.take("customerAssignment")?,
        solution_kpis: output.take("solutionKpis")?,
    })
}

/// Starts the calculation and polls it until the plan is ready.
pub async fn forward_location_planning(
    client: &LogHubClient,
    customers: Table,
    warehouses: Table,
    costs_adjustments: Table,
    options: RunOptions,
) -> Result<LocationPlan> {
    plan(client, forward(), customers, warehouses, costs_adjustments, options).await
}

pub async fn reverse_location_planning(
    client: &LogHubClient,
    customers: Table,
    warehouses: Table,
    costs_adjustments: Table,
    options: RunOptions,
) -> Result<LocationPlan> {
    plan(client, reverse(), customers, warehouses, costs_adjustments, options).await
}
