use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

const ADDRESS: &[(&str, ColumnType)] = &[
    ("country", Str),
    ("state", Str),
    ("postalCode", Str),
    ("city", Str),
    ("street", Str),
];

const COORDINATES: &[(&str, ColumnType)] = &[("latitude", Float), ("longitude", Float)];

const OUTBOUND_COSTS: &[(&str, ColumnType)] = &[
    ("outboundFtlCapacityWeight", Float),
    ("outboundFtlCapacityVolume", Float),
    ("minimumFtlCosts", Float),
    ("outboundFtlCost1DistanceUnit", Float),
    ("outboundFtlCost1000DistanceUnit", Float),
    ("minimumLtlCosts", Float),
    ("outboundCostsHalfFtlPercent", Float),
];

const WAREHOUSE_COSTS: &[(&str, ColumnType)] = &[
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
];

const WAREHOUSE_REPLENISHMENT: &[(&str, ColumnType)] = &[
    ("minimumInboundReplenishmentFrequency", Float),
    ("minimumOutboundReplenishmentFrequency", Float),
    ("weightCostFunction", Str),
    ("volumeCostFunction", Str),
];

const CUSTOMER_DEMAND: &[(&str, ColumnType)] = &[
    ("weight", Float),
    ("volume", Float),
    ("numberOfShipments", Float),
    ("productSegments", Str),
    ("factory", Str),
    ("warehouse", Str),
    ("maximumWarehouseDistance", Float),
    ("penaltyCostsWarehouseDistance", Float),
];

/// Name of each input table and the key it is sent under.
pub const INPUTS: &[(&str, &str)] = &[
    ("factories", "factories"),
    ("warehouses", "warehouses"),
    ("customers", "customers"),
    ("productSegments", "productSegments"),
    ("transportCosts", "transportCosts"),
    ("transportCostsRules", "transportsCostsRules"),
    ("stepwiseCostFunctionWeight", "stepwiseCostFunctionWeight"),
    ("stepwiseCostFunctionVolume", "stepwiseCostFunctionVolume"),
    ("distanceLimits", "distanceLimits"),
];

fn parameters() -> Value {
    json!({
        "distanceUnit": "km",
        "vehicleType": "car",
        "streetLevel": false,
        "inboundConsolidation": true,
        "outboundConsolidation": false,
        "allowMultisourcing": true,
        "minWarehouses": 1,
        "maxWarehouses": 2
    })
}

fn strict(table: &str, groups: &[&[(&str, ColumnType)]]) -> InputTable {
    let mut schema = TableSchema::new(table).optional(&[("id", Float)]);
    for columns in groups {
        schema = schema.optional(columns);
    }
    let request_key = INPUTS
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, key)| *key)
        .unwrap_or(table);
    InputTable::new(schema.strict()).keyed(request_key)
}

/// Tables that do not depend on how locations are given.
fn shared_inputs(operation: Operation) -> Operation {
    operation
        .input(strict(
            "productSegments",
            &[&[("segmentName", Str), ("availableWarehouses", Str)]],
        ))
        .input(strict(
            "transportCosts",
            &[&[
                ("startLocationName", Str),
                ("endLocationName", Str),
                ("weightCapacity", Float),
                ("volumeCapacity", Float),
                ("costsPerUnit", Float),
            ]],
        ))
        .input(strict(
            "transportCostsRules",
            &[&[
                ("fromCountryIso2", Str),
                ("fromZip", Str),
                ("fromName", Str),
                ("toCountryIso2", Str),
                ("toZip", Str),
                ("toName", Str),
                ("layer", Str),
                ("distance", Float),
                ("weightCapacityPerUnit", Float),
                ("volumeCapacityPerUnit", Float),
                ("costsPerUnit", Float),
            ]],
        ))
        .input(strict(
            "stepwiseCostFunctionWeight",
            &[&[
                ("stepFunctionId", Str),
                ("stepEnd", Float),
                ("fixedCost", Float),
                ("costPerWeightUnit", Float),
            ]],
        ))
        .input(strict(
            "stepwiseCostFunctionVolume",
            &[&[
                ("stepFunctionId", Str),
                ("stepEnd", Float),
                ("fixedCost", Float),
                ("costPerVolumeUnit", Float),
            ]],
        ))
        .input(strict(
            "distanceLimits",
            &[&[
                ("distanceLimit", Str),
                ("weightPercentage", Str),
                ("volumePercentage", Str),
                ("distanceLimitPenalty", Str),
            ]],
        ))
        .returns(&[
            "openWarehouses",
            "factoryAssignment",
            "customerAssignment",
            "solutionKpis",
        ])
        .parameters(parameters())
        .long_run()
}

pub fn forward() -> Operation {
    let location = ADDRESS;
    shared_inputs(
        Operation::new(
            "forward_network_design_plus",
            "networkdesignpluslongrun",
            "network design plus",
        )
        .input(strict("factories", &[&[("name", Str)], location, OUTBOUND_COSTS]))
        .input(strict(
            "warehouses",
            &[&[("name", Str)], location, WAREHOUSE_COSTS, OUTBOUND_COSTS, WAREHOUSE_REPLENISHMENT],
        ))
        .input(strict("customers", &[&[("name", Str)], location, CUSTOMER_DEMAND])),
    )
}

pub fn reverse() -> Operation {
    let location = COORDINATES;
    shared_inputs(
        Operation::new(
            "reverse_network_design_plus",
            "reversenetworkdesignpluslongrun",
            "reverse network design plus",
        )
        .input(strict("factories", &[&[("name", Str)], location, OUTBOUND_COSTS]))
        .input(strict(
            "warehouses",
            &[&[("name", Str)], location, WAREHOUSE_COSTS, OUTBOUND_COSTS, WAREHOUSE_REPLENISHMENT],
        ))
        .input(strict("customers", &[&[("name", Str)], location, CUSTOMER_DEMAND])),
    )
}

/// The nine input tables of a network design run.
#[derive(Debug, Clone, Default)]
pub struct NetworkDesignInput {
    pub factories: Table,
    pub warehouses: Table,
    pub customers: Table,
    pub product_segments: Table,
    pub transport_costs: Table,
    pub transport_costs_rules: Table,
    pub stepwise_cost_function_weight: Table,
    pub stepwise_cost_function_volume: Table,
    pub distance_limits: Table,
}

impl NetworkDesignInput {
    fn into_tables(self) -> Vec<(&'static str, Table)> {
        let tables = [
            self.factories,
            self.warehouses,
            self.customers,
            self.product_segments,
            self.transport_costs,
            self.transport_costs_rules,
            self.stepwise_cost_function_weight,
            self.stepwise_cost_function_volume,
            self.distance_limits,
        ];
        INPUTS.iter().map(|(name, _)| *name).zip(tables).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkDesign {
    pub open_warehouses: Table,
    pub factory_assignment: Table,
    pub customer_assignment: Table,
    pub solution_kpis: Table,
}

async fn design(
    client: &LogHubClient,
    operation: Operation,
    input: NetworkDesignInput,
    options: RunOptions,
) -> Result<NetworkDesign> {
    let mut output = run(client, operation, input.into_tables(), options).await?;
    Ok(NetworkDesign {
        open_warehouses: output.take("openWarehouses")?,
        factory_assignment: output.take("factoryAssignment")?,
        customer_assignment: output.take("customerAssignment")?,
        solution_kpis: output.take("solutionKpis")?,
    })
}

/// Long-running: polls until the design is solved or the polling timeout is hit.
pub async fn forward_network_design_plus(
    client: &LogHubClient,
    input: NetworkDesignInput,
    options: RunOptions,
) -> Result<NetworkDesign> {
    design(client, forward(), input, options).await
}

pub async fn reverse_network_design_plus(
    client: &LogHubClient,
    input: NetworkDesignInput,
    options: RunOptions,
) -> Result<NetworkDesign> {
    design(client, reverse(), input, options).await
}
