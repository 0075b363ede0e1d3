use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Float, Int, Str, Timestamp};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::json;

const VEHICLE_TYPE_COLUMNS: &[(&str, ColumnType)] = &[
    ("type", Str),
    ("availableVehicles", Float),
    ("startDepot", Str),
    ("endDepot", Str),
    ("averageSpeed", Float),
    ("maxRouteStops", Float),
    ("maxRouteLength", Float),
    ("maxRouteDuration", Float),
    ("maxCapacityWeight", Float),
    ("maxCapacityVolume", Float),
    ("maxCapacityPallets", Float),
    ("fixedCosts", Float),
    ("costsPerStop", Float),
    ("costsPerDistanceUnit", Float),
];

const ORDER_COLUMNS: &[(&str, ColumnType)] = &[
    ("weight", Float),
    ("volume", Float),
    ("pallets", Float),
    ("depot", Str),
    ("serviceTime", Float),
    ("startTimeWindow", Timestamp),
    ("endTimeWindow", Timestamp),
    ("externalCosts", Float),
];

const ADDRESS_PARTS: &[(&str, ColumnType)] = &[
    ("state", Str),
    ("postalCode", Str),
    ("city", Str),
    ("street", Str),
];

const RESPONSE_KEYS: &[&str] = &[
    "routeOverview",
    "routeDetails",
    "droppedCustomers",
    "inputMapRoutes",
    "inputMapRoutesGeocodes",
];

fn vehicle_types() -> InputTable {
    InputTable::new(TableSchema::new("vehicleTypes").mandatory(VEHICLE_TYPE_COLUMNS))
}

pub fn forward() -> Operation {
    Operation::new(
        "forward_milkrun_optimization",
        "milkrunoptimization",
        "milkrun optimization",
    )
    .input(InputTable::new(
        TableSchema::new("depots")
            .mandatory(&[("country", Str), ("name", Str)])
            .optional(ADDRESS_PARTS),
    ))
    .input(vehicle_types())
    .input(
        InputTable::new(
            TableSchema::new("pickupAndDelivery")
                .mandatory(&[("name", Str), ("country", Str)])
                .mandatory(ORDER_COLUMNS)
                .optional(ADDRESS_PARTS)
                .optional(&[("vehicleType", Str), ("pickupDelivery", Str)]),
        )
        .keyed("customers"),
    )
    .returns(RESPONSE_KEYS)
    .parameters(json!({"distanceUnit": "km", "durationUnit": "min"}))
}

pub fn reverse() -> Operation {
    Operation::new(
        "reverse_milkrun_optimization",
        "reversemilkrunoptimization",
        "reverse milkrun optimization",
    )
    .input(InputTable::new(TableSchema::new("depots").mandatory(&[
        ("name", Str),
        ("latitude", Float),
        ("longitude", Float),
    ])))
    .input(vehicle_types())
    .input(
        InputTable::new(
            TableSchema::new("pickupAndDelivery")
                .mandatory(&[("name", Str), ("latitude", Float), ("longitude", Float)])
                .mandatory(ORDER_COLUMNS)
                .optional(&[("vehicleType", Str), ("pickupDelivery", Str)]),
        )
        .keyed("customers"),
    )
    .returns(&[
        "routeOverview",
        "routeDetails",
        "droppedCustomers",
        "inputMapRoutesGeocodes",
    ])
    .parameters(json!({"distanceUnit": "km", "durationUnit": "min"}))
}

const PLUS_VEHICLE_COLUMNS: &[(&str, ColumnType)] = &[
    ("vehicleTypeId", Str),
    ("availableVehicles", Int),
    ("startDepot", Str),
    ("endDepot", Str),
    ("maxWeight", Float),
    ("maxVolume", Float),
    ("maxPallets", Int),
    ("maxStops", Int),
    ("timeWindowStart", Timestamp),
    ("timeWindowEnd", Timestamp),
    ("profile", Str),
    ("speedFactor", Float),
    ("fixed", Float),
    ("perHour", Float),
    ("perKilometer", Float),
    ("costPerStop", Float),
    ("minimumTravelTime", Float),
    ("maxTravelTime", Float),
    ("max_distance", Float),
    ("maximumDistanceBetweenStops", Float),
    ("breakId", Str),
];

const PLUS_JOB_COLUMNS: &[(&str, ColumnType)] = &[
    ("depotId", Str),
    ("orderId", Str),
    ("weight", Float),
    ("volume", Float),
    ("pallets", Int),
    ("pickupDelivery", Str),
    ("vehicleTypeId", Str),
    ("stopDuration", Float),
    ("timeWindowProfile", Str),
    ("stopDurationAtDepo", Float),
    ("external_costs", Float),
];

fn plus_shared_inputs(operation: Operation) -> Operation {
    operation
        .input(InputTable::new(TableSchema::new("timeWindowProfiles").mandatory(&[
            ("timeWindowProfileId", Str),
            ("timeWindowProfileStart", Timestamp),
            ("timeWindowProfileEnd", Timestamp),
        ])))
        .input(InputTable::new(TableSchema::new("breaks").mandatory(&[
            ("breakId", Str),
            ("earliestBreakStart", Timestamp),
            ("latestBreakStart", Timestamp),
            ("earliestRelativeBreakStart", Timestamp),
            ("latestRelativeBreakStart", Timestamp),
            ("breakDuration", Float),
        ])))
        .returns(&["routeOverview", "routeDetails", "externalOrders"])
        .parameters(json!({"durationUnit": "min"}))
}

pub fn forward_plus() -> Operation {
    plus_shared_inputs(
        Operation::new(
            "forward_milkrun_optimization_plus",
            "milkrunoptimizationplus",
            "milkrun optimization plus",
        )
        .input(InputTable::new(
            TableSchema::new("depots")
                .mandatory(&[("country", Str)])
                .mandatory(ADDRESS_PARTS)
                .mandatory(&[("depotId", Str), ("processingTimeAtTheDepo", Float)]),
        ))
        .input(InputTable::new(TableSchema::new("vehicles").mandatory(PLUS_VEHICLE_COLUMNS)))
        .input(InputTable::new(
            TableSchema::new("jobs")
                .mandatory(&[("country", Str)])
                .mandatory(ADDRESS_PARTS)
                .mandatory(PLUS_JOB_COLUMNS),
        )),
    )
}

pub fn reverse_plus() -> Operation {
    plus_shared_inputs(
        Operation::new(
            "reverse_milkrun_optimization_plus",
            "reversemilkrunoptimizationplus",
            "reverse milkrun optimization plus",
        )
        .input(InputTable::new(TableSchema::new("depots").mandatory(&[
            ("latitude", Float),
            ("longitude", Float),
            ("depotId", Str),
            ("processingTimeAtTheDepo", Float),
        ])))
        .input(InputTable::new(TableSchema::new("vehicles").mandatory(PLUS_VEHICLE_COLUMNS)))
        .input(InputTable::new(
            TableSchema::new("jobs")
                .mandatory(&[("latitude", Float), ("longitude", Float)])
                .mandatory(PLUS_JOB_COLUMNS),
        )),
    )
}

/// Planned routes of a milkrun optimization.
///
/// `input_map_routes` is only returned by the address based variant.
#[derive(Debug, Clone, PartialEq)]
pub struct MilkrunRoutes {
    pub route_overview: Table,
    pub route_details: Table,
    pub dropped_customers: Table,
    pub input_map_routes: Option<Table>,
    pub input_map_routes_geocodes: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilkrunPlusRoutes {
    pub route_overview: Table,
    pub route_details: Table,
    pub external_orders: Table,
}

async fn routes(
    client: &LogHubClient,
    operation: Operation,
    depots: Table,
    vehicle_types: Table,
    pickup_and_delivery: Table,
    options: RunOptions,
) -> Result<MilkrunRoutes> {
    let mut output = run(
        client,
        operation,
        vec![
            ("depots", depots),
            ("vehicleTypes", vehicle_types),
            ("pickupAndDelivery", pickup_and_delivery),
        ],
        options,
    )
    .await?;
    Ok(MilkrunRoutes {
        route_overview: output.take("routeOverview")?,
        route_details: output.take("routeDetails")?,
        dropped_customers: output.take("droppedCustomers")?,
        input_map_routes: output.take("inputMapRoutes").ok(),
        input_map_routes_geocodes: output.take("inputMapRoutesGeocodes")?,
    })
}

pub async fn forward_milkrun_optimization(
    client: &LogHubClient,
    depots: Table,
    vehicle_types: Table,
    pickup_and_delivery: Table,
    options: RunOptions,
) -> Result<MilkrunRoutes> {
    routes(client, forward(), depots, vehicle_types, pickup_and_delivery, options).await
}

pub async fn reverse_milkrun_optimization(
    client: &LogHubClient,
    depots: Table,
    vehicle_types: Table,
    pickup_and_delivery: Table,
    options: RunOptions,
) -> Result<MilkrunRoutes> {
    routes(client, reverse(), depots, vehicle_types, pickup_and_delivery, options).await
}

/// Inputs of the plus variants, in request order.
#[derive(Debug, Clone, Default)]
pub struct MilkrunPlusInput {
    pub depots: Table,
    pub vehicles: Table,
    pub jobs: Table,
    pub time_window_profiles: Table,
    pub breaks: Table,
}

async fn plus_routes(
    client: &LogHubClient,
    operation: Operation,
    input: MilkrunPlusInput,
    options: RunOptions,
) -> Result<MilkrunPlusRoutes> {
    let mut output = run(
        client,
        operation,
        vec![
            ("depots", input.depots),
            ("vehicles", input.vehicles),
            ("jobs", input.jobs),
            ("timeWindowProfiles", input.time_window_profiles),
            ("breaks", input.breaks),
        ],
        options,
    )
    .await?;
    Ok(MilkrunPlusRoutes {
        route_overview: output.take("routeOverview")?,
        route_details: output.take("routeDetails")?,
        external_orders: output.take("externalOrders")?,
    })
}

pub async fn forward_milkrun_optimization_plus(
    client: &LogHubClient,
    input: MilkrunPlusInput,
    options: RunOptions,
) -> Result<MilkrunPlusRoutes> {
    plus_routes(client, forward_plus(), input, options).await
}

pub async fn reverse_milkrun_optimization_plus(
    client: &LogHubClient,
    input: MilkrunPlusInput,
    options: RunOptions,
) -> Result<MilkrunPlusRoutes> {
    plus_routes(client, reverse_plus(), input, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OperationRequest;

    #[test]
    fn test_customers_sent_under_request_key() {
        let operation = reverse();
        let input = &operation.inputs()[2];
        assert_eq!(input.name, "pickupAndDelivery");
        assert_eq!(input.request_key, "customers");
    }

    #[test]
    fn test_time_windows_normalized() {
        let breaks = Table::from_json(&json!([{
            "breakId": "B1",
            "earliestBreakStart": "2024-05-02 11:30:00",
            "latestBreakStart": "2024-05-02T12:30:00Z",
            "earliestRelativeBreakStart": "04:00",
            "latestRelativeBreakStart": "05:00",
            "breakDuration": "30"
        }]))
        .unwrap();

        let operation = reverse_plus();
        let schema = &operation
            .inputs()
            .iter()
            .find(|i| i.name == "breaks")
            .unwrap()
            .schema;
        let records = schema.apply(&breaks).unwrap();
        assert_eq!(records[0]["earliestBreakStart"], "2024-05-02T11:30:00.000000Z");
        assert_eq!(records[0]["latestBreakStart"], "2024-05-02T12:30:00.000000Z");
        assert_eq!(records[0]["earliestRelativeBreakStart"], "04:00");
        assert_eq!(records[0]["breakDuration"], json!(30.0));
    }

    #[test]
    fn test_plus_pallets_must_be_whole() {
        let jobs = Table::from_json(&json!([{
            "latitude": 47.0, "longitude": 8.0, "depotId": "D1", "orderId": "O1",
            "weight": 1, "volume": 1, "pallets": "1.5", "pickupDelivery": "delivery",
            "vehicleTypeId": "V1", "stopDuration": 5, "timeWindowProfile": "",
            "stopDurationAtDepo": 0, "external_costs": 0
        }]))
        .unwrap();

        let operation = reverse_plus();
        let err = operation.inputs()[2].schema.apply(&jobs).unwrap_err();
        assert!(err.to_string().contains("pallets"));
    }

    #[test]
    fn test_missing_pickup_and_delivery_table() {
        let request = OperationRequest::new()
            .table("depots", Table::default())
            .table("vehicleTypes", Table::default());
        assert!(forward().build_payload(&request).is_err());
    }
}
