use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Float, Int, Str, Timestamp};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

const VEHICLE_TYPE_COLUMNS: &[(&str, ColumnType)] = &[
    ("type", Str),
    ("availableVehicles", Float),
    ("startLocation", Str),
    ("endLocation", Str),
    ("averageSpeed", Float),
    ("maxRouteStops", Float),
    ("maxRouteLength", Float),
    ("maxRouteDuration", Float),
    ("maxCapacityWeight", Float),
    ("maxCapacityVolume", Float),
    ("maxCapacityLoadingMeter", Float),
    ("fixedCosts", Float),
    ("costsPerStop", Float),
    ("costsPerKm", Float),
];

const SHIPMENT_COLUMNS: &[(&str, ColumnType)] = &[
    ("name", Str),
    ("sender", Str),
    ("senderServiceTime", Float),
    ("earliestPickupTime", Timestamp),
    ("latestPickupTime", Timestamp),
    ("recipient", Str),
    ("recipientServiceTime", Float),
    ("earliestDeliveryTime", Timestamp),
    ("latestDeliveryTime", Timestamp),
    ("weight", Float),
    ("opportunityCosts", Float),
];

const ADDRESS_PARTS: &[(&str, ColumnType)] = &[
    ("state", Str),
    ("postalCode", Str),
    ("city", Str),
    ("street", Str),
];

fn parameters() -> Value {
    json!({"durationUnit": "min", "distanceUnit": "km"})
}

fn with_fleet_and_shipments(operation: Operation) -> Operation {
    operation
        .input(InputTable::new(TableSchema::new("vehicleTypes").mandatory(VEHICLE_TYPE_COLUMNS)))
        .input(InputTable::new(
            TableSchema::new("shipments")
                .mandatory(SHIPMENT_COLUMNS)
                .optional(&[("vehicleType", Str)])
                .coerced_floats(&["volume", "loadingMeter"]),
        ))
        .parameters(parameters())
}

pub fn forward() -> Operation {
    with_fleet_and_shipments(
        Operation::new(
            "forward_transport_optimization",
            "transportoptimization",
            "transport optimization",
        )
        .input(InputTable::new(
            TableSchema::new("locations")
                .mandatory(&[("country", Str), ("name", Str)])
                .optional(ADDRESS_PARTS),
        )),
    )
    .returns(&[
        "transportOverview",
        "transportDetails",
        "droppedShipments",
        "inputMapRoutes",
        "inputMapRoutesGeocodes",
    ])
}

pub fn reverse() -> Operation {
    with_fleet_and_shipments(
        Operation::new(
            "reverse_transport_optimization",
            "reversetransportoptimization",
            "reverse transport optimization",
        )
        .input(InputTable::new(TableSchema::new("locations").mandatory(&[
            ("name", Str),
            ("latitude", Float),
            ("longitude", Float),
        ]))),
    )
    .returns(&[
        "transportOverview",
        "transportDetails",
        "droppedShipments",
        "inputMapRoutesGeocodes",
    ])
}

const PLUS_VEHICLE_FLOATS: &[&str] = &[
    "maxWeight",
    "maxVolume",
    "maxPallets",
    "maxStops",
    "speedFactor",
    "fixed",
    "perHour",
    "perKilometer",
    "costPerStop",
    "minimumTravelTime",
    "maxTravelTime",
    "max_distance",
    "maximumDistanceBetweenStops",
];

const PLUS_VEHICLE_OPTIONS: &[(&str, ColumnType)] = &[
    ("startId", Str),
    ("endId", Str),
    ("timeWindowStart", Timestamp),
    ("timeWindowEnd", Timestamp),
    ("profile", Str),
    ("breakId", Str),
];

const PLUS_JOB_FLOATS: &[&str] = &[
    "senderStopDuration",
    "recipientStopDuration",
    "weight",
    "volume",
    "pallets",
    "external_costs",
];

fn plus_shared_inputs(operation: Operation) -> Operation {
    operation
        .input(
            InputTable::new(TableSchema::new("timeWindowProfiles").optional(&[
                ("timeWindowProfileId", Str),
                ("timeWindowProfileStart", Timestamp),
                ("timeWindowProfileEnd", Timestamp),
            ]))
            .may_be_empty(),
        )
        .input(InputTable::new(
            TableSchema::new("breaks")
                .optional(&[
                    ("breakId", Str),
                    ("earliestBreakStart", Timestamp),
                    ("latestBreakStart", Timestamp),
                    ("earliestRelativeBreakStart", Timestamp),
                    ("latestRelativeBreakStart", Timestamp),
                ])
                .coerced_floats(&["breakDuration"]),
            )
            .may_be_empty(),
        )
        .returns(&["routeOverview", "routeDetails", "externalOrders"])
        .parameters(parameters())
}

fn plus_vehicles(locations: &[(&str, ColumnType)], location_floats: &[&str]) -> InputTable {
    let floats: Vec<&str> = location_floats.iter().chain(PLUS_VEHICLE_FLOATS).copied().collect();
    InputTable::new(
        TableSchema::new("vehicles")
            .mandatory(&[("vehicleTypeId", Str), ("availableVehicles", Int)])
            .optional(PLUS_VEHICLE_OPTIONS)
            .optional(locations)
            .coerced_floats(&floats),
    )
}

pub fn forward_plus() -> Operation {
    plus_shared_inputs(
        Operation::new(
            "forward_transport_optimization_plus",
            "transportoptimizationplus",
            "transport optimization plus",
        )
        .input(plus_vehicles(
            &[
                ("startCountry", Str),
                ("startState", Str),
                ("startPostalCode", Str),
                ("startCity", Str),
                ("startStreet", Str),
                ("endCountry", Str),
                ("endState", Str),
                ("endPostalCode", Str),
                ("endCity", Str),
                ("endStreet", Str),
            ],
            &[],
        ))
        .input(InputTable::new(
            TableSchema::new("jobs")
                .mandatory(&[
                    ("shipmentId", Str),
                    ("fromName", Str),
                    ("fromCountry", Str),
                    ("toName", Str),
                    ("toCountry", Str),
                    ("vehicleTypeId", Str),
                ])
                .optional(&[
                    ("fromState", Str),
                    ("fromPostalCode", Str),
                    ("fromCity", Str),
                    ("fromStreet", Str),
                    ("senderTimeWindowProfile", Str),
                    ("toState", Str),
                    ("toPostalCode", Str),
                    ("toCity", Str),
                    ("toStreet", Str),
                    ("recipientTimeWindowProfile", Str),
                ])
                .coerced_floats(PLUS_JOB_FLOATS),
        )),
    )
}

pub fn reverse_plus() -> Operation {
    plus_shared_inputs(
        Operation::new(
            "reverse_transport_optimization_plus",
            "reversetransportoptimizationplus",
            "reverse transport optimization plus",
        )
        .input(plus_vehicles(
            &[],
            &["startLatitude", "startLongitude", "endLatitude", "endLongitude"],
        ))
        .input(InputTable::new(
            TableSchema::new("jobs")
                .mandatory(&[
                    ("shipmentId", Str),
                    ("fromName", Str),
                    ("fromLatitude", Float),
                    ("fromLongitude", Float),
                    ("toName", Str),
                    ("toLatitude", Float),
                    ("toLongitude", Float),
                ])
                .optional(&[
                    ("senderTimeWindowProfile", Str),
                    ("recipientTimeWindowProfile", Str),
                    ("vehicleTypeId", Str),
                ])
                .coerced_floats(PLUS_JOB_FLOATS),
        )),
    )
}

/// Transports planned for a set of shipments.
///
/// `input_map_routes` is only returned by the address based variant.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportPlan {
    pub transport_overview: Table,
    pub transport_details: Table,
    pub dropped_shipments: Table,
    pub input_map_routes: Option<Table>,
    pub input_map_routes_geocodes: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportPlusPlan {
    pub route_overview: Table,
    pub route_details: Table,
    pub external_orders: Table,
}

async fn plan(
    client: &LogHubClient,
    operation: Operation,
    locations: Table,
    vehicle_types: Table,
    shipments: Table,
    options: RunOptions,
) -> Result<TransportPlan> {
    let mut output = run(
        client,
        operation,
        vec![
            ("locations", locations),
            ("vehicleTypes", vehicle_types),
            ("shipments", shipments),
        ],
        options,
    )
    .await?;
    Ok(TransportPlan {
        transport_overview: output.take("transportOverview")?,
        transport_details: output.take("transportDetails")?,
        dropped_shipments: output.take("droppedShipments")?,
        input_map_routes: output.take("inputMapRoutes").ok(),
        input_map_routes_geocodes: output.take("inputMapRoutesGeocodes")?,
    })
}

pub async fn forward_transport_optimization(
    client: &LogHubClient,
    locations: Table,
    vehicle_types: Table,
    shipments: Table,
    options: RunOptions,
) -> Result<TransportPlan> {
    plan(client, forward(), locations, vehicle_types, shipments, options).await
}

pub async fn reverse_transport_optimization(
    client: &LogHubClient,
    locations: Table,
    vehicle_types: Table,
    shipments: Table,
    options: RunOptions,
) -> Result<TransportPlan> {
    plan(client, reverse(), locations, vehicle_types, shipments, options).await
}

/// Inputs of the plus variants, in request order.
#[derive(Debug, Clone, Default)]
pub struct TransportPlusInput {
    pub vehicles: Table,
    pub jobs: Table,
    pub time_window_profiles: Table,
    pub breaks: Table,
}

async fn plan_plus(
    client: &LogHubClient,
    operation: Operation,
    input: TransportPlusInput,
    options: RunOptions,
) -> Result<TransportPlusPlan> {
    let mut output = run(
        client,
        operation,
        vec![
            ("vehicles", input.vehicles),
            ("jobs", input.jobs),
            ("timeWindowProfiles", input.time_window_profiles),
            ("breaks", input.breaks),
        ],
        options,
    )
    .await?;
    Ok(TransportPlusPlan {
        route_overview: output.take("routeOverview")?,
        route_details: output.take("routeDetails")?,
        external_orders: output.take("externalOrders")?,
    })
}

pub async fn forward_transport_optimization_plus(
    client: &LogHubClient,
    input: TransportPlusInput,
    options: RunOptions,
) -> Result<TransportPlusPlan> {
    plan_plus(client, forward_plus(), input, options).await
}

pub async fn reverse_transport_optimization_plus(
    client: &LogHubClient,
    input: TransportPlusInput,
    options: RunOptions,
) -> Result<TransportPlusPlan> {
    plan_plus(client, reverse_plus(), input, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_windows_normalized() {
        let shipments = Table::from_json(&json!([{
            "name": "S1",
            "sender": "Zurich",
            "senderServiceTime": "10",
            "earliestPickupTime": "2024-03-04 07:00:00",
            "latestPickupTime": "2024-03-04 09:00:00",
            "recipient": "Basel",
            "recipientServiceTime": 15,
            "earliestDeliveryTime": "2024-03-04 12:00:00",
            "latestDeliveryTime": "not a time",
            "weight": 800,
            "opportunityCosts": 50,
            "loadingMeter": ""
        }]))
        .unwrap();

        let operation = forward();
        let records = operation.inputs()[2].schema.apply(&shipments).unwrap();
        assert_eq!(records[0]["earliestPickupTime"], "2024-03-04T07:00:00.000000Z");
        assert_eq!(records[0]["latestDeliveryTime"], "not a time");
        assert_eq!(records[0]["senderServiceTime"], json!(10.0));
        assert!(records[0].get("loadingMeter").is_none());
    }

    #[test]
    fn test_reverse_response_has_no_input_map_routes() {
        assert!(forward().response_keys().contains(&"inputMapRoutes"));
        assert!(!reverse().response_keys().contains(&"inputMapRoutes"));
    }

    #[test]
    fn test_plus_vehicles_need_whole_vehicle_count() {
        let vehicles = Table::from_json(&json!([
            {"vehicleTypeId": "V1", "availableVehicles": "2.5", "startLatitude": "47.3"}
        ]))
        .unwrap();
        let operation = reverse_plus();
        let err = operation.inputs()[0].schema.apply(&vehicles).unwrap_err();
        assert!(err.to_string().contains("availableVehicles"));
    }
}
