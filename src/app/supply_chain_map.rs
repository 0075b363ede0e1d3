//! Map layers drawn on the platform. Scenarios of these applications are saved by default.

use super::{run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::json;

const ADDRESS_PARTS: &[(&str, ColumnType)] = &[
    ("state", Str),
    ("postalCode", Str),
    ("city", Str),
    ("street", Str),
];

pub fn areas() -> Operation {
    Operation::new(
        "forward_supply_chain_map_areas",
        "supplychainmapareas",
        "supply chain map areas",
    )
    .input(
        InputTable::new(
            TableSchema::new("areas")
                .mandatory(&[("country", Str), ("region", Str)])
                .optional(&[
                    ("searchId", Str),
                    ("name", Str),
                    ("layer", Str),
                    ("continent", Str),
                    ("countryRegionOne", Str),
                    ("countryRegionTwo", Str),
                    ("countryName", Str),
                ])
                .coerced_floats(&["id", "quantity", "centerLat", "centerLong", "population", "areaKm2"]),
        )
        .keyed("areaData"),
    )
    .returns(&["areaResult"])
    .parameters(json!({"detailLevel": false}))
}

pub fn forward_locations() -> Operation {
    Operation::new(
        "forward_supply_chain_map_locations",
        "supplychainmaplocations",
        "supply chain map locations",
    )
    .input(
        InputTable::new(
            TableSchema::new("addresses")
                .mandatory(&[("name", Str), ("country", Str)])
                .optional(ADDRESS_PARTS)
                .optional(&[
                    ("layer", Str),
                    ("nameDescription1", Str),
                    ("nameDescription2", Str),
                ])
                .coerced_floats(&["id", "quantity"]),
        )
        .keyed("geocodingData"),
    )
    .returns(&["geocodingResult"])
}

pub fn reverse_locations() -> Operation {
    Operation::new(
        "reverse_supply_chain_map_locations",
        "reversesupplychainmaplocations",
        "reverse supply chain map locations",
    )
    .input(
        InputTable::new(
            TableSchema::new("coordinates")
                .mandatory(&[("latitude", Float), ("longitude", Float)])
                .optional(&[
                    ("name", Str),
                    ("layer", Str),
                    ("nameDescription1", Str),
                    ("nameDescription2", Str),
                ])
                .coerced_floats(&["id", "quantity"]),
        )
        .keyed("geocodingData"),
    )
    .returns(&["geocodingData"])
}

pub fn reverse_polyline() -> Operation {
    Operation::new(
        "reverse_supply_chain_map_polyline",
        "reversesupplychainmappolyline",
        "supply chain map polyline",
    )
    .input(
        InputTable::new(
            TableSchema::new("polyline")
                .mandatory(&[("polyline", Str), ("latitude", Float), ("longitude", Float)])
                .optional(&[("id", Float), ("layer", Str)]),
        )
        .keyed("polylineData"),
    )
    .returns(&["polylineData"])
}

pub fn forward_relations() -> Operation {
    Operation::new(
        "forward_supply_chain_map_relations",
        "supplychainmaprelations",
        "supply chain map relations",
    )
    .input(
        InputTable::new(
            TableSchema::new("addresses")
                .mandatory(&[("senderCountry", Str), ("recipientCountry", Str)])
                .optional(&[
                    ("id", Float),
                    ("senderName", Str),
                    ("senderState", Str),
                    ("senderPostalCode", Str),
                    ("senderCity", Str),
                    ("senderStreet", Str),
                    ("senderLocationLayer", Str),
                    ("recipientName", Str),
                    ("recipientState", Str),
                    ("recipientPostalCode", Str),
                    ("recipientCity", Str),
                    ("recipientStreet", Str),
                    ("recipientLocationLayer", Str),
                    ("relationLayer", Str),
                    ("quantity", Str),
                ]),
        )
        .keyed("distanceCalculationData"),
    )
    .returns(&["distanceCalculationResult"])
    .parameters(json!({"showLocations": true}))
}

pub fn reverse_relations() -> Operation {
    Operation::new(
        "reverse_supply_chain_map_relations",
        "reversesupplychainmaprelations",
        "reverse supply chain map relations",
    )
    .input(
        InputTable::new(
            TableSchema::new("coordinates")
                .mandatory(&[
                    ("senderLatitude", Float),
                    ("senderLongitude", Float),
                    ("recipientLatitude", Float),
                    ("recipientLongitude", Float),
                ])
                .optional(&[
                    ("id", Float),
                    ("senderName", Str),
                    ("senderLocationLayer", Str),
                    ("recipientName", Str),
                    ("recipientLocationLayer", Str),
                    ("relationLayer", Str),
                    ("quantity", Str),
                ]),
        )
        .keyed("distanceCalculationData"),
    )
    .returns(&["distanceCalculationData"])
    .parameters(json!({"showLocations": true}))
}

pub fn forward_routes() -> Operation {
    Operation::new(
        "forward_supply_chain_map_routes",
        "supplychainmaproutes",
        "supply chain map routes",
    )
    .input(
        InputTable::new(
            TableSchema::new("addresses")
                .mandatory(&[("routeId", Str), ("name", Str), ("country", Str)])
                .optional(ADDRESS_PARTS)
                .optional(&[("layer", Str)])
                .coerced_floats(&["id", "pickupQuantity", "deliveryQuantity"]),
        )
        .keyed("geocodingData"),
    )
    .returns(&["inputDataStructure"])
    .parameters(json!({"streetLevel": true}))
}

pub fn reverse_routes() -> Operation {
    Operation::new(
        "reverse_supply_chain_map_routes",
        "reversesupplychainmaproutes",
        "reverse supply chain map routes",
    )
    .input(
        InputTable::new(
            TableSchema::new("coordinates")
                .mandatory(&[
                    ("routeId", Str),
                    ("name", Str),
                    ("latitude", Float),
                    ("longitude", Float),
                ])
                .optional(&[("layer", Str)])
                .coerced_floats(&["id", "pickupQuantity", "deliveryQuantity"]),
        )
        .keyed("routeLatLon"),
    )
    .returns(&["inputDataStructure"])
    .parameters(json!({"streetLevel": true}))
}

pub fn forward_sea_routes() -> Operation {
    Operation::new(
        "forward_supply_chain_map_sea_routes",
        "supplychainmapsearoutes",
        "supply chain map sea routes",
    )
    .input(
        InputTable::new(
            TableSchema::new("addresses")
                .mandatory(&[
                    ("fromName", Str),
                    ("fromUnLocode", Str),
                    ("toName", Str),
                    ("toUnLocode", Str),
                ])
                .optional(&[("routingOptions", Str)])
                .coerced_floats(&["id", "quantity"]),
        )
        .keyed("seaRoutesAddressesData"),
    )
    .returns(&["seaRoutes"])
    .parameters(json!({"distanceUnit": "nm"}))
}

pub fn reverse_sea_routes() -> Operation {
    Operation::new(
        "reverse_supply_chain_map_sea_routes",
        "reversesupplychainmapsearoutes",
        "reverse supply chain map sea routes",
    )
    .input(
        InputTable::new(
            TableSchema::new("coordinates")
                .mandatory(&[
                    ("fromName", Str),
                    ("fromLatitude", Float),
                    ("fromLongitude", Float),
                    ("toName", Str),
                    ("toLatitude", Float),
                    ("toLongitude", Float),
                ])
                .optional(&[("routingOptions", Str)])
                .coerced_floats(&["id", "quantity"]),
        )
        .keyed("seaRoutesCoordinatesData"),
    )
    .returns(&["seaRoutes"])
    .parameters(json!({"distanceUnit": "nm"}))
}

pub async fn forward_supply_chain_map_areas(
    client: &LogHubClient,
    areas_table: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, areas(), vec![("areas", areas_table)], options).await
}

pub async fn forward_supply_chain_map_locations(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward_locations(), vec![("addresses", addresses)], options).await
}

pub async fn reverse_supply_chain_map_locations(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse_locations(), vec![("coordinates", coordinates)], options).await
}

pub async fn reverse_supply_chain_map_polyline(
    client: &LogHubClient,
    polyline: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse_polyline(), vec![("polyline", polyline)], options).await
}

pub async fn forward_supply_chain_map_relations(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward_relations(), vec![("addresses", addresses)], options).await
}

pub async fn reverse_supply_chain_map_relations(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse_relations(), vec![("coordinates", coordinates)], options).await
}

pub async fn forward_supply_chain_map_routes(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward_routes(), vec![("addresses", addresses)], options).await
}

pub async fn reverse_supply_chain_map_routes(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse_routes(), vec![("coordinates", coordinates)], options).await
}

pub async fn forward_supply_chain_map_sea_routes(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward_sea_routes(), vec![("addresses", addresses)], options).await
}

pub async fn reverse_supply_chain_map_sea_routes(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse_sea_routes(), vec![("coordinates", coordinates)], options).await
}
