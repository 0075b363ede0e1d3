use super::{run, run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

fn addresses() -> InputTable {
    InputTable::new(
        TableSchema::new("addresses")
            .mandatory(&[("name", Str), ("country", Str)])
            .optional(&[
                ("state", Str),
                ("postalCode", Str),
                ("city", Str),
                ("street", Str),
            ]),
    )
    .keyed("geocodingData")
}

fn geocodes() -> InputTable {
    InputTable::new(TableSchema::new("geocodes").mandatory(&[
        ("name", Str),
        ("latitude", Float),
        ("longitude", Float),
    ]))
    .keyed("geocodingData")
}

fn parameters() -> Value {
    json!({
        "isochroneType": "road",
        "distanceUnit": "km",
        "profile": "driving-car",
        "duration": 40,
        "layers": 5,
        "distance": 3000,
        "layersBeeline": 5
    })
}

fn plus_parameters() -> Value {
    json!({
        "level": "3",
        "duration1": 300,
        "duration2": 300,
        "duration3": 100,
        "duration4": 100,
        "duration5": 50,
        "averageSpeed": 60,
        "distanceUnit": "km",
        "detourFactor": 1.2,
        "restrictedByCountryBoundaries": false
    })
}

pub fn forward() -> Operation {
    Operation::new("forward_isochrone", "isochrone", "isochrone")
        .input(addresses())
        .returns(&["geocodingResult"])
        .parameters(parameters())
}

pub fn reverse() -> Operation {
    Operation::new("reverse_isochrone", "reverseisochrone", "reverse isochrone")
        .input(geocodes())
        .returns(&["geocodingResult"])
        .parameters(parameters())
}

pub fn forward_plus() -> Operation {
    Operation::new("forward_isochrone_plus", "isochroneplus", "isochrone plus")
        .input(addresses())
        .returns(&["geocodingResult", "reachableAreasTable"])
        .parameters(plus_parameters())
}

pub fn reverse_plus() -> Operation {
    Operation::new("reverse_isochrone_plus", "reverseisochroneplus", "reverse isochrone plus")
        .input(geocodes())
        .returns(&["geocodingResult", "reachableAreasTable"])
        .parameters(plus_parameters())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReachableAreas {
    pub geocodes: Table,
    pub reachable_areas: Table,
}

pub async fn forward_isochrone(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward(), vec![("addresses", addresses)], options).await
}

pub async fn reverse_isochrone(
    client: &LogHubClient,
    geocodes: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse(), vec![("geocodes", geocodes)], options).await
}

async fn plus(
    client: &LogHubClient,
    operation: Operation,
    input: (&str, Table),
    options: RunOptions,
) -> Result<ReachableAreas> {
    let mut output = run(client, operation, vec![input], options).await?;
    Ok(ReachableAreas {
        geocodes: output.take("geocodingResult")?,
        reachable_areas: output.take("reachableAreasTable")?,
    })
}

pub async fn forward_isochrone_plus(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<ReachableAreas> {
    plus(client, forward_plus(), ("addresses", addresses), options).await
}

pub async fn reverse_isochrone_plus(
    client: &LogHubClient,
    geocodes: Table,
    options: RunOptions,
) -> Result<ReachableAreas> {
    plus(client, reverse_plus(), ("geocodes", geocodes), options).await
}
