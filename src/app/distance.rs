use super::{run, run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

/// Records per request when the scenario is not saved.
pub const BATCH_SIZE: usize = 5000;

fn default_parameters() -> Value {
    json!({
        "distanceUnit": "km",
        "durationUnit": "min",
        "vehicleType": "car",
        "routePreference": "recommended"
    })
}

fn address_pairs() -> InputTable {
    InputTable::new(
        TableSchema::new("addresses")
            .mandatory(&[("senderCountry", Str), ("recipientCountry", Str)])
            .optional(&[
                ("senderState", Str),
                ("senderPostalCode", Str),
                ("senderCity", Str),
                ("senderStreet", Str),
                ("recipientState", Str),
                ("recipientPostalCode", Str),
                ("recipientCity", Str),
                ("recipientStreet", Str),
            ]),
    )
}

fn coordinate_pairs() -> InputTable {
    InputTable::new(TableSchema::new("geocodes").mandatory(&[
        ("senderLocation", Str),
        ("senderLatitude", Float),
        ("senderLongitude", Float),
        ("recipientLocation", Str),
        ("recipientLatitude", Float),
        ("recipientLongitude", Float),
    ]))
}

pub fn forward() -> Operation {
    Operation::new("forward_distance_calculation", "distancecalculation", "distance calculation")
        .input(address_pairs())
        .returns_whole_response()
        .parameters(default_parameters())
        .batched(BATCH_SIZE)
}

pub fn reverse() -> Operation {
    Operation::new(
        "reverse_distance_calculation",
        "reversedistancecalculation",
        "reverse distance calculation",
    )
    .input(coordinate_pairs())
    .returns_whole_response()
    .parameters(default_parameters())
    .batched(BATCH_SIZE)
}

pub fn forward_with_extra_details() -> Operation {
    Operation::new(
        "forward_distance_calculation_with_extra_details",
        "distancecalculationwithextradetails",
        "distance calculation with extra details",
    )
    .input(address_pairs())
    .returns(&["distanceCalculationResult", "extraDetailsResult"])
    .parameters(default_parameters())
}

pub fn reverse_with_extra_details() -> Operation {
    Operation::new(
        "reverse_distance_calculation_with_extra_details",
        "reversedistancecalculationwithextradetails",
        "reverse distance calculation with extra details",
    )
    .input(coordinate_pairs())
    .returns(&["distanceCalculationResult", "extraDetailsResult"])
    .parameters(default_parameters())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistancesWithDetails {
    pub distances: Table,
    pub extra_details: Table,
}

/// Road distances between address pairs, sent in batches of [`BATCH_SIZE`].
pub async fn forward_distance_calculation(
    client: &LogHubClient,
    address_pairs: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward(), vec![("addresses", address_pairs)], options).await
}

pub async fn reverse_distance_calculation(
    client: &LogHubClient,
    geocodes: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse(), vec![("geocodes", geocodes)], options).await
}

async fn with_details(
    client: &LogHubClient,
    operation: Operation,
    input: (&str, Table),
    options: RunOptions,
) -> Result<DistancesWithDetails> {
    let mut output = run(client, operation, vec![input], options).await?;
    Ok(DistancesWithDetails {
        distances: output.take("distanceCalculationResult")?,
        extra_details: output.take("extraDetailsResult")?,
    })
}

pub async fn forward_distance_calculation_with_extra_details(
    client: &LogHubClient,
    address_pairs: Table,
    options: RunOptions,
) -> Result<DistancesWithDetails> {
    with_details(client, forward_with_extra_details(), ("addresses", address_pairs), options).await
}

pub async fn reverse_distance_calculation_with_extra_details(
    client: &LogHubClient,
    geocodes: Table,
    options: RunOptions,
) -> Result<DistancesWithDetails> {
    with_details(client, reverse_with_extra_details(), ("geocodes", geocodes), options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OperationRequest;

    #[test]
    fn test_whole_response_keyed_by_application() {
        assert_eq!(forward().response_keys(), ["distancecalculation"]);
        assert_eq!(forward().batch_size(), Some(BATCH_SIZE));
        assert_eq!(forward_with_extra_details().batch_size(), None);
    }

    #[test]
    fn test_reverse_payload_converts_coordinates() {
        let geocodes = Table::from_json(&json!([{
            "senderLocation": "Zurich",
            "senderLatitude": "47.37",
            "senderLongitude": "8.54",
            "recipientLocation": "Bern",
            "recipientLatitude": "46.94",
            "recipientLongitude": "7.44"
        }]))
        .unwrap();

        let payload = reverse()
            .build_payload(&OperationRequest::new().table("geocodes", geocodes))
            .unwrap();
        assert_eq!(payload["geocodes"][0]["senderLatitude"], json!(47.37));
        assert_eq!(payload["parameters"]["routePreference"], "recommended");
    }
}
