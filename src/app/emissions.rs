use super::{run, run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Date, Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

fn rail_parameters() -> Value {
    json!({"fuelType": "diesel", "weightUnit": "kilograms"})
}

fn road_parameters() -> Value {
    json!({
        "vehicleType": "truck",
        "fuelType": "diesel",
        "weightUnit": "kilograms",
        "emissionStandard": "EURO_6"
    })
}

pub fn air() -> Operation {
    Operation::new(
        "forward_freight_shipment_emissions_air",
        "co2emissionsair",
        "freight shipment emissions air",
    )
    .input(
        InputTable::new(TableSchema::new("iataCodes").mandatory(&[
            ("shipmentId", Str),
            ("shipmentDate", Date),
            ("fromIataCode", Str),
            ("toIataCode", Str),
            ("flightNumber", Str),
            ("isRefrigirated", Str),
            ("weight", Float),
        ]))
        .keyed("freightShipmentEmissionsByAir"),
    )
    .returns(&["freightShipmentEmissionOutputAir"])
    .parameters(json!({"weightUnit": "kilograms"}))
}

pub fn forward_rail() -> Operation {
    Operation::new(
        "forward_freight_shipment_emissions_rail",
        "co2emissionsrail",
        "freight shipment emissions rail",
    )
    .input(
        InputTable::new(TableSchema::new("addresses").mandatory(&[
            ("shipmentId", Str),
            ("shipmentDate", Date),
            ("fromUICCode", Str),
            ("toUICCode", Str),
            ("weight", Float),
        ]))
        .keyed("freightShipmentEmissionsByTrain"),
    )
    .returns(&["freightShipmentEmissionOutputTrain"])
    .parameters(rail_parameters())
}

pub fn reverse_rail() -> Operation {
    Operation::new(
        "reverse_freight_shipment_emissions_rail",
        "reverseco2emissionsrail",
        "reverse freight shipment emissions rail",
    )
    .input(
        InputTable::new(TableSchema::new("coordinates").mandatory(&[
            ("shipmentId", Str),
            ("shipmentDate", Date),
            ("fromLatitude", Float),
            ("fromLongitude", Float),
            ("toLatitude", Float),
            ("toLongitude", Float),
            ("weight", Float),
        ]))
        .keyed("freightShipmentEmissionsByTrainReverse"),
    )
    .returns(&["freightShipmentEmissionOutputTrain"])
    .parameters(rail_parameters())
}

pub fn forward_road() -> Operation {
    Operation::new(
        "forward_freight_shipment_emissions_road",
        "co2emissionsroad",
        "freight shipment emissions road",
    )
    .input(
        InputTable::new(TableSchema::new("addresses").mandatory(&[
            ("shipmentId", Str),
            ("shipmentDate", Date),
            ("fromCountry", Str),
            ("fromState", Str),
            ("fromPostalCode", Str),
            ("fromCity", Str),
            ("fromStreet", Str),
            ("toCountry", Str),
            ("toState", Str),
            ("toPostalCode", Str),
            ("toCity", Str),
            ("toStreet", Str),
            ("isRefrigirated", Str),
            ("weight", Float),
        ]))
        .keyed("freightShipmentEmissionsByRoad"),
    )
    .returns(&[
        "freightShipmentEmissionOutputStandardRoad",
        "notEvaluatedShipmentsStandardRoad",
    ])
    .parameters(road_parameters())
}

pub fn reverse_road() -> Operation {
    Operation::new(
        "reverse_freight_shipment_emissions_road",
        "reverseco2emissionsroad",
        "reverse freight shipment emissions road",
    )
    .input(
        InputTable::new(TableSchema::new("coordinates").mandatory(&[
            ("shipmentId", Str),
            ("shipmentDate", Date),
            ("fromLatitude", Float),
            ("fromLongitude", Float),
            ("toLatitude", Float),
            ("toLongitude", Float),
            ("isRefrigirated", Str),
            ("weight", Float),
        ]))
        .keyed("freightShipmentEmissionsByRoad"),
    )
    .returns(&[
        "freightShipmentEmissionOutputReverseRoad",
        "notEvaluatedShipmentsReverseRoad",
    ])
    .parameters(road_parameters())
}

pub fn sea() -> Operation {
    Operation::new(
        "forward_freight_shipment_emissions_sea",
        "co2emissionssea",
        "freight shipment emissions sea",
    )
    .input(
        InputTable::new(
            TableSchema::new("unLocodes")
                .mandatory(&[
                    ("shipmentId", Str),
                    ("shipmentDate", Date),
                    ("fromUnLocode", Str),
                    ("toUnLocode", Str),
                    ("weight", Float),
                ])
                .optional(&[("vesselId", Str), ("isRefrigirated", Str)]),
        )
        .keyed("freightShipmentEmissionsBySea"),
    )
    .returns(&["freightShipmentEmissionOutputSea"])
    .parameters(json!({"shipType": "shipContainerShipAvg", "weightUnit": "teu"}))
}

/// Emissions per shipment, plus the shipments the service could not evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEmissions {
    pub emissions: Table,
    pub not_evaluated: Table,
}

pub async fn forward_freight_shipment_emissions_air(
    client: &LogHubClient,
    iata_codes: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, air(), vec![("iataCodes", iata_codes)], options).await
}

pub async fn forward_freight_shipment_emissions_rail(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward_rail(), vec![("addresses", addresses)], options).await
}

pub async fn reverse_freight_shipment_emissions_rail(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse_rail(), vec![("coordinates", coordinates)], options).await
}

async fn road(
    client: &LogHubClient,
    operation: Operation,
    input: (&str, Table),
    options: RunOptions,
) -> Result<RoadEmissions> {
    let keys: Vec<String> = operation
        .response_keys()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut output = run(client, operation, vec![input], options).await?;
    Ok(RoadEmissions {
        emissions: output.take(&keys[0])?,
        not_evaluated: output.take(&keys[1])?,
    })
}

pub async fn forward_freight_shipment_emissions_road(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<RoadEmissions> {
    road(client, forward_road(), ("addresses", addresses), options).await
}

pub async fn reverse_freight_shipment_emissions_road(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<RoadEmissions> {
    road(client, reverse_road(), ("coordinates", coordinates), options).await
}

pub async fn forward_freight_shipment_emissions_sea(
    client: &LogHubClient,
    un_locodes: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, sea(), vec![("unLocodes", un_locodes)], options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OperationRequest;

    #[test]
    fn test_shipment_date_sent_as_day() {
        let shipments = Table::from_json(&json!([{
            "shipmentId": 7,
            "shipmentDate": "2024-03-05T14:30:00Z",
            "fromUICCode": "8503000",
            "toUICCode": "8507000",
            "weight": "800"
        }]))
        .unwrap();

        let payload = forward_rail()
            .build_payload(&OperationRequest::new().table("addresses", shipments))
            .unwrap();
        let record = &payload["freightShipmentEmissionsByTrain"][0];
        assert_eq!(record["shipmentDate"], "2024-03-05");
        assert_eq!(record["shipmentId"], "7");
        assert_eq!(record["weight"], json!(800.0));
        assert_eq!(payload["parameters"]["fuelType"], "diesel");
    }

    #[test]
    fn test_invalid_date_rejected() {
        let shipments = Table::from_json(&json!([{
            "shipmentId": "1",
            "shipmentDate": "next tuesday",
            "fromUnLocode": "CHBSL",
            "toUnLocode": "NLRTM",
            "weight": 1
        }]))
        .unwrap();

        let err = sea()
            .build_payload(&OperationRequest::new().table("unLocodes", shipments))
            .unwrap_err();
        assert!(err.to_string().contains("shipmentDate"));
    }
}
