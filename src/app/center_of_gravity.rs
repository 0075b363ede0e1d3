use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::json;

const ADDRESS_COLUMNS: &[(&str, ColumnType)] = &[
    ("country", Str),
    ("state", Str),
    ("postalCode", Str),
    ("city", Str),
    ("street", Str),
];

pub fn forward() -> Operation {
    Operation::new("forward_center_of_gravity", "centerofgravity", "center of gravity")
        .input(InputTable::new(
            TableSchema::new("addresses")
                .mandatory(&[("id", Float), ("name", Str)])
                .mandatory(ADDRESS_COLUMNS)
                .mandatory(&[("weight", Float)]),
        ))
        .returns(&["assignedAddresses", "centers"])
        .parameters(json!({"numberOfCenters": 5, "distanceUnit": "km"}))
}

pub fn reverse() -> Operation {
    Operation::new(
        "reverse_center_of_gravity",
        "reversecenterofgravity",
        "reverse center of gravity",
    )
    .input(InputTable::new(TableSchema::new("coordinates").mandatory(&[
        ("id", Float),
        ("name", Str),
        ("latitude", Float),
        ("longitude", Float),
        ("weight", Float),
    ])))
    .returns(&["assignedGeocodes", "centers"])
    .parameters(json!({"numberOfCenters": 5, "distanceUnit": "km"}))
}

fn plus_parameters() -> serde_json::Value {
    json!({
        "numberOfCenters": 3,
        "distanceUnit": "km",
        "importanceWeight": 5,
        "importanceVolume": 2,
        "importanceRevenue": 7
    })
}

pub fn forward_plus() -> Operation {
    Operation::new(
        "forward_center_of_gravity_plus",
        "centerofgravityplus",
        "center of gravity plus",
    )
    .input(InputTable::new(
        TableSchema::new("addresses")
            .mandatory(&[
                ("country", Str),
                ("weight", Float),
                ("volume", Float),
                ("revenue", Float),
            ])
            .optional(&[("id", Float), ("name", Str)])
            .optional(&ADDRESS_COLUMNS[1..]),
    ))
    .returns(&["assignedAddresses", "centers"])
    .parameters(plus_parameters())
}

pub fn reverse_plus() -> Operation {
    Operation::new(
        "reverse_center_of_gravity_plus",
        "reversecenterofgravityplus",
        "reverse center of gravity plus",
    )
    .input(InputTable::new(
        TableSchema::new("coordinates")
            .mandatory(&[
                ("latitude", Float),
                ("longitude", Float),
                ("weight", Float),
                ("volume", Float),
                ("revenue", Float),
            ])
            .optional(&[("id", Float), ("name", Str)]),
    ))
    .returns(&["assignedGeocodes", "centers"])
    .parameters(plus_parameters())
}

pub fn forward_fixed() -> Operation {
    Operation::new(
        "forward_fixed_center_of_gravity",
        "fixedcenterofgravity",
        "fixed center of gravity",
    )
    .input(InputTable::new(
        TableSchema::new("customers")
            .mandatory(&[("id", Float), ("name", Str)])
            .mandatory(ADDRESS_COLUMNS)
            .mandatory(&[("weight", Float)]),
    ))
    .input(
        InputTable::new(
            TableSchema::new("fixedCenters")
                .mandatory(&[("id", Float), ("name", Str)])
                .mandatory(ADDRESS_COLUMNS),
        )
        .may_be_empty(),
    )
    .returns(&["assignedGeocodes", "centers"])
    .parameters(json!({"numberOfCenters": 5, "distanceUnit": "km"}))
}

pub fn reverse_fixed() -> Operation {
    Operation::new(
        "reverse_fixed_center_of_gravity",
        "reversefixedcenterofgravity",
        "reverse fixed center of gravity",
    )
    .input(InputTable::new(TableSchema::new("customers").mandatory(&[
        ("id", Float),
        ("name", Str),
        ("latitude", Float),
        ("longitude", Float),
        ("weight", Float),
    ])))
    .input(
        InputTable::new(TableSchema::new("fixedCenters").mandatory(&[
            ("id", Float),
            ("name", Str),
            ("latitude", Float),
            ("longitude", Float),
        ]))
        .may_be_empty(),
    )
    .returns(&["assignedGeocodes", "centers"])
    .parameters(json!({"numberOfCenters": 5, "distanceUnit": "km"}))
}

fn advanced_parameters() -> serde_json::Value {
    json!({
        "distanceUnit": "km",
        "minmaximumCenters": 1,
        "maxmaximumCenters": 50,
        "inboundOutboundFactor": 8
    })
}

fn product_groups() -> InputTable {
    InputTable::new(TableSchema::new("productGroups").mandatory(&[
        ("productGroupName", Str),
        ("serviceLevel", Float),
        ("serviceLevelDistance", Float),
    ]))
}

pub fn forward_advanced() -> Operation {
    Operation::new(
        "forward_advanced_center_of_gravity",
        "advancedcenterofgravity",
        "advanced center of gravity",
    )
    .input(InputTable::new(
        TableSchema::new("customers")
            .mandatory(&[("country", Str), ("weight", Float), ("productGroup", Str)])
            .optional(&[("name", Str), ("id", Float)])
            .optional(&ADDRESS_COLUMNS[1..])
            .optional(&[("assignedCenter", Str), ("assignedSource", Str)]),
    ))
    .input(InputTable::new(
        TableSchema::new("sources")
            .optional(&[("id", Float), ("name", Str)])
            .optional(ADDRESS_COLUMNS),
    ))
    .input(
        InputTable::new(
            TableSchema::new("fixedCenters")
                .optional(&[("id", Float), ("name", Str)])
                .optional(ADDRESS_COLUMNS),
        )
        .may_be_empty(),
    )
    .input(product_groups())
    .returns(&["assignedCenters", "inbound", "outbound"])
    .parameters(advanced_parameters())
}

pub fn reverse_advanced() -> Operation {
    Operation::new(
        "reverse_advanced_center_of_gravity",
        "reverseadvancedcenterofgravity",
        "reverse advanced center of gravity",
    )
    .input(InputTable::new(
        TableSchema::new("customers")
            .mandatory(&[
                ("latitude", Float),
                ("longitude", Float),
                ("weight", Float),
                ("productGroup", Str),
            ])
            .optional(&[
                ("name", Str),
                ("id", Float),
                ("assignedCenter", Str),
                ("assignedSource", Str),
            ]),
    ))
    .input(InputTable::new(TableSchema::new("sources").optional(&[
        ("name", Str),
        ("id", Float),
        ("latitude", Float),
        ("longitude", Float),
        ("availableProductGroups", Str),
    ])))
    .input(
        InputTable::new(TableSchema::new("fixedCenters").optional(&[
            ("name", Str),
            ("id", Float),
            ("latitude", Float),
            ("longitude", Float),
        ]))
        .may_be_empty(),
    )
    .input(product_groups())
    .returns(&["assignedCenters", "inbound", "outbound"])
    .parameters(advanced_parameters())
}

/// Customers with their assigned center, plus the centers themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterOfGravityResult {
    pub assigned: Table,
    pub centers: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedCenterOfGravityResult {
    pub assigned_centers: Table,
    pub inbound: Table,
    pub outbound: Table,
}

async fn centers(
    client: &LogHubClient,
    operation: Operation,
    assigned_key: &str,
    tables: Vec<(&str, Table)>,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    let mut output = run(client, operation, tables, options).await?;
    Ok(CenterOfGravityResult {
        assigned: output.take(assigned_key)?,
        centers: output.take("centers")?,
    })
}

pub async fn forward_center_of_gravity(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    centers(client, forward(), "assignedAddresses", vec![("addresses", addresses)], options).await
}

pub async fn reverse_center_of_gravity(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    centers(client, reverse(), "assignedGeocodes", vec![("coordinates", coordinates)], options).await
}

/// Weighs weight, volume and revenue by the `importance*` parameters.
pub async fn forward_center_of_gravity_plus(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    centers(client, forward_plus(), "assignedAddresses", vec![("addresses", addresses)], options)
        .await
}

pub async fn reverse_center_of_gravity_plus(
    client: &LogHubClient,
    coordinates: Table,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    centers(
        client,
        reverse_plus(),
        "assignedGeocodes",
        vec![("coordinates", coordinates)],
        options,
    )
    .await
}

/// `fixed_centers` may be an empty table.
pub async fn forward_fixed_center_of_gravity(
    client: &LogHubClient,
    customers: Table,
    fixed_centers: Table,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    centers(
        client,
        forward_fixed(),
        "assignedGeocodes",
        vec![("customers", customers), ("fixedCenters", fixed_centers)],
        options,
    )
    .await
}

pub async fn reverse_fixed_center_of_gravity(
    client: &LogHubClient,
    customers: Table,
    fixed_centers: Table,
    options: RunOptions,
) -> Result<CenterOfGravityResult> {
    centers(
        client,
        reverse_fixed(),
        "assignedGeocodes",
        vec![("customers", customers), ("fixedCenters", fixed_centers)],
        options,
    )
    .await
}

async fn advanced(
    client: &LogHubClient,
    operation: Operation,
    tables: Vec<(&str, Table)>,
    options: RunOptions,
) -> Result<AdvancedCenterOfGravityResult> {
    let mut output = run(client, operation, tables, options).await?;
    Ok(AdvancedCenterOfGravityResult {
        assigned_centers: output.take("assignedCenters")?,
        inbound: output.take("inbound")?,
        outbound: output.take("outbound")?,
    })
}

pub async fn forward_advanced_center_of_gravity(
    client: &LogHubClient,
    customers: Table,
    sources: Table,
    fixed_centers: Table,
    product_groups: Table,
    options: RunOptions,
) -> Result<AdvancedCenterOfGravityResult> {
    advanced(
        client,
        forward_advanced(),
        vec![
            ("customers", customers),
            ("sources", sources),
            ("fixedCenters", fixed_centers),
            ("productGroups", product_groups),
        ],
        options,
    )
    .await
}

pub async fn reverse_advanced_center_of_gravity(
    client: &LogHubClient,
    customers: Table,
    sources: Table,
    fixed_centers: Table,
    product_groups: Table,
    options: RunOptions,
) -> Result<AdvancedCenterOfGravityResult> {
    advanced(
        client,
        reverse_advanced(),
        vec![
            ("customers", customers),
            ("sources", sources),
            ("fixedCenters", fixed_centers),
            ("productGroups", product_groups),
        ],
        options,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OperationRequest;
    use crate::utils::error::LogHubError;

    #[test]
    fn test_forward_requires_full_address() {
        let addresses = Table::from_json(&json!([
            {"id": 1, "name": "A", "country": "CH", "city": "Bern", "weight": 10}
        ]))
        .unwrap();

        let err = forward()
            .build_payload(&OperationRequest::new().table("addresses", addresses))
            .unwrap_err();
        assert!(matches!(err, LogHubError::MissingColumn { ref column, .. } if column == "state"));
    }

    #[test]
    fn test_plus_address_parts_are_optional() {
        let addresses = Table::from_json(&json!([
            {"country": "CH", "weight": "10", "volume": 2, "revenue": "100.5"}
        ]))
        .unwrap();

        let payload = forward_plus()
            .build_payload(&OperationRequest::new().table("addresses", addresses))
            .unwrap();
        assert_eq!(payload["addresses"][0]["revenue"], json!(100.5));
        assert_eq!(payload["parameters"]["importanceRevenue"], json!(7));
    }

    #[test]
    fn test_fixed_centers_may_be_empty() {
        let customers = Table::from_json(&json!([{
            "id": 1, "name": "A", "country": "CH", "state": "", "postalCode": "3000",
            "city": "Bern", "street": "", "weight": 5
        }]))
        .unwrap();

        let payload = forward_fixed()
            .build_payload(
                &OperationRequest::new()
                    .table("customers", customers)
                    .table("fixedCenters", Table::default()),
            )
            .unwrap();
        assert_eq!(payload["fixedCenters"], json!([]));
        assert_eq!(payload["customers"][0]["postalCode"], json!("3000"));
    }
}
