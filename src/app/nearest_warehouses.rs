use super::{run, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;
use serde_json::{json, Value};

const ADDRESS: &[(&str, ColumnType)] = &[
    ("name", Str),
    ("country", Str),
    ("state", Str),
    ("postalCode", Str),
    ("city", Str),
    ("street", Str),
];

const COORDINATES: &[(&str, ColumnType)] = &[("name", Str), ("latitude", Float), ("longitude", Float)];

fn parameters() -> Value {
    json!({
        "nearestWarehouses": 3,
        "distanceUnit": "km",
        "maxDistance": 2000,
        "streetLevel": false
    })
}

fn nearest(name: &str, application: &str, label: &str, columns: &[(&str, ColumnType)]) -> Operation {
    Operation::new(name, application, label)
        .input(InputTable::new(TableSchema::new("warehouses").mandatory(columns)))
        .input(InputTable::new(TableSchema::new("customers").mandatory(columns)))
        .returns(&["nearestWarehouses", "unassignedCustomers"])
        .parameters(parameters())
}

pub fn forward() -> Operation {
    nearest(
        "forward_nearest_warehouses",
        "nearestwarehouses",
        "nearest warehouses",
        ADDRESS,
    )
}

pub fn reverse() -> Operation {
    nearest(
        "reverse_nearest_warehouses",
        "reversenearestwarehouses",
        "reverse nearest warehouses",
        COORDINATES,
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearestWarehouses {
    pub nearest_warehouses: Table,
    pub unassigned_customers: Table,
}

async fn assign(
    client: &LogHubClient,
    operation: Operation,
    warehouses: Table,
    customers: Table,
    options: RunOptions,
) -> Result<NearestWarehouses> {
    let mut output = run(
        client,
        operation,
        vec![("warehouses", warehouses), ("customers", customers)],
        options,
    )
    .await?;
    Ok(NearestWarehouses {
        nearest_warehouses: output.take("nearestWarehouses")?,
        unassigned_customers: output.take("unassignedCustomers")?,
    })
}

/// Finds up to `nearestWarehouses` warehouses within `maxDistance` of each customer.
pub async fn forward_nearest_warehouses(
    client: &LogHubClient,
    warehouses: Table,
    customers: Table,
    options: RunOptions,
) -> Result<NearestWarehouses> {
    assign(client, forward(), warehouses, customers, options).await
}

pub async fn reverse_nearest_warehouses(
    client: &LogHubClient,
    warehouses: Table,
    customers: Table,
    options: RunOptions,
) -> Result<NearestWarehouses> {
    assign(client, reverse(), warehouses, customers, options).await
}
