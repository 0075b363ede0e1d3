use super::{run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;

pub fn forward() -> Operation {
    Operation::new("forward_geocoding", "geocoding", "forward geocoding")
        .input(InputTable::new(
            TableSchema::new("addresses")
                .mandatory(&[("country", Str)])
                .optional(&[
                    ("state", Str),
                    ("postalCode", Str),
                    ("city", Str),
                    ("street", Str),
                    ("searchString", Str),
                ]),
        ))
        .returns(&["geocodes"])
}

pub fn reverse() -> Operation {
    Operation::new("reverse_geocoding", "reversegeocoding", "reverse geocoding")
        .input(InputTable::new(
            TableSchema::new("geocodes").mandatory(&[("latitude", Float), ("longitude", Float)]),
        ))
        .returns(&["addresses"])
}

/// Resolves addresses to coordinates.
pub async fn forward_geocoding(
    client: &LogHubClient,
    addresses: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, forward(), vec![("addresses", addresses)], options).await
}

/// Resolves coordinates to addresses.
pub async fn reverse_geocoding(
    client: &LogHubClient,
    geocodes: Table,
    options: RunOptions,
) -> Result<Table> {
    run_single(client, reverse(), vec![("geocodes", geocodes)], options).await
}
