//! Catalog of the Log-hub applications.
//!
//! Each family module exposes the operation descriptors (`forward()`, `reverse()`, ...)
//! and a typed async function per operation built on top of them.

pub mod center_of_gravity;
pub mod distance;
pub mod emissions;
pub mod forecasting;
pub mod freight;
pub mod geocoding;
pub mod isochrone;
pub mod location_planning;
pub mod milkrun;
pub mod nearest_warehouses;
pub mod network_design;
pub mod shipment_analyzer;
pub mod supply_chain_map;
pub mod transport;

use crate::core::client::LogHubClient;
use crate::core::operation::Operation;
use crate::domain::model::{OperationOutput, OperationRequest, SaveScenario, Table};
use crate::utils::error::{LogHubError, Result};
use serde_json::Value;

/// Parameters and scenario settings of a typed call.
///
/// Unset parameters fall back to the defaults of the operation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub parameters: Option<Value>,
    pub save_scenario: Option<SaveScenario>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn save_scenario(mut self, save_scenario: SaveScenario) -> Self {
        self.save_scenario = Some(save_scenario);
        self
    }
}

pub(crate) async fn run(
    client: &LogHubClient,
    operation: Operation,
    tables: Vec<(&str, Table)>,
    options: RunOptions,
) -> Result<OperationOutput> {
    let mut request = OperationRequest::new();
    request.parameters = options.parameters;
    request.save_scenario = options.save_scenario;
    for (name, table) in tables {
        request = request.table(name, table);
    }
    operation.execute(client, &request).await
}

/// Runs an operation that answers with one table.
pub(crate) async fn run_single(
    client: &LogHubClient,
    operation: Operation,
    tables: Vec<(&str, Table)>,
    options: RunOptions,
) -> Result<Table> {
    let key = operation.response_keys()[0].to_string();
    let mut output = run(client, operation, tables, options).await?;
    output.take(&key)
}

/// Every operation, forward variants first.
pub fn catalog() -> Vec<Operation> {
    vec![
        geocoding::forward(),
        geocoding::reverse(),
        distance::forward(),
        distance::reverse(),
        distance::forward_with_extra_details(),
        distance::reverse_with_extra_details(),
        center_of_gravity::forward(),
        center_of_gravity::reverse(),
        center_of_gravity::forward_plus(),
        center_of_gravity::reverse_plus(),
        center_of_gravity::forward_fixed(),
        center_of_gravity::reverse_fixed(),
        center_of_gravity::forward_advanced(),
        center_of_gravity::reverse_advanced(),
        forecasting::demand_forecasting_operation(),
        freight::forward(),
        freight::reverse(),
        emissions::air(),
        emissions::forward_rail(),
        emissions::reverse_rail(),
        emissions::forward_road(),
        emissions::reverse_road(),
        emissions::sea(),
        isochrone::forward(),
        isochrone::reverse(),
        isochrone::forward_plus(),
        isochrone::reverse_plus(),
        location_planning::forward(),
        location_planning::reverse(),
        milkrun::forward(),
        milkrun::reverse(),
        milkrun::forward_plus(),
        milkrun::reverse_plus(),
        nearest_warehouses::forward(),
        nearest_warehouses::reverse(),
        network_design::forward(),
        network_design::reverse(),
        shipment_analyzer::forward(),
        shipment_analyzer::reverse(),
        supply_chain_map::areas(),
        supply_chain_map::forward_locations(),
        supply_chain_map::reverse_locations(),
        supply_chain_map::reverse_polyline(),
        supply_chain_map::forward_relations(),
        supply_chain_map::reverse_relations(),
        supply_chain_map::forward_routes(),
        supply_chain_map::reverse_routes(),
        supply_chain_map::forward_sea_routes(),
        supply_chain_map::reverse_sea_routes(),
        transport::forward(),
        transport::reverse(),
        transport::forward_plus(),
        transport::reverse_plus(),
    ]
}

pub fn find(name: &str) -> Result<Operation> {
    catalog()
        .into_iter()
        .find(|operation| operation.name() == name)
        .ok_or_else(|| {
            tracing::error!("Unknown operation: {}", name);
            LogHubError::UnknownOperation {
                name: name.to_string(),
            }
        })
}
