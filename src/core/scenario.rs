use crate::domain::model::{SaveScenario, WorkspaceEntity};
use serde_json::{Map, Value};

const MAP_APPLICATION_MARKER: &str = "supplychainmap";

/// Builds the `saveScenarioParameters` object for an application.
///
/// Map applications get `mergeWithExistingScenario` and save by default.
pub fn save_scenario_parameters(save_scenario: Option<&SaveScenario>, application: &str) -> Value {
    let map_application = application.contains(MAP_APPLICATION_MARKER);
    let given = save_scenario.cloned().unwrap_or_default();

    let mut parameters = Map::new();
    parameters.insert(
        "saveScenario".to_string(),
        Value::Bool(given.save_scenario.unwrap_or(map_application)),
    );
    parameters.insert(
        "overwriteScenario".to_string(),
        Value::Bool(given.overwrite_scenario.unwrap_or(false)),
    );
    if map_application {
        parameters.insert(
            "mergeWithExistingScenario".to_string(),
            Value::Bool(given.merge_with_existing_scenario.unwrap_or(false)),
        );
    }
    parameters.insert(
        "workspaceId".to_string(),
        Value::String(given.workspace_id.unwrap_or_default()),
    );
    parameters.insert(
        "scenarioName".to_string(),
        Value::String(given.scenario_name.unwrap_or_default()),
    );
    Value::Object(parameters)
}

/// Platform link of the map saved under `scenario_name`, if there is one.
pub fn map_link(entities: &[WorkspaceEntity], scenario_name: &str, api_server: &str) -> Option<String> {
    let Some(entity) = entities
        .iter()
        .find(|e| e.entity_type == "MAP" && e.name == scenario_name)
    else {
        tracing::info!("There is not a map in the folder {}", scenario_name);
        return None;
    };

    Some(format!(
        "{}/sca/platform/workspaces/{}/maps/{}",
        api_server.trim_end_matches('/'),
        entity.workspace_id,
        entity.id
    ))
}
