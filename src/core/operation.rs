use crate::core::client::LogHubClient;
use crate::core::scenario::save_scenario_parameters;
use crate::core::schema::TableSchema;
use crate::domain::model::{LongRunHandle, OperationOutput, OperationRequest, SaveScenario, Table, WorkspaceLinks};
use crate::utils::error::{LogHubError, Result};
use serde_json::{Map, Value};

/// Validation hook run on the parameter object before it is sent.
pub type ParameterCheck = fn(&Value) -> Result<()>;

/// One input table of an operation.
#[derive(Debug, Clone)]
pub struct InputTable {
    /// Name the caller uses in [`OperationRequest::table`].
    pub name: String,
    /// Key of the table in the request body.
    pub request_key: String,
    pub schema: TableSchema,
    pub may_be_empty: bool,
}

impl InputTable {
    pub fn new(schema: TableSchema) -> Self {
        let name = schema.table_name().to_string();
        Self {
            request_key: name.clone(),
            name,
            schema,
            may_be_empty: false,
        }
    }

    pub fn keyed(mut self, request_key: impl Into<String>) -> Self {
        self.request_key = request_key.into();
        self
    }

    /// An empty or absent table is sent as `[]` without checking its columns.
    pub fn may_be_empty(mut self) -> Self {
        self.may_be_empty = true;
        self
    }

    fn records(&self, table: &Table) -> Result<Vec<Value>> {
        if self.may_be_empty && table.is_empty() {
            return Ok(Vec::new());
        }
        self.schema.apply(table)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ResponseShape {
    Keys(Vec<String>),
    Whole,
}

#[derive(Debug, Clone, PartialEq)]
enum ParameterHandling {
    None,
    Under { key: String, default: Value },
}

/// Descriptor of one application endpoint.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    application: String,
    label: String,
    inputs: Vec<InputTable>,
    response: ResponseShape,
    parameters: ParameterHandling,
    save_scenario: bool,
    long_run: bool,
    batch_size: Option<usize>,
    check: Option<ParameterCheck>,
}

impl Operation {
    pub fn new(name: &str, application: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            application: application.to_string(),
            label: label.to_string(),
            inputs: Vec::new(),
            response: ResponseShape::Keys(Vec::new()),
            parameters: ParameterHandling::None,
            save_scenario: true,
            long_run: false,
            batch_size: None,
            check: None,
        }
    }

    pub fn input(mut self, input: InputTable) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn returns(mut self, keys: &[&str]) -> Self {
        self.response = ResponseShape::Keys(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// The response body itself is the single result table.
    pub fn returns_whole_response(mut self) -> Self {
        self.response = ResponseShape::Whole;
        self
    }

    pub fn parameters(self, default: Value) -> Self {
        self.parameters_under("parameters", default)
    }

    pub fn parameters_under(mut self, key: &str, default: Value) -> Self {
        self.parameters = ParameterHandling::Under {
            key: key.to_string(),
            default,
        };
        self
    }

    pub fn without_save_scenario(mut self) -> Self {
        self.save_scenario = false;
        self
    }

    pub fn long_run(mut self) -> Self {
        self.long_run = true;
        self
    }

    pub fn batched(mut self, size: usize) -> Self {
        self.batch_size = Some(size.max(1));
        self
    }

    pub fn check_parameters(mut self, check: ParameterCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inputs(&self) -> &[InputTable] {
        &self.inputs
    }

    pub fn is_long_run(&self) -> bool {
        self.long_run
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    pub fn saves_scenario(&self) -> bool {
        self.save_scenario
    }

    /// Parameters used when the caller passes none.
    pub fn default_parameters(&self) -> Option<&Value> {
        match &self.parameters {
            ParameterHandling::Under { default, .. } => Some(default),
            ParameterHandling::None => None,
        }
    }

    /// Scenario settings to start from when saving a run of this operation.
    pub fn sample_save_scenario(&self) -> Option<SaveScenario> {
        self.save_scenario
            .then(|| SaveScenario::template(self.application.contains("supplychainmap")))
    }

    pub fn response_keys(&self) -> Vec<&str> {
        match &self.response {
            ResponseShape::Keys(keys) => keys.iter().map(String::as_str).collect(),
            ResponseShape::Whole => vec![self.application.as_str()],
        }
    }

    fn input_table<'a>(&self, request: &'a OperationRequest, input: &InputTable) -> Result<&'a Table> {
        request.tables.get(&input.name).ok_or_else(|| {
            tracing::error!("Missing input table '{}' for {}", input.name, self.label);
            LogHubError::MissingInput {
                operation: self.name.clone(),
                input: input.name.clone(),
            }
        })
    }

    /// Validates the inputs and assembles the request body.
    pub fn build_payload(&self, request: &OperationRequest) -> Result<Value> {
        let mut payload = Map::new();

        for input in &self.inputs {
            let records = match request.tables.get(&input.name) {
                None if input.may_be_empty => Vec::new(),
                _ => input.records(self.input_table(request, input)?)?,
            };
            payload.insert(input.request_key.clone(), Value::Array(records));
        }

        if let ParameterHandling::Under { key, default } = &self.parameters {
            let parameters = request.parameters.clone().unwrap_or_else(|| default.clone());
            if let Some(check) = self.check {
                check(&parameters)?;
            }
            payload.insert(key.clone(), parameters);
        }

        if self.save_scenario {
            payload.insert(
                "saveScenarioParameters".to_string(),
                save_scenario_parameters(request.save_scenario.as_ref(), &self.application),
            );
        }

        Ok(Value::Object(payload))
    }

    /// Runs the operation against the service and unpacks the result tables.
    pub async fn execute(
        &self,
        client: &LogHubClient,
        request: &OperationRequest,
    ) -> Result<OperationOutput> {
        tracing::info!("Running {}", self.label);
        let payload = self.build_payload(request)?;

        let mut output = match self.batches(&payload, request) {
            Some(batches) => {
                let mut output = OperationOutput::default();
                let total = batches.len();
                for (index, batch) in batches.into_iter().enumerate() {
                    tracing::info!("Sending batch {}/{} to {}", index + 1, total, self.label);
                    let part = self.call(client, &batch).await?;
                    merge_output(&mut output, part);
                }
                output
            }
            None => self.call(client, &payload).await?,
        };

        if request.fetch_links && self.save_scenario {
            output.links = self.fetch_links(client, request).await?;
        }

        Ok(output)
    }

    async fn call(&self, client: &LogHubClient, payload: &Value) -> Result<OperationOutput> {
        let mut response = client
            .post_application(&self.application, &self.label, payload)
            .await?;

        if self.long_run {
            let handle: LongRunHandle = match response.get("result") {
                Some(result) => serde_json::from_value(result.clone())?,
                None => return Err(self.missing_key("result")),
            };
            tracing::info!("{} calculation started", self.label);
            response = client.poll_long_run(&handle, &self.label).await?;
        }

        self.unpack(response)
    }

    fn unpack(&self, mut response: Value) -> Result<OperationOutput> {
        let mut output = OperationOutput::default();
        match &self.response {
            ResponseShape::Whole => {
                output
                    .tables
                    .push((self.application.clone(), Table::from_json(&response)?));
            }
            ResponseShape::Keys(keys) => {
                for key in keys {
                    let value = response
                        .get_mut(key)
                        .map(Value::take)
                        .ok_or_else(|| self.missing_key(key))?;
                    output.tables.push((key.clone(), Table::from_json(&value)?));
                }
            }
        }
        Ok(output)
    }

    /// Splits a single-input payload into chunks when the operation is batched.
    fn batches(&self, payload: &Value, request: &OperationRequest) -> Option<Vec<Value>> {
        let size = self.batch_size?;
        if request.is_saving_scenario() || self.inputs.len() != 1 {
            return None;
        }
        let key = &self.inputs[0].request_key;
        let records = payload.get(key)?.as_array()?;
        if records.len() <= size {
            return None;
        }

        Some(
            records
                .chunks(size)
                .map(|chunk| {
                    let mut batch = payload.clone();
                    batch[key.as_str()] = Value::Array(chunk.to_vec());
                    batch
                })
                .collect(),
        )
    }

    async fn fetch_links(
        &self,
        client: &LogHubClient,
        request: &OperationRequest,
    ) -> Result<Option<WorkspaceLinks>> {
        let save_scenario = request.save_scenario.clone().unwrap_or_default();
        let saved = save_scenario
            .save_scenario
            .unwrap_or(self.application.contains("supplychainmap"));

        match save_scenario.workspace_id.as_deref() {
            Some(workspace_id) if saved && !workspace_id.is_empty() => {
                let links = client
                    .workspace_links(workspace_id, save_scenario.scenario_name.as_deref())
                    .await?;
                Ok(Some(links))
            }
            _ => {
                tracing::info!(
                    "Please, save the scenario in order to get the links to the results on the platform."
                );
                Ok(None)
            }
        }
    }

    fn missing_key(&self, key: &str) -> LogHubError {
        tracing::error!("Response of {} API has no '{}' field", self.label, key);
        LogHubError::MissingResponseKey {
            application: self.application.clone(),
            key: key.to_string(),
        }
    }
}

fn merge_output(output: &mut OperationOutput, part: OperationOutput) {
    for (key, table) in part.tables {
        match output.tables.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(table),
            None => output.tables.push((key, table)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ColumnType::*;
    use serde_json::json;

    fn geocoding() -> Operation {
        Operation::new("forward_geocoding", "geocoding", "forward geocoding")
            .input(InputTable::new(
                TableSchema::new("addresses")
                    .mandatory(&[("country", Str)])
                    .optional(&[("city", Str)]),
            ))
            .returns(&["geocodes"])
    }

    fn table(value: Value) -> Table {
        Table::from_json(&value).unwrap()
    }

    #[test]
    fn test_payload_contains_tables_and_scenario() {
        let request = OperationRequest::new().table("addresses", table(json!([{"country": "CH", "city": "Bern"}])));

        let payload = geocoding().build_payload(&request).unwrap();
        assert_eq!(
            payload,
            json!({
                "addresses": [{"country": "CH", "city": "Bern"}],
                "saveScenarioParameters": {
                    "saveScenario": false,
                    "overwriteScenario": false,
                    "workspaceId": "",
                    "scenarioName": ""
                }
            })
        );
    }

    #[test]
    fn test_missing_input_table() {
        let err = geocoding().build_payload(&OperationRequest::new()).unwrap_err();
        assert!(matches!(err, LogHubError::MissingInput { ref input, .. } if input == "addresses"));
    }

    #[test]
    fn test_default_parameters_used_when_none_given() {
        let operation = geocoding().parameters(json!({"distanceUnit": "km"}));
        let request = OperationRequest::new().table("addresses", table(json!([{"country": "CH"}])));

        let payload = operation.build_payload(&request).unwrap();
        assert_eq!(payload["parameters"], json!({"distanceUnit": "km"}));

        let payload = operation
            .build_payload(&request.clone().parameters(json!({"distanceUnit": "mi"})))
            .unwrap();
        assert_eq!(payload["parameters"], json!({"distanceUnit": "mi"}));
    }

    #[test]
    fn test_parameter_check_runs() {
        fn reject(_: &Value) -> Result<()> {
            Err(LogHubError::validation("rejected"))
        }

        let operation = geocoding().parameters(json!({})).check_parameters(reject);
        let request = OperationRequest::new().table("addresses", table(json!([{"country": "CH"}])));
        assert!(operation.build_payload(&request).is_err());
    }

    #[test]
    fn test_empty_optional_table_sent_as_empty_list() {
        let operation = Operation::new("fixed", "fixedcenterofgravity", "fixed center of gravity")
            .input(
                InputTable::new(TableSchema::new("fixedCenters").mandatory(&[("name", Str)]))
                    .may_be_empty(),
            )
            .without_save_scenario();

        let payload = operation
            .build_payload(&OperationRequest::new().table("fixedCenters", Table::default()))
            .unwrap();
        assert_eq!(payload, json!({"fixedCenters": []}));

        let payload = operation.build_payload(&OperationRequest::new()).unwrap();
        assert_eq!(payload, json!({"fixedCenters": []}));
    }

    #[test]
    fn test_batches_split_records() {
        let operation = geocoding().batched(2);
        let request = OperationRequest::new().table(
            "addresses",
            table(json!([{"country": "A"}, {"country": "B"}, {"country": "C"}])),
        );
        let payload = operation.build_payload(&request).unwrap();

        let batches = operation.batches(&payload, &request).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1]["addresses"], json!([{"country": "C"}]));

        let saving = request.save_scenario(SaveScenario::saved("ws", "run"));
        assert!(operation.batches(&payload, &saving).is_none());
    }

    #[test]
    fn test_unpack_missing_key() {
        let err = geocoding().unpack(json!({"other": []})).unwrap_err();
        assert!(matches!(err, LogHubError::MissingResponseKey { ref key, .. } if key == "geocodes"));
    }

    #[test]
    fn test_merge_output_concatenates_tables() {
        let mut output = OperationOutput::default();
        merge_output(
            &mut output,
            OperationOutput {
                tables: vec![("rows".to_string(), table(json!([{"a": 1}])))],
                links: None,
            },
        );
        merge_output(
            &mut output,
            OperationOutput {
                tables: vec![("rows".to_string(), table(json!([{"a": 2}])))],
                links: None,
            },
        );
        assert_eq!(output.get("rows").unwrap().len(), 2);
    }
}
