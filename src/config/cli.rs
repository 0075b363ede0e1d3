use crate::config::{ClientConfig, TomlConfig};
use crate::domain::model::SaveScenario;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "loghub")]
#[command(about = "Run Log-hub supply chain applications on CSV files")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with [client], [retry], [polling] and [dataset] settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides LOG_HUB_API_KEY and the config file
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Overrides LOG_HUB_API_SERVER and the config file
    #[arg(long, global = true)]
    pub api_server: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the available operations
    List,
    /// Print the default parameters and scenario settings of an operation
    Sample { operation: String },
    /// Run one operation on CSV inputs
    Run(RunArgs),
    /// Run the [job] section of the config file
    Job,
    /// Print the links of the entities saved in a workspace
    Entities { workspace_id: String },
    /// Read or replace a dataset table
    #[command(subcommand)]
    Dataset(DatasetCommand),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    pub operation: String,

    /// Input table as NAME=FILE.csv, repeatable
    #[arg(short, long = "input", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// Parameters as a JSON object
    #[arg(short, long, value_parser = parse_json_object)]
    pub parameters: Option<Value>,

    /// Save the run as a scenario in this workspace
    #[arg(long, requires = "scenario_name")]
    pub workspace_id: Option<String>,

    #[arg(long, requires = "workspace_id")]
    pub scenario_name: Option<String>,

    #[arg(long)]
    pub overwrite_scenario: bool,

    /// Merge into an existing map scenario instead of replacing it
    #[arg(long, requires = "workspace_id")]
    pub merge_with_existing_scenario: bool,

    /// Do not save a scenario, even for map operations that save by default
    #[arg(long, conflicts_with = "workspace_id")]
    pub no_save_scenario: bool,

    #[arg(long)]
    pub fetch_links: bool,

    #[arg(short, long, default_value = "./output")]
    pub output_path: String,

    #[arg(long)]
    pub zip: bool,
}

impl RunArgs {
    pub fn save_scenario(&self) -> Option<SaveScenario> {
        if self.no_save_scenario {
            return Some(SaveScenario {
                save_scenario: Some(false),
                ..Default::default()
            });
        }
        match (&self.workspace_id, &self.scenario_name) {
            (Some(workspace_id), Some(scenario_name)) => {
                let mut save_scenario = SaveScenario::saved(workspace_id, scenario_name);
                save_scenario.overwrite_scenario = Some(self.overwrite_scenario);
                save_scenario.merge_with_existing_scenario =
                    self.merge_with_existing_scenario.then_some(true);
                Some(save_scenario)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum DatasetCommand {
    /// Download a table to CSV
    Read {
        table_link: String,
        #[arg(short, long, default_value = "table.csv")]
        output: PathBuf,
    },
    /// Replace the rows of a table with a CSV file
    Update {
        table_link: String,
        input: PathBuf,
        #[arg(long)]
        table_name: Option<String>,
    },
}

impl CliConfig {
    /// Environment, then config file, then command line flags.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => self.load_file(path)?.client_config(),
            None => ClientConfig::from_env(),
        };
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(api_server) = &self.api_server {
            config.api_server = api_server.trim_end_matches('/').to_string();
        }
        Ok(config)
    }

    pub fn load_file(&self, path: &Path) -> Result<TomlConfig> {
        tracing::info!("Loading configuration from: {}", path.display());
        TomlConfig::from_file(path)
    }
}

fn parse_input(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), path.trim().to_string()))
        }
        _ => Err(format!("expected NAME=FILE, got '{}'", raw)),
    }
}

fn parse_json_object(raw: &str) -> std::result::Result<Value, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("parameters must be a JSON object".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scenario::save_scenario_parameters;
    use serde_json::json;

    #[test]
    fn test_parse_run_command() {
        let cli = CliConfig::try_parse_from([
            "loghub",
            "run",
            "forward_geocoding",
            "-i",
            "addresses=data/addresses.csv",
            "--parameters",
            r#"{"distanceUnit": "km"}"#,
            "--workspace-id",
            "ws-1",
            "--scenario-name",
            "Q3",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.operation, "forward_geocoding");
        assert_eq!(
            args.inputs,
            vec![("addresses".to_string(), "data/addresses.csv".to_string())]
        );
        assert_eq!(args.parameters, Some(json!({"distanceUnit": "km"})));
        let save_scenario = args.save_scenario().unwrap();
        assert_eq!(save_scenario.workspace_id.as_deref(), Some("ws-1"));
        assert_eq!(save_scenario.overwrite_scenario, Some(false));
    }

    #[test]
    fn test_map_scenario_flags() {
        let cli = CliConfig::try_parse_from([
            "loghub",
            "run",
            "forward_supply_chain_map_areas",
            "--workspace-id",
            "ws-1",
            "--scenario-name",
            "Regions",
            "--merge-with-existing-scenario",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let parameters = save_scenario_parameters(args.save_scenario().as_ref(), "supplychainmapareas");
        assert_eq!(parameters["saveScenario"], json!(true));
        assert_eq!(parameters["mergeWithExistingScenario"], json!(true));

        let cli = CliConfig::try_parse_from([
            "loghub",
            "run",
            "forward_supply_chain_map_areas",
            "--no-save-scenario",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let parameters = save_scenario_parameters(args.save_scenario().as_ref(), "supplychainmapareas");
        assert_eq!(parameters["saveScenario"], json!(false));

        assert!(CliConfig::try_parse_from([
            "loghub",
            "run",
            "x",
            "--no-save-scenario",
            "--workspace-id",
            "ws-1",
            "--scenario-name",
            "Regions",
        ])
        .is_err());
        assert!(CliConfig::try_parse_from(["loghub", "run", "x", "--merge-with-existing-scenario"]).is_err());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(CliConfig::try_parse_from(["loghub", "run", "x", "-i", "addresses"]).is_err());
        assert!(CliConfig::try_parse_from(["loghub", "run", "x", "-p", "[1]"]).is_err());
        assert!(
            CliConfig::try_parse_from(["loghub", "run", "x", "--workspace-id", "ws"]).is_err()
        );
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = CliConfig::try_parse_from([
            "loghub",
            "list",
            "--api-key",
            "flag-key",
            "--api-server",
            "https://api.example.com/",
        ])
        .unwrap();

        let config = cli.client_config().unwrap();
        assert_eq!(config.api_key, "flag-key");
        assert_eq!(config.api_server, "https://api.example.com");
    }

    #[test]
    fn test_dataset_subcommand() {
        let cli = CliConfig::try_parse_from([
            "loghub",
            "dataset",
            "update",
            "https://example.com/api/v1/datasets/d1/tables/t1/rows",
            "rows.csv",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Dataset(DatasetCommand::Update { ref input, .. }) if input == &PathBuf::from("rows.csv")
        ));
    }
}
