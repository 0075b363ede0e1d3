use anyhow::Context;
use clap::Parser;
use loghub_client::adapters::{read_csv, write_csv};
use loghub_client::app;
use loghub_client::config::cli::{Command, DatasetCommand, RunArgs};
use loghub_client::core::dataset::TableMetadata;
use loghub_client::utils::logger;
use loghub_client::utils::validation::{validate_required_field, Validate};
use loghub_client::{
    CliConfig, CsvPipeline, DatasetClient, LocalStorage, LogHubClient, LogHubError, Operation,
    RunEngine,
};
use serde_json::json;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(err) = run(cli).await {
        tracing::error!("{:#}", err);
        eprintln!("❌ {:#}", err);
        let exit_code = err
            .downcast_ref::<LogHubError>()
            .map(LogHubError::exit_code)
            .unwrap_or(1);
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    match &cli.command {
        Command::List => {
            for operation in app::catalog() {
                let long_run = if operation.is_long_run() { " (long run)" } else { "" };
                println!("{:<48} {}{}", operation.name(), operation.application(), long_run);
            }
        }
        Command::Sample { operation } => {
            let operation = app::find(operation)?;
            let inputs: Vec<&str> = operation.inputs().iter().map(|i| i.name.as_str()).collect();
            let sample = json!({
                "inputs": inputs,
                "parameters": operation.default_parameters(),
                "saveScenario": operation.sample_save_scenario(),
            });
            println!("{}", serde_json::to_string_pretty(&sample)?);
        }
        Command::Run(args) => {
            let operation = app::find(&args.operation)?;
            let pipeline = run_pipeline(client(&cli)?, operation, args);
            finish(RunEngine::new(pipeline).run().await?);
        }
        Command::Job => {
            let path = cli
                .config
                .as_deref()
                .context("the job command needs a config file (--config)")?;
            let file = cli.load_file(path)?;
            let job = file
                .job()
                .with_context(|| format!("{} has no [job] section", path.display()))?;
            job.validate()?;

            let operation = app::find(&job.operation)?;
            let pipeline = CsvPipeline::from_job(LocalStorage::new("."), client(&cli)?, operation, job);
            finish(RunEngine::new(pipeline).run().await?);
        }
        Command::Entities { workspace_id } => {
            let links = client(&cli)?.workspace_entities(workspace_id).await?;
            println!("{}", serde_json::to_string_pretty(&links)?);
        }
        Command::Dataset(command) => dataset(&cli, command).await?,
    }
    Ok(())
}

fn client(cli: &CliConfig) -> anyhow::Result<LogHubClient> {
    let config = cli.client_config()?;
    config.validate()?;
    Ok(LogHubClient::from_provider(&config)?)
}

fn run_pipeline(client: LogHubClient, operation: Operation, args: &RunArgs) -> CsvPipeline<LocalStorage> {
    let mut pipeline = CsvPipeline::new(LocalStorage::new("."), client, operation)
        .parameters(args.parameters.clone())
        .save_scenario(args.save_scenario())
        .fetch_links(args.fetch_links)
        .output_path(&args.output_path)
        .zip(args.zip);
    for (name, path) in &args.inputs {
        pipeline = pipeline.input(name, path);
    }
    pipeline
}

fn finish(output_path: String) {
    tracing::info!("✅ Run completed successfully!");
    println!("📁 Output saved to: {}", output_path);
}

async fn dataset(cli: &CliConfig, command: &DatasetCommand) -> anyhow::Result<()> {
    let config = cli.client_config()?;
    let email = validate_required_field("dataset.email", &config.email)?.clone();
    let client = DatasetClient::new(email, config.api_key.clone()).with_api_server(&config.dataset_api);

    match command {
        DatasetCommand::Read { table_link, output } => {
            let table = client.read_table(table_link).await?;
            std::fs::write(output, write_csv(&table)?)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("📁 {} rows saved to: {}", table.len(), output.display());
        }
        DatasetCommand::Update {
            table_link,
            input,
            table_name,
        } => {
            let data = std::fs::read(input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let table = read_csv(&data)?;
            let metadata = TableMetadata {
                table_name: table_name.clone(),
                ..Default::default()
            };
            client.update_table(table_link, &table, &metadata).await?;
            println!("✅ Updated {} with {} rows", table_link, table.len());
        }
    }
    Ok(())
}
