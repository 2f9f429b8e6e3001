//! vrfdeploy deploys a VRF-consuming contract to a local or shared network in one command.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::Cli;
use vrfdeploy_core::{
    Artifact, ChainClient, Classifier, Credentials, DeployConfig, EtherscanVerifier, Orchestrator,
    ResolvedDependencies, RpcArtifactDeployer, RpcCoordinatorMock, RunOptions, RunSummary,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = DeployConfig::load(cli.config.as_deref())?;

    if let Some(path) = &cli.dump_config {
        config.save_to_file(path)?;
        return Ok(());
    }

    if cli.list_networks {
        println!("{}", networks_table(&config));
        return Ok(());
    }

    // Credentials are read once, before anything touches the network.
    let credentials = Credentials::from_env(&config);
    let orchestrator = Orchestrator::new(&config, &credentials);
    let plan = orchestrator.plan(&cli.network)?;

    let artifact_path = cli.artifact.as_ref().unwrap_or(&config.artifact);
    let artifact = Artifact::load(artifact_path)?;
    plan.check_artifact(&artifact)?;

    tracing::info!(
        contract = %artifact.name,
        network = plan.environment(),
        class = %plan.class(),
        "Starting deployment..."
    );

    let chain = ChainClient::connect(plan.network(), plan.signer().cloned())
        .await
        .with_context(|| format!("Failed to connect to network '{}'", plan.environment()))?;
    let oracle = RpcCoordinatorMock::new(&chain, &config.mock_coordinator);
    let deployer = RpcArtifactDeployer::new(&chain);
    let verifier = EtherscanVerifier::from_config(&config.verification)?;

    let options = RunOptions {
        verify: !cli.no_verify,
        record_dir: (!cli.no_record).then(|| cli.record_dir.clone()),
    };
    let summary = plan
        .execute(&artifact, &oracle, &deployer, &verifier, &options)
        .await?;

    for warning in summary.warnings() {
        tracing::warn!(error = %warning, "Deployment finished with a warning");
    }
    println!("{}", summary_table(&summary));

    Ok(())
}

fn networks_table(config: &DeployConfig) -> Table {
    let classifier = Classifier::new(config.development_chains.iter().cloned());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Network",
        "Chain ID",
        "Class",
        "Confirmations",
        "Coordinator",
        "Subscription",
    ]);

    for entry in config.registry().iter() {
        let deps = entry.dependencies();
        table.add_row(vec![
            entry.name.to_string(),
            entry.network.chain_id.to_string(),
            classifier.classify(entry.name).to_string(),
            entry.network.confirmations().to_string(),
            deps.oracle_address
                .map_or_else(|| "-".to_string(), |address| address.to_string()),
            deps.subscription_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
        ]);
    }

    table
}

fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let coordinator = match &summary.dependencies {
        ResolvedDependencies::Ephemeral(handle) => format!("{} (mock)", handle.coordinator),
        ResolvedDependencies::Persistent(deps) => deps.oracle_address.to_string(),
    };

    let rows = [
        ("Contract", summary.contract.clone()),
        (
            "Network",
            format!("{} ({}, {})", summary.environment, summary.chain_id, summary.class),
        ),
        ("Address", summary.deployment.address.to_string()),
        ("Transaction", summary.deployment.transaction_hash.to_string()),
        (
            "Block",
            format!(
                "{} ({} confirmations)",
                summary.deployment.block_number, summary.deployment.confirmed_block_depth
            ),
        ),
        ("Coordinator", coordinator),
        ("Subscription", summary.dependencies.subscription_id().to_string()),
        ("Verification", summary.verification.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    if let Some(record) = &summary.record {
        table.add_row(vec!["Record".to_string(), record.display().to_string()]);
    }

    table
}
