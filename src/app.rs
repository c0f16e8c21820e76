use std::sync::Arc;

use alloy::primitives::Address;
use dialoguer::Confirm;
use eyre::{Result, WrapErr, bail, eyre};

use crate::config::{AppConfig, DeployConfig, NetworkConfig};
use crate::contracts::{
    ArtifactRegistry, ChainDeployer, ContractId, DeploymentRecord, DeploymentStore,
};
use crate::network::{self, Connection, NetworkDescriptor};
use crate::project::Project;
use crate::scripts::{self, DeployScript, SCRIPTS, ScriptRunner};
use crate::verify::{
    ContractVerifier, EtherscanVerifier, VerificationOutcome, VerificationRequest,
};

/// Options for `deploy`
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub network: String,
    pub tags: Vec<String>,
    pub wallet: Option<String>,
    pub yes: bool,
    pub etherscan_api_key: Option<String>,
}

/// Shared per-network state of the commands that talk to a chain
struct Session {
    deploy_config: DeployConfig,
    network_config: NetworkConfig,
    registry: Arc<ArtifactRegistry>,
    store: DeploymentStore,
}

impl Session {
    fn open(
        project: &Project,
        config: &AppConfig,
        network: &str,
        etherscan_api_key: Option<String>,
    ) -> Result<Self> {
        let network_config = config
            .network(network)
            .ok_or_else(|| eyre!("Network {:?} is not configured", network))?;

        // an explicit key wins over the config file
        let credential = match etherscan_api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => Some(key),
            None => config.resolve_explorer_key(network)?,
        };

        Ok(Self {
            deploy_config: DeployConfig::new(&config.deploy, credential),
            network_config,
            registry: Arc::new(ArtifactRegistry::load(&project.artifacts_dir)?),
            store: DeploymentStore::new(project.network_deployments_dir(network)),
        })
    }

    fn verifier(&self, network: &NetworkDescriptor) -> Result<EtherscanVerifier> {
        let api_key = self.deploy_config.credential().unwrap_or_default().to_string();
        let verifier = EtherscanVerifier::new(api_key, network.chain_id, self.registry.clone())?;

        Ok(match &self.network_config.explorer_api_url {
            Some(url) => verifier.with_api_url(url),
            None => verifier,
        })
    }
}

/// Run the deploy scripts selected by `options.tags`
pub async fn deploy(project: &Project, config: &AppConfig, options: DeployOptions) -> Result<()> {
    let scripts = scripts::select(SCRIPTS, &options.tags)?;
    let session = Session::open(
        project,
        config,
        &options.network,
        options.etherscan_api_key.clone(),
    )?;

    let signer = network::resolve_signer(config, options.wallet.as_deref())?;
    let connection = network::connect(
        &options.network,
        &session.network_config,
        &session.deploy_config,
        signer,
    )
    .await?;
    session.store.ensure_chain(connection.network.chain_id)?;

    if !connection.network.development
        && !options.yes
        && !confirm_deployment(&connection, &scripts)?
    {
        tracing::info!("Deployment cancelled");
        return Ok(());
    }

    if session.deploy_config.should_verify(&connection.network.name) {
        tracing::info!("Deployments will be verified on the block explorer");
    }

    let deployer = ChainDeployer::new(
        connection.provider.clone(),
        session.registry.clone(),
        session.store.clone(),
        connection.network.chain_id,
    );
    let verifier = session.verifier(&connection.network)?;

    let mut runner = ScriptRunner::new(
        &session.deploy_config,
        &connection.network,
        connection.deployer,
        deployer,
        verifier,
    );
    let records = runner.run(&scripts).await?;
    tracing::debug!("Runner finished in phase {:?}", runner.phase());

    print_summary(&connection.network, &records);
    Ok(())
}

fn confirm_deployment(connection: &Connection, scripts: &[&DeployScript]) -> Result<bool> {
    let contracts: Vec<&str> = scripts
        .iter()
        .flat_map(|s| s.contracts.iter().map(ContractId::name))
        .collect();

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Deploy {} to {} from {}?",
            contracts.join(", "),
            connection.network,
            connection.deployer
        ))
        .default(false)
        .interact()
        .wrap_err("Failed to read confirmation")?;

    Ok(confirmed)
}

fn print_summary(network: &NetworkDescriptor, records: &[DeploymentRecord]) {
    println!("\nDeployments on {}:", network);
    for record in records {
        let state = if record.newly_deployed {
            "deployed"
        } else {
            "unchanged"
        };
        println!("  {:<16} {} ({})", record.contract_name, record.address, state);
        if let Some(url) = network.address_url(record.address) {
            println!("  {:<16} {}", "", url);
        }
    }
}

/// List the persisted deployments of a network
pub fn list_deployments(project: &Project, network: &str) -> Result<()> {
    let store = DeploymentStore::new(project.network_deployments_dir(network));
    let records = store.scan()?;

    if records.is_empty() {
        println!("No deployments recorded for {} in {:?}", network, store.dir());
        return Ok(());
    }

    if let Some(chain_id) = store.chain_id()? {
        println!(
            "Deployments on {} (chain {}, {}):",
            network,
            chain_id,
            network::chain_id_to_network(chain_id)
        );
    }

    for record in &records {
        let block = record
            .receipt
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {:<16} {}  block {:<10} tx {}",
            record.contract_name, record.address, block, record.receipt.transaction_hash
        );
    }

    Ok(())
}

/// Submit a persisted deployment for verification.
///
/// `contract` is a contract name or a deployed address.
pub async fn verify(
    project: &Project,
    config: &AppConfig,
    network: &str,
    contract: &str,
    etherscan_api_key: Option<String>,
) -> Result<()> {
    let session = Session::open(project, config, network, etherscan_api_key)?;

    if session.deploy_config.is_development(network) {
        bail!("{} is a development network; nothing to verify", network);
    }
    if !session.deploy_config.should_verify(network) {
        bail!("No Etherscan API key configured; set ETHERSCAN_API_KEY or run `init`");
    }

    let record = match contract.parse::<Address>() {
        Ok(address) => session.store.get_by_address(address)?,
        Err(_) => session.store.load(contract.parse::<ContractId>()?.name())?,
    }
    .ok_or_else(|| eyre!("No deployment of {} recorded for {}", contract, network))?;

    let id: ContractId = record.contract_name.parse()?;
    let descriptor = NetworkDescriptor::new(network, record.chain_id, &session.deploy_config)
        .with_explorer_url(session.network_config.explorer_url.as_deref());

    let outcome = session
        .verifier(&descriptor)?
        .verify(&VerificationRequest::for_record(id, &record))
        .await?;

    match outcome {
        VerificationOutcome::Verified => println!("Verified {} at {}", id, record.address),
        VerificationOutcome::AlreadyVerified => {
            println!("{} at {} is already verified", id, record.address)
        }
    }
    if let Some(url) = descriptor.address_url(record.address) {
        println!("  {}", url);
    }

    Ok(())
}
