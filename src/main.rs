mod app;
mod config;
mod contracts;
mod network;
mod project;
mod scripts;
mod setup;
mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "nft-deployer")]
#[command(about = "Deploy and verify the NFT marketplace contracts")]
#[command(version)]
struct Cli {
    /// Path to the Hardhat project directory
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the deploy scripts against a network
    Deploy {
        /// Network to deploy to, defaults to `defaults.network`
        #[arg(long)]
        network: Option<String>,

        /// Only run scripts carrying one of these tags (all, nftmarketplace, basicNft)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Wallet to deploy from, defaults to `defaults.wallet`
        #[arg(long)]
        wallet: Option<String>,

        /// Skip the confirmation prompt on non-development networks
        #[arg(long, short)]
        yes: bool,

        /// Block explorer API key used for source verification
        #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
        etherscan_api_key: Option<String>,
    },

    /// List the recorded deployments of a network
    Deployments {
        #[arg(long)]
        network: Option<String>,
    },

    /// Verify a recorded deployment on the block explorer
    Verify {
        #[arg(long)]
        network: Option<String>,

        /// Contract name or deployed address
        contract: String,

        #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
        etherscan_api_key: Option<String>,
    },

    /// Configure networks, wallets and API keys interactively
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Cli {
        project,
        config: config_path,
        command,
    } = cli;

    let mut config = match &config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match command {
        Command::Init => setup::run_setup(&mut config),
        Command::Deploy {
            network,
            tags,
            wallet,
            yes,
            etherscan_api_key,
        } => {
            let project = open_project(project)?;
            let options = app::DeployOptions {
                network: config.network_or_default(network)?,
                tags,
                wallet,
                yes,
                etherscan_api_key,
            };
            app::deploy(&project, &config, options).await
        }
        Command::Deployments { network } => {
            let network = config.network_or_default(network)?;
            app::list_deployments(&open_project(project)?, &network)
        }
        Command::Verify {
            network,
            contract,
            etherscan_api_key,
        } => {
            let network = config.network_or_default(network)?;
            let project = open_project(project)?;
            app::verify(&project, &config, &network, &contract, etherscan_api_key).await
        }
    }
}

fn open_project(path: PathBuf) -> Result<project::Project> {
    let path = path.canonicalize().unwrap_or(path);
    project::detect(&path)
}
