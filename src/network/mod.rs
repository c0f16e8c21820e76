mod accounts;

pub use accounts::resolve_signer;

use std::fmt;

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use eyre::{Result, WrapErr, bail, eyre};

use crate::config::{DeployConfig, NetworkConfig};

/// The chain a run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub name: String,
    pub chain_id: u64,
    pub development: bool,
    pub explorer_url: Option<String>,
}

impl NetworkDescriptor {
    pub fn new(name: &str, chain_id: u64, config: &DeployConfig) -> Self {
        Self {
            name: name.to_string(),
            chain_id,
            development: config.is_development(name),
            explorer_url: explorer_url(chain_id).map(String::from),
        }
    }

    pub fn with_explorer_url(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url {
            self.explorer_url = Some(url.trim_end_matches('/').to_string());
        }
        self
    }

    /// Block explorer link for an address, for chains with a known explorer
    pub fn address_url(&self, address: Address) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/address/{}", base, address))
    }
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain {})", self.name, self.chain_id)
    }
}

/// A connected provider plus the account deployments are sent from
pub struct Connection {
    pub provider: DynProvider,
    pub network: NetworkDescriptor,
    pub deployer: Address,
}

/// Connect to `name` and resolve the deployer account.
///
/// Without a signer the node's first unlocked account is used, which only
/// development networks offer.
pub async fn connect(
    name: &str,
    network: &NetworkConfig,
    config: &DeployConfig,
    signer: Option<PrivateKeySigner>,
) -> Result<Connection> {
    let (provider, signer_address) = match signer {
        Some(signer) => {
            let address = signer.address();
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect(&network.rpc_url)
                .await
                .wrap_err("Failed to connect to RPC")?
                .erased();
            (provider, Some(address))
        }
        None => {
            let provider = ProviderBuilder::new()
                .connect(&network.rpc_url)
                .await
                .wrap_err("Failed to connect to RPC")?
                .erased();
            (provider, None)
        }
    };

    let chain_id = provider
        .get_chain_id()
        .await
        .wrap_err_with(|| format!("Failed to fetch chain id from {}", network.rpc_url))?;

    if let Some(expected) = network.chain_id {
        if expected != chain_id {
            bail!(
                "Network {} is configured for chain {} but the RPC reports chain {}",
                name,
                expected,
                chain_id
            );
        }
    }

    let descriptor = NetworkDescriptor::new(name, chain_id, config)
        .with_explorer_url(network.explorer_url.as_deref());

    let deployer = match signer_address {
        Some(address) => address,
        None if descriptor.development => {
            let accounts = provider
                .get_accounts()
                .await
                .wrap_err("Failed to list node accounts")?;
            accounts
                .first()
                .copied()
                .ok_or_else(|| eyre!("{} has no unlocked accounts", descriptor))?
        }
        None => bail!(
            "No deployer wallet configured for {}; pass --wallet or set defaults.wallet",
            descriptor
        ),
    };

    tracing::info!("Connected to {} as {}", descriptor, deployer);

    Ok(Connection {
        provider,
        network: descriptor,
        deployer,
    })
}

pub fn chain_id_to_network(chain_id: u64) -> String {
    match chain_id {
        1 => "mainnet".to_string(),
        11155111 => "sepolia".to_string(),
        17000 => "holesky".to_string(),
        137 => "polygon".to_string(),
        80002 => "amoy".to_string(),
        42161 => "arbitrum".to_string(),
        10 => "optimism".to_string(),
        8453 => "base".to_string(),
        31337 => "localhost".to_string(),
        _ => format!("chain-{}", chain_id),
    }
}

fn explorer_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://etherscan.io"),
        11155111 => Some("https://sepolia.etherscan.io"),
        17000 => Some("https://holesky.etherscan.io"),
        137 => Some("https://polygonscan.com"),
        80002 => Some("https://amoy.polygonscan.com"),
        42161 => Some("https://arbiscan.io"),
        10 => Some("https://optimistic.etherscan.io"),
        8453 => Some("https://basescan.org"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DeploySettings;

    use super::*;

    #[test]
    fn test_chain_id_to_network() {
        assert_eq!(chain_id_to_network(1), "mainnet");
        assert_eq!(chain_id_to_network(11155111), "sepolia");
        assert_eq!(chain_id_to_network(31337), "localhost");
        assert_eq!(chain_id_to_network(99999), "chain-99999");
    }

    #[test]
    fn test_descriptor_classification() {
        let config = DeployConfig::new(&DeploySettings::default(), None);

        let local = NetworkDescriptor::new("localhost", 31337, &config);
        assert!(local.development);
        assert_eq!(local.address_url(Address::ZERO), None);

        let sepolia = NetworkDescriptor::new("sepolia", 11155111, &config);
        assert!(!sepolia.development);
        assert_eq!(sepolia.to_string(), "sepolia (chain 11155111)");
        assert_eq!(
            sepolia.address_url(Address::ZERO).unwrap(),
            format!("https://sepolia.etherscan.io/address/{}", Address::ZERO)
        );

        let custom = NetworkDescriptor::new("devnet", 99999, &config)
            .with_explorer_url(Some("https://explorer.example.org/"));
        assert_eq!(
            custom.address_url(Address::ZERO).unwrap(),
            format!("https://explorer.example.org/address/{}", Address::ZERO)
        );
    }
}
