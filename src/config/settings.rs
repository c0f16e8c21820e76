use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr, ensure, eyre};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::KeychainManager;

const CONFIG_DIR: &str = "nft-deployer";
const CONFIG_FILE: &str = "config.toml";

/// Prefix marking a value that lives in the OS keychain
const KEYCHAIN_PREFIX: &str = "keychain:";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    #[serde(default)]
    pub wallets: HashMap<String, WalletConfig>,

    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    #[serde(default)]
    pub deploy: DeploySettings,

    #[serde(default)]
    pub defaults: Option<Defaults>,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: Option<u64>,
    pub explorer_url: Option<String>,
    /// Etherscan-compatible API endpoint, defaults to the Etherscan v2 API
    pub explorer_api_url: Option<String>,
    pub explorer_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Reference to keychain entry (e.g., "wallet_deployer")
    pub keychain: Option<String>,
    /// Environment variable containing private key
    pub env_var: Option<String>,
    /// Optional label for display
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub network: Option<String>,
    pub wallet: Option<String>,
}

/// The `[deploy]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    #[serde(default = "default_development_chains")]
    pub development_chains: Vec<String>,

    #[serde(default = "default_verification_block_confirmations")]
    pub verification_block_confirmations: u64,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            development_chains: default_development_chains(),
            verification_block_confirmations: default_verification_block_confirmations(),
        }
    }
}

fn default_development_chains() -> Vec<String> {
    vec!["hardhat".to_string(), "localhost".to_string()]
}

fn default_verification_block_confirmations() -> u64 {
    6
}

impl AppConfig {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self {
                config_path: Some(config_path),
                ..Default::default()
            })
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: AppConfig =
            toml::from_str(&content).wrap_err("Failed to parse config file")?;

        config.validate()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.deploy.verification_block_confirmations > 0,
            "deploy.verification_block_confirmations must be at least 1"
        );
        Ok(())
    }

    /// Save configuration to the path it was loaded from
    pub fn save(&self) -> Result<()> {
        let path = self
            .config_path
            .clone()
            .or_else(|| Self::default_config_path().ok())
            .ok_or_else(|| eyre!("No config path available"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).wrap_err("Failed to serialize config")?;

        fs::write(&path, content)
            .wrap_err_with(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config_path
            .clone()
            .or_else(|| Self::default_config_path().ok())
    }

    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Look up a network by name.
    ///
    /// Development networks that are not configured fall back to a local node
    /// on the default Hardhat/Anvil port.
    pub fn network(&self, name: &str) -> Option<NetworkConfig> {
        if let Some(network) = self.networks.get(name) {
            return Some(network.clone());
        }

        match name {
            "hardhat" | "localhost" | "anvil" => Some(NetworkConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                chain_id: Some(31337),
                ..Default::default()
            }),
            _ => None,
        }
    }

    /// The network asked for, or `defaults.network`
    pub fn network_or_default(&self, name: Option<String>) -> Result<String> {
        name.or_else(|| self.defaults.as_ref().and_then(|d| d.network.clone()))
            .ok_or_else(|| eyre!("No network given; pass --network or set defaults.network"))
    }

    /// Name of the wallet to deploy from, if any
    pub fn default_wallet(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.wallet.as_deref())
    }

    /// Resolve an API key value (handling keychain references)
    pub fn resolve_api_key(&self, name: &str) -> Result<Option<String>> {
        match self.api_keys.get(name) {
            Some(value) => resolve_secret(value),
            None => Ok(None),
        }
    }

    /// Resolve the explorer key for a network, falling back to the shared
    /// `etherscan` entry under `[api_keys]`.
    pub fn resolve_explorer_key(&self, network: &str) -> Result<Option<String>> {
        let network_key = self
            .networks
            .get(network)
            .and_then(|n| n.explorer_api_key.as_deref());

        match network_key {
            Some(value) => resolve_secret(value),
            None => self.resolve_api_key("etherscan"),
        }
    }

    /// Resolve a wallet private key
    pub fn resolve_wallet_key(&self, name: &str) -> Result<Option<Zeroizing<String>>> {
        let wallet = match self.wallets.get(name) {
            Some(w) => w,
            None => return Ok(None),
        };

        if let Some(keychain_ref) = &wallet.keychain {
            let km = KeychainManager::new();
            km.get_zeroizing(keychain_ref)
        } else if let Some(env_var) = &wallet.env_var {
            Ok(std::env::var(env_var).ok().map(Zeroizing::new))
        } else {
            Ok(None)
        }
    }
}

fn resolve_secret(value: &str) -> Result<Option<String>> {
    if let Some(keychain_ref) = value.strip_prefix(KEYCHAIN_PREFIX) {
        KeychainManager::new().get(keychain_ref)
    } else {
        Ok(Some(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
[networks.sepolia]
rpc_url = "https://sepolia.drpc.org"
chain_id = 11155111
explorer_api_key = "ABC123"

[wallets.deployer]
env_var = "DEPLOYER_PRIVATE_KEY"

[deploy]
development_chains = ["hardhat", "localhost", "anvil"]
verification_block_confirmations = 3

[defaults]
network = "sepolia"
wallet = "deployer"
"#;

        let config: AppConfig = toml::from_str(content).unwrap();
        assert_eq!(config.networks.len(), 1);
        assert_eq!(config.deploy.development_chains.len(), 3);
        assert_eq!(config.deploy.verification_block_confirmations, 3);
        assert_eq!(config.default_wallet(), Some("deployer"));
        assert_eq!(
            config.resolve_explorer_key("sepolia").unwrap(),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn test_deploy_defaults_when_table_missing() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.deploy.development_chains, vec!["hardhat", "localhost"]);
        assert_eq!(config.deploy.verification_block_confirmations, 6);
    }

    #[test]
    fn test_zero_confirmations_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[deploy]\nverification_block_confirmations = 0\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("verification_block_confirmations"));

        fs::write(&path, "[deploy]\nverification_block_confirmations = 1\n").unwrap();
        assert!(AppConfig::load_from(&path).is_ok());
    }

    #[test]
    fn test_network_falls_back_to_default() {
        let mut config = AppConfig::default();
        assert!(config.network_or_default(None).is_err());

        config.defaults = Some(Defaults {
            network: Some("sepolia".to_string()),
            wallet: None,
        });
        assert_eq!(config.network_or_default(None).unwrap(), "sepolia");
        assert_eq!(
            config.network_or_default(Some("localhost".to_string())).unwrap(),
            "localhost"
        );
    }

    #[test]
    fn test_local_networks_fall_back_to_default_node() {
        let config = AppConfig::default();

        let localhost = config.network("localhost").unwrap();
        assert_eq!(localhost.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(localhost.chain_id, Some(31337));

        assert!(config.network("sepolia").is_none());
    }

    #[test]
    fn test_explorer_key_falls_back_to_shared_entry() {
        let mut config = AppConfig::default();
        config
            .api_keys
            .insert("etherscan".to_string(), "SHARED".to_string());

        assert_eq!(
            config.resolve_explorer_key("mainnet").unwrap(),
            Some("SHARED".to_string())
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig {
            config_path: Some(path.clone()),
            ..Default::default()
        };
        config.networks.insert(
            "sepolia".to_string(),
            NetworkConfig {
                rpc_url: "https://sepolia.drpc.org".to_string(),
                chain_id: Some(11155111),
                ..Default::default()
            },
        );
        config.save().unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.networks["sepolia"].chain_id, Some(11155111));
        assert_eq!(reloaded.config_path(), Some(path));
    }
}
