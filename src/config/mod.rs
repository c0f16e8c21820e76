mod deploy;
mod keychain;
mod settings;

pub use deploy::DeployConfig;
pub use keychain::{KeychainManager, normalize_private_key, store_private_key};
pub use settings::{AppConfig, Defaults, DeploySettings, NetworkConfig, WalletConfig};
