use std::collections::HashSet;

use super::DeploySettings;

/// Everything the deploy scripts need to decide how carefully to deploy.
///
/// Built once per run from the config file and the environment and passed
/// down explicitly.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub development_chains: HashSet<String>,
    pub verification_block_confirmations: u64,
    pub verification_credential: Option<String>,
}

impl DeployConfig {
    pub fn new(settings: &DeploySettings, verification_credential: Option<String>) -> Self {
        Self {
            development_chains: settings.development_chains.iter().cloned().collect(),
            verification_block_confirmations: settings.verification_block_confirmations,
            verification_credential,
        }
    }

    pub fn is_development(&self, network: &str) -> bool {
        self.development_chains.contains(network)
    }

    /// Confirmations to wait for after each deployment
    pub fn confirmations(&self, network: &str) -> u64 {
        if self.is_development(network) {
            1
        } else {
            self.verification_block_confirmations
        }
    }

    /// Non-empty credential, if one is configured
    pub fn credential(&self) -> Option<&str> {
        self.verification_credential
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Whether deployments on `network` should be submitted for source
    /// verification.
    pub fn should_verify(&self, network: &str) -> bool {
        !self.is_development(network) && self.credential().is_some()
    }
}
