mod detector;
mod hardhat;

pub use detector::detect;

use std::path::PathBuf;

/// A Hardhat project whose compiled artifacts are deployed by this tool
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub name: String,
    /// Compiler output, `artifacts/` by convention
    pub artifacts_dir: PathBuf,
    /// Persisted deployment records, `deployments/` by convention
    pub deployments_dir: PathBuf,
}

impl Project {
    /// Directory holding the records for one network
    pub fn network_deployments_dir(&self, network: &str) -> PathBuf {
        self.deployments_dir.join(network)
    }
}
