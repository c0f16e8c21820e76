use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use alloy::dyn_abi::DynSolValue;
use eyre::{Result, WrapErr, bail, eyre};

use super::artifact::Artifact;

/// The contracts this project deploys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractId {
    NftMarketplace,
    BasicNft,
    BasicNftTwo,
}

impl ContractId {
    pub const ALL: [ContractId; 3] = [
        ContractId::NftMarketplace,
        ContractId::BasicNft,
        ContractId::BasicNftTwo,
    ];

    /// Contract name as it appears in the compiler output
    pub fn name(&self) -> &'static str {
        match self {
            ContractId::NftMarketplace => "NftMarketplace",
            ContractId::BasicNft => "BasicNft",
            ContractId::BasicNftTwo => "BasicNftTwo",
        }
    }

    pub fn constructor_args(&self) -> Vec<DynSolValue> {
        match self {
            ContractId::NftMarketplace | ContractId::BasicNft | ContractId::BasicNftTwo => {
                Vec::new()
            }
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContractId {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        ContractId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<_> = ContractId::ALL.iter().map(ContractId::name).collect();
                eyre!("Unknown contract {:?}, expected one of {}", s, known.join(", "))
            })
    }
}

/// Compiled artifacts for every [`ContractId`], resolved once per run
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    artifacts: HashMap<ContractId, Artifact>,
}

impl ArtifactRegistry {
    /// Scan a Hardhat `artifacts/` directory for the known contracts
    pub fn load(artifacts_dir: &Path) -> Result<Self> {
        if !artifacts_dir.exists() {
            bail!(
                "Artifacts directory {:?} does not exist; compile the contracts first",
                artifacts_dir
            );
        }

        let mut registry = Self::default();
        registry.scan_dir(artifacts_dir)?;

        tracing::info!(
            "Resolved {} of {} contract artifacts",
            registry.artifacts.len(),
            ContractId::ALL.len()
        );
        Ok(registry)
    }

    fn scan_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).wrap_err_with(|| format!("Failed to read {:?}", dir))?;

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                if path.file_name().is_some_and(|n| n == "build-info") {
                    continue;
                }
                self.scan_dir(&path)?;
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name.ends_with(".dbg.json") {
                continue;
            }
            let Some(stem) = file_name.strip_suffix(".json") else {
                continue;
            };
            let Some(id) = ContractId::ALL.into_iter().find(|id| id.name() == stem) else {
                continue;
            };

            let artifact = Artifact::load(&path)?;
            if let Some(existing) = self.artifacts.get(&id) {
                bail!(
                    "Contract name {} is ambiguous: found {} and {}",
                    id,
                    existing.fully_qualified_name(),
                    artifact.fully_qualified_name()
                );
            }

            tracing::debug!("Found artifact for {} at {:?}", id, path);
            self.artifacts.insert(id, artifact);
        }

        Ok(())
    }

    pub fn get(&self, id: ContractId) -> Result<&Artifact> {
        self.artifacts
            .get(&id)
            .ok_or_else(|| eyre!("No artifact found for {}; compile the contracts first", id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::artifact::fixtures::write_artifact;
    use super::*;

    #[test]
    fn test_contract_id_from_str() {
        assert_eq!("BasicNft".parse::<ContractId>().unwrap(), ContractId::BasicNft);
        assert_eq!(
            "basicnfttwo".parse::<ContractId>().unwrap(),
            ContractId::BasicNftTwo
        );
        assert!("Marketplace".parse::<ContractId>().is_err());
    }

    #[test]
    fn test_load_registry() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "contracts/NftMarketplace.sol", "NftMarketplace", "0x6080");
        write_artifact(dir.path(), "contracts/test/BasicNft.sol", "BasicNft", "0x6081");
        write_artifact(dir.path(), "contracts/test/BasicNft.sol", "Unrelated", "0x6082");

        let registry = ArtifactRegistry::load(dir.path()).unwrap();

        assert_eq!(
            registry.get(ContractId::BasicNft).unwrap().source_name,
            "contracts/test/BasicNft.sol"
        );
        assert!(registry.get(ContractId::NftMarketplace).is_ok());
        assert!(registry.get(ContractId::BasicNftTwo).is_err());
    }

    #[test]
    fn test_duplicate_contract_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "contracts/a/BasicNft.sol", "BasicNft", "0x6080");
        write_artifact(dir.path(), "contracts/b/BasicNft.sol", "BasicNft", "0x6081");

        assert!(ArtifactRegistry::load(dir.path()).is_err());
    }

    #[test]
    fn test_missing_artifacts_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ArtifactRegistry::load(&dir.path().join("artifacts")).is_err());
    }
}
