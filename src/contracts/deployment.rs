use std::fs;
use std::path::{Path, PathBuf};

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, B256, Bytes, TxHash},
};
use eyre::{Result, WrapErr, bail};
use serde::{Deserialize, Serialize};

const CHAIN_ID_FILE: &str = ".chainId";

/// Represents a deployed contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub chain_id: u64,
    pub deployer: Address,
    pub receipt: ReceiptSummary,
    /// Confirmations observed when the deployment was accepted
    pub confirmations: u64,
    pub constructor_args: Bytes,
    pub bytecode_hash: B256,
    pub abi: JsonAbi,
    /// Set when this run sent the deployment transaction, false when an
    /// earlier deployment was reused
    #[serde(skip)]
    pub newly_deployed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: bool,
}

/// Deployment records of one network, stored as
/// `deployments/<network>/<ContractName>.json`.
///
/// Records are only ever added or replaced by a newer deployment.
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    dir: PathBuf,
}

impl DeploymentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, contract_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", contract_name))
    }

    /// Chain id the stored records belong to, if any were written
    pub fn chain_id(&self) -> Result<Option<u64>> {
        let path = self.dir.join(CHAIN_ID_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).wrap_err_with(|| format!("Failed to read {:?}", path))?;
        let chain_id = content
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid chain id in {:?}", path))?;

        Ok(Some(chain_id))
    }

    /// Refuse to mix records of different chains in one directory
    pub fn ensure_chain(&self, chain_id: u64) -> Result<()> {
        match self.chain_id()? {
            Some(stored) if stored != chain_id => bail!(
                "{:?} holds deployments for chain {} but the network reports chain {}",
                self.dir,
                stored,
                chain_id
            ),
            _ => Ok(()),
        }
    }

    pub fn load(&self, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(contract_name);
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).wrap_err_with(|| format!("Failed to read {:?}", path))?;
        let record = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {:?}", path))?;

        Ok(Some(record))
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("Failed to create {:?}", self.dir))?;

        self.ensure_chain(record.chain_id)?;
        fs::write(self.dir.join(CHAIN_ID_FILE), record.chain_id.to_string())
            .wrap_err("Failed to write chain id marker")?;

        let path = self.record_path(&record.contract_name);
        let tmp_path = path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(record).wrap_err("Failed to serialize deployment")?;

        fs::write(&tmp_path, content)
            .wrap_err_with(|| format!("Failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)
            .wrap_err_with(|| format!("Failed to move deployment into {:?}", path))?;

        tracing::debug!("Saved deployment of {} to {:?}", record.contract_name, path);
        Ok(())
    }

    /// All records of this network, sorted by contract name
    pub fn scan(&self) -> Result<Vec<DeploymentRecord>> {
        if !self.dir.exists() {
            tracing::info!("Deployments directory does not exist: {:?}", self.dir);
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&self.dir).wrap_err_with(|| format!("Failed to read {:?}", self.dir))?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                continue;
            };

            match self.load(name) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }

        records.sort_by(|a, b| a.contract_name.cmp(&b.contract_name));
        tracing::info!("Found {} deployments in {:?}", records.len(), self.dir);
        Ok(records)
    }

    /// Get a record by address
    pub fn get_by_address(&self, address: Address) -> Result<Option<DeploymentRecord>> {
        Ok(self.scan()?.into_iter().find(|d| d.address == address))
    }
}

#[cfg(test)]
pub(crate) fn sample_record(contract_name: &str, chain_id: u64) -> DeploymentRecord {
    DeploymentRecord {
        contract_name: contract_name.to_string(),
        address: Address::repeat_byte(0x11),
        chain_id,
        deployer: Address::repeat_byte(0x22),
        receipt: ReceiptSummary {
            transaction_hash: TxHash::repeat_byte(0x33),
            block_number: Some(7),
            gas_used: 1_000_000,
            status: true,
        },
        confirmations: 1,
        constructor_args: Bytes::new(),
        bytecode_hash: B256::repeat_byte(0x44),
        abi: JsonAbi::default(),
        newly_deployed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(dir.path().join("sepolia"));

        assert!(store.load("BasicNft").unwrap().is_none());
        assert_eq!(store.chain_id().unwrap(), None);

        store.save(&sample_record("BasicNft", 11155111)).unwrap();

        let loaded = store.load("BasicNft").unwrap().unwrap();
        assert_eq!(loaded.address, Address::repeat_byte(0x11));
        assert_eq!(loaded.receipt.block_number, Some(7));
        // only meaningful within the run that produced it
        assert!(!loaded.newly_deployed);
        assert_eq!(store.chain_id().unwrap(), Some(11155111));
    }

    #[test]
    fn test_records_of_other_chains_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(dir.path());

        store.save(&sample_record("BasicNft", 1)).unwrap();

        assert!(store.ensure_chain(1).is_ok());
        assert!(store.ensure_chain(5).is_err());
        assert!(store.save(&sample_record("BasicNftTwo", 5)).is_err());
    }

    #[test]
    fn test_scan_skips_unreadable_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(dir.path());

        store.save(&sample_record("NftMarketplace", 1)).unwrap();
        store.save(&sample_record("BasicNft", 1)).unwrap();
        fs::write(dir.path().join("Broken.json"), "{").unwrap();

        let records = store.scan().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.contract_name.as_str()).collect();
        assert_eq!(names, vec!["BasicNft", "NftMarketplace"]);

        let found = store
            .get_by_address(Address::repeat_byte(0x11))
            .unwrap()
            .unwrap();
        assert_eq!(found.contract_name, "BasicNft");
    }
}
