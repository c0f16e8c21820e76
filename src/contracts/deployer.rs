use std::sync::Arc;
use std::time::Duration;

use alloy::{
    dyn_abi::DynSolValue,
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use eyre::{Result, WrapErr, bail, eyre};

use super::artifact::Artifact;
use super::deployment::{DeploymentRecord, DeploymentStore, ReceiptSummary};
use super::registry::{ArtifactRegistry, ContractId};

const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Give up on a transaction that is not mined within this many receipt checks
const MAX_RECEIPT_POLLS: u32 = 600;

/// A single contract deployment to perform
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub contract: ContractId,
    pub from: Address,
    pub args: Vec<DynSolValue>,
    pub confirmations: u64,
}

/// Publishes contracts and waits until they are confirmed
#[allow(async_fn_in_trait)]
pub trait ContractDeployer {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeploymentRecord>;
}

/// Deploys artifacts through an RPC provider and records them in a
/// [`DeploymentStore`].
pub struct ChainDeployer {
    provider: DynProvider,
    registry: Arc<ArtifactRegistry>,
    store: DeploymentStore,
    chain_id: u64,
    poll_interval: Duration,
}

impl ChainDeployer {
    pub fn new(
        provider: DynProvider,
        registry: Arc<ArtifactRegistry>,
        store: DeploymentStore,
        chain_id: u64,
    ) -> Self {
        Self {
            provider,
            registry,
            store,
            chain_id,
            poll_interval: POLL_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The stored deployment, if it was made from the same bytecode and
    /// arguments and the transaction that created it is still on chain.
    async fn reusable(
        &self,
        artifact: &Artifact,
        constructor_args: &Bytes,
    ) -> Result<Option<DeploymentRecord>> {
        let Some(existing) = self.store.load(&artifact.contract_name)? else {
            return Ok(None);
        };

        if existing.chain_id != self.chain_id
            || existing.bytecode_hash != artifact.bytecode_hash()
            || existing.constructor_args != *constructor_args
        {
            return Ok(None);
        }

        // the recorded transaction must still be the one that created the
        // contract at the recorded address
        let receipt = self
            .provider
            .get_transaction_receipt(existing.receipt.transaction_hash)
            .await
            .wrap_err("Failed to fetch deployment receipt")?;
        let created = receipt.as_ref().and_then(|r| r.contract_address);
        if created != Some(existing.address) {
            tracing::warn!(
                "Recorded deployment of {} (tx: {}) is not on chain, redeploying",
                artifact.contract_name,
                existing.receipt.transaction_hash
            );
            return Ok(None);
        }

        let code = self
            .provider
            .get_code_at(existing.address)
            .await
            .wrap_err("Failed to fetch contract code")?;
        if code.is_empty() {
            tracing::warn!(
                "No code at recorded address {} for {}, redeploying",
                existing.address,
                artifact.contract_name
            );
            return Ok(None);
        }

        Ok(Some(DeploymentRecord {
            newly_deployed: false,
            ..existing
        }))
    }

    /// Poll until `tx_hash` is mined
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        for _ in 0..MAX_RECEIPT_POLLS {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .wrap_err_with(|| format!("Failed to fetch receipt of {}", tx_hash))?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        bail!(
            "Transaction {} was not mined after {} checks",
            tx_hash,
            MAX_RECEIPT_POLLS
        )
    }

    /// Poll until the block `mined` is `confirmations` deep, returning the
    /// depth observed
    async fn wait_for_confirmations(&self, mined: u64, confirmations: u64) -> Result<u64> {
        loop {
            let latest = self
                .provider
                .get_block_number()
                .await
                .wrap_err("Failed to fetch block number")?;
            let observed = if latest >= mined { latest - mined + 1 } else { 0 };
            if observed >= confirmations {
                return Ok(observed);
            }

            tracing::debug!("{} of {} confirmations", observed, confirmations);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl ContractDeployer for ChainDeployer {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeploymentRecord> {
        let artifact = self.registry.get(request.contract)?;
        let constructor_args = artifact.encode_constructor(&request.args)?;

        if let Some(record) = self.reusable(artifact, &constructor_args).await? {
            tracing::info!(
                "reusing \"{}\" at {}",
                artifact.contract_name,
                record.address
            );
            return Ok(record);
        }

        let code = artifact.creation_code(&constructor_args)?;
        let tx = TransactionRequest::default()
            .with_from(request.from)
            .with_deploy_code(code);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .wrap_err_with(|| format!("Failed to send deployment of {}", request.contract))?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(
            "deploying \"{}\" (tx: {}), waiting for {} confirmation(s)...",
            artifact.contract_name,
            tx_hash,
            request.confirmations
        );

        let receipt = self.wait_for_receipt(tx_hash).await?;

        if !receipt.status() {
            bail!(
                "Deployment of {} reverted (tx: {})",
                request.contract,
                tx_hash
            );
        }

        let address = receipt
            .contract_address
            .ok_or_else(|| eyre!("Receipt of {} has no contract address", tx_hash))?;
        let mined = receipt
            .block_number
            .ok_or_else(|| eyre!("Receipt of {} has no block number", tx_hash))?;

        let confirmations = self
            .wait_for_confirmations(mined, request.confirmations)
            .await?;

        tracing::info!(
            "deployed \"{}\" at {} with {} gas",
            artifact.contract_name,
            address,
            receipt.gas_used
        );

        let record = DeploymentRecord {
            contract_name: artifact.contract_name.clone(),
            address,
            chain_id: self.chain_id,
            deployer: request.from,
            receipt: ReceiptSummary {
                transaction_hash: receipt.transaction_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
                status: true,
            },
            confirmations,
            constructor_args,
            bytecode_hash: artifact.bytecode_hash(),
            abi: artifact.abi.clone(),
            newly_deployed: true,
        };

        self.store.save(&record)?;
        Ok(record)
    }
}
