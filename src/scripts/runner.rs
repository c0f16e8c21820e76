use std::collections::BTreeMap;

use alloy::primitives::Address;
use eyre::Result;

use super::DeployScript;
use crate::config::DeployConfig;
use crate::contracts::{ContractDeployer, ContractId, DeployRequest, DeploymentRecord};
use crate::network::NetworkDescriptor;
use crate::verify::{ContractVerifier, VerificationOutcome, VerificationRequest};

const SEPARATOR: &str = "---------------------------------------------";

/// Where a script currently is in its deploy/verify sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptPhase {
    #[default]
    Idle,
    Deploying,
    Verifying,
    Done,
}

/// Runs deploy scripts one after another against a single network.
///
/// A contract is deployed at most once per runner; later requests for it get
/// the record from the first deployment.
pub struct ScriptRunner<'a, D, V> {
    config: &'a DeployConfig,
    network: &'a NetworkDescriptor,
    account: Address,
    deployer: D,
    verifier: V,
    phase: ScriptPhase,
    deployed: BTreeMap<ContractId, DeploymentRecord>,
}

impl<'a, D, V> ScriptRunner<'a, D, V>
where
    D: ContractDeployer,
    V: ContractVerifier,
{
    pub fn new(
        config: &'a DeployConfig,
        network: &'a NetworkDescriptor,
        account: Address,
        deployer: D,
        verifier: V,
    ) -> Self {
        Self {
            config,
            network,
            account,
            deployer,
            verifier,
            phase: ScriptPhase::Idle,
            deployed: BTreeMap::new(),
        }
    }

    pub fn phase(&self) -> ScriptPhase {
        self.phase
    }

    /// Run `scripts` in order, returning every record they produced.
    ///
    /// The first failed deployment stops the run.
    pub async fn run(&mut self, scripts: &[&DeployScript]) -> Result<Vec<DeploymentRecord>> {
        let mut records = Vec::new();
        for script in scripts {
            records.extend(self.run_script(script).await?);
        }
        Ok(records)
    }

    async fn run_script(&mut self, script: &DeployScript) -> Result<Vec<DeploymentRecord>> {
        self.transition(script, ScriptPhase::Idle);
        tracing::info!("{}", SEPARATOR);

        let confirmations = self.config.confirmations(&self.network.name);
        self.transition(script, ScriptPhase::Deploying);

        let mut records = Vec::with_capacity(script.contracts.len());
        for &contract in script.contracts {
            records.push(self.deploy_once(contract, confirmations).await?);
        }

        if self.config.should_verify(&self.network.name) {
            self.transition(script, ScriptPhase::Verifying);
            tracing::info!("Verifying...");

            for (&contract, record) in script.contracts.iter().zip(&records) {
                if record.newly_deployed {
                    self.verify(contract, record).await;
                } else {
                    tracing::debug!("Skipping verification of unchanged {}", contract);
                }
            }
        }

        self.transition(script, ScriptPhase::Done);
        tracing::info!("{}", SEPARATOR);
        Ok(records)
    }

    async fn deploy_once(
        &mut self,
        contract: ContractId,
        confirmations: u64,
    ) -> Result<DeploymentRecord> {
        if let Some(existing) = self.deployed.get(&contract) {
            tracing::info!("{} already deployed in this run at {}", contract, existing.address);
            return Ok(DeploymentRecord {
                newly_deployed: false,
                ..existing.clone()
            });
        }

        let request = DeployRequest {
            contract,
            from: self.account,
            args: contract.constructor_args(),
            confirmations,
        };
        let record = self.deployer.deploy(&request).await?;

        self.deployed.insert(contract, record.clone());
        Ok(record)
    }

    /// Verification never fails the run; problems are logged
    async fn verify(&self, contract: ContractId, record: &DeploymentRecord) {
        let request = VerificationRequest::for_record(contract, record);
        match self.verifier.verify(&request).await {
            Ok(VerificationOutcome::Verified) => {
                tracing::info!("Verified {} at {}", contract, record.address);
            }
            Ok(VerificationOutcome::AlreadyVerified) => {
                tracing::info!("{} at {} is already verified", contract, record.address);
            }
            Err(e) => {
                tracing::warn!("Verification of {} at {} failed: {:#}", contract, record.address, e);
            }
        }
    }

    fn transition(&mut self, script: &DeployScript, next: ScriptPhase) {
        tracing::debug!("{}: {:?} -> {:?}", script.name, self.phase, next);
        self.phase = next;
    }
}
