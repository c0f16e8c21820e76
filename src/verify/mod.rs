mod etherscan;

pub use etherscan::EtherscanVerifier;

use alloy::primitives::{Address, Bytes};
use eyre::Result;

use crate::contracts::{ContractId, DeploymentRecord};

/// Source verification of one deployed contract
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub contract: ContractId,
    pub address: Address,
    /// ABI-encoded constructor arguments
    pub constructor_args: Bytes,
}

impl VerificationRequest {
    pub fn for_record(contract: ContractId, record: &DeploymentRecord) -> Self {
        Self {
            contract,
            address: record.address,
            constructor_args: record.constructor_args.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

/// Publishes contract sources to a block explorer
#[allow(async_fn_in_trait)]
pub trait ContractVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationOutcome>;
}
