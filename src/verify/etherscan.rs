use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr, bail};
use serde::Deserialize;

use super::{ContractVerifier, VerificationOutcome, VerificationRequest};
use crate::contracts::ArtifactRegistry;

pub const DEFAULT_API_URL: &str = "https://api.etherscan.io/v2/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_POLLS: u32 = 12;

/// Etherscan-compatible `verifysourcecode` client using the standard JSON
/// input from Hardhat's build info
pub struct EtherscanVerifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    chain_id: u64,
    registry: Arc<ArtifactRegistry>,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

impl EtherscanResponse {
    fn is_ok(&self) -> bool {
        self.status == "1"
    }

    fn already_verified(&self) -> bool {
        self.result.to_lowercase().contains("already verified")
    }
}

impl EtherscanVerifier {
    pub fn new(api_key: String, chain_id: u64, registry: Arc<ArtifactRegistry>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
            chain_id,
            registry,
            poll_interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[cfg(test)]
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    async fn submit(&self, request: &VerificationRequest) -> Result<EtherscanResponse> {
        let artifact = self.registry.get(request.contract)?;
        let build_info = artifact.build_info()?;
        let source_code = serde_json::to_string(&build_info.input)
            .wrap_err("Failed to serialize compiler input")?;

        let form = [
            ("apikey", self.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_string()),
            ("sourceCode", source_code),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", artifact.fully_qualified_name()),
            ("compilerversion", format!("v{}", build_info.solc_long_version)),
            // sic, the API expects this spelling
            ("constructorArguements", hex::encode(&request.constructor_args)),
        ];

        self.client
            .post(&self.api_url)
            .query(&[("chainid", self.chain_id)])
            .form(&form)
            .send()
            .await
            .wrap_err("Failed to reach the verification API")?
            .error_for_status()
            .wrap_err("Verification API returned an error")?
            .json()
            .await
            .wrap_err("Failed to parse verification response")
    }

    async fn check_status(&self, guid: &str) -> Result<EtherscanResponse> {
        let chain_id = self.chain_id.to_string();
        self.client
            .get(&self.api_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .wrap_err("Failed to reach the verification API")?
            .error_for_status()
            .wrap_err("Verification API returned an error")?
            .json()
            .await
            .wrap_err("Failed to parse verification status")
    }
}

impl ContractVerifier for EtherscanVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationOutcome> {
        let submitted = self.submit(request).await?;

        if submitted.already_verified() {
            return Ok(VerificationOutcome::AlreadyVerified);
        }
        if !submitted.is_ok() {
            bail!(
                "Verification of {} was rejected: {} ({})",
                request.contract,
                submitted.result,
                submitted.message
            );
        }

        let guid = submitted.result;
        tracing::info!(
            "Submitted {} at {} for verification (guid: {})",
            request.contract,
            request.address,
            guid
        );

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let status = self.check_status(&guid).await?;
            if status.already_verified() {
                return Ok(VerificationOutcome::AlreadyVerified);
            }
            if status.result.to_lowercase().contains("pending") {
                tracing::debug!("Verification of {} pending ({})", request.contract, attempt);
                continue;
            }
            if status.is_ok() {
                return Ok(VerificationOutcome::Verified);
            }

            bail!(
                "Verification of {} failed: {}",
                request.contract,
                status.result
            );
        }

        bail!(
            "Verification of {} still pending after {} checks (guid: {})",
            request.contract,
            self.max_polls,
            guid
        )
    }
}
