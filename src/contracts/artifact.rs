use std::fs;
use std::path::{Path, PathBuf};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::{B256, Bytes, keccak256},
};
use eyre::{Result, WrapErr, bail};
use serde::Deserialize;
use serde_json::Value;

/// Hardhat compiler output for a single contract
/// (`artifacts/<source>/<Name>.json`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    #[serde(skip)]
    pub path: PathBuf,
}

/// The compiler run an artifact came from, needed for source verification
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard JSON compiler input
    pub input: Value,
}

/// `<Name>.dbg.json` next to every artifact
#[derive(Debug, Deserialize)]
struct DebugFile {
    #[serde(rename = "buildInfo")]
    build_info: PathBuf,
}

impl Artifact {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {:?}", path))?;

        let mut artifact: Artifact = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse artifact {:?}", path))?;

        artifact.path = path.to_path_buf();
        Ok(artifact)
    }

    /// `contracts/BasicNft.sol:BasicNft`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Hash of the creation bytecode, used to detect recompiled contracts
    pub fn bytecode_hash(&self) -> B256 {
        keccak256(&self.bytecode)
    }

    /// ABI-encode constructor arguments against this artifact's constructor
    pub fn encode_constructor(&self, args: &[DynSolValue]) -> Result<Bytes> {
        match (self.abi.constructor(), args.is_empty()) {
            (None, true) => Ok(Bytes::new()),
            (None, false) => bail!(
                "{} has no constructor but {} arguments were given",
                self.contract_name,
                args.len()
            ),
            (Some(constructor), _) => {
                let encoded = constructor
                    .abi_encode_input(args)
                    .wrap_err_with(|| {
                        format!("Invalid constructor arguments for {}", self.contract_name)
                    })?;
                Ok(encoded.into())
            }
        }
    }

    /// Creation bytecode followed by the encoded constructor arguments
    pub fn creation_code(&self, encoded_args: &Bytes) -> Result<Bytes> {
        if self.bytecode.is_empty() {
            bail!(
                "{} has no bytecode; abstract contracts and interfaces cannot be deployed",
                self.contract_name
            );
        }

        Ok(self
            .bytecode
            .iter()
            .chain(encoded_args.iter())
            .copied()
            .collect())
    }

    /// Load the build info referenced by this artifact's debug file
    pub fn build_info(&self) -> Result<BuildInfo> {
        let dbg_path = self
            .path
            .with_file_name(format!("{}.dbg.json", self.contract_name));

        let content = fs::read_to_string(&dbg_path)
            .wrap_err_with(|| format!("Failed to read {:?}", dbg_path))?;
        let dbg: DebugFile = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {:?}", dbg_path))?;

        let build_info_path = dbg_path
            .parent()
            .map(|dir| dir.join(&dbg.build_info))
            .unwrap_or(dbg.build_info);

        let content = fs::read_to_string(&build_info_path)
            .wrap_err_with(|| format!("Failed to read build info {:?}", build_info_path))?;

        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse build info {:?}", build_info_path))
    }
}
