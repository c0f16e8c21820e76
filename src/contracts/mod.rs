mod artifact;
#[cfg(test)]
mod bindings;
mod deployer;
mod deployment;
mod registry;

#[cfg(test)]
pub(crate) use artifact::fixtures as artifact_fixtures;
pub use deployer::{ChainDeployer, ContractDeployer, DeployRequest};
#[cfg(test)]
pub(crate) use deployment::sample_record;
pub use deployment::{DeploymentRecord, DeploymentStore};
pub use registry::{ArtifactRegistry, ContractId};
