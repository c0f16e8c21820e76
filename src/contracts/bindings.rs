use alloy::sol;

sol! {
    /// Minimal ERC-721 used to exercise the marketplace
    #[sol(rpc)]
    interface BasicNft {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function mintNft() external returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function getTokenCounter() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolCall;

    use super::*;

    #[test]
    fn test_call_signatures() {
        assert_eq!(BasicNft::mintNftCall::SIGNATURE, "mintNft()");
        assert_eq!(BasicNft::getTokenCounterCall::SIGNATURE, "getTokenCounter()");
        assert_eq!(BasicNft::ownerOfCall::SIGNATURE, "ownerOf(uint256)");
        // ERC-721 selector
        assert_eq!(BasicNft::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    }
}

/// End-to-end checks against a local Anvil node. They need `anvil` on the
/// PATH and `NFT_DEPLOYER_ARTIFACTS` pointing at a compiled Hardhat
/// `artifacts/` directory.
#[cfg(test)]
mod anvil_tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use alloy::{
        network::EthereumWallet,
        node_bindings::{Anvil, AnvilInstance},
        primitives::{Address, U256},
        providers::{DynProvider, Provider, ProviderBuilder},
        signers::local::PrivateKeySigner,
    };
    use tempfile::TempDir;

    use super::BasicNft;
    use crate::config::{DeployConfig, DeploySettings};
    use crate::contracts::{ArtifactRegistry, ChainDeployer, DeploymentRecord, DeploymentStore};
    use crate::network::NetworkDescriptor;
    use crate::scripts::{SCRIPTS, ScriptRunner, select};
    use crate::verify::EtherscanVerifier;

    struct Fixture {
        anvil: AnvilInstance,
        store_dir: TempDir,
        registry: Arc<ArtifactRegistry>,
        provider: DynProvider,
        deployer: Address,
    }

    impl Fixture {
        fn new() -> Self {
            let artifacts = std::env::var("NFT_DEPLOYER_ARTIFACTS")
                .map(PathBuf::from)
                .expect("NFT_DEPLOYER_ARTIFACTS must point at compiled Hardhat artifacts");

            let anvil = Anvil::new().try_spawn().unwrap();
            let signer: PrivateKeySigner = anvil.keys()[0].clone().into();
            let deployer = signer.address();
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(anvil.endpoint_url())
                .erased();

            Self {
                registry: Arc::new(ArtifactRegistry::load(&artifacts).unwrap()),
                store_dir: tempfile::tempdir().unwrap(),
                anvil,
                provider,
                deployer,
            }
        }

        /// Run the `basicNft` deploy script, like `deployments.fixture(["basicNft"])`
        async fn deploy_basic_nft(&self) -> Vec<DeploymentRecord> {
            let chain_id = self.anvil.chain_id();
            let config = DeployConfig::new(&DeploySettings::default(), None);
            let network = NetworkDescriptor::new("localhost", chain_id, &config);

            let deployer = ChainDeployer::new(
                self.provider.clone(),
                self.registry.clone(),
                DeploymentStore::new(self.store_dir.path()),
                chain_id,
            );
            let verifier =
                EtherscanVerifier::new(String::new(), chain_id, self.registry.clone()).unwrap();

            let scripts = select(SCRIPTS, &["basicNft".to_string()]).unwrap();
            let mut runner = ScriptRunner::new(&config, &network, self.deployer, deployer, verifier);
            runner.run(&scripts).await.unwrap()
        }

        async fn basic_nft(&self) -> BasicNft::BasicNftInstance<DynProvider> {
            let records = self.deploy_basic_nft().await;
            BasicNft::new(records[0].address, self.provider.clone())
        }
    }

    #[tokio::test]
    #[ignore = "requires anvil and compiled contracts"]
    async fn test_constructor_initialises_contract() {
        let fixture = Fixture::new();
        let nft = fixture.basic_nft().await;

        assert_eq!(nft.name().call().await.unwrap(), "Doggie");
        assert_eq!(nft.symbol().call().await.unwrap(), "DOG");
        assert_eq!(nft.getTokenCounter().call().await.unwrap(), U256::ZERO);
    }

    #[tokio::test]
    #[ignore = "requires anvil and compiled contracts"]
    async fn test_mint_updates_counter_and_uri() {
        let fixture = Fixture::new();
        let nft = fixture.basic_nft().await;

        nft.mintNft()
            .send()
            .await
            .unwrap()
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .unwrap();

        assert_eq!(nft.getTokenCounter().call().await.unwrap(), U256::from(1));
        assert!(!nft.tokenURI(U256::ZERO).call().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires anvil and compiled contracts"]
    async fn test_mint_assigns_token_to_minter() {
        let fixture = Fixture::new();
        let nft = fixture.basic_nft().await;

        nft.mintNft()
            .send()
            .await
            .unwrap()
            .get_receipt()
            .await
            .unwrap();

        assert_eq!(
            nft.balanceOf(fixture.deployer).call().await.unwrap(),
            U256::from(1)
        );
        assert_eq!(
            nft.ownerOf(U256::ZERO).call().await.unwrap(),
            fixture.deployer
        );
    }

    #[tokio::test]
    #[ignore = "requires anvil and compiled contracts"]
    async fn test_rerun_reuses_unchanged_deployments() {
        let fixture = Fixture::new();

        let first = fixture.deploy_basic_nft().await;
        let block = fixture.provider.get_block_number().await.unwrap();
        let second = fixture.deploy_basic_nft().await;

        assert_eq!(first.len(), 2);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.address, b.address);
            assert!(a.newly_deployed);
            assert!(!b.newly_deployed);
        }
        assert_eq!(fixture.provider.get_block_number().await.unwrap(), block);
    }
}
