use dialoguer::{Confirm, Input, Password};
use eyre::{Result, WrapErr};

use crate::config::{AppConfig, Defaults, KeychainManager, NetworkConfig, WalletConfig};
use crate::network::chain_id_to_network;

/// Keychain entry holding the shared Etherscan key
const ETHERSCAN_ENTRY: &str = "etherscan_api";

/// Interactive setup of a network, a deployer wallet and the Etherscan key
pub fn run_setup(config: &mut AppConfig) -> Result<()> {
    println!("\n┌─────────────────────────────────────────┐");
    println!("│        nft-deployer - Setup             │");
    println!("└─────────────────────────────────────────┘\n");

    if config.networks.is_empty() || prompt_yes_no("Add a network?", false)? {
        setup_network(config)?;
    }

    if config.wallets.is_empty() || prompt_yes_no("Add a deployer wallet?", false)? {
        setup_wallet(config)?;
    }

    println!("\n── Optional: Etherscan API Key ──");
    println!("An Etherscan API key enables contract verification.");
    if prompt_yes_no("Add Etherscan API key?", false)? {
        setup_etherscan(config)?;
    }

    config.save().wrap_err("Failed to save configuration")?;

    println!("\n✓ Configuration saved successfully!");
    println!(
        "  Config file: {}",
        config
            .config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );

    Ok(())
}

fn setup_network(config: &mut AppConfig) -> Result<()> {
    println!("── Network Configuration ──\n");

    let name: String = Input::new()
        .with_prompt("Network name (e.g., sepolia, mainnet)")
        .interact_text()?;

    let rpc_url: String = Input::new()
        .with_prompt(format!("RPC URL for {}", name))
        .validate_with(|input: &String| {
            if input.starts_with("http://")
                || input.starts_with("https://")
                || input.starts_with("ws://")
                || input.starts_with("wss://")
            {
                Ok(())
            } else {
                Err("URL must start with http(s):// or ws(s)://")
            }
        })
        .interact_text()?;

    let chain_id = prompt_chain_id(&name)?;

    config.networks.insert(
        name.clone(),
        NetworkConfig {
            rpc_url,
            chain_id: Some(chain_id),
            ..Default::default()
        },
    );

    let defaults = config.defaults.get_or_insert_with(Defaults::default);
    if defaults.network.is_none() {
        defaults.network = Some(name.clone());
    }

    println!("\n✓ Network '{}' configured", name);
    Ok(())
}

fn setup_wallet(config: &mut AppConfig) -> Result<()> {
    println!("── Wallet Configuration ──\n");
    println!("Your private key will be stored securely in the system keychain.");
    println!("It will NEVER be written to any config file.\n");

    let name: String = Input::new()
        .with_prompt("Wallet name")
        .default("deployer".to_string())
        .interact_text()?;

    let private_key = Password::new()
        .with_prompt("Private key (with or without 0x prefix)")
        .interact()?;

    let keychain_key = format!("wallet_{}", name);
    crate::config::store_private_key(&keychain_key, &private_key)
        .wrap_err("Failed to store private key in keychain")?;

    config.wallets.insert(
        name.clone(),
        WalletConfig {
            keychain: Some(keychain_key),
            env_var: None,
            label: Some(format!("{} wallet", name)),
        },
    );

    let defaults = config.defaults.get_or_insert_with(Defaults::default);
    if defaults.wallet.is_none() {
        defaults.wallet = Some(name.clone());
    }

    println!(
        "\n✓ Wallet '{}' configured and stored in system keychain",
        name
    );
    Ok(())
}

fn setup_etherscan(config: &mut AppConfig) -> Result<()> {
    println!("  Get one at: https://etherscan.io/myapikey");
    let api_key = Password::new().with_prompt("API key").interact()?;

    KeychainManager::new()
        .set(ETHERSCAN_ENTRY, api_key.trim())
        .wrap_err("Failed to store API key in keychain")?;

    config
        .api_keys
        .insert("etherscan".to_string(), format!("keychain:{}", ETHERSCAN_ENTRY));

    println!("\n✓ Etherscan API key stored in system keychain");
    Ok(())
}

fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(eyre::Error::from)
}

fn prompt_chain_id(network_name: &str) -> Result<u64> {
    // Try to guess chain ID from network name
    let suggested = [1, 11155111, 17000, 137, 80002, 42161, 10, 8453]
        .into_iter()
        .find(|&id| chain_id_to_network(id) == network_name.to_lowercase());

    let mut input = Input::<u64>::new().with_prompt("Chain ID");
    if let Some(id) = suggested {
        input = input.default(id);
    }

    input.interact_text().map_err(eyre::Error::from)
}
