use alloy::signers::local::PrivateKeySigner;
use eyre::{Result, WrapErr, bail};

use crate::config::{AppConfig, normalize_private_key};

/// Resolve the `deployer` named account to a signer.
///
/// `None` means no wallet was asked for or configured; callers fall back to
/// the node's unlocked accounts on development networks.
pub fn resolve_signer(config: &AppConfig, wallet: Option<&str>) -> Result<Option<PrivateKeySigner>> {
    let Some(name) = wallet.or(config.default_wallet()) else {
        return Ok(None);
    };

    if !config.wallets.contains_key(name) {
        bail!("Wallet {:?} is not configured", name);
    }

    let Some(key) = config.resolve_wallet_key(name)? else {
        bail!("Wallet {:?} has no private key available", name);
    };

    let clean_key = normalize_private_key(&key)?;
    let signer: PrivateKeySigner = clean_key
        .parse()
        .wrap_err("Failed to parse private key")?;

    tracing::debug!("Using wallet {:?} ({})", name, signer.address());
    Ok(Some(signer))
}
