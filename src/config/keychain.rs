use eyre::{Result, WrapErr};
use keyring::Entry;
use zeroize::Zeroizing;

const SERVICE_NAME: &str = "nft-deployer";

/// Manager for secure credential storage using the OS keychain
pub struct KeychainManager {
    service: String,
}

impl KeychainManager {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Store a secret in the keychain
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(&self.service, key)
            .wrap_err_with(|| format!("Failed to create keychain entry for {}", key))?;

        entry
            .set_password(value)
            .wrap_err_with(|| format!("Failed to store secret for {}", key))?;

        tracing::info!("Stored secret in keychain: {}", key);
        Ok(())
    }

    /// Retrieve a secret from the keychain
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, key)
            .wrap_err_with(|| format!("Failed to access keychain entry for {}", key))?;

        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).wrap_err_with(|| format!("Failed to retrieve secret for {}", key)),
        }
    }

    /// Retrieve a secret with zeroization for sensitive data
    pub fn get_zeroizing(&self, key: &str) -> Result<Option<Zeroizing<String>>> {
        self.get(key).map(|opt| opt.map(Zeroizing::new))
    }
}

impl Default for KeychainManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalise a hex private key, rejecting anything that is not 32 bytes
pub fn normalize_private_key(key: &str) -> Result<Zeroizing<String>> {
    let trimmed = key.trim();
    let clean_key = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if clean_key.len() != 64 || !clean_key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(eyre::eyre!(
            "Invalid private key format: expected 64 hex characters"
        ));
    }

    Ok(Zeroizing::new(clean_key.to_string()))
}

/// Store a private key securely under the given keychain entry
pub fn store_private_key(entry: &str, key: &str) -> Result<()> {
    let clean_key = normalize_private_key(key)?;
    KeychainManager::new().set(entry, &clean_key)
}
