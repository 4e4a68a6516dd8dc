use std::fs;
use std::path::PathBuf;

use log::{debug, warn};

use crate::auth::ApiKey;
use crate::error::{PiqDashError, Result};

/// Directory under the platform config dir holding piqdash state.
const NAMESPACE: &str = "piqdash";

/// File name of the stored credential, kept from the original product's
/// storage key.
const CREDENTIAL_FILE: &str = "piq_api_key";

/// File-backed storage for the API key.
///
/// One instance per process; the path is injected so tests can point it at
/// a temporary directory. `load` and `clear` never fail: read errors
/// degrade to an absent credential and a missing file is fine to clear.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store rooted at the fixed namespace under the platform config dir.
    pub fn open_default() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PiqDashError::Config("No config directory available".to_string()))?;
        Ok(Self::new(config_dir.join(NAMESPACE).join(CREDENTIAL_FILE)))
    }

    /// Persist the key, overwriting any prior value.
    pub fn save(&self, key: &ApiKey) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, key.as_str())?;
        debug!("credential saved to {}", self.path.display());
        Ok(())
    }

    /// The persisted key, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<ApiKey> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read credential file: {e}");
                return None;
            }
        };

        let token = contents.trim();
        if token.is_empty() {
            return None;
        }
        Some(ApiKey::from(token))
    }

    /// Remove the persisted key unconditionally.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("credential cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove credential file: {e}"),
        }
    }
}
