//! Installation identity: load it, or mint and persist it once.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::store::KeyValueStore;

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Produces the stable per-installation identifier.
pub struct IdentityProvider {
    store: Arc<dyn KeyValueStore>,
    key: String,
    device: String,
}

impl IdentityProvider {
    /// Create a provider reading `key` from `store`. `device` is the host's
    /// stable device string; when blank, [`device_fingerprint`] is used.
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str, device: &str) -> Self {
        let device = device.trim();
        let device = if device.is_empty() {
            device_fingerprint()
        } else {
            device.to_string()
        };

        Self {
            store,
            key: key.to_string(),
            device,
        }
    }

    /// Storage key the identity lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Return the stored identity, generating and persisting one if the key is
    /// missing or empty.
    ///
    /// A failed write is logged; the generated value is still returned so the
    /// current process reports consistently.
    pub fn get_or_create(&self) -> String {
        if let Some(existing) = self.store.get(&self.key).filter(|v| !v.is_empty()) {
            return existing;
        }

        let id = generate_identity(&self.device);
        match self.store.set(&self.key, &id) {
            Ok(()) => debug!("Generated new player ID"),
            Err(e) => warn!("Failed to persist generated player ID: {}", e),
        }
        id
    }
}

/// `<device>_<n>` with `n` uniform in `[1000, 9999]`.
pub fn generate_identity(device: &str) -> String {
    let suffix: u16 = rand::rng().random_range(1000..=9999);
    format!("{}_{}", device, suffix)
}

/// Stable device string for this machine.
///
/// Hex SHA-256 of the OS machine id, so the raw id never leaves the host.
/// Without a readable machine id this is a random UUID, which is only stable
/// through the persisted identity built from it.
pub fn device_fingerprint() -> String {
    MACHINE_ID_PATHS
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|content| content.trim().to_string())
        .find(|id| !id.is_empty())
        .map(|id| fingerprint_machine_id(&id))
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

fn fingerprint_machine_id(machine_id: &str) -> String {
    let digest = Sha256::digest(format!("{}-presence-beacon", machine_id).as_bytes());
    hex::encode(&digest[..16])
}
