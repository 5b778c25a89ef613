// Identifier value objects

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Surrogate key a scan is attributed to for uniqueness counting.
///
/// There is no login, so "unique user" is an approximation: the explicit
/// `userId` when the client sends one, otherwise a hash of the device
/// fingerprint. Shared devices and fingerprint rotation both skew the count;
/// that error rate is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserKey(pub String);

impl UserKey {
    pub fn from_parts(user_id: Option<&str>, device_fingerprint: &str) -> Self {
        if let Some(user_id) = user_id {
            let trimmed = user_id.trim();
            if !trimmed.is_empty() {
                return UserKey(format!("u:{}", trimmed));
            }
        }
        let digest = Sha256::digest(device_fingerprint.trim().as_bytes());
        let mut hex = String::with_capacity(32);
        for byte in digest.iter().take(16) {
            hex.push_str(&format!("{:02x}", byte));
        }
        UserKey(format!("d:{}", hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
