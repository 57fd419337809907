use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hex of the first 16 bytes of the SHA-256, used as a short content id.
pub fn short_id(data: &[u8]) -> String {
    hex::encode(&sha256(data)[..16])
}
