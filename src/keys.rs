//! Trust-anchor public keys referenced by scopes

use std::fmt;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::constants::PUBLIC_KEY_SIZE;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    Ed25519,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey {
    pub algorithm: Algorithm,
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Rejects byte strings that are not a valid Ed25519 point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidPublicKey(format!("expected {} bytes, got {}", PUBLIC_KEY_SIZE, bytes.len()))
        })?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| Error::InvalidPublicKey(e.to_string()))?;

        Ok(Self { algorithm: Algorithm::Ed25519, bytes })
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self { algorithm: Algorithm::Ed25519, bytes: key.to_bytes() }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.algorithm {
            Algorithm::Ed25519 => write!(f, "ed25519/{}", self.to_hex()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    /// Deterministic valid key for tests.
    pub(crate) fn test_key(seed: u8) -> PublicKey {
        SigningKey::from_bytes(&[seed; 32]).verifying_key().into()
    }

    #[test]
    fn test_hex_round_trip_keeps_key() {
        let key = test_key(7);
        let parsed = PublicKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed, key);
        assert!(key.to_string().starts_with("ed25519/"));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = PublicKey::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidPublicKey(_)));
    }

    #[test]
    fn test_bad_hex_rejected() {
        assert!(PublicKey::from_hex("zz").is_err());
    }
}
