//! PII protection for KYC records
//!
//! Legal name and date of birth are encrypted before they reach the
//! repository. Ciphertext layout is `hex(nonce || AES-256-GCM ciphertext)`.

use crate::error::{ComplianceError, Result};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};

const NONCE_LEN: usize = 12;

/// Reversible protection applied to PII fields before persistence
pub trait PiiCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// AES-256-GCM field cipher
pub struct AesGcmPiiCipher {
    cipher: Aes256Gcm,
}

impl AesGcmPiiCipher {
    pub fn new(master_key: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(master_key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Build from a 64-character hex key, e.g. read from a secrets store
    pub fn from_hex_key(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| ComplianceError::Crypto(format!("Invalid key encoding: {}", e)))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ComplianceError::Crypto("PII key must be 32 bytes".to_string()))?;
        Ok(Self::new(&key))
    }
}

impl PiiCipher for AesGcmPiiCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let encrypted = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| ComplianceError::Crypto(e.to_string()))?;

        let mut data = Vec::with_capacity(NONCE_LEN + encrypted.len());
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&encrypted);

        Ok(hex::encode(data))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let data = hex::decode(ciphertext).map_err(|e| {
            ComplianceError::Crypto(format!("Invalid ciphertext encoding: {}", e))
        })?;

        if data.len() < NONCE_LEN {
            return Err(ComplianceError::Crypto("Invalid encrypted data".to_string()));
        }

        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);
        let decrypted = self
            .cipher
            .decrypt(nonce, &data[NONCE_LEN..])
            .map_err(|e| ComplianceError::Crypto(e.to_string()))?;

        String::from_utf8(decrypted)
            .map_err(|e| ComplianceError::Crypto(format!("Invalid UTF-8: {}", e)))
    }
}

/// Identity cipher for development and tests. Never use in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextPiiCipher;

impl PiiCipher for PlaintextPiiCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_hides_plaintext() {
        let cipher = AesGcmPiiCipher::new(&[7u8; 32]);
        let encrypted = cipher.encrypt("Jane Doe").unwrap();

        assert!(!encrypted.contains("Jane"));
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "Jane Doe");
    }

    #[test]
    fn test_nonce_is_random() {
        let cipher = AesGcmPiiCipher::new(&[7u8; 32]);
        assert_ne!(
            cipher.encrypt("1990-01-01").unwrap(),
            cipher.encrypt("1990-01-01").unwrap()
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = AesGcmPiiCipher::new(&[1u8; 32])
            .encrypt("Jane Doe")
            .unwrap();
        let other = AesGcmPiiCipher::new(&[2u8; 32]);

        assert!(matches!(
            other.decrypt(&encrypted),
            Err(ComplianceError::Crypto(_))
        ));
    }

    #[test]
    fn test_hex_key() {
        assert!(AesGcmPiiCipher::from_hex_key(&"ab".repeat(32)).is_ok());
        assert!(AesGcmPiiCipher::from_hex_key("abcd").is_err());
    }
}
