//! Encryption and integrity checking for the persisted collection.
//!
//! Wire format of a sealed value:
//!   `base64( nonce_12 || ciphertext ) || hex( sha256( plaintext ) )`
//!
//! ChaCha20-Poly1305 with a random 12-byte nonce per seal; the cipher key is
//! the SHA-256 digest of the configured secret string. The trailing digest
//! covers the plaintext serialization so tampering with either half of the
//! stored value fails the load.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use error::TrackerError;
use sha2::{Digest, Sha256};

/// Length of the trailing hex-encoded SHA-256 digest.
pub const DIGEST_LEN: usize = 64;

const NONCE_LEN: usize = 12;

/// Seals and opens the serialized achievement collection.
pub struct PersistenceCodec {
    cipher: ChaCha20Poly1305,
}

impl PersistenceCodec {
    /// Creates a codec keyed by the SHA-256 digest of `secret`.
    pub fn new(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        }
    }

    /// Encrypts `plaintext` and appends the integrity digest.
    pub fn seal(&self, plaintext: &str) -> Result<String, TrackerError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| TrackerError::Serialization("AEAD encrypt failed".into()))?;

        let mut payload = nonce_bytes.to_vec();
        payload.extend_from_slice(&ciphertext);

        let mut sealed = STANDARD.encode(payload);
        sealed.push_str(&hex::encode(Sha256::digest(plaintext.as_bytes())));
        Ok(sealed)
    }

    /// Decrypts a sealed value and verifies its integrity digest.
    pub fn open(&self, sealed: &str) -> Result<String, TrackerError> {
        if sealed.len() <= DIGEST_LEN || !sealed.is_ascii() {
            return Err(TrackerError::MalformedData(
                "stored value is too short to contain a digest".into(),
            ));
        }

        let (encoded, digest) = sealed.split_at(sealed.len() - DIGEST_LEN);
        let payload = STANDARD
            .decode(encoded)
            .map_err(|_| TrackerError::MalformedData("ciphertext is not valid base64".into()))?;
        if payload.len() < NONCE_LEN {
            return Err(TrackerError::MalformedData("ciphertext is truncated".into()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| TrackerError::DecryptFailed)?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| TrackerError::MalformedData("plaintext is not valid UTF-8".into()))?;

        if digest != hex::encode(Sha256::digest(plaintext.as_bytes())) {
            return Err(TrackerError::IntegrityCheckFailed);
        }
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let codec = PersistenceCodec::new("test-secret");
        let sealed = codec.seal(r#"[{"id":"move"}]"#).expect("seal");
        assert_eq!(codec.open(&sealed).expect("open"), r#"[{"id":"move"}]"#);
    }

    #[test]
    fn sealed_value_ends_with_plaintext_digest() {
        let codec = PersistenceCodec::new("test-secret");
        let sealed = codec.seal("hello").expect("seal");
        let digest = &sealed[sealed.len() - DIGEST_LEN..];
        assert_eq!(digest, hex::encode(Sha256::digest(b"hello")));
    }

    #[test]
    fn flipping_one_character_fails_the_load() {
        let codec = PersistenceCodec::new("test-secret");
        let sealed = codec.seal("some achievement data").expect("seal");

        // Flip a character in the digest half.
        let mut tampered = sealed.clone();
        let last = tampered.pop().expect("non-empty");
        tampered.push(if last == '0' { '1' } else { '0' });
        assert!(matches!(
            codec.open(&tampered),
            Err(TrackerError::IntegrityCheckFailed) | Err(TrackerError::DecryptFailed)
        ));

        // Flip a character in the ciphertext half.
        let mut tampered: Vec<char> = sealed.chars().collect();
        tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();
        assert!(codec.open(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_fails_to_decrypt() {
        let sealed = PersistenceCodec::new("right").seal("data").expect("seal");
        assert!(matches!(
            PersistenceCodec::new("wrong").open(&sealed),
            Err(TrackerError::DecryptFailed)
        ));
    }

    #[test]
    fn short_or_garbage_values_are_malformed() {
        let codec = PersistenceCodec::new("secret");
        assert!(matches!(codec.open(""), Err(TrackerError::MalformedData(_))));
        assert!(matches!(codec.open("reset"), Err(TrackerError::MalformedData(_))));
        let garbage = format!("!!not-base64!!{}", "0".repeat(DIGEST_LEN));
        assert!(matches!(codec.open(&garbage), Err(TrackerError::MalformedData(_))));
    }
}
