//! Authenticated encryption of the database file.
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce).
//! Key size: 32 bytes.  Nonce: 24 bytes (random per write).  Tag: 16 bytes.
//!
//! Envelope wire format:
//!   [ magic "SEALDB" (6) | version (1) | nonce (24) | ciphertext + tag ]
//!
//! The 7 header bytes are bound as associated data.

use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use std::fmt;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{DbError, Result};

pub const KEY_LEN: usize = 32;
pub const MAGIC: &[u8; 6] = b"SEALDB";
pub const ENVELOPE_VERSION: u8 = 1;
pub const HEADER_LEN: usize = MAGIC.len() + 1;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;

/// Secret key for one database file. Zeroized on drop; never printed.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DatabaseKey([u8; KEY_LEN]);

impl DatabaseKey {
    /// Fresh key from the OS CSPRNG. The caller is responsible for storing it.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            DbError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// Parse the URL-safe base64 text form written by [`DatabaseKey::to_base64`].
    /// Surrounding whitespace (e.g. a trailing newline in a key file) is ignored.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            general_purpose::URL_SAFE
                .decode(encoded.trim())
                .map_err(|e| DbError::InvalidKey(format!("base64 decode: {e}")))?,
        );
        Self::from_bytes(&decoded)
    }

    pub fn to_base64(&self) -> String {
        general_purpose::URL_SAFE.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DatabaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DatabaseKey(<redacted>)")
    }
}

fn header() -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[..MAGIC.len()].copy_from_slice(MAGIC);
    out[MAGIC.len()] = ENVELOPE_VERSION;
    out
}

/// Seal `plaintext` into a self-describing envelope with a fresh random nonce.
pub fn encrypt(key: &DatabaseKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| DbError::Encryption)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut AeadOsRng);
    let header = header();

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|_| DbError::Encryption)?;

    let mut out = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open an envelope produced by [`encrypt`].
///
/// Layout problems (too short, wrong magic, unknown version) are
/// `MalformedInput`; a tag mismatch anywhere after the header is
/// `Authentication`.
pub fn decrypt(key: &DatabaseKey, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let min_len = HEADER_LEN + NONCE_LEN + TAG_LEN;
    if data.len() < min_len {
        return Err(DbError::MalformedInput(format!(
            "envelope is {} bytes, need at least {min_len}",
            data.len()
        )));
    }
    let (header_bytes, rest) = data.split_at(HEADER_LEN);
    if &header_bytes[..MAGIC.len()] != MAGIC {
        return Err(DbError::MalformedInput("invalid magic".into()));
    }
    let version = header_bytes[MAGIC.len()];
    if version != ENVELOPE_VERSION {
        return Err(DbError::MalformedInput(format!(
            "unsupported envelope version {version}"
        )));
    }

    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher =
        XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| DbError::Authentication)?;

    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: header_bytes,
            },
        )
        .map_err(|_| DbError::Authentication)?;

    Ok(Zeroizing::new(plaintext))
}
