// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Payload encryption.
//!
//! AES-256-GCM-SIV with an Argon2id-derived key. The output is a
//! self-contained envelope:
//!
//! ```text
//! [16 bytes] Argon2 salt
//! [12 bytes] AES-GCM-SIV nonce
//! [N bytes ] ciphertext + 16-byte tag
//! ```
//!
//! so the decoder needs nothing beyond the passphrase. GCM-SIV rather
//! than plain GCM because the nonce is randomly generated and travels
//! next to the ciphertext; nonce-misuse resistance is the safety margin.

use aes_gcm_siv::aead::Aead;
use aes_gcm_siv::{Aes256GcmSiv, KeyInit, Nonce};
use argon2::Argon2;
use zeroize::Zeroizing;

use super::error::StegoError;

/// AES-GCM-SIV nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Argon2 salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-GCM-SIV authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Envelope overhead beyond the plaintext length.
pub const ENVELOPE_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Derive the AES-256 key from passphrase + salt.
fn derive_key(passphrase: &str, salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
        .expect("Argon2 key derivation with fixed-length output cannot fail");
    key
}

/// Encrypt a payload into a self-contained envelope.
pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Vec<u8> {
    use rand::RngCore;
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(passphrase, &salt);
    let cipher = Aes256GcmSiv::new_from_slice(&*key).expect("valid key length");
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .expect("AES-GCM-SIV encryption of in-memory payload cannot fail");

    let mut envelope = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    envelope
}

/// Decrypt an envelope produced by [`encrypt`].
pub fn decrypt(envelope: &[u8], passphrase: &str) -> Result<Vec<u8>, StegoError> {
    if envelope.len() < ENVELOPE_OVERHEAD {
        return Err(StegoError::DecryptionFailed);
    }

    let salt = &envelope[..SALT_LEN];
    let nonce_bytes = &envelope[SALT_LEN..SALT_LEN + NONCE_LEN];
    let ciphertext = &envelope[SALT_LEN + NONCE_LEN..];

    let key = derive_key(passphrase, salt);
    let cipher = Aes256GcmSiv::new_from_slice(&*key).expect("valid key length");
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| StegoError::DecryptionFailed)
}
