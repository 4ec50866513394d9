//! Credential issuance for newly created admins.
//!
//! Generates a one-time secret and its stored Argon2 form. The secret is
//! delivered to the new admin through the notification collaborator and
//! zeroized on drop; only the hash is persisted.

use crate::error::Fault;
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Entropy of a generated secret, in bytes.
const SECRET_BYTES: usize = 24;

/// A freshly generated plaintext secret, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct GeneratedSecret(String);

impl GeneratedSecret {
    /// Borrow the plaintext for hashing or delivery.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Generate a new random secret.
pub fn generate_secret() -> GeneratedSecret {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let secret = URL_SAFE_NO_PAD.encode(bytes);
    bytes.zeroize();
    GeneratedSecret(secret)
}

/// Hash a secret into its stored form using Argon2.
pub fn hash_secret(secret: &str) -> Result<String, Fault> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| Fault::Credential(e.to_string()))?;
    Ok(hash.to_string())
}
