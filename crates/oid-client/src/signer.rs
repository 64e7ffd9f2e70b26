//! Signer capability.
//!
//! The cryptographic keypair is an opaque capability from the core's point
//! of view: derive-from-seed, sign-bytes, produce-address. [`Ed25519Signer`]
//! is the shipped implementation; tests substitute their own.
//!
//! Derivation is deterministic. The optional seed path transform
//! concatenates the seed bytes with the path bytes, hashes with SHA-256,
//! and truncates to 32 bytes; without a path the seed alone is hashed.

use ed25519_dalek::{Signer as DalekSigner, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

/// Signature scheme flag prepended to serialized signatures and hashed into
/// the address.
const ED25519_FLAG: u8 = 0x00;

/// The signing capability the executor depends on.
pub trait Signer: Send + Sync {
    /// Sign a message, returning the raw signature bytes.
    fn sign(&self, message: &[u8]) -> Vec<u8>;

    /// The sender address derived from this signer's public key.
    fn address(&self) -> &str;

    /// The public key bytes.
    fn public_key(&self) -> &[u8];
}

/// Serialize a signature the way the ledger and relay expect it:
/// base64 of `flag || signature || public key`.
pub fn serialize_signature(signer: &dyn Signer, message: &[u8]) -> String {
    use base64::Engine;
    let sig = signer.sign(message);
    let mut out = Vec::with_capacity(1 + sig.len() + signer.public_key().len());
    out.push(ED25519_FLAG);
    out.extend_from_slice(&sig);
    out.extend_from_slice(signer.public_key());
    base64::engine::general_purpose::STANDARD.encode(out)
}

/// Ed25519 signer derived deterministically from a seed string.
pub struct Ed25519Signer {
    key: SigningKey,
    public: [u8; 32],
    address: String,
}

impl Ed25519Signer {
    /// Derive a signer from a seed, with an optional seed-path transform.
    pub fn from_seed(seed: &str, seed_path: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        if let Some(path) = seed_path {
            hasher.update(path.as_bytes());
        }
        let digest = hasher.finalize();
        let mut material = [0u8; 32];
        material.copy_from_slice(&digest[..32]);

        let key = SigningKey::from_bytes(&material);
        let public = key.verifying_key().to_bytes();
        let address = derive_address(&key.verifying_key());
        Self {
            key,
            public,
            address,
        }
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key.sign(message).to_bytes().to_vec()
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn public_key(&self) -> &[u8] {
        &self.public
    }
}

/// Address = 0x-prefixed hex of SHA-256(flag || public key).
fn derive_address(public: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public.to_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}
