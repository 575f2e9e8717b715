//! A threshold password-verification store built on Shamir's Secret Sharing
//!
//! This library binds every account's password verifier to a vault secret
//! that can only be reconstructed from a threshold of correctly entered
//! passwords. Stolen account data is useless on its own: share-masked
//! verifiers are indistinguishable from random bytes, and thresholdless
//! verifiers are encrypted under a key derived from the same secret, so not
//! even a brute-force guess can be checked until the threshold is crossed.
//!
//! ## Security Features
//!
//! - **GF(2^8) secret sharing** - Byte-wise Shamir shares over the Rijndael field
//! - **Cryptographically secure random generation** - Uses ChaCha20Rng seeded from OsRng
//! - **Constant-time verifier comparison** - Login checks never branch on secret bytes
//! - **Memory safety** - Written in safe Rust; secret buffers are zeroized on drop
//!
//! # Quick Start
//!
//! ```
//! use polypasshash::Vault;
//!
//! // Ten correct-password shares are needed to unlock stolen data.
//! let mut vault = Vault::builder(10).build().unwrap();
//!
//! // Admins hold five shares each; regular users hold one; service
//! // accounts authenticate thresholdless and consume no share space.
//! vault.create_account("admin", "correct horse", 5).unwrap();
//! vault.create_account("root", "battery staple", 5).unwrap();
//! vault.create_account("alice", "kitten", 1).unwrap();
//! vault.create_account("dennis", "menace", 0).unwrap();
//!
//! assert!(vault.is_valid_login("alice", "kitten").unwrap());
//! assert!(!vault.is_valid_login("alice", "nyancat!").unwrap());
//!
//! // Persist the account data; reloading starts locked.
//! let mut file = Vec::new();
//! vault.write_password_data(&mut file).unwrap();
//! let mut reloaded = Vault::builder(10).load(&file[..]).unwrap();
//! assert!(reloaded.is_valid_login("alice", "kitten").is_err());
//!
//! // Enough correct passwords recover the secret and unlock everything.
//! reloaded
//!     .unlock_password_data(&[("admin", "correct horse"), ("root", "battery staple")])
//!     .unwrap();
//! assert!(reloaded.is_valid_login("alice", "kitten").unwrap());
//! ```
//!
//! ## Partial Verification
//!
//! A locked vault normally cannot answer login checks at all. Storing a few
//! trailing digest bytes per verifier allows probabilistic checks while
//! locked, at a false-accept rate of about `256^-n` for `n` stored bytes:
//!
//! ```
//! use polypasshash::VaultBuilder;
//!
//! let mut vault = VaultBuilder::new(2).with_partial_bytes(2).build().unwrap();
//! vault.create_account("admin", "correct horse", 2).unwrap();
//!
//! let mut file = Vec::new();
//! vault.write_password_data(&mut file).unwrap();
//!
//! let locked = VaultBuilder::new(2).with_partial_bytes(2).load(&file[..]).unwrap();
//! assert!(locked.is_valid_login("admin", "correct horse").unwrap());
//! assert!(!locked.is_valid_login("admin", "wrong guess").unwrap());
//! ```

mod crypto;
mod error;
mod finite_field;
mod shamir;
mod storage;
mod vault;

pub use crypto::{
    Aes256Ecb, CIPHER_BLOCK_SIZE, DIGEST_SIZE, KEY_SIZE, LoginHasher, Sha256Hasher, VerifierCipher,
};
pub use error::{Result, VaultError};
pub use finite_field::FiniteField;
pub use shamir::{ShamirEngine, Share};
pub use storage::{AccountCodec, BinaryCodec};
pub use vault::{AccountMap, PasswordEntry, SALT_SIZE, Vault, VaultBuilder};

// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        AccountCodec, AccountMap, Aes256Ecb, BinaryCodec, LoginHasher, PasswordEntry, Result,
        ShamirEngine, Share, Sha256Hasher, Vault, VaultBuilder, VaultError, VerifierCipher,
    };
}
