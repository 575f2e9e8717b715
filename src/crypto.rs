//! Hashing and cipher primitives behind swappable trait seams
//!
//! The vault derives every verifier from a salted SHA-256 digest and protects
//! thresholdless verifiers with AES-256. Both primitives sit behind traits so
//! a deployment can substitute its own implementations at construction time;
//! [`Sha256Hasher`] and [`Aes256Ecb`] are the defaults.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use sha2::{Digest, Sha256};

use crate::error::{Result, VaultError};

/// Length of a salted password digest in bytes (SHA-256 output size)
pub const DIGEST_SIZE: usize = 32;

/// Length of the thresholdless key in bytes (AES-256 key size)
pub const KEY_SIZE: usize = 32;

/// Length of one cipher block in bytes (AES block size)
pub const CIPHER_BLOCK_SIZE: usize = 16;

/// Derives the salted digest that every password verifier is built from
///
/// Implementations must be deterministic: the same salt and password always
/// produce the same digest, and the digest length is fixed at
/// [`DIGEST_SIZE`] bytes.
pub trait LoginHasher {
    /// Hashes `salt || password` into a fixed-size digest
    fn salted_digest(&self, salt: &[u8], password: &[u8]) -> [u8; DIGEST_SIZE];
}

/// Default hasher: SHA-256 over `salt || password`
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl LoginHasher for Sha256Hasher {
    fn salted_digest(&self, salt: &[u8], password: &[u8]) -> [u8; DIGEST_SIZE] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password);
        hasher.finalize().into()
    }
}

/// Encrypts a salted digest into a thresholdless verifier body
pub trait VerifierCipher {
    /// Produces the stored verifier body for a thresholdless entry
    fn encrypt_verifier(
        &self,
        key: &[u8; KEY_SIZE],
        digest: &[u8; DIGEST_SIZE],
    ) -> [u8; CIPHER_BLOCK_SIZE];
}

/// Default cipher: AES-256 in ECB mode over the first digest block
///
/// Only block 0 of the 32-byte digest is encrypted; the stored body is that
/// single 16-byte ciphertext. The remaining digest bytes never reach disk
/// except as the optional partial-verification suffix. ECB under a fixed key
/// means two entries with identical salt and password would produce identical
/// bodies; uniqueness rests entirely on the random per-entry salt, so this
/// construction carries no CPA-security claim.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aes256Ecb;

impl VerifierCipher for Aes256Ecb {
    fn encrypt_verifier(
        &self,
        key: &[u8; KEY_SIZE],
        digest: &[u8; DIGEST_SIZE],
    ) -> [u8; CIPHER_BLOCK_SIZE] {
        let cipher = Aes256::new(&(*key).into());
        let mut block = GenericArray::clone_from_slice(&digest[..CIPHER_BLOCK_SIZE]);
        cipher.encrypt_block(&mut block);
        block.into()
    }
}

/// Constant-time byte equality; length mismatch compares unequal
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// XORs two equal-length byte strings
///
/// The vault uses this to mask salted digests with share data and to strip
/// the mask off again at login. A length mismatch means the stored entry does
/// not carry a digest-sized body.
pub(crate) fn xor_bytes(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    if a.len() != b.len() {
        return Err(VaultError::MalformedShare);
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salted_digest_matches_sha256() {
        // SHA-256("abc"), split as salt "a" and password "bc"
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(Sha256Hasher.salted_digest(b"a", b"bc"), expected);
        assert_eq!(Sha256Hasher.salted_digest(b"ab", b"c"), expected);
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = Sha256Hasher.salted_digest(b"salt-one________", b"password");
        let b = Sha256Hasher.salted_digest(b"salt-two________", b"password");
        assert_ne!(a, b);
    }

    #[test]
    fn test_encrypt_verifier_fips197_vector() {
        // FIPS-197 AES-256 example: only the first digest block is encrypted
        let key: [u8; KEY_SIZE] = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b,
            0x1c, 0x1d, 0x1e, 0x1f,
        ];
        let mut digest = [0u8; DIGEST_SIZE];
        digest[..CIPHER_BLOCK_SIZE].copy_from_slice(&[
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ]);
        let expected = [
            0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b, 0x49,
            0x60, 0x89,
        ];
        assert_eq!(Aes256Ecb.encrypt_verifier(&key, &digest), expected);

        // The second half of the digest never reaches the ciphertext
        digest[CIPHER_BLOCK_SIZE..].fill(0xFF);
        assert_eq!(Aes256Ecb.encrypt_verifier(&key, &digest), expected);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"same bytes", b"same bytes"));
        assert!(!constant_time_eq(b"same bytes", b"other data"));
        assert!(!constant_time_eq(b"short", b"longer slice"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_xor_bytes() {
        let masked = xor_bytes(&[0x0F, 0xF0, 0xAA], &[0xFF, 0xFF, 0xAA]).unwrap();
        assert_eq!(masked, vec![0xF0, 0x0F, 0x00]);
        assert!(matches!(
            xor_bytes(&[1, 2], &[1, 2, 3]),
            Err(VaultError::MalformedShare)
        ));
    }
}
