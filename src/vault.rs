use std::collections::BTreeMap;
use std::io::{Read, Write};

use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::RngCore;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::crypto::{
    Aes256Ecb, DIGEST_SIZE, KEY_SIZE, LoginHasher, Sha256Hasher, VerifierCipher,
    constant_time_eq, xor_bytes,
};
use crate::error::{Result, VaultError};
use crate::shamir::{ShamirEngine, Share};
use crate::storage::{AccountCodec, BinaryCodec};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// Length of the per-entry random salt in bytes
pub const SALT_SIZE: usize = 16;

/// Highest usable share number plus one; GF(256) leaves 255 nonzero indices
const SHARE_SPACE: u16 = 256;

/// One stored password verifier
///
/// `share_number` 0 marks a thresholdless entry whose body is the AES
/// ciphertext of the salted digest's first block; a nonzero number marks a
/// verifier masked by that Shamir share. In both cases `pass_hash` ends with
/// the configured number of partial-verification bytes taken from the tail of
/// the salted digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordEntry {
    /// Shamir share index backing this entry, or 0 for thresholdless
    pub share_number: u8,
    /// Random salt hashed in front of the password
    pub salt: Vec<u8>,
    /// Masked or encrypted verifier body plus the partial-verification suffix
    pub pass_hash: Vec<u8>,
}

/// Ordered mapping from username to that account's password entries
///
/// Multi-share accounts hold one entry per share, appended in increasing
/// share-number order; every entry of an account derives from the same
/// password under its own salt.
pub type AccountMap = BTreeMap<Vec<u8>, Vec<PasswordEntry>>;

/// Threshold password-verification store
///
/// Every account verifier is cryptographically bound to a vault secret that
/// can only be reconstructed from a threshold of correctly entered passwords.
/// An attacker holding the serialized account data cannot validate a single
/// guess until that threshold is crossed: masked verifiers are
/// indistinguishable from random bytes without the matching Shamir share, and
/// thresholdless verifiers are encrypted under a key derived from the same
/// secret.
///
/// A vault is in one of three states:
/// - **Fresh**: created by [`VaultBuilder::build`] with a newly generated
///   secret; unlocked, accepts accounts immediately
/// - **Loaded, locked**: created by [`VaultBuilder::load`]; only
///   partial verification (if configured) and unlocking are possible
/// - **Loaded, unlocked**: after [`unlock_password_data`](Self::unlock_password_data)
///   recovers the secret; behaves like a fresh vault
///
/// All operations are synchronous and transactional: on error no observable
/// state changes. The vault has no internal locking; callers sharing one
/// across threads must serialize access themselves.
///
/// # Example
/// ```
/// use polypasshash::Vault;
///
/// let mut vault = Vault::builder(2).build().unwrap();
/// vault.create_account("admin", "correct horse", 2).unwrap();
/// vault.create_account("guest", "kitten", 0).unwrap();
///
/// assert!(vault.is_valid_login("admin", "correct horse").unwrap());
/// assert!(!vault.is_valid_login("guest", "puppy").unwrap());
/// ```
pub struct Vault<H = Sha256Hasher, C = Aes256Ecb> {
    /// Number of partial-verification bytes appended to each verifier
    partial_bytes: u8,
    /// Username to password-entry mapping; the only persisted state
    accounts: AccountMap,
    /// Secret-sharing engine; holds no secret while locked
    shamir: ShamirEngine,
    /// Key for thresholdless verifiers; present iff unlocked
    thresholdless_key: Option<[u8; KEY_SIZE]>,
    /// Next unused share number
    next_available_share: u16,
    /// Source for salts and the fresh vault key
    rng: ChaCha20Rng,
    hasher: H,
    cipher: C,
}

/// Builder for creating or loading a [`Vault`]
///
/// # Example
/// ```
/// use polypasshash::VaultBuilder;
///
/// let vault = VaultBuilder::new(10)
///     .with_partial_bytes(2)
///     .build()
///     .unwrap();
/// assert!(vault.is_unlocked());
/// ```
#[derive(Debug)]
pub struct VaultBuilder<H = Sha256Hasher, C = Aes256Ecb> {
    threshold: u8,
    partial_bytes: u8,
    hasher: H,
    cipher: C,
}

impl VaultBuilder {
    /// Creates a builder with the default SHA-256 hasher and AES-256 cipher
    ///
    /// # Arguments
    /// * `threshold` - Number of correct-password shares required to unlock (2-255)
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            partial_bytes: 0,
            hasher: Sha256Hasher,
            cipher: Aes256Ecb,
        }
    }
}

impl<H: LoginHasher, C: VerifierCipher> VaultBuilder<H, C> {
    /// Sets how many digest bytes each verifier exposes for partial
    /// verification while locked (0-32, default 0)
    ///
    /// Each exposed byte lowers the locked-state false-accept probability by a
    /// factor of 256 and leaks the same amount of digest material to anyone
    /// holding the file.
    pub fn with_partial_bytes(mut self, partial_bytes: u8) -> Self {
        self.partial_bytes = partial_bytes;
        self
    }

    /// Replaces the salted-digest implementation
    pub fn with_hasher<H2: LoginHasher>(self, hasher: H2) -> VaultBuilder<H2, C> {
        VaultBuilder {
            threshold: self.threshold,
            partial_bytes: self.partial_bytes,
            hasher,
            cipher: self.cipher,
        }
    }

    /// Replaces the thresholdless-verifier cipher
    pub fn with_cipher<C2: VerifierCipher>(self, cipher: C2) -> VaultBuilder<H, C2> {
        VaultBuilder {
            threshold: self.threshold,
            partial_bytes: self.partial_bytes,
            hasher: self.hasher,
            cipher,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.threshold < 2 {
            return Err(VaultError::InvalidArgument(format!(
                "threshold must be at least 2, got {}",
                self.threshold
            )));
        }
        if self.partial_bytes as usize > DIGEST_SIZE {
            return Err(VaultError::InvalidArgument(format!(
                "partial verification is limited to {DIGEST_SIZE} digest bytes, got {}",
                self.partial_bytes
            )));
        }
        Ok(())
    }

    /// Builds a fresh, unlocked vault around a newly generated secret
    ///
    /// Samples a random 32-byte thresholdless key and seeds the secret-sharing
    /// engine with it.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a threshold below 2 or more than 32
    /// partial bytes.
    pub fn build(self) -> Result<Vault<H, C>> {
        self.validate()?;

        let mut rng = ChaCha20Rng::try_from_rng(&mut OsRng).unwrap();
        let mut key = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut key);
        let shamir = ShamirEngine::new(self.threshold, &key)?;

        Ok(Vault {
            partial_bytes: self.partial_bytes,
            accounts: AccountMap::new(),
            shamir,
            thresholdless_key: Some(key),
            next_available_share: 1,
            rng,
            hasher: self.hasher,
            cipher: self.cipher,
        })
    }

    /// Loads a locked vault from serialized account data
    ///
    /// Decodes with the default [`BinaryCodec`]. The loaded vault starts
    /// locked: the secret-sharing engine is empty and the thresholdless key is
    /// absent until [`Vault::unlock_password_data`] succeeds.
    ///
    /// # Errors
    /// Builder validation errors, `IoError` from the source, or
    /// `SerializationError` for data the codec rejects.
    pub fn load<R: Read>(self, source: R) -> Result<Vault<H, C>> {
        self.load_with(&BinaryCodec, source)
    }

    /// Loads a locked vault using a caller-supplied codec
    pub fn load_with<S: AccountCodec, R: Read>(
        self,
        codec: &S,
        mut source: R,
    ) -> Result<Vault<H, C>> {
        self.validate()?;

        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        let accounts = codec.decode(&buf)?;

        // Resume the counter after the highest share on record; thresholdless
        // entries (share number 0) never advance it.
        let highest = accounts
            .values()
            .flatten()
            .map(|entry| entry.share_number as u16)
            .fold(1, u16::max);

        Ok(Vault {
            partial_bytes: self.partial_bytes,
            accounts,
            shamir: ShamirEngine::empty(self.threshold)?,
            thresholdless_key: None,
            next_available_share: highest + 1,
            rng: ChaCha20Rng::try_from_rng(&mut OsRng).unwrap(),
            hasher: self.hasher,
            cipher: self.cipher,
        })
    }
}

impl Vault {
    /// Creates a builder with the default hasher and cipher
    ///
    /// # Example
    /// ```
    /// use polypasshash::Vault;
    ///
    /// let vault = Vault::builder(2).build().unwrap();
    /// assert_eq!(vault.threshold(), 2);
    /// ```
    pub fn builder(threshold: u8) -> VaultBuilder {
        VaultBuilder::new(threshold)
    }
}

impl<H: LoginHasher, C: VerifierCipher> Vault<H, C> {
    /// Returns the unlock threshold
    pub fn threshold(&self) -> u8 {
        self.shamir.threshold()
    }

    /// Returns the configured number of partial-verification bytes
    pub fn partial_bytes(&self) -> u8 {
        self.partial_bytes
    }

    /// Returns true while the vault secret is known
    pub fn is_unlocked(&self) -> bool {
        self.shamir.has_secret()
    }

    /// Returns the next unused share number
    pub fn next_available_share(&self) -> u16 {
        self.next_available_share
    }

    /// Returns the stored account map
    pub fn accounts(&self) -> &AccountMap {
        &self.accounts
    }

    /// Returns the thresholdless key while unlocked
    ///
    /// This is live secret material; callers must not persist it.
    pub fn thresholdless_key(&self) -> Option<&[u8; KEY_SIZE]> {
        self.thresholdless_key.as_ref()
    }

    fn random_salt(&mut self) -> Vec<u8> {
        let mut salt = vec![0u8; SALT_SIZE];
        self.rng.fill_bytes(&mut salt);
        salt
    }

    /// Creates an account backed by the given number of shares
    ///
    /// With `shares == 0` the account is thresholdless: its single verifier is
    /// encrypted under the vault key and consumes no share space. With a
    /// positive count the account receives that many consecutive share-masked
    /// entries and the share counter advances.
    ///
    /// The operation is all-or-nothing; on error no entry is stored and the
    /// share counter is unchanged.
    ///
    /// # Errors
    /// - `Locked` while the vault secret is unknown
    /// - `DuplicateAccount` if the username is taken
    /// - `InvalidArgument` for more than 255 shares
    /// - `ShareSpaceExhausted` if the request outruns the 255-share space
    ///
    /// # Example
    /// ```
    /// use polypasshash::Vault;
    ///
    /// let mut vault = Vault::builder(2).build().unwrap();
    /// vault.create_account("admin", "correct horse", 2).unwrap();
    /// assert_eq!(vault.next_available_share(), 3);
    /// ```
    pub fn create_account<U, P>(&mut self, username: U, password: P, shares: u16) -> Result<()>
    where
        U: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        let username = username.as_ref();
        let password = password.as_ref();

        if !self.is_unlocked() {
            return Err(VaultError::Locked);
        }
        if self.accounts.contains_key(username) {
            return Err(VaultError::DuplicateAccount);
        }
        if shares > 255 {
            return Err(VaultError::InvalidArgument(format!(
                "an account may hold at most 255 shares, got {shares}"
            )));
        }
        if shares > 0 {
            let available = SHARE_SPACE - self.next_available_share;
            if shares > available {
                return Err(VaultError::ShareSpaceExhausted {
                    requested: shares,
                    available,
                });
            }
        }

        let mut entries = Vec::new();

        if shares == 0 {
            let key = self.thresholdless_key.ok_or(VaultError::Locked)?;
            let salt = self.random_salt();
            #[cfg_attr(not(feature = "zeroize"), allow(unused_mut))]
            let mut digest = self.hasher.salted_digest(&salt, password);

            let mut pass_hash = self.cipher.encrypt_verifier(&key, &digest).to_vec();
            pass_hash.extend_from_slice(&digest[DIGEST_SIZE - self.partial_bytes as usize..]);
            entries.push(PasswordEntry {
                share_number: 0,
                salt,
                pass_hash,
            });

            #[cfg(feature = "zeroize")]
            digest.zeroize();
        } else {
            for number in self.next_available_share..self.next_available_share + shares {
                let share = self.shamir.compute_share(number as u8)?;
                let salt = self.random_salt();
                #[cfg_attr(not(feature = "zeroize"), allow(unused_mut))]
                let mut digest = self.hasher.salted_digest(&salt, password);

                // Masking with the share hides the digest until the vault
                // secret can be reconstructed.
                let mut pass_hash = xor_bytes(&digest, &share.data)?;
                pass_hash.extend_from_slice(&digest[DIGEST_SIZE - self.partial_bytes as usize..]);
                entries.push(PasswordEntry {
                    share_number: number as u8,
                    salt,
                    pass_hash,
                });

                #[cfg(feature = "zeroize")]
                digest.zeroize();
            }
            self.next_available_share += shares;
        }

        self.accounts.insert(username.to_vec(), entries);
        Ok(())
    }

    /// Checks a password against a stored account
    ///
    /// The first entry answers authoritatively; trailing entries of a
    /// multi-share account repeat the same password derivation and are never
    /// consulted by this path.
    ///
    /// While the vault is locked and partial verification is configured, the
    /// check compares only the stored digest suffix, accepting a wrong
    /// password with probability about 256^-partial_bytes.
    ///
    /// # Errors
    /// - `UnknownUser` for an absent username
    /// - `Locked` while locked with partial verification disabled
    /// - `SerializationError` / `MalformedShare` for corrupt stored entries
    ///
    /// A wrong password is reported as `Ok(false)`; errors always mean the
    /// check could not be performed at all.
    pub fn is_valid_login<U, P>(&self, username: U, password: P) -> Result<bool>
    where
        U: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        let entries = self
            .accounts
            .get(username.as_ref())
            .ok_or(VaultError::UnknownUser)?;
        if !self.is_unlocked() && self.partial_bytes == 0 {
            return Err(VaultError::Locked);
        }

        let entry = entries.first().ok_or(VaultError::UnknownUser)?;
        let digest = self.hasher.salted_digest(&entry.salt, password.as_ref());

        let partial = self.partial_bytes as usize;
        let body_len = entry.pass_hash.len().checked_sub(partial).ok_or_else(|| {
            VaultError::SerializationError(
                "password entry shorter than its partial-verification suffix".to_string(),
            )
        })?;
        let (body, suffix) = entry.pass_hash.split_at(body_len);

        if !self.is_unlocked() {
            // Locked: probabilistic check against the stored digest suffix
            return Ok(constant_time_eq(&digest[DIGEST_SIZE - partial..], suffix));
        }

        if entry.share_number == 0 {
            let key = self.thresholdless_key.as_ref().ok_or(VaultError::Locked)?;
            let expected = self.cipher.encrypt_verifier(key, &digest);
            Ok(constant_time_eq(&expected, body))
        } else {
            let candidate = Share {
                index: entry.share_number,
                data: xor_bytes(&digest, body)?,
            };
            self.shamir.is_valid_share(&candidate)
        }
    }

    /// Unlocks the vault from a set of (username, password) credentials
    ///
    /// Every share-backed entry of every named account contributes one
    /// candidate share (its stored body unmasked with the supplied password's
    /// digest); thresholdless entries contribute nothing. Recovery succeeds
    /// when at least `threshold` candidates are collected and all of them lie
    /// on one polynomial, after which the thresholdless key is available and
    /// the vault behaves like a fresh one.
    ///
    /// # Errors
    /// - `AlreadyUnlocked` if the secret is already known
    /// - `UnknownUser` for an absent username
    /// - `InsufficientShares` when the credentials carry fewer than
    ///   `threshold` shares
    /// - `InvalidShare` when any supplied password is wrong
    ///
    /// # Example
    /// ```
    /// use polypasshash::Vault;
    ///
    /// let mut vault = Vault::builder(2).build().unwrap();
    /// vault.create_account("admin", "correct horse", 2).unwrap();
    /// let mut file = Vec::new();
    /// vault.write_password_data(&mut file).unwrap();
    ///
    /// let mut reloaded = Vault::builder(2).load(&file[..]).unwrap();
    /// assert!(!reloaded.is_unlocked());
    /// reloaded
    ///     .unlock_password_data(&[("admin", "correct horse")])
    ///     .unwrap();
    /// assert!(reloaded.is_unlocked());
    /// ```
    pub fn unlock_password_data<U, P>(&mut self, credentials: &[(U, P)]) -> Result<()>
    where
        U: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        if self.is_unlocked() {
            return Err(VaultError::AlreadyUnlocked);
        }

        let mut candidates = Vec::new();
        for (username, password) in credentials {
            let entries = self
                .accounts
                .get(username.as_ref())
                .ok_or(VaultError::UnknownUser)?;

            for entry in entries {
                // Thresholdless entries carry no share
                if entry.share_number == 0 {
                    continue;
                }
                let digest = self.hasher.salted_digest(&entry.salt, password.as_ref());
                let body_len = entry
                    .pass_hash
                    .len()
                    .checked_sub(self.partial_bytes as usize)
                    .ok_or_else(|| {
                        VaultError::SerializationError(
                            "password entry shorter than its partial-verification suffix"
                                .to_string(),
                        )
                    })?;
                candidates.push(Share {
                    index: entry.share_number,
                    data: xor_bytes(&digest, &entry.pass_hash[..body_len])?,
                });
            }
        }

        self.shamir.recover_secretdata(&candidates)?;

        #[cfg_attr(not(feature = "zeroize"), allow(unused_mut))]
        let mut secret = self.shamir.secret_data().ok_or(VaultError::NotReady)?;
        let key: [u8; KEY_SIZE] = secret
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::MalformedShare)?;
        #[cfg(feature = "zeroize")]
        secret.zeroize();

        self.thresholdless_key = Some(key);
        Ok(())
    }

    /// Serializes the account map with the default [`BinaryCodec`]
    ///
    /// Only the account map is written; the threshold, the thresholdless key,
    /// and all polynomial state stay in memory.
    ///
    /// # Errors
    /// - `Undecodable` while fewer shares than the threshold have been
    ///   issued, since the resulting file could never be unlocked
    /// - `SerializationError` / `IoError` from the codec or sink
    pub fn write_password_data<W: Write>(&self, sink: W) -> Result<()> {
        self.write_password_data_with(&BinaryCodec, sink)
    }

    /// Serializes the account map using a caller-supplied codec
    pub fn write_password_data_with<S: AccountCodec, W: Write>(
        &self,
        codec: &S,
        mut sink: W,
    ) -> Result<()> {
        if self.threshold() as u16 >= self.next_available_share {
            return Err(VaultError::Undecodable {
                threshold: self.threshold(),
                issued: self.next_available_share - 1,
            });
        }

        let buf = codec.encode(&self.accounts)?;
        sink.write_all(&buf)?;
        sink.flush()?;
        Ok(())
    }
}

#[cfg(feature = "zeroize")]
impl<H, C> Drop for Vault<H, C> {
    fn drop(&mut self) {
        if let Some(key) = self.thresholdless_key.as_mut() {
            key.zeroize();
        }
    }
}
