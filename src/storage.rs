use crate::error::{Result, VaultError};
use crate::vault::AccountMap;

const MAGIC_NUMBER: &[u8] = b"PPV1";
const VERSION: u8 = 1;

/// Trait defining the serialization seam for vault account data
///
/// Implement this trait to persist the account map through a custom encoding.
/// A codec round-trips the map byte-for-byte; it never sees the threshold,
/// the thresholdless key, or any polynomial state, since those are not part
/// of the map.
///
/// # Example
/// ```
/// use polypasshash::{AccountCodec, AccountMap};
///
/// struct NullCodec;
///
/// impl AccountCodec for NullCodec {
///     fn encode(&self, _: &AccountMap) -> polypasshash::Result<Vec<u8>> { Ok(Vec::new()) }
///     fn decode(&self, _: &[u8]) -> polypasshash::Result<AccountMap> { Ok(AccountMap::new()) }
/// }
/// ```
pub trait AccountCodec {
    /// Encodes the account map into a byte stream
    fn encode(&self, accounts: &AccountMap) -> Result<Vec<u8>>;

    /// Decodes an account map from a byte stream
    fn decode(&self, bytes: &[u8]) -> Result<AccountMap>;
}

/// Default binary codec for vault files
///
/// The stream starts with a magic number and a version byte to prevent format
/// confusion, followed by a bincode encoding of the account map. The map is a
/// `BTreeMap`, so the payload is deterministic for equal contents.
///
/// # Example
/// ```
/// use polypasshash::{AccountCodec, AccountMap, BinaryCodec, PasswordEntry};
///
/// let mut accounts = AccountMap::new();
/// accounts.insert(
///     b"alice".to_vec(),
///     vec![PasswordEntry { share_number: 1, salt: vec![0; 16], pass_hash: vec![0; 32] }],
/// );
///
/// let encoded = BinaryCodec.encode(&accounts).unwrap();
/// assert_eq!(BinaryCodec.decode(&encoded).unwrap(), accounts);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCodec;

impl AccountCodec for BinaryCodec {
    fn encode(&self, accounts: &AccountMap) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC_NUMBER);
        buf.push(VERSION);

        let payload = bincode::serialize(accounts)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> Result<AccountMap> {
        if bytes.len() <= MAGIC_NUMBER.len() || &bytes[..MAGIC_NUMBER.len()] != MAGIC_NUMBER {
            return Err(VaultError::SerializationError(
                "not a password vault stream".to_string(),
            ));
        }
        let version = bytes[MAGIC_NUMBER.len()];
        if version > VERSION {
            return Err(VaultError::SerializationError(format!(
                "unsupported vault format version {version}"
            )));
        }

        let accounts: AccountMap = bincode::deserialize(&bytes[MAGIC_NUMBER.len() + 1..])
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;

        if accounts.values().any(|entries| entries.is_empty()) {
            return Err(VaultError::SerializationError(
                "account with no password entries".to_string(),
            ));
        }
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::PasswordEntry;

    fn sample_accounts() -> AccountMap {
        let mut accounts = AccountMap::new();
        accounts.insert(
            b"alice".to_vec(),
            vec![PasswordEntry {
                share_number: 6,
                salt: vec![0xA5; 16],
                pass_hash: vec![0x5A; 32],
            }],
        );
        accounts.insert(
            b"admin".to_vec(),
            vec![
                PasswordEntry {
                    share_number: 1,
                    salt: vec![1; 16],
                    pass_hash: vec![2; 34],
                },
                PasswordEntry {
                    share_number: 2,
                    salt: vec![3; 16],
                    pass_hash: vec![4; 34],
                },
            ],
        );
        accounts
    }

    #[test]
    fn test_roundtrip() {
        let accounts = sample_accounts();
        let encoded = BinaryCodec.encode(&accounts).unwrap();
        assert_eq!(BinaryCodec.decode(&encoded).unwrap(), accounts);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let accounts = sample_accounts();
        assert_eq!(
            BinaryCodec.encode(&accounts).unwrap(),
            BinaryCodec.encode(&accounts).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut encoded = BinaryCodec.encode(&sample_accounts()).unwrap();
        encoded[0] ^= 0xFF;
        assert!(matches!(
            BinaryCodec.decode(&encoded),
            Err(VaultError::SerializationError(_))
        ));
    }

    #[test]
    fn test_rejects_future_version() {
        let mut encoded = BinaryCodec.encode(&sample_accounts()).unwrap();
        encoded[MAGIC_NUMBER.len()] = VERSION + 1;
        assert!(matches!(
            BinaryCodec.decode(&encoded),
            Err(VaultError::SerializationError(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_stream() {
        let encoded = BinaryCodec.encode(&sample_accounts()).unwrap();
        assert!(BinaryCodec.decode(&encoded[..3]).is_err());
        assert!(BinaryCodec.decode(&encoded[..encoded.len() - 1]).is_err());
    }

    #[test]
    fn test_rejects_account_without_entries() {
        let mut accounts = AccountMap::new();
        accounts.insert(b"ghost".to_vec(), Vec::new());
        let encoded = BinaryCodec.encode(&accounts).unwrap();
        assert!(matches!(
            BinaryCodec.decode(&encoded),
            Err(VaultError::SerializationError(_))
        ));
    }
}
