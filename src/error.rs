use std::io;
use thiserror::Error;

/// Error type for password vault and secret-sharing operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// The vault secret has not been recovered yet
    #[error("Password data is locked")]
    Locked,

    /// The vault secret is already known
    #[error("Password data is already unlocked")]
    AlreadyUnlocked,

    /// The username is already taken
    #[error("Account exists already")]
    DuplicateAccount,

    /// No account with the given username
    #[error("Unknown user")]
    UnknownUser,

    /// A parameter is outside its permitted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Granting the requested shares would exceed the share space
    #[error("Requested {requested} shares but only {available} remain")]
    ShareSpaceExhausted { requested: u16, available: u16 },

    /// The stored file would lack enough shares to ever unlock again
    #[error("Password data would be undecodable: threshold {threshold} not covered by {issued} issued shares")]
    Undecodable { threshold: u8, issued: u16 },

    /// Operation requires a secret that is not present
    #[error("No secret has been set or recovered")]
    NotReady,

    /// Recovery attempted on an engine that already holds a secret
    #[error("Secret is already initialized")]
    AlreadyInitialized,

    /// Not enough shares for reconstruction
    #[error("Need at least {needed} shares, got {got}")]
    InsufficientShares { needed: u8, got: usize },

    /// A share has a zero or duplicate index, or inconsistent length
    #[error("Malformed share")]
    MalformedShare,

    /// A share does not lie on the recovered polynomial
    #[error("Share does not match the recovered secret")]
    InvalidShare,

    /// Account data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;
