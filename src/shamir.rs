use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::RngCore;
use rand_core::SeedableRng;

use crate::crypto::constant_time_eq;
use crate::error::{Result, VaultError};
use crate::finite_field::FiniteField;

#[cfg(feature = "zeroize")]
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A share in Shamir's Secret Sharing scheme
///
/// Each share is the byte-wise evaluation of the secret polynomials at one
/// nonzero x-coordinate. Individual shares reveal no information about the
/// secret without meeting the threshold.
///
/// # Example
/// ```
/// use polypasshash::ShamirEngine;
///
/// let engine = ShamirEngine::new(2, b"hello").unwrap();
/// let share = engine.compute_share(1).unwrap();
///
/// assert_eq!(share.index, 1);
/// assert_eq!(share.data.len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "zeroize", derive(Zeroize, ZeroizeOnDrop))]
pub struct Share {
    /// Index of the share (x-coordinate in the polynomial)
    pub index: u8,
    /// The share data (y-coordinates for each byte of the secret)
    pub data: Vec<u8>,
}

/// GF(256) secret-sharing engine over a byte-wise polynomial matrix
///
/// For a secret of `L` bytes and threshold `t`, the engine holds one row of
/// `t` polynomial coefficients per secret byte: column 0 is the secret byte
/// and the remaining columns are uniformly random. Shares are evaluations of
/// those rows at nonzero x-coordinates; the secret is recoverable from any
/// `t` distinct shares by Lagrange interpolation.
///
/// An engine is either seeded (it holds a secret and can compute and validate
/// shares) or empty (it can only recover a secret from shares). The
/// coefficient matrix is fixed once seeded.
///
/// # Security
///
/// - Polynomial coefficients are drawn from a ChaCha20 CSPRNG seeded from OsRng
/// - A threshold below 2 is rejected; one share must never determine the secret
/// - Share validation compares evaluations in constant time
///
/// # Example
/// ```
/// use polypasshash::ShamirEngine;
///
/// let engine = ShamirEngine::new(2, b"hello").unwrap();
/// let a = engine.compute_share(1).unwrap();
/// let b = engine.compute_share(2).unwrap();
///
/// let mut recovered = ShamirEngine::empty(2).unwrap();
/// recovered.recover_secretdata(&[a, b]).unwrap();
/// assert_eq!(recovered.secret_data().unwrap(), b"hello");
/// ```
#[cfg_attr(feature = "zeroize", derive(Zeroize, ZeroizeOnDrop))]
pub struct ShamirEngine {
    /// Minimum number of shares needed for recovery
    threshold: u8,
    /// One row of `threshold` coefficients (ascending degree) per secret byte;
    /// empty until a secret is set or recovered
    coefficients: Vec<Vec<u8>>,
}

impl ShamirEngine {
    /// Creates an engine seeded with a secret
    ///
    /// Column 0 of each coefficient row is the corresponding secret byte; the
    /// remaining `threshold - 1` coefficients are filled from a ChaCha20 CSPRNG.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `threshold < 2` or the secret is empty.
    pub fn new(threshold: u8, secret: &[u8]) -> Result<Self> {
        if threshold < 2 {
            return Err(VaultError::InvalidArgument(format!(
                "threshold must be at least 2, got {threshold}"
            )));
        }
        if secret.is_empty() {
            return Err(VaultError::InvalidArgument(
                "secret must not be empty".to_string(),
            ));
        }

        let t = threshold as usize;
        let mut rng = ChaCha20Rng::try_from_rng(&mut OsRng).unwrap();
        let mut random_row = vec![0u8; t - 1];

        let coefficients = secret
            .iter()
            .map(|&secret_byte| {
                rng.fill_bytes(&mut random_row);
                let mut row = Vec::with_capacity(t);
                row.push(secret_byte);
                row.extend_from_slice(&random_row);
                row
            })
            .collect();

        #[cfg(feature = "zeroize")]
        random_row.zeroize();

        Ok(Self {
            threshold,
            coefficients,
        })
    }

    /// Creates an empty engine that can later recover a secret from shares
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `threshold < 2`.
    pub fn empty(threshold: u8) -> Result<Self> {
        if threshold < 2 {
            return Err(VaultError::InvalidArgument(format!(
                "threshold must be at least 2, got {threshold}"
            )));
        }
        Ok(Self {
            threshold,
            coefficients: Vec::new(),
        })
    }

    /// Returns the recovery threshold
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Returns true once a secret has been set or recovered
    pub fn has_secret(&self) -> bool {
        !self.coefficients.is_empty()
    }

    /// Returns a copy of the secret, if present
    pub fn secret_data(&self) -> Option<Vec<u8>> {
        if !self.has_secret() {
            return None;
        }
        Some(self.coefficients.iter().map(|row| row[0]).collect())
    }

    /// Evaluates the secret polynomials at the given x-coordinate
    ///
    /// # Errors
    /// - `NotReady` if no secret is present
    /// - `InvalidArgument` for index 0, which would evaluate to the secret itself
    pub fn compute_share(&self, index: u8) -> Result<Share> {
        if !self.has_secret() {
            return Err(VaultError::NotReady);
        }
        if index == 0 {
            return Err(VaultError::InvalidArgument(
                "share index 0 would evaluate to the secret itself".to_string(),
            ));
        }

        let x = FiniteField::new(index);
        let data = self
            .coefficients
            .iter()
            .map(|row| evaluate_poly(row, x))
            .collect();

        Ok(Share { index, data })
    }

    /// Checks whether a share lies on the secret polynomials
    ///
    /// Recomputes the share at the candidate's index and compares the data in
    /// constant time.
    ///
    /// # Errors
    /// Same conditions as [`compute_share`](Self::compute_share); a zero index
    /// is never accepted.
    pub fn is_valid_share(&self, share: &Share) -> Result<bool> {
        let expected = self.compute_share(share.index)?;
        Ok(constant_time_eq(&expected.data, &share.data))
    }

    /// Recovers the secret polynomials from a set of shares
    ///
    /// The first `threshold` shares interpolate the full coefficient rows;
    /// every supplied share (including the interpolating ones) is then checked
    /// against the reconstructed polynomials. After recovery the engine can
    /// compute shares for any index, consistently with the supplied shares.
    ///
    /// State is assigned only after all shares verify; on error the engine is
    /// unchanged.
    ///
    /// # Errors
    /// - `AlreadyInitialized` if the engine already holds a secret
    /// - `InsufficientShares` with fewer than `threshold` shares
    /// - `MalformedShare` for empty or inconsistent data lengths, a zero
    ///   index, or duplicate indices
    /// - `InvalidShare` if any share does not lie on the interpolated polynomials
    pub fn recover_secretdata(&mut self, shares: &[Share]) -> Result<()> {
        if self.has_secret() {
            return Err(VaultError::AlreadyInitialized);
        }
        let t = self.threshold as usize;
        if shares.len() < t {
            return Err(VaultError::InsufficientShares {
                needed: self.threshold,
                got: shares.len(),
            });
        }

        let width = shares[0].data.len();
        if width == 0 || !shares.iter().all(|s| s.data.len() == width) {
            return Err(VaultError::MalformedShare);
        }
        for (i, share) in shares.iter().enumerate() {
            if share.index == 0 {
                return Err(VaultError::MalformedShare);
            }
            if shares[..i].iter().any(|other| other.index == share.index) {
                return Err(VaultError::MalformedShare);
            }
        }

        // Interpolate the coefficient rows from the first t shares: each row
        // is the y-weighted sum of the Lagrange basis polynomials.
        let chosen = &shares[..t];
        let xs: Vec<FiniteField> = chosen.iter().map(|s| FiniteField::new(s.index)).collect();
        let basis = lagrange_basis_polynomials(&xs);

        let mut coefficients = Vec::with_capacity(width);
        for byte_idx in 0..width {
            let mut row = vec![FiniteField::new(0); t];
            for (share, basis_poly) in chosen.iter().zip(&basis) {
                let y = FiniteField::new(share.data[byte_idx]);
                for (slot, &coeff) in row.iter_mut().zip(basis_poly) {
                    *slot = *slot + y * coeff;
                }
            }
            coefficients.push(row.iter().map(|f| f.0).collect::<Vec<u8>>());
        }

        // Every supplied share must lie on the reconstructed polynomials,
        // including the ones beyond the interpolating subset.
        for share in shares {
            let x = FiniteField::new(share.index);
            for (row, &expected) in coefficients.iter().zip(&share.data) {
                if evaluate_poly(row, x) != expected {
                    return Err(VaultError::InvalidShare);
                }
            }
        }

        self.coefficients = coefficients;
        Ok(())
    }
}

/// Evaluates a coefficient row (ascending degree) at `x` using Horner's method
fn evaluate_poly(row: &[u8], x: FiniteField) -> u8 {
    let mut acc = FiniteField::new(0);
    for &coeff in row.iter().rev() {
        acc = acc * x + FiniteField::new(coeff);
    }
    acc.0
}

/// Computes the Lagrange basis polynomials for the given x-coordinates
///
/// Returns one coefficient vector (ascending degree, length `xs.len()`) per
/// basis polynomial `L_j`, where `L_j(x_j) = 1` and `L_j(x_m) = 0` for m ≠ j.
fn lagrange_basis_polynomials(xs: &[FiniteField]) -> Vec<Vec<FiniteField>> {
    xs.iter()
        .enumerate()
        .map(|(j, &x_j)| {
            let mut poly = vec![FiniteField::new(1)];
            let mut denominator = FiniteField::new(1);
            for (m, &x_m) in xs.iter().enumerate() {
                if m == j {
                    continue;
                }
                // Multiply by the factor (x - x_m); subtraction is XOR, so the
                // factor's coefficients are [x_m, 1].
                let mut next = vec![FiniteField::new(0); poly.len() + 1];
                for (degree, &coeff) in poly.iter().enumerate() {
                    next[degree] = next[degree] + coeff * x_m;
                    next[degree + 1] = next[degree + 1] + coeff;
                }
                poly = next;
                denominator = denominator * (x_j + x_m);
            }
            // Distinct x-coordinates guarantee a nonzero denominator
            let scale = denominator.inverse().unwrap();
            poly.into_iter().map(|coeff| coeff * scale).collect()
        })
        .collect()
}
