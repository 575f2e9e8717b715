use once_cell::sync::Lazy;
use std::ops::{Add, Mul, Sub};

/// Order of the multiplicative group of GF(2^8)
const GROUP_ORDER: usize = 255;

/// Rijndael reduction polynomial x^8 + x^4 + x^3 + x + 1
const REDUCING_POLY: u16 = 0x11B;

/// Discrete log and antilog tables over the generator 0x03
struct LogTables {
    exp: [u8; 256],
    log: [u8; 256],
}

static TABLES: Lazy<LogTables> = Lazy::new(|| {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];

    // Walk the powers of 0x03, which generates the full multiplicative group.
    // Multiplying by 0x03 is a doubling (with reduction) plus an addition.
    let mut value: u16 = 1;
    for power in 0..GROUP_ORDER {
        exp[power] = value as u8;
        log[value as usize] = power as u8;

        let mut doubled = value << 1;
        if doubled & 0x100 != 0 {
            doubled ^= REDUCING_POLY;
        }
        value = doubled ^ value;
    }

    LogTables { exp, log }
});

/// Galois Field (GF(256)) arithmetic implementation
///
/// Represents elements in GF(2⁸) using irreducible polynomial x⁸ + x⁴ + x³ + x + 1 (0x11B).
/// Multiplication and inversion go through precomputed log/antilog tables.
///
/// # Example
/// ```
/// use polypasshash::FiniteField;
///
/// let a = FiniteField::new(0x53);
/// let b = FiniteField::new(0xCA);
/// let sum = a + b;  // XOR operation
/// let product = a * b;  // Table lookup
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiniteField(pub u8);

impl FiniteField {
    /// Creates a new finite field element
    #[inline]
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Performs multiplication in GF(256)
    ///
    /// Products are looked up as `exp[log a + log b]`; zero operands
    /// short-circuit since zero has no discrete log.
    ///
    /// # Example
    /// ```
    /// use polypasshash::FiniteField;
    ///
    /// let a = FiniteField::new(0x53);
    /// let b = FiniteField::new(0xCA);
    /// assert_eq!(a.multiply(b), FiniteField::new(0x01));
    /// ```
    #[inline]
    pub fn multiply(self, other: Self) -> Self {
        if self.0 == 0 || other.0 == 0 {
            return Self(0);
        }
        let tables = &*TABLES;
        let exponent =
            (tables.log[self.0 as usize] as usize + tables.log[other.0 as usize] as usize) % GROUP_ORDER;
        Self(tables.exp[exponent])
    }

    /// Computes the multiplicative inverse
    ///
    /// The inverse of `g^k` is `g^(255 - k)`. Returns None for zero
    /// (which has no inverse).
    ///
    /// # Example
    /// ```
    /// use polypasshash::FiniteField;
    ///
    /// let a = FiniteField::new(0x53);
    /// let inv = a.inverse().unwrap();
    /// assert_eq!(a * inv, FiniteField::new(0x01));
    /// ```
    #[inline]
    pub fn inverse(self) -> Option<Self> {
        if self.0 == 0 {
            return None;
        }
        let tables = &*TABLES;
        let exponent = (GROUP_ORDER - tables.log[self.0 as usize] as usize) % GROUP_ORDER;
        Some(Self(tables.exp[exponent]))
    }
}

/// Implements addition as XOR in GF(2⁸)
impl Add for FiniteField {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        // In GF(2^8), addition is XOR
        #[allow(clippy::suspicious_arithmetic_impl)]
        let result = self.0 ^ other.0;
        Self(result)
    }
}

/// Implements multiplication via the log/antilog tables
impl Mul for FiniteField {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        self.multiply(other)
    }
}

impl Sub for FiniteField {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        // In GF(2^8), addition and subtraction are the same operation (XOR)
        #[allow(clippy::suspicious_arithmetic_impl)]
        let result = self.add(other);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bitwise reference multiplication, independent of the tables
    fn reference_multiply(a: u8, b: u8) -> u8 {
        let mut a = a;
        let mut b = b;
        let mut p: u8 = 0;
        for _ in 0..8 {
            if (b & 1) != 0 {
                p ^= a;
            }
            let carry = a & 0x80;
            a <<= 1;
            if carry != 0 {
                a ^= 0x1b;
            }
            b >>= 1;
        }
        p
    }

    #[test]
    fn test_addition() {
        let a = FiniteField::new(0x53);
        let b = FiniteField::new(0xCA);
        assert_eq!((a + b).0, 0x99);
    }

    #[test]
    fn test_multiplication() {
        let a = FiniteField::new(0x53);
        let b = FiniteField::new(0xCA);
        assert_eq!((a * b).0, 0x1);
    }

    #[test]
    fn test_multiply_by_zero() {
        let a = FiniteField::new(0xAB);
        let zero = FiniteField::new(0);
        assert_eq!((a * zero).0, 0);
        assert_eq!((zero * a).0, 0);
    }

    #[test]
    fn test_tables_match_reference() {
        for a in 0..=255u8 {
            for b in [0u8, 1, 2, 3, 0x53, 0x80, 0xCA, 0xFF] {
                assert_eq!(
                    (FiniteField::new(a) * FiniteField::new(b)).0,
                    reference_multiply(a, b),
                    "Product mismatch for 0x{:02X} * 0x{:02X}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_inverse() {
        let a = FiniteField::new(0x53);
        let inv = a.inverse().unwrap();
        assert_eq!((a * inv).0, 0x01);
    }

    #[test]
    fn test_zero_inverse() {
        let zero = FiniteField::new(0);
        assert_eq!(zero.inverse(), None);
    }

    #[test]
    fn test_all_inverses() {
        for i in 1..=255 {
            let a = FiniteField::new(i);
            let inv = a.inverse().unwrap();
            assert_eq!((a * inv).0, 0x01);
        }
    }

    #[test]
    fn test_specific_inverses() {
        let test_values = [(0x53, 0xCA), (0x7B, 0x06), (0xA4, 0x8F), (0xE1, 0x0D)];

        for &(a, expected_inv) in &test_values {
            let field_a = FiniteField::new(a);
            let inv = field_a.inverse().unwrap();
            assert_eq!(inv.0, expected_inv, "Inverse mismatch for 0x{:02X}", a);
            assert_eq!((field_a * inv).0, 0x01);
        }
    }

    #[test]
    fn test_multiplication_associativity() {
        let a = FiniteField::new(0x53);
        let b = FiniteField::new(0xCA);
        let c = FiniteField::new(0x7B);
        assert_eq!((a * b) * c, a * (b * c));
    }

    #[test]
    fn test_commutativity() {
        let a = FiniteField::new(0x53);
        let b = FiniteField::new(0xCA);
        assert_eq!(a * b, b * a);
    }

    #[test]
    fn test_distributivity() {
        let a = FiniteField::new(0x12);
        let b = FiniteField::new(0x34);
        let c = FiniteField::new(0x56);
        assert_eq!(a * (b + c), (a * b) + (a * c));
    }

    #[test]
    fn test_identity() {
        let one = FiniteField::new(1);
        let value = FiniteField::new(0xAB);
        assert_eq!(value * one, value);
    }
}
