// RSA Big Integer Operations
// Modular arithmetic primitives on top of num-bigint

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::{Error, Result};

/// Create a big integer from bytes (big-endian)
pub fn from_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Convert big integer to bytes (big-endian, minimal length)
pub fn to_bytes(n: &BigUint) -> Vec<u8> {
    n.to_bytes_be()
}

/// Serialize `n` big-endian into exactly `width` bytes, left-padded with zeros.
/// Returns `None` if `n` needs more than `width` bytes.
pub fn to_fixed_bytes(n: &BigUint, width: usize) -> Option<Vec<u8>> {
    if n.is_zero() {
        return Some(vec![0u8; width]);
    }
    let bytes = n.to_bytes_be();
    if bytes.len() > width {
        return None;
    }
    let mut out = vec![0u8; width];
    out[width - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

/// Modular exponentiation: base^exp mod modulus
/// Uses square-and-multiply algorithm
///
/// # Panics
/// Panics if `modulus` is zero.
pub fn mod_pow(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    assert!(!modulus.is_zero(), "modulus must be non-zero");
    if modulus.is_one() {
        return BigUint::zero();
    }

    let mut result = BigUint::one();
    let mut base = base % modulus;
    let mut exp = exp.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }

    result
}

/// Extended Euclidean Algorithm (iterative)
/// Returns (gcd, x, y) such that a*x + b*y = gcd = gcd(a, b)
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    (old_r, old_s, old_t)
}

/// Compute modular inverse: a^(-1) mod m
///
/// The result is always normalized into `[0, m)`; for `m == 1` that is `0`.
/// Fails with [`Error::NoInverse`] when `gcd(a, m) != 1` or `m == 0`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    if m.is_zero() {
        return Err(Error::NoInverse);
    }

    let a_signed = BigInt::from_biguint(Sign::Plus, a.clone());
    let m_signed = BigInt::from_biguint(Sign::Plus, m.clone());
    let (g, x, _) = extended_gcd(&a_signed, &m_signed);

    if !g.is_one() {
        return Err(Error::NoInverse);
    }

    // mod_floor keeps the coefficient non-negative
    let x = x.mod_floor(&m_signed);
    x.to_biguint().ok_or(Error::NoInverse)
}

/// Greatest common divisor
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_mod_pow() {
        // 3^5 mod 7 = 243 mod 7 = 5
        assert_eq!(mod_pow(&big(3), &big(5), &big(7)), big(5));
        assert_eq!(mod_pow(&big(4), &big(13), &big(497)), big(445));
    }

    #[test]
    fn test_mod_pow_zero_exponent() {
        assert_eq!(mod_pow(&big(42), &BigUint::zero(), &big(5)), big(1));
        assert_eq!(mod_pow(&big(0), &BigUint::zero(), &big(5)), big(1));
        // everything is 0 modulo 1
        assert_eq!(mod_pow(&big(42), &BigUint::zero(), &big(1)), big(0));
    }

    #[test]
    fn test_mod_pow_large_operands() {
        let modulus = (BigUint::one() << 521u32) - 1u8; // Mersenne prime M521
        let base = (BigUint::one() << 300u32) + 12345u32;
        let exp = (BigUint::one() << 400u32) + 1u8;
        assert_eq!(mod_pow(&base, &exp, &modulus), base.modpow(&exp, &modulus));

        // Fermat's little theorem
        let m1 = &modulus - 1u8;
        assert_eq!(mod_pow(&base, &m1, &modulus), big(1));
    }

    #[test]
    #[should_panic]
    fn test_mod_pow_zero_modulus() {
        mod_pow(&big(2), &big(3), &BigUint::zero());
    }

    #[test]
    fn test_extended_gcd() {
        let a = BigInt::from(240);
        let b = BigInt::from(46);
        let (g, x, y) = extended_gcd(&a, &b);
        assert_eq!(g, BigInt::from(2));
        assert_eq!(&a * &x + &b * &y, g);

        let (g, x, y) = extended_gcd(&BigInt::zero(), &BigInt::from(42));
        assert_eq!(g, BigInt::from(42));
        assert_eq!(x, BigInt::zero());
        assert_eq!(y, BigInt::one());
    }

    #[test]
    fn test_mod_inverse() {
        // 3 * 5 = 15 ≡ 1 mod 7, so inverse of 3 mod 7 is 5
        let inv = mod_inverse(&big(3), &big(7)).unwrap();
        assert_eq!(inv, big(5));
        assert_eq!((big(3) * inv) % big(7), big(1));

        // e = 17, phi = 3120 gives the classic d = 2753
        assert_eq!(mod_inverse(&big(17), &big(3120)).unwrap(), big(2753));
    }

    #[test]
    fn test_mod_inverse_is_normalized() {
        // raw Bezout coefficient for (2, 3) is negative: 2 * -1 + 3 * 1 = 1
        let inv = mod_inverse(&big(2), &big(3)).unwrap();
        assert_eq!(inv, big(2));

        // a larger than m is reduced first
        let inv = mod_inverse(&big(10), &big(7)).unwrap();
        assert!(inv < big(7));
        assert_eq!((big(10) * inv) % big(7), big(1));

        assert_eq!(mod_inverse(&big(5), &big(1)).unwrap(), big(0));
    }

    #[test]
    fn test_mod_inverse_missing() {
        assert!(matches!(mod_inverse(&big(6), &big(9)), Err(Error::NoInverse)));
        assert!(matches!(mod_inverse(&big(0), &big(9)), Err(Error::NoInverse)));
        assert!(matches!(mod_inverse(&big(3), &big(0)), Err(Error::NoInverse)));
    }

    #[test]
    fn test_to_fixed_bytes() {
        assert_eq!(to_fixed_bytes(&big(0x0102), 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(to_fixed_bytes(&big(0), 3).unwrap(), vec![0, 0, 0]);
        assert_eq!(to_fixed_bytes(&big(0x010203), 3).unwrap(), vec![1, 2, 3]);
        assert!(to_fixed_bytes(&big(0x01020304), 3).is_none());
        assert_eq!(from_bytes(&[0, 0, 1, 2]), big(0x0102));
        assert_eq!(to_bytes(&big(0x0102)), vec![1, 2]);
    }

    quickcheck! {
        fn prop_mod_inverse_roundtrip(a: u64, m: u64) -> bool {
            let (a, m) = (big(a), big(m));
            if m <= big(1) || gcd(&a, &m) != big(1) {
                return true;
            }
            let inv = mod_inverse(&a, &m).unwrap();
            inv < m && (&a * &inv) % &m == big(1)
        }

        fn prop_mod_pow_matches_num_bigint(base: u64, exp: u32, m: u64) -> bool {
            if m < 2 {
                return true;
            }
            let (base, exp, m) = (big(base), BigUint::from(exp), big(m));
            mod_pow(&base, &exp, &m) == base.modpow(&exp, &m)
        }
    }
}
