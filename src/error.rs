// Error Types
// Every failure the key generator and block engines can report to a caller

use std::string::FromUtf8Error;

use thiserror::Error;

/// Result type for RSA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during key generation, encryption or decryption
#[derive(Debug, Error)]
pub enum Error {
    /// Key generation could not produce a usable pair (p == q, or no valid exponent)
    #[error("degenerate key: {0}")]
    DegenerateKey(String),

    /// `gcd(a, m) != 1`, so `a` has no inverse modulo `m`
    #[error("no modular inverse exists")]
    NoInverse,

    /// The trailing padding of a decrypted message is invalid
    #[error("invalid padding: {0}")]
    InvalidPadding(String),

    /// The decrypted bytes or code points do not form valid text
    #[error("decoded message is not valid text: {0}")]
    Decoding(String),

    /// A plaintext block is not smaller than the modulus
    #[error("block {block} is not smaller than the modulus")]
    BlockOverflow { block: usize },

    /// The prime search hit its candidate cap
    #[error("no prime found after {attempts} candidates")]
    SearchExhausted { attempts: u64 },

    /// Requested key size is below the supported minimum
    #[error("key size {bits} bits is below the minimum of {min} bits")]
    KeyTooSmall { bits: u64, min: u64 },

    /// Requested key size does not fit the one-byte padding length
    #[error("key size {bits} bits is above the maximum of {max} bits")]
    KeyTooLarge { bits: u64, max: u64 },

    /// Trial division was asked to certify primes it cannot finish testing
    #[error("trial division is limited to {max}-bit primes, {bits} bits requested")]
    TrialDivisionTooLarge { bits: u64, max: u64 },

    /// The modulus is too small to hold a single byte per block
    #[error("modulus of {bits} bits is too small to encode a block")]
    ModulusTooSmall { bits: u64 },

    /// Padding block sizes must fit in one length byte
    #[error("block size {0} must be between 1 and 255")]
    InvalidBlockSize(usize),
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Self {
        Error::Decoding(err.to_string())
    }
}
