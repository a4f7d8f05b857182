// RSA Key Generation
// Implements RSA key pair generation (public and private keys)

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::Rng;

use super::bigint::{gcd, mod_inverse, to_bytes};
use super::block::{block_size, BlockMode};
use super::decrypt::{decrypt_chained_bytes, decrypt_independent_bytes};
use super::encrypt::{encrypt_chained, encrypt_independent};
use super::padding::MAX_BLOCK_SIZE;
use super::prime::{Primality, PrimeGenerator, SearchStrategy, DEFAULT_MAX_CANDIDATES};
use crate::error::{Error, Result};

/// Smallest modulus accepted by the key generator
pub const MIN_MODULUS_BITS: u64 = 16;

/// Largest modulus whose block size still fits the one-byte padding length
pub const MAX_MODULUS_BITS: u64 = 8 * (MAX_BLOCK_SIZE as u64 + 1);

/// How the public exponent is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicExponent {
    /// Uniformly random in (1, phi), resampled until coprime with phi
    #[default]
    Random,
    /// A fixed value such as 65537; new primes are drawn if it does not fit phi
    Fixed(u64),
}

/// Configuration for key generation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyGenConfig {
    /// Size of the modulus n in bits
    pub modulus_bits: u64,
    pub primality: Primality,
    pub search: SearchStrategy,
    /// Candidates examined per prime before giving up
    pub max_prime_candidates: u64,
    /// Redraws of q (or of both primes, for a fixed exponent) before giving up
    pub max_prime_redraws: u32,
    pub public_exponent: PublicExponent,
    /// Random exponents tried before giving up
    pub max_exponent_attempts: u32,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        Self {
            modulus_bits: 2048,
            primality: Primality::default(),
            search: SearchStrategy::default(),
            max_prime_candidates: DEFAULT_MAX_CANDIDATES,
            max_prime_redraws: 64,
            public_exponent: PublicExponent::default(),
            max_exponent_attempts: 10_000,
        }
    }
}

impl KeyGenConfig {
    pub fn with_modulus_bits(mut self, bits: u64) -> Self {
        self.modulus_bits = bits;
        self
    }

    pub fn with_primality(mut self, primality: Primality) -> Self {
        self.primality = primality;
        self
    }

    pub fn with_search(mut self, search: SearchStrategy) -> Self {
        self.search = search;
        self
    }

    pub fn with_max_prime_candidates(mut self, max: u64) -> Self {
        self.max_prime_candidates = max;
        self
    }

    pub fn with_max_prime_redraws(mut self, max: u32) -> Self {
        self.max_prime_redraws = max;
        self
    }

    pub fn with_public_exponent(mut self, exponent: PublicExponent) -> Self {
        self.public_exponent = exponent;
        self
    }

    pub fn with_max_exponent_attempts(mut self, max: u32) -> Self {
        self.max_exponent_attempts = max;
        self
    }

    fn prime_generator(&self) -> PrimeGenerator {
        PrimeGenerator::new(self.primality, self.search, self.max_prime_candidates)
    }
}

/// RSA Public Key `(n, e)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    n: Arc<BigUint>,
    e: BigUint,
}

/// Precomputed factors for Chinese Remainder Theorem decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CrtParams {
    pub(crate) p: BigUint,
    pub(crate) q: BigUint,
    pub(crate) d_p: BigUint,   // d mod (p-1)
    pub(crate) d_q: BigUint,   // d mod (q-1)
    pub(crate) q_inv: BigUint, // q^(-1) mod p
}

/// RSA Private Key `(n, d)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    n: Arc<BigUint>,
    d: BigUint,
    crt: Option<CrtParams>,
}

/// RSA Key Pair (both halves share one modulus)
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    pub public_key: RsaPublicKey,
    pub private_key: RsaPrivateKey,
}

impl RsaPublicKey {
    /// Build a public key from externally supplied material
    pub fn new(n: BigUint, e: BigUint) -> Self {
        Self { n: Arc::new(n), e }
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    /// Plaintext block size in bytes for this modulus
    pub fn block_size(&self) -> Result<usize> {
        block_size(&self.n)
    }

    /// Encrypt a message using this public key
    /// `rng` supplies the IV in chained mode and is untouched otherwise
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        message: &[u8],
        mode: BlockMode,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        match mode {
            BlockMode::Independent => encrypt_independent(self, message),
            BlockMode::Chained => encrypt_chained(self, message, rng),
        }
    }
}

impl RsaPrivateKey {
    /// Build a private key from bare `(n, d)`; decryption will not use CRT
    pub fn new(n: BigUint, d: BigUint) -> Self {
        Self {
            n: Arc::new(n),
            d,
            crt: None,
        }
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn d(&self) -> &BigUint {
        &self.d
    }

    pub(crate) fn crt(&self) -> Option<&CrtParams> {
        self.crt.as_ref()
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    /// Plaintext block size in bytes for this modulus
    pub fn block_size(&self) -> Result<usize> {
        block_size(&self.n)
    }

    /// Decrypt a ciphertext using this private key
    /// Returns plaintext as bytes
    pub fn decrypt(&self, ciphertext: &[u8], mode: BlockMode) -> Result<Vec<u8>> {
        match mode {
            BlockMode::Independent => decrypt_independent_bytes(self, ciphertext),
            BlockMode::Chained => decrypt_chained_bytes(self, ciphertext),
        }
    }

    /// Decrypt a ciphertext and decode it as UTF-8
    pub fn decrypt_to_string(&self, ciphertext: &[u8], mode: BlockMode) -> Result<String> {
        Ok(String::from_utf8(self.decrypt(ciphertext, mode)?)?)
    }

    /// Same key without the CRT factors
    pub fn without_crt(&self) -> Self {
        Self {
            n: Arc::clone(&self.n),
            d: self.d.clone(),
            crt: None,
        }
    }
}

impl RsaKeyPair {
    /// Get the bit length of the key
    pub fn bit_length(&self) -> u64 {
        self.public_key.bit_length()
    }
}

impl fmt::Display for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} e={}",
            hex::encode(to_bytes(&self.n)),
            hex::encode(to_bytes(&self.e))
        )
    }
}

impl fmt::Display for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} d={}",
            hex::encode(to_bytes(&self.n)),
            hex::encode(to_bytes(&self.d))
        )
    }
}

/// Generate an RSA key pair with a modulus of `bits` bits and default settings
pub fn generate_keys<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> Result<RsaKeyPair> {
    generate_keys_with(&KeyGenConfig::default().with_modulus_bits(bits), rng)
}

/// Generate an RSA key pair according to `config`
pub fn generate_keys_with<R: Rng + ?Sized>(
    config: &KeyGenConfig,
    rng: &mut R,
) -> Result<RsaKeyPair> {
    let bits = config.modulus_bits;
    if bits < MIN_MODULUS_BITS {
        return Err(Error::KeyTooSmall {
            bits,
            min: MIN_MODULUS_BITS,
        });
    }
    if bits > MAX_MODULUS_BITS {
        return Err(Error::KeyTooLarge {
            bits,
            max: MAX_MODULUS_BITS,
        });
    }

    let generator = config.prime_generator();
    let p_bits = bits - bits / 2;
    let q_bits = bits / 2;

    for _ in 0..=config.max_prime_redraws {
        // Step 1: Generate two distinct random primes p and q
        let p = generator.generate(p_bits, rng)?;
        let q = distinct_prime(&generator, &p, q_bits, config.max_prime_redraws, rng)?;

        // Step 2: Compute n = p * q and φ(n) = (p-1)(q-1)
        let n = &p * &q;
        let phi = (&p - 1u8) * (&q - 1u8);
        debug!("modulus of {} bits assembled", n.bits());

        // Step 3: Pick e coprime to φ(n)
        let e = match config.public_exponent {
            PublicExponent::Random => random_exponent(&phi, config.max_exponent_attempts, rng)?,
            PublicExponent::Fixed(value) => {
                let e = BigUint::from(value);
                if e <= BigUint::one() || e >= phi || !gcd(&e, &phi).is_one() {
                    debug!("fixed exponent {} unusable for this φ(n), redrawing primes", value);
                    continue;
                }
                e
            }
        };

        // Step 4: Compute d = e^(-1) mod φ(n)
        let d = mod_inverse(&e, &phi)?;

        return assemble(n, e, d, p, q);
    }

    Err(Error::DegenerateKey(format!(
        "fixed public exponent never coprime with φ(n) after {} prime pairs",
        config.max_prime_redraws + 1
    )))
}

/// Draw primes of `bits` bits until one differs from `p`
fn distinct_prime<R: Rng + ?Sized>(
    generator: &PrimeGenerator,
    p: &BigUint,
    bits: u64,
    max_redraws: u32,
    rng: &mut R,
) -> Result<BigUint> {
    for _ in 0..=max_redraws {
        let q = generator.generate(bits, rng)?;
        if &q != p {
            return Ok(q);
        }
        warn!("drew q == p, redrawing q");
    }
    Err(Error::DegenerateKey(format!(
        "q equal to p after {} draws",
        max_redraws + 1
    )))
}

/// Sample e uniformly from (1, φ) until gcd(e, φ) = 1
fn random_exponent<R: Rng + ?Sized>(phi: &BigUint, max_attempts: u32, rng: &mut R) -> Result<BigUint> {
    let two = BigUint::from(2u8);
    if phi <= &two {
        return Err(Error::DegenerateKey("φ(n) leaves no room for an exponent".into()));
    }

    for attempt in 1..=max_attempts {
        let e = rng.gen_biguint_range(&two, phi);
        if gcd(&e, phi).is_one() {
            debug!("public exponent found after {} attempts", attempt);
            return Ok(e);
        }
    }
    Err(Error::DegenerateKey(format!(
        "no exponent coprime with φ(n) after {} attempts",
        max_attempts
    )))
}

fn assemble(n: BigUint, e: BigUint, d: BigUint, p: BigUint, q: BigUint) -> Result<RsaKeyPair> {
    // Compute CRT parameters for faster decryption
    let d_p = &d % (&p - 1u8);
    let d_q = &d % (&q - 1u8);
    let q_inv = mod_inverse(&q, &p)?;

    let n = Arc::new(n);
    let public_key = RsaPublicKey {
        n: Arc::clone(&n),
        e,
    };
    let private_key = RsaPrivateKey {
        n,
        d,
        crt: Some(CrtParams {
            p,
            q,
            d_p,
            d_q,
            q_inv,
        }),
    };

    Ok(RsaKeyPair {
        public_key,
        private_key,
    })
}
