// Probable Prime Generation
// Miller-Rabin (or trial division) over randomly sampled odd candidates

use log::{debug, trace};
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::Rng;

use super::bigint::mod_pow;
use crate::error::{Error, Result};

/// Rounds giving a false-positive probability of at most 4^-128
pub const DEFAULT_MR_ROUNDS: u32 = 128;

/// Default cap on candidates examined per prime
pub const DEFAULT_MAX_CANDIDATES: u64 = 100_000;

/// Smallest candidate size: two forced top bits plus the forced low bit
pub const MIN_PRIME_BITS: u64 = 3;

/// Largest prime trial division will search for. A 48-bit candidate needs
/// at most ~2^24 divisions, anything much wider never finishes.
pub const MAX_TRIAL_DIVISION_BITS: u64 = 48;

/// Primality test applied to each candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primality {
    /// Probabilistic Miller-Rabin with `rounds` independent random bases
    MillerRabin { rounds: u32 },
    /// Deterministic 6k±1 trial division, capped at [`MAX_TRIAL_DIVISION_BITS`]
    TrialDivision,
}

impl Default for Primality {
    fn default() -> Self {
        Primality::MillerRabin {
            rounds: DEFAULT_MR_ROUNDS,
        }
    }
}

/// What to do after a composite candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Draw a fresh random odd candidate
    #[default]
    Resample,
    /// Step to the next odd integer, drawing afresh once the bit range is left
    Increment,
}

/// Prime generator with an explicit candidate cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeGenerator {
    pub primality: Primality,
    pub search: SearchStrategy,
    pub max_candidates: u64,
}

impl Default for PrimeGenerator {
    fn default() -> Self {
        Self {
            primality: Primality::default(),
            search: SearchStrategy::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl PrimeGenerator {
    pub fn new(primality: Primality, search: SearchStrategy, max_candidates: u64) -> Self {
        Self {
            primality,
            search,
            max_candidates,
        }
    }

    /// Test a single value with the configured primality test
    pub fn is_prime<R: Rng + ?Sized>(&self, n: &BigUint, rng: &mut R) -> bool {
        match self.primality {
            Primality::MillerRabin { rounds } => is_probable_prime(n, rounds, rng),
            Primality::TrialDivision => is_prime_trial_division(n),
        }
    }

    /// Generate a prime of exactly `bits` bits.
    ///
    /// Fails with [`Error::SearchExhausted`] once `max_candidates` candidates
    /// have been rejected, and with [`Error::TrialDivisionTooLarge`] before
    /// drawing anything if trial division is asked for more than
    /// [`MAX_TRIAL_DIVISION_BITS`] bits.
    pub fn generate<R: Rng + ?Sized>(&self, bits: u64, rng: &mut R) -> Result<BigUint> {
        if bits < MIN_PRIME_BITS {
            return Err(Error::KeyTooSmall {
                bits,
                min: MIN_PRIME_BITS,
            });
        }
        if self.primality == Primality::TrialDivision && bits > MAX_TRIAL_DIVISION_BITS {
            return Err(Error::TrialDivisionTooLarge {
                bits,
                max: MAX_TRIAL_DIVISION_BITS,
            });
        }

        let upper = BigUint::one() << bits;
        let mut candidate = random_candidate(bits, rng);

        for attempt in 1..=self.max_candidates {
            if self.is_prime(&candidate, rng) {
                debug!("found {}-bit prime after {} candidates", bits, attempt);
                return Ok(candidate);
            }
            trace!("candidate {} of {} bits rejected", attempt, bits);

            candidate = match self.search {
                SearchStrategy::Resample => random_candidate(bits, rng),
                SearchStrategy::Increment => {
                    let next = next_odd(&candidate);
                    if next >= upper {
                        random_candidate(bits, rng)
                    } else {
                        next
                    }
                }
            };
        }

        Err(Error::SearchExhausted {
            attempts: self.max_candidates,
        })
    }
}

/// Generate a `bits`-bit probable prime with the default generator
pub fn generate_prime<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> Result<BigUint> {
    PrimeGenerator::default().generate(bits, rng)
}

/// Random odd integer with its two top bits set, so it lies in
/// `[2^(bits-1), 2^bits)` and products of two candidates keep their full width
fn random_candidate<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    let mut candidate = rng.gen_biguint(bits);
    candidate.set_bit(bits - 1, true);
    candidate.set_bit(bits - 2, true);
    candidate.set_bit(0, true);
    candidate
}

/// Miller-Rabin primality test
/// Returns true if n is probably prime
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    let two = BigUint::from(2u8);
    if n < &two {
        return false;
    }
    if n == &two || n == &BigUint::from(3u8) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // Write n-1 as 2^r * s with s odd
    let n_minus_one = n - 1u8;
    let mut s = n_minus_one.clone();
    let mut r = 0u32;
    while s.is_even() {
        s >>= 1;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        // Pick random base a in [2, n-2]
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = mod_pow(&a, &s, n);

        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..r {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }

        // a is a witness for compositeness
        return false;
    }

    true
}

/// Deterministic trial division by 2, 3 and every 6k±1 up to sqrt(n)
pub fn is_prime_trial_division(n: &BigUint) -> bool {
    if let Some(small) = n.to_u64() {
        return is_prime_u64(small);
    }
    if n.is_even() || (n % 3u8).is_zero() {
        return false;
    }

    let mut i = BigUint::from(5u8);
    while &i * &i <= *n {
        if (n % &i).is_zero() || (n % (&i + 2u8)).is_zero() {
            return false;
        }
        i += 6u8;
    }
    true
}

fn is_prime_u64(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest probable prime strictly greater than `n`
pub fn next_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> BigUint {
    let two = BigUint::from(2u8);
    if n < &two {
        return two;
    }

    let mut candidate = next_odd(n);
    while !is_probable_prime(&candidate, rounds, rng) {
        candidate = next_odd(&candidate);
    }
    candidate
}

/// Smallest odd integer strictly greater than `n`
fn next_odd(n: &BigUint) -> BigUint {
    if n.is_odd() {
        n + 2u8
    } else {
        n + 1u8
    }
}
