// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod bigint;
pub mod block;
pub mod chars;
pub mod decrypt;
pub mod encrypt;
pub mod keygen;
pub mod padding;
pub mod prime;

pub use bigint::{mod_inverse, mod_pow};
pub use block::{block_size, BlockMode};
pub use chars::{decrypt_chars, encrypt_chars};
pub use decrypt::{decrypt_chained, decrypt_chained_bytes, decrypt_independent, decrypt_independent_bytes};
pub use encrypt::{encrypt_chained, encrypt_chained_str, encrypt_independent, encrypt_independent_str};
pub use keygen::{
    generate_keys, generate_keys_with, KeyGenConfig, PublicExponent, RsaKeyPair, RsaPrivateKey,
    RsaPublicKey, MAX_MODULUS_BITS, MIN_MODULUS_BITS,
};
pub use padding::{pad, unpad};
pub use prime::{
    generate_prime, is_probable_prime, next_probable_prime, Primality, PrimeGenerator,
    SearchStrategy,
};
