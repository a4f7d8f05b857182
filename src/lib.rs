//! Textbook RSA built from first principles.
//!
//! Probable-prime generation, key-pair derivation and two block modes over raw
//! modular exponentiation: independent blocks (ECB-like) and chained blocks,
//! where each block is masked with the previous ciphertext block. A
//! per-character mode encrypts each code point on its own.
//!
//! This is for teaching only. There is no constant-time arithmetic, no
//! side-channel resistance and no standard padding; identical plaintext blocks
//! leak in independent mode by construction.

pub mod error;
pub mod rsa;

pub use error::{Error, Result};
pub use rsa::*;
