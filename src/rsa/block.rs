// Block Layout
// Block-size derivation and per-block helpers shared by both modes

use num_bigint::BigUint;

use super::bigint::{from_bytes, mod_pow, to_fixed_bytes};
use crate::error::{Error, Result};

/// Block chaining mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockMode {
    /// Every block encrypted on its own (ECB-like)
    #[default]
    Independent,
    /// Each block masked with the previous ciphertext block before exponentiation
    Chained,
}

/// Plaintext block size for modulus `n`: `floor((bits(n) - 1) / 8)` bytes.
///
/// Every block of that many bytes encodes an integer below `2^(bits(n)-1) <= n`.
/// Encryption and decryption must both derive their block size here.
pub fn block_size(n: &BigUint) -> Result<usize> {
    let bits = n.bits();
    if bits <= 8 {
        return Err(Error::ModulusTooSmall { bits });
    }
    Ok(((bits - 1) / 8) as usize)
}

/// Serialized width of one ciphertext block
pub fn cipher_block_size(block_size: usize) -> usize {
    block_size + 1
}

/// Raise one plaintext block to `exponent` and serialize the result to
/// `block_size + 1` bytes
pub(crate) fn encrypt_block(
    block: &[u8],
    index: usize,
    exponent: &BigUint,
    n: &BigUint,
    block_size: usize,
) -> Result<Vec<u8>> {
    let m = from_bytes(block);
    if &m >= n {
        return Err(Error::BlockOverflow { block: index });
    }

    let c = mod_pow(&m, exponent, n);
    to_fixed_bytes(&c, cipher_block_size(block_size)).ok_or(Error::BlockOverflow { block: index })
}

/// Split a ciphertext body into serialized blocks, rejecting empty or ragged input
pub(crate) fn cipher_blocks(body: &[u8], block_size: usize) -> Result<std::slice::ChunksExact<'_, u8>> {
    let width = cipher_block_size(block_size);
    if body.is_empty() || body.len() % width != 0 {
        return Err(Error::InvalidPadding(format!(
            "ciphertext body of {} bytes is not a whole number of {}-byte blocks",
            body.len(),
            width
        )));
    }
    Ok(body.chunks_exact(width))
}

/// Mask for the next block: the trailing `block_size` bytes of the previous
/// serialized ciphertext block
pub(crate) fn chain_mask(cipher_block: &[u8], block_size: usize) -> &[u8] {
    &cipher_block[cipher_block.len() - block_size..]
}

pub(crate) fn xor_in_place(block: &mut [u8], mask: &[u8]) {
    for (b, m) in block.iter_mut().zip(mask) {
        *b ^= m;
    }
}
