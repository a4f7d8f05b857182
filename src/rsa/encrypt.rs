// RSA Encryption Implementation
// Independent-block and chained-block encryption over raw RSA

use log::debug;
use rand::Rng;

use super::block::{chain_mask, encrypt_block, xor_in_place};
use super::keygen::RsaPublicKey;
use super::padding::pad;
use crate::error::Result;

/// Encrypt `message` block by block with no chaining.
///
/// Output is one `block_size + 1`-byte big-endian integer per padded block.
/// Identical plaintext blocks always give identical ciphertext blocks.
pub fn encrypt_independent(public_key: &RsaPublicKey, message: &[u8]) -> Result<Vec<u8>> {
    let block_size = public_key.block_size()?;
    let padded = pad(message, block_size)?;

    let mut ciphertext = Vec::with_capacity(padded.len() / block_size * (block_size + 1));
    for (index, block) in padded.chunks(block_size).enumerate() {
        let c = encrypt_block(block, index, public_key.e(), public_key.n(), block_size)?;
        ciphertext.extend_from_slice(&c);
    }

    debug!(
        "encrypted {} blocks of {} bytes independently",
        padded.len() / block_size,
        block_size
    );
    Ok(ciphertext)
}

/// Encrypt a string with no chaining
pub fn encrypt_independent_str(public_key: &RsaPublicKey, message: &str) -> Result<Vec<u8>> {
    encrypt_independent(public_key, message.as_bytes())
}

/// Encrypt `message` in chained mode.
///
/// A random IV of `block_size` bytes is emitted first. Block `i` is XORed
/// before exponentiation with the IV (`i == 0`) or with the low `block_size`
/// bytes of ciphertext block `i - 1`. The mask is the previous *ciphertext*,
/// never the previous plaintext, so this is not conventional CBC.
pub fn encrypt_chained<R: Rng + ?Sized>(
    public_key: &RsaPublicKey,
    message: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    let block_size = public_key.block_size()?;
    let padded = pad(message, block_size)?;

    let mut iv = vec![0u8; block_size];
    rng.fill(&mut iv[..]);

    let mut ciphertext =
        Vec::with_capacity(block_size + padded.len() / block_size * (block_size + 1));
    ciphertext.extend_from_slice(&iv);

    let mut mask = iv;
    for (index, block) in padded.chunks(block_size).enumerate() {
        let mut masked = block.to_vec();
        xor_in_place(&mut masked, &mask);

        let c = encrypt_block(&masked, index, public_key.e(), public_key.n(), block_size)?;
        mask = chain_mask(&c, block_size).to_vec();
        ciphertext.extend_from_slice(&c);
    }

    debug!(
        "encrypted {} blocks of {} bytes in chained mode",
        padded.len() / block_size,
        block_size
    );
    Ok(ciphertext)
}

/// Encrypt a string in chained mode
pub fn encrypt_chained_str<R: Rng + ?Sized>(
    public_key: &RsaPublicKey,
    message: &str,
    rng: &mut R,
) -> Result<Vec<u8>> {
    encrypt_chained(public_key, message.as_bytes(), rng)
}
