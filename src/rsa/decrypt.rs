// RSA Decryption Implementation
// Inverse of both block modes, with Chinese Remainder Theorem (CRT) when factors are known

use log::debug;
use num_bigint::BigUint;

use super::bigint::{from_bytes, mod_pow, to_fixed_bytes};
use super::block::{chain_mask, cipher_blocks, xor_in_place};
use super::keygen::{CrtParams, RsaPrivateKey};
use super::padding::unpad;
use crate::error::{Error, Result};

/// Decrypt an independent-mode ciphertext and decode it as UTF-8
pub fn decrypt_independent(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<String> {
    let plaintext = decrypt_independent_bytes(private_key, ciphertext)?;
    Ok(String::from_utf8(plaintext)?)
}

/// Decrypt an independent-mode ciphertext to raw bytes
pub fn decrypt_independent_bytes(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let block_size = private_key.block_size()?;
    let blocks = cipher_blocks(ciphertext, block_size)?;

    let mut padded = Vec::with_capacity(blocks.len() * block_size);
    for (index, block) in blocks.enumerate() {
        padded.extend_from_slice(&decrypt_block(private_key, block, index, block_size)?);
    }

    debug!("decrypted {} independent blocks", padded.len() / block_size);
    Ok(unpad(&padded)?.to_vec())
}

/// Decrypt a chained-mode ciphertext and decode it as UTF-8
pub fn decrypt_chained(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<String> {
    let plaintext = decrypt_chained_bytes(private_key, ciphertext)?;
    Ok(String::from_utf8(plaintext)?)
}

/// Decrypt a chained-mode ciphertext to raw bytes.
///
/// The IV is read from the front of the ciphertext. Each decrypted block is
/// unmasked with the IV or the low `block_size` bytes of the previous
/// ciphertext block, mirroring [`encrypt_chained`](super::encrypt::encrypt_chained).
pub fn decrypt_chained_bytes(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let block_size = private_key.block_size()?;
    if ciphertext.len() < block_size {
        return Err(Error::InvalidPadding(format!(
            "ciphertext of {} bytes is shorter than the {}-byte IV",
            ciphertext.len(),
            block_size
        )));
    }

    let (iv, body) = ciphertext.split_at(block_size);
    let blocks = cipher_blocks(body, block_size)?;

    let mut padded = Vec::with_capacity(blocks.len() * block_size);
    let mut mask = iv;
    for (index, block) in blocks.enumerate() {
        let mut plain = decrypt_block(private_key, block, index, block_size)?;
        xor_in_place(&mut plain, mask);
        mask = chain_mask(block, block_size);
        padded.extend_from_slice(&plain);
    }

    debug!("decrypted {} chained blocks", padded.len() / block_size);
    Ok(unpad(&padded)?.to_vec())
}

/// Recover one `block_size`-byte plaintext block from its serialized ciphertext
fn decrypt_block(
    private_key: &RsaPrivateKey,
    block: &[u8],
    index: usize,
    block_size: usize,
) -> Result<Vec<u8>> {
    let c = from_bytes(block);
    if &c >= private_key.n() {
        return Err(Error::InvalidPadding(format!(
            "ciphertext block {} is not below the modulus",
            index
        )));
    }

    let m = decrypt_integer(private_key, &c);

    // Anything wider than a block cannot come from this key's encryption
    to_fixed_bytes(&m, block_size).ok_or_else(|| {
        Error::InvalidPadding(format!(
            "decrypted block {} does not fit in {} bytes",
            index, block_size
        ))
    })
}

/// `c^d mod n`, through CRT when the key carries its factors
pub(crate) fn decrypt_integer(private_key: &RsaPrivateKey, c: &BigUint) -> BigUint {
    match private_key.crt() {
        Some(crt) => decrypt_crt(c, crt),
        None => mod_pow(c, private_key.d(), private_key.n()),
    }
}

/// Decrypt using Chinese Remainder Theorem (CRT)
/// This is faster than regular decryption because we work with smaller numbers
fn decrypt_crt(c: &BigUint, crt: &CrtParams) -> BigUint {
    // m1 = c^d_p mod p
    let m1 = mod_pow(c, &crt.d_p, &crt.p);

    // m2 = c^d_q mod q
    let m2 = mod_pow(c, &crt.d_q, &crt.q);

    // h = (m1 - m2) * q_inv mod p, kept non-negative
    let m2_mod_p = &m2 % &crt.p;
    let diff = (m1 + &crt.p - m2_mod_p) % &crt.p;
    let h = (diff * &crt.q_inv) % &crt.p;

    // m = m2 + q * h, already below n = p * q
    m2 + &crt.q * h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::block::cipher_block_size;
    use crate::rsa::encrypt::{encrypt_chained, encrypt_independent};
    use crate::rsa::keygen::{generate_keys, RsaKeyPair, RsaPublicKey};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2024)
    }

    fn keypair(bits: u64, rng: &mut StdRng) -> RsaKeyPair {
        generate_keys(bits, rng).unwrap()
    }

    #[test]
    fn test_decrypt_independent() {
        let mut rng = rng();
        let keypair = keypair(256, &mut rng);
        let message = "Hello, RSA!";

        let ciphertext = encrypt_independent(&keypair.public_key, message.as_bytes()).unwrap();
        let decrypted = decrypt_independent(&keypair.private_key, &ciphertext).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    fn test_decrypt_chained() {
        let mut rng = rng();
        let keypair = keypair(256, &mut rng);
        let message = "Chained blocks, masked by the previous ciphertext.";

        let ciphertext = encrypt_chained(&keypair.public_key, message.as_bytes(), &mut rng).unwrap();
        let decrypted = decrypt_chained(&keypair.private_key, &ciphertext).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    fn test_crt_matches_plain_exponentiation() {
        let mut rng = rng();
        let keypair = keypair(256, &mut rng);
        let plain_key = keypair.private_key.without_crt();
        let crt = keypair.private_key.crt().unwrap();

        let message: Vec<u8> = (0..=255u8).collect();
        let ciphertext = encrypt_independent(&keypair.public_key, &message).unwrap();
        for block in ciphertext.chunks(cipher_block_size(31)) {
            let c = from_bytes(block);
            assert_eq!(decrypt_crt(&c, crt), mod_pow(&c, plain_key.d(), plain_key.n()));
        }

        assert_eq!(decrypt_independent_bytes(&plain_key, &ciphertext).unwrap(), message);
    }

    #[test]
    fn test_textbook_key_from_parts() {
        // n = 3233, e = 17, d = 2753
        let public_key = RsaPublicKey::new(BigUint::from(3233u32), BigUint::from(17u32));
        let private_key = RsaPrivateKey::new(BigUint::from(3233u32), BigUint::from(2753u32));

        let ciphertext = encrypt_independent(&public_key, b"hi").unwrap();
        assert_eq!(decrypt_independent(&private_key, &ciphertext).unwrap(), "hi");
    }

    #[test]
    fn test_decrypt_rejects_truncated() {
        let mut rng = rng();
        let keypair = keypair(256, &mut rng);

        let ciphertext = encrypt_independent(&keypair.public_key, b"truncate me").unwrap();
        let result = decrypt_independent(&keypair.private_key, &ciphertext[..ciphertext.len() - 1]);
        assert!(matches!(result, Err(Error::InvalidPadding(_))));

        let ciphertext = encrypt_chained(&keypair.public_key, b"truncate me", &mut rng).unwrap();
        let result = decrypt_chained(&keypair.private_key, &ciphertext[..ciphertext.len() - 1]);
        assert!(matches!(result, Err(Error::InvalidPadding(_))));

        // IV alone, no blocks
        let result = decrypt_chained(&keypair.private_key, &ciphertext[..31]);
        assert!(matches!(result, Err(Error::InvalidPadding(_))));
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let mut rng = rng();
        let keypair1 = keypair(256, &mut rng);
        let keypair2 = keypair(256, &mut rng);
        let message = b"Test message under the wrong key";

        let ciphertext = encrypt_independent(&keypair1.public_key, message).unwrap();
        let result = decrypt_independent(&keypair2.private_key, &ciphertext);
        assert!(matches!(result, Err(Error::InvalidPadding(_)) | Err(Error::Decoding(_))));

        let ciphertext = encrypt_chained(&keypair1.public_key, message, &mut rng).unwrap();
        let result = decrypt_chained(&keypair2.private_key, &ciphertext);
        assert!(matches!(result, Err(Error::InvalidPadding(_)) | Err(Error::Decoding(_))));
    }

    #[test]
    fn test_decrypt_invalid_utf8() {
        let mut rng = rng();
        let keypair = keypair(256, &mut rng);

        let ciphertext = encrypt_independent(&keypair.public_key, &[0xff, 0xfe, 0xfd]).unwrap();
        assert!(matches!(
            decrypt_independent(&keypair.private_key, &ciphertext),
            Err(Error::Decoding(_))
        ));
        assert_eq!(
            decrypt_independent_bytes(&keypair.private_key, &ciphertext).unwrap(),
            vec![0xff, 0xfe, 0xfd]
        );
    }

    #[test]
    fn test_chained_iv_is_not_regenerated() {
        let mut rng = rng();
        let keypair = keypair(256, &mut rng);

        let mut ciphertext = encrypt_chained(&keypair.public_key, b"iv matters", &mut rng).unwrap();
        // flipping the transmitted IV corrupts the first block
        ciphertext[0] ^= 0x80;
        let result = decrypt_chained_bytes(&keypair.private_key, &ciphertext).unwrap();
        assert_ne!(result.as_slice(), b"iv matters");
    }
}
