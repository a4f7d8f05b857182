// Per-Character RSA
// Each Unicode scalar value encrypted on its own, with no padding or blocks

use log::debug;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use super::bigint::mod_pow;
use super::decrypt::decrypt_integer;
use super::keygen::{RsaPrivateKey, RsaPublicKey};
use crate::error::{Error, Result};

/// Encrypt every character of `message` as `code_point^e mod n`.
///
/// The output has one integer per character. Equal characters always map to
/// equal integers, so this leaks far more than the block modes. Fails with
/// [`Error::BlockOverflow`] if a code point is not below the modulus.
pub fn encrypt_chars(public_key: &RsaPublicKey, message: &str) -> Result<Vec<BigUint>> {
    let ciphertext = message
        .chars()
        .enumerate()
        .map(|(index, ch)| {
            let m = BigUint::from(u32::from(ch));
            if &m >= public_key.n() {
                return Err(Error::BlockOverflow { block: index });
            }
            Ok(mod_pow(&m, public_key.e(), public_key.n()))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("encrypted {} characters", ciphertext.len());
    Ok(ciphertext)
}

/// Invert [`encrypt_chars`]. Values that do not decrypt to a Unicode scalar
/// value give [`Error::Decoding`].
pub fn decrypt_chars(private_key: &RsaPrivateKey, ciphertext: &[BigUint]) -> Result<String> {
    ciphertext
        .iter()
        .enumerate()
        .map(|(index, c)| {
            if c >= private_key.n() {
                return Err(Error::Decoding(format!(
                    "value {} is not below the modulus",
                    index
                )));
            }
            let m = decrypt_integer(private_key, c);
            m.to_u32().and_then(char::from_u32).ok_or_else(|| {
                Error::Decoding(format!("value {} decrypts to {:#x}, not a character", index, m))
            })
        })
        .collect()
}
