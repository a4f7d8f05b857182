// Length-Byte Padding
// Pads a message to a whole number of blocks with `pad_size` copies of `pad_size`

use crate::error::{Error, Result};

/// Largest block size whose pad length still fits in one byte
pub const MAX_BLOCK_SIZE: usize = u8::MAX as usize;

/// Append `pad_size` bytes of value `pad_size`, where
/// `pad_size = block_size - len % block_size`.
///
/// Padding is always present: an already aligned message gets a full block.
pub fn pad(message: &[u8], block_size: usize) -> Result<Vec<u8>> {
    if block_size == 0 || block_size > MAX_BLOCK_SIZE {
        return Err(Error::InvalidBlockSize(block_size));
    }

    let pad_size = block_size - message.len() % block_size;

    let mut padded = Vec::with_capacity(message.len() + pad_size);
    padded.extend_from_slice(message);
    padded.resize(message.len() + pad_size, pad_size as u8);
    Ok(padded)
}

/// Strip the padding added by [`pad`].
///
/// The trailing byte is the pad length; it must be non-zero and no larger
/// than the input.
pub fn unpad(padded: &[u8]) -> Result<&[u8]> {
    let Some(&last) = padded.last() else {
        return Err(Error::InvalidPadding("empty input".into()));
    };

    let pad_size = last as usize;
    if pad_size == 0 {
        return Err(Error::InvalidPadding("pad length byte is zero".into()));
    }
    if pad_size > padded.len() {
        return Err(Error::InvalidPadding(format!(
            "pad length {} exceeds {} bytes of input",
            pad_size,
            padded.len()
        )));
    }

    Ok(&padded[..padded.len() - pad_size])
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn test_pad_structure() {
        let padded = pad(b"Hello", 8).unwrap();
        assert_eq!(padded, b"Hello\x03\x03\x03");

        let padded = pad(b"", 4).unwrap();
        assert_eq!(padded, vec![4, 4, 4, 4]);
    }

    #[test]
    fn test_pad_aligned_adds_full_block() {
        let padded = pad(b"12345678", 8).unwrap();
        assert_eq!(padded.len(), 16);
        assert!(padded[8..].iter().all(|&b| b == 8));
    }

    #[test]
    fn test_roundtrip_all_lengths() {
        for block_size in [1usize, 2, 7, 31, 64, 255] {
            for len in 0..4 * block_size {
                let message: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
                let padded = pad(&message, block_size).unwrap();

                assert_eq!(padded.len() % block_size, 0);
                let pad_size = padded.len() - len;
                assert!((1..=block_size).contains(&pad_size));
                assert_eq!(unpad(&padded).unwrap(), message.as_slice());
            }
        }
    }

    #[test]
    fn test_invalid_block_size() {
        assert!(matches!(pad(b"abc", 0), Err(Error::InvalidBlockSize(0))));
        assert!(matches!(pad(b"abc", 256), Err(Error::InvalidBlockSize(256))));
    }

    #[test]
    fn test_unpad_rejects_bad_trailer() {
        assert!(matches!(unpad(b""), Err(Error::InvalidPadding(_))));
        assert!(matches!(unpad(b"abc\x00"), Err(Error::InvalidPadding(_))));
        assert!(matches!(unpad(b"ab\x05"), Err(Error::InvalidPadding(_))));
    }

    #[test]
    fn test_unpad_whole_input() {
        assert_eq!(unpad(&[3, 3, 3]).unwrap(), b"");
    }

    quickcheck! {
        fn prop_pad_unpad(message: Vec<u8>, block_size: u8) -> bool {
            if block_size == 0 {
                return true;
            }
            let padded = pad(&message, block_size as usize).unwrap();
            unpad(&padded).unwrap() == message.as_slice()
        }
    }
}
