//! AES-128-CBC with a prepended IV and PKCS#7 padding, as used by the
//! AESV2 crypt filter.

use crate::error::{Error, Result};
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const BLOCK: usize = 16;

/// Encrypt `data`, returning `iv || ciphertext`.
pub fn aes128_encrypt(key: &[u8], iv: &[u8; BLOCK], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != BLOCK {
        return Err(Error::Unsupported(format!("AES-128 key of {} bytes", key.len())));
    }
    let pad = BLOCK - data.len() % BLOCK;
    let mut buf = data.to_vec();
    buf.extend(std::iter::repeat(pad as u8).take(pad));
    let len = buf.len();
    Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| Error::Unsupported("AES key or IV length".to_string()))?
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| Error::malformed(0, "AES encryption failed"))?;

    let mut out = Vec::with_capacity(BLOCK + len);
    out.extend_from_slice(iv);
    out.extend_from_slice(&buf);
    Ok(out)
}

/// Decrypt `iv || ciphertext` and strip the padding.
pub fn aes128_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != BLOCK {
        return Err(Error::Unsupported(format!("AES-128 key of {} bytes", key.len())));
    }
    if data.len() < BLOCK {
        // Some writers emit empty strings without an IV.
        return Ok(Vec::new());
    }
    let (iv, body) = data.split_at(BLOCK);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    if body.len() % BLOCK != 0 {
        return Err(Error::malformed(0, "AES ciphertext is not a whole number of blocks"));
    }

    let mut buf = body.to_vec();
    let plain = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|_| Error::Unsupported("AES key or IV length".to_string()))?
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| Error::malformed(0, "AES decryption failed"))?;

    let pad = plain.last().copied().unwrap_or(0) as usize;
    if pad == 0 || pad > BLOCK || plain[plain.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(Error::malformed(0, "invalid AES padding"));
    }
    Ok(plain[..plain.len() - pad].to_vec())
}
