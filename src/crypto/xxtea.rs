//! XXTEA payload cipher
//!
//! Byte-compatible with the common `xxtea` libraries: the plaintext length is
//! appended as a trailing little-endian word before encryption, and keys are
//! zero-padded or truncated to 16 bytes.

use crate::error::WechatError;

const DELTA: u32 = 0x9E37_79B9;

/// Symmetric cipher used to seal user payloads.
///
/// Implementations must satisfy `decrypt(encrypt(data, key), key) == data`.
pub trait PayloadCipher: Send + Sync {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, WechatError>;

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, WechatError>;
}

/// The XXTEA block cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxtea;

impl PayloadCipher for Xxtea {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, WechatError> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        if data.len() > u32::MAX as usize {
            return Err(WechatError::Crypto("payload too large".to_string()));
        }

        let mut v = to_words(data, true);
        encrypt_words(&mut v, &fixed_key(key));
        Ok(to_bytes(&v))
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, WechatError> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        if data.len() % 4 != 0 || data.len() < 8 {
            return Err(WechatError::Crypto(format!(
                "invalid ciphertext length: {}",
                data.len()
            )));
        }

        let mut v = to_words(data, false);
        decrypt_words(&mut v, &fixed_key(key));
        strip_length(v).ok_or_else(|| WechatError::Crypto("decryption failed".to_string()))
    }
}

fn fixed_key(key: &[u8]) -> [u32; 4] {
    let mut bytes = [0u8; 16];
    let len = key.len().min(16);
    bytes[..len].copy_from_slice(&key[..len]);

    let mut k = [0u32; 4];
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        k[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    k
}

fn to_words(data: &[u8], include_length: bool) -> Vec<u32> {
    let n = (data.len() + 3) / 4;
    let mut words = vec![0u32; n + usize::from(include_length)];
    for (i, chunk) in data.chunks(4).enumerate() {
        let mut buf = [0u8; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        words[i] = u32::from_le_bytes(buf);
    }
    if include_length {
        words[n] = data.len() as u32;
    }
    words
}

fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn strip_length(words: Vec<u32>) -> Option<Vec<u8>> {
    let (&len, body) = words.split_last()?;
    let len = len as usize;
    let capacity = body.len() * 4;
    if len > capacity || len + 3 < capacity {
        return None;
    }
    let mut bytes = to_bytes(body);
    bytes.truncate(len);
    Some(bytes)
}

#[inline]
fn mx(sum: u32, y: u32, z: u32, p: usize, e: usize, k: &[u32; 4]) -> u32 {
    (((z >> 5) ^ (y << 2)).wrapping_add((y >> 3) ^ (z << 4)))
        ^ ((sum ^ y).wrapping_add(k[(p & 3) ^ e] ^ z))
}

fn encrypt_words(v: &mut [u32], k: &[u32; 4]) {
    let n = v.len() - 1;
    let mut z = v[n];
    let mut sum = 0u32;
    let mut rounds = 6 + 52 / v.len();

    while rounds > 0 {
        sum = sum.wrapping_add(DELTA);
        let e = ((sum >> 2) & 3) as usize;
        for p in 0..n {
            let y = v[p + 1];
            v[p] = v[p].wrapping_add(mx(sum, y, z, p, e, k));
            z = v[p];
        }
        let y = v[0];
        v[n] = v[n].wrapping_add(mx(sum, y, z, n, e, k));
        z = v[n];
        rounds -= 1;
    }
}

fn decrypt_words(v: &mut [u32], k: &[u32; 4]) {
    let n = v.len() - 1;
    let mut y = v[0];
    let rounds = 6 + 52 / v.len();
    let mut sum = (rounds as u32).wrapping_mul(DELTA);

    while sum != 0 {
        let e = ((sum >> 2) & 3) as usize;
        for p in (1..=n).rev() {
            let z = v[p - 1];
            v[p] = v[p].wrapping_sub(mx(sum, y, z, p, e, k));
            y = v[p];
        }
        let z = v[n];
        v[0] = v[0].wrapping_sub(mx(sum, y, z, 0, e, k));
        y = v[0];
        sum = sum.wrapping_sub(DELTA);
    }
}
