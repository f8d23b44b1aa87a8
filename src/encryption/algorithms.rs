//! Key derivation and password checks for the Standard security handler,
//! revisions 2 through 4 (MD5 + RC4 based).

use super::rc4::rc4_crypt;
use md5::{Digest, Md5};

/// Password padding string.
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// The inputs shared by every Standard handler computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardParams {
    /// `/R`
    pub revision: u32,
    /// Key length in bytes (5 to 16)
    pub key_length: usize,
    /// `/O`
    pub owner_hash: Vec<u8>,
    /// `/U`
    pub user_hash: Vec<u8>,
    /// `/P`
    pub permissions: i32,
    /// First element of the trailer `/ID`
    pub file_id: Vec<u8>,
    /// `/EncryptMetadata`
    pub encrypt_metadata: bool,
}

/// Pad or truncate a password to 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = PADDING;
    let n = password.len().min(32);
    out[..n].copy_from_slice(&password[..n]);
    out[n..].copy_from_slice(&PADDING[..32 - n]);
    out
}

fn md5_rounds(mut hash: Vec<u8>, take: usize, rounds: usize) -> Vec<u8> {
    for _ in 0..rounds {
        hash = Md5::digest(&hash[..take]).to_vec();
    }
    hash
}

/// Derive the file encryption key from a user password (Algorithm 2).
pub fn compute_key(password: &[u8], params: &StandardParams) -> Vec<u8> {
    let n = params.key_length.clamp(5, 16);
    let mut hasher = Md5::new();
    hasher.update(pad_password(password));
    hasher.update(&params.owner_hash[..params.owner_hash.len().min(32)]);
    hasher.update(params.permissions.to_le_bytes());
    hasher.update(&params.file_id);
    if params.revision >= 4 && !params.encrypt_metadata {
        hasher.update([0xFF; 4]);
    }
    let mut hash = hasher.finalize().to_vec();
    if params.revision >= 3 {
        hash = md5_rounds(hash, n, 50);
    }
    hash.truncate(n);
    hash
}

/// RC4 key derived from the owner password (Algorithm 3, steps a-d).
fn owner_rc4_key(owner_password: &[u8], revision: u32, key_length: usize) -> Vec<u8> {
    let n = key_length.clamp(5, 16);
    let mut hash = Md5::digest(pad_password(owner_password)).to_vec();
    if revision >= 3 {
        hash = md5_rounds(hash, 16, 50);
    }
    hash.truncate(n);
    hash
}

fn xor_key(key: &[u8], i: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ i).collect()
}

/// Compute the `/O` value (Algorithm 3). An empty owner password falls back
/// to the user password.
pub fn compute_owner_hash(owner_password: &[u8], user_password: &[u8], revision: u32, key_length: usize) -> Vec<u8> {
    let owner = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };
    let key = owner_rc4_key(owner, revision, key_length);
    let mut out = rc4_crypt(&key, &pad_password(user_password));
    if revision >= 3 {
        for i in 1..=19u8 {
            out = rc4_crypt(&xor_key(&key, i), &out);
        }
    }
    out
}

/// Compute the `/U` value for a file key (Algorithm 4 for R2, 5 for R3+).
pub fn compute_user_hash(key: &[u8], revision: u32, file_id: &[u8]) -> Vec<u8> {
    if revision < 3 {
        return rc4_crypt(key, &PADDING);
    }
    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let mut out = rc4_crypt(key, &hasher.finalize());
    for i in 1..=19u8 {
        out = rc4_crypt(&xor_key(key, i), &out);
    }
    // Arbitrary padding to 32 bytes.
    out.extend_from_slice(&PADDING[..16]);
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check a user password. Returns the file key on success.
pub fn authenticate_user(password: &[u8], params: &StandardParams) -> Option<Vec<u8>> {
    let key = compute_key(password, params);
    let expected = compute_user_hash(&key, params.revision, &params.file_id);
    // R3+ only defines the first 16 bytes.
    let cmp = if params.revision >= 3 { 16 } else { 32 };
    if params.user_hash.len() < cmp {
        return None;
    }
    constant_time_eq(&params.user_hash[..cmp], &expected[..cmp]).then_some(key)
}

/// Check an owner password (Algorithm 7): recover the user password from
/// `/O`, then authenticate it. Returns the file key on success.
pub fn authenticate_owner(password: &[u8], params: &StandardParams) -> Option<Vec<u8>> {
    if params.owner_hash.len() < 32 {
        return None;
    }
    let key = owner_rc4_key(password, params.revision, params.key_length);
    let mut user = params.owner_hash[..32].to_vec();
    if params.revision >= 3 {
        for i in (0..=19u8).rev() {
            user = rc4_crypt(&xor_key(&key, i), &user);
        }
    } else {
        user = rc4_crypt(&key, &user);
    }
    authenticate_user(&user, params)
}

/// Per-object key (Algorithm 1): MD5 of the file key, the low three bytes of
/// the object number, the low two bytes of the generation, and `sAlT` for
/// AES. Truncated to `min(n + 5, 16)` bytes.
pub fn object_key(file_key: &[u8], id: u32, gen: u16, aes: bool) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&id.to_le_bytes()[..3]);
    hasher.update(gen.to_le_bytes());
    if aes {
        hasher.update(b"sAlT");
    }
    let hash = hasher.finalize();
    hash[..(file_key.len() + 5).min(16)].to_vec()
}

/// Unpredictable bytes from v4 UUIDs mixed with the clock through MD5.
pub fn generate_random_bytes(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let mut hasher = Md5::new();
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        hasher.update(now.as_nanos().to_le_bytes());
        let hash = hasher.finalize();
        let take = (len - out.len()).min(hash.len());
        out.extend_from_slice(&hash[..take]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_for(user: &[u8], owner: &[u8], revision: u32, key_length: usize) -> StandardParams {
        let mut p = StandardParams {
            revision,
            key_length,
            owner_hash: compute_owner_hash(owner, user, revision, key_length),
            user_hash: Vec::new(),
            permissions: -4,
            file_id: b"0123456789abcdef".to_vec(),
            encrypt_metadata: true,
        };
        let key = compute_key(user, &p);
        p.user_hash = compute_user_hash(&key, revision, &p.file_id);
        p
    }

    #[test]
    fn test_pad_password() {
        assert_eq!(pad_password(b""), PADDING);
        let p = pad_password(b"abc");
        assert_eq!(&p[..3], b"abc");
        assert_eq!(&p[3..], &PADDING[..29]);
        assert_eq!(pad_password(&[b'x'; 40]), [b'x'; 32]);
    }

    #[test]
    fn test_user_password_r3() {
        let p = params_for(b"secret", b"owner", 3, 16);
        let key = authenticate_user(b"secret", &p).unwrap();
        assert_eq!(key.len(), 16);
        assert!(authenticate_user(b"wrong", &p).is_none());
    }

    #[test]
    fn test_user_password_r2() {
        let p = params_for(b"pw", b"", 2, 5);
        assert!(authenticate_user(b"pw", &p).is_some());
        assert!(authenticate_user(b"px", &p).is_none());
    }

    #[test]
    fn test_owner_password_recovers_key() {
        let p = params_for(b"user", b"owner", 4, 16);
        let via_user = authenticate_user(b"user", &p).unwrap();
        let via_owner = authenticate_owner(b"owner", &p).unwrap();
        assert_eq!(via_user, via_owner);
        assert!(authenticate_owner(b"nope", &p).is_none());
    }

    #[test]
    fn test_object_key_lengths() {
        assert_eq!(object_key(&[1u8; 5], 7, 0, false).len(), 10);
        assert_eq!(object_key(&[1u8; 16], 7, 0, true).len(), 16);
        assert_ne!(object_key(&[1u8; 16], 7, 0, true), object_key(&[1u8; 16], 7, 0, false));
    }

    #[test]
    fn test_random_bytes() {
        let a = generate_random_bytes(20);
        let b = generate_random_bytes(20);
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
    }
}
