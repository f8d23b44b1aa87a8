//! Standard security handler.
//!
//! Supported:
//! - RC4 40-bit (V1, R2)
//! - RC4 128-bit (V2, R3)
//! - AES-128 through the AESV2 crypt filter (V4, R4)
//!
//! Public-key handlers and AES-256 (V5) are reported as unsupported.
//! Permission bits are read and written but not enforced; the password is
//! the only gate.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use bitflags::bitflags;

mod aes;
mod algorithms;
mod handler;
mod rc4;

pub use algorithms::{generate_random_bytes, StandardParams};
pub use handler::SecurityHandler;

/// Cipher used for strings and streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Algorithm {
    /// RC4 with a 40-bit key
    Rc4_40,
    /// RC4 with a 128-bit key
    Rc4_128,
    /// AES-128 in CBC mode
    Aes128,
}

impl Algorithm {
    /// Key length in bytes.
    pub fn key_length(self) -> usize {
        match self {
            Algorithm::Rc4_40 => 5,
            Algorithm::Rc4_128 | Algorithm::Aes128 => 16,
        }
    }

    /// `(V, R)` written to the encryption dictionary.
    pub fn version_revision(self) -> (i64, u32) {
        match self {
            Algorithm::Rc4_40 => (1, 2),
            Algorithm::Rc4_128 => (2, 3),
            Algorithm::Aes128 => (4, 4),
        }
    }

    /// Whether this is an AES cipher.
    pub fn is_aes(self) -> bool {
        matches!(self, Algorithm::Aes128)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Algorithm::Rc4_40 => "RC4-40",
            Algorithm::Rc4_128 => "RC4-128",
            Algorithm::Aes128 => "AES-128",
        })
    }
}

bitflags! {
    /// User access permissions (`/P`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Bit 3: print
        const PRINT = 1 << 2;
        /// Bit 4: modify contents
        const MODIFY = 1 << 3;
        /// Bit 5: copy text and graphics
        const COPY = 1 << 4;
        /// Bit 6: add or modify annotations
        const ANNOTATE = 1 << 5;
        /// Bit 9: fill form fields
        const FILL_FORMS = 1 << 8;
        /// Bit 10: extract for accessibility
        const ACCESSIBILITY = 1 << 9;
        /// Bit 11: assemble (insert, rotate, delete pages)
        const ASSEMBLE = 1 << 10;
        /// Bit 12: high-quality print
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

impl Permissions {
    /// View-only access.
    pub fn read_only() -> Self {
        Permissions::ACCESSIBILITY
    }

    /// The signed `/P` value with the reserved bits set.
    pub fn to_p_value(self) -> i32 {
        (0xFFFF_F0C0u32 | self.bits()) as i32
    }

    /// Decode a `/P` value, ignoring reserved bits.
    pub fn from_p_value(p: i32) -> Self {
        Permissions::from_bits_truncate(p as u32)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::all()
    }
}

/// What the reader learned about an encrypted document.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionInfo {
    /// Cipher
    pub algorithm: Algorithm,
    /// `/R`
    pub revision: u32,
    /// Decoded `/P`
    pub permissions: Permissions,
    /// Standard handler values needed to re-check passwords
    pub params: StandardParams,
    /// The encryption dictionary as found in the file
    pub dict: Dict,
}

impl EncryptionInfo {
    /// Parse a Standard security handler dictionary.
    pub fn from_dict(dict: &Dict, file_id: &[u8]) -> Result<Self> {
        let filter = dict.get("Filter").and_then(|f| f.as_name()).unwrap_or("");
        if filter != "Standard" {
            return Err(Error::Unsupported(format!("security handler /{}", filter)));
        }
        let int = |key: &str| dict.get(key).and_then(|o| o.as_integer());
        let bytes = |key: &str| {
            dict.get(key)
                .and_then(|o| o.as_string())
                .map(|s| s.to_vec())
                .ok_or_else(|| Error::malformed(0, format!("encryption dictionary missing /{}", key)))
        };

        let v = int("V").unwrap_or(0);
        let r = int("R").unwrap_or(0);
        let algorithm = match (v, r) {
            (1, 2) => Algorithm::Rc4_40,
            (2, 2) | (2, 3) => {
                let bits = int("Length").unwrap_or(40);
                if bits > 40 {
                    Algorithm::Rc4_128
                } else {
                    Algorithm::Rc4_40
                }
            },
            (4, 4) => crypt_filter_algorithm(dict)?,
            _ => return Err(Error::Unsupported(format!("encryption V{} R{}", v, r))),
        };
        let key_length = match (algorithm, int("Length")) {
            (Algorithm::Rc4_128, Some(bits)) if (40..=128).contains(&bits) => bits as usize / 8,
            _ => algorithm.key_length(),
        };

        let p = int("P").ok_or_else(|| Error::malformed(0, "encryption dictionary missing /P"))? as i32;
        let params = StandardParams {
            revision: r as u32,
            key_length,
            owner_hash: bytes("O")?,
            user_hash: bytes("U")?,
            permissions: p,
            file_id: file_id.to_vec(),
            encrypt_metadata: dict
                .get("EncryptMetadata")
                .and_then(|o| o.as_bool())
                .unwrap_or(true),
        };

        Ok(Self {
            algorithm,
            revision: r as u32,
            permissions: Permissions::from_p_value(p),
            params,
            dict: dict.clone(),
        })
    }

    /// Whether the strings and streams of `obj` are encrypted under this
    /// handler. Metadata streams are left in the clear when
    /// `/EncryptMetadata` is false.
    pub fn covers(&self, obj: &Object) -> bool {
        if self.params.encrypt_metadata {
            return true;
        }
        !matches!(
            obj,
            Object::Stream { dict, .. } if dict.get("Type").and_then(|t| t.as_name()) == Some("Metadata")
        )
    }

    /// Try `password` as user password, then as owner password.
    pub fn authenticate(&self, password: &[u8]) -> Option<SecurityHandler> {
        algorithms::authenticate_user(password, &self.params)
            .or_else(|| algorithms::authenticate_owner(password, &self.params))
            .map(|key| SecurityHandler::new(self.algorithm, key))
    }
}

/// V4 files name their cipher through `/CF /StdCF /CFM`.
fn crypt_filter_algorithm(dict: &Dict) -> Result<Algorithm> {
    let stm_filter = dict.get("StmF").and_then(|o| o.as_name()).unwrap_or("Identity");
    if stm_filter == "Identity" {
        return Err(Error::Unsupported("Identity crypt filter".to_string()));
    }
    let cfm = dict
        .get("CF")
        .and_then(|cf| cf.as_dict())
        .and_then(|cf| cf.get(stm_filter))
        .and_then(|f| f.as_dict())
        .and_then(|f| f.get("CFM"))
        .and_then(|m| m.as_name())
        .unwrap_or("None");
    match cfm {
        "AESV2" => Ok(Algorithm::Aes128),
        "V2" => Ok(Algorithm::Rc4_128),
        other => Err(Error::Unsupported(format!("crypt filter method /{}", other))),
    }
}

/// Build a Standard security handler dictionary for new passwords.
///
/// Returns the dictionary to store under `/Encrypt`, the parsed view of it,
/// and the handler keyed for writing.
pub fn build_standard(
    user_password: &[u8],
    owner_password: &[u8],
    algorithm: Algorithm,
    permissions: Permissions,
    file_id: &[u8],
) -> (Dict, EncryptionInfo, SecurityHandler) {
    let (v, r) = algorithm.version_revision();
    let key_length = algorithm.key_length();
    let owner_hash = algorithms::compute_owner_hash(owner_password, user_password, r, key_length);
    let mut params = StandardParams {
        revision: r,
        key_length,
        owner_hash,
        user_hash: Vec::new(),
        permissions: permissions.to_p_value(),
        file_id: file_id.to_vec(),
        encrypt_metadata: true,
    };
    let key = algorithms::compute_key(user_password, &params);
    params.user_hash = algorithms::compute_user_hash(&key, r, file_id);

    let mut dict = Dict::new();
    dict.insert("Filter".into(), Object::name("Standard"));
    dict.insert("V".into(), Object::Integer(v));
    dict.insert("R".into(), Object::Integer(r as i64));
    dict.insert("Length".into(), Object::Integer(key_length as i64 * 8));
    dict.insert("O".into(), Object::String(params.owner_hash.clone()));
    dict.insert("U".into(), Object::String(params.user_hash.clone()));
    dict.insert("P".into(), Object::Integer(params.permissions as i64));
    if algorithm.is_aes() {
        dict.insert(
            "CF".into(),
            Object::dict(vec![(
                "StdCF",
                Object::dict(vec![
                    ("Type", Object::name("CryptFilter")),
                    ("CFM", Object::name("AESV2")),
                    ("AuthEvent", Object::name("DocOpen")),
                    ("Length", Object::Integer(16)),
                ]),
            )]),
        );
        dict.insert("StmF".into(), Object::name("StdCF"));
        dict.insert("StrF".into(), Object::name("StdCF"));
    }

    let info = EncryptionInfo {
        algorithm,
        revision: r,
        permissions,
        params,
        dict: dict.clone(),
    };
    (dict, info, SecurityHandler::new(algorithm, key))
}

/// A fresh 16-byte file identifier.
pub fn generate_file_id() -> Vec<u8> {
    generate_random_bytes(16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_p_value() {
        let all = Permissions::all().to_p_value();
        assert_eq!(all as u32 & 0xFFFF_F0C0, 0xFFFF_F0C0);
        assert_eq!(Permissions::from_p_value(all), Permissions::all());
        let ro = Permissions::read_only();
        assert!(!Permissions::from_p_value(ro.to_p_value()).contains(Permissions::PRINT));
    }

    #[test]
    fn test_build_then_parse_then_authenticate() {
        let id = generate_file_id();
        for alg in [Algorithm::Rc4_40, Algorithm::Rc4_128, Algorithm::Aes128] {
            let (dict, _, writer) =
                build_standard(b"user", b"owner", alg, Permissions::all(), &id);
            let info = EncryptionInfo::from_dict(&dict, &id).unwrap();
            assert_eq!(info.algorithm, alg);
            let reader = info.authenticate(b"user").unwrap();
            assert_eq!(reader.key(), writer.key());
            assert!(info.authenticate(b"owner").is_some());
            assert!(info.authenticate(b"guess").is_none());
        }
    }

    #[test]
    fn test_unsupported_handlers() {
        let pubsec = Object::dict(vec![("Filter", Object::name("Adobe.PubSec"))]);
        let err = EncryptionInfo::from_dict(pubsec.as_dict().unwrap(), b"").unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));

        let v5 = Object::dict(vec![
            ("Filter", Object::name("Standard")),
            ("V", Object::Integer(5)),
            ("R", Object::Integer(6)),
        ]);
        let err = EncryptionInfo::from_dict(v5.as_dict().unwrap(), b"").unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
