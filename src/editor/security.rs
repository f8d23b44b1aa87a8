//! Password protection.

use crate::document::{EncryptionState, PdfDocument};
use crate::encryption::{build_standard, generate_file_id, Algorithm, Permissions};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use serde::{Deserialize, Serialize};

/// Settings for [`protect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectOptions {
    /// Cipher
    pub algorithm: Algorithm,
    /// Access granted to users who open with the user password
    #[serde(with = "permission_bits")]
    pub permissions: Permissions,
    /// Owner password; the user password is reused when `None`
    pub owner_password: Option<String>,
}

impl Default for ProtectOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Aes128,
            permissions: Permissions::all(),
            owner_password: None,
        }
    }
}

impl ProtectOptions {
    /// Use `algorithm`.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Grant `permissions`.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set a separate owner password.
    pub fn with_owner_password(mut self, password: impl Into<String>) -> Self {
        self.owner_password = Some(password.into());
        self
    }
}

mod permission_bits {
    use crate::encryption::Permissions;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(p: &Permissions, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(p.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Permissions, D::Error> {
        Ok(Permissions::from_bits_truncate(u32::deserialize(d)?))
    }
}

/// Encrypt `doc` with the Standard security handler.
///
/// The document is encrypted when it is written; in memory it stays
/// readable. A document that is already encrypted must be unlocked first.
pub fn protect(doc: &PdfDocument, user_password: &str, options: &ProtectOptions) -> Result<PdfDocument> {
    if doc.is_encrypted() {
        return Err(Error::Validation("document is already encrypted".to_string()));
    }
    if user_password.is_empty() {
        return Err(Error::Validation("user password must not be empty".to_string()));
    }
    let owner_password = options.owner_password.as_deref().unwrap_or(user_password);
    let file_id = doc.file_id().unwrap_or_else(generate_file_id);

    let (dict, info, handler) = build_standard(
        user_password.as_bytes(),
        owner_password.as_bytes(),
        options.algorithm,
        options.permissions,
        &file_id,
    );

    let mut out = doc.clone();
    let encrypt_ref = out.graph_mut().allocate(Object::Dictionary(dict));
    let trailer = out.graph_mut().trailer_mut();
    trailer.insert("Encrypt".to_string(), Object::Reference(encrypt_ref));
    trailer
        .entry("ID".to_string())
        .or_insert_with(|| Object::Array(vec![Object::String(file_id.clone()), Object::String(file_id)]));
    out.set_security(EncryptionState::Encrypted(info), Some(handler));
    out.detach_source();
    log::info!("protected document with {}", options.algorithm);
    Ok(out)
}

/// Remove encryption from `doc` given its user or owner password.
pub fn unlock(doc: &PdfDocument, password: &str) -> Result<PdfDocument> {
    let EncryptionState::Encrypted(info) = doc.encryption() else {
        return Err(Error::Validation("document is not encrypted".to_string()));
    };
    let handler = info.authenticate(password.as_bytes()).ok_or(Error::Authentication)?;

    let mut out = doc.clone();
    let encrypt_ref = out.graph().trailer().get("Encrypt").and_then(Object::as_reference);
    if doc.security_handler().is_none() {
        // Opened without the password: strings and streams are still ciphertext.
        let refs: Vec<ObjectRef> = out.graph().iter().map(|(r, _)| r).collect();
        for r in refs {
            if Some(r) == encrypt_ref {
                continue;
            }
            let obj = out.graph_mut().resolve_mut(r)?;
            if info.covers(obj) {
                handler.decrypt_object(r, obj)?;
            }
        }
    }
    out.graph_mut().trailer_mut().remove("Encrypt");
    if let Some(r) = encrypt_ref {
        out.graph_mut().remove(r);
    }
    out.set_security(EncryptionState::Plain, None);
    out.detach_source();
    log::info!("removed {} encryption", info.algorithm);
    Ok(out)
}
