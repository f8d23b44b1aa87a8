//! Applies a file key to strings and streams.

use super::algorithms::{generate_random_bytes, object_key};
use super::{aes, rc4, Algorithm};
use crate::error::Result;
use crate::object::{Object, ObjectRef};

/// An authenticated (or freshly created) file key plus its cipher.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityHandler {
    algorithm: Algorithm,
    key: Vec<u8>,
}

impl std::fmt::Debug for SecurityHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityHandler")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SecurityHandler {
    /// Wrap a file key.
    pub fn new(algorithm: Algorithm, key: Vec<u8>) -> Self {
        Self { algorithm, key }
    }

    /// The cipher.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The file key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Decrypt the bytes of a string or stream belonging to object `r`.
    pub fn decrypt_bytes(&self, r: ObjectRef, data: &[u8]) -> Result<Vec<u8>> {
        let key = object_key(&self.key, r.id, r.gen, self.algorithm.is_aes());
        if self.algorithm.is_aes() {
            aes::aes128_decrypt(&key, data)
        } else {
            Ok(rc4::rc4_crypt(&key, data))
        }
    }

    /// Encrypt the bytes of a string or stream belonging to object `r`.
    pub fn encrypt_bytes(&self, r: ObjectRef, data: &[u8]) -> Result<Vec<u8>> {
        let key = object_key(&self.key, r.id, r.gen, self.algorithm.is_aes());
        if self.algorithm.is_aes() {
            let mut iv = [0u8; 16];
            iv.copy_from_slice(&generate_random_bytes(16));
            aes::aes128_encrypt(&key, &iv, data)
        } else {
            Ok(rc4::rc4_crypt(&key, data))
        }
    }

    /// Decrypt every string and stream body inside indirect object `r`.
    pub fn decrypt_object(&self, r: ObjectRef, obj: &mut Object) -> Result<()> {
        self.transform(r, obj, &|h, r, d| h.decrypt_bytes(r, d))
    }

    /// Encrypt every string and stream body inside indirect object `r`.
    pub fn encrypt_object(&self, r: ObjectRef, obj: &mut Object) -> Result<()> {
        self.transform(r, obj, &|h, r, d| h.encrypt_bytes(r, d))
    }

    fn transform(
        &self,
        r: ObjectRef,
        obj: &mut Object,
        f: &dyn Fn(&Self, ObjectRef, &[u8]) -> Result<Vec<u8>>,
    ) -> Result<()> {
        match obj {
            Object::String(s) => *s = f(self, r, s)?,
            Object::Array(arr) => {
                for item in arr {
                    self.transform(r, item, f)?;
                }
            },
            Object::Dictionary(d) => {
                for value in d.values_mut() {
                    self.transform(r, value, f)?;
                }
            },
            Object::Stream { dict, data } => {
                // Cross-reference streams are never encrypted.
                if dict.get("Type").and_then(|t| t.as_name()) == Some("XRef") {
                    return Ok(());
                }
                for value in dict.values_mut() {
                    self.transform(r, value, f)?;
                }
                *data = f(self, r, data)?.into();
            },
            _ => {},
        }
        Ok(())
    }
}
