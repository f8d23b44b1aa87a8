//! PDF object types.
//!
//! [`Object`] is the value model for everything stored in a document: the
//! eight basic PDF types plus indirect references.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Dictionary payload shared by `Dictionary` and `Stream` objects.
pub type Dict = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Stream (dictionary + raw, possibly filter-encoded, data)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Stream data
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Build a name object.
    pub fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    /// Build a string object from UTF-8 text.
    pub fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec())
    }

    /// Build a dictionary object from key/value pairs.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Build a `[llx lly urx ury]` rectangle array.
    pub fn rect(llx: f64, lly: f64, urx: f64, ury: f64) -> Object {
        Object::Array(vec![
            Object::number(llx),
            Object::number(lly),
            Object::number(urx),
            Object::number(ury),
        ])
    }

    /// Numeric object that stays an integer when the value is whole.
    pub fn number(value: f64) -> Object {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Object::Integer(value as i64)
        } else {
            Object::Real(value)
        }
    }

    /// Build a stream object; `Length` is filled in on write.
    pub fn stream(dict: Dict, data: impl Into<bytes::Bytes>) -> Object {
        Object::Stream {
            dict,
            data: data.into(),
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to read any numeric value as `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Mutable variant of [`Object::as_dict`].
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Dictionary access that reports the actual type on mismatch.
    pub fn expect_dict(&self) -> Result<&Dict> {
        self.as_dict()
            .ok_or_else(|| Error::wrong_type("Dictionary", self.type_name()))
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to mutable array.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to real number.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Read a `[a b c d]` numeric array as four floats.
    pub fn as_rect(&self) -> Option<[f64; 4]> {
        let arr = self.as_array()?;
        if arr.len() != 4 {
            return None;
        }
        let mut out = [0.0; 4];
        for (slot, obj) in out.iter_mut().zip(arr) {
            *slot = obj.as_number()?;
        }
        Some(out)
    }

    /// Call `f` on every reference directly or transitively contained in
    /// this value (not following references).
    pub fn for_each_reference(&self, f: &mut impl FnMut(ObjectRef)) {
        match self {
            Object::Reference(r) => f(*r),
            Object::Array(arr) => arr.iter().for_each(|o| o.for_each_reference(f)),
            Object::Dictionary(d) | Object::Stream { dict: d, .. } => {
                d.values().for_each(|o| o.for_each_reference(f))
            },
            _ => {},
        }
    }

    /// Rewrite every reference in place through `map`.
    pub fn remap_references(&mut self, map: &impl Fn(ObjectRef) -> ObjectRef) {
        match self {
            Object::Reference(r) => *r = map(*r),
            Object::Array(arr) => arr.iter_mut().for_each(|o| o.remap_references(map)),
            Object::Dictionary(d) | Object::Stream { dict: d, .. } => {
                d.values_mut().for_each(|o| o.remap_references(map))
            },
            _ => {},
        }
    }

    /// Decode stream data using the filters named in the stream dictionary.
    ///
    /// Returns [`Error::InvalidObjectType`] for non-stream objects and
    /// [`Error::Unsupported`] for filters the engine cannot decode.
    pub fn decode_stream_data(&self) -> Result<Vec<u8>> {
        self.decode_stream_data_with_limit(crate::decoders::DEFAULT_MAX_DECOMPRESSED_SIZE)
    }

    /// Like [`Object::decode_stream_data`] with an explicit output limit.
    pub fn decode_stream_data_with_limit(&self, max_size: usize) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters = dict
                    .get("Filter")
                    .map(extract_filter_names)
                    .unwrap_or_default();
                if filters.is_empty() {
                    return Ok(data.to_vec());
                }
                let params = extract_decode_params(dict.get("DecodeParms"));
                crate::decoders::decode_stream_with_limit(data, &filters, params.as_ref(), max_size)
            },
            _ => Err(Error::wrong_type("Stream", self.type_name())),
        }
    }
}

/// Filter entry is either a single name or an array of names.
fn extract_filter_names(filter_obj: &Object) -> Vec<String> {
    match filter_obj {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}

/// Predictor parameters from a DecodeParms dictionary (or the first
/// dictionary in a DecodeParms array).
fn extract_decode_params(params_obj: Option<&Object>) -> Option<crate::decoders::DecodeParams> {
    let dict = match params_obj? {
        Object::Dictionary(d) => d,
        Object::Array(arr) => arr.iter().filter_map(|obj| obj.as_dict()).next()?,
        _ => return None,
    };
    let get = |key: &str, default: i64| dict.get(key).and_then(|o| o.as_integer()).unwrap_or(default);

    Some(crate::decoders::DecodeParams {
        predictor: get("Predictor", 1),
        columns: get("Columns", 1).max(1) as usize,
        colors: get("Colors", 1).max(1) as usize,
        bits_per_component: get("BitsPerComponent", 8).max(1) as usize,
    })
}
