//! Parser options for lenient or strict reading.

use crate::decoders::DEFAULT_MAX_DECOMPRESSED_SIZE;

/// Options controlling how the reader treats damaged input.
///
/// ```
/// use pdf_graft::parser_config::ParserOptions;
///
/// let strict = ParserOptions::strict();
/// assert!(strict.strict);
/// let lenient = ParserOptions::default();
/// assert!(!lenient.strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Fail instead of recovering. With `strict` set, a broken xref is an
    /// error rather than a trigger for reconstruction, and objects that fail
    /// to parse are not replaced by null.
    pub strict: bool,

    /// Maximum nesting of arrays and dictionaries.
    pub max_nesting: usize,

    /// Maximum decoded size of a single stream, in bytes.
    pub max_decompressed_size: usize,

    /// Maximum number of xref sections followed through `/Prev`.
    pub max_xref_chain: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::lenient()
    }
}

impl ParserOptions {
    /// Fail on the first structural error.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::lenient()
        }
    }

    /// Recover from damaged cross-reference data and unreadable objects.
    pub fn lenient() -> Self {
        Self {
            strict: false,
            max_nesting: 100,
            max_decompressed_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
            max_xref_chain: 100,
        }
    }

    /// Override the nesting limit.
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(ParserOptions::strict().strict);
        assert!(!ParserOptions::lenient().strict);
        assert_eq!(ParserOptions::default(), ParserOptions::lenient());
        assert_eq!(ParserOptions::strict().max_nesting, 100);
    }

    #[test]
    fn test_nesting_floor() {
        assert_eq!(ParserOptions::default().with_max_nesting(0).max_nesting, 1);
    }
}
