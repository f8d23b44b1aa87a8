//! Engine-wide configuration.

use crate::editor::ProtectOptions;
use crate::encryption::Algorithm;
use crate::geometry::PageSize;
use crate::parser_config::ParserOptions;
use crate::writer::SaveOptions;

/// Defaults for reading, saving and creating documents.
///
/// ```
/// use pdf_graft::config::EngineConfig;
/// use pdf_graft::geometry::PageSize;
/// use pdf_graft::parser_config::ParserOptions;
///
/// let config = EngineConfig::new()
///     .with_parser(ParserOptions::strict())
///     .with_default_page_size(PageSize::A4);
/// assert!(config.parser.strict);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How damaged input is treated.
    pub parser: ParserOptions,

    /// How documents are written.
    pub save: SaveOptions,

    /// Size of pages created from scratch.
    pub default_page_size: PageSize,

    /// Settings used when protecting a document.
    pub encryption: ProtectOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Lenient parsing, full rewrites, Letter pages and AES-128.
    pub fn new() -> Self {
        Self {
            parser: ParserOptions::default(),
            save: SaveOptions::default(),
            default_page_size: PageSize::Letter,
            encryption: ProtectOptions::default(),
        }
    }

    /// Set parser options.
    pub fn with_parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    /// Set save options.
    pub fn with_save(mut self, save: SaveOptions) -> Self {
        self.save = save;
        self
    }

    /// Set the size of new pages.
    pub fn with_default_page_size(mut self, size: PageSize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Set protection defaults.
    pub fn with_encryption(mut self, encryption: ProtectOptions) -> Self {
        self.encryption = encryption;
        self
    }

    /// Shorthand for changing only the cipher.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.encryption.algorithm = algorithm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.parser.strict);
        assert!(!config.save.incremental);
        assert_eq!(config.default_page_size, PageSize::Letter);
        assert_eq!(config.encryption.algorithm, Algorithm::Aes128);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_save(SaveOptions::incremental())
            .with_algorithm(Algorithm::Rc4_128);
        assert!(config.save.incremental);
        assert_eq!(config.encryption.algorithm, Algorithm::Rc4_128);
    }
}
