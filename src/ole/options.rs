use super::consts::DEFAULT_CODEPAGE;

/// Options for parsing a compound file.
///
/// # Examples
///
/// ```rust
/// use olecf::ole::ParseOptions;
///
/// // Create with defaults
/// let options = ParseOptions::default();
///
/// // Or customize
/// let options = ParseOptions::new()
///     .with_max_chain_sectors(Some(4096))
///     .with_require_summary_information(false);
/// assert_eq!(options.max_chain_sectors, Some(4096));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Upper bound on the length of any sector chain, on top of the
    /// table-length bound that always applies
    pub max_chain_sectors: Option<usize>,
    /// Fail when the SummaryInformation stream is absent; otherwise the
    /// container is returned with no properties
    pub require_summary_information: bool,
    /// Codepage for property strings that precede any `CodePage` property
    pub default_codepage: u32,
    /// Read small streams from the mini stream when a mini-FAT is present
    pub use_mini_stream: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_chain_sectors: None,
            require_summary_information: true,
            default_codepage: DEFAULT_CODEPAGE,
            use_mini_stream: true,
        }
    }
}

impl ParseOptions {
    /// Create a new `ParseOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of sectors any single chain may span.
    #[inline]
    pub fn with_max_chain_sectors(mut self, limit: Option<usize>) -> Self {
        self.max_chain_sectors = limit;
        self
    }

    /// Set whether a missing SummaryInformation stream is an error.
    #[inline]
    pub fn with_require_summary_information(mut self, require: bool) -> Self {
        self.require_summary_information = require;
        self
    }

    /// Set the codepage used before a `CodePage` property is seen.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use olecf::ole::ParseOptions;
    ///
    /// let options = ParseOptions::new().with_default_codepage(1251);
    /// ```
    #[inline]
    pub fn with_default_codepage(mut self, codepage: u32) -> Self {
        self.default_codepage = codepage;
        self
    }

    /// Set whether small streams are read through the mini-FAT.
    ///
    /// When disabled every stream is read through the regular FAT.
    #[inline]
    pub fn with_mini_stream(mut self, enabled: bool) -> Self {
        self.use_mini_stream = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.max_chain_sectors, None);
        assert!(options.require_summary_information);
        assert_eq!(options.default_codepage, 1252);
        assert!(options.use_mini_stream);
        assert_eq!(options, ParseOptions::new());
    }

    #[test]
    fn test_builder_chain() {
        let options = ParseOptions::new()
            .with_max_chain_sectors(Some(8))
            .with_require_summary_information(false)
            .with_default_codepage(932)
            .with_mini_stream(false);
        assert_eq!(options.max_chain_sectors, Some(8));
        assert!(!options.require_summary_information);
        assert_eq!(options.default_codepage, 932);
        assert!(!options.use_mini_stream);
    }
}
