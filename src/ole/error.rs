//! Error types for compound file parsing.
//!
//! Every failure in the pipeline surfaces as a single [`OleError`]; header
//! checks report a [`ValidationError`] naming the offending field together
//! with the expected and found values.

use crate::common::binary::BinaryError;
use std::io;
use thiserror::Error;

/// Result type for OLE operations.
pub type Result<T> = std::result::Result<T, OleError>;

/// Error types for OLE file parsing
#[derive(Error, Debug)]
pub enum OleError {
    /// IO error while opening or reading the source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A sector could not be read in full
    #[error("could not read sector {sector}: {source}")]
    SectorRead {
        sector: u32,
        #[source]
        source: io::Error,
    },

    /// The source ends before the fixed header does
    #[error("file too short: header needs {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// A header field failed validation
    #[error("invalid header: {0}")]
    Validation(#[from] ValidationError),

    /// Structural problem in the decoded data
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A sector chain loops, leaves the allocation table or exceeds its limit
    #[error("corrupt sector chain starting at {start}: {reason} (at sector {sector:#x})")]
    CorruptChain {
        start: u32,
        sector: u32,
        reason: ChainFault,
    },

    /// The directory tree references an entry that does not exist or loops
    #[error("corrupt directory: {0}")]
    CorruptDirectory(String),

    /// Named stream is not present in the directory
    #[error("stream not found: {0:?}")]
    StreamNotFound(String),

    /// Rendering a decoded structure failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Why a chain walk was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFault {
    /// The sector index is not covered by the allocation table
    OutOfRange { table_len: usize },
    /// The sector was already part of this chain
    Cycle,
    /// The chain is longer than allowed
    TooLong { limit: usize },
    /// A sentinel other than end-of-chain appeared inside the chain
    UnexpectedSentinel,
}

impl std::fmt::Display for ChainFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainFault::OutOfRange { table_len } => {
                write!(f, "index outside allocation table of {} entries", table_len)
            },
            ChainFault::Cycle => write!(f, "cycle detected"),
            ChainFault::TooLong { limit } => write!(f, "chain longer than {} sectors", limit),
            ChainFault::UnexpectedSentinel => write!(f, "unexpected sentinel"),
        }
    }
}

/// One failed header check. Validation stops at the first failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid file signature {found:02X?}")]
    Signature { found: [u8; 8] },

    #[error("invalid minor version: expected {expected:#06x}, found {found:#06x}")]
    MinorVersion { expected: u16, found: u16 },

    #[error("invalid major version: expected 3 or 4, found {found}")]
    MajorVersion { found: u16 },

    #[error("invalid byte order: expected {expected:#06x}, found {found:#06x}")]
    ByteOrder { expected: u16, found: u16 },

    #[error("invalid sector shift for major version {major_version}: expected {expected}, found {found}")]
    SectorShift {
        major_version: u16,
        expected: u16,
        found: u16,
    },

    #[error("invalid mini sector shift: expected {expected}, found {found}")]
    MiniSectorShift { expected: u16, found: u16 },

    #[error("invalid number of directory sectors: expected 0 for major version 3, found {found}")]
    DirectorySectorCount { found: u32 },

    #[error("invalid mini stream cutoff size: expected {expected:#x}, found {found:#x}")]
    MiniStreamCutoff { expected: u32, found: u32 },
}

impl From<BinaryError> for OleError {
    fn from(err: BinaryError) -> Self {
        OleError::InvalidFormat(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = OleError::from(ValidationError::MinorVersion {
            expected: 0x3E,
            found: 0x3B,
        });
        assert_eq!(
            err.to_string(),
            "invalid header: invalid minor version: expected 0x003e, found 0x003b"
        );
    }

    #[test]
    fn test_chain_error_message() {
        let err = OleError::CorruptChain {
            start: 2,
            sector: 2,
            reason: ChainFault::Cycle,
        };
        assert_eq!(
            err.to_string(),
            "corrupt sector chain starting at 2: cycle detected (at sector 0x2)"
        );
    }

    #[test]
    fn test_binary_error_becomes_format_error() {
        let err: OleError = BinaryError::InsufficientData {
            offset: 4,
            needed: 4,
            available: 2,
        }
        .into();
        assert!(matches!(err, OleError::InvalidFormat(_)));
    }
}
