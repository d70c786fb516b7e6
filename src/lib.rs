//! olecf - A Rust library for reading Compound File Binary (OLE2) containers
//!
//! Compound files are the structured-storage envelope of legacy Microsoft
//! Office documents (.doc, .xls, .ppt, .msg): a small filesystem of
//! fixed-size sectors linked through a File Allocation Table, a directory of
//! named storages and streams, and property-set streams carrying metadata.
//!
//! # Features
//!
//! - **Header validation**: every fixed field is checked, failures name the field
//! - **Hardened chains**: cycles and out-of-range links are errors, never hangs
//! - **Directory access**: flat lookup, storage paths and tree traversal
//! - **Mini streams**: small streams are read through the mini-FAT
//! - **Property sets**: SummaryInformation decoding with codepage-aware strings
//!
//! # Example - Reading the summary
//!
//! ```no_run
//! use olecf::ole::{parse_file, ParseOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = parse_file("document.doc", &ParseOptions::default())?;
//! for (id, value) in &container.properties {
//!     println!("{}: {}", id, value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level OLE access
//!
//! ```no_run
//! use std::fs::File;
//! use olecf::ole::OleFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("document.doc")?;
//! let mut ole = OleFile::open(file)?;
//!
//! // List all streams
//! for path in ole.directory().stream_paths()? {
//!     println!("Stream: {}", path.join("/"));
//! }
//!
//! // Open a specific stream
//! let data = ole.open_stream("WordDocument")?;
//! println!("Stream size: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```

pub mod common;

/// Compound file parser
///
/// Header validation, FAT assembly, chain reading, directory decoding and
/// property-set decoding.
pub mod ole;

// Re-export commonly used types for convenience
pub use ole::{Container, OleError, OleFile, ParseOptions, parse, parse_file};
