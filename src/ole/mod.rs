/// Constants for OLE file format
pub mod consts;

/// Codepage-aware string decoding
pub mod codepage;

mod chain;
mod directory;
mod error;
mod fat;
mod file;
mod header;
mod metadata;
mod options;
mod property;
mod sector;
mod stream;
mod time;

// Re-export public types for convenient access
pub use chain::{read_chain, read_chain_with_limit, read_mini_chain, walk_chain};
pub use directory::{DirEntry, Directory, NodeColor, ObjectType, decode_directory, format_clsid};
pub use error::{ChainFault, OleError, Result, ValidationError};
pub use fat::{FatTable, build_fat, build_minifat};
pub use file::{Container, OleFile, is_ole_file, parse, parse_file};
pub use header::{Header, read_header, validate_header};
pub use metadata::SummaryInfo;
pub use options::ParseOptions;
pub use property::{
    PropertyId, PropertySet, PropertyStream, PropertyValue, decode_property_set,
    decode_property_stream,
};
pub use sector::{SectorKind, sector_offset};
pub use stream::{StreamLocation, find_stream};
pub use time::{
    filetime_to_datetime, filetime_to_unix_time, ticks_to_unix_time, unix_time_to_datetime,
};
