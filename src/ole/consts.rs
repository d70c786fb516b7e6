/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the fixed file header in bytes
pub const HEADER_SIZE: usize = 512;

/// Number of DIFAT slots stored inline in the header
pub const HEADER_DIFAT_SLOTS: usize = 109;

/// Byte offset of the first inline DIFAT slot in the header
pub const HEADER_DIFAT_OFFSET: usize = 0x4C;

/// Minimal size of an empty OLE file with 512-byte sectors (1536 bytes)
pub const MINIMAL_OLEFILE_SIZE: usize = 1536;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Required minor version
pub const MINOR_VERSION: u16 = 0x003E;

/// Byte-order marker (little-endian)
pub const BYTE_ORDER_MARK: u16 = 0xFFFE;

/// Sector shift for major version 3
pub const SECTOR_SHIFT_V3: u16 = 0x0009;

/// Sector shift for major version 4
pub const SECTOR_SHIFT_V4: u16 = 0x000C;

/// Required mini sector shift (64-byte mini sectors)
pub const MINI_SECTOR_SHIFT: u16 = 0x0006;

/// Required mini stream cutoff size
pub const MINI_STREAM_CUTOFF: u32 = 0x1000;

// Sector IDs (from AAF specifications)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

// Directory entry ids
/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage (from AAF specifications)
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;

// Property types
pub const VT_EMPTY: u16 = 0;
pub const VT_NULL: u16 = 1;
pub const VT_I2: u16 = 2;
pub const VT_I4: u16 = 3;
pub const VT_ERROR: u16 = 10;
pub const VT_BOOL: u16 = 11;
pub const VT_UI2: u16 = 18;
pub const VT_UI4: u16 = 19;
pub const VT_INT: u16 = 22;
pub const VT_UINT: u16 = 23;
pub const VT_LPSTR: u16 = 30;
pub const VT_LPWSTR: u16 = 31;
pub const VT_FILETIME: u16 = 64;
pub const VT_BLOB: u16 = 65;

/// Codepage identifier meaning UTF-16LE strings
pub const CP_WINUNICODE: u32 = 1200;

/// Codepage used for strings before a `CodePage` property is seen
pub const DEFAULT_CODEPAGE: u32 = 1252;

/// Size of the property-set stream header
pub const PROPERTY_STREAM_HEADER_SIZE: usize = 28;

/// Size of one (format id, offset) property-set header
pub const PROPERTY_SET_HEADER_SIZE: usize = 20;

/// Name of the summary information stream
pub const SUMMARY_INFORMATION: &str = "\u{0005}SummaryInformation";

/// Name of the document summary information stream
pub const DOCUMENT_SUMMARY_INFORMATION: &str = "\u{0005}DocumentSummaryInformation";

/// Format id of the SummaryInformation property set, in on-disk byte order
pub const FMTID_SUMMARY_INFORMATION: [u8; 16] = [
    0xE0, 0x85, 0x9F, 0xF2, 0xF9, 0x4F, 0x68, 0x10, 0xAB, 0x91, 0x08, 0x00, 0x2B, 0x27, 0xB3, 0xD9,
];

// SummaryInformation property ids
pub const PID_DICTIONARY: u32 = 0;
pub const PID_CODEPAGE: u32 = 1;
pub const PID_TITLE: u32 = 2;
pub const PID_SUBJECT: u32 = 3;
pub const PID_AUTHOR: u32 = 4;
pub const PID_KEYWORDS: u32 = 5;
pub const PID_COMMENTS: u32 = 6;
pub const PID_TEMPLATE: u32 = 7;
pub const PID_LASTAUTHOR: u32 = 8;
pub const PID_REVNUMBER: u32 = 9;
pub const PID_EDITTIME: u32 = 10;
pub const PID_LASTPRINTED: u32 = 11;
pub const PID_CREATE_DTM: u32 = 12;
pub const PID_LASTSAVE_DTM: u32 = 13;
pub const PID_PAGECOUNT: u32 = 14;
pub const PID_WORDCOUNT: u32 = 15;
pub const PID_CHARCOUNT: u32 = 16;
pub const PID_THUMBNAIL: u32 = 17;
pub const PID_APPNAME: u32 = 18;
pub const PID_SECURITY: u32 = 19;
