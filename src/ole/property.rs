//! Property-set stream decoding ([MS-OLEPS]).
//!
//! A property-set stream starts with a 28-byte header followed by one
//! (format id, offset) pair per set. Each set body begins with its byte size
//! and property count, then an array of (property id, offset) pairs. Property
//! offsets are relative to the start of their set body, not the stream.
//! Each property is a 16-bit variant tag, two bytes of padding and a payload.

use super::codepage::{decode_codepage_string, decode_utf16le};
use super::consts::*;
use super::error::{OleError, Result};
use super::time::{TICKS_PER_SECOND, ticks_to_unix_time, unix_time_to_datetime};
use crate::common::binary::{read_bytes, read_i16_le, read_i32_le, read_u16_le, read_u32_le};
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

/// Property identifier, named after the SummaryInformation property set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropertyId {
    CodePage,
    Title,
    Subject,
    Author,
    Keywords,
    Comments,
    Template,
    LastAuthor,
    RevisionNumber,
    EditTime,
    LastPrinted,
    CreateTime,
    LastSaveTime,
    PageCount,
    WordCount,
    CharCount,
    Thumbnail,
    AppName,
    Security,
    /// Any id without a name; kept rather than dropped
    Unknown(u32),
}

impl From<u32> for PropertyId {
    fn from(id: u32) -> Self {
        match id {
            PID_CODEPAGE => PropertyId::CodePage,
            PID_TITLE => PropertyId::Title,
            PID_SUBJECT => PropertyId::Subject,
            PID_AUTHOR => PropertyId::Author,
            PID_KEYWORDS => PropertyId::Keywords,
            PID_COMMENTS => PropertyId::Comments,
            PID_TEMPLATE => PropertyId::Template,
            PID_LASTAUTHOR => PropertyId::LastAuthor,
            PID_REVNUMBER => PropertyId::RevisionNumber,
            PID_EDITTIME => PropertyId::EditTime,
            PID_LASTPRINTED => PropertyId::LastPrinted,
            PID_CREATE_DTM => PropertyId::CreateTime,
            PID_LASTSAVE_DTM => PropertyId::LastSaveTime,
            PID_PAGECOUNT => PropertyId::PageCount,
            PID_WORDCOUNT => PropertyId::WordCount,
            PID_CHARCOUNT => PropertyId::CharCount,
            PID_THUMBNAIL => PropertyId::Thumbnail,
            PID_APPNAME => PropertyId::AppName,
            PID_SECURITY => PropertyId::Security,
            other => PropertyId::Unknown(other),
        }
    }
}

impl PropertyId {
    /// Numeric id as stored in the file.
    pub fn id(self) -> u32 {
        match self {
            PropertyId::CodePage => PID_CODEPAGE,
            PropertyId::Title => PID_TITLE,
            PropertyId::Subject => PID_SUBJECT,
            PropertyId::Author => PID_AUTHOR,
            PropertyId::Keywords => PID_KEYWORDS,
            PropertyId::Comments => PID_COMMENTS,
            PropertyId::Template => PID_TEMPLATE,
            PropertyId::LastAuthor => PID_LASTAUTHOR,
            PropertyId::RevisionNumber => PID_REVNUMBER,
            PropertyId::EditTime => PID_EDITTIME,
            PropertyId::LastPrinted => PID_LASTPRINTED,
            PropertyId::CreateTime => PID_CREATE_DTM,
            PropertyId::LastSaveTime => PID_LASTSAVE_DTM,
            PropertyId::PageCount => PID_PAGECOUNT,
            PropertyId::WordCount => PID_WORDCOUNT,
            PropertyId::CharCount => PID_CHARCOUNT,
            PropertyId::Thumbnail => PID_THUMBNAIL,
            PropertyId::AppName => PID_APPNAME,
            PropertyId::Security => PID_SECURITY,
            PropertyId::Unknown(id) => id,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            PropertyId::CodePage => "Code page",
            PropertyId::Title => "Title",
            PropertyId::Subject => "Subject",
            PropertyId::Author => "Author",
            PropertyId::Keywords => "Keywords",
            PropertyId::Comments => "Comments",
            PropertyId::Template => "Template",
            PropertyId::LastAuthor => "Last saved by",
            PropertyId::RevisionNumber => "Revision number",
            PropertyId::EditTime => "Total editing time",
            PropertyId::LastPrinted => "Last printed",
            PropertyId::CreateTime => "Created",
            PropertyId::LastSaveTime => "Last saved",
            PropertyId::PageCount => "Pages",
            PropertyId::WordCount => "Words",
            PropertyId::CharCount => "Characters",
            PropertyId::Thumbnail => "Thumbnail",
            PropertyId::AppName => "Application",
            PropertyId::Security => "Security",
            PropertyId::Unknown(_) => "Unknown property",
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyId::Unknown(id) => write!(f, "Unknown property {:#x}", id),
            other => f.write_str(other.label()),
        }
    }
}

/// Decoded property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PropertyValue {
    I2(i16),
    I4(i32),
    UI2(u16),
    UI4(u32),
    Bool(bool),
    /// Codepage string
    Lpstr(String),
    /// UTF-16 string
    Lpwstr(String),
    /// Timestamp in Unix seconds
    Filetime(i64),
    /// Elapsed seconds, from a FILETIME holding an interval (total editing time)
    Duration(u64),
    Blob(Vec<u8>),
    Empty,
    /// Variant type this decoder does not understand
    Unknown(u16),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Lpstr(s) | PropertyValue::Lpwstr(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value of any integer-typed variant.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::I2(v) => Some(v.into()),
            PropertyValue::I4(v) => Some(v.into()),
            PropertyValue::UI2(v) => Some(v.into()),
            PropertyValue::UI4(v) => Some(v.into()),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::I2(v) => write!(f, "{}", v),
            PropertyValue::I4(v) => write!(f, "{}", v),
            PropertyValue::UI2(v) => write!(f, "{}", v),
            PropertyValue::UI4(v) => write!(f, "{}", v),
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Lpstr(s) | PropertyValue::Lpwstr(s) => f.write_str(s),
            PropertyValue::Filetime(secs) => match unix_time_to_datetime(*secs) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
                None => write!(f, "{} (Unix seconds)", secs),
            },
            PropertyValue::Duration(secs) => {
                write!(f, "{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
            },
            PropertyValue::Blob(data) => write!(f, "<{} bytes>", data.len()),
            PropertyValue::Empty => f.write_str("<empty>"),
            PropertyValue::Unknown(tag) => write!(f, "unknown type `{}`", tag),
        }
    }
}

/// One property set inside a property-set stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySet {
    /// Format id in on-disk byte order
    pub fmtid: [u8; 16],
    /// Offset of the set body within the stream
    pub offset: u32,
    /// Codepage in effect after decoding the set
    pub codepage: u32,
    /// Properties in order of appearance
    pub properties: Vec<(PropertyId, PropertyValue)>,
}

impl PropertySet {
    pub fn is_summary_information(&self) -> bool {
        self.fmtid == FMTID_SUMMARY_INFORMATION
    }
}

/// A decoded property-set stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyStream {
    pub byte_order: u16,
    pub version: u16,
    pub system_id: u32,
    pub clsid: [u8; 16],
    pub sets: Vec<PropertySet>,
}

impl PropertyStream {
    /// All properties of all sets, in order.
    pub fn into_properties(self) -> Vec<(PropertyId, PropertyValue)> {
        self.sets.into_iter().flat_map(|set| set.properties).collect()
    }
}

/// Decode a property-set stream into its properties, in order of appearance.
///
/// Strings are decoded with Windows-1252 until a `CodePage` property says otherwise.
pub fn decode_property_set(bytes: &[u8]) -> Result<Vec<(PropertyId, PropertyValue)>> {
    decode_property_stream(bytes, DEFAULT_CODEPAGE).map(PropertyStream::into_properties)
}

/// Decode a property-set stream, keeping the per-set structure.
///
/// `default_codepage` applies to strings that precede any `CodePage` property.
pub fn decode_property_stream(bytes: &[u8], default_codepage: u32) -> Result<PropertyStream> {
    let byte_order = read_u16_le(bytes, 0)?;
    if byte_order != BYTE_ORDER_MARK {
        return Err(OleError::InvalidFormat(format!(
            "property stream byte order {:#06x}, expected {:#06x}",
            byte_order, BYTE_ORDER_MARK
        )));
    }
    let version = read_u16_le(bytes, 2)?;
    let system_id = read_u32_le(bytes, 4)?;
    let mut clsid = [0u8; 16];
    clsid.copy_from_slice(read_bytes(bytes, 8, 16)?);
    let num_sets = read_u32_le(bytes, 24)? as usize;

    let mut sets = Vec::new();
    for index in 0..num_sets {
        let header_offset = PROPERTY_STREAM_HEADER_SIZE + index * PROPERTY_SET_HEADER_SIZE;
        let mut fmtid = [0u8; 16];
        fmtid.copy_from_slice(read_bytes(bytes, header_offset, 16)?);
        let offset = read_u32_le(bytes, header_offset + 16)?;

        let (codepage, properties) = decode_set_body(bytes, offset as usize, default_codepage)?;
        debug!(
            "property set {} at {}: {} properties",
            index,
            offset,
            properties.len()
        );
        sets.push(PropertySet {
            fmtid,
            offset,
            codepage,
            properties,
        });
    }

    Ok(PropertyStream {
        byte_order,
        version,
        system_id,
        clsid,
        sets,
    })
}

/// Decode one set body starting at `start` within the stream.
fn decode_set_body(
    stream: &[u8],
    start: usize,
    default_codepage: u32,
) -> Result<(u32, Vec<(PropertyId, PropertyValue)>)> {
    let declared = read_u32_le(stream, start)? as usize;
    let available = stream.len() - start;
    let size = if declared > available {
        warn!(
            "property set at {} declares {} bytes, only {} available",
            start, declared, available
        );
        available
    } else {
        declared
    };
    if size < 8 {
        return Err(OleError::InvalidFormat(format!(
            "property set at {} is only {} bytes",
            start, size
        )));
    }
    let body = &stream[start..start + size];

    let count = read_u32_le(body, 4)? as usize;
    let table_end = count.checked_mul(8).and_then(|len| len.checked_add(8));
    if table_end.is_none_or(|end| end > body.len()) {
        return Err(OleError::InvalidFormat(format!(
            "property set at {} lists {} properties in {} bytes",
            start, count, size
        )));
    }

    let mut codepage = default_codepage;
    let mut properties = Vec::with_capacity(count);
    for index in 0..count {
        let id = read_u32_le(body, 8 + index * 8)?;
        let offset = read_u32_le(body, 12 + index * 8)? as usize;
        if id == PID_DICTIONARY {
            continue;
        }

        let value = decode_value(body, offset, id, codepage, default_codepage)?;
        if id == PID_CODEPAGE
            && let Some(cp) = value.as_i64()
        {
            // Stored as VT_I2; values above 32767 wrap negative.
            codepage = u32::from(cp as u16);
        }
        properties.push((PropertyId::from(id), value));
    }
    Ok((codepage, properties))
}

/// Decode the typed value at `offset` within a set body.
fn decode_value(
    body: &[u8],
    offset: usize,
    id: u32,
    codepage: u32,
    fallback: u32,
) -> Result<PropertyValue> {
    let tag = read_u16_le(body, offset)?;
    let at = offset.saturating_add(4);

    let value = match tag {
        VT_I2 => PropertyValue::I2(read_i16_le(body, at)?),
        VT_I4 | VT_INT | VT_ERROR => PropertyValue::I4(read_i32_le(body, at)?),
        VT_UI2 => PropertyValue::UI2(read_u16_le(body, at)?),
        VT_UI4 | VT_UINT => PropertyValue::UI4(read_u32_le(body, at)?),
        VT_BOOL => PropertyValue::Bool(read_u16_le(body, at)? != 0),
        VT_LPSTR => {
            let len = read_u32_le(body, at)? as usize;
            let text = read_bytes(body, at.saturating_add(4), len)?;
            PropertyValue::Lpstr(decode_codepage_string(text, codepage, fallback))
        },
        VT_LPWSTR => {
            let chars = read_u32_le(body, at)? as usize;
            let len = chars.checked_mul(2).ok_or_else(|| {
                OleError::InvalidFormat(format!("string of {} characters is too long", chars))
            })?;
            let text = read_bytes(body, at.saturating_add(4), len)?;
            PropertyValue::Lpwstr(decode_utf16le(text))
        },
        VT_FILETIME => {
            let low = read_u32_le(body, at)?;
            let high = read_u32_le(body, at.saturating_add(4))?;
            if id == PID_EDITTIME {
                let ticks = u64::from(low) | (u64::from(high) << 32);
                PropertyValue::Duration(ticks / TICKS_PER_SECOND)
            } else {
                PropertyValue::Filetime(ticks_to_unix_time(low, high))
            }
        },
        VT_BLOB => {
            let len = read_u32_le(body, at)? as usize;
            PropertyValue::Blob(read_bytes(body, at.saturating_add(4), len)?.to_vec())
        },
        VT_EMPTY | VT_NULL => PropertyValue::Empty,
        other => {
            debug!("property at {} has unsupported type {}", offset, other);
            PropertyValue::Unknown(other)
        },
    };
    Ok(value)
}
