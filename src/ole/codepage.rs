//! Codepage-aware text decoding for property-set strings and entry names.
//!
//! Property-set strings (`VT_LPSTR`) are stored in the codepage announced by
//! the set's `CodePage` property; directory names are always UTF-16LE.

use super::consts::CP_WINUNICODE;
use encoding_rs::Encoding;
use log::warn;

/// Decode bytes using the specified Windows codepage
///
/// Decoding stops at the first NUL. Returns `None` when the codepage has no
/// known mapping.
///
/// # Examples
///
/// ```
/// use olecf::ole::codepage::decode_bytes;
///
/// assert_eq!(decode_bytes(b"Hello\0\0\0", 1252), Some("Hello".to_string()));
/// assert_eq!(decode_bytes(b"Hello", 99999), None);
/// ```
pub fn decode_bytes(bytes: &[u8], codepage: u32) -> Option<String> {
    if codepage == CP_WINUNICODE {
        return Some(decode_utf16le(bytes));
    }

    let encoding = codepage_to_encoding(codepage)?;
    let bytes = strip_null_terminators(bytes);
    if bytes.is_empty() {
        return Some(String::new());
    }
    Some(encoding.decode_without_bom_handling(bytes).0.into_owned())
}

/// Decode a property-set string, falling back to `fallback` for unmapped codepages.
///
/// `fallback` itself falls back to Windows-1252.
pub fn decode_codepage_string(bytes: &[u8], codepage: u32, fallback: u32) -> String {
    if let Some(text) = decode_bytes(bytes, codepage) {
        return text;
    }
    warn!(
        "codepage {} is not supported, decoding with {}",
        codepage, fallback
    );
    decode_bytes(bytes, fallback).unwrap_or_else(|| {
        let bytes = strip_null_terminators(bytes);
        encoding_rs::WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned()
    })
}

/// Strip everything from the first NUL byte onwards.
#[inline]
fn strip_null_terminators(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// `encoding_rs` encoding for a Windows codepage id, if one exists.
///
/// UTF-16LE (1200) is not listed; [`decode_bytes`] handles it directly.
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    let encoding = match codepage {
        1252 | 28591 => encoding_rs::WINDOWS_1252,
        866 => encoding_rs::IBM866,
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1201 => encoding_rs::UTF_16BE,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        20866 => encoding_rs::KOI8_R,
        20932 => encoding_rs::EUC_JP,
        28592..=28598 | 28605 => return iso_8859(codepage),
        54936 => encoding_rs::GB18030,
        65001 => encoding_rs::UTF_8,
        _ => return None,
    };
    Some(encoding)
}

fn iso_8859(codepage: u32) -> Option<&'static Encoding> {
    Some(match codepage {
        28592 => encoding_rs::ISO_8859_2,
        28593 => encoding_rs::ISO_8859_3,
        28594 => encoding_rs::ISO_8859_4,
        28595 => encoding_rs::ISO_8859_5,
        28596 => encoding_rs::ISO_8859_6,
        28597 => encoding_rs::ISO_8859_7,
        28598 => encoding_rs::ISO_8859_8,
        28605 => encoding_rs::ISO_8859_15,
        _ => return None,
    })
}

/// Decode UTF-16LE bytes, stopping at the first NUL code unit.
///
/// A trailing odd byte is ignored and unpaired surrogates become U+FFFD.
///
/// # Examples
///
/// ```
/// use olecf::ole::codepage::decode_utf16le;
///
/// assert_eq!(decode_utf16le(b"H\x00i\x00\x00\x00"), "Hi");
/// ```
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
