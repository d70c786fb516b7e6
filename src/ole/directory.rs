use super::codepage::decode_utf16le;
use super::consts::*;
use super::error::{OleError, Result};
use super::stream::{StreamLocation, find_stream};
use super::time::filetime_to_datetime;
use chrono::{DateTime, Utc};
use fixedbitset::FixedBitSet;
use log::warn;
use serde::Serialize;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
///
/// This represents the on-disk format of a directory entry.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    /// Left sibling SID
    sid_left: U32<LE>,
    /// Right sibling SID
    sid_right: U32<LE>,
    /// Child SID
    sid_child: U32<LE>,
    /// CLSID (16 bytes)
    clsid: [u8; 16],
    /// State bits
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    /// Starting sector
    start_sector: U32<LE>,
    /// Stream size
    stream_size: U64<LE>,
}

/// Kind of object a directory entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectType {
    /// Unused slot; skipped by every consumer
    Unused,
    Storage,
    Stream,
    Root,
    /// Any other raw value (lock bytes, property storage, garbage)
    Other(u8),
}

impl From<u8> for ObjectType {
    fn from(value: u8) -> Self {
        match value {
            STGTY_EMPTY => ObjectType::Unused,
            STGTY_STORAGE => ObjectType::Storage,
            STGTY_STREAM => ObjectType::Stream,
            STGTY_ROOT => ObjectType::Root,
            other => ObjectType::Other(other),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectType::Unused => write!(f, "unused"),
            ObjectType::Storage => write!(f, "storage"),
            ObjectType::Stream => write!(f, "stream"),
            ObjectType::Root => write!(f, "root"),
            ObjectType::Other(v) => write!(f, "type {}", v),
        }
    }
}

/// Red-black tree node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeColor {
    Red,
    Black,
    Unknown(u8),
}

impl From<u8> for NodeColor {
    fn from(value: u8) -> Self {
        match value {
            0 => NodeColor::Red,
            1 => NodeColor::Black,
            other => NodeColor::Unknown(other),
        }
    }
}

/// A decoded directory entry.
///
/// `sid` is the entry's position in the directory; `left_id`, `right_id` and
/// `child_id` refer to other entries by that position and are `None` where the
/// file stores `NOSTREAM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub sid: u32,
    /// Entry name (UTF-16 decoded)
    pub name: String,
    /// Name length in bytes as stored, including the terminator
    pub name_len: u16,
    pub obj_type: ObjectType,
    pub color: NodeColor,
    pub left_id: Option<u32>,
    pub right_id: Option<u32>,
    pub child_id: Option<u32>,
    pub clsid: [u8; 16],
    pub state_bits: u32,
    /// Creation time as a raw FILETIME
    pub creation_time: u64,
    /// Modification time as a raw FILETIME
    pub modified_time: u64,
    pub start_sector: u32,
    pub stream_size: u64,
}

impl DirEntry {
    fn from_raw(raw: &RawDirectoryEntry, sid: u32) -> Self {
        let name_len = raw.name_len.get();
        let mut name_bytes = name_len as usize;
        if name_bytes > raw.name.len() {
            warn!(
                "directory entry {}: name length {} exceeds 64 bytes, clamping",
                sid, name_len
            );
            name_bytes = raw.name.len();
        }
        // The stored length counts the terminating NUL.
        let name = decode_utf16le(&raw.name[..name_bytes.saturating_sub(2)]);

        DirEntry {
            sid,
            name,
            name_len,
            obj_type: ObjectType::from(raw.entry_type),
            color: NodeColor::from(raw.node_color),
            left_id: link(raw.sid_left.get()),
            right_id: link(raw.sid_right.get()),
            child_id: link(raw.sid_child.get()),
            clsid: raw.clsid,
            state_bits: raw.state_bits.get(),
            creation_time: raw.creation_time.get(),
            modified_time: raw.modified_time.get(),
            start_sector: raw.start_sector.get(),
            stream_size: raw.stream_size.get(),
        }
    }

    #[inline]
    pub fn is_unused(&self) -> bool {
        self.obj_type == ObjectType::Unused
    }

    #[inline]
    pub fn is_stream(&self) -> bool {
        self.obj_type == ObjectType::Stream
    }

    /// Storages and the root storage can have children.
    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(self.obj_type, ObjectType::Storage | ObjectType::Root)
    }

    /// Class id formatted as a GUID, or an empty string when all zero.
    pub fn clsid_string(&self) -> String {
        format_clsid(&self.clsid)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.creation_time)
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.modified_time)
    }
}

#[inline]
fn link(sid: u32) -> Option<u32> {
    (sid != NOSTREAM).then_some(sid)
}

/// Decode a directory stream into its entries, in on-disk order.
///
/// The buffer length must be a whole number of 128-byte records.
pub fn decode_directory(bytes: &[u8]) -> Result<Vec<DirEntry>> {
    if bytes.len() % DIRENTRY_SIZE != 0 {
        return Err(OleError::InvalidFormat(format!(
            "directory stream of {} bytes is not a multiple of {}",
            bytes.len(),
            DIRENTRY_SIZE
        )));
    }

    bytes
        .chunks_exact(DIRENTRY_SIZE)
        .enumerate()
        .map(|(sid, record)| {
            RawDirectoryEntry::read_from_bytes(record)
                .map(|raw| DirEntry::from_raw(&raw, sid as u32))
                .map_err(|_| {
                    OleError::InvalidFormat("Failed to parse directory entry".to_string())
                })
        })
        .collect()
}

/// The decoded directory: an arena of entries addressed by stream id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_directory(bytes).map(Self::from_entries)
    }

    pub fn from_entries(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }

    /// All entries, unused slots included, indexed by stream id.
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, sid: u32) -> Option<&DirEntry> {
        self.entries.get(sid as usize)
    }

    /// The root storage (always entry 0 in a well-formed file).
    pub fn root(&self) -> Option<&DirEntry> {
        self.entries
            .first()
            .filter(|entry| entry.obj_type == ObjectType::Root)
    }

    /// Storages and streams, without the root and unused slots.
    pub fn visible(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_unused() && entry.obj_type != ObjectType::Root)
    }

    /// Flat, exact-match lookup of a stream by name.
    pub fn find_stream(&self, name: &str) -> Result<StreamLocation> {
        find_stream(&self.entries, name)
    }

    /// Children of a storage, in tree order.
    ///
    /// Walks the red-black tree hanging off the storage's `child_id`. A
    /// reference outside the directory, to an unused slot, or to an entry
    /// already visited is an error.
    pub fn children(&self, sid: u32) -> Result<Vec<&DirEntry>> {
        let storage = self.node(sid)?;
        if !storage.is_storage() {
            return Err(OleError::InvalidFormat(format!(
                "entry {} ({:?}) is not a storage",
                sid, storage.name
            )));
        }

        let mut visited = FixedBitSet::with_capacity(self.entries.len());
        visited.insert(sid as usize);

        let mut children = Vec::new();
        let mut stack = Vec::new();
        let mut next = storage.child_id;
        loop {
            while let Some(sid) = next {
                let entry = self.node(sid)?;
                if visited.put(sid as usize) {
                    return Err(OleError::CorruptDirectory(format!(
                        "entry {} is reachable twice",
                        sid
                    )));
                }
                stack.push(entry);
                next = entry.left_id;
            }
            let Some(entry) = stack.pop() else {
                break;
            };
            children.push(entry);
            next = entry.right_id;
        }
        Ok(children)
    }

    /// Resolve a storage path from the root, comparing names case-insensitively.
    ///
    /// An empty path resolves to the root entry.
    pub fn find_path(&self, path: &[&str]) -> Result<&DirEntry> {
        let not_found = || OleError::StreamNotFound(path.join("/"));
        let mut current = self.root().ok_or_else(not_found)?;
        for component in path {
            if !current.is_storage() {
                return Err(not_found());
            }
            let wanted = component.to_uppercase();
            current = self
                .children(current.sid)?
                .into_iter()
                .find(|entry| entry.name.to_uppercase() == wanted)
                .ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Every stream reachable from the root, as path components.
    ///
    /// Each storage may be entered once; a storage reachable twice is a
    /// corrupt directory.
    pub fn stream_paths(&self) -> Result<Vec<Vec<String>>> {
        let mut paths = Vec::new();
        let Some(root) = self.root() else {
            return Ok(paths);
        };

        let mut entered = FixedBitSet::with_capacity(self.entries.len());
        entered.insert(root.sid as usize);
        let mut prefix: Vec<String> = Vec::new();
        let mut frames = vec![self.children(root.sid)?.into_iter()];
        while let Some(frame) = frames.last_mut() {
            let Some(child) = frame.next() else {
                frames.pop();
                prefix.pop();
                continue;
            };
            if child.is_stream() {
                let mut path = prefix.clone();
                path.push(child.name.clone());
                paths.push(path);
            } else if child.is_storage() {
                if entered.put(child.sid as usize) {
                    return Err(OleError::CorruptDirectory(format!(
                        "storage {} is entered twice",
                        child.sid
                    )));
                }
                let children = self.children(child.sid)?;
                prefix.push(child.name.clone());
                frames.push(children.into_iter());
            }
        }
        Ok(paths)
    }

    /// Mask stream sizes to 32 bits, as version 3 files only define the low half.
    pub(crate) fn truncate_v3_sizes(&mut self) {
        for entry in &mut self.entries {
            entry.stream_size &= 0xFFFF_FFFF;
        }
    }

    fn node(&self, sid: u32) -> Result<&DirEntry> {
        match self.get(sid) {
            Some(entry) if !entry.is_unused() => Ok(entry),
            Some(_) => Err(OleError::CorruptDirectory(format!(
                "tree references unused entry {}",
                sid
            ))),
            None => Err(OleError::CorruptDirectory(format!(
                "tree references entry {} of {}",
                sid,
                self.entries.len()
            ))),
        }
    }
}

/// Format CLSID as a human-readable string
pub fn format_clsid(bytes: &[u8; 16]) -> String {
    if bytes.iter().all(|&b| b == 0) {
        return String::new();
    }

    // Format as: XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX
    format!(
        "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u16::from_le_bytes([bytes[4], bytes[5]]),
        u16::from_le_bytes([bytes[6], bytes[7]]),
        bytes[8],
        bytes[9],
        bytes[10],
        bytes[11],
        bytes[12],
        bytes[13],
        bytes[14],
        bytes[15],
    )
}
