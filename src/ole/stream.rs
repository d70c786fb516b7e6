//! Named stream lookup at root scope.

use super::directory::DirEntry;
use super::error::{OleError, Result};
use serde::Serialize;

/// Where a stream's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamLocation {
    pub sid: u32,
    pub start_sector: u32,
    pub size: u64,
}

impl From<&DirEntry> for StreamLocation {
    fn from(entry: &DirEntry) -> Self {
        StreamLocation {
            sid: entry.sid,
            start_sector: entry.start_sector,
            size: entry.stream_size,
        }
    }
}

/// Find a stream by exact, case-sensitive name.
///
/// Entries are scanned in directory order and the first stream whose decoded
/// name equals `name` wins. Unused slots, storages and the root are never
/// matched, and nested storages are not descended into.
pub fn find_stream(entries: &[DirEntry], name: &str) -> Result<StreamLocation> {
    entries
        .iter()
        .filter(|entry| entry.is_stream())
        .find(|entry| entry.name == name)
        .map(StreamLocation::from)
        .ok_or_else(|| OleError::StreamNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::consts::*;
    use crate::ole::directory::decode_directory;
    use crate::ole::directory::tests::record;

    const NONE: (u32, u32, u32) = (NOSTREAM, NOSTREAM, NOSTREAM);

    fn entries() -> Vec<DirEntry> {
        let mut bytes = record("Root Entry", STGTY_ROOT, (NOSTREAM, NOSTREAM, 1), ENDOFCHAIN, 0);
        bytes.extend(record(SUMMARY_INFORMATION, STGTY_STREAM, (NOSTREAM, 2, NOSTREAM), 5, 200));
        bytes.extend(record("WordDocument", STGTY_STREAM, NONE, 8, 9000));
        bytes.extend(vec![0u8; DIRENTRY_SIZE]);
        decode_directory(&bytes).unwrap()
    }

    #[test]
    fn test_finds_exact_name() {
        let location = find_stream(&entries(), "WordDocument").unwrap();
        assert_eq!(
            location,
            StreamLocation {
                sid: 2,
                start_sector: 8,
                size: 9000
            }
        );
        let location = find_stream(&entries(), SUMMARY_INFORMATION).unwrap();
        assert_eq!(location.start_sector, 5);
    }

    #[test]
    fn test_control_character_is_part_of_the_name() {
        let err = find_stream(&entries(), "SummaryInformation").unwrap_err();
        assert!(matches!(err, OleError::StreamNotFound(name) if name == "SummaryInformation"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(find_stream(&entries(), "worddocument").is_err());
    }

    #[test]
    fn test_root_and_unused_entries_never_match() {
        assert!(find_stream(&entries(), "Root Entry").is_err());
        assert!(find_stream(&entries(), "").is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let mut bytes = record("Dup", STGTY_STREAM, NONE, 1, 1);
        bytes.extend(record("Dup", STGTY_STREAM, NONE, 2, 2));
        let entries = decode_directory(&bytes).unwrap();
        assert_eq!(find_stream(&entries, "Dup").unwrap().start_sector, 1);
    }
}
