//! Sector addressing.
//!
//! Sector `i` starts at byte `(i + 1) * sector_size`: the header occupies the
//! first sector-sized slot of the file. Values above [`MAXREGSECT`] are
//! sentinels rather than sector numbers.

use super::consts::*;
use serde::Serialize;
use std::fmt;

/// Byte offset of a regular sector.
///
/// Computed in `u64`, so it cannot overflow for any 32-bit sector index and
/// any legal sector size.
#[inline]
pub fn sector_offset(sector: u32, sector_size: usize) -> u64 {
    (u64::from(sector) + 1) * sector_size as u64
}

/// Sector size for a sector shift, if the shift is representable.
#[inline]
pub fn sector_size_from_shift(shift: u16) -> Option<usize> {
    1usize.checked_shl(u32::from(shift))
}

/// Interpretation of a 32-bit FAT or DIFAT value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectorKind {
    /// A regular sector index
    Regular(u32),
    /// The sector holds DIFAT entries
    Difat,
    /// The sector holds FAT entries
    Fat,
    /// Last sector of a chain
    EndOfChain,
    /// Unallocated sector
    Free,
    /// Reserved value (0xFFFFFFFA..=0xFFFFFFFB)
    Reserved(u32),
}

impl SectorKind {
    /// Classify a raw FAT value.
    pub fn classify(value: u32) -> Self {
        match value {
            DIFSECT => SectorKind::Difat,
            FATSECT => SectorKind::Fat,
            ENDOFCHAIN => SectorKind::EndOfChain,
            FREESECT => SectorKind::Free,
            v if v < MAXREGSECT => SectorKind::Regular(v),
            v => SectorKind::Reserved(v),
        }
    }

    /// Whether the value addresses a real sector.
    #[inline]
    pub fn is_regular(self) -> bool {
        matches!(self, SectorKind::Regular(_))
    }
}

impl From<u32> for SectorKind {
    fn from(value: u32) -> Self {
        SectorKind::classify(value)
    }
}

impl fmt::Display for SectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectorKind::Regular(v) => write!(f, "[{:03}]", v),
            SectorKind::Difat => write!(f, "<DIFAT>"),
            SectorKind::Fat => write!(f, "<FAT>"),
            SectorKind::EndOfChain => write!(f, "<ENDOFCHAIN>"),
            SectorKind::Free => write!(f, "<FREE>"),
            SectorKind::Reserved(v) => write!(f, "<RESERVED {:#010x}>", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_offset_skips_header() {
        assert_eq!(sector_offset(0, 512), 512);
        assert_eq!(sector_offset(3, 512), 2048);
        assert_eq!(sector_offset(0, 4096), 4096);
    }

    #[test]
    fn test_sector_offset_does_not_overflow() {
        assert_eq!(
            sector_offset(MAXREGSECT - 1, 4096),
            u64::from(MAXREGSECT) * 4096
        );
    }

    #[test]
    fn test_sector_size_from_shift() {
        assert_eq!(sector_size_from_shift(9), Some(512));
        assert_eq!(sector_size_from_shift(12), Some(4096));
        assert_eq!(sector_size_from_shift(200), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(SectorKind::classify(0), SectorKind::Regular(0));
        assert_eq!(SectorKind::classify(0xFFFFFFF9), SectorKind::Regular(0xFFFFFFF9));
        assert_eq!(SectorKind::classify(MAXREGSECT), SectorKind::Reserved(MAXREGSECT));
        assert_eq!(SectorKind::classify(DIFSECT), SectorKind::Difat);
        assert_eq!(SectorKind::classify(FATSECT), SectorKind::Fat);
        assert_eq!(SectorKind::classify(ENDOFCHAIN), SectorKind::EndOfChain);
        assert_eq!(SectorKind::classify(FREESECT), SectorKind::Free);
    }

    #[test]
    fn test_display() {
        assert_eq!(SectorKind::Regular(7).to_string(), "[007]");
        assert_eq!(SectorKind::EndOfChain.to_string(), "<ENDOFCHAIN>");
    }
}
