use super::chain::{read_chain_with_limit, read_sector};
use super::consts::*;
use super::error::{ChainFault, OleError, Result};
use super::header::Header;
use super::sector::SectorKind;
use crate::common::binary::read_u32_array;
use fixedbitset::FixedBitSet;
use log::{debug, warn};
use serde::Serialize;
use std::io::{Read, Seek};

/// File Allocation Table: entry `i` is the sector that follows sector `i`
/// in its chain, or a sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FatTable {
    entries: Vec<u32>,
}

impl FatTable {
    pub fn new(entries: Vec<u32>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `sector`, or `None` when the table does not cover it.
    #[inline]
    pub fn get(&self, sector: u32) -> Option<u32> {
        self.entries.get(sector as usize).copied()
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Entries up to the first free one, the allocated prefix of the table.
    pub fn allocated(&self) -> impl Iterator<Item = (u32, SectorKind)> + '_ {
        self.entries
            .iter()
            .take_while(|&&value| value != FREESECT)
            .enumerate()
            .map(|(index, &value)| (index as u32, SectorKind::classify(value)))
    }

    fn extend_from_sector(&mut self, data: &[u8]) {
        self.entries.extend(read_u32_array(data));
    }
}

/// Build the FAT from the header's inline DIFAT and any DIFAT overflow sectors.
///
/// Every referenced FAT sector is read in slot order and its entries appended.
/// A short read fails with [`OleError::SectorRead`] naming the FAT sector.
pub fn build_fat<R: Read + Seek>(reader: &mut R, header: &Header) -> Result<FatTable> {
    let sector_size = header.sector_size()?;

    let mut fat_sectors = Vec::with_capacity(header.difat.len());
    for (slot, sector) in header.fat_sector_slots() {
        if SectorKind::classify(sector).is_regular() {
            fat_sectors.push(sector);
        } else {
            warn!("DIFAT slot {} holds {:#010x}, skipping", slot, sector);
        }
    }

    if header.num_difat_sectors > 0 {
        fat_sectors.extend(read_difat_overflow(reader, header, sector_size)?);
    }

    if fat_sectors.len() != header.num_fat_sectors as usize {
        warn!(
            "header declares {} FAT sectors, DIFAT references {}",
            header.num_fat_sectors,
            fat_sectors.len()
        );
    }

    let mut fat = FatTable::new(Vec::with_capacity(fat_sectors.len() * (sector_size / 4)));
    for sector in fat_sectors {
        let data = read_sector(reader, sector, sector_size)?;
        fat.extend_from_sector(&data);
    }

    debug!("FAT assembled: {} entries", fat.len());
    Ok(fat)
}

/// Collect FAT sector indices stored in the DIFAT sector chain.
///
/// Each DIFAT sector holds `sector_size / 4 - 1` FAT sector indices followed
/// by the index of the next DIFAT sector.
fn read_difat_overflow<R: Read + Seek>(
    reader: &mut R,
    header: &Header,
    sector_size: usize,
) -> Result<Vec<u32>> {
    let entries_per_sector = sector_size / 4 - 1;
    let start = header.difat_sector_start;
    let mut visited = FixedBitSet::new();
    let mut fat_sectors = Vec::new();
    let mut current = start;

    for _ in 0..header.num_difat_sectors {
        match SectorKind::classify(current) {
            SectorKind::Regular(_) => {},
            SectorKind::EndOfChain | SectorKind::Free => {
                warn!(
                    "DIFAT chain ended after {} of {} sectors",
                    visited.count_ones(..),
                    header.num_difat_sectors
                );
                break;
            },
            _ => {
                return Err(OleError::CorruptChain {
                    start,
                    sector: current,
                    reason: ChainFault::UnexpectedSentinel,
                });
            },
        }
        // The read succeeds only for sectors inside the file, which bounds the set.
        let words = read_u32_array(&read_sector(reader, current, sector_size)?);
        let index = current as usize;
        visited.grow(index + 1);
        if visited.put(index) {
            return Err(OleError::CorruptChain {
                start,
                sector: current,
                reason: ChainFault::Cycle,
            });
        }

        let (slots, next) = words.split_at(entries_per_sector);
        fat_sectors.extend(slots.iter().copied().filter(|&sector| sector != FREESECT));
        current = next.first().copied().unwrap_or(ENDOFCHAIN);
    }

    debug!(
        "DIFAT overflow: {} sectors, {} FAT sector references",
        visited.count_ones(..),
        fat_sectors.len()
    );
    Ok(fat_sectors)
}

/// Load the mini-FAT through the regular FAT.
///
/// An empty table is returned when the header declares no mini-FAT sectors.
pub fn build_minifat<R: Read + Seek>(
    reader: &mut R,
    fat: &FatTable,
    header: &Header,
    limit: Option<usize>,
) -> Result<FatTable> {
    if header.num_minifat_sectors == 0 || header.minifat_sector_start == ENDOFCHAIN {
        return Ok(FatTable::default());
    }

    let sector_size = header.sector_size()?;
    let data = read_chain_with_limit(
        reader,
        fat,
        header.minifat_sector_start,
        sector_size,
        limit,
    )?;

    let mut minifat = FatTable::default();
    minifat.extend_from_sector(&data);
    debug!("mini-FAT loaded: {} entries", minifat.len());
    Ok(minifat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SECTOR: usize = 512;

    fn header_with(difat: &[u32]) -> Header {
        let mut slots = vec![FREESECT; HEADER_DIFAT_SLOTS];
        slots[..difat.len()].copy_from_slice(difat);
        Header {
            signature: *MAGIC,
            clsid: [0; 16],
            minor_version: MINOR_VERSION,
            major_version: 3,
            byte_order: BYTE_ORDER_MARK,
            sector_shift: SECTOR_SHIFT_V3,
            mini_sector_shift: MINI_SECTOR_SHIFT,
            num_dir_sectors: 0,
            num_fat_sectors: difat.len() as u32,
            dir_sector_start: ENDOFCHAIN,
            transaction_signature: 0,
            mini_stream_cutoff: MINI_STREAM_CUTOFF,
            minifat_sector_start: ENDOFCHAIN,
            num_minifat_sectors: 0,
            difat_sector_start: ENDOFCHAIN,
            num_difat_sectors: 0,
            difat: slots,
        }
    }

    fn file_with_sectors(sectors: &[Vec<u32>]) -> Cursor<Vec<u8>> {
        let mut data = vec![0u8; SECTOR];
        for words in sectors {
            let mut sector: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
            sector.resize(SECTOR, 0xFF);
            data.extend(sector);
        }
        Cursor::new(data)
    }

    #[test]
    fn test_build_fat_single_sector() {
        let mut file = file_with_sectors(&[vec![FATSECT, ENDOFCHAIN]]);
        let fat = build_fat(&mut file, &header_with(&[0])).unwrap();
        assert_eq!(fat.len(), SECTOR / 4);
        assert_eq!(fat.get(0), Some(FATSECT));
        assert_eq!(fat.get(1), Some(ENDOFCHAIN));
        assert_eq!(fat.get(2), Some(FREESECT));
        assert_eq!(fat.get(128), None);
    }

    #[test]
    fn test_build_fat_appends_in_slot_order() {
        let mut file = file_with_sectors(&[vec![7], vec![FATSECT, FATSECT]]);
        // Slot 0 references sector 1, slot 1 references sector 0.
        let fat = build_fat(&mut file, &header_with(&[1, 0])).unwrap();
        assert_eq!(fat.len(), 2 * SECTOR / 4);
        assert_eq!(fat.get(0), Some(FATSECT));
        assert_eq!(fat.get(128), Some(7));
    }

    #[test]
    fn test_build_fat_skips_free_slots() {
        let mut file = file_with_sectors(&[vec![FATSECT]]);
        let mut header = header_with(&[]);
        header.difat[5] = 0;
        let fat = build_fat(&mut file, &header).unwrap();
        assert_eq!(fat.len(), SECTOR / 4);
    }

    #[test]
    fn test_build_fat_short_read_names_sector() {
        let mut file = file_with_sectors(&[vec![FATSECT]]);
        let err = build_fat(&mut file, &header_with(&[0, 9])).unwrap_err();
        assert!(matches!(err, OleError::SectorRead { sector: 9, .. }));
    }

    #[test]
    fn test_build_fat_follows_difat_overflow() {
        // Sector 0: FAT, sector 1: DIFAT overflow pointing at FAT sector 2.
        let mut overflow = vec![2u32];
        overflow.resize(SECTOR / 4 - 1, FREESECT);
        overflow.push(ENDOFCHAIN);
        let mut file = file_with_sectors(&[vec![FATSECT, DIFSECT, FATSECT], overflow, vec![42]]);
        let mut header = header_with(&[0]);
        header.num_fat_sectors = 2;
        header.difat_sector_start = 1;
        header.num_difat_sectors = 1;

        let fat = build_fat(&mut file, &header).unwrap();
        assert_eq!(fat.len(), 2 * SECTOR / 4);
        assert_eq!(fat.get(1), Some(DIFSECT));
        assert_eq!(fat.get(128), Some(42));
    }

    #[test]
    fn test_difat_overflow_cycle() {
        let mut looping = vec![FREESECT; SECTOR / 4 - 1];
        looping.push(1);
        let mut file = file_with_sectors(&[vec![FATSECT], looping]);
        let mut header = header_with(&[0]);
        header.difat_sector_start = 1;
        header.num_difat_sectors = 3;

        assert!(matches!(
            build_fat(&mut file, &header),
            Err(OleError::CorruptChain {
                reason: ChainFault::Cycle,
                ..
            })
        ));
    }

    #[test]
    fn test_difat_overflow_link_past_end_of_file() {
        let mut overflow = vec![FREESECT; SECTOR / 4 - 1];
        overflow.push(MAXREGSECT - 1);
        let mut file = file_with_sectors(&[vec![FATSECT], overflow]);
        let mut header = header_with(&[0]);
        header.difat_sector_start = 1;
        header.num_difat_sectors = 2;

        let err = build_fat(&mut file, &header).unwrap_err();
        assert!(matches!(err, OleError::SectorRead { sector, .. } if sector == MAXREGSECT - 1));
    }

    #[test]
    fn test_allocated_prefix() {
        let fat = FatTable::new(vec![FATSECT, ENDOFCHAIN, 3, ENDOFCHAIN, FREESECT, 9]);
        let kinds: Vec<_> = fat.allocated().map(|(_, kind)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectorKind::Fat,
                SectorKind::EndOfChain,
                SectorKind::Regular(3),
                SectorKind::EndOfChain
            ]
        );
    }

    #[test]
    fn test_build_minifat_absent() {
        let mut file = file_with_sectors(&[vec![FATSECT]]);
        let fat = FatTable::new(vec![FATSECT]);
        let minifat = build_minifat(&mut file, &fat, &header_with(&[0]), None).unwrap();
        assert!(minifat.is_empty());
    }

    #[test]
    fn test_build_minifat_reads_chain() {
        let mut file = file_with_sectors(&[vec![FATSECT, ENDOFCHAIN], vec![1, ENDOFCHAIN]]);
        let fat = FatTable::new(vec![FATSECT, ENDOFCHAIN]);
        let mut header = header_with(&[0]);
        header.minifat_sector_start = 1;
        header.num_minifat_sectors = 1;
        let minifat = build_minifat(&mut file, &fat, &header, None).unwrap();
        assert_eq!(minifat.len(), SECTOR / 4);
        assert_eq!(minifat.get(0), Some(1));
        assert_eq!(minifat.get(1), Some(ENDOFCHAIN));
    }
}
