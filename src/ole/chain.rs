//! Sector chain traversal.
//!
//! A chain starts at a sector index and follows allocation-table links until
//! an end-of-chain marker. This is the only place chains are followed, for
//! the directory, named streams, the mini-FAT and the mini stream alike.
//! Every walk is bounded: an index outside the table, a revisited sector or
//! a sentinel in the middle of a chain aborts with [`OleError::CorruptChain`].

use super::consts::ENDOFCHAIN;
use super::error::{ChainFault, OleError, Result};
use super::fat::FatTable;
use super::sector::{SectorKind, sector_offset};
use fixedbitset::FixedBitSet;
use log::debug;
use std::io::{Read, Seek, SeekFrom};

/// Follow a chain through `table` and return the sectors it visits, in order.
///
/// A chain that starts with [`ENDOFCHAIN`] is empty. The walk never visits more
/// sectors than the table has entries, and never more than `limit` when given.
pub fn walk_chain(table: &FatTable, start: u32, limit: Option<usize>) -> Result<Vec<u32>> {
    let mut sectors = Vec::new();
    if start == ENDOFCHAIN {
        return Ok(sectors);
    }

    let mut visited = FixedBitSet::with_capacity(table.len());
    let mut current = start;
    loop {
        let fault = |reason| OleError::CorruptChain {
            start,
            sector: current,
            reason,
        };

        if !SectorKind::classify(current).is_regular() {
            return Err(fault(ChainFault::UnexpectedSentinel));
        }
        let index = current as usize;
        let Some(next) = table.get(current) else {
            return Err(fault(ChainFault::OutOfRange {
                table_len: table.len(),
            }));
        };
        if visited.put(index) {
            return Err(fault(ChainFault::Cycle));
        }
        if let Some(limit) = limit
            && sectors.len() >= limit
        {
            return Err(fault(ChainFault::TooLong { limit }));
        }
        sectors.push(current);

        if next == ENDOFCHAIN {
            return Ok(sectors);
        }
        current = next;
    }
}

/// Read one full sector.
///
/// Any I/O failure, including a short read, is reported against the sector index.
pub(crate) fn read_sector<R: Read + Seek>(
    reader: &mut R,
    sector: u32,
    sector_size: usize,
) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; sector_size];
    read_sector_into(reader, sector, &mut buffer)?;
    Ok(buffer)
}

fn read_sector_into<R: Read + Seek>(reader: &mut R, sector: u32, buffer: &mut [u8]) -> Result<()> {
    let position = sector_offset(sector, buffer.len());
    reader
        .seek(SeekFrom::Start(position))
        .and_then(|_| reader.read_exact(buffer))
        .map_err(|source| OleError::SectorRead { sector, source })
}

/// Read a chain of regular sectors into one contiguous buffer.
///
/// The result is exactly `chain length × sector_size` bytes long.
pub fn read_chain<R: Read + Seek>(
    reader: &mut R,
    fat: &FatTable,
    start: u32,
    sector_size: usize,
) -> Result<Vec<u8>> {
    read_chain_with_limit(reader, fat, start, sector_size, None)
}

/// [`read_chain`] with an additional cap on the number of sectors.
pub fn read_chain_with_limit<R: Read + Seek>(
    reader: &mut R,
    fat: &FatTable,
    start: u32,
    sector_size: usize,
    limit: Option<usize>,
) -> Result<Vec<u8>> {
    let sectors = walk_chain(fat, start, limit)?;
    debug!("reading chain at {} ({} sectors)", start, sectors.len());

    // Grown per sector read; a chain past the end of the file stops at the first short read.
    let mut buffer = Vec::new();
    for sector in sectors {
        let filled = buffer.len();
        buffer.resize(filled + sector_size, 0);
        read_sector_into(reader, sector, &mut buffer[filled..])?;
    }
    Ok(buffer)
}

/// Read a chain of mini sectors out of an already loaded mini stream.
pub fn read_mini_chain(
    ministream: &[u8],
    minifat: &FatTable,
    start: u32,
    mini_sector_size: usize,
    limit: Option<usize>,
) -> Result<Vec<u8>> {
    let sectors = walk_chain(minifat, start, limit)?;

    let mut buffer = Vec::with_capacity((sectors.len() * mini_sector_size).min(ministream.len()));
    for sector in sectors {
        let position = sector as usize * mini_sector_size;
        let chunk = ministream
            .get(position..position + mini_sector_size)
            .ok_or_else(|| {
                OleError::InvalidFormat(format!(
                    "mini sector {} lies outside the mini stream ({} bytes)",
                    sector,
                    ministream.len()
                ))
            })?;
        buffer.extend_from_slice(chunk);
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::consts::{FATSECT, FREESECT};
    use proptest::prelude::*;
    use std::io::Cursor;

    const SECTOR: usize = 512;

    /// A fake file: a header-sized prefix followed by `n` sectors, each filled
    /// with its own index.
    fn fake_file(n: usize) -> Cursor<Vec<u8>> {
        let mut data = vec![0xAAu8; SECTOR];
        for i in 0..n {
            data.extend(std::iter::repeat_n(i as u8, SECTOR));
        }
        Cursor::new(data)
    }

    #[test]
    fn test_walk_follows_links() {
        let fat = FatTable::new(vec![FATSECT, 3, ENDOFCHAIN, 2]);
        assert_eq!(walk_chain(&fat, 1, None).unwrap(), vec![1, 3, 2]);
    }

    #[test]
    fn test_walk_empty_chain() {
        let fat = FatTable::new(vec![FATSECT]);
        assert!(walk_chain(&fat, ENDOFCHAIN, None).unwrap().is_empty());
    }

    #[test]
    fn test_walk_detects_cycle() {
        let fat = FatTable::new(vec![FATSECT, ENDOFCHAIN, 3, 2]);
        let err = walk_chain(&fat, 2, None).unwrap_err();
        assert!(matches!(
            err,
            OleError::CorruptChain {
                start: 2,
                sector: 2,
                reason: ChainFault::Cycle
            }
        ));
    }

    #[test]
    fn test_walk_detects_self_loop() {
        let fat = FatTable::new(vec![FATSECT, 1]);
        assert!(matches!(
            walk_chain(&fat, 1, None),
            Err(OleError::CorruptChain {
                reason: ChainFault::Cycle,
                ..
            })
        ));
    }

    #[test]
    fn test_walk_rejects_index_outside_table() {
        let fat = FatTable::new(vec![FATSECT, 40]);
        let err = walk_chain(&fat, 1, None).unwrap_err();
        assert!(matches!(
            err,
            OleError::CorruptChain {
                sector: 40,
                reason: ChainFault::OutOfRange { table_len: 2 },
                ..
            }
        ));
    }

    #[test]
    fn test_walk_rejects_free_sector_link() {
        let fat = FatTable::new(vec![FATSECT, FREESECT]);
        assert!(matches!(
            walk_chain(&fat, 1, None),
            Err(OleError::CorruptChain {
                sector: FREESECT,
                reason: ChainFault::UnexpectedSentinel,
                ..
            })
        ));
    }

    #[test]
    fn test_walk_respects_limit() {
        let fat = FatTable::new(vec![1, 2, 3, ENDOFCHAIN]);
        assert_eq!(walk_chain(&fat, 0, Some(4)).unwrap().len(), 4);
        assert!(matches!(
            walk_chain(&fat, 0, Some(2)),
            Err(OleError::CorruptChain {
                reason: ChainFault::TooLong { limit: 2 },
                ..
            })
        ));
    }

    #[test]
    fn test_read_chain_concatenates_in_link_order() {
        let mut file = fake_file(4);
        let fat = FatTable::new(vec![FATSECT, 3, ENDOFCHAIN, 2]);
        let data = read_chain(&mut file, &fat, 1, SECTOR).unwrap();
        assert_eq!(data.len(), 3 * SECTOR);
        assert!(data[..SECTOR].iter().all(|&b| b == 1));
        assert!(data[SECTOR..2 * SECTOR].iter().all(|&b| b == 3));
        assert!(data[2 * SECTOR..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_read_chain_short_read_names_sector() {
        let mut file = fake_file(2);
        // Sector 5 is in the table but past the end of the file.
        let fat = FatTable::new(vec![FATSECT, 5, 0, 0, 0, ENDOFCHAIN]);
        let err = read_chain(&mut file, &fat, 1, SECTOR).unwrap_err();
        assert!(matches!(err, OleError::SectorRead { sector: 5, .. }));
    }

    #[test]
    fn test_read_chain_past_end_of_file_stops_at_first_missing_sector() {
        const BIG: usize = 4096;
        let mut file = Cursor::new(vec![0x11u8; 3 * BIG]);
        // Four gigabytes of declared chain over a twelve kilobyte file.
        let mut entries: Vec<u32> = (1..=1_048_576u32).collect();
        entries[0] = FATSECT;
        *entries.last_mut().unwrap() = ENDOFCHAIN;
        let fat = FatTable::new(entries);
        let err = read_chain(&mut file, &fat, 1, BIG).unwrap_err();
        assert!(matches!(err, OleError::SectorRead { sector: 2, .. }));
    }

    #[test]
    fn test_read_mini_chain() {
        let ministream: Vec<u8> = (0..4u8).flat_map(|i| std::iter::repeat_n(i, 64)).collect();
        let minifat = FatTable::new(vec![ENDOFCHAIN, 3, 0, 2]);
        let data = read_mini_chain(&ministream, &minifat, 1, 64, None).unwrap();
        assert_eq!(data.len(), 4 * 64);
        assert_eq!(data[0], 1);
        assert_eq!(data[64], 3);
        assert_eq!(data[128], 2);
        assert_eq!(data[192], 0);
    }

    #[test]
    fn test_read_mini_chain_outside_stream() {
        let ministream = vec![0u8; 64];
        let minifat = FatTable::new(vec![1, ENDOFCHAIN]);
        assert!(matches!(
            read_mini_chain(&ministream, &minifat, 0, 64, None),
            Err(OleError::InvalidFormat(_))
        ));
    }

    fn layout_strategy() -> impl Strategy<Value = (usize, Vec<u32>)> {
        (2usize..48).prop_flat_map(|n| {
            let order: Vec<u32> = (0..n as u32).collect();
            (Just(n), Just(order).prop_shuffle(), 1..=n)
                .prop_map(|(n, order, len)| (n, order[..len].to_vec()))
        })
    }

    proptest! {
        #[test]
        fn prop_chain_length_and_order((n, order) in layout_strategy()) {
            let mut entries = vec![FREESECT; n];
            for pair in order.windows(2) {
                entries[pair[0] as usize] = pair[1];
            }
            entries[*order.last().unwrap() as usize] = ENDOFCHAIN;
            let fat = FatTable::new(entries);

            let mut file = fake_file(n);
            let data = read_chain(&mut file, &fat, order[0], SECTOR).unwrap();
            prop_assert_eq!(data.len(), order.len() * SECTOR);
            for (chunk, &sector) in data.chunks(SECTOR).zip(&order) {
                prop_assert!(chunk.iter().all(|&b| b == sector as u8));
            }
        }
    }
}
