use super::consts::*;
use super::error::{OleError, Result, ValidationError};
use super::sector::sector_size_from_shift;
use serde::Serialize;
use std::io::{self, Read};
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw compound file header (512 bytes), in on-disk layout.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    signature: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    dir_sector_start: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    minifat_sector_start: U32<LE>,
    num_minifat_sectors: U32<LE>,
    difat_sector_start: U32<LE>,
    num_difat_sectors: U32<LE>,
    difat: [U32<LE>; HEADER_DIFAT_SLOTS],
}

/// Compound file header.
///
/// Read once when the file is opened and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub signature: [u8; 8],
    pub clsid: [u8; 16],
    pub minor_version: u16,
    pub major_version: u16,
    pub byte_order: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub num_dir_sectors: u32,
    pub num_fat_sectors: u32,
    pub dir_sector_start: u32,
    pub transaction_signature: u32,
    pub mini_stream_cutoff: u32,
    pub minifat_sector_start: u32,
    pub num_minifat_sectors: u32,
    pub difat_sector_start: u32,
    pub num_difat_sectors: u32,
    /// Inline DIFAT: sector indices of the first 109 FAT sectors
    pub difat: Vec<u32>,
}

impl Header {
    /// Decode the header from the first 512 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let prefix = bytes.get(..HEADER_SIZE).ok_or(OleError::Truncated {
            expected: HEADER_SIZE,
            found: bytes.len(),
        })?;
        let raw = RawHeader::read_from_bytes(prefix)
            .map_err(|_| OleError::InvalidFormat("Failed to parse header".to_string()))?;

        Ok(Header {
            signature: raw.signature,
            clsid: raw.clsid,
            minor_version: raw.minor_version.get(),
            major_version: raw.major_version.get(),
            byte_order: raw.byte_order.get(),
            sector_shift: raw.sector_shift.get(),
            mini_sector_shift: raw.mini_sector_shift.get(),
            num_dir_sectors: raw.num_dir_sectors.get(),
            num_fat_sectors: raw.num_fat_sectors.get(),
            dir_sector_start: raw.dir_sector_start.get(),
            transaction_signature: raw.transaction_signature.get(),
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            minifat_sector_start: raw.minifat_sector_start.get(),
            num_minifat_sectors: raw.num_minifat_sectors.get(),
            difat_sector_start: raw.difat_sector_start.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            difat: raw.difat.iter().map(|v| v.get()).collect(),
        })
    }

    /// Run the header checks, stopping at the first failure.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_header(self)
    }

    /// Sector size in bytes (`2^sector_shift`).
    ///
    /// Only meaningful once the header has been validated.
    pub fn sector_size(&self) -> Result<usize> {
        sector_size_from_shift(self.sector_shift).ok_or_else(|| {
            OleError::InvalidFormat(format!("sector shift {} too large", self.sector_shift))
        })
    }

    /// Mini sector size in bytes (`2^mini_sector_shift`).
    pub fn mini_sector_size(&self) -> Result<usize> {
        sector_size_from_shift(self.mini_sector_shift).ok_or_else(|| {
            OleError::InvalidFormat(format!(
                "mini sector shift {} too large",
                self.mini_sector_shift
            ))
        })
    }

    /// Inline DIFAT slots that reference a FAT sector, in slot order.
    pub fn fat_sector_slots(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.difat
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, sector)| sector != FREESECT)
    }
}

/// Read the fixed-size header from the start of a source.
///
/// Fails with [`OleError::Truncated`] when the source holds fewer than 512 bytes.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let mut buffer = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(OleError::Io(e)),
        }
    }
    if filled < HEADER_SIZE {
        return Err(OleError::Truncated {
            expected: HEADER_SIZE,
            found: filled,
        });
    }
    Header::parse(&buffer)
}

/// Validate a header against the format's fixed constants.
///
/// Checks run in a fixed order and the first failure is returned:
/// signature, minor version, major version, byte order, sector shift,
/// mini sector shift, directory sector count (version 3 only) and
/// mini stream cutoff.
pub fn validate_header(header: &Header) -> std::result::Result<(), ValidationError> {
    if &header.signature != MAGIC {
        return Err(ValidationError::Signature {
            found: header.signature,
        });
    }

    if header.minor_version != MINOR_VERSION {
        return Err(ValidationError::MinorVersion {
            expected: MINOR_VERSION,
            found: header.minor_version,
        });
    }

    let expected_shift = match header.major_version {
        3 => SECTOR_SHIFT_V3,
        4 => SECTOR_SHIFT_V4,
        found => return Err(ValidationError::MajorVersion { found }),
    };

    if header.byte_order != BYTE_ORDER_MARK {
        return Err(ValidationError::ByteOrder {
            expected: BYTE_ORDER_MARK,
            found: header.byte_order,
        });
    }

    if header.sector_shift != expected_shift {
        return Err(ValidationError::SectorShift {
            major_version: header.major_version,
            expected: expected_shift,
            found: header.sector_shift,
        });
    }

    if header.mini_sector_shift != MINI_SECTOR_SHIFT {
        return Err(ValidationError::MiniSectorShift {
            expected: MINI_SECTOR_SHIFT,
            found: header.mini_sector_shift,
        });
    }

    if header.major_version == 3 && header.num_dir_sectors != 0 {
        return Err(ValidationError::DirectorySectorCount {
            found: header.num_dir_sectors,
        });
    }

    if header.mini_stream_cutoff != MINI_STREAM_CUTOFF {
        return Err(ValidationError::MiniStreamCutoff {
            expected: MINI_STREAM_CUTOFF,
            found: header.mini_stream_cutoff,
        });
    }

    Ok(())
}
