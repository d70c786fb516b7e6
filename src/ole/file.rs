use super::chain::{read_chain_with_limit, read_mini_chain};
use super::consts::*;
use super::directory::{DirEntry, Directory};
use super::error::{OleError, Result};
use super::fat::{FatTable, build_fat, build_minifat};
use super::header::{Header, read_header};
use super::metadata::SummaryInfo;
use super::options::ParseOptions;
use super::property::{PropertyId, PropertyStream, PropertyValue, decode_property_stream};
use super::stream::StreamLocation;
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// An opened compound file.
///
/// Opening reads and validates the header, assembles the FAT, decodes the
/// directory and loads the mini-FAT. Stream contents are read on demand; the
/// mini stream is loaded the first time a small stream is requested.
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    reader: R,
    header: Header,
    /// Sector size (512 or 4096 bytes)
    sector_size: usize,
    /// Mini sector size (always 64 bytes after validation)
    mini_sector_size: usize,
    fat: FatTable,
    minifat: FatTable,
    directory: Directory,
    /// Mini stream data (loaded on demand)
    ministream: Option<Vec<u8>>,
    options: ParseOptions,
}

impl<R: Read + Seek> OleFile<R> {
    /// Open a compound file with default options.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_options(reader, ParseOptions::default())
    }

    /// Open a compound file.
    ///
    /// Fails on the first header check that does not hold, on any short
    /// sector read, and on corrupt FAT, directory or mini-FAT chains.
    pub fn open_with_options(mut reader: R, options: ParseOptions) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = read_header(&mut reader)?;
        header.validate()?;

        let sector_size = header.sector_size()?;
        let mini_sector_size = header.mini_sector_size()?;
        debug!(
            "version {}.{:#x}, {} byte sectors, {} FAT sectors, directory at {}",
            header.major_version,
            header.minor_version,
            sector_size,
            header.num_fat_sectors,
            header.dir_sector_start
        );

        let fat = build_fat(&mut reader, &header)?;

        let dir_data = read_chain_with_limit(
            &mut reader,
            &fat,
            header.dir_sector_start,
            sector_size,
            options.max_chain_sectors,
        )?;
        let mut directory = Directory::decode(&dir_data)?;
        if header.major_version == 3 {
            directory.truncate_v3_sizes();
        }
        debug!("directory decoded: {} entries", directory.len());

        let minifat = if options.use_mini_stream {
            build_minifat(&mut reader, &fat, &header, options.max_chain_sectors)?
        } else {
            FatTable::default()
        };

        Ok(OleFile {
            reader,
            header,
            sector_size,
            mini_sector_size,
            fat,
            minifat,
            directory,
            ministream: None,
            options,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    /// The mini-FAT; empty when the file has none or mini streams are disabled.
    pub fn minifat(&self) -> &FatTable {
        &self.minifat
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Read a root-level stream by exact, case-sensitive name.
    pub fn open_stream(&mut self, name: &str) -> Result<Vec<u8>> {
        let location = self.directory.find_stream(name)?;
        self.read_location(location)
    }

    /// Read a stream by storage path, e.g. `["ObjectPool", "_1234", "Ole"]`.
    ///
    /// Path components are compared case-insensitively.
    pub fn open_stream_path(&mut self, path: &[&str]) -> Result<Vec<u8>> {
        let entry = self.directory.find_path(path)?;
        if !entry.is_stream() {
            return Err(OleError::StreamNotFound(path.join("/")));
        }
        let location = StreamLocation::from(entry);
        self.read_location(location)
    }

    /// Read the contents of a directory entry.
    pub fn read_entry(&mut self, entry: &DirEntry) -> Result<Vec<u8>> {
        self.read_location(StreamLocation::from(entry))
    }

    /// Read the data at a located stream, truncated to its declared size.
    pub fn read_location(&mut self, location: StreamLocation) -> Result<Vec<u8>> {
        let mut data = if self.is_mini_stream(location.size) {
            self.read_from_ministream(location.start_sector)?
        } else {
            read_chain_with_limit(
                &mut self.reader,
                &self.fat,
                location.start_sector,
                self.sector_size,
                self.options.max_chain_sectors,
            )?
        };

        if location.size < data.len() as u64 {
            data.truncate(location.size as usize);
        }
        Ok(data)
    }

    /// Decode a root-level property-set stream.
    pub fn property_stream(&mut self, name: &str) -> Result<PropertyStream> {
        let data = self.open_stream(name)?;
        decode_property_stream(&data, self.options.default_codepage)
    }

    /// Properties of the `\u{5}SummaryInformation` stream.
    pub fn summary_information(&mut self) -> Result<Vec<(PropertyId, PropertyValue)>> {
        self.property_stream(SUMMARY_INFORMATION)
            .map(PropertyStream::into_properties)
    }

    /// Finish the pipeline: decode the summary properties and drop the reader.
    ///
    /// A missing SummaryInformation stream is an error unless
    /// [`ParseOptions::require_summary_information`] is off, in which case
    /// the property list is empty.
    pub fn into_container(mut self) -> Result<Container> {
        let properties = match self.summary_information() {
            Ok(properties) => properties,
            Err(OleError::StreamNotFound(name)) if !self.options.require_summary_information => {
                debug!("{:?} not present, continuing without properties", name);
                Vec::new()
            },
            Err(e) => return Err(e),
        };

        Ok(Container {
            header: self.header,
            fat: self.fat,
            directory: self.directory,
            properties,
        })
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn is_mini_stream(&self, size: u64) -> bool {
        self.options.use_mini_stream
            && !self.minifat.is_empty()
            && size < u64::from(self.header.mini_stream_cutoff)
    }

    fn read_from_ministream(&mut self, start: u32) -> Result<Vec<u8>> {
        self.load_ministream()?;
        let ministream = self.ministream.as_deref().unwrap_or(&[]);
        read_mini_chain(
            ministream,
            &self.minifat,
            start,
            self.mini_sector_size,
            self.options.max_chain_sectors,
        )
    }

    /// The mini stream is the root entry's stream.
    fn load_ministream(&mut self) -> Result<()> {
        if self.ministream.is_some() {
            return Ok(());
        }
        let root = self
            .directory
            .root()
            .ok_or_else(|| OleError::CorruptDirectory("no root entry".to_string()))?;
        let (start, size) = (root.start_sector, root.stream_size);

        let mut data = read_chain_with_limit(
            &mut self.reader,
            &self.fat,
            start,
            self.sector_size,
            self.options.max_chain_sectors,
        )?;
        if size < data.len() as u64 {
            data.truncate(size as usize);
        }
        debug!("mini stream loaded: {} bytes", data.len());
        self.ministream = Some(data);
        Ok(())
    }
}

/// Everything the pipeline extracts from a compound file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub header: Header,
    pub fat: FatTable,
    pub directory: Directory,
    /// SummaryInformation properties in order of appearance
    pub properties: Vec<(PropertyId, PropertyValue)>,
}

impl Container {
    /// First value of a property, if present.
    pub fn property(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, value)| value)
    }

    /// Typed view of the summary properties.
    pub fn summary(&self) -> SummaryInfo {
        SummaryInfo::from_properties(&self.properties)
    }
}

/// Run the whole pipeline over a reader.
///
/// # Examples
///
/// ```no_run
/// use olecf::ole::{parse, ParseOptions, PropertyId};
/// use std::fs::File;
///
/// let file = File::open("report.doc")?;
/// let container = parse(file, &ParseOptions::default())?;
/// if let Some(title) = container.property(PropertyId::Title) {
///     println!("Title: {}", title);
/// }
/// # Ok::<(), olecf::ole::OleError>(())
/// ```
pub fn parse<R: Read + Seek>(reader: R, options: &ParseOptions) -> Result<Container> {
    OleFile::open_with_options(reader, options.clone())?.into_container()
}

/// Open `path` and run the whole pipeline over it.
///
/// The file is closed before this returns, on success and on failure.
pub fn parse_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Container> {
    let file = File::open(path)?;
    parse(BufReader::new(file), options)
}

/// Check if a file/data is an OLE file by checking magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && data.starts_with(MAGIC)
}
