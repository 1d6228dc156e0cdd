use super::errors::{ErrorKind, Result};
use super::name::{IntoWadName, WadName};
use super::types::{WadInfo, WadLump};
use failchain::{bail, ensure, ResultExt};
use indexmap::IndexMap;
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::mem;
use std::path::Path;

const HEADER_SIZE: usize = 12;
const LUMP_INFO_SIZE: usize = 16;

/// A WAD file loaded into memory, with its lump directory indexed by name.
#[derive(Debug)]
pub struct Archive {
    bytes: Vec<u8>,
    index_map: IndexMap<WadName, usize>,
    lumps: Vec<LumpInfo>,
    levels: Vec<usize>,
}

impl Archive {
    pub fn open<P>(wad_path: &P) -> Result<Archive>
    where
        P: AsRef<Path> + Debug,
    {
        info!("Loading wad file '{:?}'...", wad_path);
        let mut bytes = Vec::new();
        File::open(wad_path.as_ref())
            .chain_err(ErrorKind::on_file_open)?
            .read_to_end(&mut bytes)
            .chain_err(ErrorKind::on_file_read)?;
        Archive::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Archive> {
        ensure!(bytes.len() >= HEADER_SIZE, ErrorKind::bad_wad_header());
        let header: WadInfo =
            bincode::deserialize(&bytes[..HEADER_SIZE]).chain_err(ErrorKind::bad_wad_header)?;

        ensure!(
            &header.identifier == IWAD_HEADER || &header.identifier == PWAD_HEADER,
            ErrorKind::bad_wad_header_identifier(&header.identifier)
        );

        let directory_start = u64::from(header.info_table_offset);
        let directory_end = directory_start + u64::from(header.num_lumps) * LUMP_INFO_SIZE as u64;
        ensure!(
            directory_end <= bytes.len() as u64,
            ErrorKind::directory_out_of_bounds(directory_start, directory_end, bytes.len())
        );

        let num_lumps = header.num_lumps as usize;
        let mut lumps = Vec::with_capacity(num_lumps);
        let mut levels = Vec::with_capacity(64);
        let mut index_map = IndexMap::with_capacity(num_lumps);

        let mut directory = &bytes[directory_start as usize..directory_end as usize];
        for i_lump in 0..header.num_lumps {
            let fileinfo: WadLump = bincode::deserialize_from(&mut directory)
                .chain_err(|| ErrorKind::bad_lump_info(i_lump))?;
            let (offset, size) = (u64::from(fileinfo.file_pos), u64::from(fileinfo.size));
            ensure!(
                offset + size <= bytes.len() as u64,
                ErrorKind::lump_out_of_bounds(
                    i_lump as usize,
                    &fileinfo.name.to_lossy_string(),
                    offset,
                    size,
                    bytes.len(),
                )
            );

            // Lookups return the first lump with a given name.
            index_map.entry(fileinfo.name).or_insert_with(|| lumps.len());
            lumps.push(LumpInfo {
                name: fileinfo.name,
                offset: offset as usize,
                size: size as usize,
            });

            // Our heuristic for level lumps is that they are preceeded by the "THINGS"
            // lump.
            if &fileinfo.name == b"THINGS\0\0" {
                if i_lump > 0 {
                    levels.push((i_lump - 1) as usize);
                } else {
                    warn!("THINGS lump at the start of the directory, ignoring.");
                }
            }
        }
        info!(
            "  {:4} lumps, {:4} levels ({})",
            lumps.len(),
            levels.len(),
            String::from_utf8_lossy(&header.identifier)
        );

        Ok(Archive {
            bytes,
            index_map,
            lumps,
            levels,
        })
    }

    pub fn num_lumps(&self) -> usize {
        self.lumps.len()
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level_name(&self, level_index: usize) -> Option<WadName> {
        self.levels
            .get(level_index)
            .map(|&lump_index| self.lumps[lump_index].name)
    }

    pub fn level_names(&self) -> impl Iterator<Item = WadName> + '_ {
        self.levels
            .iter()
            .map(move |&lump_index| self.lumps[lump_index].name)
    }

    /// Index of the lump for the level marker `name` (case-insensitive).
    pub fn level_index(&self, name: &str) -> Result<usize> {
        let marker = self
            .find_record(name)
            .map_err(|_| ErrorKind::missing_level(name))?;
        self.levels
            .iter()
            .position(|&lump_index| lump_index == marker)
            .ok_or_else(|| ErrorKind::missing_level(name).into())
    }

    pub fn level_lump(&self, level_index: usize) -> Result<LumpReader> {
        let lump_index = *self
            .levels
            .get(level_index)
            .ok_or_else(|| ErrorKind::out_of_range("level", level_index, self.levels.len()))?;
        self.lump_by_index(lump_index)
    }

    /// Case-insensitive exact lookup. When several lumps share a name the first one wins.
    pub fn find_record<N: IntoWadName>(&self, name: N) -> Result<usize> {
        let name = name
            .into_wad_name()
            .map_err(|error| ErrorKind::NotFound(error.to_string()))?;
        self.index_map
            .get(&name)
            .cloned()
            .ok_or_else(|| ErrorKind::missing_required_lump(&name).into())
    }

    pub fn record_bytes(&self, index: usize) -> Result<&[u8]> {
        Ok(self.lump_by_index(index)?.bytes())
    }

    pub fn required_named_lump<N: IntoWadName>(&self, name: N) -> Result<LumpReader> {
        self.lump_by_index(self.find_record(name)?)
    }

    pub fn named_lump<N: IntoWadName>(&self, name: N) -> Result<Option<LumpReader>> {
        let name = name.into_wad_name()?;
        match self.index_map.get(&name) {
            Some(&index) => self.lump_by_index(index).map(Some),
            None => Ok(None),
        }
    }

    /// The lump `offset` entries after `marker`; `expected` only names it in the error.
    pub fn lump_after(&self, marker: usize, offset: usize, expected: &str) -> Result<LumpReader> {
        let name = self.lumps.get(marker).map(|info| info.name).unwrap_or_default();
        self.lump_by_index(marker + offset)
            .map_err(|_| ErrorKind::missing_lump_after(expected, &name.to_lossy_string()).into())
    }

    pub fn lump_by_index(&self, index: usize) -> Result<LumpReader> {
        Ok(LumpReader {
            archive: self,
            info: self
                .lumps
                .get(index)
                .ok_or_else(|| ErrorKind::lump_index_out_of_range(index, self.lumps.len()))?,
            index,
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct LumpReader<'a> {
    archive: &'a Archive,
    info: &'a LumpInfo,
    index: usize,
}

impl<'a> LumpReader<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> WadName {
        self.info.name
    }

    pub fn len(&self) -> usize {
        self.info.size
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.info.name.as_bytes().eq_ignore_ascii_case(name.as_bytes())
    }

    pub fn bytes(&self) -> &'a [u8] {
        &self.archive.bytes[self.info.offset..][..self.info.size]
    }

    /// Decodes the whole lump as a packed array of fixed-size records; an empty lump is an empty
    /// array.
    pub fn decode_vec<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.decode_vec_after(&[])
    }

    /// Like `decode_vec`, but the lump must begin with `magic`, which is skipped.
    pub fn decode_vec_after<T: DeserializeOwned>(&self, magic: &[u8]) -> Result<Vec<T>> {
        let LumpReader { info, index, .. } = *self;
        let name = info.name.to_lossy_string();
        let bytes = self.bytes();
        ensure!(
            bytes.len() >= magic.len() && &bytes[..magic.len()] == magic,
            ErrorKind::bad_magic(&name, magic, &bytes[..magic.len().min(bytes.len())])
        );
        let mut bytes = &bytes[magic.len()..];
        let element_size = mem::size_of::<T>();
        ensure!(
            element_size > 0 && bytes.len() % element_size == 0,
            ErrorKind::bad_lump_size(index, &name, bytes.len(), element_size.max(1)),
        );
        let num_elements = bytes.len() / element_size;
        let mut elements = Vec::with_capacity(num_elements);
        for i_element in 0..num_elements {
            elements.push(
                bincode::deserialize_from(&mut bytes)
                    .chain_err(|| ErrorKind::bad_lump_element(index, &name, i_element))?,
            );
        }
        Ok(elements)
    }

    pub fn read_blobs<B>(&self) -> Result<Vec<B>>
    where
        B: Default + AsMut<[u8]>,
    {
        let LumpReader { info, index, .. } = *self;
        let blob_size = B::default().as_mut().len();
        let name = info.name.to_lossy_string();
        if blob_size == 0 {
            bail!(ErrorKind::bad_lump_size(index, &name, info.size, 1));
        }
        ensure!(
            info.size > 0 && (info.size % blob_size) == 0,
            ErrorKind::bad_lump_size(index, &name, info.size, blob_size),
        );
        Ok(self
            .bytes()
            .chunks(blob_size)
            .map(|chunk| {
                let mut blob = B::default();
                blob.as_mut().copy_from_slice(chunk);
                blob
            })
            .collect())
    }
}

#[derive(Copy, Clone, Debug)]
struct LumpInfo {
    name: WadName,
    offset: usize,
    size: usize,
}

pub(crate) const IWAD_HEADER: &[u8; 4] = b"IWAD";
pub(crate) const PWAD_HEADER: &[u8; 4] = b"PWAD";

#[cfg(test)]
mod test {
    use super::super::builder::ArchiveBuilder;
    use super::super::types::{WadVertex, PALETTE_SIZE};
    use super::Archive;

    fn small_archive() -> Archive {
        let mut builder = ArchiveBuilder::new();
        builder
            .lump("MAP01", Vec::new())
            .lump("THINGS", vec![0u8; 10])
            .lump("PLAYPAL", vec![7u8; PALETTE_SIZE])
            .lump("DUP", vec![1, 2, 3])
            .lump("DUP", vec![4]);
        builder.into_archive().unwrap()
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let archive = small_archive();
        let index = archive.find_record("PLAYPAL").unwrap();
        assert_eq!(archive.find_record("playpal").unwrap(), index);
        assert_eq!(archive.find_record("PlayPal").unwrap(), index);
        assert_eq!(archive.record_bytes(index).unwrap().len(), PALETTE_SIZE);
    }

    #[test]
    fn missing_and_duplicate_names() {
        let archive = small_archive();
        assert!(archive
            .find_record("COLORMAP")
            .unwrap_err()
            .kind()
            .is_not_found());
        assert!(archive
            .find_record("WAYTOOLONGNAME")
            .unwrap_err()
            .kind()
            .is_not_found());
        let dup = archive.find_record("dup").unwrap();
        assert_eq!(archive.record_bytes(dup).unwrap(), &[1, 2, 3]);
        assert!(archive.record_bytes(100).unwrap_err().kind().is_out_of_range());
    }

    #[test]
    fn levels_are_detected_by_things() {
        let archive = small_archive();
        assert_eq!(archive.num_levels(), 1);
        assert_eq!(archive.level_name(0).unwrap().as_bytes(), b"MAP01");
        assert_eq!(archive.level_index("map01").unwrap(), 0);
        assert!(archive.level_index("PLAYPAL").unwrap_err().kind().is_not_found());
    }

    #[test]
    fn short_file_is_corrupt() {
        let error = Archive::from_bytes(b"IWAD\0\0".to_vec()).unwrap_err();
        assert!(error.kind().is_corrupt());
    }

    #[test]
    fn bad_identifier_is_corrupt() {
        let mut bytes = ArchiveBuilder::new().build();
        bytes[..4].copy_from_slice(b"JUNK");
        assert!(Archive::from_bytes(bytes).unwrap_err().kind().is_corrupt());
    }

    #[test]
    fn lump_past_end_of_file_is_corrupt() {
        let mut builder = ArchiveBuilder::new();
        builder.lump("DATA", vec![0u8; 16]);
        let mut bytes = builder.build();
        // Directory is at the end: offset(4) size(4) name(8). Bump the size.
        let size_at = bytes.len() - 12;
        bytes[size_at..size_at + 4].copy_from_slice(&1000u32.to_le_bytes());
        assert!(Archive::from_bytes(bytes).unwrap_err().kind().is_corrupt());
    }

    #[test]
    fn directory_past_end_of_file_is_corrupt() {
        let mut bytes = ArchiveBuilder::new().build();
        // Claim one lump with no directory entry.
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert!(Archive::from_bytes(bytes).unwrap_err().kind().is_corrupt());
    }

    #[test]
    fn decode_vec_checks_divisibility() {
        let mut builder = ArchiveBuilder::new();
        builder
            .lump("GOOD", vec![1, 0, 2, 0, 3, 0, 4, 0])
            .lump("BAD", vec![1, 0, 2, 0, 3])
            .lump("EMPTY", Vec::new());
        let archive = builder.into_archive().unwrap();

        let good: Vec<WadVertex> = archive.required_named_lump("GOOD").unwrap().decode_vec().unwrap();
        assert_eq!(good.len(), 2);
        assert_eq!((good[1].x, good[1].y), (3, 4));

        let bad = archive
            .required_named_lump("BAD")
            .unwrap()
            .decode_vec::<WadVertex>();
        assert!(bad.unwrap_err().kind().is_corrupt());

        let empty: Vec<WadVertex> = archive.required_named_lump("EMPTY").unwrap().decode_vec().unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn pwad_is_accepted() {
        let mut builder = ArchiveBuilder::pwad();
        builder.lump("A", vec![1]);
        assert_eq!(builder.into_archive().unwrap().num_lumps(), 1);
    }
}
