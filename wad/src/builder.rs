use super::archive::{Archive, IWAD_HEADER, PWAD_HEADER};
use super::errors::Result;
use super::name::WadName;
use super::types::{WadInfo, WadLump};
use serde::Serialize;

/// Writes a WAD file to memory: a header, the lump data in order, then the directory.
///
/// Names go through `WadName::from_raw`, so anything longer than 8 bytes is truncated.
pub struct ArchiveBuilder {
    identifier: [u8; 4],
    lumps: Vec<(WadName, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        ArchiveBuilder {
            identifier: *IWAD_HEADER,
            lumps: Vec::new(),
        }
    }

    pub fn pwad() -> Self {
        ArchiveBuilder {
            identifier: *PWAD_HEADER,
            lumps: Vec::new(),
        }
    }

    pub fn num_lumps(&self) -> usize {
        self.lumps.len()
    }

    pub fn lump(&mut self, name: &str, bytes: Vec<u8>) -> &mut Self {
        let mut raw = [0u8; 8];
        for (dest, &src) in raw.iter_mut().zip(name.as_bytes()) {
            *dest = src;
        }
        self.lumps.push((WadName::from_raw(raw), bytes));
        self
    }

    pub fn marker(&mut self, name: &str) -> &mut Self {
        self.lump(name, Vec::new())
    }

    /// Adds a lump holding the packed, little-endian encoding of `records`.
    pub fn records<T: Serialize>(&mut self, name: &str, records: &[T]) -> &mut Self {
        self.records_after(name, &[], records)
    }

    /// Like `records`, with `magic` written before the first record.
    pub fn records_after<T: Serialize>(
        &mut self,
        name: &str,
        magic: &[u8],
        records: &[T],
    ) -> &mut Self {
        let mut bytes = magic.to_vec();
        for record in records {
            // Serializing plain-data records into a `Vec` cannot fail.
            if let Ok(encoded) = bincode::serialize(record) {
                bytes.extend_from_slice(&encoded);
            }
        }
        self.lump(name, bytes)
    }

    pub fn build(&self) -> Vec<u8> {
        const HEADER_SIZE: u32 = 12;
        let data_size: usize = self.lumps.iter().map(|(_, bytes)| bytes.len()).sum();
        let header = WadInfo {
            identifier: self.identifier,
            num_lumps: self.lumps.len() as u32,
            info_table_offset: HEADER_SIZE + data_size as u32,
        };

        let mut out = Vec::with_capacity(HEADER_SIZE as usize + data_size + 16 * self.lumps.len());
        let mut directory = Vec::with_capacity(self.lumps.len());
        push_encoded(&mut out, &header);
        for (name, bytes) in &self.lumps {
            directory.push(WadLump {
                file_pos: out.len() as u32,
                size: bytes.len() as u32,
                name: *name,
            });
            out.extend_from_slice(bytes);
        }
        for lump in &directory {
            push_encoded(&mut out, lump);
        }
        out
    }

    pub fn into_archive(self) -> Result<Archive> {
        Archive::from_bytes(self.build())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn push_encoded<T: Serialize>(out: &mut Vec<u8>, value: &T) {
    if let Ok(encoded) = bincode::serialize(value) {
        out.extend_from_slice(&encoded);
    }
}
