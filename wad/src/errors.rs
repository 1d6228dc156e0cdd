use failchain::{BoxedError, ChainErrorKind};
use failure::Fail;
use std::fmt::Debug;
use std::result::Result as StdResult;

pub type Error = BoxedError<ErrorKind>;
pub type Result<T> = StdResult<T, Error>;

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "Not found: {}", 0)]
    NotFound(String),

    #[fail(display = "Corrupt WAD file: {}", 0)]
    CorruptWad(String),

    #[fail(display = "Index out of range: {}", 0)]
    OutOfRange(String),

    #[fail(display = "I/O WAD error: {}", 0)]
    Io(String),

    #[fail(display = "Corrupt metadata file: {}", 0)]
    CorruptMetadata(String),
}

impl ChainErrorKind for ErrorKind {
    type Error = Error;
}

impl ErrorKind {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ErrorKind::NotFound(_))
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ErrorKind::CorruptWad(_))
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, ErrorKind::OutOfRange(_))
    }

    pub(crate) fn invalid_byte_in_wad_name(byte: u8, bytes: &[u8]) -> Self {
        ErrorKind::CorruptWad(format!(
            "Invalid character `{}` in wad name `{}`.",
            char::from(byte),
            String::from_utf8_lossy(bytes),
        ))
    }

    pub(crate) fn wad_name_too_long(bytes: &[u8]) -> Self {
        ErrorKind::CorruptWad(format!(
            "Wad name too long `{}`.",
            String::from_utf8_lossy(bytes)
        ))
    }

    pub(crate) fn on_file_open() -> Self {
        ErrorKind::Io("Failed to open file.".to_owned())
    }

    pub(crate) fn on_file_read() -> Self {
        ErrorKind::Io("Failed to read file to memory.".to_owned())
    }

    pub(crate) fn bad_wad_header() -> Self {
        ErrorKind::CorruptWad("Could not read WAD header.".to_owned())
    }

    pub(crate) fn bad_wad_header_identifier(identifier: &[u8]) -> Self {
        ErrorKind::CorruptWad(format!(
            "Invalid header identifier: {}",
            String::from_utf8_lossy(identifier)
        ))
    }

    pub(crate) fn directory_out_of_bounds(offset: u64, end: u64, file_len: usize) -> Self {
        ErrorKind::CorruptWad(format!(
            "Lump directory [{}, {}) does not fit in file of {} bytes.",
            offset, end, file_len
        ))
    }

    pub(crate) fn bad_lump_info(lump_index: u32) -> Self {
        ErrorKind::CorruptWad(format!("Invalid lump info for lump {}", lump_index))
    }

    pub(crate) fn lump_out_of_bounds(
        lump_index: usize,
        name: &str,
        offset: u64,
        size: u64,
        file_len: usize,
    ) -> Self {
        ErrorKind::CorruptWad(format!(
            "Lump {} `{}` at [{}, +{}) extends past the end of the file ({} bytes).",
            lump_index, name, offset, size, file_len
        ))
    }

    pub(crate) fn missing_required_lump<NameT: Debug>(name: &NameT) -> Self {
        ErrorKind::NotFound(format!("Missing required lump {:?}", name))
    }

    pub(crate) fn missing_lump_after(expected: &str, marker: &str) -> Self {
        ErrorKind::NotFound(format!("No {} lump after `{}`", expected, marker))
    }

    pub(crate) fn missing_level(name: &str) -> Self {
        ErrorKind::NotFound(format!("No level named `{}`", name))
    }

    pub(crate) fn lump_index_out_of_range(index: usize, num_lumps: usize) -> Self {
        ErrorKind::OutOfRange(format!("Lump index {} >= {}", index, num_lumps))
    }

    pub(crate) fn bad_lump_size(
        index: usize,
        name: &str,
        total_size: usize,
        element_size: usize,
    ) -> Self {
        ErrorKind::CorruptWad(format!(
            "Invalid lump size in `{}` (index={}): total={}, element={}, div={}, mod={}",
            name,
            index,
            total_size,
            element_size,
            total_size / element_size,
            total_size % element_size
        ))
    }

    pub(crate) fn bad_lump_element(index: usize, name: &str, element_index: usize) -> Self {
        ErrorKind::CorruptWad(format!(
            "Invalid element {} in lump `{}` (index={})",
            element_index, name, index
        ))
    }

    pub(crate) fn bad_magic(name: &str, expected: &[u8], found: &[u8]) -> Self {
        ErrorKind::CorruptWad(format!(
            "Bad magic in `{}`: expected `{}`, found `{}`",
            name,
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(found)
        ))
    }

    pub(crate) fn unsupported_sub_format(name: &str, tag: &[u8]) -> Self {
        ErrorKind::CorruptWad(format!(
            "Unsupported sub-format `{}` in `{}`",
            String::from_utf8_lossy(tag),
            name
        ))
    }

    pub(crate) fn image<StringT: Into<String>>(message: StringT) -> Self {
        ErrorKind::CorruptWad(format!("Bad image: {}", message.into()))
    }

    pub(crate) fn image_too_large(width: usize, height: usize) -> Self {
        Self::image(format!("image too large {}x{}", width, height))
    }

    pub(crate) fn missing_number_of_patches() -> Self {
        ErrorKind::CorruptWad("Missing number of patches in PNAMES".to_owned())
    }

    pub(crate) fn missing_number_of_textures() -> Self {
        ErrorKind::CorruptWad("Missing number of textures".to_owned())
    }

    pub(crate) fn textures_lump_too_small(lump_len: usize, needed: usize) -> Self {
        ErrorKind::CorruptWad(format!(
            "Textures lump too small: {} < {}",
            lump_len, needed
        ))
    }

    pub(crate) fn bad_texture_header(i_texture: usize) -> Self {
        ErrorKind::CorruptWad(format!("Could not read header of texture {}", i_texture))
    }

    pub(crate) fn bad_patch_ref(i_patch: usize, texture: &str) -> Self {
        ErrorKind::CorruptWad(format!(
            "Could not read patch reference {} of texture `{}`",
            i_patch, texture
        ))
    }

    pub(crate) fn out_of_range<WhatT: Into<String>>(what: WhatT, index: usize, len: usize) -> Self {
        ErrorKind::OutOfRange(format!("{} {} >= {}", what.into(), index, len))
    }

    pub(crate) fn on_metadata_read() -> Self {
        ErrorKind::Io("Failed to load metadata to memory.".to_owned())
    }

    pub(crate) fn on_metadata_parse() -> Self {
        ErrorKind::CorruptMetadata("Failed to parse metadata file.".to_owned())
    }
}
