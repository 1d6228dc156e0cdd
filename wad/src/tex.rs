use super::archive::Archive;
use super::errors::{ErrorKind, Result};
use super::image::{Canvas, Image, TRANSPARENT_PIXEL};
use super::name::WadName;
use super::types::{Palette, WadTextureHeader, WadTexturePatchRef, FLAT_BYTES, PALETTE_SIZE};
use byteorder::{LittleEndian, ReadBytesExt};
use failchain::{ensure, ResultExt};
use indexmap::IndexMap;
use log::{error, info, warn};
use std::mem;
use std::time::Instant;

pub type Flat = Vec<u8>;

/// Floor and ceiling textures, in the order they appear between the `F_START` and `F_END`
/// markers.
#[derive(Default, Debug)]
pub struct FlatSet {
    flats: IndexMap<WadName, Flat>,
}

impl FlatSet {
    pub fn from_flats<I>(flats: I) -> FlatSet
    where
        I: IntoIterator<Item = (WadName, Flat)>,
    {
        FlatSet {
            flats: flats.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.flats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flats.is_empty()
    }

    pub fn index_of(&self, name: WadName) -> Option<usize> {
        self.flats.get_index_of(&name)
    }

    /// Index of the flat that marks open sky, if the archive has one.
    pub fn sky_index(&self, sky_flat: WadName) -> Option<usize> {
        self.index_of(sky_flat)
    }

    pub fn name(&self, index: usize) -> Option<WadName> {
        self.flats.get_index(index).map(|(name, _)| *name)
    }

    pub fn pixels(&self, index: usize) -> Option<&[u8]> {
        self.flats.get_index(index).map(|(_, flat)| &flat[..])
    }

    /// Every flat back to back, 64x64 bytes each.
    pub fn array_pixels(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.flats.len() * FLAT_BYTES);
        for flat in self.flats.values() {
            pixels.extend_from_slice(flat);
        }
        pixels
    }
}

pub fn decode_flats(wad: &Archive) -> Result<FlatSet> {
    let start = wad.required_named_lump("F_START")?.index();
    let end = wad.required_named_lump("F_END")?.index();
    let mut flats = IndexMap::new();
    let mut skipped = 0usize;
    for i_lump in (start + 1)..end {
        let lump = wad.lump_by_index(i_lump)?;
        if lump.len() != FLAT_BYTES {
            skipped += 1;
            continue;
        }
        flats.entry(lump.name()).or_insert_with(|| lump.bytes().to_vec());
    }
    info!("  {:4} flats ({} other lumps skipped)", flats.len(), skipped);
    Ok(FlatSet { flats })
}

#[derive(Debug)]
pub struct Palettes {
    palettes: Vec<Palette>,
}

impl Palettes {
    pub fn from_palettes(palettes: Vec<Palette>) -> Palettes {
        Palettes { palettes }
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Palette> {
        self.palettes.get(index)
    }

    /// All palettes back to back, 256 RGB triples each.
    pub fn pixels(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.palettes.len() * PALETTE_SIZE);
        for palette in &self.palettes {
            pixels.extend_from_slice(&palette.0);
        }
        pixels
    }
}

pub fn decode_palettes(wad: &Archive) -> Result<Palettes> {
    let palettes: Vec<Palette> = wad.required_named_lump("PLAYPAL")?.read_blobs()?;
    info!("  {:4} palettes", palettes.len());
    Ok(Palettes { palettes })
}

#[derive(Debug)]
pub struct WallTexture {
    pub name: WadName,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Composed wall textures, indexed in directory order.
#[derive(Default, Debug)]
pub struct WallTextureSet {
    textures: IndexMap<WadName, WallTexture>,
    max_width: usize,
    max_height: usize,
}

impl WallTextureSet {
    pub fn from_textures<I>(textures: I) -> WallTextureSet
    where
        I: IntoIterator<Item = WallTexture>,
    {
        let mut set = WallTextureSet::default();
        for texture in textures {
            set.insert(texture);
        }
        set
    }

    fn insert(&mut self, texture: WallTexture) {
        if texture.width == 0 || texture.height == 0 {
            warn!(
                "Wall texture {} is {}x{}, skipping.",
                texture.name, texture.width, texture.height
            );
            return;
        }
        self.max_width = self.max_width.max(texture.width);
        self.max_height = self.max_height.max(texture.height);
        self.textures.insert(texture.name, texture);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn index_of(&self, name: WadName) -> Option<usize> {
        self.textures.get_index_of(&name)
    }

    pub fn get(&self, index: usize) -> Option<&WallTexture> {
        self.textures.get_index(index).map(|(_, texture)| texture)
    }

    /// Largest width and height over all textures: the size of one slice of the texture array.
    pub fn max_size(&self) -> (usize, usize) {
        (self.max_width, self.max_height)
    }

    /// The fraction of an array slice that texture `index` occupies.
    pub fn padding(&self, index: usize) -> Option<[f32; 2]> {
        self.get(index).map(|texture| {
            [
                texture.width as f32 / self.max_width as f32,
                texture.height as f32 / self.max_height as f32,
            ]
        })
    }

    /// Every texture in its own `max_width x max_height` slice, top-left aligned, the rest left
    /// transparent.
    pub fn array_pixels(&self) -> Vec<u8> {
        let slice_size = self.max_width * self.max_height;
        if slice_size == 0 {
            return Vec::new();
        }
        let mut pixels = vec![TRANSPARENT_PIXEL; slice_size * self.textures.len()];
        for (slice, texture) in pixels.chunks_mut(slice_size).zip(self.textures.values()) {
            if texture.width == 0 {
                continue;
            }
            for (dest_row, src_row) in slice
                .chunks_mut(self.max_width)
                .zip(texture.pixels.chunks(texture.width))
            {
                dest_row[..texture.width].copy_from_slice(src_row);
            }
        }
        pixels
    }
}

pub fn decode_wall_textures(wad: &Archive, directory_name: &str) -> Result<WallTextureSet> {
    info!("Reading wall textures from {}...", directory_name);
    let patches = read_patches(wad)?;

    let start_time = Instant::now();
    let lump = wad.required_named_lump(directory_name)?;
    let mut textures = WallTextureSet::default();
    read_textures(lump.bytes(), &patches, &mut textures)?;
    info!(
        "  {:4} textures in {}, max size {:?}",
        textures.len(),
        directory_name,
        textures.max_size()
    );
    info!(
        "Done in {:.2}ms.",
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(textures)
}

/// Every wall texture of a game: `TEXTURE1`, then `TEXTURE2` if the archive has one.
pub fn decode_game_wall_textures(wad: &Archive) -> Result<WallTextureSet> {
    let patches = read_patches(wad)?;

    let start_time = Instant::now();
    let mut textures = WallTextureSet::default();
    read_textures(
        wad.required_named_lump("TEXTURE1")?.bytes(),
        &patches,
        &mut textures,
    )?;
    if let Some(lump) = wad.named_lump("TEXTURE2")? {
        read_textures(lump.bytes(), &patches, &mut textures)?;
    }
    info!(
        "  {:4} wall textures, max size {:?}, in {:.2}ms",
        textures.len(),
        textures.max_size(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(textures)
}

fn read_patches(wad: &Archive) -> Result<Vec<(WadName, Option<Image>)>> {
    let mut lump = wad.required_named_lump("PNAMES")?.bytes();

    let num_patches = lump
        .read_u32::<LittleEndian>()
        .chain_err(ErrorKind::missing_number_of_patches)? as usize;
    ensure!(
        lump.len() >= num_patches * 8,
        ErrorKind::textures_lump_too_small(lump.len(), num_patches * 8)
    );
    let mut patches = Vec::with_capacity(num_patches);

    let mut missing_patches = 0usize;
    info!("Reading {} patches....", num_patches);
    let start_time = Instant::now();
    for _ in 0..num_patches {
        let name: WadName = bincode::deserialize_from(&mut lump)
            .chain_err(ErrorKind::missing_number_of_patches)?;
        match wad.named_lump(name)? {
            Some(patch_lump) => {
                let image = Image::from_buffer(patch_lump.bytes()).chain_err(|| {
                    ErrorKind::CorruptWad(format!("Cannot decode patch `{}`", name))
                })?;
                patches.push((name, Some(image)));
            }
            None => {
                missing_patches += 1;
                patches.push((name, None));
            }
        }
    }
    info!(
        "Done in {:.2}ms; {} missing patches.",
        start_time.elapsed().as_secs_f64() * 1000.0,
        missing_patches
    );
    Ok(patches)
}

fn read_textures(
    lump_buffer: &[u8],
    patches: &[(WadName, Option<Image>)],
    textures: &mut WallTextureSet,
) -> Result<()> {
    let mut lump = lump_buffer;
    let num_textures = lump
        .read_u32::<LittleEndian>()
        .chain_err(ErrorKind::missing_number_of_textures)? as usize;

    let offsets_end = num_textures * mem::size_of::<u32>();
    ensure!(
        offsets_end <= lump.len(),
        ErrorKind::textures_lump_too_small(lump.len(), offsets_end)
    );
    let mut offsets = &lump[..offsets_end];

    for i_texture in 0..num_textures {
        let offset = offsets
            .read_u32::<LittleEndian>()
            .chain_err(ErrorKind::missing_number_of_textures)? as usize;
        ensure!(
            offset < lump_buffer.len(),
            ErrorKind::textures_lump_too_small(lump_buffer.len(), offset)
        );

        lump = &lump_buffer[offset..];
        let header: WadTextureHeader = bincode::deserialize_from(&mut lump)
            .chain_err(|| ErrorKind::bad_texture_header(i_texture))?;
        if header.width == 0 || header.height == 0 {
            warn!(
                "Texture {} has an empty {}x{} header, skipping.",
                header.name, header.width, header.height
            );
            continue;
        }
        let mut canvas = Canvas::new(usize::from(header.width), usize::from(header.height))?;

        for i_patch in 0..usize::from(header.num_patches) {
            let pref: WadTexturePatchRef = bincode::deserialize_from(&mut lump)
                .chain_err(|| ErrorKind::bad_patch_ref(i_patch, &header.name.to_lossy_string()))?;
            // Vanilla ignores negative vertical patch offsets.
            let offset = (
                isize::from(pref.origin_x),
                isize::from(pref.origin_y.max(0)),
            );
            match patches.get(usize::from(pref.patch)) {
                Some((_, Some(patch))) => canvas.blit(patch, offset),
                Some((patch_name, None)) => {
                    error!(
                        "PatchRef {}, required by {} is missing.",
                        patch_name, header.name
                    );
                }
                None => {
                    error!(
                        "PatchRef index {} out of bounds ({}) in {}, skipping.",
                        pref.patch,
                        patches.len(),
                        header.name
                    );
                }
            }
        }

        textures.insert(WallTexture {
            name: header.name,
            width: canvas.width(),
            height: canvas.height(),
            pixels: canvas.into_pixels(),
        });
    }
    Ok(())
}
