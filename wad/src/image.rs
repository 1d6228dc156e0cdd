use super::errors::{ErrorKind, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use failchain::{bail, ensure, ResultExt};

pub const MAX_IMAGE_SIZE: usize = 4096;

/// Palette index used for pixels no patch covers in a composed wall texture.
pub const TRANSPARENT_PIXEL: u8 = 0xff;

/// A decoded patch. Pixels are palette indices; transparent pixels have the high bit set.
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u16>,
}

impl Image {
    #[cfg_attr(feature = "cargo-clippy", allow(needless_range_loop))]
    pub fn from_buffer(buffer: &[u8]) -> Result<Image> {
        let mut reader = buffer;
        let width = reader
            .read_u16::<LittleEndian>()
            .chain_err(|| ErrorKind::image("missing width"))? as usize;
        let height = reader
            .read_u16::<LittleEndian>()
            .chain_err(|| ErrorKind::image("missing height"))? as usize;
        ensure!(
            width <= MAX_IMAGE_SIZE && height <= MAX_IMAGE_SIZE,
            ErrorKind::image_too_large(width, height)
        );

        // Sprite offsets; texture composition places patches by their patch refs instead.
        reader
            .read_i16::<LittleEndian>()
            .chain_err(|| ErrorKind::image("missing x offset"))?;
        reader
            .read_i16::<LittleEndian>()
            .chain_err(|| ErrorKind::image("missing y offset"))?;

        let mut pixels = vec![!0; width * height];

        // Process each column of the image.
        for i_column in 0..width {
            // Each column is defined as a number of vertical `runs' which are
            // defined starting at `offset' in the buffer.
            let offset = reader.read_u32::<LittleEndian>().chain_err(|| {
                ErrorKind::image(format!(
                    "unfinished column {}, {}x{}",
                    i_column, width, height
                ))
            })? as usize;
            ensure!(
                offset < buffer.len(),
                ErrorKind::image(format!(
                    "invalid column offset in {}, offset={}, size={}",
                    i_column,
                    offset,
                    buffer.len()
                ))
            );
            let mut source = buffer[offset..].iter();
            let mut i_run = 0;
            loop {
                // The first byte contains the vertical coordinate of the run's
                // start.
                let row_start = match source.next() {
                    Some(&byte) => usize::from(byte),
                    None => bail!(ErrorKind::image(format!(
                        "unfinished column {}, run {}",
                        i_column, i_run
                    ))),
                };

                // The special value of 255 means this is the last run in the
                // column, so move on to the next one.
                if row_start == 255 {
                    break;
                }

                // The second byte is the length of this run.
                let run_length = match source.next() {
                    Some(&byte) => usize::from(byte),
                    None => bail!(ErrorKind::image(format!(
                        "missing run length: column {}, run {}",
                        i_column, i_run
                    ))),
                };

                // Check that the run fits in the image.
                ensure!(
                    row_start + run_length <= height,
                    ErrorKind::image(format!(
                        "run too big: column {}, run {} ({} +{}), size {}x{}",
                        i_column, i_run, row_start, run_length, width, height
                    ))
                );

                // An ignored padding byte.
                ensure!(
                    source.next().is_some(),
                    ErrorKind::image(format!(
                        "missing padding byte 1: column {}, run {}",
                        i_column, i_run
                    ))
                );

                // Copy the bytes from source to destination, but first check there's enough of
                // those left.
                let run = source.as_slice();
                ensure!(
                    run.len() >= run_length,
                    ErrorKind::image(format!(
                        "source underrun: column {}, run {} ({}, +{}), bytes left {}",
                        i_column,
                        i_run,
                        row_start,
                        run_length,
                        run.len()
                    ))
                );
                let destination = pixels[row_start * width + i_column..]
                    .iter_mut()
                    .step_by(width)
                    .take(run_length);
                for (dest_pixel, &source_pixel) in destination.zip(&run[..run_length]) {
                    *dest_pixel = u16::from(source_pixel);
                }
                source = run[run_length..].iter();

                // And another ignored byte after the run.
                ensure!(
                    source.next().is_some(),
                    ErrorKind::image(format!(
                        "missing padding byte 2: column {}, run {}",
                        i_column, i_run
                    ))
                );
                i_run += 1;
            }
        }

        Ok(Image {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn is_opaque_at(&self, x: usize, y: usize) -> bool {
        self.pixels[x + y * self.width] & 0xff00 == 0
    }
}

/// A palette-indexed canvas patches are composed onto.
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A canvas where every pixel starts out as `TRANSPARENT_PIXEL`.
    pub fn new(width: usize, height: usize) -> Result<Canvas> {
        ensure!(
            width <= MAX_IMAGE_SIZE && height <= MAX_IMAGE_SIZE,
            ErrorKind::image_too_large(width, height)
        );
        Ok(Canvas {
            width,
            height,
            pixels: vec![TRANSPARENT_PIXEL; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Copies the opaque pixels of `source` with its top-left corner at `offset`, clipped to the
    /// canvas.
    pub fn blit(&mut self, source: &Image, offset: (isize, isize)) {
        // Figure out the region in source which is not out of bounds when
        // copied into self.
        let x_start = (-offset.0).max(0) as usize;
        let y_start = (-offset.1).max(0) as usize;
        let x_end = (self.width as isize - offset.0).min(source.width as isize);
        let y_end = (self.height as isize - offset.1).min(source.height as isize);
        if x_end <= x_start as isize || y_end <= y_start as isize {
            return;
        }
        let (x_end, y_end) = (x_end as usize, y_end as usize);

        for y in y_start..y_end {
            let src_row = &source.pixels[y * source.width..][x_start..x_end];
            let dest_y = (y as isize + offset.1) as usize;
            let dest_x = (x_start as isize + offset.0) as usize;
            let dest_row = &mut self.pixels[dest_y * self.width + dest_x..][..x_end - x_start];
            for (dest_pixel, &source_pixel) in dest_row.iter_mut().zip(src_row) {
                if source_pixel & 0xff00 == 0 {
                    *dest_pixel = source_pixel as u8;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::{Canvas, Image, TRANSPARENT_PIXEL};

    /// Encodes a patch with one run per column covering rows `[top, top + len)`.
    pub(crate) fn encode_patch(width: usize, height: usize, columns: &[(u8, Vec<u8>)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(width as u16).to_le_bytes());
        bytes.extend_from_slice(&(height as u16).to_le_bytes());
        bytes.extend_from_slice(&0i16.to_le_bytes());
        bytes.extend_from_slice(&0i16.to_le_bytes());
        let mut column_data = Vec::new();
        let mut offsets = Vec::new();
        let header_len = 8 + 4 * width;
        for (top, run) in columns {
            offsets.push((header_len + column_data.len()) as u32);
            if !run.is_empty() {
                column_data.push(*top);
                column_data.push(run.len() as u8);
                column_data.push(0);
                column_data.extend_from_slice(run);
                column_data.push(0);
            }
            column_data.push(255);
        }
        for offset in offsets {
            bytes.extend_from_slice(&offset.to_le_bytes());
        }
        bytes.extend_from_slice(&column_data);
        bytes
    }

    fn solid_patch(size: usize, base: u8) -> Vec<u8> {
        let columns = (0..size)
            .map(|x| (0u8, (0..size).map(|y| base + (x * size + y) as u8).collect()))
            .collect::<Vec<_>>();
        encode_patch(size, size, &columns)
    }

    #[test]
    fn decodes_runs_column_major() {
        let bytes = encode_patch(2, 4, &[(1, vec![10, 11]), (0, vec![])]);
        let image = Image::from_buffer(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (2, 4));
        assert!(!image.is_opaque_at(0, 0));
        assert_eq!(image.pixels()[2], 10);
        assert_eq!(image.pixels()[4], 11);
        assert!(!image.is_opaque_at(0, 3));
        assert!((0..4).all(|y| !image.is_opaque_at(1, y)));
    }

    #[test]
    fn run_past_end_of_record_is_an_error() {
        let mut bytes = encode_patch(1, 8, &[(0, vec![1, 2, 3, 4])]);
        // Claim a longer run than is stored.
        let run_length_at = 8 + 4 + 1;
        bytes[run_length_at] = 8;
        bytes.truncate(bytes.len() - 2);
        assert!(Image::from_buffer(&bytes).is_err());
    }

    #[test]
    fn missing_terminator_is_an_error() {
        let mut bytes = encode_patch(1, 4, &[(0, vec![1])]);
        bytes.pop();
        assert!(Image::from_buffer(&bytes).is_err());
    }

    #[test]
    fn blit_8x8_onto_16x16() {
        let patch = Image::from_buffer(&solid_patch(8, 0)).unwrap();
        let mut canvas = Canvas::new(16, 16).unwrap();
        canvas.blit(&patch, (0, 0));
        for y in 0..16 {
            for x in 0..16 {
                let pixel = canvas.pixels()[x + y * 16];
                if x < 8 && y < 8 {
                    assert_eq!(pixel, (x * 8 + y) as u8, "inside at {},{}", x, y);
                } else {
                    assert_eq!(pixel, TRANSPARENT_PIXEL, "outside at {},{}", x, y);
                }
            }
        }
    }

    #[test]
    fn blit_clips_and_keeps_transparency() {
        let patch = Image::from_buffer(&encode_patch(2, 2, &[(0, vec![5]), (1, vec![6])])).unwrap();
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.blit(&Image::from_buffer(&solid_patch(2, 100)).unwrap(), (0, 0));
        canvas.blit(&patch, (1, -1));
        // Only column 1 of the patch, row 1, lands on canvas (1, 0).
        assert_eq!(canvas.pixels(), &[100, 6, 101, 103]);
        canvas.blit(&patch, (5, 5));
        assert_eq!(canvas.pixels(), &[100, 6, 101, 103]);
    }
}
