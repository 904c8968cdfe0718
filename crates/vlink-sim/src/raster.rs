//! RGB raster transcoding
//!
//! A [`Raster`] is the payload of the link: `width × height` pixels packed as
//! `0xRRGGBB`. It converts to a flat bitstream of 24 bits per pixel, MSB
//! first, row-major, and back again. BMP files are read and written through
//! the `image` crate.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use vlink_core::{BitStream, Bits, BITS_PER_PIXEL};

use crate::error::{SimError, SimResult};

/// Row-major RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Raster {
    /// Build a raster from `0xRRGGBB` pixels. Bits above 24 are dropped.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> SimResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(SimError::BitCount {
                found: pixels.len() * BITS_PER_PIXEL,
                expected: expected * BITS_PER_PIXEL,
                width,
                height,
            });
        }
        let pixels = pixels.into_iter().map(|p| p & 0x00FF_FFFF).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Raster of a single colour.
    pub fn filled(width: u32, height: u32, rgb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb & 0x00FF_FFFF; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(Self::offset(self.width, x, y)).copied()
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: u32) {
        if x < self.width && y < self.height {
            let i = Self::offset(self.width, x, y);
            self.pixels[i] = rgb & 0x00FF_FFFF;
        }
    }

    /// Row-major index, widened before multiplying.
    fn offset(width: u32, x: u32, y: u32) -> usize {
        y as usize * width as usize + x as usize
    }

    /// Number of payload bits this raster transcodes to.
    pub fn bit_len(&self) -> usize {
        self.pixels.len() * BITS_PER_PIXEL
    }

    /// Flatten to 24 bits per pixel, MSB first, row-major.
    pub fn to_bits(&self) -> BitStream {
        let mut bits = BitStream::with_capacity(self.bit_len());
        for &rgb in &self.pixels {
            for i in (0..BITS_PER_PIXEL).rev() {
                bits.push((rgb >> i) & 1 == 1);
            }
        }
        bits
    }

    /// Reassemble a raster from the output of [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: &Bits, width: u32, height: u32) -> SimResult<Self> {
        let expected = width as usize * height as usize * BITS_PER_PIXEL;
        if bits.len() != expected {
            return Err(SimError::BitCount {
                found: bits.len(),
                expected,
                width,
                height,
            });
        }

        let pixels = bits
            .chunks(BITS_PER_PIXEL)
            .map(|chunk| {
                chunk
                    .iter()
                    .by_vals()
                    .fold(0u32, |acc, bit| (acc << 1) | bit as u32)
            })
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_image(image: &RgbImage) -> Self {
        let pixels = image
            .pixels()
            .map(|Rgb([r, g, b])| (*r as u32) << 16 | (*g as u32) << 8 | *b as u32)
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            pixels,
        }
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let rgb = self.pixels[Self::offset(self.width, x, y)];
            Rgb([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
        })
    }

    /// Read a BMP file. Alpha, if any, is discarded.
    pub fn load_bmp(path: &Path) -> SimResult<Self> {
        let image = image::open(path)?.to_rgb8();
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Loaded image"
        );
        Ok(Self::from_image(&image))
    }

    /// Write a 24-bit BMP file.
    pub fn save_bmp(&self, path: &Path) -> SimResult<()> {
        self.to_image().save_with_format(path, ImageFormat::Bmp)?;
        tracing::debug!(path = %path.display(), "Saved image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Raster {
        let pixels = (0..width * height)
            .map(|i| (i * 0x010203) & 0x00FF_FFFF)
            .collect();
        Raster::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_bits_msb_first() {
        let raster = Raster::new(2, 1, vec![0x800001, 0x00FF00]).unwrap();
        let bits = raster.to_bits();
        assert_eq!(bits.len(), 48);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[23]);
        assert_eq!(bits[24..].iter().by_vals().filter(|&b| b).count(), 8);
        assert!(bits[32] && bits[39] && !bits[40]);
    }

    #[test]
    fn test_bits_round_trip() {
        let raster = gradient(5, 3);
        let rebuilt = Raster::from_bits(&raster.to_bits(), 5, 3).unwrap();
        assert_eq!(rebuilt, raster);
    }

    #[test]
    fn test_from_bits_wrong_length() {
        let bits = gradient(2, 2).to_bits();
        let err = Raster::from_bits(&bits[..90], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            SimError::BitCount {
                found: 90,
                expected: 96,
                ..
            }
        ));
    }

    #[test]
    fn test_new_checks_dimensions() {
        assert!(Raster::new(3, 3, vec![0; 8]).is_err());
        assert_eq!(
            Raster::new(1, 1, vec![0xFF12_3456]).unwrap().pixels(),
            &[0x12_3456]
        );
    }

    #[test]
    fn test_pixel_access() {
        let mut raster = Raster::filled(4, 2, 0x112233);
        raster.set_pixel(3, 1, 0xABCDEF);
        assert_eq!(raster.pixel(3, 1), Some(0xABCDEF));
        assert_eq!(raster.pixel(0, 0), Some(0x112233));
        assert_eq!(raster.pixel(4, 0), None);
        assert_eq!(raster.pixels()[7], 0xABCDEF);
    }

    #[test]
    fn test_offset_large_raster() {
        // 70 000 x 70 000 pixels overflows u32 indexing
        assert_eq!(
            Raster::offset(70_000, 5, 69_999),
            69_999usize * 70_000 + 5
        );
        assert_eq!(Raster::offset(4, 3, 1), 7);
    }

    #[test]
    fn test_bmp_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.bmp");

        let raster = gradient(7, 5);
        raster.save_bmp(&path).unwrap();
        let loaded = Raster::load_bmp(&path).unwrap();
        assert_eq!(loaded, raster);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Raster::load_bmp(&dir.path().join("missing.bmp")).is_err());
    }
}
