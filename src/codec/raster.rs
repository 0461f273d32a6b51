//! Codec-side image storage.

use super::utils::expand_bits_to_byte;
use crate::error::CodecError;

/// Sample layout of a [`CodecImage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// 1–32 bpp with 8-bit (or packed index) samples. 24/32 bpp are B,G,R(,A).
    Bitmap,
    /// One 16-bit unsigned channel.
    Uint16,
    /// R,G,B as 16-bit unsigned.
    Rgb16,
    /// R,G,B,A as 16-bit unsigned.
    Rgba16,
    /// R,G,B as 32-bit float.
    RgbF,
    /// R,G,B,A as 32-bit float.
    RgbaF,
}

/// How the samples of a [`CodecImage`] should be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    MinIsBlack,
    Rgb,
    RgbAlpha,
    /// Samples are indices into [`CodecImage::palette`].
    Palette,
}

/// An image as exchanged with an [`crate::ImageCodec`].
///
/// Scanlines are stored bottom-up: scanline 0 is the bottom row of the
/// picture. Each scanline starts on a 4-byte boundary, so `pitch` may exceed
/// the bytes actually used by a row. Multi-byte samples are native endian.
#[derive(Clone, Debug)]
pub struct CodecImage {
    width: u32,
    height: u32,
    bpp: u32,
    pitch: usize,
    image_type: ImageType,
    color_type: ColorType,
    /// B,G,R,A entries.
    palette: Vec<[u8; 4]>,
    bits: Vec<u8>,
}

impl CodecImage {
    /// Allocate a zeroed image.
    pub fn allocate(
        image_type: ImageType,
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<Self, CodecError> {
        let valid = match image_type {
            ImageType::Bitmap => matches!(bpp, 1 | 2 | 4 | 8 | 16 | 24 | 32),
            ImageType::Uint16 => bpp == 16,
            ImageType::Rgb16 => bpp == 48,
            ImageType::Rgba16 => bpp == 64,
            ImageType::RgbF => bpp == 96,
            ImageType::RgbaF => bpp == 128,
        };
        if !valid {
            return Err(CodecError::UnsupportedLayout {
                kind: image_type,
                bpp,
                format: "an allocated image",
            });
        }

        let too_large = || CodecError::Allocation { width, height, bpp };
        let pitch = (width as usize)
            .checked_mul(bpp as usize)
            .map(|bits| bits.div_ceil(32) * 4)
            .ok_or_else(too_large)?;
        let size = pitch.checked_mul(height as usize).ok_or_else(too_large)?;

        let color_type = match (image_type, bpp) {
            (ImageType::Bitmap, 24) | (ImageType::Rgb16 | ImageType::RgbF, _) => ColorType::Rgb,
            (ImageType::Bitmap, 32) | (ImageType::Rgba16 | ImageType::RgbaF, _) => {
                ColorType::RgbAlpha
            }
            _ => ColorType::MinIsBlack,
        };

        Ok(Self {
            width,
            height,
            bpp,
            pitch,
            image_type,
            color_type,
            palette: Vec::new(),
            bits: vec![0; size],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per pixel.
    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    /// Bytes between the starts of consecutive scanlines.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    pub fn palette(&self) -> &[[u8; 4]] {
        &self.palette
    }

    /// Attach a B,G,R,A palette and mark the samples as indices.
    pub fn set_palette(&mut self, palette: Vec<[u8; 4]>) {
        self.palette = palette;
        self.color_type = ColorType::Palette;
    }

    pub fn set_color_type(&mut self, color_type: ColorType) {
        self.color_type = color_type;
    }

    /// The whole backing buffer, `pitch * height` bytes.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Bytes of pixel data in one scanline, excluding alignment padding.
    pub fn line_bytes(&self) -> usize {
        (self.width as usize * self.bpp as usize).div_ceil(8)
    }

    /// Scanline `y`, counted from the bottom row.
    pub fn scanline(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        &self.bits[start..start + self.line_bytes()]
    }

    pub fn scanline_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.pitch;
        let len = self.line_bytes();
        &mut self.bits[start..start + len]
    }

    /// Expand to 32 bpp B,G,R,A. Palette, grayscale, 24 and 32 bpp inputs are
    /// accepted; missing alpha becomes 0xFF.
    pub fn convert_to_32bits(&self) -> Result<CodecImage, CodecError> {
        if self.image_type != ImageType::Bitmap {
            return Err(self.unsupported("32-bit BGRA"));
        }
        let mut out = CodecImage::allocate(ImageType::Bitmap, self.width, self.height, 32)?;

        match (self.bpp, self.color_type) {
            (1 | 2 | 4 | 8, ColorType::Palette) => {
                let mut indices = vec![0u8; self.width as usize];
                for y in 0..self.height {
                    expand_bits_to_byte(self.bpp as usize, true, self.scanline(y), &mut indices);
                    for (dst, &i) in out.scanline_mut(y).chunks_exact_mut(4).zip(&indices) {
                        let entry = self.palette.get(i as usize).ok_or_else(|| {
                            CodecError::Decode(format!("palette index {i} out of range"))
                        })?;
                        dst.copy_from_slice(entry);
                    }
                }
            }
            (1 | 2 | 4 | 8, _) => {
                let mut gray = vec![0u8; self.width as usize];
                for y in 0..self.height {
                    expand_bits_to_byte(self.bpp as usize, false, self.scanline(y), &mut gray);
                    for (dst, &g) in out.scanline_mut(y).chunks_exact_mut(4).zip(&gray) {
                        dst.copy_from_slice(&[g, g, g, 0xFF]);
                    }
                }
            }
            (24, _) => {
                for y in 0..self.height {
                    for (dst, src) in out
                        .scanline_mut(y)
                        .chunks_exact_mut(4)
                        .zip(self.scanline(y).chunks_exact(3))
                    {
                        dst.copy_from_slice(&[src[0], src[1], src[2], 0xFF]);
                    }
                }
            }
            (32, _) => {
                for y in 0..self.height {
                    out.scanline_mut(y).copy_from_slice(self.scanline(y));
                }
            }
            _ => return Err(self.unsupported("32-bit BGRA")),
        }
        Ok(out)
    }

    /// Flatten to 24 bpp B,G,R, discarding alpha.
    pub fn convert_to_24bits(&self) -> Result<CodecImage, CodecError> {
        if self.image_type != ImageType::Bitmap {
            return Err(self.unsupported("24-bit BGR"));
        }
        let expanded;
        let src = if self.bpp == 32 {
            self
        } else {
            expanded = self.convert_to_32bits()?;
            &expanded
        };

        let mut out = CodecImage::allocate(ImageType::Bitmap, self.width, self.height, 24)?;
        for y in 0..self.height {
            for (dst, px) in out
                .scanline_mut(y)
                .chunks_exact_mut(3)
                .zip(src.scanline(y).chunks_exact(4))
            {
                dst.copy_from_slice(&px[..3]);
            }
        }
        Ok(out)
    }

    /// Promote 48 bpp RGB16 to 64 bpp RGBA16 with an opaque alpha.
    pub fn convert_to_rgba16(&self) -> Result<CodecImage, CodecError> {
        match self.image_type {
            ImageType::Rgba16 => Ok(self.clone()),
            ImageType::Rgb16 => {
                let mut out =
                    CodecImage::allocate(ImageType::Rgba16, self.width, self.height, 64)?;
                let opaque = u16::MAX.to_ne_bytes();
                for y in 0..self.height {
                    for (dst, src) in out
                        .scanline_mut(y)
                        .chunks_exact_mut(8)
                        .zip(self.scanline(y).chunks_exact(6))
                    {
                        dst[..6].copy_from_slice(src);
                        dst[6..].copy_from_slice(&opaque);
                    }
                }
                Ok(out)
            }
            _ => Err(self.unsupported("RGBA16")),
        }
    }

    fn unsupported(&self, format: &'static str) -> CodecError {
        CodecError::UnsupportedLayout {
            kind: self.image_type,
            bpp: self.bpp,
            format,
        }
    }
}
