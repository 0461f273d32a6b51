//! The in-memory image produced by decoding and consumed by encoding.

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::error::BitmapError;
use crate::format::ResourceFormat;

/// A pixel buffer tagged with its [`ResourceFormat`].
///
/// Rows (block rows for compressed formats) are `row_pitch` bytes apart with
/// no padding beyond what the format itself requires. The size is fixed at
/// construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    row_pitch: u32,
    format: ResourceFormat,
    data: Box<[u8]>,
}

/// Row pitch and total byte size of a `width` x `height` image of `format`.
fn layout(width: u32, height: u32, format: ResourceFormat) -> Result<(u32, usize), BitmapError> {
    let block_height = format.block_height();
    if height % block_height != 0 {
        return Err(BitmapError::MisalignedHeight {
            height,
            block_height,
        });
    }

    let too_large = BitmapError::DimensionsTooLarge { width, height };
    let row_pitch = width
        .div_ceil(format.block_width())
        .checked_mul(format.bytes_per_block())
        .ok_or(too_large)?;
    let size = (row_pitch as usize)
        .checked_mul((height / block_height) as usize)
        .ok_or(BitmapError::DimensionsTooLarge { width, height })?;
    Ok((row_pitch, size))
}

impl Bitmap {
    /// Allocate a zero-filled bitmap.
    ///
    /// Compressed formats require `height` to be a multiple of the block
    /// height.
    pub fn new(width: u32, height: u32, format: ResourceFormat) -> Result<Self, BitmapError> {
        let (row_pitch, size) = layout(width, height, format)?;
        Ok(Self {
            width,
            height,
            row_pitch,
            format,
            data: vec![0; size].into_boxed_slice(),
        })
    }

    /// Create a bitmap holding a copy of the first [`Bitmap::size`] bytes of
    /// `data`.
    pub fn from_data(
        width: u32,
        height: u32,
        format: ResourceFormat,
        data: &[u8],
    ) -> Result<Self, BitmapError> {
        let (row_pitch, size) = layout(width, height, format)?;
        let src = data.get(..size).ok_or(BitmapError::BufferTooSmall {
            needed: size,
            actual: data.len(),
        })?;
        Ok(Self {
            width,
            height,
            row_pitch,
            format,
            data: src.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, or per row of blocks for compressed formats.
    pub fn row_pitch(&self) -> u32 {
        self.row_pitch
    }

    pub fn format(&self) -> ResourceFormat {
        self.format
    }

    /// Total size of the pixel data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Number of rows, counting a row of compression blocks as one.
    pub fn row_count(&self) -> u32 {
        self.height / self.format.block_height()
    }

    /// Row `y` (block row for compressed formats), or `None` past the end.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let pitch = self.row_pitch as usize;
        let start = (y as usize).checked_mul(pitch)?;
        self.data.get(start..start.checked_add(pitch)?)
    }

    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        let pitch = self.row_pitch as usize;
        let start = (y as usize).checked_mul(pitch)?;
        self.data.get_mut(start..start.checked_add(pitch)?)
    }

    /// Reinterpret pixel data as a typed pixel slice.
    ///
    /// Returns [`BitmapError::LayoutMismatch`] if the format doesn't store
    /// `P` pixels.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: BitmapPixel>(&self) -> Result<&[P], BitmapError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if !P::matches(self.format) {
            return Err(BitmapError::LayoutMismatch(self.format));
        }
        Ok(self.data().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: BitmapPixel>(&self) -> Result<imgref::ImgRef<'_, P>, BitmapError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Copy into an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: BitmapPixel>(&self) -> Result<imgref::ImgVec<P>, BitmapError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// Pixel types a [`Bitmap`] can be viewed as.
#[cfg(feature = "rgb")]
pub trait BitmapPixel: Copy + 'static {
    /// Whether bitmaps of `format` store pixels of this type.
    fn matches(format: ResourceFormat) -> bool;
}

#[cfg(feature = "rgb")]
impl BitmapPixel for rgb::RGBA8 {
    fn matches(format: ResourceFormat) -> bool {
        matches!(
            format,
            ResourceFormat::Rgba8Unorm | ResourceFormat::Rgba8UnormSrgb | ResourceFormat::Rgba8Uint
        )
    }
}

/// BGRX formats match too; their fourth byte is opaque padding.
#[cfg(feature = "rgb")]
impl BitmapPixel for rgb::alt::BGRA8 {
    fn matches(format: ResourceFormat) -> bool {
        matches!(
            format,
            ResourceFormat::Bgra8Unorm
                | ResourceFormat::Bgra8UnormSrgb
                | ResourceFormat::Bgrx8Unorm
                | ResourceFormat::Bgrx8UnormSrgb
        )
    }
}
