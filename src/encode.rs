//! Raw pixel buffer to file encoding.

use std::fmt;
use std::path::Path;

use crate::bitmap::Bitmap;
use crate::codec::{
    CodecFormat, CodecImage, EncodeOptions, ExrCompression, ImageCodec, ImageType, PngCompression,
    StandardCodec,
};
use crate::convert::{convert_to_rgba32_float, f32_to_bytes, rgba32f_row_to_rgb32f};
use crate::error::BitmapError;
use crate::flags::ExportFlags;
use crate::format::{FileFormat, ResourceFormat};

static STANDARD_CODEC: StandardCodec = StandardCodec;

/// JPEG quality used unless lossy output was asked for.
const JPEG_QUALITY_SUPERB: u8 = 100;
const JPEG_QUALITY_DEFAULT: u8 = 75;

/// A requested export option the target container ignores. The file is still
/// written.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportWarning {
    LossyNotSupported(FileFormat),
    AlphaNotSupported(FileFormat),
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LossyNotSupported(format) => write!(
                f,
                "{} format does not support lossy compression mode.",
                format.name()
            ),
            Self::AlphaNotSupported(format) => {
                write!(f, "{} format does not support alpha channel.", format.name())
            }
        }
    }
}

/// Builder for writing a pixel buffer to an image file.
///
/// ```no_run
/// use bitmap_io::{EncodeRequest, ExportFlags, FileFormat, ResourceFormat};
///
/// let pixels = vec![0u8; 64 * 64 * 16];
/// let warnings = EncodeRequest::new(FileFormat::Exr)
///     .flags(ExportFlags::UNCOMPRESSED)
///     .encode("out.exr", 64, 64, ResourceFormat::Rgba32Float, &pixels)?;
/// assert!(warnings.is_empty());
/// # Ok::<(), bitmap_io::BitmapError>(())
/// ```
#[derive(Clone, Copy)]
pub struct EncodeRequest<'a> {
    file_format: FileFormat,
    flags: ExportFlags,
    top_down: bool,
    codec: &'a dyn ImageCodec,
}

impl<'a> EncodeRequest<'a> {
    /// Target `file_format` with no flags, top-down input and the standard
    /// codec.
    pub fn new(file_format: FileFormat) -> Self {
        Self {
            file_format,
            flags: ExportFlags::empty(),
            top_down: true,
            codec: &STANDARD_CODEC,
        }
    }

    pub fn flags(mut self, flags: ExportFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether the first row of the input is the top of the image. Only
    /// 8-bit containers honor this; PFM and EXR input is always top-down.
    pub fn top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }

    pub fn with_codec(mut self, codec: &'a dyn ImageCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Write `data`, a `width` x `height` image of `format`, to `path`.
    ///
    /// Invalid flag combinations and unsupported formats fail before any
    /// file is created. Options the container ignores are returned as
    /// warnings and logged.
    pub fn encode(
        &self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        format: ResourceFormat,
        data: &[u8],
    ) -> Result<Vec<ExportWarning>, BitmapError> {
        let path = path.as_ref();
        let data = self.validate(width, height, format, data)?;

        // The caller's buffer stays untouched; swizzles go into a copy.
        let swizzled;
        let data = if format.is_rgba8_family() {
            swizzled = self.rgba_to_bgra(data);
            &swizzled[..]
        } else {
            data
        };

        let (image, options, warnings) = if self.file_format.is_hdr() {
            let (image, options) = self.prepare_hdr(width, height, format, data)?;
            (image, options, Vec::new())
        } else {
            self.prepare_ldr(width, height, format, data)?
        };

        if !warnings.is_empty() {
            let joined: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            log::warn!("saving '{}': {}", path.display(), joined.join(" "));
        }

        self.codec
            .encode(CodecFormat::from(self.file_format), &image, &options, path)?;
        Ok(warnings)
    }

    /// Reject bad input before doing any work. Returns the part of `data`
    /// that holds the image.
    fn validate<'d>(
        &self,
        width: u32,
        height: u32,
        format: ResourceFormat,
        data: &'d [u8],
    ) -> Result<&'d [u8], BitmapError> {
        if data.is_empty() || width == 0 || height == 0 {
            return Err(BitmapError::EmptyData);
        }
        let needed = (width.div_ceil(format.block_width()) as usize)
            .checked_mul(format.bytes_per_block() as usize)
            .and_then(|pitch| pitch.checked_mul(height.div_ceil(format.block_height()) as usize))
            .ok_or(BitmapError::DimensionsTooLarge { width, height })?;
        let data = data.get(..needed).ok_or(BitmapError::BufferTooSmall {
            needed,
            actual: data.len(),
        })?;

        if self.file_format == FileFormat::Dds {
            return Err(BitmapError::DdsNotSupported);
        }
        if self.flags.contains(ExportFlags::UNCOMPRESSED | ExportFlags::LOSSY) {
            return Err(BitmapError::IncompatibleFlags(
                "lossy cannot be combined with uncompressed",
            ));
        }
        if self.flags.contains(ExportFlags::EXR_FLOAT16)
            && (!self.flags.contains(ExportFlags::UNCOMPRESSED)
                || self.file_format != FileFormat::Exr)
        {
            return Err(BitmapError::IncompatibleFlags(
                "EXR float16 can only be set for uncompressed EXR files",
            ));
        }
        Ok(data)
    }

    /// RGBA8 to BGRA8, with opaque alpha unless alpha is exported.
    fn rgba_to_bgra(&self, data: &[u8]) -> Vec<u8> {
        let keep_alpha = self.flags.contains(ExportFlags::EXPORT_ALPHA);
        let mut out = data.to_vec();
        for px in out.chunks_exact_mut(4) {
            px.swap(0, 2);
            if !keep_alpha {
                px[3] = 0xFF;
            }
        }
        out
    }

    fn prepare_hdr(
        &self,
        width: u32,
        height: u32,
        format: ResourceFormat,
        data: &[u8],
    ) -> Result<(CodecImage, EncodeOptions), BitmapError> {
        let converted;
        let (data, bytes_per_pixel) = if format.is_convertible_to_rgba32_float() {
            converted = f32_to_bytes(&convert_to_rgba32_float(format, width, height, data));
            (&converted[..], 16)
        } else if format.is_rgb_float32() {
            (data, format.bytes_per_block() as usize)
        } else {
            return Err(BitmapError::UnsupportedFormat(format!(
                "{format:?}: only 32-bit/channel RGB/RGBA, half float or wide integer images \
                 can be saved as PFM/EXR"
            )));
        };

        let export_alpha = self.flags.contains(ExportFlags::EXPORT_ALPHA);
        if self.file_format == FileFormat::Pfm {
            if self.flags.contains(ExportFlags::LOSSY) {
                return Err(BitmapError::IncompatibleFlags(
                    "PFM does not support lossy compression mode",
                ));
            }
            if export_alpha {
                return Err(BitmapError::IncompatibleFlags(
                    "PFM does not support alpha channel",
                ));
            }
        }
        if export_alpha && bytes_per_pixel != 16 {
            return Err(BitmapError::UnsupportedFormat(format!(
                "{format:?} has no alpha channel to export"
            )));
        }

        let (image_type, bpp) = if export_alpha {
            (ImageType::RgbaF, 128)
        } else {
            (ImageType::RgbF, 96)
        };
        let mut image = self.codec.allocate(image_type, width, height, bpp)?;
        let row_bytes = bytes_per_pixel * width as usize;
        let straight_copy = bytes_per_pixel == bpp as usize / 8;
        for (y, row) in data.chunks_exact(row_bytes).take(height as usize).enumerate() {
            // bottom-up storage: the first data row is the top scanline
            let dst = image.scanline_mut(height - 1 - y as u32);
            if straight_copy {
                dst.copy_from_slice(row);
            } else {
                rgba32f_row_to_rgb32f(row, dst);
            }
        }

        let options = match self.file_format {
            FileFormat::Exr => {
                let (compression, half) = if self.flags.contains(ExportFlags::UNCOMPRESSED) {
                    (
                        ExrCompression::None,
                        self.flags.contains(ExportFlags::EXR_FLOAT16),
                    )
                } else if self.flags.contains(ExportFlags::LOSSY) {
                    (ExrCompression::B44, true)
                } else {
                    (ExrCompression::Piz, true)
                };
                EncodeOptions::Exr { compression, half }
            }
            _ => EncodeOptions::Default,
        };
        Ok((image, options))
    }

    fn prepare_ldr(
        &self,
        width: u32,
        height: u32,
        format: ResourceFormat,
        data: &[u8],
    ) -> Result<(CodecImage, EncodeOptions, Vec<ExportWarning>), BitmapError> {
        let bytes_per_pixel = format.bytes_per_block();
        if format.is_compressed()
            || format.channel_bits() != 8
            || !matches!(bytes_per_pixel, 1 | 4)
        {
            return Err(BitmapError::UnsupportedFormat(format!(
                "{format:?} cannot be saved as {}; use an 8-bit single or four channel format",
                self.file_format.name()
            )));
        }
        let padded_alpha = matches!(
            format,
            ResourceFormat::Bgrx8Unorm | ResourceFormat::Bgrx8UnormSrgb
        );

        let mut image = self
            .codec
            .allocate(ImageType::Bitmap, width, height, bytes_per_pixel * 8)?;
        let row_bytes = (bytes_per_pixel * width) as usize;
        for (y, row) in data.chunks_exact(row_bytes).take(height as usize).enumerate() {
            let y = y as u32;
            let dst = image.scanline_mut(if self.top_down { height - 1 - y } else { y });
            dst.copy_from_slice(row);
            if padded_alpha {
                for px in dst.chunks_exact_mut(4) {
                    px[3] = 0xFF;
                }
            }
        }

        let flags = self.flags;
        let lossy = flags.contains(ExportFlags::LOSSY);
        let alpha = flags.contains(ExportFlags::EXPORT_ALPHA);
        let ff = self.file_format;

        if !alpha || matches!(ff, FileFormat::Jpeg | FileFormat::Bmp) {
            image = image.convert_to_24bits()?;
        }

        let mut warnings = Vec::new();
        let options = match ff {
            FileFormat::Jpeg => {
                if alpha {
                    warnings.push(ExportWarning::AlphaNotSupported(ff));
                }
                let superb = !lossy || flags.contains(ExportFlags::UNCOMPRESSED);
                EncodeOptions::Jpeg {
                    quality: if superb {
                        JPEG_QUALITY_SUPERB
                    } else {
                        JPEG_QUALITY_DEFAULT
                    },
                    chroma_444: superb,
                }
            }
            FileFormat::Png => {
                if lossy {
                    warnings.push(ExportWarning::LossyNotSupported(ff));
                }
                let compression = if flags.contains(ExportFlags::UNCOMPRESSED) {
                    PngCompression::None
                } else {
                    PngCompression::Best
                };
                EncodeOptions::Png { compression }
            }
            FileFormat::Tga => {
                if lossy {
                    warnings.push(ExportWarning::LossyNotSupported(ff));
                }
                EncodeOptions::Default
            }
            FileFormat::Bmp => {
                if lossy {
                    warnings.push(ExportWarning::LossyNotSupported(ff));
                }
                if alpha {
                    warnings.push(ExportWarning::AlphaNotSupported(ff));
                }
                EncodeOptions::Default
            }
            _ => EncodeOptions::Default,
        };
        Ok((image, options, warnings))
    }
}

/// Write a raw pixel buffer to `path` with the standard codec.
///
/// See [`EncodeRequest::encode`].
#[allow(clippy::too_many_arguments)]
pub fn encode(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    file_format: FileFormat,
    export_flags: ExportFlags,
    resource_format: ResourceFormat,
    is_top_down: bool,
    data: &[u8],
) -> Result<Vec<ExportWarning>, BitmapError> {
    EncodeRequest::new(file_format)
        .flags(export_flags)
        .top_down(is_top_down)
        .encode(path, width, height, resource_format, data)
}

impl Bitmap {
    /// Save this bitmap, treating its first row as the top of the image.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        file_format: FileFormat,
        flags: ExportFlags,
    ) -> Result<Vec<ExportWarning>, BitmapError> {
        EncodeRequest::new(file_format).flags(flags).encode(
            path,
            self.width(),
            self.height(),
            self.format(),
            self.data(),
        )
    }
}
