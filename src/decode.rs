//! File to [`Bitmap`] decoding.

use std::path::Path;

use crate::bitmap::Bitmap;
use crate::codec::{CodecFormat, CodecImage, ColorType, ImageCodec, ImageType, StandardCodec};
use crate::convert::{float32_row_to_rgba16f, rgb32f_row_to_rgba32f};
use crate::error::{BitmapError, CodecError};
use crate::flags::ImportFlags;
use crate::format::ResourceFormat;
use crate::limits::Limits;

static STANDARD_CODEC: StandardCodec = StandardCodec;

/// How each codec scanline becomes a bitmap row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowOp {
    Copy,
    /// RGB f32 to RGBA f32, alpha 1.0.
    RgbToRgba32F,
    /// RGB(A) f32 to RGBA f16.
    ToRgba16F { channels: usize },
}

/// Builder for decoding an image file.
///
/// ```no_run
/// use bitmap_io::{DecodeRequest, ImportFlags};
///
/// let bitmap = DecodeRequest::new()
///     .top_down(true)
///     .flags(ImportFlags::CONVERT_TO_FLOAT16)
///     .decode("sky.exr")?;
/// if let Some(bitmap) = bitmap {
///     println!("{}x{} {:?}", bitmap.width(), bitmap.height(), bitmap.format());
/// }
/// # Ok::<(), bitmap_io::BitmapError>(())
/// ```
#[derive(Clone, Copy)]
pub struct DecodeRequest<'a> {
    top_down: bool,
    flags: ImportFlags,
    rgb32f_supported: bool,
    limits: Option<&'a Limits>,
    codec: &'a dyn ImageCodec,
}

impl Default for DecodeRequest<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DecodeRequest<'a> {
    /// Top-down output, no import flags, the standard codec.
    pub fn new() -> Self {
        Self {
            top_down: true,
            flags: ImportFlags::empty(),
            rgb32f_supported: false,
            limits: None,
            codec: &STANDARD_CODEC,
        }
    }

    /// Emit the top image row first. When false, the bottom row comes first.
    pub fn top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }

    pub fn flags(mut self, flags: ImportFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Keep 96 bpp float images as [`ResourceFormat::Rgb32Float`] instead of
    /// padding them to four channels. Off by default.
    pub fn rgb32f_supported(mut self, supported: bool) -> Self {
        self.rgb32f_supported = supported;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Decode through `codec` instead of [`StandardCodec`].
    pub fn with_codec(mut self, codec: &'a dyn ImageCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Decode the file at `path`.
    ///
    /// Problems with the file itself (missing, unreadable, unrecognized,
    /// corrupt, over the limits) are logged as warnings and give `Ok(None)`.
    /// `Err` is reserved for images the codec produced in a shape that
    /// cannot be represented.
    pub fn decode(&self, path: impl AsRef<Path>) -> Result<Option<Bitmap>, BitmapError> {
        let path = path.as_ref();
        match self.decode_file(path) {
            Ok(bitmap) => Ok(Some(bitmap)),
            Err(e) if e.is_soft() => {
                log::warn!("Error when loading image file '{}': {e}", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn decode_file(&self, path: &Path) -> Result<Bitmap, BitmapError> {
        if !path.exists() {
            return Err(BitmapError::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)?;
        let format = self
            .codec
            .detect_format(&data)
            .or_else(|| self.codec.format_from_path(path))
            .ok_or(BitmapError::UnknownFormat)?;
        log::debug!("decoding '{}' as {}", path.display(), format.name());

        if !self.codec.can_read(format) {
            return Err(BitmapError::UnsupportedRead(format.name()));
        }

        let image = self
            .codec
            .decode(format, &data, self.limits)
            .map_err(decode_failure)?;
        drop(data);

        // PFM scanlines arrive in file order, which runs bottom to top.
        let top_down = if format == CodecFormat::Pfm {
            !self.top_down
        } else {
            self.top_down
        };
        self.normalize(image, top_down)
    }

    /// Classify a decoded image and copy it into a [`Bitmap`].
    fn normalize(&self, image: CodecImage, top_down: bool) -> Result<Bitmap, BitmapError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 || image.bits().is_empty() {
            return Err(BitmapError::InvalidImage(format!(
                "image has no pixel data ({width}x{height})"
            )));
        }
        // codecs that ignore limits are still caught here, after the fact
        if let Some(limits) = self.limits {
            limits
                .check_dimensions(width, height)
                .map_err(decode_failure)?;
        }

        let image = if image.color_type() == ColorType::Palette {
            self.codec
                .convert_palette(&image)
                .map_err(|_| BitmapError::PaletteConversion)?
        } else {
            image
        };

        let (image, format, op) = self.classify(image)?;
        if let Some(limits) = self.limits {
            limits.check_bitmap(width, height, format)?;
        }

        let mut bitmap = Bitmap::new(width, height, format)?;
        for y in 0..height {
            let src = image.scanline(if top_down { height - 1 - y } else { y });
            let Some(dst) = bitmap.row_mut(y) else {
                break;
            };
            match op {
                RowOp::Copy => dst.copy_from_slice(src),
                RowOp::RgbToRgba32F => rgb32f_row_to_rgba32f(src, dst),
                RowOp::ToRgba16F { channels } => float32_row_to_rgba16f(src, channels, dst),
            }
        }
        Ok(bitmap)
    }

    /// Pick the resource format for `image`, converting it where the stored
    /// layout differs from the format's.
    fn classify(
        &self,
        image: CodecImage,
    ) -> Result<(CodecImage, ResourceFormat, RowOp), BitmapError> {
        let bpp = image.bpp();
        let half = self.flags.contains(ImportFlags::CONVERT_TO_FLOAT16);

        let classified = match bpp {
            128 if half => (image, ResourceFormat::Rgba16Float, RowOp::ToRgba16F { channels: 4 }),
            128 => (image, ResourceFormat::Rgba32Float, RowOp::Copy),
            96 if half => (image, ResourceFormat::Rgba16Float, RowOp::ToRgba16F { channels: 3 }),
            96 if self.rgb32f_supported => (image, ResourceFormat::Rgb32Float, RowOp::Copy),
            96 => (image, ResourceFormat::Rgba32Float, RowOp::RgbToRgba32F),
            64 => {
                if image.color_type() != ColorType::RgbAlpha {
                    return Err(BitmapError::UnexpectedColorType {
                        bpp,
                        detail: "64 bpp images must be RGBA",
                    });
                }
                (image, ResourceFormat::Rgba16Unorm, RowOp::Copy)
            }
            48 => {
                if image.color_type() != ColorType::Rgb {
                    return Err(BitmapError::UnexpectedColorType {
                        bpp,
                        detail: "48 bpp images must be RGB",
                    });
                }
                let promoted = image.convert_to_rgba16()?;
                (promoted, ResourceFormat::Rgba16Unorm, RowOp::Copy)
            }
            32 => (image, ResourceFormat::Bgra8Unorm, RowOp::Copy),
            24 => {
                let promoted = image.convert_to_32bits()?;
                (promoted, ResourceFormat::Bgrx8Unorm, RowOp::Copy)
            }
            16 if image.image_type() == ImageType::Uint16 => {
                (image, ResourceFormat::R16Unorm, RowOp::Copy)
            }
            16 => (image, ResourceFormat::Rg8Unorm, RowOp::Copy),
            8 => (image, ResourceFormat::R8Unorm, RowOp::Copy),
            other => return Err(BitmapError::UnknownBitsPerPixel(other)),
        };
        Ok(classified)
    }
}

/// Codec failures while decoding are problems with the file, so all of them
/// are soft.
fn decode_failure(e: CodecError) -> BitmapError {
    match e {
        CodecError::LimitExceeded(msg) => BitmapError::LimitExceeded(msg),
        other => BitmapError::InvalidImage(other.to_string()),
    }
}

/// Decode the image file at `path` with the standard codec.
///
/// See [`DecodeRequest::decode`] for the error contract.
pub fn decode(
    path: impl AsRef<Path>,
    is_top_down: bool,
    flags: ImportFlags,
) -> Result<Option<Bitmap>, BitmapError> {
    DecodeRequest::new()
        .top_down(is_top_down)
        .flags(flags)
        .decode(path)
}

impl Bitmap {
    /// Load an image file. Shorthand for [`decode`].
    pub fn from_file(
        path: impl AsRef<Path>,
        is_top_down: bool,
        flags: ImportFlags,
    ) -> Result<Option<Bitmap>, BitmapError> {
        decode(path, is_top_down, flags)
    }
}
