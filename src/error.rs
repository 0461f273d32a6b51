use std::path::PathBuf;

use crate::format::ResourceFormat;

/// Errors from bitmap decoding and encoding.
///
/// Decode-path failures caused by the input file (missing, unreadable,
/// unrecognized) are *soft*: [`crate::decode`] logs them and returns
/// `Ok(None)`. Everything else is a hard failure that aborts the operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BitmapError {
    #[error("file '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("image type unknown")]
    UnknownFormat,

    #[error("codec doesn't support reading {0}")]
    UnsupportedRead(&'static str),

    #[error("can't open image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("unknown bits-per-pixel: {0}")]
    UnknownBitsPerPixel(u32),

    #[error("failed to convert palettized image to RGBA format")]
    PaletteConversion,

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("height {height} is not a multiple of the {block_height}-pixel compression block")]
    MisalignedHeight { height: u32, block_height: u32 },

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("provided data must not be empty")]
    EmptyData,

    #[error("cannot save DDS files through the bitmap encoder")]
    DdsNotSupported,

    #[error("incompatible flags: {0}")]
    IncompatibleFlags(&'static str),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unexpected color type for {bpp} bits per pixel: {detail}")]
    UnexpectedColorType { bpp: u32, detail: &'static str },

    #[error("can't find a matching format for file extension '{0}'")]
    UnknownExtension(String),

    #[error("image {0:?} cannot be viewed as the requested pixel type")]
    LayoutMismatch(ResourceFormat),

    #[error("codec failed: {0}")]
    Codec(#[from] CodecError),
}

impl BitmapError {
    /// Whether this failure is a recoverable problem with the input file.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::UnknownFormat
                | Self::UnsupportedRead(_)
                | Self::Io(_)
                | Self::InvalidImage(_)
                | Self::UnknownBitsPerPixel(_)
                | Self::PaletteConversion
                | Self::LimitExceeded(_)
                | Self::DimensionsTooLarge { .. }
        )
    }
}

/// Errors raised by an [`crate::ImageCodec`] implementation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("failed to save image: {0}")]
    Encode(String),

    #[error("{kind:?} image with {bpp} bpp cannot be written as {format}")]
    UnsupportedLayout {
        kind: crate::codec::ImageType,
        bpp: u32,
        format: &'static str,
    },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("cannot allocate {width}x{height} image at {bpp} bpp")]
    Allocation { width: u32, height: u32, bpp: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for CodecError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => CodecError::Io(io),
            image::ImageError::Decoding(d) => CodecError::Decode(d.to_string()),
            image::ImageError::Limits(l) => CodecError::LimitExceeded(l.to_string()),
            other => CodecError::Encode(other.to_string()),
        }
    }
}

impl From<exr::error::Error> for CodecError {
    fn from(e: exr::error::Error) -> Self {
        match e {
            exr::error::Error::Io(io) => CodecError::Io(io),
            other => CodecError::Decode(other.to_string()),
        }
    }
}
