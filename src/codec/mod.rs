//! Codec capability interface.
//!
//! The decoder and encoder never touch file formats directly. They hand bytes
//! to an [`ImageCodec`] and get back a [`CodecImage`], or hand a `CodecImage`
//! over to be written. [`StandardCodec`] is the implementation used unless a
//! request supplies another one.

mod pfm;
mod raster;
mod standard;
mod utils;

use std::path::Path;

pub use raster::{CodecImage, ColorType, ImageType};
pub use standard::StandardCodec;

use crate::error::CodecError;
use crate::format::FileFormat;
use crate::limits::Limits;

/// Container formats known to the codec layer.
///
/// This is wider than [`FileFormat`]: several formats can be read but not
/// written through the encoder.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecFormat {
    Png,
    Jpeg,
    Tga,
    Bmp,
    Pfm,
    Exr,
    /// Radiance RGBE.
    Hdr,
    Dds,
    Gif,
    Tiff,
    /// PGM/PPM/PBM/PAM.
    Pnm,
}

impl CodecFormat {
    /// Detect format from magic bytes. Returns `None` if unrecognized.
    ///
    /// TGA has no signature and is only found through its extension.
    pub fn detect(data: &[u8]) -> Option<Self> {
        // JPEG: FF D8 FF
        if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] {
            return Some(Self::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.len() >= 8 && data[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return Some(Self::Png);
        }

        // OpenEXR: 76 2F 31 01
        if data.len() >= 4 && data[..4] == [0x76, 0x2F, 0x31, 0x01] {
            return Some(Self::Exr);
        }

        if data.len() >= 4 && data[..4] == *b"DDS " {
            return Some(Self::Dds);
        }

        // GIF: "GIF87a" or "GIF89a"
        if data.len() >= 6
            && data[..3] == *b"GIF"
            && data[3] == b'8'
            && (data[4] == b'7' || data[4] == b'9')
            && data[5] == b'a'
        {
            return Some(Self::Gif);
        }

        // TIFF: "II*\0" or "MM\0*"
        if data.len() >= 4 && (data[..4] == *b"II*\0" || data[..4] == *b"MM\0*") {
            return Some(Self::Tiff);
        }

        if data.starts_with(b"#?RADIANCE") || data.starts_with(b"#?RGBE") {
            return Some(Self::Hdr);
        }

        // BMP: "BM" followed by the file size
        if data.len() >= 14 && data[..2] == *b"BM" {
            return Some(Self::Bmp);
        }

        if data.len() >= 3 && data[0] == b'P' {
            match data[1] {
                b'F' | b'f' if data[2].is_ascii_whitespace() => return Some(Self::Pfm),
                b'1'..=b'7' => return Some(Self::Pnm),
                _ => {}
            }
        }

        None
    }

    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        match lower.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" | "jpe" | "jif" | "jfif" => Some(Self::Jpeg),
            "tga" | "targa" => Some(Self::Tga),
            "bmp" | "dib" => Some(Self::Bmp),
            "pfm" => Some(Self::Pfm),
            "exr" => Some(Self::Exr),
            "hdr" => Some(Self::Hdr),
            "dds" => Some(Self::Dds),
            "gif" => Some(Self::Gif),
            "tif" | "tiff" => Some(Self::Tiff),
            "pnm" | "ppm" | "pgm" | "pbm" | "pam" => Some(Self::Pnm),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tga => "TGA",
            Self::Bmp => "BMP",
            Self::Pfm => "PFM",
            Self::Exr => "EXR",
            Self::Hdr => "Radiance HDR",
            Self::Dds => "DDS",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
            Self::Pnm => "PNM",
        }
    }
}

impl From<FileFormat> for CodecFormat {
    fn from(f: FileFormat) -> Self {
        match f {
            FileFormat::Png => Self::Png,
            FileFormat::Jpeg => Self::Jpeg,
            FileFormat::Tga => Self::Tga,
            FileFormat::Bmp => Self::Bmp,
            FileFormat::Pfm => Self::Pfm,
            FileFormat::Exr => Self::Exr,
            FileFormat::Dds => Self::Dds,
        }
    }
}

/// PNG deflate effort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PngCompression {
    None,
    Best,
}

/// EXR block compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExrCompression {
    None,
    /// Lossless wavelet.
    Piz,
    /// Lossy 4x4 block, half-float only.
    B44,
}

/// Per-format options passed to [`ImageCodec::encode`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EncodeOptions {
    #[default]
    Default,
    Jpeg {
        /// 1..=100.
        quality: u8,
        /// Request 4:4:4 chroma rather than the codec's default
        /// subsampling. [`StandardCodec`] always writes 4:4:4.
        chroma_444: bool,
    },
    Png {
        compression: PngCompression,
    },
    Exr {
        compression: ExrCompression,
        /// Store samples as 16-bit half floats instead of 32-bit floats.
        half: bool,
    },
}

/// An image codec the decoder and encoder delegate to.
///
/// Implementations are stateless and shared, so they must be `Send + Sync`.
pub trait ImageCodec: Send + Sync {
    /// Identify a format from leading file bytes.
    fn detect_format(&self, data: &[u8]) -> Option<CodecFormat> {
        CodecFormat::detect(data)
    }

    /// Identify a format from a path's extension.
    fn format_from_path(&self, path: &Path) -> Option<CodecFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(CodecFormat::from_extension)
    }

    /// Whether [`ImageCodec::decode`] supports `format`.
    fn can_read(&self, format: CodecFormat) -> bool;

    /// Decode a whole file held in memory.
    ///
    /// When `limits` is given, implementations check it against the header
    /// with [`Limits::check_dimensions`] and [`Limits::check_alloc`] before
    /// allocating pixel buffers, failing with [`CodecError::LimitExceeded`].
    fn decode(
        &self,
        format: CodecFormat,
        data: &[u8],
        limits: Option<&Limits>,
    ) -> Result<CodecImage, CodecError>;

    /// Write `image` to `path`.
    fn encode(
        &self,
        format: CodecFormat,
        image: &CodecImage,
        options: &EncodeOptions,
        path: &Path,
    ) -> Result<(), CodecError>;

    fn allocate(
        &self,
        image_type: ImageType,
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<CodecImage, CodecError> {
        CodecImage::allocate(image_type, width, height, bpp)
    }

    /// Expand a palette image to 32 bpp B,G,R,A.
    fn convert_palette(&self, image: &CodecImage) -> Result<CodecImage, CodecError> {
        image.convert_to_32bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_magic() {
        assert_eq!(CodecFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(CodecFormat::Jpeg));
        assert_eq!(
            CodecFormat::detect(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(CodecFormat::Png)
        );
        assert_eq!(CodecFormat::detect(&[0x76, 0x2F, 0x31, 0x01, 2]), Some(CodecFormat::Exr));
        assert_eq!(CodecFormat::detect(b"PF\n2 2\n-1.0\n"), Some(CodecFormat::Pfm));
        assert_eq!(CodecFormat::detect(b"Pf 2 2 -1.0\n"), Some(CodecFormat::Pfm));
        assert_eq!(CodecFormat::detect(b"P6\n2 2\n255\n"), Some(CodecFormat::Pnm));
        assert_eq!(CodecFormat::detect(b"#?RADIANCE\n"), Some(CodecFormat::Hdr));
        assert_eq!(CodecFormat::detect(b"DDS |"), Some(CodecFormat::Dds));
    }

    #[test]
    fn detect_unknown() {
        assert_eq!(CodecFormat::detect(&[]), None);
        assert_eq!(CodecFormat::detect(&[0, 0, 2, 0, 0, 0, 0]), None);
        assert_eq!(CodecFormat::detect(b"BM"), None);
    }

    #[test]
    fn extension_lookup_ignores_case() {
        assert_eq!(CodecFormat::from_extension("TGA"), Some(CodecFormat::Tga));
        assert_eq!(CodecFormat::from_extension("Jpeg"), Some(CodecFormat::Jpeg));
        assert_eq!(CodecFormat::from_extension("xyz"), None);
    }

    #[test]
    fn file_formats_map_to_codec_formats() {
        for f in FileFormat::ALL {
            assert_eq!(CodecFormat::from(f).name(), f.name());
        }
    }
}
