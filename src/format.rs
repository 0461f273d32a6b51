//! Resource and file format tables.
//!
//! [`ResourceFormat`] describes how pixels sit in GPU memory; [`FileFormat`]
//! names the containers the encoder can write. Both are backed by constant
//! tables, so classification is a pure lookup.

use std::path::Path;

use crate::error::BitmapError;
use crate::flags::ExportFlags;

/// Numeric interpretation of a format's channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatType {
    Float,
    Unorm,
    UnormSrgb,
    Snorm,
    Uint,
    Sint,
}

/// GPU resource format of a pixel buffer.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceFormat {
    R8Unorm,
    R8Snorm,
    R16Unorm,
    R16Snorm,
    R16Uint,
    R16Sint,
    R16Float,
    R32Uint,
    R32Sint,
    R32Float,
    Rg8Unorm,
    Rg8Snorm,
    Rg16Unorm,
    Rg16Uint,
    Rg16Sint,
    Rg16Float,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgb32Uint,
    Rgb32Sint,
    Rgb32Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Bgrx8Unorm,
    Bgrx8UnormSrgb,
    Rgba16Unorm,
    Rgba16Snorm,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,
    Rgb10A2Unorm,
    R11G11B10Float,
    D32Float,
    Bc1Unorm,
    Bc1UnormSrgb,
    Bc2Unorm,
    Bc2UnormSrgb,
    Bc3Unorm,
    Bc3UnormSrgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6hU16,
    Bc6hS16,
    Bc7Unorm,
    Bc7UnormSrgb,
}

#[derive(Clone, Copy)]
struct FormatDesc {
    channels: u8,
    /// Bits of channel 0; zero for block-compressed formats.
    channel_bits: u8,
    ty: FormatType,
    bytes_per_block: u8,
    block_width: u8,
    block_height: u8,
}

const fn px(channels: u8, channel_bits: u8, ty: FormatType, bytes: u8) -> FormatDesc {
    FormatDesc {
        channels,
        channel_bits,
        ty,
        bytes_per_block: bytes,
        block_width: 1,
        block_height: 1,
    }
}

const fn bc(channels: u8, ty: FormatType, bytes: u8) -> FormatDesc {
    FormatDesc {
        channels,
        channel_bits: 0,
        ty,
        bytes_per_block: bytes,
        block_width: 4,
        block_height: 4,
    }
}

impl ResourceFormat {
    const fn desc(self) -> FormatDesc {
        use FormatType::{Float, Sint, Snorm, Uint, Unorm, UnormSrgb};
        match self {
            Self::R8Unorm => px(1, 8, Unorm, 1),
            Self::R8Snorm => px(1, 8, Snorm, 1),
            Self::R16Unorm => px(1, 16, Unorm, 2),
            Self::R16Snorm => px(1, 16, Snorm, 2),
            Self::R16Uint => px(1, 16, Uint, 2),
            Self::R16Sint => px(1, 16, Sint, 2),
            Self::R16Float => px(1, 16, Float, 2),
            Self::R32Uint => px(1, 32, Uint, 4),
            Self::R32Sint => px(1, 32, Sint, 4),
            Self::R32Float => px(1, 32, Float, 4),
            Self::Rg8Unorm => px(2, 8, Unorm, 2),
            Self::Rg8Snorm => px(2, 8, Snorm, 2),
            Self::Rg16Unorm => px(2, 16, Unorm, 4),
            Self::Rg16Uint => px(2, 16, Uint, 4),
            Self::Rg16Sint => px(2, 16, Sint, 4),
            Self::Rg16Float => px(2, 16, Float, 4),
            Self::Rg32Uint => px(2, 32, Uint, 8),
            Self::Rg32Sint => px(2, 32, Sint, 8),
            Self::Rg32Float => px(2, 32, Float, 8),
            Self::Rgb32Uint => px(3, 32, Uint, 12),
            Self::Rgb32Sint => px(3, 32, Sint, 12),
            Self::Rgb32Float => px(3, 32, Float, 12),
            Self::Rgba8Unorm => px(4, 8, Unorm, 4),
            Self::Rgba8UnormSrgb => px(4, 8, UnormSrgb, 4),
            Self::Rgba8Snorm => px(4, 8, Snorm, 4),
            Self::Rgba8Uint => px(4, 8, Uint, 4),
            Self::Rgba8Sint => px(4, 8, Sint, 4),
            Self::Bgra8Unorm => px(4, 8, Unorm, 4),
            Self::Bgra8UnormSrgb => px(4, 8, UnormSrgb, 4),
            Self::Bgrx8Unorm => px(4, 8, Unorm, 4),
            Self::Bgrx8UnormSrgb => px(4, 8, UnormSrgb, 4),
            Self::Rgba16Unorm => px(4, 16, Unorm, 8),
            Self::Rgba16Snorm => px(4, 16, Snorm, 8),
            Self::Rgba16Uint => px(4, 16, Uint, 8),
            Self::Rgba16Sint => px(4, 16, Sint, 8),
            Self::Rgba16Float => px(4, 16, Float, 8),
            Self::Rgba32Uint => px(4, 32, Uint, 16),
            Self::Rgba32Sint => px(4, 32, Sint, 16),
            Self::Rgba32Float => px(4, 32, Float, 16),
            Self::Rgb10A2Unorm => px(4, 10, Unorm, 4),
            Self::R11G11B10Float => px(3, 11, Float, 4),
            Self::D32Float => px(1, 32, Float, 4),
            Self::Bc1Unorm => bc(3, Unorm, 8),
            Self::Bc1UnormSrgb => bc(3, UnormSrgb, 8),
            Self::Bc2Unorm => bc(4, Unorm, 16),
            Self::Bc2UnormSrgb => bc(4, UnormSrgb, 16),
            Self::Bc3Unorm => bc(4, Unorm, 16),
            Self::Bc3UnormSrgb => bc(4, UnormSrgb, 16),
            Self::Bc4Unorm => bc(1, Unorm, 8),
            Self::Bc4Snorm => bc(1, Snorm, 8),
            Self::Bc5Unorm => bc(2, Unorm, 16),
            Self::Bc5Snorm => bc(2, Snorm, 16),
            Self::Bc6hU16 => bc(3, Float, 16),
            Self::Bc6hS16 => bc(3, Float, 16),
            Self::Bc7Unorm => bc(4, Unorm, 16),
            Self::Bc7UnormSrgb => bc(4, UnormSrgb, 16),
        }
    }

    /// Number of channels.
    pub const fn channel_count(self) -> u32 {
        self.desc().channels as u32
    }

    /// Bits in channel 0. Zero for block-compressed formats.
    pub const fn channel_bits(self) -> u32 {
        self.desc().channel_bits as u32
    }

    pub const fn format_type(self) -> FormatType {
        self.desc().ty
    }

    /// Bytes per pixel, or per block for compressed formats.
    pub const fn bytes_per_block(self) -> u32 {
        self.desc().bytes_per_block as u32
    }

    pub const fn is_compressed(self) -> bool {
        self.desc().block_width > 1
    }

    /// Compression block width in pixels (1 when uncompressed).
    pub const fn block_width(self) -> u32 {
        self.desc().block_width as u32
    }

    /// Compression block height in pixels (1 when uncompressed).
    pub const fn block_height(self) -> u32 {
        self.desc().block_height as u32
    }

    /// Bytes between consecutive rows (or block rows) for an image `width` pixels wide.
    pub const fn row_pitch(self, width: u32) -> u32 {
        let d = self.desc();
        width.div_ceil(d.block_width as u32) * d.bytes_per_block as u32
    }

    /// Whether [`crate::convert::convert_to_rgba32_float`] accepts this format:
    /// half floats, or unsigned/signed integers of at least 16 bits.
    pub const fn is_convertible_to_rgba32_float(self) -> bool {
        let d = self.desc();
        if d.block_width > 1 {
            return false;
        }
        match d.ty {
            FormatType::Float => d.channel_bits == 16,
            FormatType::Uint | FormatType::Sint => d.channel_bits >= 16,
            _ => false,
        }
    }

    /// Three or four channels of 32-bit float.
    pub const fn is_rgb_float32(self) -> bool {
        matches!(self, Self::Rgb32Float | Self::Rgba32Float)
    }

    /// The 8-bit RGBA formats whose bytes must be swizzled to BGRA before
    /// reaching a codec.
    pub const fn is_rgba8_family(self) -> bool {
        matches!(
            self,
            Self::Rgba8Unorm | Self::Rgba8Snorm | Self::Rgba8UnormSrgb
        )
    }
}

/// File containers the encoder can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Png,
    Jpeg,
    Tga,
    Bmp,
    Pfm,
    Exr,
    Dds,
}

/// Extensions in enum order.
const EXTENSIONS: [&str; 7] = ["png", "jpg", "tga", "bmp", "pfm", "exr", "dds"];

impl FileFormat {
    pub const ALL: [FileFormat; 7] = [
        Self::Png,
        Self::Jpeg,
        Self::Tga,
        Self::Bmp,
        Self::Pfm,
        Self::Exr,
        Self::Dds,
    ];

    /// Canonical file extension, without the dot.
    pub const fn extension(self) -> &'static str {
        EXTENSIONS[self as usize]
    }

    /// Look up a format by its canonical extension (`"jpg"`, not `"jpeg"`).
    pub fn from_extension(ext: &str) -> Result<Self, BitmapError> {
        EXTENSIONS
            .iter()
            .position(|&e| e == ext)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| BitmapError::UnknownExtension(ext.into()))
    }

    /// Look up a format from a path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, BitmapError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    /// Human-readable container name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tga => "TGA",
            Self::Bmp => "BMP",
            Self::Pfm => "PFM",
            Self::Exr => "EXR",
            Self::Dds => "DDS",
        }
    }

    /// Whether the container stores high-dynamic-range float data.
    pub const fn is_hdr(self) -> bool {
        matches!(self, Self::Pfm | Self::Exr)
    }

    /// Export flags this container honors. Requesting others produces an
    /// advisory warning (LDR formats) or a hard failure (HDR formats).
    pub const fn supported_export_flags(self) -> ExportFlags {
        match self {
            Self::Png | Self::Tga => ExportFlags::UNCOMPRESSED.union(ExportFlags::EXPORT_ALPHA),
            Self::Jpeg => ExportFlags::UNCOMPRESSED.union(ExportFlags::LOSSY),
            Self::Bmp | Self::Pfm => ExportFlags::UNCOMPRESSED,
            Self::Exr | Self::Dds => ExportFlags::all(),
        }
    }
}

/// One entry of a save-dialog filter list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileDialogFilter {
    pub ext: &'static str,
    pub description: &'static str,
}

const fn filter(ext: &'static str, description: &'static str) -> FileDialogFilter {
    FileDialogFilter { ext, description }
}

const HDR_FILTERS: [FileDialogFilter; 3] = [
    filter("exr", "High Dynamic Range"),
    filter("pfm", "Portable Float Map"),
    filter("hdr", "Radiance HDR"),
];

const LDR_FILTERS: [FileDialogFilter; 4] = [
    filter("png", "Portable Network Graphics"),
    filter("jpg", "JPEG"),
    filter("bmp", "Bitmap Image File"),
    filter("tga", "Truevision Graphics Adapter"),
];

/// File types to offer when saving an image of `format`.
///
/// Float, half and wide integer formats get the HDR containers, everything
/// else the LDR ones. DDS is always offered. With no format, both groups are
/// listed plus the load-only Radiance entry.
pub fn file_dialog_filters(format: Option<ResourceFormat>) -> Vec<FileDialogFilter> {
    let (show_hdr, show_ldr) = match format {
        Some(f) => {
            let hdr = f.format_type() == FormatType::Float || f.is_convertible_to_rgba32_float();
            (hdr, !hdr)
        }
        None => (true, true),
    };

    let mut filters = Vec::with_capacity(9);
    if show_hdr {
        filters.extend_from_slice(&HDR_FILTERS);
    }
    if show_ldr {
        filters.extend_from_slice(&LDR_FILTERS);
    }
    filters.push(filter("dds", "DirectDraw Surface"));
    if format.is_none() {
        filters.push(filter("hdr", "High Dynamic Range"));
    }
    filters
}

/// Preferred extension for saving an image of `format`.
pub fn file_ext_from_resource_format(format: Option<ResourceFormat>) -> &'static str {
    file_dialog_filters(format)
        .first()
        .map_or(FileFormat::Dds.extension(), |f| f.ext)
}
