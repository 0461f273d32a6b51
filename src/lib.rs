//! # bitmap-io
//!
//! Load image files into GPU-ready pixel buffers and write pixel buffers back
//! out as image files.
//!
//! Every decoded image becomes a [`Bitmap`] tagged with an explicit
//! [`ResourceFormat`]. Every encode starts from a raw buffer plus its
//! `ResourceFormat` and ends in one of the [`FileFormat`] containers.
//!
//! ## Supported Formats
//!
//! | Container | Read | Write |
//! |-----------|------|-------|
//! | PNG, JPEG, TGA, BMP | yes | 8-bit formats |
//! | PFM, EXR | yes | float, half and wide integer formats |
//! | Radiance HDR, GIF, TIFF, PNM | yes | no |
//! | DDS | no | no |
//!
//! ## Decoded formats
//!
//! | Source | Bitmap format |
//! |--------|---------------|
//! | 128 bpp float RGBA | `Rgba32Float` (`Rgba16Float` with [`ImportFlags::CONVERT_TO_FLOAT16`]) |
//! | 96 bpp float RGB | `Rgba32Float`, or `Rgb32Float` when enabled on the request |
//! | 64/48 bpp 16-bit RGBA/RGB | `Rgba16Unorm` |
//! | 32 bpp | `Bgra8Unorm` |
//! | 24 bpp | `Bgrx8Unorm` |
//! | 16 bpp | `R16Unorm` or `Rg8Unorm` |
//! | 8 bpp | `R8Unorm` |
//!
//! Palette images are expanded to `Bgra8Unorm` first.
//!
//! ## Non-Goals
//!
//! - GPU resource creation and upload
//! - Writing DDS or any block-compressed format
//! - Color management
//!
//! ## Usage
//!
//! ```no_run
//! use bitmap_io::{ExportFlags, FileFormat, ImportFlags};
//!
//! // Missing or unreadable files give Ok(None) and a logged warning.
//! if let Some(bitmap) = bitmap_io::decode("in.png", true, ImportFlags::empty())? {
//!     let warnings = bitmap.save("out.tga", FileFormat::Tga, ExportFlags::EXPORT_ALPHA)?;
//!     for w in &warnings {
//!         eprintln!("{w}");
//!     }
//! }
//! # Ok::<(), bitmap_io::BitmapError>(())
//! ```

#![forbid(unsafe_code)]

mod bitmap;
mod codec;
mod convert;
mod decode;
mod encode;
mod error;
mod flags;
mod format;
mod limits;
mod texture;

// Re-exports
#[cfg(feature = "rgb")]
pub use bitmap::BitmapPixel;
pub use bitmap::Bitmap;
pub use codec::{
    CodecFormat, CodecImage, ColorType, EncodeOptions, ExrCompression, ImageCodec, ImageType,
    PngCompression, StandardCodec,
};
pub use convert::{
    convert_to_rgba32_float, float32_row_to_rgba16f, rgb32f_row_to_rgba32f,
    rgba32f_row_to_rgb32f,
};
pub use decode::{DecodeRequest, decode};
pub use encode::{EncodeRequest, ExportWarning, encode};
pub use error::{BitmapError, CodecError};
pub use flags::{ExportFlags, ImportFlags};
pub use format::{
    FileDialogFilter, FileFormat, FormatType, ResourceFormat, file_dialog_filters,
    file_ext_from_resource_format,
};
pub use limits::Limits;
pub use texture::{TextureSource, capture_to_file, save_texture};
