//! Saving renderer textures.
//!
//! The renderer owns GPU textures; this module only needs a way to read
//! their texels back. [`save_texture`] is the non-interactive half of a save
//! dialog: the file type comes from the chosen path and must be one the
//! dialog would have offered for the texture's format.

use std::path::Path;

use crate::bitmap::Bitmap;
use crate::encode::{EncodeRequest, ExportWarning};
use crate::error::BitmapError;
use crate::flags::ExportFlags;
use crate::format::{FileFormat, ResourceFormat, file_dialog_filters};

/// A texture whose top mip level can be read back to the CPU.
pub trait TextureSource {
    fn format(&self) -> ResourceFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Texel data with rows `format().row_pitch(width())` bytes apart, top
    /// row first.
    fn read_texels(&self) -> Result<Vec<u8>, BitmapError>;
}

impl TextureSource for Bitmap {
    fn format(&self) -> ResourceFormat {
        Bitmap::format(self)
    }

    fn width(&self) -> u32 {
        Bitmap::width(self)
    }

    fn height(&self) -> u32 {
        Bitmap::height(self)
    }

    fn read_texels(&self) -> Result<Vec<u8>, BitmapError> {
        Ok(self.data().to_vec())
    }
}

/// Read back `texture` and write it to `path` as `file_format`.
pub fn capture_to_file<T: TextureSource + ?Sized>(
    texture: &T,
    path: impl AsRef<Path>,
    file_format: FileFormat,
    flags: ExportFlags,
) -> Result<Vec<ExportWarning>, BitmapError> {
    let texels = texture.read_texels()?;
    EncodeRequest::new(file_format).flags(flags).encode(
        path,
        texture.width(),
        texture.height(),
        texture.format(),
        &texels,
    )
}

/// Save `texture` to `path`, picking the file format from its extension.
///
/// Fails with [`BitmapError::UnsupportedFormat`] when the extension is not
/// among [`file_dialog_filters`] for the texture's format.
pub fn save_texture<T: TextureSource + ?Sized>(
    texture: &T,
    path: impl AsRef<Path>,
) -> Result<Vec<ExportWarning>, BitmapError> {
    let path = path.as_ref();
    let file_format = FileFormat::from_path(path)?;
    let format = texture.format();
    let offered = file_dialog_filters(Some(format))
        .iter()
        .any(|f| f.ext == file_format.extension());
    if !offered {
        return Err(BitmapError::UnsupportedFormat(format!(
            "{format:?} textures cannot be saved as {}",
            file_format.name()
        )));
    }
    capture_to_file(texture, path, file_format, ExportFlags::empty())
}
