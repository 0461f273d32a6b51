use crate::error::{BitmapError, CodecError};
use crate::format::ResourceFormat;

/// Size caps applied while decoding.
///
/// All fields default to `None` (no limit). Codecs check them against the
/// file header before allocating pixel buffers. A file that exceeds a limit
/// is rejected softly, like any other unusable input file.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the codec's decode buffer and for the resulting
    /// [`crate::Bitmap`] data.
    pub max_memory_bytes: Option<u64>,
}

fn within(what: &str, value: u64, limit: Option<u64>) -> Result<(), String> {
    match limit {
        Some(max) if value > max => Err(format!("{what} {value} exceeds limit {max}")),
        _ => Ok(()),
    }
}

impl Limits {
    /// Check header dimensions. Codecs call this before allocating.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), CodecError> {
        let (w, h) = (u64::from(width), u64::from(height));
        within("width", w, self.max_width)
            .and_then(|()| within("height", h, self.max_height))
            .and_then(|()| within("pixel count", w * h, self.max_pixels))
            .map_err(CodecError::LimitExceeded)
    }

    /// Check the size of a buffer a codec is about to allocate.
    pub fn check_alloc(&self, bytes: u64) -> Result<(), CodecError> {
        within("decode buffer size in bytes", bytes, self.max_memory_bytes)
            .map_err(CodecError::LimitExceeded)
    }

    /// Checked once the output format is known.
    pub(crate) fn check_bitmap(
        &self,
        width: u32,
        height: u32,
        format: ResourceFormat,
    ) -> Result<(), BitmapError> {
        let rows = u64::from(height.div_ceil(format.block_height()));
        let pitch = u64::from(width.div_ceil(format.block_width()))
            * u64::from(format.bytes_per_block());
        within("bitmap size in bytes", pitch.saturating_mul(rows), self.max_memory_bytes)
            .map_err(BitmapError::LimitExceeded)
    }
}
