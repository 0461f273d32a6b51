//! Portable Float Map reader and writer.
//!
//! PFM stores rows bottom to top. The reader keeps file order in the codec
//! scanlines (first file row lands in the last scanline), and the decoder
//! compensates by inverting the requested orientation for PFM sources.

use super::raster::{CodecImage, ImageType};
use crate::error::CodecError;
use crate::limits::Limits;

struct PfmHeader {
    channels: usize,
    width: u32,
    height: u32,
    little_endian: bool,
    data_offset: usize,
}

fn header_err(msg: &str) -> CodecError {
    CodecError::Decode(format!("PFM header: {msg}"))
}

/// Next whitespace-delimited token starting at `*pos`.
fn token<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a str, CodecError> {
    while data.get(*pos).is_some_and(u8::is_ascii_whitespace) {
        *pos += 1;
    }
    let start = *pos;
    while data.get(*pos).is_some_and(|b| !b.is_ascii_whitespace()) {
        *pos += 1;
    }
    if start == *pos {
        return Err(header_err("unexpected end of data"));
    }
    core::str::from_utf8(&data[start..*pos]).map_err(|_| header_err("non-ASCII token"))
}

fn parse_header(data: &[u8]) -> Result<PfmHeader, CodecError> {
    let mut pos = 0;
    let channels = match token(data, &mut pos)? {
        "PF" => 3,
        "Pf" => 1,
        other => return Err(header_err(&format!("bad magic {other:?}"))),
    };
    let width: u32 = token(data, &mut pos)?
        .parse()
        .map_err(|_| header_err("bad width"))?;
    let height: u32 = token(data, &mut pos)?
        .parse()
        .map_err(|_| header_err("bad height"))?;
    let scale: f32 = token(data, &mut pos)?
        .parse()
        .map_err(|_| header_err("bad scale"))?;
    if scale == 0.0 || !scale.is_finite() {
        return Err(header_err("scale must be non-zero"));
    }
    // exactly one whitespace byte separates the header from the samples
    if !data.get(pos).is_some_and(u8::is_ascii_whitespace) {
        return Err(header_err("missing separator after scale"));
    }

    Ok(PfmHeader {
        channels,
        width,
        height,
        little_endian: scale < 0.0,
        data_offset: pos + 1,
    })
}

/// Decode a PFM file into a 96 bpp RGB float image. Grayscale maps are
/// replicated into all three channels.
pub(crate) fn decode(data: &[u8], limits: Option<&Limits>) -> Result<CodecImage, CodecError> {
    let header = parse_header(data)?;
    if header.width == 0 || header.height == 0 {
        return Err(CodecError::Decode("PFM has zero dimensions".into()));
    }
    if let Some(limits) = limits {
        limits.check_dimensions(header.width, header.height)?;
        let pixels = u64::from(header.width) * u64::from(header.height);
        limits.check_alloc(pixels.saturating_mul(12))?;
    }

    let w = header.width as usize;
    let h = header.height as usize;
    let row_bytes = w
        .checked_mul(header.channels * 4)
        .ok_or_else(|| header_err("width too large"))?;
    let expected = row_bytes
        .checked_mul(h)
        .ok_or_else(|| header_err("dimensions too large"))?;
    let samples = data
        .get(header.data_offset..)
        .filter(|s| s.len() >= expected)
        .ok_or_else(|| CodecError::Decode("PFM data truncated".into()))?;

    let mut image = CodecImage::allocate(ImageType::RgbF, header.width, header.height, 96)?;
    let read = |b: &[u8]| {
        let raw = [b[0], b[1], b[2], b[3]];
        if header.little_endian {
            f32::from_le_bytes(raw)
        } else {
            f32::from_be_bytes(raw)
        }
    };

    for (k, row) in samples.chunks_exact(row_bytes).take(h).enumerate() {
        let dst = image.scanline_mut(header.height - 1 - k as u32);
        for (px, src) in dst.chunks_exact_mut(12).zip(row.chunks_exact(header.channels * 4)) {
            for c in 0..3 {
                let s = if header.channels == 3 { c } else { 0 };
                let v = read(&src[s * 4..s * 4 + 4]);
                px[c * 4..c * 4 + 4].copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
    Ok(image)
}

/// Encode a 96 bpp RGB float image as little-endian color PFM.
///
/// Scanlines are written in storage order, so scanline 0 becomes the first
/// (bottom) file row.
pub(crate) fn encode(image: &CodecImage) -> Result<Vec<u8>, CodecError> {
    if image.image_type() != ImageType::RgbF {
        return Err(CodecError::UnsupportedLayout {
            kind: image.image_type(),
            bpp: image.bpp(),
            format: "PFM",
        });
    }

    let header = format!("PF\n{} {}\n-1.0\n", image.width(), image.height());
    let row_bytes = image.line_bytes();
    let mut out = Vec::with_capacity(header.len() + row_bytes * image.height() as usize);
    out.extend_from_slice(header.as_bytes());

    for y in 0..image.height() {
        for sample in image.scanline(y).chunks_exact(4) {
            let v = f32::from_ne_bytes([sample[0], sample[1], sample[2], sample[3]]);
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn big_endian_gray_is_replicated() {
        let mut data = b"Pf\n2 1\n1.0\n".to_vec();
        data.extend_from_slice(&0.5f32.to_be_bytes());
        data.extend_from_slice(&3.0f32.to_be_bytes());
        let img = decode(&data, None).unwrap();
        assert_eq!(img.bpp(), 96);
        assert_eq!(floats(img.scanline(0)), [0.5, 0.5, 0.5, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn first_file_row_is_last_scanline() {
        let mut data = b"PF 1 2 -1.0\n".to_vec();
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let img = decode(&data, None).unwrap();
        assert_eq!(floats(img.scanline(1)), [1.0, 2.0, 3.0]);
        assert_eq!(floats(img.scanline(0)), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn write_read_cycle_reverses_storage_order() {
        let mut img = CodecImage::allocate(ImageType::RgbF, 2, 2, 96).unwrap();
        for y in 0..2 {
            let row: Vec<u8> = (0..6)
                .flat_map(|i| (y as f32 * 10.0 + i as f32 - 2.5).to_ne_bytes())
                .collect();
            img.scanline_mut(y).copy_from_slice(&row);
        }
        let bytes = encode(&img).unwrap();
        assert!(bytes.starts_with(b"PF\n2 2\n-1.0\n"));
        let back = decode(&bytes, None).unwrap();
        // storage order is reversed by one write/read cycle
        assert_eq!(back.scanline(0), img.scanline(1));
        assert_eq!(back.scanline(1), img.scanline(0));
    }

    #[test]
    fn truncated_data() {
        let data = b"PF\n4 4\n-1.0\n\0\0\0\0";
        assert!(matches!(decode(data, None), Err(CodecError::Decode(_))));
    }

    #[test]
    fn header_is_checked_against_limits_before_allocating() {
        // 30000x30000 RGB float would be ~10 GiB; the header alone is enough
        let data = b"PF\n30000 30000\n-1.0\n";
        let limits = Limits {
            max_pixels: Some(100),
            ..Limits::default()
        };
        assert!(matches!(
            decode(data, Some(&limits)),
            Err(CodecError::LimitExceeded(_))
        ));

        let limits = Limits {
            max_memory_bytes: Some(1 << 20),
            ..Limits::default()
        };
        assert!(matches!(
            decode(data, Some(&limits)),
            Err(CodecError::LimitExceeded(msg)) if msg.contains("buffer")
        ));
    }

    #[test]
    fn bad_magic() {
        assert!(decode(b"P6\n1 1\n255\n\0\0\0", None).is_err());
    }
}
