//! Default codec backed by the `image` and `exr` crates.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{self, PngEncoder};
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader};

use super::raster::{CodecImage, ColorType, ImageType};
use super::{CodecFormat, EncodeOptions, ExrCompression, ImageCodec, PngCompression, pfm};
use crate::error::CodecError;
use crate::limits::Limits;

/// PNG, JPEG, TGA, BMP, GIF, TIFF, PNM and Radiance HDR through `image`,
/// OpenEXR through `exr`, and a native PFM reader/writer. DDS is not
/// readable.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCodec;

impl StandardCodec {
    fn image_format(format: CodecFormat) -> Option<image::ImageFormat> {
        Some(match format {
            CodecFormat::Png => image::ImageFormat::Png,
            CodecFormat::Jpeg => image::ImageFormat::Jpeg,
            CodecFormat::Tga => image::ImageFormat::Tga,
            CodecFormat::Bmp => image::ImageFormat::Bmp,
            CodecFormat::Hdr => image::ImageFormat::Hdr,
            CodecFormat::Gif => image::ImageFormat::Gif,
            CodecFormat::Tiff => image::ImageFormat::Tiff,
            CodecFormat::Pnm => image::ImageFormat::Pnm,
            _ => return None,
        })
    }
}

impl ImageCodec for StandardCodec {
    fn can_read(&self, format: CodecFormat) -> bool {
        matches!(format, CodecFormat::Pfm | CodecFormat::Exr)
            || Self::image_format(format).is_some()
    }

    fn decode(
        &self,
        format: CodecFormat,
        data: &[u8],
        limits: Option<&Limits>,
    ) -> Result<CodecImage, CodecError> {
        match format {
            CodecFormat::Pfm => pfm::decode(data, limits),
            CodecFormat::Exr => decode_exr(data, limits),
            other => {
                let fmt = Self::image_format(other).ok_or_else(|| {
                    CodecError::Decode(format!("reading {} is not supported", other.name()))
                })?;
                decode_image(fmt, data, limits)
            }
        }
    }

    fn encode(
        &self,
        format: CodecFormat,
        image: &CodecImage,
        options: &EncodeOptions,
        path: &Path,
    ) -> Result<(), CodecError> {
        match format {
            CodecFormat::Pfm => {
                let bytes = pfm::encode(image)?;
                std::fs::write(path, bytes)?;
                Ok(())
            }
            CodecFormat::Exr => encode_exr(image, options, path),
            CodecFormat::Png | CodecFormat::Jpeg | CodecFormat::Tga | CodecFormat::Bmp => {
                encode_ldr(format, image, options, path)
            }
            other => Err(CodecError::Encode(format!(
                "writing {} is not supported",
                other.name()
            ))),
        }
    }
}

// ── decode ──────────────────────────────────────────────────────────

/// Copy top-down `samples` into a new bottom-up image, `channels` samples per
/// pixel, letting `put` write each pixel's bytes.
fn from_samples<S: Copy>(
    image_type: ImageType,
    bpp: u32,
    width: u32,
    height: u32,
    samples: &[S],
    channels: usize,
    put: impl Fn(&[S], &mut [u8]),
) -> Result<CodecImage, CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::Decode(format!("image has zero size {width}x{height}")));
    }
    let mut out = CodecImage::allocate(image_type, width, height, bpp)?;
    let bytes_per_pixel = bpp as usize / 8;
    let row_len = width as usize * channels;
    for (r, row) in samples.chunks_exact(row_len).take(height as usize).enumerate() {
        let dst = out.scanline_mut(height - 1 - r as u32);
        for (px, d) in row.chunks_exact(channels).zip(dst.chunks_exact_mut(bytes_per_pixel)) {
            put(px, d);
        }
    }
    Ok(out)
}

fn put_u16(px: &[u16], d: &mut [u8]) {
    for (v, out) in px.iter().zip(d.chunks_exact_mut(2)) {
        out.copy_from_slice(&v.to_ne_bytes());
    }
}

fn put_f32(px: &[f32], d: &mut [u8]) {
    for (v, out) in px.iter().zip(d.chunks_exact_mut(4)) {
        out.copy_from_slice(&v.to_ne_bytes());
    }
}

fn from_dynamic(img: DynamicImage) -> Result<CodecImage, CodecError> {
    let (w, h) = (img.width(), img.height());
    match img {
        DynamicImage::ImageLuma8(buf) => {
            from_samples(ImageType::Bitmap, 8, w, h, buf.as_raw(), 1, |p, d| d[0] = p[0])
        }
        DynamicImage::ImageLumaA8(buf) => {
            from_samples(ImageType::Bitmap, 32, w, h, buf.as_raw(), 2, |p, d| {
                d.copy_from_slice(&[p[0], p[0], p[0], p[1]]);
            })
        }
        DynamicImage::ImageRgb8(buf) => {
            from_samples(ImageType::Bitmap, 24, w, h, buf.as_raw(), 3, |p, d| {
                d.copy_from_slice(&[p[2], p[1], p[0]]);
            })
        }
        DynamicImage::ImageRgba8(buf) => {
            from_samples(ImageType::Bitmap, 32, w, h, buf.as_raw(), 4, |p, d| {
                d.copy_from_slice(&[p[2], p[1], p[0], p[3]]);
            })
        }
        DynamicImage::ImageLuma16(buf) => {
            from_samples(ImageType::Uint16, 16, w, h, buf.as_raw(), 1, put_u16)
        }
        DynamicImage::ImageLumaA16(buf) => {
            from_samples(ImageType::Rgba16, 64, w, h, buf.as_raw(), 2, |p, d| {
                put_u16(&[p[0], p[0], p[0], p[1]], d);
            })
        }
        DynamicImage::ImageRgb16(buf) => {
            from_samples(ImageType::Rgb16, 48, w, h, buf.as_raw(), 3, put_u16)
        }
        DynamicImage::ImageRgba16(buf) => {
            from_samples(ImageType::Rgba16, 64, w, h, buf.as_raw(), 4, put_u16)
        }
        DynamicImage::ImageRgb32F(buf) => {
            from_samples(ImageType::RgbF, 96, w, h, buf.as_raw(), 3, put_f32)
        }
        DynamicImage::ImageRgba32F(buf) => {
            from_samples(ImageType::RgbaF, 128, w, h, buf.as_raw(), 4, put_f32)
        }
        other => {
            let buf = other.to_rgba32f();
            from_samples(ImageType::RgbaF, 128, w, h, buf.as_raw(), 4, put_f32)
        }
    }
}

/// The `image` crate's own allocation caps, narrowed by `limits`.
fn image_limits(limits: &Limits) -> image::Limits {
    let narrow = |ours: Option<u64>| ours.map(|v| u32::try_from(v).unwrap_or(u32::MAX));
    let mut out = image::Limits::default();
    out.max_image_width = narrow(limits.max_width);
    out.max_image_height = narrow(limits.max_height);
    if let Some(bytes) = limits.max_memory_bytes {
        out.max_alloc = Some(bytes);
    }
    out
}

fn decode_image(
    format: image::ImageFormat,
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<CodecImage, CodecError> {
    let mut reader = ImageReader::with_format(Cursor::new(data), format);
    if let Some(limits) = limits {
        reader.limits(image_limits(limits));
    }
    let decoder = reader.into_decoder()?;
    if let Some(limits) = limits {
        let (w, h) = decoder.dimensions();
        limits.check_dimensions(w, h)?;
        limits.check_alloc(decoder.total_bytes())?;
    }
    let img = DynamicImage::from_decoder(decoder)?;
    from_dynamic(img)
}

struct ExrPixels {
    width: usize,
    has_alpha: bool,
    samples: Vec<f32>,
}

fn decode_exr(data: &[u8], limits: Option<&Limits>) -> Result<CodecImage, CodecError> {
    use exr::prelude::*;

    if let Some(limits) = limits {
        let meta = exr::meta::MetaData::read_from_buffered(Cursor::new(data), false)?;
        for header in meta.headers.iter() {
            let size = header.layer_size;
            let w = u32::try_from(size.width()).unwrap_or(u32::MAX);
            let h = u32::try_from(size.height()).unwrap_or(u32::MAX);
            limits.check_dimensions(w, h)?;
            // samples are read as four f32 per pixel
            limits.check_alloc((size.area() as u64).saturating_mul(16))?;
        }
    }

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, channels| ExrPixels {
                width: resolution.width(),
                has_alpha: channels.3.is_some(),
                samples: vec![0.0; resolution.area() * 4],
            },
            |pixels: &mut ExrPixels, pos: Vec2<usize>, (r, g, b, a): (f32, f32, f32, f32)| {
                let i = (pos.y() * pixels.width + pos.x()) * 4;
                pixels.samples[i..i + 4].copy_from_slice(&[r, g, b, a]);
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_buffered(Cursor::new(data))?;

    let size = image.layer_data.size;
    let (w, h) = (
        u32::try_from(size.width()).map_err(|_| CodecError::Decode("EXR too wide".into()))?,
        u32::try_from(size.height()).map_err(|_| CodecError::Decode("EXR too tall".into()))?,
    );
    let pixels = image.layer_data.channel_data.pixels;
    if pixels.has_alpha {
        from_samples(ImageType::RgbaF, 128, w, h, &pixels.samples, 4, put_f32)
    } else {
        from_samples(ImageType::RgbF, 96, w, h, &pixels.samples, 4, |p, d| {
            put_f32(&p[..3], d);
        })
    }
}

// ── encode ──────────────────────────────────────────────────────────

/// Read float sample `c` of pixel `x` in picture row `y` (top-down).
fn float_at(image: &CodecImage, x: usize, y: usize, c: usize) -> f32 {
    let channels = if image.image_type() == ImageType::RgbaF { 4 } else { 3 };
    let row = image.scanline(image.height() - 1 - y as u32);
    let i = (x * channels + c) * 4;
    f32::from_ne_bytes([row[i], row[i + 1], row[i + 2], row[i + 3]])
}

fn encode_exr(image: &CodecImage, options: &EncodeOptions, path: &Path) -> Result<(), CodecError> {
    use exr::prelude::*;
    use half::f16;

    let (compression, half) = match *options {
        EncodeOptions::Exr { compression, half } => (compression, half),
        _ => (ExrCompression::Piz, true),
    };
    let encoding = Encoding {
        compression: match compression {
            ExrCompression::None => Compression::Uncompressed,
            ExrCompression::Piz => Compression::PIZ,
            ExrCompression::B44 => Compression::B44,
        },
        ..Encoding::UNCOMPRESSED
    };
    let size = (image.width() as usize, image.height() as usize);
    let px = |p: Vec2<usize>, c| float_at(image, p.x(), p.y(), c);

    let result = match (image.image_type(), half) {
        (ImageType::RgbaF, true) => {
            let channels = SpecificChannels::rgba(|p: Vec2<usize>| {
                (
                    f16::from_f32(px(p, 0)),
                    f16::from_f32(px(p, 1)),
                    f16::from_f32(px(p, 2)),
                    f16::from_f32(px(p, 3)),
                )
            });
            let layer = Layer::new(size, LayerAttributes::named("main"), encoding, channels);
            Image::from_layer(layer).write().to_file(path)
        }
        (ImageType::RgbaF, false) => {
            let channels = SpecificChannels::rgba(|p: Vec2<usize>| {
                (px(p, 0), px(p, 1), px(p, 2), px(p, 3))
            });
            let layer = Layer::new(size, LayerAttributes::named("main"), encoding, channels);
            Image::from_layer(layer).write().to_file(path)
        }
        (ImageType::RgbF, true) => {
            let channels = SpecificChannels::rgb(|p: Vec2<usize>| {
                (
                    f16::from_f32(px(p, 0)),
                    f16::from_f32(px(p, 1)),
                    f16::from_f32(px(p, 2)),
                )
            });
            let layer = Layer::new(size, LayerAttributes::named("main"), encoding, channels);
            Image::from_layer(layer).write().to_file(path)
        }
        (ImageType::RgbF, false) => {
            let channels =
                SpecificChannels::rgb(|p: Vec2<usize>| (px(p, 0), px(p, 1), px(p, 2)));
            let layer = Layer::new(size, LayerAttributes::named("main"), encoding, channels);
            Image::from_layer(layer).write().to_file(path)
        }
        (kind, _) => {
            return Err(CodecError::UnsupportedLayout {
                kind,
                bpp: image.bpp(),
                format: "EXR",
            });
        }
    };
    result.map_err(|e| CodecError::Encode(e.to_string()))
}

/// Repack a codec image as top-down samples the `image` encoders accept.
fn to_interleaved(image: &CodecImage) -> Result<(Vec<u8>, ExtendedColorType), CodecError> {
    let expanded;
    let image = if image.color_type() == ColorType::Palette || matches!(image.bpp(), 1 | 2 | 4) {
        expanded = image.convert_to_32bits()?;
        &expanded
    } else {
        image
    };

    let color = match (image.image_type(), image.bpp()) {
        (ImageType::Bitmap, 8) => ExtendedColorType::L8,
        (ImageType::Bitmap, 24) => ExtendedColorType::Rgb8,
        (ImageType::Bitmap, 32) => ExtendedColorType::Rgba8,
        (ImageType::Uint16, _) => ExtendedColorType::L16,
        (ImageType::Rgb16, _) => ExtendedColorType::Rgb16,
        (ImageType::Rgba16, _) => ExtendedColorType::Rgba16,
        (kind, bpp) => {
            return Err(CodecError::UnsupportedLayout {
                kind,
                bpp,
                format: "an 8/16-bit raster",
            });
        }
    };

    let line = image.line_bytes();
    let mut out = Vec::with_capacity(line * image.height() as usize);
    for r in 0..image.height() {
        let src = image.scanline(image.height() - 1 - r);
        match color {
            ExtendedColorType::Rgb8 => {
                for p in src.chunks_exact(3) {
                    out.extend_from_slice(&[p[2], p[1], p[0]]);
                }
            }
            ExtendedColorType::Rgba8 => {
                for p in src.chunks_exact(4) {
                    out.extend_from_slice(&[p[2], p[1], p[0], p[3]]);
                }
            }
            _ => out.extend_from_slice(src),
        }
    }
    Ok((out, color))
}

fn encode_ldr(
    format: CodecFormat,
    image: &CodecImage,
    options: &EncodeOptions,
    path: &Path,
) -> Result<(), CodecError> {
    let (buf, color) = to_interleaved(image)?;
    let (w, h) = (image.width(), image.height());

    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        CodecFormat::Png => {
            let compression = match options {
                EncodeOptions::Png {
                    compression: PngCompression::None,
                } => png::CompressionType::Uncompressed,
                _ => png::CompressionType::Best,
            };
            PngEncoder::new_with_quality(&mut writer, compression, png::FilterType::Adaptive)
                .write_image(&buf, w, h, color)?;
        }
        CodecFormat::Jpeg => {
            // chroma_444 needs no handling: this encoder samples every
            // component at 1x1
            let quality = match options {
                EncodeOptions::Jpeg { quality, .. } => (*quality).clamp(1, 100),
                _ => 75,
            };
            JpegEncoder::new_with_quality(&mut writer, quality).write_image(&buf, w, h, color)?;
        }
        CodecFormat::Tga => TgaEncoder::new(&mut writer).write_image(&buf, w, h, color)?,
        CodecFormat::Bmp => BmpEncoder::new(&mut writer).write_image(&buf, w, h, color)?,
        other => {
            return Err(CodecError::Encode(format!(
                "{} is not an 8-bit container",
                other.name()
            )));
        }
    }
    writer.flush()?;
    Ok(())
}
