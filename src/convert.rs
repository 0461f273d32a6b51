//! Numeric conversions between integer, half-float and float pixel data.
//!
//! All functions are pure. Multi-byte samples are read and written in native
//! byte order, matching how GPU readbacks and codec buffers store them.

use half::f16;

use crate::format::{FormatType, ResourceFormat};

/// Convert an image of `format` into tightly packed RGBA `f32` samples.
///
/// - half floats are widened without scaling
/// - unsigned integers are divided by the type's maximum, giving `[0, 1]`
/// - signed integers are divided by the type's maximum (not `max + 1`), so
///   the most negative value lands slightly below `-1`
///
/// Missing channels are zero, except alpha which is `1.0` whenever the source
/// has fewer than four channels.
///
/// # Panics
///
/// If `format` is not [`ResourceFormat::is_convertible_to_rgba32_float`].
/// Callers check convertibility first.
pub fn convert_to_rgba32_float(
    format: ResourceFormat,
    width: u32,
    height: u32,
    src: &[u8],
) -> Vec<f32> {
    assert!(
        format.is_convertible_to_rgba32_float(),
        "{format:?} is not convertible to RGBA32 float"
    );

    let pixels = width as usize * height as usize;
    let channels = format.channel_count() as usize;

    let mut out = match (format.format_type(), format.channel_bits()) {
        (FormatType::Float, 16) => widen::<2>(pixels, channels, src, |b| {
            f16::from_bits(u16::from_ne_bytes(b)).to_f32()
        }),
        (FormatType::Uint, 16) => widen::<2>(pixels, channels, src, |b| {
            f32::from(u16::from_ne_bytes(b)) / f32::from(u16::MAX)
        }),
        (FormatType::Uint, 32) => widen::<4>(pixels, channels, src, |b| {
            u32::from_ne_bytes(b) as f32 / u32::MAX as f32
        }),
        (FormatType::Sint, 16) => widen::<2>(pixels, channels, src, |b| {
            f32::from(i16::from_ne_bytes(b)) / f32::from(i16::MAX)
        }),
        (FormatType::Sint, 32) => widen::<4>(pixels, channels, src, |b| {
            i32::from_ne_bytes(b) as f32 / i32::MAX as f32
        }),
        (ty, bits) => unreachable!("no RGBA32 float conversion for {ty:?} with {bits} bits"),
    };

    if channels < 4 {
        for px in out.chunks_exact_mut(4) {
            px[3] = 1.0;
        }
    }
    out
}

/// Spread `channels` samples of `N` bytes per pixel into four-wide `f32` pixels.
fn widen<const N: usize>(
    pixels: usize,
    channels: usize,
    src: &[u8],
    sample: impl Fn([u8; N]) -> f32,
) -> Vec<f32> {
    let mut out = vec![0.0f32; pixels * 4];
    for (dst, px) in out.chunks_exact_mut(4).zip(src.chunks_exact(channels * N)) {
        for (d, s) in dst.iter_mut().zip(px.chunks_exact(N)) {
            *d = sample(core::array::from_fn(|i| s[i]));
        }
    }
    out
}

/// Promote one row of RGB `f32` pixels to RGBA with alpha `1.0`.
///
/// Values are copied bit for bit; nothing is clamped, so HDR data above `1.0`
/// survives.
pub fn rgb32f_row_to_rgba32f(src: &[u8], dst: &mut [u8]) {
    let one = 1.0f32.to_ne_bytes();
    for (s, d) in src.chunks_exact(12).zip(dst.chunks_exact_mut(16)) {
        d[..12].copy_from_slice(s);
        d[12..].copy_from_slice(&one);
    }
}

/// Convert one row of RGB or RGBA `f32` pixels to RGBA half floats.
///
/// `channels` is 3 or 4; three-channel sources get alpha `1.0`.
pub fn float32_row_to_rgba16f(src: &[u8], channels: usize, dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(channels * 4).zip(dst.chunks_exact_mut(8)) {
        for c in 0..4 {
            let v = if c < channels {
                f32::from_ne_bytes(core::array::from_fn(|i| s[c * 4 + i]))
            } else {
                1.0
            };
            d[c * 2..c * 2 + 2].copy_from_slice(&f16::from_f32(v).to_bits().to_ne_bytes());
        }
    }
}

/// Drop alpha from one row of RGBA `f32` pixels.
pub fn rgba32f_row_to_rgb32f(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(16).zip(dst.chunks_exact_mut(12)) {
        d.copy_from_slice(&s[..12]);
    }
}

/// Reinterpret `f32` samples as native-endian bytes.
pub(crate) fn f32_to_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_u16(v: &[u16]) -> Vec<u8> {
        v.iter().flat_map(|x| x.to_ne_bytes()).collect()
    }

    #[test]
    fn signed16_extremes() {
        let src: Vec<u8> = [i16::MIN, i16::MAX, 0]
            .iter()
            .flat_map(|x| x.to_ne_bytes())
            .collect();
        let out = convert_to_rgba32_float(ResourceFormat::R16Sint, 3, 1, &src);
        assert_eq!(out[0], -32768.0 / 32767.0);
        assert!(out[0] < -1.0);
        assert_eq!(out[4], 1.0);
        assert_eq!(out[8], 0.0);
        // alpha defaults to one, missing colour channels to zero
        assert_eq!(&out[1..4], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn unsigned16_rgba_keeps_alpha() {
        let src = bytes_u16(&[0, 65535, 32768, 0]);
        let out = convert_to_rgba32_float(ResourceFormat::Rgba16Uint, 1, 1, &src);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
        assert!((out[2] - 0.500_007_6).abs() < 1e-6);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn unsigned32_scales_by_max() {
        let src: Vec<u8> = [u32::MAX, 0].iter().flat_map(|x| x.to_ne_bytes()).collect();
        let out = convert_to_rgba32_float(ResourceFormat::Rg32Uint, 1, 1, &src);
        assert_eq!(&out[..], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn signed32_scales_by_max() {
        let src: Vec<u8> = [i32::MAX, i32::MIN, 0, -i32::MAX]
            .iter()
            .flat_map(|x| x.to_ne_bytes())
            .collect();
        let out = convert_to_rgba32_float(ResourceFormat::Rgba32Sint, 1, 1, &src);
        assert_eq!(out[0], 1.0);
        assert!(out[1] <= -1.0);
        assert_eq!(out[2], 0.0);
        assert_eq!(out[3], -1.0);
    }

    #[test]
    fn half_is_not_rescaled() {
        let src = bytes_u16(&[
            f16::from_f32(4.5).to_bits(),
            f16::from_f32(-2.0).to_bits(),
            f16::from_f32(0.25).to_bits(),
            f16::from_f32(1.0).to_bits(),
        ]);
        let out = convert_to_rgba32_float(ResourceFormat::Rgba16Float, 1, 1, &src);
        assert_eq!(&out[..], &[4.5, -2.0, 0.25, 1.0]);
    }

    #[test]
    #[should_panic(expected = "not convertible")]
    fn rejects_unorm8() {
        convert_to_rgba32_float(ResourceFormat::Rgba8Unorm, 1, 1, &[0; 4]);
    }

    #[test]
    fn rgb_promotion_does_not_clamp() {
        let src = f32_to_bytes(&[7.25, -3.0, 1e6]);
        let mut dst = [0u8; 16];
        rgb32f_row_to_rgba32f(&src, &mut dst);
        let floats: Vec<f32> = dst
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, [7.25, -3.0, 1e6, 1.0]);
    }

    #[test]
    fn float_to_half_adds_alpha() {
        let src = f32_to_bytes(&[0.5, 2.0, -1.0]);
        let mut dst = [0u8; 8];
        float32_row_to_rgba16f(&src, 3, &mut dst);
        let halves: Vec<f32> = dst
            .chunks_exact(2)
            .map(|c| f16::from_bits(u16::from_ne_bytes([c[0], c[1]])).to_f32())
            .collect();
        assert_eq!(halves, [0.5, 2.0, -1.0, 1.0]);
    }
}
