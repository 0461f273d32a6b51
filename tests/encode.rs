//! Encoder preconditions, flag validation and advisory warnings.

use std::path::Path;

use bitmap_io::*;

fn rgba32f(w: u32, h: u32) -> Vec<u8> {
    (0..w * h * 4)
        .flat_map(|i| (i as f32 * 0.25).to_ne_bytes())
        .collect()
}

fn save(
    path: &Path,
    format: FileFormat,
    flags: ExportFlags,
    resource: ResourceFormat,
    data: &[u8],
) -> Result<Vec<ExportWarning>, BitmapError> {
    EncodeRequest::new(format)
        .flags(flags)
        .encode(path, 2, 2, resource, data)
}

#[test]
fn uncompressed_and_lossy_always_fail() {
    let dir = tempfile::tempdir().unwrap();
    let data = rgba32f(2, 2);
    for format in FileFormat::ALL {
        let path = dir.path().join(format!("x.{}", format.extension()));
        let err = save(
            &path,
            format,
            ExportFlags::UNCOMPRESSED | ExportFlags::LOSSY,
            ResourceFormat::Rgba32Float,
            &data,
        )
        .unwrap_err();
        if format == FileFormat::Dds {
            assert!(matches!(err, BitmapError::DdsNotSupported));
        } else {
            assert!(matches!(err, BitmapError::IncompatibleFlags(_)), "{format:?}: {err}");
        }
        assert!(!path.exists());
    }
}

#[test]
fn exr_float16_needs_uncompressed_exr() {
    let dir = tempfile::tempdir().unwrap();
    let data = rgba32f(2, 2);

    let path = dir.path().join("a.exr");
    let err = save(
        &path,
        FileFormat::Exr,
        ExportFlags::EXR_FLOAT16,
        ResourceFormat::Rgba32Float,
        &data,
    )
    .unwrap_err();
    assert!(matches!(err, BitmapError::IncompatibleFlags(_)));
    assert!(!path.exists());

    let path = dir.path().join("a.pfm");
    let err = save(
        &path,
        FileFormat::Pfm,
        ExportFlags::EXR_FLOAT16 | ExportFlags::UNCOMPRESSED,
        ResourceFormat::Rgba32Float,
        &data,
    )
    .unwrap_err();
    assert!(matches!(err, BitmapError::IncompatibleFlags(_)));

    let path = dir.path().join("ok.exr");
    save(
        &path,
        FileFormat::Exr,
        ExportFlags::EXR_FLOAT16 | ExportFlags::UNCOMPRESSED,
        ResourceFormat::Rgba32Float,
        &data,
    )
    .unwrap();
    assert!(path.exists());
}

#[test]
fn pfm_rejects_lossy_and_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.pfm");
    let data = rgba32f(2, 2);
    for flags in [ExportFlags::LOSSY, ExportFlags::EXPORT_ALPHA] {
        let err = save(&path, FileFormat::Pfm, flags, ResourceFormat::Rgba32Float, &data)
            .unwrap_err();
        assert!(matches!(err, BitmapError::IncompatibleFlags(_)), "{flags:?}");
        assert!(!path.exists());
    }
}

#[test]
fn dds_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = save(
        &dir.path().join("x.dds"),
        FileFormat::Dds,
        ExportFlags::empty(),
        ResourceFormat::Bgra8Unorm,
        &[0; 16],
    )
    .unwrap_err();
    assert!(matches!(err, BitmapError::DdsNotSupported));
}

#[test]
fn empty_and_short_buffers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.png");
    assert!(matches!(
        save(&path, FileFormat::Png, ExportFlags::empty(), ResourceFormat::Bgra8Unorm, &[]),
        Err(BitmapError::EmptyData)
    ));
    assert!(matches!(
        save(&path, FileFormat::Png, ExportFlags::empty(), ResourceFormat::Bgra8Unorm, &[0; 15]),
        Err(BitmapError::BufferTooSmall {
            needed: 16,
            actual: 15
        })
    ));
    assert!(matches!(
        EncodeRequest::new(FileFormat::Png).encode(
            &path,
            0,
            2,
            ResourceFormat::Bgra8Unorm,
            &[0; 16]
        ),
        Err(BitmapError::EmptyData)
    ));
    assert!(!path.exists());
}

#[test]
fn hdr_needs_float_or_convertible_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.exr");
    for format in [
        ResourceFormat::Rgba8Unorm,
        ResourceFormat::Rgba16Unorm,
        ResourceFormat::Rg32Float,
        ResourceFormat::Bc6hU16,
    ] {
        let err = save(&path, FileFormat::Exr, ExportFlags::empty(), format, &[0; 64]).unwrap_err();
        assert!(matches!(err, BitmapError::UnsupportedFormat(_)), "{format:?}");
    }
    assert!(!path.exists());
}

#[test]
fn exr_alpha_needs_four_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.exr");
    let err = save(
        &path,
        FileFormat::Exr,
        ExportFlags::EXPORT_ALPHA,
        ResourceFormat::Rgb32Float,
        &[0; 48],
    )
    .unwrap_err();
    assert!(matches!(err, BitmapError::UnsupportedFormat(_)));

    // integer sources are widened to RGBA first, so alpha is available
    save(
        &path,
        FileFormat::Exr,
        ExportFlags::EXPORT_ALPHA,
        ResourceFormat::Rg16Uint,
        &[0; 16],
    )
    .unwrap();
    assert!(path.exists());
}

#[test]
fn ldr_needs_8bit_one_or_four_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.png");
    for format in [
        ResourceFormat::Rgba16Float,
        ResourceFormat::Rg8Unorm,
        ResourceFormat::Rgb10A2Unorm,
        ResourceFormat::Bc1Unorm,
    ] {
        let err = save(&path, FileFormat::Png, ExportFlags::empty(), format, &[0; 64]).unwrap_err();
        assert!(matches!(err, BitmapError::UnsupportedFormat(_)), "{format:?}");
    }
}

#[test]
fn advisory_warnings_still_write() {
    let dir = tempfile::tempdir().unwrap();
    let data = [0x40u8; 16];
    let cases = [
        (
            FileFormat::Jpeg,
            ExportFlags::EXPORT_ALPHA,
            vec![ExportWarning::AlphaNotSupported(FileFormat::Jpeg)],
        ),
        (
            FileFormat::Png,
            ExportFlags::LOSSY,
            vec![ExportWarning::LossyNotSupported(FileFormat::Png)],
        ),
        (
            FileFormat::Tga,
            ExportFlags::LOSSY,
            vec![ExportWarning::LossyNotSupported(FileFormat::Tga)],
        ),
        (
            FileFormat::Bmp,
            ExportFlags::LOSSY | ExportFlags::EXPORT_ALPHA,
            vec![
                ExportWarning::LossyNotSupported(FileFormat::Bmp),
                ExportWarning::AlphaNotSupported(FileFormat::Bmp),
            ],
        ),
        (FileFormat::Jpeg, ExportFlags::LOSSY, vec![]),
        (FileFormat::Png, ExportFlags::EXPORT_ALPHA, vec![]),
    ];
    for (i, (format, flags, expected)) in cases.into_iter().enumerate() {
        let path = dir.path().join(format!("{i}.{}", format.extension()));
        let warnings = save(&path, format, flags, ResourceFormat::Bgra8Unorm, &data).unwrap();
        assert_eq!(warnings, expected, "{format:?} {flags:?}");
        assert!(path.exists());
    }
}

#[test]
fn signed16_extremes_through_exr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sint.exr");
    let data: Vec<u8> = [i16::MIN, i16::MAX]
        .iter()
        .flat_map(|v| v.to_ne_bytes())
        .collect();

    EncodeRequest::new(FileFormat::Exr)
        .flags(ExportFlags::UNCOMPRESSED)
        .encode(&path, 2, 1, ResourceFormat::R16Sint, &data)
        .unwrap();

    let bitmap = decode(&path, true, ImportFlags::empty()).unwrap().unwrap();
    let floats: Vec<f32> = bitmap
        .data()
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(floats[0], -32768.0 / 32767.0);
    assert!(floats[0] < -1.0);
    assert_eq!(&floats[1..4], &[0.0, 0.0, 1.0]);
    assert_eq!(floats[4], 1.0);
}
