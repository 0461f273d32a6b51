use bitflags::bitflags;

bitflags! {
    /// Options applied while decoding a file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImportFlags: u32 {
        /// Store 96/128 bpp float images as RGBA half floats.
        const CONVERT_TO_FLOAT16 = 1 << 0;
    }
}

bitflags! {
    /// Options applied while encoding a file.
    ///
    /// `UNCOMPRESSED` and `LOSSY` are mutually exclusive, and `EXR_FLOAT16`
    /// is only valid together with `UNCOMPRESSED` for EXR output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExportFlags: u32 {
        const UNCOMPRESSED = 1 << 0;
        const LOSSY        = 1 << 1;
        const EXPORT_ALPHA = 1 << 2;
        const EXR_FLOAT16  = 1 << 3;
    }
}
