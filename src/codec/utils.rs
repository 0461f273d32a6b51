//! Sub-byte sample expansion.
//!
//! Adapted from zune-bmp 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

/// Expand packed 1, 2, 4 or 8 bit samples (most significant first) to one
/// byte each.
///
/// When `plte_present` is true, output values are raw palette indices (scale=1).
/// When false, values are scaled to 0–255. `out` decides how many samples are
/// produced; trailing bits of the last input byte are ignored.
pub(crate) fn expand_bits_to_byte(depth: usize, plte_present: bool, input: &[u8], out: &mut [u8]) {
    if depth == 8 {
        let n = out.len().min(input.len());
        out[..n].copy_from_slice(&input[..n]);
        return;
    }

    let scale: u8 = match (plte_present, depth) {
        (true, 1 | 2 | 4) => 1,
        (false, 1) => 0xFF,
        (false, 2) => 0x55,
        (false, 4) => 0x11,
        _ => return,
    };

    let per_byte = 8 / depth;
    let mask = (1u8 << depth) - 1;
    for (chunk, &byte) in out.chunks_mut(per_byte).zip(input) {
        for (pos, o) in chunk.iter_mut().enumerate() {
            let shift = 8 - depth * (pos + 1);
            *o = scale.wrapping_mul((byte >> shift) & mask);
        }
    }
}
