//! Semi-planar YUV 4:2:0 rows.
//!
//! Luma is one byte per pixel. Chroma is one interleaved pair per 2x2 pixel
//! block, stored in a second plane with the same stride as the luma plane.
//! Conversion uses BT.601 limited-range integer coefficients.

use crate::argb::Argb;
use crate::format::PixelFormat;

/// Order of the two bytes in each chroma pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChromaOrder {
    /// U then V (NV12).
    Uv,
    /// V then U (NV21).
    Vu,
}

impl ChromaOrder {
    pub(crate) fn for_format(format: PixelFormat) -> Option<Self> {
        match format {
            PixelFormat::Nv12 => Some(Self::Uv),
            PixelFormat::Yuv420sp => Some(Self::Vu),
            _ => None,
        }
    }

    #[inline]
    fn split(self, pair: &[u8]) -> (u8, u8) {
        match self {
            Self::Uv => (pair[0], pair[1]),
            Self::Vu => (pair[1], pair[0]),
        }
    }

    #[inline]
    fn join(self, u: u8, v: u8) -> [u8; 2] {
        match self {
            Self::Uv => [u, v],
            Self::Vu => [v, u],
        }
    }
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Decode one pixel from its luma and chroma samples.
#[inline]
pub(crate) fn yuv_to_argb(y: u8, u: u8, v: u8) -> Argb {
    let c = 298 * (y as i32 - 16);
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    Argb::new(
        clamp_u8((c + 409 * e + 128) >> 8),
        clamp_u8((c - 100 * d - 208 * e + 128) >> 8),
        clamp_u8((c + 516 * d + 128) >> 8),
        255,
    )
}

#[inline]
pub(crate) fn luma_of(px: Argb) -> u8 {
    let (r, g, b) = (px.r as i32, px.g as i32, px.b as i32);
    clamp_u8(((66 * r + 129 * g + 25 * b + 128) >> 8) + 16)
}

#[inline]
pub(crate) fn chroma_of(r: i32, g: i32, b: i32) -> (u8, u8) {
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (clamp_u8(u), clamp_u8(v))
}

/// Decode a row from its luma row and the chroma row covering it.
pub(crate) fn decode_row(order: ChromaOrder, luma: &[u8], chroma: &[u8], out: &mut [Argb]) {
    for (x, (y, o)) in luma.iter().zip(out.iter_mut()).enumerate() {
        let (u, v) = order.split(&chroma[(x / 2) * 2..]);
        *o = yuv_to_argb(*y, u, v);
    }
}

/// Encode the luma samples of one row.
pub(crate) fn encode_luma_row(row: &[Argb], luma: &mut [u8]) {
    for (px, y) in row.iter().zip(luma.iter_mut()) {
        *y = luma_of(*px);
    }
}

/// Encode the chroma row for a pair of pixel rows.
///
/// Each pair is computed from the mean colour of its 2x2 block; blocks cut
/// by the right or bottom edge average only the pixels that exist.
pub(crate) fn encode_chroma_row(
    order: ChromaOrder,
    top: &[Argb],
    bottom: Option<&[Argb]>,
    chroma: &mut [u8],
) {
    for (bx, pair) in chroma.chunks_exact_mut(2).enumerate() {
        let x = bx * 2;
        if x >= top.len() {
            break;
        }
        let (mut r, mut g, mut b, mut n) = (0i32, 0i32, 0i32, 0i32);
        let rows = core::iter::once(top).chain(bottom);
        for row in rows {
            for px in &row[x..(x + 2).min(row.len())] {
                r += px.r as i32;
                g += px.g as i32;
                b += px.b as i32;
                n += 1;
            }
        }
        let (u, v) = chroma_of(
            (r + n / 2) / n,
            (g + n / 2) / n,
            (b + n / 2) / n,
        );
        pair.copy_from_slice(&order.join(u, v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_and_white_survive() {
        assert_eq!(luma_of(Argb::WHITE), 235);
        assert_eq!(luma_of(Argb::BLACK), 16);
        assert_eq!(chroma_of(255, 255, 255), (128, 128));
        assert_eq!(chroma_of(0, 0, 0), (128, 128));
        assert_eq!(yuv_to_argb(235, 128, 128), Argb::WHITE);
        assert_eq!(yuv_to_argb(16, 128, 128), Argb::BLACK);
    }

    #[test]
    fn out_of_range_samples_clamp() {
        assert_eq!(yuv_to_argb(255, 128, 128), Argb::WHITE);
        assert_eq!(yuv_to_argb(0, 128, 128), Argb::BLACK);
        let px = yuv_to_argb(128, 255, 0);
        assert_eq!(px.a, 255);
        assert_eq!(px.b, 255);
    }

    #[test]
    fn red_is_mostly_v() {
        let (u, v) = chroma_of(255, 0, 0);
        assert!(v > 200, "v = {v}");
        assert!(u < 128, "u = {u}");
        let px = yuv_to_argb(luma_of(Argb::new(255, 0, 0, 255)), u, v);
        assert!(px.r > 245 && px.g < 10 && px.b < 10, "{px:?}");
    }

    #[test]
    fn chroma_order() {
        assert_eq!(ChromaOrder::Uv.join(1, 2), [1, 2]);
        assert_eq!(ChromaOrder::Vu.join(1, 2), [2, 1]);
        assert_eq!(ChromaOrder::Vu.split(&[2, 1]), (1, 2));
        assert_eq!(ChromaOrder::for_format(PixelFormat::Nv12), Some(ChromaOrder::Uv));
        assert_eq!(ChromaOrder::for_format(PixelFormat::Rgba), None);
    }

    #[test]
    fn chroma_averages_the_block() {
        let top = [Argb::WHITE, Argb::BLACK, Argb::WHITE];
        let bottom = [Argb::BLACK, Argb::WHITE, Argb::WHITE];
        let mut chroma = [0u8; 4];
        encode_chroma_row(ChromaOrder::Uv, &top, Some(&bottom), &mut chroma);
        // Gray blocks carry neutral chroma.
        assert_eq!(chroma, [128, 128, 128, 128]);
    }

    #[test]
    fn decode_shares_chroma_across_pairs() {
        let luma = [100, 100, 100];
        let chroma = [90, 200, 160, 60];
        let mut out = [Argb::TRANSPARENT; 3];
        decode_row(ChromaOrder::Uv, &luma, &chroma, &mut out);
        assert_eq!(out[0], out[1]);
        assert_ne!(out[1], out[2]);
        assert_eq!(out[2], yuv_to_argb(100, 160, 60));
    }
}
