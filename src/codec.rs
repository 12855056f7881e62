//! Single-row codecs between packed formats and [`Argb`].
//!
//! Decoding never changes the alpha interpretation: a premultiplied source
//! decodes to premultiplied components. Channels the format does not store
//! are synthesised (alpha as 255, colour as white); channels the
//! destination does not store are dropped on encode.

use crate::argb::Argb;
use crate::channel::channel_offset;
use crate::format::{PixelChannel, PixelFormat};

/// Byte positions of each channel in an 8-bit interleaved format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ByteLayout {
    bpp: usize,
    r: Option<usize>,
    g: Option<usize>,
    b: Option<usize>,
    a: Option<usize>,
}

impl ByteLayout {
    fn resolve(format: PixelFormat) -> Self {
        let at = |channel| channel_offset(format, channel).byte();
        Self {
            bpp: format.bytes_per_pixel(),
            r: at(PixelChannel::RED),
            g: at(PixelChannel::GREEN),
            b: at(PixelChannel::BLUE),
            a: at(PixelChannel::ALPHA),
        }
    }
}

/// Row codec for one non-planar format, resolved once per conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Codec {
    Bytes(ByteLayout),
    Argb4444,
    Rgb565,
    Luma,
    LumaAlpha,
    Float { alpha: bool },
}

impl Codec {
    /// The codec for `format`, or `None` for planar and GPU-only formats.
    pub(crate) fn for_format(format: PixelFormat) -> Option<Self> {
        Some(match format {
            PixelFormat::Rgb
            | PixelFormat::Bgra
            | PixelFormat::BgrPremA
            | PixelFormat::RgbPremA
            | PixelFormat::Rgba
            | PixelFormat::Alpha => Self::Bytes(ByteLayout::resolve(format)),
            PixelFormat::Argb4444 => Self::Argb4444,
            PixelFormat::Rgb565 => Self::Rgb565,
            PixelFormat::Luma => Self::Luma,
            PixelFormat::LumaAlpha => Self::LumaAlpha,
            PixelFormat::Rgb32f => Self::Float { alpha: false },
            PixelFormat::Rgba32f => Self::Float { alpha: true },
            PixelFormat::Yuv420sp
            | PixelFormat::Nv12
            | PixelFormat::Ect
            | PixelFormat::Oes
            | PixelFormat::RenderBuffer => return None,
        })
    }

    pub(crate) fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Bytes(layout) => layout.bpp,
            Self::Argb4444 | Self::Rgb565 | Self::LumaAlpha => 2,
            Self::Luma => 1,
            Self::Float { alpha: false } => 12,
            Self::Float { alpha: true } => 16,
        }
    }

    /// Decode `out.len()` pixels from the front of `src`.
    pub(crate) fn decode_row(&self, src: &[u8], out: &mut [Argb]) {
        let pixels = src.chunks_exact(self.bytes_per_pixel()).zip(out.iter_mut());
        match *self {
            Self::Bytes(l) => {
                let get = |px: &[u8], at: Option<usize>| at.map_or(255, |i| px[i]);
                for (px, o) in pixels {
                    *o = Argb::new(get(px, l.r), get(px, l.g), get(px, l.b), get(px, l.a));
                }
            }
            Self::Argb4444 => {
                for (px, o) in pixels {
                    let v = u16::from_ne_bytes([px[0], px[1]]);
                    let n = |shift: u16| ((v >> shift) & 0xf) as u8 * 17;
                    *o = Argb::new(n(8), n(4), n(0), n(12));
                }
            }
            Self::Rgb565 => {
                for (px, o) in pixels {
                    let v = u16::from_ne_bytes([px[0], px[1]]);
                    let r = ((v >> 11) & 0x1f) as u8;
                    let g = ((v >> 5) & 0x3f) as u8;
                    let b = (v & 0x1f) as u8;
                    *o = Argb::new(r << 3 | r >> 2, g << 2 | g >> 4, b << 3 | b >> 2, 255);
                }
            }
            Self::Luma => {
                for (px, o) in pixels {
                    *o = Argb::new(px[0], px[0], px[0], 255);
                }
            }
            Self::LumaAlpha => {
                for (px, o) in pixels {
                    *o = Argb::new(px[0], px[0], px[0], px[1]);
                }
            }
            Self::Float { alpha } => {
                for (px, o) in pixels {
                    let c = |i: usize| unit_to_u8(read_f32(&px[i * 4..]));
                    *o = Argb::new(c(0), c(1), c(2), if alpha { c(3) } else { 255 });
                }
            }
        }
    }

    /// Encode `row` into the front of `dst`.
    pub(crate) fn encode_row(&self, row: &[Argb], dst: &mut [u8]) {
        let pixels = dst.chunks_exact_mut(self.bytes_per_pixel()).zip(row.iter());
        match *self {
            Self::Bytes(l) => {
                let put = |px: &mut [u8], at: Option<usize>, v: u8| {
                    if let Some(i) = at {
                        px[i] = v;
                    }
                };
                for (px, c) in pixels {
                    put(px, l.r, c.r);
                    put(px, l.g, c.g);
                    put(px, l.b, c.b);
                    put(px, l.a, c.a);
                }
            }
            Self::Argb4444 => {
                for (px, c) in pixels {
                    let n = |v: u8| reduce(v, 15);
                    let v = n(c.a) << 12 | n(c.r) << 8 | n(c.g) << 4 | n(c.b);
                    px.copy_from_slice(&v.to_ne_bytes());
                }
            }
            Self::Rgb565 => {
                for (px, c) in pixels {
                    let v = reduce(c.r, 31) << 11 | reduce(c.g, 63) << 5 | reduce(c.b, 31);
                    px.copy_from_slice(&v.to_ne_bytes());
                }
            }
            Self::Luma => {
                for (px, c) in pixels {
                    px[0] = c.luma();
                }
            }
            Self::LumaAlpha => {
                for (px, c) in pixels {
                    px[0] = c.luma();
                    px[1] = c.a;
                }
            }
            Self::Float { alpha } => {
                for (px, c) in pixels {
                    px[0..4].copy_from_slice(&u8_to_unit(c.r).to_ne_bytes());
                    px[4..8].copy_from_slice(&u8_to_unit(c.g).to_ne_bytes());
                    px[8..12].copy_from_slice(&u8_to_unit(c.b).to_ne_bytes());
                    if alpha {
                        px[12..16].copy_from_slice(&u8_to_unit(c.a).to_ne_bytes());
                    }
                }
            }
        }
    }
}

/// Scale an 8-bit value down to `0..=max`, rounding to nearest.
#[inline]
fn reduce(v: u8, max: u16) -> u16 {
    (v as u16 * max + 127) / 255
}

#[inline]
fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    // NaN saturates to 0 through the cast.
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[inline]
fn u8_to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn decode(format: PixelFormat, bytes: &[u8]) -> Vec<Argb> {
        let codec = Codec::for_format(format).unwrap();
        let mut out = vec![Argb::TRANSPARENT; bytes.len() / codec.bytes_per_pixel()];
        codec.decode_row(bytes, &mut out);
        out
    }

    fn encode(format: PixelFormat, row: &[Argb]) -> Vec<u8> {
        let codec = Codec::for_format(format).unwrap();
        let mut out = vec![0u8; row.len() * codec.bytes_per_pixel()];
        codec.encode_row(row, &mut out);
        out
    }

    #[test]
    fn codec_sizes_match_registry() {
        for format in PixelFormat::ALL {
            if let Some(codec) = Codec::for_format(format) {
                assert_eq!(codec.bytes_per_pixel(), format.bytes_per_pixel());
            }
        }
    }

    #[test]
    fn planar_and_gpu_formats_have_no_row_codec() {
        for format in [
            PixelFormat::Nv12,
            PixelFormat::Yuv420sp,
            PixelFormat::Ect,
            PixelFormat::Oes,
            PixelFormat::RenderBuffer,
        ] {
            assert!(Codec::for_format(format).is_none());
        }
    }

    #[test]
    fn byte_formats_follow_channel_offsets() {
        let px = [Argb::new(1, 2, 3, 4)];
        assert_eq!(encode(PixelFormat::Rgba, &px), [1, 2, 3, 4]);
        assert_eq!(encode(PixelFormat::Bgra, &px), [3, 2, 1, 4]);
        assert_eq!(encode(PixelFormat::Rgb, &px), [1, 2, 3]);
        assert_eq!(encode(PixelFormat::Alpha, &px), [4]);
        assert_eq!(decode(PixelFormat::Bgra, &[3, 2, 1, 4]), px);
    }

    #[test]
    fn missing_channels_are_synthesised() {
        assert_eq!(decode(PixelFormat::Rgb, &[1, 2, 3]), [Argb::new(1, 2, 3, 255)]);
        assert_eq!(decode(PixelFormat::Alpha, &[9]), [Argb::new(255, 255, 255, 9)]);
    }

    #[test]
    fn argb4444_layout() {
        let v: u16 = 0xf84c;
        let px = decode(PixelFormat::Argb4444, &v.to_ne_bytes());
        assert_eq!(px, [Argb::new(0x88, 0x44, 0xcc, 0xff)]);
        assert_eq!(encode(PixelFormat::Argb4444, &px), v.to_ne_bytes());
    }

    #[test]
    fn argb4444_rounds_to_nearest() {
        // 0x88 = 136 is exactly 8 * 17; 0x80 = 128 is closest to 8 * 17 too.
        let out = encode(PixelFormat::Argb4444, &[Argb::new(0x80, 0, 0, 0)]);
        assert_eq!(u16::from_ne_bytes([out[0], out[1]]), 0x0800);
    }

    #[test]
    fn rgb565_extremes() {
        let white = encode(PixelFormat::Rgb565, &[Argb::WHITE]);
        assert_eq!(u16::from_ne_bytes([white[0], white[1]]), 0xffff);
        assert_eq!(decode(PixelFormat::Rgb565, &white), [Argb::WHITE]);

        let red = 0xf800u16.to_ne_bytes();
        assert_eq!(decode(PixelFormat::Rgb565, &red), [Argb::new(255, 0, 0, 255)]);

        let green = 0x07e0u16.to_ne_bytes();
        assert_eq!(decode(PixelFormat::Rgb565, &green), [Argb::new(0, 255, 0, 255)]);
    }

    #[test]
    fn rgb565_expanded_values_survive() {
        for r5 in 0u16..32 {
            let v = r5 << 11;
            let px = decode(PixelFormat::Rgb565, &v.to_ne_bytes());
            assert_eq!(encode(PixelFormat::Rgb565, &px), v.to_ne_bytes());
        }
    }

    #[test]
    fn luma_formats() {
        assert_eq!(decode(PixelFormat::Luma, &[77]), [Argb::new(77, 77, 77, 255)]);
        assert_eq!(encode(PixelFormat::Luma, &[Argb::new(0, 200, 0, 255)]), [100]);
        assert_eq!(
            decode(PixelFormat::LumaAlpha, &[10, 20]),
            [Argb::new(10, 10, 10, 20)]
        );
        assert_eq!(encode(PixelFormat::LumaAlpha, &[Argb::WHITE.with_alpha(3)]), [255, 3]);
    }

    #[test]
    fn float_formats() {
        let mut bytes = Vec::new();
        for v in [1.0f32, 0.5, -3.0, f32::NAN] {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        assert_eq!(
            decode(PixelFormat::Rgba32f, &bytes),
            [Argb::new(255, 128, 0, 0)]
        );
        assert_eq!(
            decode(PixelFormat::Rgb32f, &bytes[..12]),
            [Argb::new(255, 128, 0, 255)]
        );

        let row = [Argb::new(0, 51, 255, 102)];
        let out = encode(PixelFormat::Rgba32f, &row);
        assert_eq!(read_f32(&out[0..]), 0.0);
        assert!((read_f32(&out[4..]) - 0.2).abs() < 1e-6);
        assert_eq!(read_f32(&out[8..]), 1.0);
        assert_eq!(decode(PixelFormat::Rgba32f, &out), row);
    }
}
