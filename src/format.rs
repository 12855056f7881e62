//! Pixel format registry.
//!
//! [`PixelFormat`] is the closed set of memory layouts the crate knows
//! about. Every variant carries static metadata ([`FormatInfo`]): bytes per
//! pixel, the channels it stores, and how its alpha is interpreted. The
//! tables are `const` and safe to read from any thread.

use bitflags::bitflags;

bitflags! {
    /// Channel query key, independent of any format.
    ///
    /// Also used as a channel set in [`FormatInfo::channels`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PixelChannel: u8 {
        const RED = 0x01;
        const GREEN = 0x02;
        const BLUE = 0x04;
        const ALPHA = 0x08;

        const RGB = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits();
        const RGBA = Self::RGB.bits() | Self::ALPHA.bits();
    }
}

/// Alpha channel interpretation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlphaMode {
    /// No stored alpha; every pixel is fully opaque.
    None = 0,
    /// Straight (unassociated) alpha.
    Straight = 1,
    /// Premultiplied (associated) alpha.
    Premultiplied = 2,
}

/// In-memory pixel layout.
///
/// Component order refers to byte layout in memory. Discriminants are
/// stable and start at 1; see [`PixelFormat::from_raw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PixelFormat {
    /// 3 bytes: R, G, B. Opaque.
    Rgb = 1,
    /// 4 bytes: B, G, R, A with straight alpha. `0xAARRGGBB` on little-endian.
    Bgra = 2,
    /// 4 bytes: B, G, R, A with B, G, R multiplied by A.
    BgrPremA = 3,
    /// 4 bytes: R, G, B, A with R, G, B multiplied by A.
    RgbPremA = 4,
    /// 4 bytes: R, G, B, A with straight alpha.
    Rgba = 5,
    /// 1 byte of coverage.
    Alpha = 6,
    /// 16-bit packed A, R, G, B nibbles.
    Argb4444 = 7,
    /// 16-bit packed 5-6-5 RGB.
    Rgb565 = 8,
    /// 1 byte of gray.
    Luma = 9,
    /// 2 bytes: gray, alpha.
    LumaAlpha = 10,
    /// ETC-compressed texture data. No CPU codec.
    Ect = 11,
    /// 3 x `f32`: R, G, B.
    Rgb32f = 12,
    /// 4 x `f32`: R, G, B, A.
    Rgba32f = 13,
    /// Semi-planar YUV 4:2:0 with interleaved V, U chroma (NV21).
    Yuv420sp = 14,
    /// Semi-planar YUV 4:2:0 with interleaved U, V chroma.
    Nv12 = 15,
    /// External (OES) texture. No CPU codec.
    Oes = 16,
    /// GPU render buffer. No CPU codec.
    RenderBuffer = 17,
}

/// Static per-format metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatInfo {
    /// Bytes per pixel in the primary plane; 0 when undefined.
    pub bytes_per_pixel: usize,
    /// Channels the format carries. Semi-planar formats report colour
    /// derived from their Y, U and V samples; those channels have no
    /// per-pixel location, so [`channel_offset`](crate::channel_offset)
    /// answers [`Absent`](crate::ChannelOffset::Absent) for them.
    pub channels: PixelChannel,
    /// Alpha interpretation.
    pub alpha: AlphaMode,
    /// Whether chroma lives in a second, subsampled plane.
    pub planar: bool,
}

impl FormatInfo {
    const fn new(bytes_per_pixel: usize, channels: PixelChannel, alpha: AlphaMode) -> Self {
        Self {
            bytes_per_pixel,
            channels,
            alpha,
            planar: false,
        }
    }

    // Colour is derived from luma and chroma, never stored per pixel.
    const fn planar() -> Self {
        Self {
            bytes_per_pixel: 1,
            channels: PixelChannel::RGB,
            alpha: AlphaMode::None,
            planar: true,
        }
    }

    const UNDEFINED: Self = Self::new(0, PixelChannel::empty(), AlphaMode::None);
}

impl PixelFormat {
    /// Every format, in discriminant order.
    pub const ALL: [PixelFormat; 17] = [
        Self::Rgb,
        Self::Bgra,
        Self::BgrPremA,
        Self::RgbPremA,
        Self::Rgba,
        Self::Alpha,
        Self::Argb4444,
        Self::Rgb565,
        Self::Luma,
        Self::LumaAlpha,
        Self::Ect,
        Self::Rgb32f,
        Self::Rgba32f,
        Self::Yuv420sp,
        Self::Nv12,
        Self::Oes,
        Self::RenderBuffer,
    ];

    /// The layout [`Argb::to_native_bytes`](crate::Argb::to_native_bytes) writes.
    pub const NATIVE: PixelFormat = Self::Bgra;

    /// Look up a format by its numeric code.
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Rgb),
            2 => Some(Self::Bgra),
            3 => Some(Self::BgrPremA),
            4 => Some(Self::RgbPremA),
            5 => Some(Self::Rgba),
            6 => Some(Self::Alpha),
            7 => Some(Self::Argb4444),
            8 => Some(Self::Rgb565),
            9 => Some(Self::Luma),
            10 => Some(Self::LumaAlpha),
            11 => Some(Self::Ect),
            12 => Some(Self::Rgb32f),
            13 => Some(Self::Rgba32f),
            14 => Some(Self::Yuv420sp),
            15 => Some(Self::Nv12),
            16 => Some(Self::Oes),
            17 => Some(Self::RenderBuffer),
            _ => None,
        }
    }

    /// Numeric code of this format.
    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Static metadata for this format.
    pub const fn info(self) -> FormatInfo {
        use AlphaMode::{None, Premultiplied, Straight};
        match self {
            Self::Rgb => FormatInfo::new(3, PixelChannel::RGB, None),
            Self::Bgra | Self::Rgba => FormatInfo::new(4, PixelChannel::RGBA, Straight),
            Self::BgrPremA | Self::RgbPremA => FormatInfo::new(4, PixelChannel::RGBA, Premultiplied),
            Self::Alpha => FormatInfo::new(1, PixelChannel::ALPHA, Straight),
            Self::Argb4444 => FormatInfo::new(2, PixelChannel::RGBA, Straight),
            Self::Rgb565 => FormatInfo::new(2, PixelChannel::RGB, None),
            Self::Luma => FormatInfo::new(1, PixelChannel::RGB, None),
            Self::LumaAlpha => FormatInfo::new(2, PixelChannel::RGBA, Straight),
            Self::Rgb32f => FormatInfo::new(12, PixelChannel::RGB, None),
            Self::Rgba32f => FormatInfo::new(16, PixelChannel::RGBA, Straight),
            Self::Yuv420sp | Self::Nv12 => FormatInfo::planar(),
            Self::Ect | Self::Oes | Self::RenderBuffer => FormatInfo::UNDEFINED,
        }
    }

    /// Bytes per pixel, or 0 for a format without a defined size.
    ///
    /// For semi-planar formats this is the size of one luma sample.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.info().bytes_per_pixel
    }

    /// Channels carried by this format, stored or (for semi-planar
    /// formats) derived. See [`FormatInfo::channels`].
    #[inline]
    pub const fn channels(self) -> PixelChannel {
        self.info().channels
    }

    /// Alpha interpretation.
    #[inline]
    pub const fn alpha_mode(self) -> AlphaMode {
        self.info().alpha
    }

    /// Whether a byte of alpha (or an alpha field) is physically stored.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        self.info().channels.contains(PixelChannel::ALPHA)
    }

    /// Whether colour channels are stored premultiplied by alpha.
    #[inline]
    pub const fn is_premultiplied(self) -> bool {
        matches!(self.info().alpha, AlphaMode::Premultiplied)
    }

    /// Whether chroma is stored in a second, half-resolution plane.
    #[inline]
    pub const fn is_planar(self) -> bool {
        self.info().planar
    }

    /// Whether the crate can decode and encode this format on the CPU.
    #[inline]
    pub const fn is_supported(self) -> bool {
        self.info().bytes_per_pixel != 0
    }

    /// Whether the format can be a software render target.
    #[inline]
    pub const fn is_render_target(self) -> bool {
        (self as u8) <= (Self::Alpha as u8)
    }

    /// Minimum byte stride for a row of `width` pixels.
    ///
    /// Semi-planar rows are rounded up to an even width so a chroma row
    /// (one U,V pair per two pixels) fits in the same stride.
    pub const fn min_stride(self, width: u32) -> Option<usize> {
        let w = if self.is_planar() {
            (width as usize + 1) & !1
        } else {
            width as usize
        };
        w.checked_mul(self.bytes_per_pixel())
    }
}

/// Bytes per pixel of `format`, or 0 if the format has no defined size.
#[inline]
pub const fn bytes_per_pixel(format: PixelFormat) -> usize {
    format.bytes_per_pixel()
}
