//! Canonical 32-bit pixel value.
//!
//! [`Argb`] stores four 8-bit components. The packed integer view is
//! `0xAARRGGBB`; [`pack`] and [`unpack`] convert between the two views.
//! Stored little-endian, the packed value has the byte layout of
//! [`PixelFormat::NATIVE`](crate::PixelFormat::NATIVE).

use rgb::alt::BGRA;
use rgb::Rgba;

/// Pack components into `0xAARRGGBB`.
#[inline]
pub const fn pack(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split `0xAARRGGBB` into `(r, g, b, a)`.
#[inline]
pub const fn unpack(value: u32) -> (u8, u8, u8, u8) {
    (
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
        (value >> 24) as u8,
    )
}

/// A pixel with 8-bit red, green, blue and alpha components.
///
/// Components are `u8`, so every value is within 0..=255 by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Argb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (coverage); 255 is opaque.
    pub a: u8,
}

impl Argb {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// From individual components.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// From a packed `0xAARRGGBB` value.
    #[inline]
    pub const fn from_packed(value: u32) -> Self {
        let (r, g, b, a) = unpack(value);
        Self { r, g, b, a }
    }

    /// From a `0xRRGGBB` colour and an alpha byte. Bits above 24 of `rgb`
    /// are ignored.
    #[inline]
    pub const fn from_rgb_alpha(rgb: u32, alpha: u8) -> Self {
        Self::from_packed((rgb & 0x00ff_ffff) | (alpha as u32) << 24)
    }

    /// From a `0xRRGGBB` colour and an alpha in 0.0..=1.0.
    ///
    /// Alpha maps to `255.9 * alpha` truncated, then clamped to 0..=255.
    pub fn from_rgb_alpha_f32(rgb: u32, alpha: f32) -> Self {
        let a = (255.9 * alpha) as i32;
        Self::from_rgb_alpha(rgb, a.clamp(0, 255) as u8)
    }

    /// Packed `0xAARRGGBB` value.
    #[inline]
    pub const fn to_packed(self) -> u32 {
        pack(self.r, self.g, self.b, self.a)
    }

    /// Replace all four components from a packed value.
    #[inline]
    pub fn set_packed(&mut self, value: u32) {
        *self = Self::from_packed(value);
    }

    /// Replace the colour from `0xRRGGBB` and make the pixel opaque.
    #[inline]
    pub fn set_rgb(&mut self, rgb: u32) {
        self.set_packed(rgb | 0xff00_0000);
    }

    /// Bytes in [`PixelFormat::NATIVE`](crate::PixelFormat::NATIVE) order.
    #[inline]
    pub const fn to_native_bytes(self) -> [u8; 4] {
        self.to_packed().to_le_bytes()
    }

    /// Read a pixel stored in [`PixelFormat::NATIVE`](crate::PixelFormat::NATIVE) order.
    #[inline]
    pub const fn from_native_bytes(bytes: [u8; 4]) -> Self {
        Self::from_packed(u32::from_le_bytes(bytes))
    }

    #[inline]
    pub fn red_f32(self) -> f32 {
        self.r as f32 / 255.0
    }

    #[inline]
    pub fn green_f32(self) -> f32 {
        self.g as f32 / 255.0
    }

    #[inline]
    pub fn blue_f32(self) -> f32 {
        self.b as f32 / 255.0
    }

    #[inline]
    pub fn alpha_f32(self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Approximate perceptual brightness, green counted twice:
    /// `(r + 2g + b + 2) / 4`.
    #[inline]
    pub const fn luma(self) -> u8 {
        ((self.r as u32 + ((self.g as u32) << 1) + self.b as u32 + 2) >> 2) as u8
    }

    /// The same colour with its alpha replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<u32> for Argb {
    fn from(value: u32) -> Self {
        Self::from_packed(value)
    }
}

impl From<Argb> for u32 {
    fn from(px: Argb) -> Self {
        px.to_packed()
    }
}

impl From<Rgba<u8>> for Argb {
    fn from(px: Rgba<u8>) -> Self {
        Self::new(px.r, px.g, px.b, px.a)
    }
}

impl From<Argb> for Rgba<u8> {
    fn from(px: Argb) -> Self {
        Rgba {
            r: px.r,
            g: px.g,
            b: px.b,
            a: px.a,
        }
    }
}

impl From<BGRA<u8>> for Argb {
    fn from(px: BGRA<u8>) -> Self {
        Self::new(px.r, px.g, px.b, px.a)
    }
}

impl From<Argb> for BGRA<u8> {
    fn from(px: Argb) -> Self {
        BGRA {
            b: px.b,
            g: px.g,
            r: px.r,
            a: px.a,
        }
    }
}
