//! Channel offset resolution.
//!
//! Maps a (format, channel) pair to where that channel lives inside one
//! pixel. The conversion engine builds its per-format byte layouts from
//! these answers, so component order is never assumed from a format name.

use crate::format::{PixelChannel, PixelFormat};

/// Raw sentinel: alpha is not stored, but every pixel is fully opaque.
pub const CHANNEL_OFFSET_VIRTUAL_ALPHA: i32 = -1;
/// Raw sentinel: the channel does not exist in the format.
pub const CHANNEL_OFFSET_NONE: i32 = -2;

/// Location of one channel within a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelOffset {
    /// The channel is the byte (or first byte of the `f32`) at this offset.
    Byte(usize),
    /// The channel is a bit field of a native-endian `u16`.
    Packed {
        /// Position of the field's lowest bit.
        shift: u8,
        /// Field width in bits.
        bits: u8,
    },
    /// Alpha is not stored; it is implicitly 255.
    VirtualAlpha,
    /// The channel has no meaning for the format.
    Absent,
}

impl ChannelOffset {
    /// Integer form: a non-negative byte offset or one of the two sentinels.
    ///
    /// A packed field reports the byte of its native-endian `u16` that
    /// holds the field's lowest bit, so the answer depends on the target's
    /// byte order.
    pub const fn raw(self) -> i32 {
        match self {
            Self::Byte(offset) => offset as i32,
            Self::Packed { shift, .. } => packed_byte(shift) as i32,
            Self::VirtualAlpha => CHANNEL_OFFSET_VIRTUAL_ALPHA,
            Self::Absent => CHANNEL_OFFSET_NONE,
        }
    }

    /// The byte offset, if the channel is byte-addressable.
    #[inline]
    pub const fn byte(self) -> Option<usize> {
        match self {
            Self::Byte(offset) => Some(offset),
            _ => None,
        }
    }
}

/// Where `channel` lives inside one pixel of `format`.
///
/// `channel` must be exactly one of the four channel flags; combined or
/// empty sets resolve to [`ChannelOffset::Absent`].
pub fn channel_offset(format: PixelFormat, channel: PixelChannel) -> ChannelOffset {
    use ChannelOffset::{Absent, Byte, VirtualAlpha};

    // Index into the per-format [r, g, b, a] tables below.
    let index = if channel == PixelChannel::RED {
        0
    } else if channel == PixelChannel::GREEN {
        1
    } else if channel == PixelChannel::BLUE {
        2
    } else if channel == PixelChannel::ALPHA {
        3
    } else {
        return Absent;
    };

    let table: [ChannelOffset; 4] = match format {
        PixelFormat::Rgb => [Byte(0), Byte(1), Byte(2), VirtualAlpha],
        PixelFormat::Bgra | PixelFormat::BgrPremA => [Byte(2), Byte(1), Byte(0), Byte(3)],
        PixelFormat::Rgba | PixelFormat::RgbPremA => [Byte(0), Byte(1), Byte(2), Byte(3)],
        PixelFormat::Alpha => [Absent, Absent, Absent, Byte(0)],
        PixelFormat::Argb4444 => [packed(8, 4), packed(4, 4), packed(0, 4), packed(12, 4)],
        PixelFormat::Rgb565 => [packed(11, 5), packed(5, 6), packed(0, 5), VirtualAlpha],
        PixelFormat::Luma => [Byte(0), Byte(0), Byte(0), VirtualAlpha],
        PixelFormat::LumaAlpha => [Byte(0), Byte(0), Byte(0), Byte(1)],
        PixelFormat::Rgb32f => [Byte(0), Byte(4), Byte(8), VirtualAlpha],
        PixelFormat::Rgba32f => [Byte(0), Byte(4), Byte(8), Byte(12)],
        PixelFormat::Yuv420sp | PixelFormat::Nv12 => [Absent, Absent, Absent, VirtualAlpha],
        PixelFormat::Ect | PixelFormat::Oes | PixelFormat::RenderBuffer => [Absent; 4],
    };
    table[index]
}

/// Byte of a native-endian `u16` holding bit `shift`.
const fn packed_byte(shift: u8) -> u8 {
    let le = shift / 8;
    if cfg!(target_endian = "little") {
        le
    } else {
        1 - le
    }
}

const fn packed(shift: u8, bits: u8) -> ChannelOffset {
    ChannelOffset::Packed { shift, bits }
}

impl PixelFormat {
    /// Where `channel` lives inside one pixel. See [`channel_offset`].
    #[inline]
    pub fn channel_offset(self, channel: PixelChannel) -> ChannelOffset {
        channel_offset(self, channel)
    }
}
