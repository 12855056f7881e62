//! Pixel formats, fixed-point ARGB compositing, and strided buffer conversion.
//!
//! - [`PixelFormat`] / [`FormatInfo`]: the format registry (size, channels,
//!   alpha mode and plane layout of every format)
//! - [`channel_offset`] / [`ChannelOffset`]: where a channel lives inside a pixel
//! - [`Argb`]: an 8-bit-per-channel colour value with the fixed-point blend
//!   operators ([`Argb::blend`], [`Argb::q_blend`], [`blend_alpha`], ...)
//! - [`PixelSlice`] / [`PixelSliceMut`] / [`PixelBuffer`]: strided views,
//!   including semi-planar YUV with a separate chroma plane
//! - [`pixel_convert`] / [`convert_with`]: buffer-to-buffer conversion between
//!   any two CPU-representable formats
//! - [`ResourceLimits`] / [`Footprint`]: size, output-span and scratch caps
//!   checked before a conversion writes anything
//!
//! Conversions can be cancelled through an [`enough::Stop`] token. The
//! optional `rayon` feature spreads rows of non-planar conversions across
//! the rayon thread pool.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod argb;
mod blend;
mod channel;
mod codec;
mod convert;
mod format;
mod limits;
mod surface;
mod yuv;

pub use argb::{Argb, pack, unpack};
pub use blend::{blend_alpha, blend_alpha_argb, q_blend_alpha};
pub use channel::{
    CHANNEL_OFFSET_NONE, CHANNEL_OFFSET_VIRTUAL_ALPHA, ChannelOffset, channel_offset,
};
pub use convert::{ConvertError, ConvertOptions, convert, convert_with, pixel_convert};
pub use format::{AlphaMode, FormatInfo, PixelChannel, PixelFormat, bytes_per_pixel};
pub use limits::{Footprint, LimitExceeded, LimitKind, ResourceLimits};
pub use surface::{BufferError, PixelBuffer, PixelSlice, PixelSliceMut};

// Re-exports for callers.
pub use enough::{Stop, StopReason, Unstoppable};
pub use rgb;
