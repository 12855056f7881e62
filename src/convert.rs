//! Buffer-to-buffer pixel conversion.
//!
//! Every source row is decoded into a scratch row of [`Argb`], its alpha
//! interpretation is reconciled with the destination, and the row is
//! re-encoded in the destination layout. Conversion only re-encodes; it
//! never composites against what the destination already holds.
//!
//! Format pairs are resolved once per call. A format without a CPU codec
//! is rejected before any byte is written.

use alloc::vec;
use core::fmt;

use enough::{Stop, StopReason, Unstoppable};

use crate::argb::Argb;
use crate::codec::Codec;
use crate::format::{PixelChannel, PixelFormat};
use crate::limits::{Footprint, LimitExceeded, ResourceLimits};
use crate::surface::{BufferError, PixelBuffer, PixelSlice, PixelSliceMut};
use crate::yuv::{self, ChromaOrder};

// ---------------------------------------------------------------------------
// ConvertError
// ---------------------------------------------------------------------------

/// Errors from a conversion.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConvertError {
    /// The format has no CPU decode/encode rule.
    UnsupportedFormat(PixelFormat),
    /// Source and destination views differ in width or height.
    DimensionMismatch,
    /// A view's geometry does not fit its data.
    Buffer(BufferError),
    /// The conversion needs more than the configured limits allow.
    Limit(LimitExceeded),
    /// The [`Stop`] token asked the conversion to end early. Rows written
    /// before the stop remain in the destination.
    Stopped(StopReason),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => {
                write!(f, "{format:?} cannot be converted on the CPU")
            }
            Self::DimensionMismatch => {
                write!(f, "source and destination dimensions differ")
            }
            Self::Buffer(err) => write!(f, "invalid buffer: {err}"),
            Self::Limit(err) => write!(f, "limit exceeded: {err}"),
            Self::Stopped(reason) => write!(f, "conversion stopped: {reason:?}"),
        }
    }
}

impl core::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Buffer(err) => Some(err),
            Self::Limit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BufferError> for ConvertError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}

impl From<LimitExceeded> for ConvertError {
    fn from(err: LimitExceeded) -> Self {
        Self::Limit(err)
    }
}

impl From<StopReason> for ConvertError {
    fn from(reason: StopReason) -> Self {
        Self::Stopped(reason)
    }
}

// ---------------------------------------------------------------------------
// ConvertOptions
// ---------------------------------------------------------------------------

/// Conversion configuration.
///
/// # Example
///
/// ```
/// use pixconv::{ConvertOptions, ResourceLimits};
///
/// let options = ConvertOptions::new()
///     .with_limits(ResourceLimits::none().with_max_pixels(1 << 24))
///     .with_parallel(true);
/// assert!(options.parallel);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConvertOptions {
    /// Caps on what the conversion writes and allocates.
    pub limits: ResourceLimits,
    /// Split rows across the rayon pool. Only honoured with the `rayon`
    /// feature and for format pairs without a chroma plane.
    pub parallel: bool,
}

impl ConvertOptions {
    /// Default options: no limits, single-threaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource limits.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Request row-parallel conversion.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// How colour channels change between source and destination alpha modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reconcile {
    Keep,
    Premultiply,
    Unpremultiply,
}

impl Reconcile {
    fn between(src: PixelFormat, dst: PixelFormat) -> Self {
        if !dst.channels().intersects(PixelChannel::RGB) {
            return Self::Keep;
        }
        match (src.is_premultiplied(), dst.is_premultiplied()) {
            (true, false) => Self::Unpremultiply,
            // Opaque sources are unchanged by premultiplication.
            (false, true) if src.has_alpha() => Self::Premultiply,
            _ => Self::Keep,
        }
    }

    #[inline]
    fn apply(self, row: &mut [Argb]) {
        match self {
            Self::Keep => {}
            Self::Premultiply => row.iter_mut().for_each(premultiply),
            Self::Unpremultiply => row.iter_mut().for_each(unpremultiply),
        }
    }
}

#[inline]
fn premultiply(px: &mut Argb) {
    let a = px.a as u32;
    if a == 255 {
        return;
    }
    let scale = |c: u8| ((c as u32 * a + 127) / 255) as u8;
    px.r = scale(px.r);
    px.g = scale(px.g);
    px.b = scale(px.b);
}

#[inline]
fn unpremultiply(px: &mut Argb) {
    let a = px.a as u32;
    match a {
        255 => {}
        0 => {
            px.r = 0;
            px.g = 0;
            px.b = 0;
        }
        _ => {
            let scale = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
            px.r = scale(px.r);
            px.g = scale(px.g);
            px.b = scale(px.b);
        }
    }
}

/// Row layout of one side of a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowFormat {
    Packed(Codec),
    Planar(ChromaOrder),
}

impl RowFormat {
    fn resolve(format: PixelFormat) -> Result<Self, ConvertError> {
        if let Some(codec) = Codec::for_format(format) {
            return Ok(Self::Packed(codec));
        }
        if let Some(order) = ChromaOrder::for_format(format) {
            return Ok(Self::Planar(order));
        }
        Err(ConvertError::UnsupportedFormat(format))
    }
}

/// A resolved source/destination pair.
#[derive(Clone, Copy, Debug)]
struct Plan {
    src: RowFormat,
    dst: RowFormat,
    reconcile: Reconcile,
    identical: bool,
}

impl Plan {
    fn new(src: PixelFormat, dst: PixelFormat) -> Result<Self, ConvertError> {
        let resolve = |format| {
            RowFormat::resolve(format).inspect_err(|_| {
                log::debug!("rejecting {src:?} -> {dst:?}: {format:?} has no CPU codec");
            })
        };
        Ok(Self {
            src: resolve(src)?,
            dst: resolve(dst)?,
            reconcile: Reconcile::between(src, dst),
            identical: src == dst,
        })
    }

    /// Decode row `y` of `src` into `out` and reconcile alpha.
    #[inline]
    fn decode(&self, src: &PixelSlice<'_>, y: u32, out: &mut [Argb]) {
        match self.src {
            RowFormat::Packed(codec) => codec.decode_row(src.row(y), out),
            RowFormat::Planar(order) => {
                yuv::decode_row(order, src.row(y), src.plane_row(y / 2), out)
            }
        }
        self.reconcile.apply(out);
    }

    fn run(
        &self,
        src: &PixelSlice<'_>,
        dst: &mut PixelSliceMut<'_>,
        stop: &dyn Stop,
    ) -> Result<(), ConvertError> {
        let rows = src.rows();
        if self.identical {
            log::trace!("copying {rows} rows of {:?}", src.format());
            for y in 0..rows {
                stop.check()?;
                dst.row_mut(y).copy_from_slice(src.row(y));
            }
            if src.format().is_planar() {
                for cy in 0..rows.div_ceil(2) {
                    dst.plane_row_mut(cy).copy_from_slice(src.plane_row(cy));
                }
            }
            return Ok(());
        }

        log::trace!(
            "converting {rows} rows {:?} -> {:?} ({:?})",
            src.format(),
            dst.format(),
            self.reconcile
        );
        let width = src.width() as usize;
        let mut top = vec![Argb::TRANSPARENT; width];
        match self.dst {
            RowFormat::Packed(codec) => {
                for y in 0..rows {
                    stop.check()?;
                    self.decode(src, y, &mut top);
                    codec.encode_row(&top, dst.row_mut(y));
                }
            }
            RowFormat::Planar(order) => {
                // Chroma rows cover two luma rows; convert rows in pairs.
                let mut bottom = vec![Argb::TRANSPARENT; width];
                for cy in 0..rows.div_ceil(2) {
                    stop.check()?;
                    let y = cy * 2;
                    self.decode(src, y, &mut top);
                    yuv::encode_luma_row(&top, dst.row_mut(y));
                    let has_bottom = y + 1 < rows;
                    if has_bottom {
                        self.decode(src, y + 1, &mut bottom);
                        yuv::encode_luma_row(&bottom, dst.row_mut(y + 1));
                    }
                    let below = has_bottom.then_some(&bottom[..]);
                    yuv::encode_chroma_row(order, &top, below, dst.plane_row_mut(cy));
                }
            }
        }
        Ok(())
    }

    #[cfg(feature = "rayon")]
    fn run_parallel(&self, src: &PixelSlice<'_>, dst: &mut PixelSliceMut<'_>) -> bool {
        use rayon::prelude::*;

        let (RowFormat::Packed(decoder), RowFormat::Packed(encoder)) = (self.src, self.dst) else {
            return false;
        };
        let reconcile = self.reconcile;
        let width = src.width() as usize;
        let rows = dst.rows() as usize;
        let stride = dst.stride();
        let row_bytes = width * encoder.bytes_per_pixel();
        log::trace!(
            "converting {rows} rows {:?} -> {:?} in parallel",
            src.format(),
            dst.format()
        );
        dst.data_mut()
            .par_chunks_mut(stride)
            .take(rows)
            .enumerate()
            .for_each_init(
                || vec![Argb::TRANSPARENT; width],
                |scratch, (y, chunk)| {
                    decoder.decode_row(src.row(y as u32), scratch);
                    reconcile.apply(scratch);
                    encoder.encode_row(scratch, &mut chunk[..row_bytes]);
                },
            );
        true
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Convert `src` into `dst` with default options.
///
/// # Errors
///
/// See [`convert_with`].
pub fn convert(src: &PixelSlice<'_>, dst: &mut PixelSliceMut<'_>) -> Result<(), ConvertError> {
    convert_with(src, dst, &ConvertOptions::default(), &Unstoppable)
}

/// Convert `src` into `dst`.
///
/// Processes `width * rows` pixels, top row first. Channels the
/// destination lacks are dropped; a missing alpha is written as 255.
/// `stop` is polled once per row (once per row pair for semi-planar
/// destinations). The parallel path polls it once before starting.
///
/// # Errors
///
/// - [`ConvertError::UnsupportedFormat`] if either format has no CPU codec.
/// - [`ConvertError::DimensionMismatch`] if the views differ in size.
/// - [`ConvertError::Limit`] if the [`Footprint`] exceeds `options.limits`.
/// - [`ConvertError::Stopped`] if `stop` fires.
pub fn convert_with(
    src: &PixelSlice<'_>,
    dst: &mut PixelSliceMut<'_>,
    options: &ConvertOptions,
    stop: &dyn Stop,
) -> Result<(), ConvertError> {
    let plan = Plan::new(src.format(), dst.format())?;
    if src.width() != dst.width() || src.rows() != dst.rows() {
        return Err(ConvertError::DimensionMismatch);
    }
    options
        .limits
        .check(&Footprint::of(src, dst))
        .inspect_err(|err| log::debug!("rejecting {:?} -> {:?}: {err}", src.format(), dst.format()))?;
    if src.width() == 0 || src.rows() == 0 {
        return Ok(());
    }

    #[cfg(feature = "rayon")]
    if options.parallel && !plan.identical {
        stop.check()?;
        if plan.run_parallel(src, dst) {
            return Ok(());
        }
    }

    plan.run(src, dst, stop)
}

/// Convert a `width` x `height` image between two caller-owned buffers.
///
/// Strides are byte distances between row starts. Plane offsets locate the
/// chroma plane of semi-planar formats and are ignored for other formats.
///
/// # Errors
///
/// Unsupported formats are rejected first, then buffer geometry, then
/// everything [`convert_with`] checks.
///
/// # Example
///
/// ```
/// use pixconv::{pixel_convert, PixelFormat};
///
/// let src = [10u8, 20, 30, 40];
/// let mut dst = [0u8; 4];
/// pixel_convert(
///     1, 1,
///     PixelFormat::Rgba, &src, 4, 0,
///     PixelFormat::Bgra, &mut dst, 4, 0,
/// )?;
/// assert_eq!(dst, [30, 20, 10, 40]);
/// # Ok::<(), pixconv::ConvertError>(())
/// ```
#[allow(clippy::too_many_arguments)]
pub fn pixel_convert(
    width: u32,
    height: u32,
    src_format: PixelFormat,
    src: &[u8],
    src_stride: usize,
    src_plane_offset: usize,
    dst_format: PixelFormat,
    dst: &mut [u8],
    dst_stride: usize,
    dst_plane_offset: usize,
) -> Result<(), ConvertError> {
    Plan::new(src_format, dst_format)?;
    let src = PixelSlice::with_plane_offset(
        src,
        width,
        height,
        src_stride,
        src_plane_offset,
        src_format,
    )?;
    let mut dst = PixelSliceMut::with_plane_offset(
        dst,
        width,
        height,
        dst_stride,
        dst_plane_offset,
        dst_format,
    )?;
    convert(&src, &mut dst)
}

impl PixelBuffer {
    /// Convert into a newly allocated, tightly packed buffer.
    ///
    /// # Errors
    ///
    /// See [`convert_with`].
    pub fn convert_to(&self, format: PixelFormat) -> Result<PixelBuffer, ConvertError> {
        Plan::new(self.format(), format)?;
        let mut out = PixelBuffer::new(self.width(), self.height(), format)?;
        convert(&self.as_slice(), &mut out.as_slice_mut())?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
