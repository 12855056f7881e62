//! Conversion budgets.
//!
//! A [`Footprint`] describes what one conversion touches: the image size,
//! the span of destination bytes it may write and the scratch rows it
//! allocates. [`ResourceLimits`] caps each of those, and the check runs
//! before the first row is written.

use core::fmt;
use core::mem::size_of;

use crate::argb::Argb;
use crate::surface::{PixelSlice, PixelSliceMut};

/// What a conversion between two views will touch and allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Footprint {
    /// Width in pixels.
    pub width: u32,
    /// Height in rows.
    pub height: u32,
    /// Destination bytes from the first row to the end of the last row or
    /// chroma pair, row padding included.
    pub output_bytes: u64,
    /// Bytes of decoded scratch rows. The parallel path allocates this
    /// once per worker.
    pub scratch_bytes: u64,
}

impl Footprint {
    /// Footprint of converting `src` into `dst`.
    ///
    /// Same-format copies need no scratch. Semi-planar destinations decode
    /// two rows at a time for their shared chroma row.
    pub fn of(src: &PixelSlice<'_>, dst: &PixelSliceMut<'_>) -> Self {
        let scratch_rows: u64 = if src.format() == dst.format() {
            0
        } else if dst.format().is_planar() {
            2
        } else {
            1
        };
        let scratch_row = dst.width() as u64 * size_of::<Argb>() as u64;
        Self {
            width: dst.width(),
            height: dst.rows(),
            output_bytes: dst.extent() as u64,
            scratch_bytes: scratch_row * scratch_rows,
        }
    }

    /// Total pixel count.
    #[inline]
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Caps on a conversion's [`Footprint`]. `None` leaves a resource uncapped.
///
/// # Example
///
/// ```
/// use pixconv::ResourceLimits;
///
/// let limits = ResourceLimits::none()
///     .with_max_size(8192, 8192)
///     .with_max_output_bytes(64 << 20);
/// assert!(!limits.is_unlimited());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ResourceLimits {
    /// Widest accepted image.
    pub max_width: Option<u32>,
    /// Tallest accepted image.
    pub max_height: Option<u32>,
    /// Largest accepted `width * height`.
    pub max_pixels: Option<u64>,
    /// Largest destination span a conversion may write.
    pub max_output_bytes: Option<u64>,
    /// Largest scratch allocation per conversion (per worker when parallel).
    pub max_scratch_bytes: Option<u64>,
}

impl ResourceLimits {
    /// Nothing capped.
    pub fn none() -> Self {
        Self::default()
    }

    /// Cap both image dimensions.
    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    /// Cap the pixel count.
    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    /// Cap the destination byte span.
    pub fn with_max_output_bytes(mut self, bytes: u64) -> Self {
        self.max_output_bytes = Some(bytes);
        self
    }

    /// Cap the scratch allocation.
    pub fn with_max_scratch_bytes(mut self, bytes: u64) -> Self {
        self.max_scratch_bytes = Some(bytes);
        self
    }

    /// Whether no resource is capped.
    pub fn is_unlimited(&self) -> bool {
        *self == Self::none()
    }

    /// Check `footprint` against every cap, in field order.
    ///
    /// # Errors
    ///
    /// The first resource over its cap.
    pub fn check(&self, footprint: &Footprint) -> Result<(), LimitExceeded> {
        let budget = [
            (
                LimitKind::Width,
                footprint.width as u64,
                self.max_width.map(u64::from),
            ),
            (
                LimitKind::Height,
                footprint.height as u64,
                self.max_height.map(u64::from),
            ),
            (LimitKind::Pixels, footprint.pixels(), self.max_pixels),
            (
                LimitKind::OutputBytes,
                footprint.output_bytes,
                self.max_output_bytes,
            ),
            (
                LimitKind::ScratchBytes,
                footprint.scratch_bytes,
                self.max_scratch_bytes,
            ),
        ];
        match budget.into_iter().find_map(|(kind, actual, max)| {
            max.filter(|&max| actual > max)
                .map(|max| LimitExceeded { kind, actual, max })
        }) {
            Some(exceeded) => Err(exceeded),
            None => Ok(()),
        }
    }
}

/// The resource a [`LimitExceeded`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LimitKind {
    /// [`ResourceLimits::max_width`].
    Width,
    /// [`ResourceLimits::max_height`].
    Height,
    /// [`ResourceLimits::max_pixels`].
    Pixels,
    /// [`ResourceLimits::max_output_bytes`].
    OutputBytes,
    /// [`ResourceLimits::max_scratch_bytes`].
    ScratchBytes,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Pixels => "pixel count",
            Self::OutputBytes => "destination span",
            Self::ScratchBytes => "scratch allocation",
        })
    }
}

/// A conversion needs more of a resource than its limits allow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitExceeded {
    /// Which resource.
    pub kind: LimitKind,
    /// What the conversion needs.
    pub actual: u64,
    /// The configured cap.
    pub max: u64,
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} is over the cap of {}", self.kind, self.actual, self.max)
    }
}

impl core::error::Error for LimitExceeded {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;
    use alloc::format;

    fn footprint(width: u32, height: u32, output_bytes: u64, scratch_bytes: u64) -> Footprint {
        Footprint {
            width,
            height,
            output_bytes,
            scratch_bytes,
        }
    }

    #[test]
    fn unlimited_accepts_anything() {
        let limits = ResourceLimits::none();
        assert!(limits.is_unlimited());
        let huge = footprint(u32::MAX, u32::MAX, u64::MAX, u64::MAX);
        assert_eq!(limits.check(&huge), Ok(()));
    }

    #[test]
    fn caps_are_inclusive() {
        let limits = ResourceLimits::none()
            .with_max_size(100, 50)
            .with_max_output_bytes(400);
        assert_eq!(limits.check(&footprint(100, 50, 400, 0)), Ok(()));
        assert_eq!(
            limits.check(&footprint(100, 51, 400, 0)),
            Err(LimitExceeded {
                kind: LimitKind::Height,
                actual: 51,
                max: 50
            })
        );
    }

    #[test]
    fn first_exceeded_resource_is_reported() {
        let limits = ResourceLimits::none()
            .with_max_pixels(10)
            .with_max_scratch_bytes(8);
        let err = limits.check(&footprint(4, 4, 64, 64)).unwrap_err();
        assert_eq!(err.kind, LimitKind::Pixels);
        assert_eq!(err.actual, 16);

        let err = limits.check(&footprint(2, 2, 64, 64)).unwrap_err();
        assert_eq!(err.kind, LimitKind::ScratchBytes);
    }

    #[test]
    fn footprint_of_views() {
        let src = [0u8; 64];
        let mut dst = [0u8; 64];
        let src = PixelSlice::new(&src, 3, 2, 12, PixelFormat::Rgba).unwrap();

        let packed = PixelSliceMut::new(&mut dst, 3, 2, 20, PixelFormat::Bgra).unwrap();
        let fp = Footprint::of(&src, &packed);
        assert_eq!(fp.output_bytes, 20 + 12);
        assert_eq!(fp.scratch_bytes, 3 * 4);
        assert_eq!(fp.pixels(), 6);

        let same = PixelSliceMut::new(&mut dst, 3, 2, 12, PixelFormat::Rgba).unwrap();
        assert_eq!(Footprint::of(&src, &same).scratch_bytes, 0);

        let planar = PixelSliceMut::new(&mut dst, 3, 2, 4, PixelFormat::Nv12).unwrap();
        let fp = Footprint::of(&src, &planar);
        assert_eq!(fp.output_bytes, 8 + 4);
        assert_eq!(fp.scratch_bytes, 2 * 3 * 4);
    }

    #[test]
    fn display_names_the_resource() {
        let err = LimitExceeded {
            kind: LimitKind::OutputBytes,
            actual: 72,
            max: 40,
        };
        assert_eq!(format!("{err}"), "destination span of 72 is over the cap of 40");
    }
}
