//! Strided pixel views.
//!
//! [`PixelSlice`] and [`PixelSliceMut`] borrow caller-owned bytes and tag
//! them with a [`PixelFormat`], a row stride and, for semi-planar formats,
//! the offset of the chroma plane. Geometry is validated once at
//! construction so the conversion loops can index without further checks.
//! [`PixelBuffer`] owns a tightly packed allocation.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::format::PixelFormat;

// ---------------------------------------------------------------------------
// BufferError
// ---------------------------------------------------------------------------

/// Errors from pixel view construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BufferError {
    /// Data slice is too small for the given dimensions, stride and plane.
    InsufficientData,
    /// Stride is smaller than one row of pixels.
    StrideTooSmall,
    /// Dimensions cause arithmetic overflow.
    InvalidDimensions,
    /// The chroma plane starts inside the luma plane.
    PlaneOverlap,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => {
                write!(f, "data slice is too small for the given dimensions")
            }
            Self::StrideTooSmall => write!(f, "stride is smaller than width * bytes_per_pixel"),
            Self::InvalidDimensions => write!(f, "dimensions cause overflow"),
            Self::PlaneOverlap => write!(f, "chroma plane overlaps the luma plane"),
        }
    }
}

impl core::error::Error for BufferError {}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Validated layout shared by the view types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Geometry {
    width: u32,
    rows: u32,
    stride: usize,
    plane_offset: usize,
    format: PixelFormat,
}

impl Geometry {
    fn new(
        len: usize,
        width: u32,
        rows: u32,
        stride: usize,
        plane_offset: Option<usize>,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        let min_stride = format
            .min_stride(width)
            .ok_or(BufferError::InvalidDimensions)?;
        if stride < min_stride {
            return Err(BufferError::StrideTooSmall);
        }
        let row_bytes = width as usize * format.bytes_per_pixel();
        let luma_end = if rows > 0 {
            required_bytes(rows, stride, row_bytes)?
        } else {
            0
        };
        let mut geometry = Self {
            width,
            rows,
            stride,
            plane_offset: 0,
            format,
        };
        if !format.is_planar() {
            if len < luma_end {
                return Err(BufferError::InsufficientData);
            }
            return Ok(geometry);
        }

        let plane_offset = match plane_offset {
            Some(offset) => offset,
            None => stride
                .checked_mul(rows as usize)
                .ok_or(BufferError::InvalidDimensions)?,
        };
        if plane_offset < luma_end {
            return Err(BufferError::PlaneOverlap);
        }
        let required = if rows > 0 {
            required_bytes(geometry.chroma_rows(), stride, geometry.chroma_bytes())?
                .checked_add(plane_offset)
                .ok_or(BufferError::InvalidDimensions)?
        } else {
            0
        };
        if len < required {
            return Err(BufferError::InsufficientData);
        }
        geometry.plane_offset = plane_offset;
        Ok(geometry)
    }

    #[inline]
    fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    #[inline]
    fn chroma_rows(&self) -> u32 {
        self.rows.div_ceil(2)
    }

    #[inline]
    fn chroma_bytes(&self) -> usize {
        (self.width as usize).div_ceil(2) * 2
    }

    /// Bytes from the start of row 0 to the last byte the view covers.
    /// Trailing padding after the final row is not counted.
    fn extent(&self) -> usize {
        if self.rows == 0 {
            return 0;
        }
        // Validated in `new`, so none of this overflows.
        let luma = (self.rows as usize - 1) * self.stride + self.row_bytes();
        if !self.format.is_planar() {
            return luma;
        }
        self.plane_offset + (self.chroma_rows() as usize - 1) * self.stride + self.chroma_bytes()
    }

    #[inline]
    fn row_range(&self, y: u32) -> core::ops::Range<usize> {
        assert!(
            y < self.rows,
            "row index {y} out of bounds (rows: {})",
            self.rows
        );
        let start = y as usize * self.stride;
        start..start + self.row_bytes()
    }

    #[inline]
    fn plane_row_range(&self, cy: u32) -> core::ops::Range<usize> {
        assert!(
            self.format.is_planar(),
            "{:?} has no chroma plane",
            self.format
        );
        assert!(
            cy < self.chroma_rows(),
            "chroma row {cy} out of bounds (rows: {})",
            self.chroma_rows()
        );
        let start = self.plane_offset + cy as usize * self.stride;
        start..start + self.chroma_bytes()
    }
}

// ---------------------------------------------------------------------------
// PixelSlice (borrowed, immutable)
// ---------------------------------------------------------------------------

/// Borrowed view of pixel data.
///
/// All rows share the same stride. Semi-planar formats carry a second
/// plane of half-height chroma rows at [`plane_offset`](Self::plane_offset).
pub struct PixelSlice<'a> {
    data: &'a [u8],
    geometry: Geometry,
}

impl<'a> PixelSlice<'a> {
    /// Create a new pixel slice with validation.
    ///
    /// Semi-planar formats get their chroma plane directly after the last
    /// luma stride (`stride * rows`).
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too small or the stride is too small.
    pub fn new(
        data: &'a [u8],
        width: u32,
        rows: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        let geometry = Geometry::new(data.len(), width, rows, stride, None, format)?;
        Ok(Self { data, geometry })
    }

    /// Create a pixel slice with an explicit chroma plane offset.
    ///
    /// The offset is ignored for formats without a chroma plane.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`BufferError::PlaneOverlap`].
    pub fn with_plane_offset(
        data: &'a [u8],
        width: u32,
        rows: u32,
        stride: usize,
        plane_offset: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        let geometry = Geometry::new(data.len(), width, rows, stride, Some(plane_offset), format)?;
        Ok(Self { data, geometry })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Number of rows in this slice.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.geometry.rows
    }

    /// Byte stride between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    /// Byte offset of the chroma plane; 0 for formats without one.
    #[inline]
    pub fn plane_offset(&self) -> usize {
        self.geometry.plane_offset
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.geometry.format
    }

    /// Bytes spanned from the first row to the end of the last row or
    /// chroma pair.
    #[inline]
    pub fn extent(&self) -> usize {
        self.geometry.extent()
    }

    /// Pixel bytes for row `y` (no padding, exactly `width * bpp` bytes).
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        &self.data[self.geometry.row_range(y)]
    }

    /// Chroma pairs covering luma rows `2 * cy` and `2 * cy + 1`.
    ///
    /// # Panics
    ///
    /// Panics if the format is not semi-planar or `cy` is out of bounds.
    #[inline]
    pub fn plane_row(&self, cy: u32) -> &[u8] {
        &self.data[self.geometry.plane_row_range(cy)]
    }

    /// Zero-copy crop view. Stride remains the same as the parent.
    ///
    /// # Panics
    ///
    /// Panics if the crop region is out of bounds or the format is
    /// semi-planar.
    pub fn crop_view(&self, x: u32, y: u32, w: u32, h: u32) -> PixelSlice<'_> {
        let g = &self.geometry;
        assert!(
            !g.format.is_planar(),
            "crop_view is not supported for {:?}",
            g.format
        );
        assert!(
            x.checked_add(w).is_some_and(|end| end <= g.width),
            "crop x={x} w={w} exceeds width {}",
            g.width
        );
        assert!(
            y.checked_add(h).is_some_and(|end| end <= g.rows),
            "crop y={y} h={h} exceeds rows {}",
            g.rows
        );
        let geometry = Geometry {
            width: w,
            rows: h,
            ..*g
        };
        if h == 0 || w == 0 {
            return PixelSlice { data: &[], geometry };
        }
        let bpp = g.format.bytes_per_pixel();
        let start = y as usize * g.stride + x as usize * bpp;
        let end = (y as usize + h as usize - 1) * g.stride + (x as usize + w as usize) * bpp;
        PixelSlice {
            data: &self.data[start..end],
            geometry,
        }
    }
}

impl fmt::Debug for PixelSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelSlice({}x{}, {:?})",
            self.geometry.width, self.geometry.rows, self.geometry.format
        )
    }
}

// ---------------------------------------------------------------------------
// PixelSliceMut (borrowed, mutable)
// ---------------------------------------------------------------------------

/// Mutable borrowed view of pixel data.
///
/// Same semantics as [`PixelSlice`] but allows writing to rows.
pub struct PixelSliceMut<'a> {
    data: &'a mut [u8],
    geometry: Geometry,
}

impl<'a> PixelSliceMut<'a> {
    /// Create a new mutable pixel slice with validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too small or the stride is too small.
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        rows: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        let geometry = Geometry::new(data.len(), width, rows, stride, None, format)?;
        Ok(Self { data, geometry })
    }

    /// Create a mutable pixel slice with an explicit chroma plane offset.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`BufferError::PlaneOverlap`].
    pub fn with_plane_offset(
        data: &'a mut [u8],
        width: u32,
        rows: u32,
        stride: usize,
        plane_offset: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        let geometry = Geometry::new(data.len(), width, rows, stride, Some(plane_offset), format)?;
        Ok(Self { data, geometry })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Number of rows in this slice.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.geometry.rows
    }

    /// Byte stride between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    /// Byte offset of the chroma plane; 0 for formats without one.
    #[inline]
    pub fn plane_offset(&self) -> usize {
        self.geometry.plane_offset
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.geometry.format
    }

    /// Bytes a conversion into this view may write, padding between rows
    /// included.
    #[inline]
    pub fn extent(&self) -> usize {
        self.geometry.extent()
    }

    /// Pixel bytes for row `y` (immutable, no padding).
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        &self.data[self.geometry.row_range(y)]
    }

    /// Mutable pixel bytes for row `y` (no padding).
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let range = self.geometry.row_range(y);
        &mut self.data[range]
    }

    /// Mutable chroma pairs covering luma rows `2 * cy` and `2 * cy + 1`.
    ///
    /// # Panics
    ///
    /// Panics if the format is not semi-planar or `cy` is out of bounds.
    #[inline]
    pub fn plane_row_mut(&mut self, cy: u32) -> &mut [u8] {
        let range = self.geometry.plane_row_range(cy);
        &mut self.data[range]
    }

    /// Reborrow as an immutable view.
    pub fn as_slice(&self) -> PixelSlice<'_> {
        PixelSlice {
            data: &*self.data,
            geometry: self.geometry,
        }
    }

    /// Raw bytes, for splitting rows across workers.
    #[cfg(feature = "rayon")]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }
}

impl fmt::Debug for PixelSliceMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelSliceMut({}x{}, {:?})",
            self.geometry.width, self.geometry.rows, self.geometry.format
        )
    }
}

// ---------------------------------------------------------------------------
// PixelBuffer (owned)
// ---------------------------------------------------------------------------

/// Owned, tightly packed pixel buffer.
///
/// Rows use the format's minimum stride; semi-planar formats store their
/// chroma plane directly after the luma plane.
pub struct PixelBuffer {
    data: Vec<u8>,
    geometry: Geometry,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer for the given dimensions and format.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidDimensions`] if the size overflows.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, BufferError> {
        let total = Self::required_len(width, height, format)?;
        Self::from_vec(vec![0u8; total], width, height, format)
    }

    /// Wrap an existing `Vec<u8>` as a pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InsufficientData`] if the vec is too small.
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        let stride = format
            .min_stride(width)
            .ok_or(BufferError::InvalidDimensions)?;
        let geometry = Geometry::new(data.len(), width, height, stride, None, format)?;
        Ok(Self { data, geometry })
    }

    /// Bytes needed for a tightly packed image.
    pub fn required_len(width: u32, height: u32, format: PixelFormat) -> Result<usize, BufferError> {
        let stride = format
            .min_stride(width)
            .ok_or(BufferError::InvalidDimensions)?;
        let luma = stride
            .checked_mul(height as usize)
            .ok_or(BufferError::InvalidDimensions)?;
        if !format.is_planar() {
            return Ok(luma);
        }
        stride
            .checked_mul(height.div_ceil(2) as usize)
            .and_then(|chroma| chroma.checked_add(luma))
            .ok_or(BufferError::InvalidDimensions)
    }

    /// Consume the buffer and return the backing `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// All bytes, including the chroma plane.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.geometry.rows
    }

    /// Byte stride between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.geometry.format
    }

    /// Borrow the full buffer as an immutable [`PixelSlice`].
    pub fn as_slice(&self) -> PixelSlice<'_> {
        PixelSlice {
            data: &self.data,
            geometry: self.geometry,
        }
    }

    /// Borrow the full buffer as a mutable [`PixelSliceMut`].
    pub fn as_slice_mut(&mut self) -> PixelSliceMut<'_> {
        PixelSliceMut {
            data: &mut self.data,
            geometry: self.geometry,
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelBuffer({}x{}, {:?})",
            self.geometry.width, self.geometry.rows, self.geometry.format
        )
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Minimum bytes needed: `(rows - 1) * stride + row_bytes`.
fn required_bytes(rows: u32, stride: usize, row_bytes: usize) -> Result<usize, BufferError> {
    let preceding = (rows as usize - 1)
        .checked_mul(stride)
        .ok_or(BufferError::InvalidDimensions)?;
    preceding
        .checked_add(row_bytes)
        .ok_or(BufferError::InvalidDimensions)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffer_new_rgb() {
        let buf = PixelBuffer::new(10, 5, PixelFormat::Rgb).unwrap();
        assert_eq!(buf.width(), 10);
        assert_eq!(buf.height(), 5);
        assert_eq!(buf.stride(), 30);
        assert_eq!(buf.format(), PixelFormat::Rgb);
        let slice = buf.as_slice();
        assert_eq!(slice.row(0), &[0u8; 30]);
        assert_eq!(slice.row(4), &[0u8; 30]);
    }

    #[test]
    fn pixel_buffer_planar_layout() {
        let buf = PixelBuffer::new(5, 3, PixelFormat::Nv12).unwrap();
        // Width rounds up to 6; 3 luma rows + 2 chroma rows.
        assert_eq!(buf.stride(), 6);
        assert_eq!(buf.as_bytes().len(), 30);
        let slice = buf.as_slice();
        assert_eq!(slice.plane_offset(), 18);
        assert_eq!(slice.row(2).len(), 5);
        assert_eq!(slice.plane_row(1).len(), 6);
    }

    #[test]
    fn pixel_buffer_from_vec_too_small() {
        let err = PixelBuffer::from_vec(vec![0u8; 10], 10, 5, PixelFormat::Rgb);
        assert_eq!(err.unwrap_err(), BufferError::InsufficientData);
    }

    #[test]
    fn pixel_buffer_into_vec_roundtrip() {
        let buf = PixelBuffer::new(4, 4, PixelFormat::Rgba).unwrap();
        let v = buf.into_vec();
        let buf2 = PixelBuffer::from_vec(v, 4, 4, PixelFormat::Rgba).unwrap();
        assert_eq!(buf2.width(), 4);
    }

    #[test]
    fn pixel_buffer_write_and_read() {
        let mut buf = PixelBuffer::new(2, 2, PixelFormat::Rgb).unwrap();
        {
            let mut slice = buf.as_slice_mut();
            let row = slice.row_mut(0);
            row[0] = 255;
            row[1] = 128;
            row[2] = 64;
        }
        let slice = buf.as_slice();
        assert_eq!(&slice.row(0)[..3], &[255, 128, 64]);
        assert_eq!(&slice.row(1)[..3], &[0, 0, 0]);
    }

    #[test]
    fn padded_rows_skip_padding() {
        // 2x2 RGBA with 3 bytes of padding per row; last row needs no padding.
        let mut data = [0u8; 11 + 8];
        data[11..19].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let slice = PixelSlice::new(&data, 2, 2, 11, PixelFormat::Rgba).unwrap();
        assert_eq!(slice.row(1), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn pixel_slice_crop_view() {
        let mut buf = PixelBuffer::new(4, 4, PixelFormat::Rgb).unwrap();
        {
            let mut slice = buf.as_slice_mut();
            for y in 0..4u32 {
                for byte in slice.row_mut(y).iter_mut() {
                    *byte = y as u8;
                }
            }
        }
        let view = buf.as_slice();
        let crop = view.crop_view(1, 1, 2, 2);
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.rows(), 2);
        assert_eq!(crop.row(0), &[1, 1, 1, 1, 1, 1]);
        assert_eq!(crop.row(1), &[2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn pixel_slice_stride_too_small() {
        let data = [0u8; 100];
        let err = PixelSlice::new(&data, 10, 1, 2, PixelFormat::Rgb);
        assert_eq!(err.unwrap_err(), BufferError::StrideTooSmall);
    }

    #[test]
    fn pixel_slice_insufficient_data() {
        let data = [0u8; 10];
        let err = PixelSlice::new(&data, 10, 1, 30, PixelFormat::Rgb);
        assert_eq!(err.unwrap_err(), BufferError::InsufficientData);
    }

    #[test]
    fn pixel_slice_zero_rows() {
        let data = [0u8; 0];
        let slice = PixelSlice::new(&data, 10, 0, 30, PixelFormat::Rgb).unwrap();
        assert_eq!(slice.rows(), 0);
    }

    #[test]
    fn planar_stride_must_fit_chroma_pairs() {
        let data = [0u8; 64];
        let err = PixelSlice::new(&data, 5, 2, 5, PixelFormat::Nv12);
        assert_eq!(err.unwrap_err(), BufferError::StrideTooSmall);
    }

    #[test]
    fn plane_must_not_overlap_luma() {
        let data = [0u8; 64];
        let err = PixelSlice::with_plane_offset(&data, 4, 4, 4, 12, PixelFormat::Nv12);
        assert_eq!(err.unwrap_err(), BufferError::PlaneOverlap);
        let ok = PixelSlice::with_plane_offset(&data, 4, 4, 4, 32, PixelFormat::Nv12).unwrap();
        assert_eq!(ok.plane_offset(), 32);
        assert_eq!(ok.plane_row(1), &[0u8; 4]);
    }

    #[test]
    fn plane_must_fit_in_data() {
        let data = [0u8; 20];
        let err = PixelSlice::with_plane_offset(&data, 4, 4, 4, 16, PixelFormat::Nv12);
        assert_eq!(err.unwrap_err(), BufferError::InsufficientData);
    }

    #[test]
    fn plane_offset_ignored_for_packed_formats() {
        let data = [0u8; 16];
        let slice = PixelSlice::with_plane_offset(&data, 2, 2, 8, 999, PixelFormat::Rgba).unwrap();
        assert_eq!(slice.plane_offset(), 0);
    }

    #[test]
    #[should_panic(expected = "has no chroma plane")]
    fn plane_row_on_packed_format_panics() {
        let data = [0u8; 16];
        let slice = PixelSlice::new(&data, 2, 2, 8, PixelFormat::Rgba).unwrap();
        let _ = slice.plane_row(0);
    }

    #[test]
    fn extent_counts_padding_between_rows_only() {
        let data = [0u8; 64];
        let packed = PixelSlice::new(&data, 2, 3, 12, PixelFormat::Rgba).unwrap();
        assert_eq!(packed.extent(), 2 * 12 + 8);
        let planar = PixelSlice::with_plane_offset(&data, 3, 3, 4, 16, PixelFormat::Nv12).unwrap();
        // Two chroma rows of two pairs each, after the plane offset.
        assert_eq!(planar.extent(), 16 + 4 + 4);
        let empty = PixelSlice::new(&data, 2, 0, 8, PixelFormat::Rgba).unwrap();
        assert_eq!(empty.extent(), 0);
        assert_eq!(
            PixelBuffer::new(5, 3, PixelFormat::Nv12).unwrap().as_slice().extent(),
            30
        );
    }

    #[test]
    fn debug_format() {
        let buf = PixelBuffer::new(3, 2, PixelFormat::Bgra).unwrap();
        assert_eq!(alloc::format!("{buf:?}"), "PixelBuffer(3x2, Bgra)");
    }
}
