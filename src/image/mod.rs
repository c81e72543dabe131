//! Grayscale image buffers and views.
//!
//! `ImageView` is a borrowed 2D view into a 1D `u8` buffer with an explicit
//! stride (elements between row starts), so capture buffers with padded rows
//! can be wrapped without copying. `OwnedImage` is the contiguous owned
//! counterpart used for templates, scaled variants, and captured frames.

use crate::util::{ScreenMatchError, ScreenMatchResult};

pub mod resize;

#[cfg(feature = "image-io")]
pub mod io;

/// Borrowed 2D grayscale view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> ImageView<'a> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> ScreenMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        if stride < width {
            return Err(ScreenMatchError::InvalidStride { width, stride });
        }
        let needed = (height - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(width))
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x).copied()
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }

    /// Returns the mean pixel intensity.
    ///
    /// Used by the frame source to spot degenerate captures (all-black
    /// frames from protected surfaces).
    pub fn mean_intensity(&self) -> f32 {
        let mut sum = 0u64;
        for y in 0..self.height {
            if let Some(row) = self.row(y) {
                for &v in row {
                    sum += u64::from(v);
                }
            }
        }
        sum as f32 / (self.width * self.height) as f32
    }
}

/// Owned contiguous grayscale image.
#[derive(Clone)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Creates an owned image from a contiguous buffer of exactly
    /// `width * height` pixels.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the backing pixel buffer in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}
