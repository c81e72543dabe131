//! Resampling for scaled template variants.
//!
//! Downscaling averages the covered source box per destination pixel;
//! upscaling falls back to bilinear sampling. Masks are always resampled
//! nearest-neighbor so binary validity is preserved.

use crate::image::{ImageView, OwnedImage};
use crate::util::ScreenMatchResult;

/// Returns the destination dimensions for a scale factor, clamped to 1x1.
pub fn scaled_dims(width: usize, height: usize, scale: f32) -> (usize, usize) {
    let w = ((width as f32 * scale).round() as usize).max(1);
    let h = ((height as f32 * scale).round() as usize).max(1);
    (w, h)
}

/// Resamples a grayscale image to `dst_width` x `dst_height`.
pub fn resize_image(
    src: ImageView<'_>,
    dst_width: usize,
    dst_height: usize,
) -> ScreenMatchResult<OwnedImage> {
    let data = if dst_width < src.width() || dst_height < src.height() {
        box_average(src, dst_width, dst_height)
    } else {
        bilinear(src, dst_width, dst_height)
    };
    OwnedImage::new(data, dst_width, dst_height)
}

/// Resamples a binary mask nearest-neighbor, keeping values exactly 0 or 255.
pub fn resize_mask_nearest(
    mask: &[u8],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; dst_width * dst_height];
    for y in 0..dst_height {
        let sy = (y * src_height / dst_height).min(src_height - 1);
        for x in 0..dst_width {
            let sx = (x * src_width / dst_width).min(src_width - 1);
            out[y * dst_width + x] = if mask[sy * src_width + sx] != 0 {
                255
            } else {
                0
            };
        }
    }
    out
}

fn box_average(src: ImageView<'_>, dst_width: usize, dst_height: usize) -> Vec<u8> {
    let src_width = src.width();
    let src_height = src.height();
    let mut out = vec![0u8; dst_width * dst_height];

    for y in 0..dst_height {
        let sy0 = y * src_height / dst_height;
        let sy1 = (((y + 1) * src_height).div_ceil(dst_height)).min(src_height);
        for x in 0..dst_width {
            let sx0 = x * src_width / dst_width;
            let sx1 = (((x + 1) * src_width).div_ceil(dst_width)).min(src_width);

            let mut sum = 0u32;
            let mut count = 0u32;
            for sy in sy0..sy1.max(sy0 + 1) {
                if let Some(row) = src.row(sy) {
                    for &v in &row[sx0..sx1.max(sx0 + 1)] {
                        sum += u32::from(v);
                        count += 1;
                    }
                }
            }
            out[y * dst_width + x] = if count > 0 {
                ((sum + count / 2) / count) as u8
            } else {
                0
            };
        }
    }
    out
}

fn bilinear(src: ImageView<'_>, dst_width: usize, dst_height: usize) -> Vec<u8> {
    let src_width = src.width();
    let src_height = src.height();
    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;
    let mut out = vec![0u8; dst_width * dst_height];

    for y in 0..dst_height {
        let fy = ((y as f32 + 0.5) * y_ratio - 0.5).max(0.0);
        let y0 = (fy as usize).min(src_height - 1);
        let y1 = (y0 + 1).min(src_height - 1);
        let wy = fy - y0 as f32;
        for x in 0..dst_width {
            let fx = ((x as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let x0 = (fx as usize).min(src_width - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let wx = fx - x0 as f32;

            let p00 = src.get(x0, y0).unwrap_or(0) as f32;
            let p10 = src.get(x1, y0).unwrap_or(0) as f32;
            let p01 = src.get(x0, y1).unwrap_or(0) as f32;
            let p11 = src.get(x1, y1).unwrap_or(0) as f32;

            let top = p00 + (p10 - p00) * wx;
            let bottom = p01 + (p11 - p01) * wx;
            out[y * dst_width + x] = (top + (bottom - top) * wy).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
