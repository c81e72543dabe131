//! BRIEF binary descriptors.
//!
//! Each keypoint is described by 256 intensity comparisons between pairs of
//! points drawn once from a seeded uniform distribution over a 25x25 patch.
//! Intensities are smoothed with a 5x5 box filter (via an integral image)
//! before comparison.

use crate::feature::fast::KeyPoint;
use crate::image::ImageView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

/// Number of comparison pairs, and therefore descriptor bits.
pub const DESCRIPTOR_BITS: usize = 256;

/// Half-extent of the sampling patch around a keypoint.
const PATCH_SPAN: i32 = 12;

/// Box smoothing radius applied before each comparison.
const SMOOTH_RADIUS: i32 = 2;

const PATTERN_SEED: u64 = 0x4252_4945_46;

/// A 256-bit binary descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor([u8; DESCRIPTOR_BITS / 8]);

impl Descriptor {
    /// Hamming distance to another descriptor.
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Returns bit `i` of the descriptor.
    pub(crate) fn bit(&self, i: usize) -> bool {
        (self.0[i >> 3] >> (i & 7)) & 1 != 0
    }
}

/// Fixed comparison pattern, generated once from a constant seed so that
/// template and frame descriptors are always comparable.
fn pattern() -> &'static [(i32, i32, i32, i32); DESCRIPTOR_BITS] {
    static PATTERN: OnceLock<[(i32, i32, i32, i32); DESCRIPTOR_BITS]> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        std::array::from_fn(|_| {
            (
                rng.random_range(-PATCH_SPAN..=PATCH_SPAN),
                rng.random_range(-PATCH_SPAN..=PATCH_SPAN),
                rng.random_range(-PATCH_SPAN..=PATCH_SPAN),
                rng.random_range(-PATCH_SPAN..=PATCH_SPAN),
            )
        })
    })
}

/// Describes every keypoint.
///
/// Callers must guarantee that each keypoint sits at least
/// [`crate::feature::DETECT_MARGIN`] pixels from every border; the FAST
/// detector enforces that.
pub fn describe(img: ImageView<'_>, keypoints: &[KeyPoint]) -> Vec<Descriptor> {
    if keypoints.is_empty() {
        return Vec::new();
    }
    let integral = integral_image(img);
    let width = img.width();

    keypoints
        .iter()
        .map(|kp| {
            let cx = kp.x as i32;
            let cy = kp.y as i32;
            let mut bytes = [0u8; DESCRIPTOR_BITS / 8];
            for (i, &(ax, ay, bx, by)) in pattern().iter().enumerate() {
                let a = box_mean(&integral, width, cx + ax, cy + ay);
                let b = box_mean(&integral, width, cx + bx, cy + by);
                if a < b {
                    bytes[i >> 3] |= 1 << (i & 7);
                }
            }
            Descriptor(bytes)
        })
        .collect()
}

/// Summed-area table with one extra zero row and column.
///
/// Sums are held in `u64`: a full-intensity frame overflows `u32` past
/// about 16.8 megapixels, well within large virtual-screen captures.
fn integral_image(img: ImageView<'_>) -> Vec<u64> {
    let width = img.width();
    let height = img.height();
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let row = img.row(y).unwrap_or(&[]);
        let mut run = 0u64;
        for x in 0..width {
            run += u64::from(row[x]);
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + run;
        }
    }
    integral
}

/// Mean intensity of the (2r+1)x(2r+1) box around `(x, y)`, clamped to the
/// image bounds.
fn box_mean(integral: &[u64], width: usize, x: i32, y: i32) -> u64 {
    let stride = (width + 1) as i32;
    let height = integral.len() as i32 / stride - 1;
    let x0 = (x - SMOOTH_RADIUS).clamp(0, width as i32);
    let y0 = (y - SMOOTH_RADIUS).clamp(0, height);
    let x1 = (x + SMOOTH_RADIUS + 1).clamp(0, width as i32);
    let y1 = (y + SMOOTH_RADIUS + 1).clamp(0, height);
    let area = ((x1 - x0) * (y1 - y0)).max(1) as u64;
    let at = |xx: i32, yy: i32| integral[(yy * stride + xx) as usize];
    let sum = at(x1, y1) + at(x0, y0) - at(x1, y0) - at(x0, y1);
    sum / area
}
