//! FAST-9 corner detection.
//!
//! A pixel is a corner when at least 9 contiguous pixels on a Bresenham
//! circle of radius 3 are all brighter than center + threshold or all
//! darker than center - threshold. Candidates get a response score (summed
//! contrast over the classified circle pixels), pass 3x3 non-maximum
//! suppression, and are truncated to the caller's budget by response.

use crate::feature::DETECT_MARGIN;
use crate::image::ImageView;

/// A detected corner with its response score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyPoint {
    /// X position in pixels.
    pub x: f32,
    /// Y position in pixels.
    pub y: f32,
    /// Corner response; higher is more distinctive.
    pub response: f32,
}

const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: usize = 9;

/// Detects FAST-9 corners, keeping at most `budget` by descending response.
///
/// Corners closer than [`DETECT_MARGIN`] to the border are ignored so the
/// descriptor patch always fits.
pub fn detect(img: ImageView<'_>, threshold: u8, budget: usize) -> Vec<KeyPoint> {
    let width = img.width();
    let height = img.height();
    if width <= 2 * DETECT_MARGIN || height <= 2 * DETECT_MARGIN || budget == 0 {
        return Vec::new();
    }

    let t = i32::from(threshold);
    let mut responses = vec![0.0f32; width * height];
    let mut candidates: Vec<(usize, usize)> = Vec::new();

    for y in DETECT_MARGIN..height - DETECT_MARGIN {
        for x in DETECT_MARGIN..width - DETECT_MARGIN {
            let center = i32::from(img.get(x, y).unwrap_or(0));

            // Cheap reject on the four compass pixels: a 9-long arc must
            // cover at least 3 of them with one polarity.
            let mut bright_cardinal = 0;
            let mut dark_cardinal = 0;
            for &i in &[0usize, 4, 8, 12] {
                let (dx, dy) = CIRCLE[i];
                let v = sample(img, x, y, dx, dy);
                if v - center > t {
                    bright_cardinal += 1;
                } else if center - v > t {
                    dark_cardinal += 1;
                }
            }
            if bright_cardinal < 3 && dark_cardinal < 3 {
                continue;
            }

            let mut flags = [0i8; 16];
            for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
                let v = sample(img, x, y, dx, dy);
                flags[i] = if v - center > t {
                    1
                } else if center - v > t {
                    -1
                } else {
                    0
                };
            }
            let Some(sign) = arc_sign(&flags) else {
                continue;
            };

            let mut response = 0.0f32;
            for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
                if flags[i] == sign {
                    let v = sample(img, x, y, dx, dy);
                    response += ((v - center).abs() - t) as f32;
                }
            }
            responses[y * width + x] = response;
            candidates.push((x, y));
        }
    }

    // 3x3 non-maximum suppression on the response grid.
    let mut keypoints: Vec<KeyPoint> = candidates
        .into_iter()
        .filter(|&(x, y)| {
            let r = responses[y * width + x];
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (x as i32 + dx) as usize;
                    let ny = (y as i32 + dy) as usize;
                    if responses[ny * width + nx] > r {
                        return false;
                    }
                }
            }
            true
        })
        .map(|(x, y)| KeyPoint {
            x: x as f32,
            y: y as f32,
            response: responses[y * width + x],
        })
        .collect();

    keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
    keypoints.truncate(budget);
    keypoints
}

fn sample(img: ImageView<'_>, x: usize, y: usize, dx: i32, dy: i32) -> i32 {
    let sx = (x as i32 + dx) as usize;
    let sy = (y as i32 + dy) as usize;
    i32::from(img.get(sx, sy).unwrap_or(0))
}

/// Returns the polarity of a contiguous arc of at least [`ARC_LENGTH`]
/// equally classified circle pixels, if one exists.
fn arc_sign(flags: &[i8; 16]) -> Option<i8> {
    for sign in [1i8, -1] {
        let mut run = 0usize;
        for i in 0..16 + ARC_LENGTH {
            if flags[i % 16] == sign {
                run += 1;
                if run >= ARC_LENGTH {
                    return Some(sign);
                }
            } else {
                run = 0;
            }
        }
    }
    None
}
