//! Masked ZNCC plan precomputation.
//!
//! A plan caches everything about a (possibly masked) template that does not
//! depend on the frame: the per-pixel weights, the weighted zero-mean
//! template `t_prime`, its variance `var_t`, and the valid-pixel count
//! `sum_w`. With these, the score at one placement reduces to a dot product
//! and two weighted image sums.

use crate::image::ImageView;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Precomputed statistics for masked normalized cross-correlation.
pub struct MaskedPlan {
    width: usize,
    height: usize,
    sum_w: f32,
    var_t: f32,
    t_prime: Vec<f32>,
    weights: Vec<u8>,
}

impl MaskedPlan {
    /// Builds a plan from a template view and an optional binary mask.
    ///
    /// A missing mask weights every pixel; nonzero mask pixels are valid.
    pub fn build(tpl: ImageView<'_>, mask: Option<&[u8]>) -> ScreenMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width * height;

        if let Some(m) = mask {
            if m.len() != count {
                return Err(ScreenMatchError::MaskMismatch {
                    expected: count,
                    got: m.len(),
                });
            }
        }

        let mut weights = vec![1u8; count];
        if let Some(m) = mask {
            for (w, &v) in weights.iter_mut().zip(m.iter()) {
                *w = u8::from(v != 0);
            }
        }

        let mut sum_w = 0.0f64;
        let mut sum_t = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: 0,
            })?;
            for (x, &value) in row.iter().enumerate() {
                if weights[y * width + x] != 0 {
                    sum_w += 1.0;
                    sum_t += value as f64;
                }
            }
        }
        if sum_w < 2.0 {
            return Err(ScreenMatchError::DegenerateTemplate {
                reason: "mask leaves no valid pixels",
            });
        }

        let mean = sum_t / sum_w;
        let mut t_prime = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: 0,
            })?;
            for (x, &value) in row.iter().enumerate() {
                if weights[y * width + x] != 0 {
                    let d = value as f64 - mean;
                    var_t += d * d;
                    t_prime.push(d as f32);
                } else {
                    t_prime.push(0.0);
                }
            }
        }
        if var_t <= 1e-8 {
            return Err(ScreenMatchError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            sum_w: sum_w as f32,
            var_t: var_t as f32,
            t_prime,
            weights,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of valid (weighted) pixels.
    pub fn sum_w(&self) -> f32 {
        self.sum_w
    }

    /// Returns the weighted template variance.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Returns the weighted zero-mean template in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }

    /// Returns the 0/1 pixel weights in row-major order.
    pub fn weights(&self) -> &[u8] {
        &self.weights
    }
}
