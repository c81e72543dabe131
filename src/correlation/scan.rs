//! Dense masked ZNCC evaluation over all template placements.
//!
//! Unlike a plain top-K scan, the full response surface is materialized:
//! the greedy peak picker needs to zero out neighborhoods around accepted
//! peaks before re-querying the maximum.

use crate::image::ImageView;
use crate::template::MaskedPlan;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Correlation scores for every valid top-left placement of one template.
///
/// Placements where the windowed image variance is below the configured
/// minimum hold `NEG_INFINITY` and can never become peaks.
pub struct ResponseSurface {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ResponseSurface {
    pub(crate) fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Returns the surface width (number of x placements).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the surface height (number of y placements).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the location and value of the global maximum, if any score
    /// is finite.
    pub fn peak(&self) -> Option<(usize, usize, f32)> {
        let mut best: Option<(usize, usize, f32)> = None;
        for (idx, &score) in self.data.iter().enumerate() {
            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((idx % self.width, idx / self.width, score));
            }
        }
        best
    }

    /// Zeroes a neighborhood of `±radius_x` / `±radius_y` around a peak so
    /// the next greedy pick lands elsewhere.
    pub fn suppress_region(&mut self, cx: usize, cy: usize, radius_x: usize, radius_y: usize) {
        let x0 = cx.saturating_sub(radius_x);
        let y0 = cy.saturating_sub(radius_y);
        let x1 = (cx + radius_x + 1).min(self.width);
        let y1 = (cy + radius_y + 1).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.data[y * self.width + x] = 0.0;
            }
        }
    }
}

/// Computes the masked ZNCC response surface with the scalar kernel.
pub fn response_surface_scalar(
    frame: ImageView<'_>,
    plan: &MaskedPlan,
    min_window_variance: f32,
) -> ScreenMatchResult<ResponseSurface> {
    let (out_w, out_h) = surface_dims(frame, plan)?;
    let mut data = vec![f32::NEG_INFINITY; out_w * out_h];
    for (y, row) in data.chunks_mut(out_w).enumerate() {
        score_row(frame, plan, min_window_variance, y, row);
    }
    Ok(ResponseSurface::new(out_w, out_h, data))
}

pub(crate) fn surface_dims(
    frame: ImageView<'_>,
    plan: &MaskedPlan,
) -> ScreenMatchResult<(usize, usize)> {
    let fw = frame.width();
    let fh = frame.height();
    let tw = plan.width();
    let th = plan.height();
    if fw < tw || fh < th {
        return Err(ScreenMatchError::InvalidDimensions {
            width: fw,
            height: fh,
        });
    }
    Ok((fw - tw + 1, fh - th + 1))
}

/// Scores every x placement for one y row of the surface.
pub(crate) fn score_row(
    frame: ImageView<'_>,
    plan: &MaskedPlan,
    min_window_variance: f32,
    y: usize,
    out: &mut [f32],
) {
    let tpl_w = plan.width();
    let tpl_h = plan.height();
    let sum_w = plan.sum_w();
    let var_t = plan.var_t();
    let t_prime = plan.t_prime();
    let weights = plan.weights();

    for (x, slot) in out.iter_mut().enumerate() {
        let mut dot = 0.0f32;
        let mut sum_i = 0.0f32;
        let mut sum_i2 = 0.0f32;

        for ty in 0..tpl_h {
            let Some(img_row) = frame.row(y + ty) else {
                return;
            };
            let base = ty * tpl_w;
            for tx in 0..tpl_w {
                let idx = base + tx;
                let value = img_row[x + tx] as f32;
                dot += t_prime[idx] * value;
                if weights[idx] != 0 {
                    sum_i += value;
                    sum_i2 += value * value;
                }
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / sum_w;
        if var_i <= min_window_variance {
            continue;
        }
        let score = dot / (var_t * var_i).sqrt();
        if score.is_finite() {
            *slot = score;
        }
    }
}
