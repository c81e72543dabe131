//! Opportunistic acceleration of the correlation computation.
//!
//! One accelerator is selected by capability detection at matcher
//! construction, not re-probed per call. The matcher only offers it
//! unmasked templates; any per-call failure falls back to the scalar
//! kernel for that call without surfacing an error.

use crate::correlation::scan::ResponseSurface;
use crate::image::ImageView;
use crate::template::MaskedPlan;
use crate::util::ScreenMatchResult;

/// A backend that can compute a full response surface faster than the
/// scalar kernel.
pub trait CorrelationAccel: Send + Sync {
    /// Short backend name for trace output.
    fn name(&self) -> &'static str;

    /// Computes the response surface, or fails and lets the caller fall
    /// back to the scalar path.
    fn response_surface(
        &self,
        frame: ImageView<'_>,
        plan: &MaskedPlan,
        min_window_variance: f32,
    ) -> ScreenMatchResult<ResponseSurface>;
}

/// Row-parallel kernel distributing surface rows across the rayon pool.
#[cfg(feature = "rayon")]
pub struct RowParallelAccel;

#[cfg(feature = "rayon")]
impl CorrelationAccel for RowParallelAccel {
    fn name(&self) -> &'static str {
        "rayon-rows"
    }

    fn response_surface(
        &self,
        frame: ImageView<'_>,
        plan: &MaskedPlan,
        min_window_variance: f32,
    ) -> ScreenMatchResult<ResponseSurface> {
        use crate::correlation::scan::{score_row, surface_dims};
        use rayon::prelude::*;

        let (out_w, out_h) = surface_dims(frame, plan)?;
        let mut data = vec![f32::NEG_INFINITY; out_w * out_h];
        data.par_chunks_mut(out_w).enumerate().for_each(|(y, row)| {
            score_row(frame, plan, min_window_variance, y, row);
        });
        Ok(ResponseSurface::new(out_w, out_h, data))
    }
}

/// Selects the best available accelerator, or `None` when only the scalar
/// kernel is compiled in.
pub fn detect_accel() -> Option<Box<dyn CorrelationAccel>> {
    #[cfg(feature = "rayon")]
    {
        Some(Box::new(RowParallelAccel))
    }
    #[cfg(not(feature = "rayon"))]
    {
        None
    }
}
