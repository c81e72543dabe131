//! Scale-swept masked correlation matching.
//!
//! For every template and every configured scale factor the matcher
//! computes a masked ZNCC response surface, records the frame-wide best
//! score, and greedily extracts peaks: take the global maximum, stop when
//! it drops below the template's threshold, otherwise emit a candidate and
//! zero a neighborhood of about a third of the template's size around it
//! before repeating.

use crate::config::EngineConfig;
use crate::detection::{BoundingBox, Detection, Geometry, Provenance};
use crate::image::ImageView;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::collections::BTreeMap;

mod accel;
mod scan;

pub use accel::{detect_accel, CorrelationAccel};
pub use scan::{response_surface_scalar, ResponseSurface};

/// Multiscale correlation matcher with an optional accelerated kernel.
pub struct CorrelationMatcher {
    accel: Option<Box<dyn CorrelationAccel>>,
}

impl CorrelationMatcher {
    /// Creates a matcher, running capability detection once.
    pub fn new(_cfg: &EngineConfig) -> Self {
        let accel = accel::detect_accel();
        if let Some(a) = &accel {
            trace_event!("correlation_accel", backend = a.name());
        }
        Self { accel }
    }

    /// Matches all templates against one frame.
    ///
    /// Returns box candidates (pre-suppression) plus the best raw score per
    /// template, recorded even when below threshold for status display.
    pub fn match_frame(
        &self,
        frame: ImageView<'_>,
        templates: &BTreeMap<String, Template>,
        cfg: &EngineConfig,
    ) -> ScreenMatchResult<(Vec<Detection>, BTreeMap<String, f32>)> {
        let _span = trace_span!("correlation_match", templates = templates.len()).entered();

        let mut candidates = Vec::new();
        let mut best_scores: BTreeMap<String, f32> = templates
            .keys()
            .map(|name| (name.clone(), 0.0f32))
            .collect();

        for template in templates.values() {
            for scale_idx in 0..cfg.scales.len() {
                let scaled = match template.scaled(scale_idx) {
                    Ok(scaled) => scaled,
                    // A tiny scaled variant can lose all variance; skip it.
                    Err(ScreenMatchError::DegenerateTemplate { .. }) => continue,
                    Err(err) => return Err(err),
                };
                if scaled.width() > frame.width() || scaled.height() > frame.height() {
                    continue;
                }

                let mut surface = self.surface(frame, scaled.plan(), scaled.has_mask(), cfg)?;

                if let Some((_, _, top)) = surface.peak() {
                    let entry = best_scores
                        .get_mut(template.name())
                        .expect("score map covers all templates");
                    if top > *entry {
                        *entry = top;
                    }
                }

                self.pick_peaks(
                    &mut surface,
                    template,
                    scaled.width(),
                    scaled.height(),
                    scale_idx,
                    cfg,
                    &mut candidates,
                );
            }
        }

        trace_event!("correlation_candidates", count = candidates.len());
        Ok((candidates, best_scores))
    }

    fn surface(
        &self,
        frame: ImageView<'_>,
        plan: &crate::template::MaskedPlan,
        has_mask: bool,
        cfg: &EngineConfig,
    ) -> ScreenMatchResult<ResponseSurface> {
        // The accelerated path does not support masked templates.
        if !has_mask {
            if let Some(accel) = &self.accel {
                match accel.response_surface(frame, plan, cfg.min_window_variance) {
                    Ok(surface) => return Ok(surface),
                    Err(_) => {
                        trace_event!("accel_fallback", backend = accel.name());
                    }
                }
            }
        }
        scan::response_surface_scalar(frame, plan, cfg.min_window_variance)
    }

    #[allow(clippy::too_many_arguments)]
    fn pick_peaks(
        &self,
        surface: &mut ResponseSurface,
        template: &Template,
        tpl_width: usize,
        tpl_height: usize,
        scale_idx: usize,
        cfg: &EngineConfig,
        out: &mut Vec<Detection>,
    ) {
        let limit = cfg.peaks_per_scale.min(cfg.max_per_scale);
        let radius_x = tpl_width / 3;
        let radius_y = tpl_height / 3;

        for _ in 0..limit {
            let Some((x, y, score)) = surface.peak() else {
                break;
            };
            if score < template.threshold() {
                break;
            }
            out.push(Detection {
                template: template.name().to_owned(),
                confidence: score.clamp(0.0, 1.0),
                geometry: Geometry::Box(BoundingBox {
                    x: x as f32,
                    y: y as f32,
                    width: tpl_width as f32,
                    height: tpl_height as f32,
                }),
                provenance: Provenance::Scale(scale_idx),
            });
            surface.suppress_region(x, y, radius_x, radius_y);
        }
    }
}
