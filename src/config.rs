//! Engine configuration.
//!
//! All tunables live in one immutable [`EngineConfig`] constructed once and
//! passed explicitly into the template store, the matchers, and the engine
//! loop. Defaults follow values proven out against real desktop captures.

use std::time::Duration;

/// Which matching strategy the engine runs.
///
/// The strategies are mutually exclusive per engine instance; there is no
/// policy for combining their outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Scale-swept masked normalized cross-correlation.
    Correlation,
    /// Keypoint/descriptor matching with homography validation.
    Feature,
}

/// Immutable configuration shared by the store, matchers, and engine loop.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Active matching strategy.
    pub strategy: Strategy,
    /// Default match threshold when a template filename carries none.
    pub default_threshold: f32,
    /// Ascending template scale factors swept by the correlation matcher.
    pub scales: Vec<f32>,
    /// Greedy peaks extracted per (template, scale) response surface.
    pub peaks_per_scale: usize,
    /// Hard cap on candidates emitted per (template, scale).
    pub max_per_scale: usize,
    /// Minimum window variance for a correlation score to be defined.
    pub min_window_variance: f32,
    /// IoU threshold for duplicate suppression of box candidates.
    pub iou_threshold: f32,
    /// FAST corner threshold for the feature path.
    pub fast_threshold: u8,
    /// Keypoint budget for the captured frame, per tick.
    pub frame_keypoint_budget: usize,
    /// Keypoint budget per template, applied once at load.
    pub template_keypoint_budget: usize,
    /// Lowe ratio for accepting a nearest-neighbor correspondence.
    pub ratio: f32,
    /// Minimum good correspondences before homography estimation runs.
    pub min_good_matches: usize,
    /// RANSAC reprojection tolerance in pixels.
    pub reproj_tolerance: f64,
    /// RANSAC iteration cap.
    pub max_ransac_iters: usize,
    /// RANSAC seed, fixed so identical frames produce identical ticks.
    pub ransac_seed: u64,
    /// Keypoint count cap in the feature confidence denominator.
    pub confidence_keypoint_cap: usize,
    /// Mean intensity below which a primary frame counts as degenerate.
    pub degenerate_mean: f32,
    /// Inter-tick delay pacing the engine loop.
    pub tick_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Correlation,
            default_threshold: 0.7,
            scales: vec![
                0.2, 0.25, 0.33, 0.4, 0.5, 0.6, 0.75, 0.85, 1.0, 1.15, 1.33,
            ],
            peaks_per_scale: 2,
            max_per_scale: 3,
            min_window_variance: 1e-6,
            iou_threshold: 0.3,
            fast_threshold: 12,
            frame_keypoint_budget: 2500,
            template_keypoint_budget: 1500,
            ratio: 0.8,
            min_good_matches: 10,
            reproj_tolerance: 4.0,
            max_ransac_iters: 2000,
            ransac_seed: 7,
            confidence_keypoint_cap: 60,
            degenerate_mean: 1.0,
            tick_delay: Duration::from_millis(60),
        }
    }
}
