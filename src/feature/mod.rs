//! Keypoint-based matching with homography validation.
//!
//! Scale and perspective invariance comes from geometry rather than a scale
//! sweep: FAST corners are described with BRIEF descriptors, matched
//! through an LSH index with a ratio test, and validated by a RANSAC
//! homography. A template detection reprojects the template corners into
//! the frame as a quadrilateral.

use crate::config::EngineConfig;
use crate::detection::{Detection, Geometry, Provenance};
use crate::image::ImageView;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::ScreenMatchResult;
use std::collections::BTreeMap;

pub mod brief;
pub mod fast;
pub mod homography;
pub mod index;

pub use brief::Descriptor;
pub use fast::KeyPoint;

use homography::RansacParams;
use index::HammingIndex;

/// Pixels kept clear of every border so the descriptor patch always fits
/// around a detected corner.
pub(crate) const DETECT_MARGIN: usize = 16;

/// Runs detection and description in one pass over a grayscale image.
///
/// Images too small for the border margin yield no features.
pub fn detect_and_describe(
    img: ImageView<'_>,
    fast_threshold: u8,
    budget: usize,
) -> (Vec<KeyPoint>, Vec<Descriptor>) {
    let keypoints = fast::detect(img, fast_threshold, budget);
    let descriptors = brief::describe(img, &keypoints);
    (keypoints, descriptors)
}

/// Feature-matching strategy over all loaded templates.
pub struct FeatureMatcher;

impl FeatureMatcher {
    pub fn new(_cfg: &EngineConfig) -> Self {
        Self
    }

    /// Matches all templates against one frame.
    ///
    /// Frame features are extracted once per call and indexed; each
    /// template's load-time descriptors are then matched against the index.
    /// The best-score map records the good-correspondence count for every
    /// template, even those failing the homography gate.
    pub fn match_frame(
        &self,
        frame: ImageView<'_>,
        templates: &BTreeMap<String, Template>,
        cfg: &EngineConfig,
    ) -> ScreenMatchResult<(Vec<Detection>, BTreeMap<String, f32>)> {
        let _span = trace_span!("feature_match", templates = templates.len()).entered();

        let mut best_scores: BTreeMap<String, f32> = templates
            .keys()
            .map(|name| (name.clone(), 0.0f32))
            .collect();

        let (frame_kps, frame_descs) =
            detect_and_describe(frame, cfg.fast_threshold, cfg.frame_keypoint_budget);
        trace_event!("frame_features", count = frame_kps.len());
        if frame_descs.len() < 2 {
            return Ok((Vec::new(), best_scores));
        }

        let idx = HammingIndex::build(&frame_descs, cfg.ransac_seed);
        let mut candidates = Vec::new();

        for template in templates.values() {
            let Some(features) = template.features() else {
                continue;
            };
            if features.descriptors.is_empty() {
                continue;
            }

            let good = good_matches(features, &idx, cfg.ratio);
            if let Some(entry) = best_scores.get_mut(template.name()) {
                *entry = good.len() as f32;
            }
            if good.len() < cfg.min_good_matches {
                continue;
            }

            let src: Vec<[f64; 2]> = good
                .iter()
                .map(|&(ti, _)| {
                    let kp = &features.keypoints[ti];
                    [f64::from(kp.x), f64::from(kp.y)]
                })
                .collect();
            let dst: Vec<[f64; 2]> = good
                .iter()
                .map(|&(_, fi)| {
                    let kp = &frame_kps[fi];
                    [f64::from(kp.x), f64::from(kp.y)]
                })
                .collect();

            let params = RansacParams {
                max_iters: cfg.max_ransac_iters,
                tolerance: cfg.reproj_tolerance,
                seed: cfg.ransac_seed,
            };
            let Some((h, inliers)) = homography::fit_ransac(&src, &dst, &params) else {
                trace_event!("homography_rejected", template = template.name());
                continue;
            };

            let denom = features
                .keypoints
                .len()
                .min(cfg.confidence_keypoint_cap)
                .max(1);
            let confidence = (inliers as f32 / denom as f32).min(1.0);

            let quad = features.corners.map(|[cx, cy]| {
                let p = homography::project(&h, f64::from(cx), f64::from(cy));
                [p[0] as f32, p[1] as f32]
            });

            candidates.push(Detection {
                template: template.name().to_owned(),
                confidence,
                geometry: Geometry::Quad(quad),
                provenance: Provenance::Homography(h),
            });
        }

        trace_event!("feature_candidates", count = candidates.len());
        Ok((candidates, best_scores))
    }
}

/// Collects ratio-test survivors as `(template index, frame index)` pairs.
fn good_matches(
    features: &crate::template::FeatureSet,
    idx: &HammingIndex<'_>,
    ratio: f32,
) -> Vec<(usize, usize)> {
    let mut good = Vec::new();
    for (ti, desc) in features.descriptors.iter().enumerate() {
        if let Some((fi, best, second)) = idx.two_nearest(desc) {
            if (best as f32) < ratio * second as f32 {
                good.push((ti, fi));
            }
        }
    }
    good
}
