//! Reference templates and their precomputed per-strategy data.
//!
//! Templates are loaded once at startup and stay immutable for the process
//! lifetime, except for the scale cache: each configured scale factor has a
//! `OnceLock` slot filled at most once with the resized image, resized mask,
//! and masked ZNCC plan for that scale. Slots are pure functions of
//! (template, scale), so memoizing them indefinitely is safe.

use crate::feature::{Descriptor, KeyPoint};
use crate::image::{resize, ImageView, OwnedImage};
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::sync::OnceLock;

mod plan;
#[cfg(feature = "image-io")]
pub mod store;

pub use plan::MaskedPlan;

/// Keypoints, descriptors, and reference corners extracted at load time
/// for the feature-matching strategy.
pub struct FeatureSet {
    /// Keypoint positions in template space.
    pub keypoints: Vec<KeyPoint>,
    /// Binary descriptors, index-aligned with `keypoints`.
    pub descriptors: Vec<Descriptor>,
    /// The four template corners (top-left, top-right, bottom-right,
    /// bottom-left) used for quadrilateral reprojection.
    pub corners: [[f32; 2]; 4],
}

/// A template resized to one scale factor, with its correlation plan.
pub struct ScaledTemplate {
    image: OwnedImage,
    mask: Option<Vec<u8>>,
    plan: MaskedPlan,
}

impl std::fmt::Debug for ScaledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaledTemplate")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("has_mask", &self.has_mask())
            .finish_non_exhaustive()
    }
}

impl ScaledTemplate {
    fn build(image: OwnedImage, mask: Option<Vec<u8>>) -> ScreenMatchResult<Self> {
        let plan = MaskedPlan::build(image.view(), mask.as_deref())?;
        Ok(Self { image, mask, plan })
    }

    /// Returns the scaled width in pixels.
    pub fn width(&self) -> usize {
        self.image.width()
    }

    /// Returns the scaled height in pixels.
    pub fn height(&self) -> usize {
        self.image.height()
    }

    /// Returns whether this variant carries a transparency mask.
    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Returns the precomputed correlation plan.
    pub fn plan(&self) -> &MaskedPlan {
        &self.plan
    }
}

/// A loaded reference image with its match threshold and lazy caches.
pub struct Template {
    name: String,
    image: OwnedImage,
    mask: Option<Vec<u8>>,
    threshold: f32,
    scales: Vec<f32>,
    scaled: Vec<OnceLock<ScaledTemplate>>,
    features: Option<FeatureSet>,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .field("scales", &self.scales)
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Creates a template from a grayscale buffer and an optional binary
    /// mask of the same dimensions.
    ///
    /// The threshold must be strictly inside (0, 1). `scales` is the
    /// engine's configured scale list; one cache slot is reserved per entry.
    pub fn new(
        name: impl Into<String>,
        image: OwnedImage,
        mask: Option<Vec<u8>>,
        threshold: f32,
        scales: &[f32],
    ) -> ScreenMatchResult<Self> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ScreenMatchError::ThresholdOutOfRange { value: threshold });
        }
        if let Some(m) = &mask {
            let expected = image.width() * image.height();
            if m.len() != expected {
                return Err(ScreenMatchError::MaskMismatch {
                    expected,
                    got: m.len(),
                });
            }
        }
        let slots = (0..scales.len()).map(|_| OnceLock::new()).collect();
        Ok(Self {
            name: name.into(),
            image,
            mask,
            threshold,
            scales: scales.to_vec(),
            scaled: slots,
            features: None,
        })
    }

    /// Attaches eagerly extracted feature data (feature strategy only).
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = Some(features);
        self
    }

    /// Returns the template's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the per-template match threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the unscaled template width in pixels.
    pub fn width(&self) -> usize {
        self.image.width()
    }

    /// Returns the unscaled template height in pixels.
    pub fn height(&self) -> usize {
        self.image.height()
    }

    /// Returns a view of the unscaled grayscale image.
    pub fn view(&self) -> ImageView<'_> {
        self.image.view()
    }

    /// Returns the feature data, if extracted at load time.
    pub fn features(&self) -> Option<&FeatureSet> {
        self.features.as_ref()
    }

    /// Returns the cached scaled variant for a scale-list index, building
    /// it on first use.
    ///
    /// A factor within 1e-3 of 1.0 reuses the original pixels without
    /// resampling; otherwise the image is area-averaged and the mask
    /// resampled nearest-neighbor.
    pub fn scaled(&self, scale_idx: usize) -> ScreenMatchResult<&ScaledTemplate> {
        let slot = self
            .scaled
            .get(scale_idx)
            .ok_or(ScreenMatchError::IndexOutOfBounds {
                index: scale_idx,
                len: self.scaled.len(),
                context: "scale",
            })?;
        if let Some(cached) = slot.get() {
            return Ok(cached);
        }

        let scale = self.scales[scale_idx];
        let variant = if (scale - 1.0).abs() < 1e-3 {
            ScaledTemplate::build(self.image.clone(), self.mask.clone())?
        } else {
            let (dst_w, dst_h) = resize::scaled_dims(self.width(), self.height(), scale);
            let image = resize::resize_image(self.image.view(), dst_w, dst_h)?;
            let mask = self.mask.as_ref().map(|m| {
                resize::resize_mask_nearest(m, self.width(), self.height(), dst_w, dst_h)
            });
            ScaledTemplate::build(image, mask)?
        };

        let _ = slot.set(variant);
        Ok(slot.get().expect("scale slot was just filled"))
    }
}

/// Parses an optional `@<threshold>` suffix from a filename stem.
///
/// `wheat lvl 1@0.72` yields 0.72; a missing, malformed, or out-of-range
/// suffix yields the default.
pub fn parse_threshold(stem: &str, default: f32) -> f32 {
    match stem.rsplit_once('@') {
        Some((_, suffix)) => match suffix.parse::<f32>() {
            Ok(t) if t > 0.0 && t < 1.0 => t,
            _ => default,
        },
        None => default,
    }
}
