//! ScreenMatch is a real-time template detection engine for desktop frames.
//!
//! Grayscale frames from a capture source are matched against a set of
//! reference templates with one of two strategies: scale-swept masked ZNCC
//! correlation, or FAST/BRIEF feature matching validated by a RANSAC
//! homography. Duplicate box candidates are suppressed by IoU, and a tick
//! loop drives capture, matching, and presentation under channel control.

pub mod capture;
pub mod config;
pub mod correlation;
pub mod detection;
pub mod engine;
pub mod feature;
pub mod image;
pub mod template;
mod trace;
pub mod util;

pub use capture::{CaptureBackend, Frame, FrameSource, SourceTag};
pub use config::{EngineConfig, Strategy};
pub use correlation::CorrelationMatcher;
pub use detection::{BoundingBox, Detection, Geometry, Provenance};
pub use engine::{control_channel, ControlEvent, Engine, EngineState, RenderSink, TickStatus};
pub use feature::FeatureMatcher;
pub use image::{ImageView, OwnedImage};
pub use template::{parse_threshold, FeatureSet, MaskedPlan, Template};
pub use util::{ScreenMatchError, ScreenMatchResult};

pub use detection::nms::{suppress, suppress_detections};

#[cfg(feature = "image-io")]
pub use template::store::load_dir;
