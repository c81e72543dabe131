//! Frame acquisition with primary/secondary fallback.
//!
//! A [`FrameSource`] wraps up to two capture backends. The primary is
//! preferred until it errors or produces a degenerate frame (near-black,
//! which some capture APIs return for protected or vanished surfaces); from
//! then on the source stays on the secondary for its remaining lifetime.

use crate::config::EngineConfig;
use crate::image::OwnedImage;
use crate::trace::trace_event;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::time::Instant;

/// Which backend produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceTag {
    Primary,
    Secondary,
}

/// One captured grayscale frame.
pub struct Frame {
    /// Grayscale pixel data.
    pub image: OwnedImage,
    /// Capture timestamp.
    pub captured_at: Instant,
    /// The backend that produced this frame.
    pub source: SourceTag,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("captured_at", &self.captured_at)
            .field("source", &self.source)
            .finish()
    }
}

/// A single capture backend.
///
/// `grab` returns `Ok(None)` when no new frame is available right now;
/// that is not an error and does not demote the backend.
pub trait CaptureBackend {
    /// Short backend name for errors and trace output.
    fn name(&self) -> &'static str;

    /// Attempts to capture one frame without blocking.
    fn grab(&mut self) -> ScreenMatchResult<Option<OwnedImage>>;

    /// Releases backend resources. Called once when the engine stops.
    fn stop(&mut self) {}
}

/// Capture frontend with permanent demotion from primary to secondary.
pub struct FrameSource {
    primary: Option<Box<dyn CaptureBackend>>,
    secondary: Box<dyn CaptureBackend>,
    degenerate_mean: f32,
}

impl FrameSource {
    /// Creates a source with an optional fast primary and a mandatory
    /// secondary backend.
    pub fn new(
        primary: Option<Box<dyn CaptureBackend>>,
        secondary: Box<dyn CaptureBackend>,
        cfg: &EngineConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            degenerate_mean: cfg.degenerate_mean,
        }
    }

    /// Returns which backend the next frame will come from.
    pub fn active_source(&self) -> SourceTag {
        if self.primary.is_some() {
            SourceTag::Primary
        } else {
            SourceTag::Secondary
        }
    }

    /// Captures the next frame.
    ///
    /// Returns `Ok(None)` when the active backend has no new frame. A
    /// primary error or degenerate frame demotes to the secondary
    /// immediately (including for this call) and permanently.
    pub fn next(&mut self) -> ScreenMatchResult<Option<Frame>> {
        if let Some(primary) = &mut self.primary {
            match primary.grab() {
                Ok(Some(image)) => {
                    if image.view().mean_intensity() >= self.degenerate_mean {
                        return Ok(Some(Frame {
                            image,
                            captured_at: Instant::now(),
                            source: SourceTag::Primary,
                        }));
                    }
                    trace_event!("primary_demoted", reason = "degenerate frame");
                    self.demote();
                }
                Ok(None) => return Ok(None),
                Err(_) => {
                    trace_event!("primary_demoted", reason = "capture error");
                    self.demote();
                }
            }
        }

        match self.secondary.grab()? {
            Some(image) => Ok(Some(Frame {
                image,
                captured_at: Instant::now(),
                source: SourceTag::Secondary,
            })),
            None => Err(ScreenMatchError::CaptureFailed {
                backend: self.secondary.name(),
                reason: "no frame available".to_owned(),
            }),
        }
    }

    fn demote(&mut self) {
        if let Some(mut primary) = self.primary.take() {
            primary.stop();
        }
    }

    /// Stops all remaining backends.
    pub fn stop(&mut self) {
        self.demote();
        self.secondary.stop();
    }
}
