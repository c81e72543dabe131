//! The detection engine loop and its control surface.
//!
//! The engine is a single-threaded tick loop driven by control events from
//! a channel. Lifecycle is a three-state machine: `Stopped` (loop exits),
//! `Paused` (frames are captured and presented without matching), and
//! `Running` (full match per tick). A toggle event flips between paused and
//! running; quit moves to stopped from any state.

use crate::capture::{Frame, FrameSource};
use crate::config::{EngineConfig, Strategy};
use crate::correlation::CorrelationMatcher;
use crate::detection::{nms, Detection};
use crate::feature::FeatureMatcher;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, Sender};

/// Engine lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Not started, or shut down; the loop will not tick.
    Stopped,
    /// Capturing and presenting, but not matching.
    Paused,
    /// Capturing, matching, and presenting.
    Running,
}

/// Control events delivered through the engine's channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    /// Flip between paused and running. Ignored when stopped.
    Toggle,
    /// Stop the engine from any state.
    Quit,
}

/// Creates the control channel pair for one engine.
pub fn control_channel() -> (Sender<ControlEvent>, Receiver<ControlEvent>) {
    std::sync::mpsc::channel()
}

/// Per-tick status pushed to the render sink.
pub struct TickStatus<'a> {
    /// The engine state after processing this tick's control events.
    pub state: EngineState,
    /// Best raw score per template from the most recent matched tick, or
    /// `None` before the first match.
    pub best_scores: Option<&'a BTreeMap<String, f32>>,
}

/// Consumer of frames, detections, and status lines.
///
/// A `present` error permanently disables presentation for the engine's
/// lifetime; matching and status reporting continue.
pub trait RenderSink {
    /// Shows one frame with its detections.
    fn present(&mut self, frame: &Frame, detections: &[Detection]) -> ScreenMatchResult<()>;

    /// Reports per-tick status.
    fn status(&mut self, status: &TickStatus<'_>);
}

enum Matcher {
    Correlation(CorrelationMatcher),
    Feature(FeatureMatcher),
}

/// The detection engine.
pub struct Engine {
    cfg: EngineConfig,
    templates: BTreeMap<String, Template>,
    matcher: Matcher,
    source: FrameSource,
    sink: Box<dyn RenderSink>,
    control: Receiver<ControlEvent>,
    state: EngineState,
    sink_failed: bool,
    last_scores: Option<BTreeMap<String, f32>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("state", &self.state)
            .field("sink_failed", &self.sink_failed)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Assembles an engine. Fails when the template map is empty.
    pub fn new(
        cfg: EngineConfig,
        templates: BTreeMap<String, Template>,
        source: FrameSource,
        sink: Box<dyn RenderSink>,
        control: Receiver<ControlEvent>,
    ) -> ScreenMatchResult<Self> {
        if templates.is_empty() {
            return Err(ScreenMatchError::NoTemplates);
        }
        let matcher = match cfg.strategy {
            Strategy::Correlation => Matcher::Correlation(CorrelationMatcher::new(&cfg)),
            Strategy::Feature => Matcher::Feature(FeatureMatcher::new(&cfg)),
        };
        Ok(Self {
            cfg,
            templates,
            matcher,
            source,
            sink,
            control,
            state: EngineState::Stopped,
            sink_failed: false,
            last_scores: None,
        })
    }

    /// Moves a stopped engine into the paused state. No-op otherwise.
    pub fn start(&mut self) {
        if self.state == EngineState::Stopped {
            self.state = EngineState::Paused;
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Processes one tick: drains control events, captures, matches when
    /// running, presents, and reports status.
    ///
    /// Returns `Ok(false)` once the engine has stopped and the loop should
    /// exit.
    pub fn tick(&mut self) -> ScreenMatchResult<bool> {
        let _span = trace_span!("engine_tick").entered();

        for event in self.control.try_iter() {
            match event {
                ControlEvent::Quit => self.state = EngineState::Stopped,
                ControlEvent::Toggle => {
                    self.state = match self.state {
                        EngineState::Paused => EngineState::Running,
                        EngineState::Running => EngineState::Paused,
                        EngineState::Stopped => EngineState::Stopped,
                    }
                }
            }
        }

        if self.state == EngineState::Stopped {
            self.source.stop();
            self.push_status();
            return Ok(false);
        }

        let Some(frame) = self.source.next()? else {
            // No new frame this tick; report status and try again later.
            self.push_status();
            return Ok(true);
        };

        let detections = if self.state == EngineState::Running {
            self.match_frame(&frame)
        } else {
            Vec::new()
        };

        self.present(&frame, &detections);
        self.push_status();
        Ok(true)
    }

    /// Runs the loop until a quit event or a capture error.
    pub fn run(&mut self) -> ScreenMatchResult<()> {
        self.start();
        while self.tick()? {
            std::thread::sleep(self.cfg.tick_delay);
        }
        Ok(())
    }

    fn match_frame(&mut self, frame: &Frame) -> Vec<Detection> {
        let view = frame.image.view();
        let matched = match &self.matcher {
            Matcher::Correlation(m) => m
                .match_frame(view, &self.templates, &self.cfg)
                .map(|(candidates, scores)| {
                    (
                        nms::suppress_detections(candidates, self.cfg.iou_threshold),
                        scores,
                    )
                }),
            Matcher::Feature(m) => m.match_frame(view, &self.templates, &self.cfg),
        };
        match matched {
            Ok((detections, scores)) => {
                self.last_scores = Some(scores);
                detections
            }
            // A bad tick must not kill the loop; log and present nothing.
            Err(err) => {
                trace_event!("match_failed", error = err.to_string());
                Vec::new()
            }
        }
    }

    fn present(&mut self, frame: &Frame, detections: &[Detection]) {
        if self.sink_failed {
            return;
        }
        if let Err(err) = self.sink.present(frame, detections) {
            trace_event!("render_sink_disabled", error = err.to_string());
            self.sink_failed = true;
        }
    }

    fn push_status(&mut self) {
        let status = TickStatus {
            state: self.state,
            best_scores: self.last_scores.as_ref(),
        };
        self.sink.status(&status);
    }
}
