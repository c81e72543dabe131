use screenmatch::{
    CaptureBackend, EngineConfig, FrameSource, OwnedImage, ScreenMatchError, ScreenMatchResult,
    SourceTag,
};
use std::cell::RefCell;
use std::rc::Rc;

fn bright_frame() -> OwnedImage {
    OwnedImage::new(vec![128u8; 16 * 16], 16, 16).unwrap()
}

fn black_frame() -> OwnedImage {
    OwnedImage::new(vec![0u8; 16 * 16], 16, 16).unwrap()
}

enum Script {
    Frame(fn() -> OwnedImage),
    Empty,
    Fail,
}

#[derive(Default)]
struct BackendLog {
    grabs: usize,
    stopped: bool,
}

/// Backend replaying a fixed script of grab outcomes, recording calls.
struct ScriptedBackend {
    name: &'static str,
    script: Vec<Script>,
    log: Rc<RefCell<BackendLog>>,
}

impl ScriptedBackend {
    fn new(name: &'static str, script: Vec<Script>) -> (Self, Rc<RefCell<BackendLog>>) {
        let log = Rc::new(RefCell::new(BackendLog::default()));
        (
            Self {
                name,
                script,
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl CaptureBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn grab(&mut self) -> ScreenMatchResult<Option<OwnedImage>> {
        let step = self.log.borrow().grabs;
        self.log.borrow_mut().grabs += 1;
        match self.script.get(step) {
            Some(Script::Frame(make)) => Ok(Some(make())),
            Some(Script::Empty) | None => Ok(None),
            Some(Script::Fail) => Err(ScreenMatchError::CaptureFailed {
                backend: self.name,
                reason: "scripted failure".to_owned(),
            }),
        }
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stopped = true;
    }
}

fn endless(name: &'static str) -> (ScriptedBackend, Rc<RefCell<BackendLog>>) {
    let script = (0..16).map(|_| Script::Frame(bright_frame)).collect();
    ScriptedBackend::new(name, script)
}

#[test]
fn healthy_primary_is_preferred() {
    let cfg = EngineConfig::default();
    let (primary, primary_log) = endless("primary");
    let (secondary, secondary_log) = endless("secondary");
    let mut source = FrameSource::new(Some(Box::new(primary)), Box::new(secondary), &cfg);

    assert_eq!(source.active_source(), SourceTag::Primary);
    let frame = source.next().unwrap().unwrap();
    assert_eq!(frame.source, SourceTag::Primary);
    assert_eq!(secondary_log.borrow().grabs, 0);
    assert!(!primary_log.borrow().stopped);
}

#[test]
fn degenerate_primary_frame_demotes_permanently() {
    let cfg = EngineConfig::default();
    let (primary, primary_log) = ScriptedBackend::new(
        "primary",
        vec![Script::Frame(black_frame), Script::Frame(bright_frame)],
    );
    let (secondary, _) = endless("secondary");
    let mut source = FrameSource::new(Some(Box::new(primary)), Box::new(secondary), &cfg);

    // The black frame triggers fallback within the same call.
    let frame = source.next().unwrap().unwrap();
    assert_eq!(frame.source, SourceTag::Secondary);
    assert!(primary_log.borrow().stopped);
    assert_eq!(source.active_source(), SourceTag::Secondary);

    // Even though the primary would now produce good frames, demotion
    // holds for the source's lifetime.
    let frame = source.next().unwrap().unwrap();
    assert_eq!(frame.source, SourceTag::Secondary);
    assert_eq!(primary_log.borrow().grabs, 1);
}

#[test]
fn primary_error_demotes_permanently() {
    let cfg = EngineConfig::default();
    let (primary, primary_log) = ScriptedBackend::new("primary", vec![Script::Fail]);
    let (secondary, _) = endless("secondary");
    let mut source = FrameSource::new(Some(Box::new(primary)), Box::new(secondary), &cfg);

    let frame = source.next().unwrap().unwrap();
    assert_eq!(frame.source, SourceTag::Secondary);
    assert!(primary_log.borrow().stopped);
}

#[test]
fn empty_primary_poll_is_not_demotion() {
    let cfg = EngineConfig::default();
    let (primary, primary_log) = ScriptedBackend::new(
        "primary",
        vec![Script::Empty, Script::Frame(bright_frame)],
    );
    let (secondary, secondary_log) = endless("secondary");
    let mut source = FrameSource::new(Some(Box::new(primary)), Box::new(secondary), &cfg);

    // No frame yet; the primary stays active and the secondary is untouched.
    assert!(source.next().unwrap().is_none());
    assert_eq!(source.active_source(), SourceTag::Primary);
    assert!(!primary_log.borrow().stopped);
    assert_eq!(secondary_log.borrow().grabs, 0);

    let frame = source.next().unwrap().unwrap();
    assert_eq!(frame.source, SourceTag::Primary);
}

#[test]
fn secondary_only_source_works() {
    let cfg = EngineConfig::default();
    let (secondary, _) = endless("secondary");
    let mut source = FrameSource::new(None, Box::new(secondary), &cfg);

    assert_eq!(source.active_source(), SourceTag::Secondary);
    let frame = source.next().unwrap().unwrap();
    assert_eq!(frame.source, SourceTag::Secondary);
}

#[test]
fn exhausted_secondary_is_an_error() {
    let cfg = EngineConfig::default();
    let (secondary, _) = ScriptedBackend::new("secondary", vec![Script::Empty]);
    let mut source = FrameSource::new(None, Box::new(secondary), &cfg);

    let err = source.next().unwrap_err();
    assert!(matches!(
        err,
        ScreenMatchError::CaptureFailed {
            backend: "secondary",
            ..
        }
    ));
}

#[test]
fn stop_reaches_all_backends() {
    let cfg = EngineConfig::default();
    let (primary, primary_log) = endless("primary");
    let (secondary, secondary_log) = endless("secondary");
    let mut source = FrameSource::new(Some(Box::new(primary)), Box::new(secondary), &cfg);

    source.stop();
    assert!(primary_log.borrow().stopped);
    assert!(secondary_log.borrow().stopped);
}
