use clap::Parser;
use screenmatch::image::io::load_gray;
use screenmatch::{
    control_channel, ControlEvent, Detection, Engine, EngineConfig, Frame, FrameSource, Geometry,
    OwnedImage, RenderSink, ScreenMatchResult, Strategy, TickStatus,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "ScreenMatch replay CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StrategyConfig {
    Correlation,
    Feature,
}

impl From<StrategyConfig> for Strategy {
    fn from(value: StrategyConfig) -> Self {
        match value {
            StrategyConfig::Correlation => Strategy::Correlation,
            StrategyConfig::Feature => Strategy::Feature,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EngineConfigJson {
    default_threshold: f32,
    scales: Vec<f32>,
    peaks_per_scale: usize,
    max_per_scale: usize,
    iou_threshold: f32,
    fast_threshold: u8,
    min_good_matches: usize,
    ratio: f32,
    reproj_tolerance: f64,
    max_ransac_iters: usize,
    ransac_seed: u64,
}

impl Default for EngineConfigJson {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            default_threshold: cfg.default_threshold,
            scales: cfg.scales,
            peaks_per_scale: cfg.peaks_per_scale,
            max_per_scale: cfg.max_per_scale,
            iou_threshold: cfg.iou_threshold,
            fast_threshold: cfg.fast_threshold,
            min_good_matches: cfg.min_good_matches,
            ratio: cfg.ratio,
            reproj_tolerance: cfg.reproj_tolerance,
            max_ransac_iters: cfg.max_ransac_iters,
            ransac_seed: cfg.ransac_seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    templates_dir: String,
    frames: Vec<String>,
    strategy: StrategyConfig,
    output_path: Option<String>,
    engine: EngineConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: String::new(),
            frames: Vec::new(),
            strategy: StrategyConfig::Correlation,
            output_path: None,
            engine: EngineConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    template: String,
    confidence: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    quad: Option<[[f32; 2]; 4]>,
}

impl From<&Detection> for DetectionRecord {
    fn from(det: &Detection) -> Self {
        let bounds = det.geometry.bounds();
        let quad = match det.geometry {
            Geometry::Quad(q) => Some(q),
            Geometry::Box(_) => None,
        };
        Self {
            template: det.template.clone(),
            confidence: det.confidence,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            quad,
        }
    }
}

#[derive(Debug, Serialize)]
struct TickRecord {
    frame: usize,
    detections: Vec<DetectionRecord>,
}

/// Capture backend replaying a fixed list of image files, one per grab.
struct ReplayBackend {
    paths: Vec<String>,
    next: usize,
}

impl ReplayBackend {
    fn new(paths: Vec<String>) -> Self {
        Self { paths, next: 0 }
    }
}

impl screenmatch::CaptureBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn grab(&mut self) -> ScreenMatchResult<Option<OwnedImage>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        load_gray(path).map(Some)
    }
}

/// Sink that buffers the detections of the current frame and flushes a
/// record per matched tick.
struct JsonSink {
    records: Rc<RefCell<Vec<TickRecord>>>,
    pending: Option<Vec<DetectionRecord>>,
    frame: usize,
}

impl RenderSink for JsonSink {
    fn present(&mut self, _frame: &Frame, detections: &[Detection]) -> ScreenMatchResult<()> {
        self.pending = Some(detections.iter().map(DetectionRecord::from).collect());
        Ok(())
    }

    fn status(&mut self, _status: &TickStatus<'_>) {
        if let Some(detections) = self.pending.take() {
            self.records.borrow_mut().push(TickRecord {
                frame: self.frame,
                detections,
            });
            self.frame += 1;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("screenmatch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.templates_dir.is_empty() {
        return Err("templates_dir must be set in the config".into());
    }
    if config.frames.is_empty() {
        return Err("frames must list at least one image".into());
    }

    let engine_cfg = EngineConfig {
        strategy: config.strategy.into(),
        default_threshold: config.engine.default_threshold,
        scales: config.engine.scales,
        peaks_per_scale: config.engine.peaks_per_scale,
        max_per_scale: config.engine.max_per_scale,
        iou_threshold: config.engine.iou_threshold,
        fast_threshold: config.engine.fast_threshold,
        min_good_matches: config.engine.min_good_matches,
        ratio: config.engine.ratio,
        reproj_tolerance: config.engine.reproj_tolerance,
        max_ransac_iters: config.engine.max_ransac_iters,
        ransac_seed: config.engine.ransac_seed,
        ..EngineConfig::default()
    };

    let templates = screenmatch::load_dir(&config.templates_dir, &engine_cfg)?;
    let frame_count = config.frames.len();
    let source = FrameSource::new(
        None,
        Box::new(ReplayBackend::new(config.frames)),
        &engine_cfg,
    );

    let records = Rc::new(RefCell::new(Vec::new()));
    let sink = JsonSink {
        records: Rc::clone(&records),
        pending: None,
        frame: 0,
    };

    let (tx, rx) = control_channel();
    let mut engine = Engine::new(engine_cfg, templates, source, Box::new(sink), rx)?;

    engine.start();
    tx.send(ControlEvent::Toggle)?;
    for _ in 0..frame_count {
        if !engine.tick()? {
            break;
        }
    }
    tx.send(ControlEvent::Quit)?;
    engine.tick()?;

    let json = serde_json::to_string_pretty(&*records.borrow())?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
