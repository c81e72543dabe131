//! Template discovery and loading from a directory.
//!
//! Every image file in the configured directory is a candidate template.
//! Unreadable or degenerate files are skipped, not fatal; only an empty
//! result is an error, because the engine has nothing to look for.

use crate::config::{EngineConfig, Strategy};
use crate::feature;
use crate::image::io;
use crate::template::{parse_threshold, FeatureSet, Template};
use crate::trace::trace_event;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::collections::BTreeMap;
use std::path::Path;

/// Loads all readable templates from a directory.
///
/// The filename convention `<name>@<threshold>.<ext>` sets a per-template
/// threshold when the value is strictly inside (0, 1); otherwise the
/// configured default applies. For the feature strategy, keypoints and
/// descriptors are extracted eagerly here.
pub fn load_dir(
    dir: impl AsRef<Path>,
    cfg: &EngineConfig,
) -> ScreenMatchResult<BTreeMap<String, Template>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|err| ScreenMatchError::ImageIo {
        reason: format!("{}: {err}", dir.display()),
    })?;

    let mut templates = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match load_one(&path, cfg) {
            Ok(tpl) => {
                templates.insert(tpl.name().to_owned(), tpl);
            }
            Err(_) => {
                trace_event!("template_skipped", path = path.display().to_string());
            }
        }
    }

    if templates.is_empty() {
        return Err(ScreenMatchError::NoTemplates);
    }
    trace_event!("templates_loaded", count = templates.len());
    Ok(templates)
}

fn load_one(path: &Path, cfg: &EngineConfig) -> ScreenMatchResult<Template> {
    let (image, mask) = io::load_template_image(path)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let threshold = parse_threshold(&stem, cfg.default_threshold);

    let template = Template::new(name, image, mask, threshold, &cfg.scales)?;

    if cfg.strategy == Strategy::Feature {
        let (keypoints, descriptors) = feature::detect_and_describe(
            template.view(),
            cfg.fast_threshold,
            cfg.template_keypoint_budget,
        );
        let w = template.width() as f32;
        let h = template.height() as f32;
        let corners = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
        return Ok(template.with_features(FeatureSet {
            keypoints,
            descriptors,
            corners,
        }));
    }

    Ok(template)
}
