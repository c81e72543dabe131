use screenmatch::image::resize;
use screenmatch::{
    CorrelationMatcher, Detection, EngineConfig, Geometry, ImageView, OwnedImage, Provenance,
    Template,
};
use std::collections::BTreeMap;

/// Deterministic high-variance test pattern.
fn pattern(width: usize, height: usize) -> OwnedImage {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            data[y * width + x] = ((x * x * 3 + y * y * 5) % 251) as u8;
        }
    }
    OwnedImage::new(data, width, height).unwrap()
}

/// Smooth gradient background that correlates poorly with the pattern.
fn gradient_frame(width: usize, height: usize) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            data[y * width + x] = ((x + 2 * y) % 200) as u8;
        }
    }
    data
}

fn paste(frame: &mut [u8], frame_width: usize, img: &OwnedImage, left: usize, top: usize) {
    for y in 0..img.height() {
        let row = img.view().row(y).unwrap();
        let dst = (top + y) * frame_width + left;
        frame[dst..dst + img.width()].copy_from_slice(row);
    }
}

fn config(scales: Vec<f32>) -> EngineConfig {
    EngineConfig {
        scales,
        ..EngineConfig::default()
    }
}

fn templates_of(tpl: Template) -> BTreeMap<String, Template> {
    let mut map = BTreeMap::new();
    map.insert(tpl.name().to_owned(), tpl);
    map
}

fn box_of(det: &Detection) -> screenmatch::BoundingBox {
    match det.geometry {
        Geometry::Box(b) => b,
        Geometry::Quad(_) => panic!("correlation detections are boxes"),
    }
}

#[test]
fn finds_pasted_template_at_unit_scale() {
    let cfg = config(vec![0.5, 1.0]);
    let tpl_img = pattern(24, 20);
    let mut frame = gradient_frame(160, 120);
    paste(&mut frame, 160, &tpl_img, 40, 30);

    let templates = templates_of(Template::new("p", tpl_img, None, 0.7, &cfg.scales).unwrap());
    let matcher = CorrelationMatcher::new(&cfg);
    let view = ImageView::from_slice(&frame, 160, 120).unwrap();
    let (candidates, best_scores) = matcher.match_frame(view, &templates, &cfg).unwrap();

    let best = candidates
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .expect("pattern should be found");
    let b = box_of(best);
    assert_eq!((b.x, b.y), (40.0, 30.0));
    assert_eq!((b.width, b.height), (24.0, 20.0));
    assert!(best.confidence > 0.99);
    assert!(matches!(best.provenance, Provenance::Scale(1)));
    assert!(best_scores["p"] > 0.99);
}

#[test]
fn finds_downscaled_template() {
    let cfg = config(vec![0.5, 1.0]);
    let tpl_img = pattern(24, 20);
    // Paste a half-size rendition produced by the same resampler the
    // matcher uses for its scaled variants.
    let small = resize::resize_image(tpl_img.view(), 12, 10).unwrap();
    let mut frame = gradient_frame(160, 120);
    paste(&mut frame, 160, &small, 80, 64);

    let templates = templates_of(Template::new("p", tpl_img, None, 0.7, &cfg.scales).unwrap());
    let matcher = CorrelationMatcher::new(&cfg);
    let view = ImageView::from_slice(&frame, 160, 120).unwrap();
    let (candidates, _) = matcher.match_frame(view, &templates, &cfg).unwrap();

    let best = candidates
        .iter()
        .filter(|d| matches!(d.provenance, Provenance::Scale(0)))
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .expect("half-scale pattern should be found");
    let b = box_of(best);
    assert_eq!((b.x, b.y), (80.0, 64.0));
    assert_eq!((b.width, b.height), (12.0, 10.0));
    assert!(best.confidence > 0.99);
}

#[test]
fn masked_region_is_ignored() {
    let cfg = config(vec![1.0]);
    let tpl_img = pattern(24, 20);

    // Mask out the right third of the template and corrupt that area in
    // the frame; the masked score must stay high.
    let mut mask = vec![255u8; 24 * 20];
    for y in 0..20 {
        for x in 16..24 {
            mask[y * 24 + x] = 0;
        }
    }
    let mut frame = gradient_frame(160, 120);
    paste(&mut frame, 160, &tpl_img, 40, 30);
    for y in 30..50 {
        for x in 56..64 {
            frame[y * 160 + x] = 255 - frame[y * 160 + x];
        }
    }

    let templates =
        templates_of(Template::new("m", tpl_img, Some(mask), 0.7, &cfg.scales).unwrap());
    let matcher = CorrelationMatcher::new(&cfg);
    let view = ImageView::from_slice(&frame, 160, 120).unwrap();
    let (candidates, _) = matcher.match_frame(view, &templates, &cfg).unwrap();

    let best = candidates
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .expect("masked pattern should be found");
    let b = box_of(best);
    assert_eq!((b.x, b.y), (40.0, 30.0));
    assert!(best.confidence > 0.99);
}

#[test]
fn per_scale_candidate_cap_applies() {
    let cfg = EngineConfig {
        scales: vec![1.0],
        peaks_per_scale: 10,
        max_per_scale: 3,
        ..EngineConfig::default()
    };
    let tpl_img = pattern(24, 20);
    let mut frame = gradient_frame(320, 240);
    for (left, top) in [(10, 10), (100, 10), (200, 10), (10, 100), (100, 100), (200, 100)] {
        paste(&mut frame, 320, &tpl_img, left, top);
    }

    let templates = templates_of(Template::new("p", tpl_img, None, 0.7, &cfg.scales).unwrap());
    let matcher = CorrelationMatcher::new(&cfg);
    let view = ImageView::from_slice(&frame, 320, 240).unwrap();
    let (candidates, _) = matcher.match_frame(view, &templates, &cfg).unwrap();

    // Six perfect instances exist, but the per-(template, scale) cap wins.
    assert_eq!(candidates.len(), 3);
}

#[test]
fn oversized_template_scale_is_skipped() {
    let cfg = config(vec![1.0]);
    let tpl_img = pattern(64, 64);
    let frame = gradient_frame(40, 40);

    let templates = templates_of(Template::new("big", tpl_img, None, 0.7, &cfg.scales).unwrap());
    let matcher = CorrelationMatcher::new(&cfg);
    let view = ImageView::from_slice(&frame, 40, 40).unwrap();
    let (candidates, best_scores) = matcher.match_frame(view, &templates, &cfg).unwrap();

    assert!(candidates.is_empty());
    assert_eq!(best_scores["big"], 0.0);
}

#[test]
fn absent_template_reports_score_without_candidates() {
    let cfg = config(vec![1.0]);
    let tpl_img = pattern(24, 20);
    let frame = gradient_frame(160, 120);

    let templates = templates_of(Template::new("p", tpl_img, None, 0.7, &cfg.scales).unwrap());
    let matcher = CorrelationMatcher::new(&cfg);
    let view = ImageView::from_slice(&frame, 160, 120).unwrap();
    let (candidates, best_scores) = matcher.match_frame(view, &templates, &cfg).unwrap();

    assert!(candidates.is_empty());
    let score = best_scores["p"];
    assert!(score < 0.7, "gradient background scored {score}");
}
