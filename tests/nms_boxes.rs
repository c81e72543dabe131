use screenmatch::{suppress, suppress_detections, BoundingBox, Detection, Geometry, Provenance};

fn bbox(x: f32, y: f32, width: f32, height: f32) -> BoundingBox {
    BoundingBox {
        x,
        y,
        width,
        height,
    }
}

fn det(template: &str, confidence: f32, b: BoundingBox) -> Detection {
    Detection {
        template: template.to_owned(),
        confidence,
        geometry: Geometry::Box(b),
        provenance: Provenance::Scale(0),
    }
}

#[test]
fn iou_of_identical_and_disjoint_boxes() {
    let a = bbox(0.0, 0.0, 10.0, 10.0);
    assert!((a.iou(&a) - 1.0).abs() < 1e-3);

    let far = bbox(100.0, 100.0, 10.0, 10.0);
    assert_eq!(a.iou(&far), 0.0);
}

#[test]
fn overlapping_boxes_keep_higher_score() {
    let boxes = [bbox(0.0, 0.0, 10.0, 10.0), bbox(2.0, 2.0, 10.0, 10.0)];
    let keep = suppress(&boxes, &[0.8, 0.9], 0.3);
    assert_eq!(keep, vec![1]);
}

#[test]
fn disjoint_boxes_both_survive() {
    let boxes = [bbox(0.0, 0.0, 10.0, 10.0), bbox(50.0, 50.0, 10.0, 10.0)];
    let keep = suppress(&boxes, &[0.8, 0.9], 0.3);
    assert_eq!(keep, vec![1, 0]);
}

#[test]
fn mild_overlap_below_threshold_survives() {
    // IoU of these two is 36/164, well under 0.3.
    let boxes = [bbox(0.0, 0.0, 10.0, 10.0), bbox(6.0, 1.0, 10.0, 10.0)];
    let keep = suppress(&boxes, &[0.9, 0.8], 0.3);
    assert_eq!(keep.len(), 2);
}

#[test]
fn equal_scores_keep_discovery_order() {
    let boxes = [
        bbox(0.0, 0.0, 10.0, 10.0),
        bbox(1.0, 1.0, 10.0, 10.0),
        bbox(40.0, 40.0, 10.0, 10.0),
    ];
    let keep = suppress(&boxes, &[0.5, 0.5, 0.5], 0.3);
    assert_eq!(keep, vec![0, 2]);
}

#[test]
fn empty_input_yields_nothing() {
    assert!(suppress(&[], &[], 0.3).is_empty());
}

#[test]
fn detection_survivors_keep_discovery_order() {
    let detections = vec![
        det("a", 0.6, bbox(0.0, 0.0, 10.0, 10.0)),
        det("b", 0.9, bbox(1.0, 1.0, 10.0, 10.0)),
        det("c", 0.7, bbox(60.0, 0.0, 10.0, 10.0)),
    ];
    let kept = suppress_detections(detections, 0.3);

    // "a" loses to the overlapping higher-scored "b"; survivors come back
    // in their original order.
    let names: Vec<&str> = kept.iter().map(|d| d.template.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);
}

#[test]
fn cross_template_duplicates_are_suppressed() {
    // Suppression is global across templates, not per template.
    let detections = vec![
        det("x", 0.95, bbox(10.0, 10.0, 20.0, 20.0)),
        det("y", 0.8, bbox(12.0, 11.0, 20.0, 20.0)),
    ];
    let kept = suppress_detections(detections, 0.3);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].template, "x");
}
