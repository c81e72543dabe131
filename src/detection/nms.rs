//! IoU-based duplicate suppression for box candidates.

use crate::detection::{BoundingBox, Detection};

/// Greedy non-maximum suppression over axis-aligned boxes.
///
/// Indices are sorted by descending score (stable, so equal scores keep
/// discovery order), then the best remaining candidate is kept and every
/// pending candidate with IoU at or above `iou_threshold` against it is
/// dropped. Returns the kept indices in keep order.
pub fn suppress(boxes: &[BoundingBox], scores: &[f32], iou_threshold: f32) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len());
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut keep = Vec::new();
    while let Some(&best) = order.first() {
        keep.push(best);
        order.retain(|&idx| idx != best && boxes[best].iou(&boxes[idx]) < iou_threshold);
    }
    keep
}

/// Applies [`suppress`] to full detection records, using the bounding box
/// of each geometry, and returns the survivors.
pub fn suppress_detections(candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let boxes: Vec<BoundingBox> = candidates.iter().map(|c| c.geometry.bounds()).collect();
    let scores: Vec<f32> = candidates.iter().map(|c| c.confidence).collect();
    let keep = suppress(&boxes, &scores, iou_threshold);

    let mut kept_flags = vec![false; candidates.len()];
    for &idx in &keep {
        kept_flags[idx] = true;
    }
    candidates
        .into_iter()
        .zip(kept_flags)
        .filter_map(|(det, kept)| kept.then_some(det))
        .collect()
}
