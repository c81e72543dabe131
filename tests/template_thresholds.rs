use screenmatch::{parse_threshold, OwnedImage, ScreenMatchError, Template};

fn textured(width: usize, height: usize) -> OwnedImage {
    let data: Vec<u8> = (0..width * height)
        .map(|i| ((i * 37 + 11) % 251) as u8)
        .collect();
    OwnedImage::new(data, width, height).unwrap()
}

#[test]
fn threshold_suffix_parsing() {
    assert!((parse_threshold("wheat lvl 1@0.72", 0.7) - 0.72).abs() < 1e-6);
    assert!((parse_threshold("button@0.5", 0.7) - 0.5).abs() < 1e-6);

    // Missing, malformed, or out-of-range suffixes fall back to the default.
    assert!((parse_threshold("button", 0.7) - 0.7).abs() < 1e-6);
    assert!((parse_threshold("button@", 0.7) - 0.7).abs() < 1e-6);
    assert!((parse_threshold("button@abc", 0.7) - 0.7).abs() < 1e-6);
    assert!((parse_threshold("button@1.5", 0.7) - 0.7).abs() < 1e-6);
    assert!((parse_threshold("button@0", 0.7) - 0.7).abs() < 1e-6);
    assert!((parse_threshold("button@1", 0.7) - 0.7).abs() < 1e-6);
    assert!((parse_threshold("button@-0.3", 0.7) - 0.7).abs() < 1e-6);

    // Only the last @ is treated as the threshold separator.
    assert!((parse_threshold("a@b@0.6", 0.7) - 0.6).abs() < 1e-6);
}

#[test]
fn template_rejects_boundary_thresholds() {
    let scales = [1.0f32];
    for value in [0.0f32, 1.0, -0.2, 1.7] {
        let err = Template::new("t", textured(8, 8), None, value, &scales).unwrap_err();
        assert_eq!(err, ScreenMatchError::ThresholdOutOfRange { value });
    }
    assert!(Template::new("t", textured(8, 8), None, 0.5, &scales).is_ok());
}

#[test]
fn template_rejects_mask_size_mismatch() {
    let err = Template::new("t", textured(8, 8), Some(vec![255u8; 63]), 0.5, &[1.0]).unwrap_err();
    assert_eq!(
        err,
        ScreenMatchError::MaskMismatch {
            expected: 64,
            got: 63
        }
    );
}

#[test]
fn scaled_variants_cache_and_resize() {
    let template = Template::new("t", textured(20, 10), None, 0.5, &[0.5, 1.0]).unwrap();

    let half = template.scaled(0).unwrap();
    assert_eq!((half.width(), half.height()), (10, 5));

    let full = template.scaled(1).unwrap();
    assert_eq!((full.width(), full.height()), (20, 10));

    // Same slot again yields the same cached variant.
    let again = template.scaled(0).unwrap();
    assert!(std::ptr::eq(half, again));
}

#[test]
fn scaled_index_out_of_bounds() {
    let template = Template::new("t", textured(8, 8), None, 0.5, &[1.0]).unwrap();
    let err = template.scaled(3).unwrap_err();
    assert_eq!(
        err,
        ScreenMatchError::IndexOutOfBounds {
            index: 3,
            len: 1,
            context: "scale"
        }
    );
}
