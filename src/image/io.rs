//! Decoding helpers built on the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Template files with an
//! alpha channel are split into a grayscale image plus a binarized validity
//! mask (alpha > 0), matching the masked correlation path.

use crate::image::OwnedImage;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::path::Path;

/// Creates an owned image from a grayscale buffer.
pub fn owned_from_gray(img: &image::GrayImage) -> ScreenMatchResult<OwnedImage> {
    OwnedImage::new(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
    )
}

/// Loads an image from disk converted to grayscale.
pub fn load_gray<P: AsRef<Path>>(path: P) -> ScreenMatchResult<OwnedImage> {
    let img = image::open(path).map_err(|err| ScreenMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_gray(&img.to_luma8())
}

/// Loads a template image, splitting off a binary mask when the file
/// carries an alpha channel.
///
/// Mask pixels are 255 where alpha is nonzero and 0 elsewhere; files
/// without alpha yield `None`.
pub fn load_template_image<P: AsRef<Path>>(
    path: P,
) -> ScreenMatchResult<(OwnedImage, Option<Vec<u8>>)> {
    let img = image::open(path).map_err(|err| ScreenMatchError::ImageIo {
        reason: err.to_string(),
    })?;

    let mask = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        Some(
            rgba.pixels()
                .map(|p| if p[3] > 0 { 255u8 } else { 0u8 })
                .collect(),
        )
    } else {
        None
    };

    let gray = owned_from_gray(&img.to_luma8())?;
    Ok((gray, mask))
}
