//! Planar homography estimation.
//!
//! A direct linear transform (DLT) with Hartley normalization solves the
//! least-squares system through the eigendecomposition of `AᵀA`, and a
//! seeded RANSAC loop makes the fit robust to mismatched correspondences.

use nalgebra::{Matrix3, SMatrix, SVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// RANSAC controls for [`fit_ransac`].
pub struct RansacParams {
    /// Maximum number of minimal-sample iterations.
    pub max_iters: usize,
    /// Reprojection error (pixels) below which a correspondence counts as
    /// an inlier.
    pub tolerance: f64,
    /// Seed for the sampling generator, making fits reproducible.
    pub seed: u64,
}

/// Applies a homography to a point, returning the projected position.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let w = h[(2, 0)] * x + h[(2, 1)] * y + h[(2, 2)];
    let w = if w.abs() < 1e-12 { 1e-12 } else { w };
    [
        (h[(0, 0)] * x + h[(0, 1)] * y + h[(0, 2)]) / w,
        (h[(1, 0)] * x + h[(1, 1)] * y + h[(1, 2)]) / w,
    ]
}

fn reprojection_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    let p = project(h, src[0], src[1]);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

/// Translates the centroid to the origin and scales the mean distance to
/// `sqrt(2)`, returning the similarity transform used.
fn normalize_points(points: &[[f64; 2]]) -> (Vec<[f64; 2]>, Matrix3<f64>) {
    let n = points.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for p in points {
        cx += p[0];
        cy += p[1];
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in points {
        mean_dist += ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt();
    }
    mean_dist /= n;
    let scale = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let normalized = points
        .iter()
        .map(|p| [(p[0] - cx) * scale, (p[1] - cy) * scale])
        .collect();
    let transform = Matrix3::new(scale, 0.0, -scale * cx, 0.0, scale, -scale * cy, 0.0, 0.0, 1.0);
    (normalized, transform)
}

/// Estimates a homography mapping `src` points onto `dst` points by the
/// normalized DLT. Needs at least 4 correspondences.
pub fn estimate_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    if src.len() < 4 || src.len() != dst.len() {
        return None;
    }

    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);

    // Each correspondence contributes two rows to A; solve min |Ah| with
    // |h| = 1 via the smallest eigenvector of AᵀA.
    let mut ata: SMatrix<f64, 9, 9> = SMatrix::zeros();
    for (s, d) in src_n.iter().zip(&dst_n) {
        let (x, y) = (s[0], s[1]);
        let (u, v) = (d[0], d[1]);
        let rows = [
            [-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u],
            [0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v],
        ];
        for row in rows {
            let r = SVector::<f64, 9>::from_row_slice(&row);
            ata += r * r.transpose();
        }
    }

    let eigen = ata.symmetric_eigen();
    let mut min_idx = 0;
    for i in 1..9 {
        if eigen.eigenvalues[i] < eigen.eigenvalues[min_idx] {
            min_idx = i;
        }
    }
    let h = eigen.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let denorm = t_dst.try_inverse()? * h_norm * t_src;
    let pivot = denorm[(2, 2)];
    if pivot.abs() < 1e-12 {
        return None;
    }
    Some(denorm / pivot)
}

/// Robustly fits a homography with RANSAC, refitting on the inlier set.
///
/// Returns the refit homography and its inlier count, or `None` when no
/// model with at least 4 inliers was found.
pub fn fit_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &RansacParams,
) -> Option<(Matrix3<f64>, usize)> {
    let n = src.len();
    if n < 4 || n != dst.len() {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best_h: Option<Matrix3<f64>> = None;
    let mut best_inliers = 0usize;

    for _ in 0..params.max_iters {
        let sample = sample_distinct(&mut rng, n);
        let s: Vec<[f64; 2]> = sample.iter().map(|&i| src[i]).collect();
        let d: Vec<[f64; 2]> = sample.iter().map(|&i| dst[i]).collect();
        let Some(h) = estimate_dlt(&s, &d) else {
            continue;
        };

        let inliers = count_inliers(&h, src, dst, params.tolerance);
        if inliers > best_inliers {
            best_inliers = inliers;
            best_h = Some(h);
            if inliers * 10 > n * 9 {
                break;
            }
        }
    }

    let rough = best_h?;
    if best_inliers < 4 {
        return None;
    }

    let mut in_src = Vec::with_capacity(best_inliers);
    let mut in_dst = Vec::with_capacity(best_inliers);
    for i in 0..n {
        if reprojection_error(&rough, src[i], dst[i]) < params.tolerance {
            in_src.push(src[i]);
            in_dst.push(dst[i]);
        }
    }
    let refit = estimate_dlt(&in_src, &in_dst).unwrap_or(rough);
    let inliers = count_inliers(&refit, src, dst, params.tolerance);
    Some((refit, inliers.max(best_inliers)))
}

fn count_inliers(h: &Matrix3<f64>, src: &[[f64; 2]], dst: &[[f64; 2]], tolerance: f64) -> usize {
    src.iter()
        .zip(dst)
        .filter(|(s, d)| reprojection_error(h, **s, **d) < tolerance)
        .count()
}

fn sample_distinct(rng: &mut StdRng, n: usize) -> [usize; 4] {
    let mut picked = [0usize; 4];
    let mut count = 0;
    while count < 4 {
        let candidate = rng.random_range(0..n);
        if !picked[..count].contains(&candidate) {
            picked[count] = candidate;
            count += 1;
        }
    }
    picked
}
