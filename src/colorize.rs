//! Frame Colorizer
//!
//! Min/max normalizes one frame and pushes every vertex through a palette.
//! Every vertex is independent, so with the `parallel` feature the work is
//! split across rayon's pool; output is identical either way.

use crate::activation::ActivationDataset;
use crate::palette::ColorScale;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rescale a frame to [0, 1] by its own min and max.
///
/// A flat frame (max == min) maps every vertex to 0. Non-finite values are
/// ignored for the range and map to 0.
pub fn normalize_frame(frame: &[f32]) -> Vec<f32> {
    let (min, max) = frame_range(frame);
    // f64 so that a spread wider than f32::MAX stays finite
    let min = min as f64;
    let range = max as f64 - min;

    frame
        .iter()
        .map(|&v| {
            if range != 0.0 && v.is_finite() {
                ((v as f64 - min) / range) as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// (min, max) over the finite values of a frame, (0, 0) if there are none
pub fn frame_range(frame: &[f32]) -> (f32, f32) {
    let (min, max) = frame
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

/// Flat `[r0, g0, b0, r1, ...]` color buffer for one frame
pub fn colorize(frame: &[f32], scale: ColorScale) -> Vec<f32> {
    let normalized = normalize_frame(frame);
    let mut colors = vec![0.0f32; normalized.len() * 3];
    fill_colors(&normalized, scale, &mut colors);
    colors
}

#[cfg(feature = "parallel")]
fn fill_colors(normalized: &[f32], scale: ColorScale, colors: &mut [f32]) {
    colors
        .par_chunks_mut(3)
        .zip(normalized.par_iter())
        .for_each(|(out, &v)| out.copy_from_slice(&scale.map(v)));
}

#[cfg(not(feature = "parallel"))]
fn fill_colors(normalized: &[f32], scale: ColorScale, colors: &mut [f32]) {
    for (out, &v) in colors.chunks_mut(3).zip(normalized) {
        out.copy_from_slice(&scale.map(v));
    }
}

/// Color buffer for `time_index` (wrapped), or None when there is no data
pub fn colorize_frame(
    dataset: &ActivationDataset,
    time_index: usize,
    scale: ColorScale,
) -> Option<Vec<f32>> {
    let frame = dataset.frame_at(time_index)?;
    tracing::debug!(time_index, palette = %scale, vertices = frame.len(), "Recoloring frame");
    Some(colorize(frame, scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_frame_normalizes_to_zero() {
        let normalized = normalize_frame(&[0.7, 0.7, 0.7, 0.7]);
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_min_and_max_hit_endpoints() {
        let frame = [3.0, -2.0, 8.0, 0.5];
        let normalized = normalize_frame(&frame);

        assert_eq!(normalized[1], 0.0);
        assert_eq!(normalized[2], 1.0);
        assert!((normalized[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let normalized = normalize_frame(&[f32::NAN, 1.0, 3.0]);
        assert_eq!(normalized, vec![0.0, 0.0, 1.0]);
        assert_eq!(frame_range(&[f32::NAN]), (0.0, 0.0));
    }

    #[test]
    fn test_extreme_spread_stays_finite() {
        let normalized = normalize_frame(&[f32::MAX, -f32::MAX]);
        assert_eq!(normalized, vec![1.0, 0.0]);

        let colors = colorize(&[f32::MAX, -f32::MAX], ColorScale::Rainbow);
        assert_eq!(colors, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_flat_frame_uses_palette_low_color() {
        let colors = colorize(&[2.0, 2.0], ColorScale::Heatmap);
        assert_eq!(colors, vec![0.0; 6]);
    }

    #[test]
    fn test_two_vertex_blue_red_scenario() {
        let data = ActivationDataset::from_frames(
            vec![0.0, 0.1],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            2,
            0.01,
        )
        .unwrap();

        let colors = colorize_frame(&data, 0, ColorScale::BlueRed).unwrap();
        assert_eq!(colors, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);

        let colors = colorize_frame(&data, 1, ColorScale::BlueRed).unwrap();
        assert_eq!(colors, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_dataset_has_no_colors() {
        assert!(colorize_frame(&ActivationDataset::empty(), 0, ColorScale::Rainbow).is_none());
    }
}
