//! Activation Dataset - time axis plus one scalar per vertex per step
//!
//! Real data comes from a payload; when that is absent or empty a
//! deterministic traveling wave is synthesized from the mesh geometry so the
//! viewer always has something to show.

use crate::error::{Result, ViewerError};
use crate::geometry::Point3;

/// Number of steps produced by the synthetic generator
pub const SYNTHETIC_STEPS: usize = 100;

/// Spatial frequency of the synthetic wave (radians per unit distance)
const WAVE_SPATIAL_FREQ: f64 = 5.0;

/// Phase advance of the synthetic wave per step
const WAVE_PHASE_STEP: f64 = 0.1;

/// Where a dataset's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Payload,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationDataset {
    times: Vec<f64>,
    frames: Vec<Vec<f32>>,
    origin: DataOrigin,
}

impl ActivationDataset {
    /// Build from payload arrays, checking every invariant.
    ///
    /// An empty `times` with non-empty `frames` is accepted; timestamps are
    /// then laid out at `time_step` seconds apart.
    pub fn from_frames(
        times: Vec<f64>,
        frames: Vec<Vec<f32>>,
        vertex_count: usize,
        time_step: f64,
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(ViewerError::InvalidActivation("no frames".into()));
        }

        let times = if times.is_empty() {
            tracing::debug!("Payload has no times, spacing {} frames by {}s", frames.len(), time_step);
            (0..frames.len()).map(|t| t as f64 * time_step).collect()
        } else {
            times
        };

        if times.len() != frames.len() {
            return Err(ViewerError::InvalidActivation(format!(
                "{} timestamps for {} frames",
                times.len(),
                frames.len()
            )));
        }

        if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(ViewerError::InvalidActivation(format!(
                "times decrease at step {}: {} -> {}",
                i + 1,
                times[i],
                times[i + 1]
            )));
        }

        if let Some((i, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.len() != vertex_count)
        {
            return Err(ViewerError::InvalidActivation(format!(
                "frame {} has {} values, mesh has {} vertices",
                i,
                frame.len(),
                vertex_count
            )));
        }

        Ok(Self {
            times,
            frames,
            origin: DataOrigin::Payload,
        })
    }

    /// Traveling wave over the mesh: `sin(|p| * 5 - t * 0.1) * 0.5 + 0.5`.
    ///
    /// Bit-identical for identical geometry.
    pub fn synthetic(vertices: &[Point3], time_step: f64) -> Self {
        if vertices.is_empty() {
            return Self::empty();
        }

        let distances: Vec<f64> = vertices
            .iter()
            .map(|&[x, y, z]| {
                let (x, y, z) = (x as f64, y as f64, z as f64);
                (x * x + y * y + z * z).sqrt()
            })
            .collect();

        let frames = (0..SYNTHETIC_STEPS)
            .map(|t| {
                let phase = t as f64 * WAVE_PHASE_STEP;
                distances
                    .iter()
                    .map(|d| ((d * WAVE_SPATIAL_FREQ - phase).sin() * 0.5 + 0.5) as f32)
                    .collect()
            })
            .collect();

        let times = (0..SYNTHETIC_STEPS).map(|t| t as f64 * time_step).collect();

        tracing::debug!(
            vertices = vertices.len(),
            steps = SYNTHETIC_STEPS,
            "Generated synthetic activation"
        );

        Self {
            times,
            frames,
            origin: DataOrigin::Synthetic,
        }
    }

    /// Payload data when present and valid, synthetic otherwise.
    ///
    /// A rejected payload is returned alongside the fallback so the caller
    /// can report it.
    pub fn resolve(
        times: Vec<f64>,
        frames: Vec<Vec<f32>>,
        vertices: &[Point3],
        time_step: f64,
    ) -> (Self, Option<ViewerError>) {
        if frames.is_empty() {
            tracing::info!("No activation data supplied, using synthetic wave");
            return (Self::synthetic(vertices, time_step), None);
        }

        match Self::from_frames(times, frames, vertices.len(), time_step) {
            Ok(dataset) => (dataset, None),
            Err(e) => (Self::synthetic(vertices, time_step), Some(e)),
        }
    }

    /// Dataset with no frames (no geometry to synthesize from)
    pub fn empty() -> Self {
        Self {
            times: Vec::new(),
            frames: Vec::new(),
            origin: DataOrigin::Synthetic,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn origin(&self) -> DataOrigin {
        self.origin
    }

    /// Frame at `index` modulo the frame count
    pub fn frame_at(&self, index: usize) -> Option<&[f32]> {
        if self.frames.is_empty() {
            return None;
        }
        Some(&self.frames[index % self.frames.len()])
    }

    /// Timestamp at `index` modulo the frame count
    pub fn time_at(&self, index: usize) -> Option<f64> {
        if self.times.is_empty() {
            return None;
        }
        Some(self.times[index % self.times.len()])
    }

    pub fn value_at(&self, index: usize, vertex: usize) -> Option<f32> {
        self.frame_at(index)?.get(vertex).copied()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    /// Total time span covered, in seconds
    pub fn duration(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frame_zero_values() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let data = ActivationDataset::synthetic(&vertices, 0.01);

        assert_eq!(data.frame_count(), SYNTHETIC_STEPS);
        assert_eq!(data.origin(), DataOrigin::Synthetic);

        let frame = data.frame_at(0).unwrap();
        assert!((frame[0] - 0.5).abs() < 1e-6);
        let expected = (5.0f64.sin() * 0.5 + 0.5) as f32;
        assert!((frame[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_synthetic_is_deterministic() {
        let vertices = [[0.3, -1.2, 0.7], [2.0, 0.5, -0.25], [0.0, 0.0, 9.0]];
        let a = ActivationDataset::synthetic(&vertices, 0.01);
        let b = ActivationDataset::synthetic(&vertices, 0.01);

        assert_eq!(a.frame_count(), 100);
        for (fa, fb) in a.frames().iter().zip(b.frames()) {
            let bits_a: Vec<u32> = fa.iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u32> = fb.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn test_synthetic_wave_travels() {
        let vertices = [[1.0, 0.0, 0.0]];
        let data = ActivationDataset::synthetic(&vertices, 0.01);
        let v10 = data.value_at(10, 0).unwrap();
        let expected = ((5.0f64 - 1.0).sin() * 0.5 + 0.5) as f32;
        assert!((v10 - expected).abs() < 1e-6);
        assert!((data.time_at(10).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_synthetic_without_vertices_is_empty() {
        let data = ActivationDataset::synthetic(&[], 0.01);
        assert!(data.is_empty());
        assert_eq!(data.frame_at(3), None);
        assert_eq!(data.time_at(3), None);
    }

    #[test]
    fn test_frame_access_wraps() {
        let data =
            ActivationDataset::from_frames(vec![0.0, 0.1], vec![vec![0.0, 1.0], vec![1.0, 0.0]], 2, 0.01)
                .unwrap();

        assert_eq!(data.frame_at(2), data.frame_at(0));
        assert_eq!(data.frame_at(3), Some(&[1.0, 0.0][..]));
        assert_eq!(data.time_at(3), Some(0.1));
        assert_eq!(data.origin(), DataOrigin::Payload);
    }

    #[test]
    fn test_missing_times_are_spaced() {
        let data = ActivationDataset::from_frames(vec![], vec![vec![0.0]; 3], 1, 0.5).unwrap();
        assert_eq!(data.times(), &[0.0, 0.5, 1.0]);
        assert!((data.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_length_mismatch_rejected() {
        let err = ActivationDataset::from_frames(vec![0.0], vec![vec![0.0, 1.0, 2.0]], 2, 0.01)
            .unwrap_err();
        assert!(matches!(err, ViewerError::InvalidActivation(_)));
    }

    #[test]
    fn test_times_length_mismatch_rejected() {
        let err = ActivationDataset::from_frames(vec![0.0], vec![vec![0.0], vec![1.0]], 1, 0.01)
            .unwrap_err();
        assert!(matches!(err, ViewerError::InvalidActivation(_)));
    }

    #[test]
    fn test_decreasing_times_rejected() {
        let err =
            ActivationDataset::from_frames(vec![0.2, 0.1], vec![vec![0.0], vec![1.0]], 1, 0.01)
                .unwrap_err();
        assert!(matches!(err, ViewerError::InvalidActivation(_)));

        // Equal timestamps are allowed
        assert!(
            ActivationDataset::from_frames(vec![0.1, 0.1], vec![vec![0.0], vec![1.0]], 1, 0.01)
                .is_ok()
        );
    }

    #[test]
    fn test_resolve_falls_back_to_synthetic() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];

        let (data, fault) = ActivationDataset::resolve(vec![], vec![], &vertices, 0.01);
        assert_eq!(data.origin(), DataOrigin::Synthetic);
        assert!(fault.is_none());

        let (data, fault) =
            ActivationDataset::resolve(vec![0.0], vec![vec![1.0]], &vertices, 0.01);
        assert_eq!(data.origin(), DataOrigin::Synthetic);
        assert!(matches!(fault, Some(ViewerError::InvalidActivation(_))));
    }
}
