//! Input payload - `{ vertices, faces, activation_data, times }`
//!
//! Every field is optional; `null` and missing both read as empty. Surfaces
//! can also come from ASCII PLY, in which case no activation is attached.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::activation::ActivationDataset;
use crate::error::Result;
use crate::geometry::{Point3, Triangle};
use crate::ply;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrainPayload {
    #[serde(default, deserialize_with = "nullable")]
    pub vertices: Vec<Point3>,
    #[serde(default, deserialize_with = "nullable")]
    pub faces: Vec<Triangle>,
    /// One array per time step, one value per vertex
    #[serde(default, deserialize_with = "nullable")]
    pub activation_data: Vec<Vec<f32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub times: Vec<f64>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl BrainPayload {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a `.json` payload or a `.ply` surface
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let payload = match ext.as_str() {
            "ply" => {
                let mesh = ply::load_ascii(path)?;
                Self {
                    vertices: mesh.vertices,
                    faces: mesh.faces,
                    ..Default::default()
                }
            }
            _ => {
                let content = std::fs::read_to_string(path)?;
                Self::from_json_str(&content)?
            }
        };

        tracing::info!(
            "Loaded payload {:?}: {} vertices, {} faces, {} frames",
            path,
            payload.vertices.len(),
            payload.faces.len(),
            payload.activation_data.len()
        );
        Ok(payload)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Same geometry carrying the given dataset's frames and times
    pub fn with_activation(mut self, dataset: &ActivationDataset) -> Self {
        self.activation_data = dataset.frames().to_vec();
        self.times = dataset.times().to_vec();
        self
    }

    pub fn has_activation(&self) -> bool {
        !self.activation_data.is_empty()
    }
}
