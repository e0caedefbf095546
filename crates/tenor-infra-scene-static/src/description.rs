use serde::{Deserialize, Serialize};
use std::path::Path;
use tenor_domain_fingering::{key_category, ALL_KEYS};
use tenor_ports::scene::{MaterialKind, SceneError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartDescription {
    pub name: String,
    pub material: MaterialKind,
    pub min: [f32; 3],
    pub max: [f32; 3],
    #[serde(default)]
    pub back_face: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescription {
    pub position: [f32; 3],
    pub fov_y_degrees: f32,
    pub aspect: f32,
}

impl Default for CameraDescription {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 6.0],
            fov_y_degrees: 60.0,
            aspect: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub parts: Vec<PartDescription>,
    #[serde(default)]
    pub camera: CameraDescription,
}

impl SceneDescription {
    pub fn from_json(data: &[u8]) -> Result<Self, SceneError> {
        serde_json::from_slice(data).map_err(|e| SceneError::Parse(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, SceneError> {
        let data = std::fs::read(path).map_err(|e| SceneError::Io(e.to_string()))?;
        Self::from_json(&data)
    }

    /// Every key laid out on a 4-wide grid in front of a glass body.
    pub fn builtin() -> Self {
        const COLUMNS: usize = 4;
        const HALF: f32 = 0.3;

        let mut parts = vec![PartDescription {
            name: "body".to_string(),
            material: MaterialKind::Glass,
            min: [-2.5, -3.0, -1.0],
            max: [2.5, 3.0, -0.2],
            back_face: false,
        }];

        for (index, key) in ALL_KEYS.iter().enumerate() {
            let column = (index % COLUMNS) as f32;
            let row = (index / COLUMNS) as f32;
            let x = -1.5 + column;
            let y = 2.0 - row * 0.9;
            parts.push(PartDescription {
                name: key.to_string(),
                material: key_category(key).material_kind(),
                min: [x - HALF, y - HALF, 0.0],
                max: [x + HALF, y + HALF, 0.2],
                back_face: true,
            });
        }

        Self {
            parts,
            camera: CameraDescription::default(),
        }
    }
}
