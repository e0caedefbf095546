use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid scene description: {0}")]
    Parse(String),
    #[error("scene load failed: {0}")]
    Load(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialKind {
    Roller,
    Pearl,
    Reed,
    Keycap,
    Glass,
    GlassBack,
    Highlight,
}

#[derive(Debug)]
pub struct Material {
    pub kind: MaterialKind,
    pub name: String,
}

/// Materials are shared by reference; identity matters, not value.
pub type MaterialRef = Arc<Material>;

pub fn same_material(a: &MaterialRef, b: &MaterialRef) -> bool {
    Arc::ptr_eq(a, b)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub u32);

/// Pointer position in normalized device coordinates, both axes in [-1, 1], +y up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerNdc {
    pub x: f32,
    pub y: f32,
}

/// A loaded 3D scene with named parts. Shader work and geometry stay behind this trait.
pub trait ScenePort: Send + Sync {
    fn find_part(&self, name: &str) -> Option<PartId>;
    fn back_face_of(&self, part: PartId) -> Option<PartId>;

    fn part_material(&self, part: PartId) -> Option<MaterialRef>;
    fn set_part_material(&self, part: PartId, material: MaterialRef);

    fn material(&self, kind: MaterialKind) -> Option<MaterialRef>;

    /// First part hit by a ray from the camera through `pointer`.
    fn pick(&self, pointer: PointerNdc) -> Option<String>;

    fn set_model_rotation(&self, radians: f32);
    fn set_time_uniform(&self, seconds: f32);
    fn render(&self);
}
