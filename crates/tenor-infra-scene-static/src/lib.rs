//! Headless stand-in for the 3D viewer: named parts with box bounds, one shared
//! material per category, back-face pairing and camera ray picking.

pub mod description;
pub mod geometry;
pub mod loader;

pub use description::*;
pub use loader::SceneLoad;

use geometry::{Aabb, Camera, Vec3};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tenor_domain_fingering::BACK_FACE_SUFFIX;
use tenor_ports::scene::{
    Material, MaterialKind, MaterialRef, PartId, PointerNdc, SceneError, ScenePort,
};

const MATERIAL_KINDS: [MaterialKind; 7] = [
    MaterialKind::Roller,
    MaterialKind::Pearl,
    MaterialKind::Reed,
    MaterialKind::Keycap,
    MaterialKind::Glass,
    MaterialKind::GlassBack,
    MaterialKind::Highlight,
];

struct Part {
    name: String,
    bounds: Aabb,
    material: MaterialRef,
    back_face: Option<PartId>,
}

struct SceneState {
    parts: Vec<Part>,
    rotation: f32,
    time: f32,
    frames: u64,
}

pub struct StaticScene {
    materials: HashMap<MaterialKind, MaterialRef>,
    by_name: HashMap<String, PartId>,
    camera: Camera,
    state: Mutex<SceneState>,
}

impl StaticScene {
    pub fn from_description(description: &SceneDescription) -> Result<Self, SceneError> {
        let materials: HashMap<MaterialKind, MaterialRef> = MATERIAL_KINDS
            .iter()
            .map(|kind| {
                let material = Arc::new(Material {
                    kind: *kind,
                    name: format!("{kind:?}").to_lowercase(),
                });
                (*kind, material)
            })
            .collect();
        let material_for = |kind: MaterialKind| -> Result<MaterialRef, SceneError> {
            materials
                .get(&kind)
                .cloned()
                .ok_or_else(|| SceneError::Load(format!("missing material {kind:?}")))
        };

        let mut parts = Vec::with_capacity(description.parts.len() * 2);
        let mut by_name = HashMap::new();

        for part in &description.parts {
            let bounds =
                Aabb::new(Vec3::from(part.min), Vec3::from(part.max)).ok_or_else(|| {
                    SceneError::Parse(format!("part {} has inverted bounds", part.name))
                })?;
            if by_name.contains_key(&part.name) {
                return Err(SceneError::Parse(format!("duplicate part {}", part.name)));
            }

            let id = PartId(parts.len() as u32);
            by_name.insert(part.name.clone(), id);
            parts.push(Part {
                name: part.name.clone(),
                bounds,
                material: material_for(part.material)?,
                back_face: None,
            });

            if part.back_face {
                let back_name = format!("{}{}", part.name, BACK_FACE_SUFFIX);
                if by_name.contains_key(&back_name) {
                    return Err(SceneError::Parse(format!("duplicate part {back_name}")));
                }
                let back_id = PartId(parts.len() as u32);
                by_name.insert(back_name.clone(), back_id);
                parts.push(Part {
                    name: back_name,
                    bounds,
                    material: material_for(MaterialKind::GlassBack)?,
                    back_face: None,
                });
                parts[id.0 as usize].back_face = Some(back_id);
            }
        }

        log::debug!("scene built with {} parts", parts.len());

        Ok(Self {
            materials,
            by_name,
            camera: Camera::from(&description.camera),
            state: Mutex::new(SceneState {
                parts,
                rotation: 0.0,
                time: 0.0,
                frames: 0,
            }),
        })
    }

    pub fn builtin() -> Result<Self, SceneError> {
        Self::from_description(&SceneDescription::builtin())
    }

    pub fn part_names(&self) -> Vec<String> {
        let state = self.state.lock();
        state.parts.iter().map(|part| part.name.clone()).collect()
    }

    /// Where the centre of a part lands on screen with the current rotation.
    pub fn project(&self, name: &str) -> Option<PointerNdc> {
        let id = self.find_part(name)?;
        let state = self.state.lock();
        let part = state.parts.get(id.0 as usize)?;
        let world = part.bounds.center().rotate_y(state.rotation);
        self.camera.project(world)
    }

    pub fn rotation(&self) -> f32 {
        self.state.lock().rotation
    }

    pub fn time_uniform(&self) -> f32 {
        self.state.lock().time
    }

    pub fn frames_rendered(&self) -> u64 {
        self.state.lock().frames
    }
}

impl ScenePort for StaticScene {
    fn find_part(&self, name: &str) -> Option<PartId> {
        self.by_name.get(name).copied()
    }

    fn back_face_of(&self, part: PartId) -> Option<PartId> {
        let state = self.state.lock();
        state.parts.get(part.0 as usize).and_then(|p| p.back_face)
    }

    fn part_material(&self, part: PartId) -> Option<MaterialRef> {
        let state = self.state.lock();
        state.parts.get(part.0 as usize).map(|p| p.material.clone())
    }

    fn set_part_material(&self, part: PartId, material: MaterialRef) {
        let mut state = self.state.lock();
        if let Some(p) = state.parts.get_mut(part.0 as usize) {
            p.material = material;
        }
    }

    fn material(&self, kind: MaterialKind) -> Option<MaterialRef> {
        self.materials.get(&kind).cloned()
    }

    fn pick(&self, pointer: PointerNdc) -> Option<String> {
        let state = self.state.lock();
        let (origin, direction) = self.camera.ray(pointer);
        // into model space
        let origin = origin.rotate_y(-state.rotation);
        let direction = direction.rotate_y(-state.rotation);

        let mut best: Option<(f32, &Part)> = None;
        for part in &state.parts {
            if let Some(t) = part.bounds.intersect(origin, direction) {
                if best.map_or(true, |(best_t, _)| t < best_t) {
                    best = Some((t, part));
                }
            }
        }
        best.map(|(_, part)| part.name.clone())
    }

    fn set_model_rotation(&self, radians: f32) {
        self.state.lock().rotation = radians;
    }

    fn set_time_uniform(&self, seconds: f32) {
        self.state.lock().time = seconds;
    }

    fn render(&self) {
        let mut state = self.state.lock();
        state.frames += 1;
        log::trace!("frame {} rotation {:.3}", state.frames, state.rotation);
    }
}
