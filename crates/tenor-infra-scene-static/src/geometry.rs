use crate::description::CameraDescription;
use tenor_ports::scene::PointerNdc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn rotate_y(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(
            self.x * cos + self.z * sin,
            self.y,
            -self.x * sin + self.z * cos,
        )
    }

    pub fn normalized(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if len == 0.0 {
            return self;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    fn axis(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Option<Self> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Slab test; distance along the ray to the entry point, if it hits in front.
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin.axis(axis);
            let d = direction.axis(axis);
            let lo = self.min.axis(axis);
            let hi = self.max.axis(axis);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a < b {
                    (a, b)
                } else {
                    (b, a)
                }
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Pinhole camera looking down -z.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    position: Vec3,
    tan_half_fov: f32,
    aspect: f32,
}

impl Camera {
    pub fn ray(&self, pointer: PointerNdc) -> (Vec3, Vec3) {
        let direction = Vec3::new(
            pointer.x * self.tan_half_fov * self.aspect,
            pointer.y * self.tan_half_fov,
            -1.0,
        )
        .normalized();
        (self.position, direction)
    }

    pub fn project(&self, world: Vec3) -> Option<PointerNdc> {
        let depth = self.position.z - world.z;
        if depth <= 0.0 {
            return None;
        }
        Some(PointerNdc {
            x: (world.x - self.position.x) / depth / (self.tan_half_fov * self.aspect),
            y: (world.y - self.position.y) / depth / self.tan_half_fov,
        })
    }
}

impl From<&CameraDescription> for Camera {
    fn from(description: &CameraDescription) -> Self {
        Self {
            position: Vec3::from(description.position),
            tan_half_fov: (description.fov_y_degrees.to_radians() * 0.5).tan(),
            aspect: description.aspect.max(0.01),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_through_box_reports_entry_distance() {
        let bounds = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        let t = bounds
            .intersect(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_relative_eq!(t, 4.0);
    }

    #[test]
    fn ray_missing_box_returns_none() {
        let bounds = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(bounds
            .intersect(Vec3::new(3.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0))
            .is_none());
        assert!(bounds
            .intersect(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 1.0))
            .is_none());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn quarter_turn_maps_x_to_minus_z() {
        let v = Vec3::new(1.0, 0.0, 0.0).rotate_y(std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.z, -1.0, epsilon = 1e-6);
    }
}
