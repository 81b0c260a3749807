//! Pointer-to-world projection and ray picking
//!
//! Everything here depends only on the camera transform and viewport size.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::CameraTransform;
use super::dot::Dot;

/// Ray directions with a smaller depth component cannot hit a z-plane
const MIN_PLANE_DIR: f32 = 1e-6;

/// Canvas size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Pixel coordinate to normalized device coordinate (y up)
    pub fn to_ndc(&self, pointer: Vec2) -> Vec2 {
        Vec2::new(
            pointer.x / self.width * 2.0 - 1.0,
            -(pointer.y / self.height) * 2.0 + 1.0,
        )
    }
}

/// A world-space ray with unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Intersect with the plane `z = depth`
    pub fn at_depth(&self, depth: f32) -> Option<Vec3> {
        if self.dir.z.abs() < MIN_PLANE_DIR {
            return None;
        }
        let t = (depth - self.origin.z) / self.dir.z;
        let hit = self.origin + self.dir * t;
        Some(Vec3::new(hit.x, hit.y, depth))
    }
}

/// A dot projected onto the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub index: usize,
    pub screen: Vec2,
    /// Normalized depth in [0, 1], smaller is closer
    pub depth: f32,
}

/// Camera + viewport snapshot used for one frame's worth of picking
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    transform: CameraTransform,
    viewport: Viewport,
    view_proj: Mat4,
    inv_view_proj: Mat4,
}

impl Projector {
    pub fn new(transform: CameraTransform, viewport: Viewport) -> Self {
        let view_proj = transform.view_projection(viewport.aspect());
        Self {
            transform,
            viewport,
            view_proj,
            inv_view_proj: view_proj.inverse(),
        }
    }

    pub fn transform(&self) -> &CameraTransform {
        &self.transform
    }

    /// Ray from the camera through a pixel
    pub fn ray(&self, pointer: Vec2) -> Option<Ray> {
        if self.viewport.is_degenerate() {
            return None;
        }
        let ndc = self.viewport.to_ndc(pointer);
        let near = self.inv_view_proj.project_point3(ndc.extend(0.0));
        let far = self.inv_view_proj.project_point3(ndc.extend(1.0));
        let dir = (far - near).try_normalize()?;
        Some(Ray {
            origin: self.transform.position,
            dir,
        })
    }

    /// Nearest dot (along the ray) within `threshold` world units of the ray
    pub fn pick(&self, pointer: Vec2, dots: &[Dot], threshold: f32) -> Option<usize> {
        let ray = self.ray(pointer)?;
        let threshold_sq = threshold * threshold;
        let mut best: Option<(usize, f32)> = None;

        for (i, dot) in dots.iter().enumerate() {
            let to_dot = dot.pos - ray.origin;
            let along = to_dot.dot(ray.dir);
            if along < self.transform.near {
                continue;
            }
            let dist_sq = (to_dot - ray.dir * along).length_squared();
            if dist_sq <= threshold_sq && best.is_none_or(|(_, t)| along < t) {
                best = Some((i, along));
            }
        }

        best.map(|(i, _)| i)
    }

    /// Unproject a pixel onto the plane `z = depth`
    pub fn project_to_plane(&self, pointer: Vec2, depth: f32) -> Option<Vec3> {
        self.ray(pointer)?.at_depth(depth)
    }

    /// World point to pixel coordinates; `None` when behind the camera or clipped
    pub fn to_screen(&self, point: Vec3) -> Option<(Vec2, f32)> {
        let clip = self.view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..1.0).contains(&ndc.z) {
            return None;
        }
        let screen = Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.viewport.width,
            (-ndc.y * 0.5 + 0.5) * self.viewport.height,
        );
        Some((screen, ndc.z))
    }

    /// Up to `limit` visible dots, closest first
    pub fn nearest_on_screen(&self, dots: &[Dot], limit: usize) -> Vec<ScreenPoint> {
        let mut visible: Vec<ScreenPoint> = dots
            .iter()
            .enumerate()
            .filter_map(|(index, dot)| {
                self.to_screen(dot.pos).map(|(screen, depth)| ScreenPoint {
                    index,
                    screen,
                    depth,
                })
            })
            .collect();
        visible.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        visible.truncate(limit);
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CameraParams;
    use crate::sim::camera::CameraRig;
    use crate::sim::dot::DotSeed;

    fn default_projector() -> Projector {
        let params = CameraParams::default();
        let rig = CameraRig::new(&params);
        Projector::new(rig.transform(&params), Viewport::new(800.0, 600.0))
    }

    fn dots_at(points: &[Vec3]) -> Vec<Dot> {
        points
            .iter()
            .map(|&p| Dot::new(DotSeed::default(), p))
            .collect()
    }

    #[test]
    fn test_center_ray_looks_down_negative_z() {
        let projector = default_projector();
        let ray = projector.ray(Vec2::new(400.0, 300.0)).unwrap();
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 180.0));
    }

    #[test]
    fn test_pick_prefers_nearest_along_ray() {
        let projector = default_projector();
        let dots = dots_at(&[
            Vec3::ZERO,
            Vec3::new(0.5, 0.0, 40.0),
            Vec3::new(30.0, 0.0, 0.0),
        ]);
        assert_eq!(projector.pick(Vec2::new(400.0, 300.0), &dots, 1.8), Some(1));
        assert_eq!(projector.pick(Vec2::new(5.0, 5.0), &dots, 1.8), None);
    }

    #[test]
    fn test_pick_ignores_dots_behind_camera() {
        let projector = default_projector();
        let dots = dots_at(&[Vec3::new(0.0, 0.0, 250.0)]);
        assert_eq!(projector.pick(Vec2::new(400.0, 300.0), &dots, 1.8), None);
    }

    #[test]
    fn test_plane_projection_stays_under_pointer() {
        let projector = default_projector();
        let pointer = Vec2::new(520.0, 210.0);
        let world = projector.project_to_plane(pointer, 12.0).unwrap();
        assert_eq!(world.z, 12.0);

        let (screen, _) = projector.to_screen(world).unwrap();
        assert!((screen - pointer).length() < 0.05);
    }

    #[test]
    fn test_edge_on_plane_is_degenerate() {
        let params = CameraParams::default();
        let mut rig = CameraRig::new(&params);
        rig.yaw = std::f32::consts::FRAC_PI_2;
        let projector = Projector::new(rig.transform(&params), Viewport::new(800.0, 600.0));
        assert!(projector.project_to_plane(Vec2::new(400.0, 300.0), 0.0).is_none());
    }

    #[test]
    fn test_zero_viewport_never_picks() {
        let params = CameraParams::default();
        let rig = CameraRig::new(&params);
        let projector = Projector::new(rig.transform(&params), Viewport::new(0.0, 0.0));
        let dots = dots_at(&[Vec3::ZERO]);
        assert_eq!(projector.pick(Vec2::ZERO, &dots, 1.8), None);
    }

    #[test]
    fn test_nearest_on_screen_sorted() {
        let projector = default_projector();
        let dots = dots_at(&[
            Vec3::new(0.0, 0.0, -50.0),
            Vec3::new(5.0, 0.0, 60.0),
            Vec3::new(0.0, 0.0, 500.0),
            Vec3::new(-5.0, 2.0, 0.0),
        ]);
        let labels = projector.nearest_on_screen(&dots, 30);
        let order: Vec<usize> = labels.iter().map(|l| l.index).collect();
        assert_eq!(order, vec![1, 3, 0]);
        assert_eq!(projector.nearest_on_screen(&dots, 1).len(), 1);
    }
}
