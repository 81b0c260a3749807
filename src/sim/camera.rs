//! Camera rig: free rotation, drag with momentum, and orbit lock
//!
//! Current rotation and zoom always chase their targets by a fixed fraction
//! per frame. The orbit center eases between points over a fixed number of
//! frames regardless of distance.

use glam::{Mat4, Vec2, Vec3};

use super::dot::Dot;
use crate::settings::CameraParams;
use crate::{approach, ease_in_out};

/// Observable camera state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Auto-rotation advances yaw each frame
    FreeRotate,
    /// Pointer directly drives yaw/pitch
    Dragging,
    /// Post-drag inertia, waiting to resume auto-rotation
    Momentum,
    /// Centered on a dot's live position
    OrbitLocked,
    /// Orbit center easing between two points
    Transitioning,
}

/// Eased move of the orbit center
#[derive(Debug, Clone, Copy)]
pub struct OrbitTransition {
    pub from: Vec3,
    pub to: Vec3,
    /// 0 = at `from`, 1 = done
    pub progress: f32,
}

impl OrbitTransition {
    fn settled(at: Vec3) -> Self {
        Self {
            from: at,
            to: at,
            progress: 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.progress < 1.0
    }
}

/// View transform handed to picking and the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraTransform {
    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    #[inline]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-6), self.near, self.far)
    }

    #[inline]
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// The camera rig
#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Current pitch/yaw (radians)
    pub pitch: f32,
    pub yaw: f32,
    pub target_pitch: f32,
    pub target_yaw: f32,
    /// Current radial distance from the orbit center
    pub zoom: f32,
    pub target_zoom: f32,
    pub auto_rotate: bool,
    /// Last drag velocity in pixels per 16ms frame
    pub drag_velocity: Vec2,
    dragging: bool,
    last_pointer: Vec2,
    last_drag_time: f64,
    drag_end_time: Option<f64>,
    locked: Option<usize>,
    center: Vec3,
    transition: OrbitTransition,
}

impl CameraRig {
    pub fn new(params: &CameraParams) -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            target_pitch: 0.0,
            target_yaw: 0.0,
            zoom: params.default_zoom,
            target_zoom: params.default_zoom,
            auto_rotate: true,
            drag_velocity: Vec2::ZERO,
            dragging: false,
            last_pointer: Vec2::ZERO,
            last_drag_time: 0.0,
            drag_end_time: None,
            locked: None,
            center: Vec3::ZERO,
            transition: OrbitTransition::settled(Vec3::ZERO),
        }
    }

    pub fn mode(&self) -> CameraMode {
        if self.transition.is_active() {
            CameraMode::Transitioning
        } else if self.locked.is_some() {
            CameraMode::OrbitLocked
        } else if self.dragging {
            CameraMode::Dragging
        } else if !self.auto_rotate {
            CameraMode::Momentum
        } else {
            CameraMode::FreeRotate
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn locked_index(&self) -> Option<usize> {
        self.locked
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn transition(&self) -> &OrbitTransition {
        &self.transition
    }

    pub fn start_drag(&mut self, pointer: Vec2, now: f64) {
        self.dragging = true;
        self.auto_rotate = false;
        self.last_pointer = pointer;
        self.last_drag_time = now;
        self.drag_velocity = Vec2::ZERO;
    }

    pub fn update_drag(&mut self, pointer: Vec2, now: f64, sensitivity: f32, params: &CameraParams) {
        if !self.dragging {
            return;
        }
        let delta = pointer - self.last_pointer;
        let dt_ms = ((now - self.last_drag_time) * 1000.0) as f32;
        if dt_ms > 0.0 {
            self.drag_velocity = delta / dt_ms * 16.0;
        }
        self.last_drag_time = now;
        self.target_yaw += delta.x * sensitivity;
        self.target_pitch =
            (self.target_pitch + delta.y * sensitivity).clamp(-params.pitch_limit, params.pitch_limit);
        self.last_pointer = pointer;
    }

    pub fn end_drag(&mut self, now: f64) {
        if self.dragging {
            self.dragging = false;
            self.drag_end_time = Some(now);
        }
    }

    /// Adjust target zoom, clamped to the zoom bounds
    pub fn zoom_by(&mut self, delta: f32, params: &CameraParams) {
        self.target_zoom = (self.target_zoom + delta).clamp(params.zoom_min, params.zoom_max);
    }

    /// Point the camera at `home` from the origin side, at `zoom`
    pub fn look_toward(&mut self, home: Vec3, zoom: f32, params: &CameraParams) {
        self.target_zoom = zoom.clamp(params.zoom_min, params.zoom_max);
        self.auto_rotate = false;
        let r = home.length();
        if r > 0.0 {
            self.target_pitch = (home.y / r).asin().clamp(-params.pitch_limit, params.pitch_limit);
            self.target_yaw = home.x.atan2(home.z);
        }
    }

    /// Restore default view targets and auto-rotation
    pub fn reset(&mut self, params: &CameraParams) {
        self.target_pitch = 0.0;
        self.target_yaw = 0.0;
        self.target_zoom = params.default_zoom;
        self.auto_rotate = true;
        self.drag_velocity = Vec2::ZERO;
        self.drag_end_time = None;
    }

    /// Start easing toward `target` and follow dot `index` from then on
    pub fn lock_on(&mut self, index: usize, target: Vec3, zoom: f32, params: &CameraParams) {
        self.transition = OrbitTransition {
            from: self.center,
            to: target,
            progress: 0.0,
        };
        self.locked = Some(index);
        self.target_zoom = zoom.clamp(params.zoom_min, params.zoom_max);
        self.auto_rotate = false;
        log::info!("Orbit locked on dot {}", index);
    }

    /// Ease back to the origin and resume free rotation. No-op when not locked.
    pub fn unlock(&mut self, params: &CameraParams) -> bool {
        if self.locked.is_none() {
            return false;
        }
        self.transition = OrbitTransition {
            from: self.center,
            to: Vec3::ZERO,
            progress: 0.0,
        };
        self.locked = None;
        self.target_zoom = params.default_zoom;
        self.auto_rotate = true;
        log::info!("Orbit released");
        true
    }

    /// Drop any lock and snap the orbit center to the origin
    pub fn clear_orbit(&mut self) {
        self.locked = None;
        self.center = Vec3::ZERO;
        self.transition = OrbitTransition::settled(Vec3::ZERO);
    }

    /// Advance one frame
    pub fn update(&mut self, now: f64, dots: &[Dot], params: &CameraParams) {
        let eps = params.momentum_epsilon;
        let coasting =
            self.drag_velocity.x.abs() > eps || self.drag_velocity.y.abs() > eps;

        if !self.dragging && coasting {
            self.target_yaw += self.drag_velocity.x * params.mouse_sensitivity;
            self.target_pitch = (self.target_pitch
                + self.drag_velocity.y * params.mouse_sensitivity)
                .clamp(-params.pitch_limit, params.pitch_limit);
            self.drag_velocity *= params.momentum_decay;
        }

        // Resume auto-rotate once the drag has fully settled
        if let Some(ended) = self.drag_end_time {
            let settled = self.drag_velocity.x.abs() < eps && self.drag_velocity.y.abs() < eps;
            if !self.dragging
                && !self.auto_rotate
                && self.locked.is_none()
                && now - ended > params.resume_delay
                && settled
            {
                self.auto_rotate = true;
                self.drag_end_time = None;
            }
        }

        if self.auto_rotate {
            self.target_yaw += params.auto_rotate_speed;
        }
        self.pitch = approach(self.pitch, self.target_pitch, params.smoothing);
        self.yaw = approach(self.yaw, self.target_yaw, params.smoothing);
        self.zoom = approach(self.zoom, self.target_zoom, params.smoothing);

        if self.transition.is_active() {
            self.transition.progress =
                (self.transition.progress + params.transition_speed).min(1.0);
            let t = ease_in_out(self.transition.progress);
            self.center = self.transition.from.lerp(self.transition.to, t);
        }

        if let Some(dot) = self.locked.and_then(|i| dots.get(i)) {
            self.transition.to = dot.pos;
            if !self.transition.is_active() {
                self.center = dot.pos;
            }
        }
    }

    /// Camera position orbiting the current center. While locked the whole
    /// orbit moves with the dot, not just the look-at point.
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.zoom * self.yaw.sin() * self.pitch.cos(),
            self.zoom * self.pitch.sin(),
            self.zoom * self.yaw.cos() * self.pitch.cos(),
        );
        self.center + offset
    }

    pub fn transform(&self, params: &CameraParams) -> CameraTransform {
        CameraTransform {
            position: self.position(),
            target: self.center,
            fov_y: params.fov_y_degrees.to_radians(),
            near: params.near,
            far: params.far,
        }
    }
}
