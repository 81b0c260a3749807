//! Dot Galaxy - an explorable 3D point cloud of social dots
//!
//! Core modules:
//! - `sim`: Single-threaded simulation (physics, camera rig, picking, effects)
//! - `renderer`: Flat per-frame buffers handed to the host renderer
//! - `persistence`: Fire-and-forget dot creation contract
//! - `platform`: Browser/native clock
//! - `session`: Frame loop body tying the simulation to buffers and persistence
//! - `settings`: Adjustable physics/camera/effect parameters

pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use session::Session;
pub use settings::{QualityPreset, Settings};

use glam::Vec3;

/// Default tuning values (mirrored by `Settings::default()`)
pub mod consts {
    /// Spring pull toward home, per frame
    pub const SPRING: f32 = 0.008;
    /// Weak pull toward friends that drifted apart
    pub const FRIEND_PULL: f32 = 0.001;
    /// Friend pull only engages beyond this distance
    pub const FRIEND_THRESHOLD: f32 = 20.0;
    /// Gravity well strength
    pub const GRAVITY: f32 = 0.15;
    /// Velocity damping applied every frame
    pub const DAMPING: f32 = 0.94;
    /// Initial scatter magnitude on trigger
    pub const SCATTER_STRENGTH: f32 = 3.0;
    /// Scatter decay per frame
    pub const SCATTER_DECAY: f32 = 0.8;
    /// Scatter is floored to zero below this
    pub const SCATTER_FLOOR: f32 = 0.01;
    /// Snap-back factor on release
    pub const RELEASE_FACTOR: f32 = 0.05;

    /// Camera distance bounds
    pub const ZOOM_MIN: f32 = 25.0;
    pub const ZOOM_MAX: f32 = 350.0;
    pub const DEFAULT_ZOOM: f32 = 180.0;
    /// Pitch clamp (radians)
    pub const PITCH_LIMIT: f32 = 1.4;
    /// Orbit-center transition progress per frame (~34 frames total)
    pub const TRANSITION_SPEED: f32 = 0.03;

    /// Trail history depth (frames)
    pub const TRAIL_LENGTH: usize = 12;
    /// Long-press delay (seconds)
    pub const LONG_PRESS_SECS: f64 = 0.5;
}

/// Quadratic ease-in-out on [0, 1]
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Move `current` a fixed fraction of the way toward `target`
#[inline]
pub fn approach(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

/// Unit vector from `from` to `to` and the distance between them.
///
/// A zero distance is replaced by 1 so callers never divide by zero.
#[inline]
pub fn direction_and_distance(from: Vec3, to: Vec3) -> (Vec3, f32) {
    let delta = to - from;
    let mut dist = delta.length();
    if dist == 0.0 {
        dist = 1.0;
    }
    (delta / dist, dist)
}

/// Parse `#rrggbb` or `#rgb` into linear 0-1 RGB. Malformed input falls back
/// to white.
pub fn hex_to_rgb(hex: &str) -> Vec3 {
    let digits = hex.trim().trim_start_matches('#');
    let expanded;
    let digits = match digits.len() {
        6 => digits,
        3 => {
            expanded = digits.chars().flat_map(|c| [c, c]).collect::<String>();
            expanded.as_str()
        }
        _ => return Vec3::ONE,
    };
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Vec3::new(r, g, b),
        _ => Vec3::ONE,
    }
}

/// Hue of a `#rrggbb` color in degrees [0, 360)
pub fn hex_to_hue(hex: &str) -> f32 {
    let c = hex_to_rgb(hex);
    let max = c.max_element();
    let min = c.min_element();
    if max == min {
        return 0.0;
    }
    let d = max - min;
    let h = if max == c.x {
        (c.y - c.z) / d + if c.y < c.z { 6.0 } else { 0.0 }
    } else if max == c.y {
        (c.z - c.x) / d + 2.0
    } else {
        (c.x - c.y) / d + 4.0
    };
    h / 6.0 * 360.0
}

/// Point on a sphere of radius `r` from spherical angles
#[inline]
pub fn spherical_to_cartesian(r: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_direction_zero_distance() {
        let (dir, dist) = direction_and_distance(Vec3::ONE, Vec3::ONE);
        assert_eq!(dist, 1.0);
        assert_eq!(dir, Vec3::ZERO);
    }

    #[test]
    fn test_hex_parsing() {
        let c = hex_to_rgb("#ff0000");
        assert!((c.x - 1.0).abs() < 1e-6 && c.y == 0.0 && c.z == 0.0);
        assert_eq!(hex_to_rgb("nope"), Vec3::ONE);
        assert!((hex_to_hue("#00ff00") - 120.0).abs() < 0.01);
        assert!((hex_to_hue("#0000ff") - 240.0).abs() < 0.01);
        assert_eq!(hex_to_hue("#808080"), 0.0);
    }

    #[test]
    fn test_shorthand_hex() {
        assert_eq!(hex_to_rgb("#f00"), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(hex_to_rgb("0f0"), Vec3::new(0.0, 1.0, 0.0));
        let c = hex_to_rgb("#abc");
        assert!((c - hex_to_rgb("#aabbcc")).length() < 1e-6);
        assert_eq!(hex_to_rgb("#ff"), Vec3::ONE);
        assert_eq!(hex_to_rgb("#xyz"), Vec3::ONE);
        assert!((hex_to_hue("#00f") - 240.0).abs() < 0.01);
    }
}
