//! Simulation settings and tuning parameters
//!
//! Every physics/camera constant is adjustable here instead of being baked
//! into the integrator. Persisted in LocalStorage on the web.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Settings parse failures
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Number of dots to generate when no external data is supplied
    pub fn generated_dots(&self) -> usize {
        match self {
            QualityPreset::Low => 50,
            QualityPreset::Medium => 250,
            QualityPreset::High => 600,
        }
    }

    /// Whether motion trails are emitted
    pub fn trails_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Forces applied by the integrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub spring: f32,
    pub friend_pull: f32,
    pub friend_threshold: f32,
    pub gravity: f32,
    /// Inverse-distance falloff factor for the gravity well
    pub gravity_falloff: f32,
    /// Swirl component relative to the radial gravity pull
    pub swirl: f32,
    pub scatter_strength: f32,
    /// Random multiplier range applied per axis to the scatter push
    pub scatter_jitter: (f32, f32),
    pub scatter_decay: f32,
    pub scatter_floor: f32,
    pub damping: f32,
    pub release_factor: f32,
    /// Impulse on friends of a dragged dot (x/y axes)
    pub tug_lateral: f32,
    /// Impulse on friends of a dragged dot (z axis)
    pub tug_depth: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            spring: SPRING,
            friend_pull: FRIEND_PULL,
            friend_threshold: FRIEND_THRESHOLD,
            gravity: GRAVITY,
            gravity_falloff: 0.01,
            swirl: 0.3,
            scatter_strength: SCATTER_STRENGTH,
            scatter_jitter: (0.8, 1.2),
            scatter_decay: SCATTER_DECAY,
            scatter_floor: SCATTER_FLOOR,
            damping: DAMPING,
            release_factor: RELEASE_FACTOR,
            tug_lateral: 0.3,
            tug_depth: 0.1,
        }
    }
}

/// Camera rig tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub default_zoom: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub pitch_limit: f32,
    /// Fraction of the remaining gap closed per frame
    pub smoothing: f32,
    pub auto_rotate_speed: f32,
    pub momentum_decay: f32,
    pub momentum_epsilon: f32,
    /// Seconds after a drag settles before auto-rotate resumes
    pub resume_delay: f64,
    pub transition_speed: f32,
    /// Zoom used when orbit-locking onto a dot
    pub lock_zoom: f32,
    pub mouse_sensitivity: f32,
    pub touch_sensitivity: f32,
    pub wheel_scale: f32,
    pub pinch_scale: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov_y_degrees: 55.0,
            near: 0.1,
            far: 1200.0,
            default_zoom: DEFAULT_ZOOM,
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            pitch_limit: PITCH_LIMIT,
            smoothing: 0.06,
            auto_rotate_speed: 0.0006,
            momentum_decay: 0.96,
            momentum_epsilon: 0.0001,
            resume_delay: 5.0,
            transition_speed: TRANSITION_SPEED,
            lock_zoom: 60.0,
            mouse_sensitivity: 0.003,
            touch_sensitivity: 0.004,
            wheel_scale: 0.1,
            pinch_scale: 0.2,
        }
    }
}

/// Cosmetic overlay tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    pub trail_length: usize,
    pub trail_speed_threshold: f32,
    pub ripple_speed: f32,
    pub ripple_max_radius: f32,
    /// Half-width of the ripple shell
    pub ripple_shell: f32,
    pub ripple_boost: f32,
    pub pulse_decay: f32,
    /// Breathing angular rate (rad/s, ~8 s period)
    pub breath_rate: f32,
    pub breath_amount: f32,
    pub orbit_dim: f32,
    pub orbit_friend_boost: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            trail_length: TRAIL_LENGTH,
            trail_speed_threshold: 0.5,
            ripple_speed: 40.0,
            ripple_max_radius: 120.0,
            ripple_shell: 6.0,
            ripple_boost: 2.5,
            pulse_decay: 0.94,
            breath_rate: 0.785,
            breath_amount: 0.15,
            orbit_dim: 0.5,
            orbit_friend_boost: 1.5,
        }
    }
}

/// Gesture timing and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionParams {
    /// Seconds a press must be held to orbit-lock
    pub long_press: f64,
    /// Max seconds between taps for a double tap
    pub double_tap: f64,
    /// Max world distance between pick ray and a dot
    pub pick_threshold: f32,
    /// Acceleration magnitude that counts as a shake
    pub shake_threshold: f32,
    pub shake_cooldown: f64,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            long_press: LONG_PRESS_SECS,
            double_tap: 0.3,
            pick_threshold: 1.8,
            shake_threshold: 25.0,
            shake_cooldown: 1.0,
        }
    }
}

/// All adjustable parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality preset
    pub quality: QualityPreset,
    pub physics: PhysicsParams,
    pub camera: CameraParams,
    pub effects: EffectParams,
    pub interaction: InteractionParams,
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective trail toggle
    pub fn trails_enabled(&self) -> bool {
        self.quality.trails_enabled() && self.effects.trail_length > 1
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "dot_galaxy_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
