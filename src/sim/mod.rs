//! Single-threaded simulation module
//!
//! Everything that moves lives here. This module stays free of rendering and
//! platform code:
//! - Time is passed in, never read from a clock
//! - Seeded RNG only
//! - Dots are addressed by stable index; the population only grows
//! - Stale indices are ignored, never a panic

pub mod camera;
pub mod dot;
pub mod effects;
pub mod input;
pub mod physics;
pub mod picking;
pub mod state;
pub mod tick;

pub use camera::{CameraMode, CameraRig, CameraTransform, OrbitTransition};
pub use dot::{Dot, DotSeed, GalaxyDot, generate_dots, is_mutual};
pub use effects::{Effects, Heartbeat, OrbitRole, Ripple, TrailHistory, TrailSegment, Transient};
pub use input::{InputEvent, Interaction, Key, key_for_code};
pub use physics::Forces;
pub use picking::{Projector, Ray, ScreenPoint, Viewport};
pub use state::{GalaxyState, SessionEvent};
pub use tick::tick;
