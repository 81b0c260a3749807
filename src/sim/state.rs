//! Session state and the operations that mutate it
//!
//! One `GalaxyState` owns the dot population and every subsystem that acts
//! on it. Input handlers, the frame tick and persistence callbacks all go
//! through this object, so there is no ambient mutable state anywhere else.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::CameraRig;
use super::dot::{self, CREATED_SHELL, Dot, DotSeed, HOME_SHELL};
use super::effects::Effects;
use super::input::Interaction;
use super::physics::{self, Forces};
use super::picking::{Projector, Viewport};
use crate::hex_to_hue;
use crate::settings::Settings;

/// Seconds the "my dot" spotlight lasts after flying to it
pub const MY_DOT_SPOTLIGHT_SECS: f64 = 3.0;
/// Zoom used when flying to the user's own dot
pub const MY_DOT_ZOOM: f32 = 50.0;

/// Hue ring used by color mode
const COLOR_RING: (f32, f32) = (45.0, 60.0);
const COLOR_RING_HEIGHT: f32 = 25.0;

/// Things the host UI may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Pointer hovers a different dot (or none)
    HoverChanged(Option<usize>),
    /// Dot tapped or clicked
    Selected(usize),
    OrbitLocked(usize),
    OrbitReleased,
    GravityChanged(Option<Vec3>),
    Scattered,
    DotCreated(usize),
    ColorModeChanged(bool),
    /// A persisted dot got its external identifier
    ClaimReconciled(usize),
}

/// The whole simulation context
#[derive(Debug, Clone)]
pub struct GalaxyState {
    pub settings: Settings,
    pub dots: Vec<Dot>,
    pub forces: Forces,
    pub camera: CameraRig,
    pub effects: Effects,
    pub interaction: Interaction,
    pub viewport: Viewport,
    /// Clock of the last tick (seconds)
    pub time: f64,
    /// Frames ticked so far
    pub frame: u64,
    /// Dot created in this session
    pub my_dot: Option<usize>,
    /// Dot named in the page's referral link
    pub highlighted: Option<usize>,
    /// Last selected dot
    pub selected: Option<usize>,
    /// Original homes while color mode is active
    color_homes: Option<Vec<Vec3>>,
    /// Bumped whenever dots or friend lists change shape
    topology: u64,
    events: Vec<SessionEvent>,
    rng: Pcg32,
}

impl GalaxyState {
    /// Empty session with a seeded RNG
    pub fn new(settings: Settings, seed: u64) -> Self {
        let camera = CameraRig::new(&settings.camera);
        let effects = Effects::new(&settings.effects);
        Self {
            settings,
            dots: Vec::new(),
            forces: Forces::default(),
            camera,
            effects,
            interaction: Interaction::default(),
            viewport: Viewport::default(),
            time: 0.0,
            frame: 0,
            my_dot: None,
            highlighted: None,
            selected: None,
            color_homes: None,
            topology: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Session populated with random dots sized by the quality preset
    pub fn generated(settings: Settings, seed: u64) -> Self {
        let count = settings.quality.generated_dots();
        let mut state = Self::new(settings, seed);
        let dots = dot::generate_dots(&mut state.rng, count);
        state.replace_dots(dots);
        state
    }

    /// Structural version; changes when the edge set must be rebuilt
    pub fn topology(&self) -> u64 {
        self.topology
    }

    pub fn color_mode(&self) -> bool {
        self.color_homes.is_some()
    }

    pub(crate) fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn replace_dots(&mut self, dots: Vec<Dot>) {
        self.dots = dots;
        self.forces.clear();
        self.camera.clear_orbit();
        self.interaction = Interaction::default();
        self.my_dot = None;
        self.highlighted = None;
        self.selected = None;
        self.color_homes = None;
        self.effects.clear(&self.dots);
        self.effects.resize(&self.dots);
        self.topology += 1;
    }

    /// Replace the population with externally supplied seeds.
    ///
    /// Seeds without coordinates get a random shell home. Each dot gets
    /// 1-2 random friends.
    pub fn initialize(&mut self, seeds: Vec<DotSeed>) {
        let mut dots: Vec<Dot> = seeds
            .into_iter()
            .map(|mut seed| {
                let home = seed
                    .position
                    .take()
                    .unwrap_or_else(|| dot::random_shell_point(&mut self.rng, HOME_SHELL));
                Dot::new(seed, home)
            })
            .collect();

        let len = dots.len();
        for (i, d) in dots.iter_mut().enumerate() {
            let n = self.rng.random_range(1..=2);
            dot::assign_random_friends(&mut self.rng, d, n, len, Some(i));
        }

        log::info!("Initialized galaxy with {} dots", len);
        self.replace_dots(dots);
    }

    /// Whether dots `a` and `b` list each other as friends
    pub fn is_mutual(&self, a: usize, b: usize) -> bool {
        self.dots.get(a).is_some_and(|d| d.has_friend(b)) && dot::is_mutual(&self.dots, a, b)
    }

    /// Append a user-created dot near the core.
    ///
    /// The dot starts at the origin and springs out to its home. It gets
    /// 2-3 friends among the existing dots and becomes "my dot".
    pub fn create_dot(&mut self, seed: DotSeed) -> usize {
        let home = dot::random_shell_point(&mut self.rng, CREATED_SHELL);
        let mut created = Dot::new(seed, home);
        created.pos = Vec3::ZERO;

        let existing = self.dots.len();
        let n = self.rng.random_range(2..=3);
        dot::assign_random_friends(&mut self.rng, &mut created, n, existing, None);

        let heart = (created.home, created.rgb);
        self.dots.push(created);
        let index = existing;

        if let Some(saved) = self.color_homes.as_mut() {
            saved.push(home);
        }

        self.effects.resize(&self.dots);
        self.effects.trigger_pulse();
        self.effects.add_heartbeat(heart.0, heart.1);
        self.my_dot = Some(index);
        self.topology += 1;

        log::info!("Created dot {} ({})", index, self.dots[index].name);
        self.emit(SessionEvent::DotCreated(index));
        index
    }

    /// Record the external identifier handed back by persistence
    pub fn reconcile_claim(&mut self, index: usize, slug: String, claimed: bool) {
        match self.dots.get_mut(index) {
            Some(dot) => {
                dot.slug = Some(slug);
                dot.claimed = claimed;
                self.emit(SessionEvent::ClaimReconciled(index));
            }
            None => log::warn!("Dropping claim for unknown dot {}", index),
        }
    }

    /// One physics step over the whole population
    pub fn step_physics(&mut self) {
        physics::step(
            &mut self.dots,
            &mut self.forces,
            &self.settings.physics,
            &mut self.rng,
        );
    }

    pub fn scatter(&mut self) {
        self.forces.trigger_scatter(&self.settings.physics);
        self.emit(SessionEvent::Scattered);
    }

    /// Set or clear the gravity well
    pub fn set_gravity(&mut self, point: Option<Vec3>) {
        if self.forces.gravity != point {
            self.forces.gravity = point;
            self.emit(SessionEvent::GravityChanged(point));
        }
    }

    /// Clear an active well, otherwise place one where `pointer` meets z = 0
    pub fn toggle_gravity(&mut self, pointer: Vec2) {
        if self.forces.gravity.is_some() {
            self.set_gravity(None);
            return;
        }
        if let Some(point) = self.projector().project_to_plane(pointer, 0.0) {
            self.set_gravity(Some(point));
        }
    }

    /// Snapshot of camera + viewport for picking
    pub fn projector(&self) -> Projector {
        Projector::new(self.camera.transform(&self.settings.camera), self.viewport)
    }

    /// Dot under the pointer, if any
    pub fn pick(&self, pointer: Vec2) -> Option<usize> {
        self.projector()
            .pick(pointer, &self.dots, self.settings.interaction.pick_threshold)
    }

    /// Ease the camera onto dot `index` and keep following it
    pub fn lock_orbit(&mut self, index: usize) -> bool {
        let Some(target) = self.dots.get(index).map(|d| d.pos) else {
            return false;
        };
        let zoom = self.settings.camera.lock_zoom;
        self.camera
            .lock_on(index, target, zoom, &self.settings.camera);
        self.emit(SessionEvent::OrbitLocked(index));
        true
    }

    /// Ease back to the origin; no-op when not locked
    pub fn release_orbit(&mut self) -> bool {
        let released = self.camera.unlock(&self.settings.camera);
        if released {
            self.emit(SessionEvent::OrbitReleased);
        }
        released
    }

    /// Select a dot: ripple out from it and tell the host
    pub fn select(&mut self, index: usize, now: f64) {
        if index >= self.dots.len() {
            return;
        }
        self.effects
            .trigger_ripple(index, now, &self.settings.effects);
        self.selected = Some(index);
        self.emit(SessionEvent::Selected(index));
    }

    /// Snap everything home and restore the default view
    pub fn reset(&mut self) {
        physics::reset_all(&mut self.dots, &mut self.forces);
        self.camera.reset(&self.settings.camera);
        self.camera.clear_orbit();
        self.interaction.cancel_all();
        log::info!("Galaxy reset");
    }

    /// Find a dot by case-insensitive name and turn the camera toward it
    pub fn highlight(&mut self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        let index = self
            .dots
            .iter()
            .position(|d| d.name.to_lowercase() == wanted)?;
        self.highlighted = Some(index);
        let home = self.dots[index].home;
        let zoom = self.settings.camera.lock_zoom;
        self.camera.look_toward(home, zoom, &self.settings.camera);
        Some(index)
    }

    /// Lock onto the dot created this session and spotlight it
    pub fn fly_to_my_dot(&mut self, now: f64) -> bool {
        let Some(index) = self.my_dot else {
            return false;
        };
        let Some(target) = self.dots.get(index).map(|d| d.pos) else {
            return false;
        };
        self.camera
            .lock_on(index, target, MY_DOT_ZOOM, &self.settings.camera);
        self.effects.spotlight(index, now + MY_DOT_SPOTLIGHT_SECS);
        self.effects
            .trigger_ripple(index, now, &self.settings.effects);
        self.emit(SessionEvent::OrbitLocked(index));
        true
    }

    /// Re-home every dot onto a hue ring, or restore the saved homes
    pub fn toggle_color_mode(&mut self) -> bool {
        match self.color_homes.take() {
            Some(saved) => {
                for (dot, home) in self.dots.iter_mut().zip(saved) {
                    dot.home = home;
                }
            }
            None => {
                let saved: Vec<Vec3> = self.dots.iter().map(|d| d.home).collect();
                for dot in self.dots.iter_mut() {
                    let angle = hex_to_hue(&dot.color) / 360.0 * std::f32::consts::TAU;
                    let radius = self.rng.random_range(COLOR_RING.0..COLOR_RING.1);
                    let y = (self.rng.random::<f32>() - 0.5) * COLOR_RING_HEIGHT;
                    dot.home = Vec3::new(radius * angle.cos(), y, radius * angle.sin());
                }
                self.color_homes = Some(saved);
            }
        }
        let active = self.color_mode();
        log::info!("Color mode {}", if active { "on" } else { "off" });
        self.emit(SessionEvent::ColorModeChanged(active));
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QualityPreset;
    use crate::sim::camera::CameraMode;

    fn seed(name: &str, at: Vec3) -> DotSeed {
        DotSeed {
            name: name.to_string(),
            color: "#ff0000".to_string(),
            line: "hello".to_string(),
            position: Some(at),
            ..Default::default()
        }
    }

    fn small_state() -> GalaxyState {
        let mut state = GalaxyState::new(Settings::default(), 42);
        state.initialize(vec![
            seed("Kai", Vec3::new(30.0, 0.0, 0.0)),
            seed("luna", Vec3::new(-30.0, 0.0, 0.0)),
            seed("sage", Vec3::new(0.0, 40.0, 0.0)),
        ]);
        state
    }

    #[test]
    fn test_initialize_uses_seed_positions() {
        let state = small_state();
        assert_eq!(state.dots.len(), 3);
        assert_eq!(state.dots[0].home, Vec3::new(30.0, 0.0, 0.0));
        assert_eq!(state.dots[0].pos, state.dots[0].home);
        for (i, d) in state.dots.iter().enumerate() {
            assert!(d.friends.len() <= 2);
            assert!(!d.has_friend(i));
        }
    }

    #[test]
    fn test_generated_population_follows_quality() {
        let state = GalaxyState::generated(Settings::from_preset(QualityPreset::Low), 3);
        assert_eq!(state.dots.len(), 50);
        assert_eq!(state.effects.trail.len(), 50);
    }

    #[test]
    fn test_create_dot_appends_near_core() {
        let mut state = small_state();
        let before = state.topology();
        let idx = state.create_dot(seed("new", Vec3::new(500.0, 0.0, 0.0)));

        assert_eq!(idx, 3);
        assert_eq!(state.my_dot, Some(3));
        let created = &state.dots[3];
        assert_eq!(created.pos, Vec3::ZERO);
        let r = created.home.length();
        assert!(r >= CREATED_SHELL.0 - 0.001 && r <= CREATED_SHELL.1 + 0.001);
        assert!(created.friends.iter().all(|&f| f < 3));
        assert!((2..=3).contains(&created.friends.len()));
        assert!(state.topology() > before);
        assert_eq!(state.effects.galaxy_pulse, 1.0);
        assert_eq!(state.effects.heartbeats().count(), 1);
        assert!(state.drain_events().contains(&SessionEvent::DotCreated(3)));
    }

    #[test]
    fn test_create_dot_in_empty_galaxy_has_no_friends() {
        let mut state = GalaxyState::new(Settings::default(), 1);
        let idx = state.create_dot(DotSeed::default());
        assert_eq!(idx, 0);
        assert!(state.dots[0].friends.is_empty());
    }

    #[test]
    fn test_reconcile_claim() {
        let mut state = small_state();
        state.reconcile_claim(1, "luna-2".to_string(), true);
        assert_eq!(state.dots[1].slug.as_deref(), Some("luna-2"));
        assert!(state.dots[1].claimed);
        state.reconcile_claim(99, "ghost".to_string(), false);
        let events = state.drain_events();
        assert_eq!(events, vec![SessionEvent::ClaimReconciled(1)]);
    }

    #[test]
    fn test_mutual_requires_both_directions() {
        let mut state = small_state();
        for d in state.dots.iter_mut() {
            d.friends.clear();
        }
        state.dots[0].friends.push(1);
        assert!(!state.is_mutual(0, 1));
        state.dots[1].friends.push(0);
        assert!(state.is_mutual(0, 1));
        assert!(state.is_mutual(1, 0));
        assert!(!state.is_mutual(0, 7));
    }

    #[test]
    fn test_gravity_toggles_on_plane() {
        let mut state = small_state();
        state.viewport = Viewport::new(800.0, 600.0);
        state.toggle_gravity(Vec2::new(400.0, 300.0));
        let well = state.forces.gravity.unwrap();
        assert!(well.truncate().length() < 1e-3);
        assert_eq!(well.z, 0.0);
        state.toggle_gravity(Vec2::new(10.0, 10.0));
        assert!(state.forces.gravity.is_none());
    }

    #[test]
    fn test_highlight_is_case_insensitive() {
        let mut state = small_state();
        assert_eq!(state.highlight("KAI"), Some(0));
        assert_eq!(state.highlighted, Some(0));
        assert!(!state.camera.auto_rotate);
        assert!((state.camera.target_yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(state.highlight("nobody"), None);
    }

    #[test]
    fn test_fly_to_my_dot() {
        let mut state = small_state();
        assert!(!state.fly_to_my_dot(0.0));
        let idx = state.create_dot(seed("me", Vec3::ZERO));
        assert!(state.fly_to_my_dot(1.0));
        assert_eq!(state.camera.locked_index(), Some(idx));
        assert_eq!(state.camera.target_zoom, MY_DOT_ZOOM);
        assert!(state.effects.is_spotlit(idx, 3.9));
        assert!(!state.effects.is_spotlit(idx, 4.0));
        assert_eq!(state.effects.ripple_count(), 1);
    }

    #[test]
    fn test_color_mode_round_trip_restores_homes() {
        let mut state = small_state();
        let homes: Vec<Vec3> = state.dots.iter().map(|d| d.home).collect();
        assert!(state.toggle_color_mode());
        for d in &state.dots {
            let flat = Vec3::new(d.home.x, 0.0, d.home.z).length();
            assert!((45.0..=60.0).contains(&flat));
            assert!(d.home.y.abs() <= 12.5);
        }
        // Pure red sits at hue 0, on the +x axis
        assert!(state.dots[0].home.x > 0.0 && state.dots[0].home.z.abs() < 1e-3);
        assert!(!state.toggle_color_mode());
        let restored: Vec<Vec3> = state.dots.iter().map(|d| d.home).collect();
        assert_eq!(restored, homes);
    }

    #[test]
    fn test_reset_clears_forces_and_orbit() {
        let mut state = small_state();
        state.scatter();
        state.set_gravity(Some(Vec3::ONE));
        state.lock_orbit(1);
        state.dots[0].pos = Vec3::splat(99.0);
        state.reset();
        assert_eq!(state.forces.scatter, 0.0);
        assert!(state.forces.gravity.is_none());
        assert_eq!(state.dots[0].pos, state.dots[0].home);
        assert_eq!(state.camera.mode(), CameraMode::FreeRotate);
        assert_eq!(state.camera.center(), Vec3::ZERO);
    }

    #[test]
    fn test_lock_stale_index_is_rejected() {
        let mut state = small_state();
        assert!(!state.lock_orbit(10));
        assert_eq!(state.camera.locked_index(), None);
        assert!(!state.release_orbit());
    }
}
