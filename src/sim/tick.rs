//! Frame tick: one pass over every subsystem in a fixed order

use super::state::GalaxyState;

/// Advance the session to `now` (seconds).
///
/// Order: pending gestures, physics, effects, camera. Buffer assembly reads
/// the result afterwards.
pub fn tick(state: &mut GalaxyState, now: f64) {
    state.time = now;
    state.frame += 1;

    state.fire_long_press(now);

    state.step_physics();

    let trails = state.settings.trails_enabled();
    state
        .effects
        .update(now, &state.dots, &state.settings.effects, trails);

    state
        .camera
        .update(now, &state.dots, &state.settings.camera);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::camera::CameraMode;
    use crate::sim::dot::DotSeed;
    use crate::sim::input::InputEvent;
    use glam::{Vec2, Vec3};

    fn run(state: &mut GalaxyState, from: f64, frames: u32) -> f64 {
        let mut now = from;
        for _ in 0..frames {
            now += 1.0 / 60.0;
            tick(state, now);
        }
        now
    }

    #[test]
    fn test_scatter_settles_back_home() {
        let mut state = GalaxyState::generated(Settings::default(), 11);
        state.scatter();
        let now = run(&mut state, 0.0, 30);
        assert!(state.dots.iter().any(|d| d.pos.distance(d.home) > 1.0));
        assert_eq!(state.forces.scatter, 0.0);

        run(&mut state, now, 2000);
        for d in &state.dots {
            // Friend pull leaves a small equilibrium offset
            assert!(d.pos.distance(d.home) < 1.0);
        }
    }

    #[test]
    fn test_long_press_locks_through_tick() {
        let mut state = GalaxyState::new(Settings::default(), 5);
        state.initialize(vec![DotSeed {
            position: Some(Vec3::ZERO),
            ..Default::default()
        }]);
        state.handle(
            InputEvent::Resize {
                width: 800.0,
                height: 600.0,
            },
            0.0,
        );
        state.handle(InputEvent::PointerDown(Vec2::new(400.0, 300.0)), 0.0);
        let now = run(&mut state, 0.0, 80);
        assert_eq!(state.camera.locked_index(), Some(0));
        assert_eq!(state.camera.mode(), CameraMode::OrbitLocked);
        assert!(now > 0.5);
        // Held dot stays where the pointer left it
        assert_eq!(state.dots[0].pos, Vec3::ZERO);
    }

    #[test]
    fn test_tick_is_deterministic_for_a_seed() {
        let mut a = GalaxyState::generated(Settings::default(), 77);
        let mut b = GalaxyState::generated(Settings::default(), 77);
        a.scatter();
        b.scatter();
        run(&mut a, 0.0, 30);
        run(&mut b, 0.0, 30);
        for (da, db) in a.dots.iter().zip(&b.dots) {
            assert_eq!(da.pos, db.pos);
        }
    }

    #[test]
    fn test_created_dot_springs_out() {
        let mut state = GalaxyState::generated(Settings::default(), 2);
        let idx = state.create_dot(DotSeed::default());
        run(&mut state, 0.0, 600);
        let d = &state.dots[idx];
        assert!(d.pos.length() > 5.0);
        assert_eq!(state.effects.heartbeats().count(), 0);
        assert_eq!(state.effects.galaxy_pulse, 0.0);
    }
}
