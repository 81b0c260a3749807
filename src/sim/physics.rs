//! Per-frame force integration
//!
//! One explicit Euler step per animation frame. Grabbed dots are skipped
//! entirely; their position is owned by the pointer.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::dot::Dot;
use crate::direction_and_distance;
use crate::settings::PhysicsParams;

/// Global forces acting on every free dot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forces {
    /// Outward push magnitude (decays every frame)
    pub scatter: f32,
    /// Optional attractor (at most one)
    pub gravity: Option<Vec3>,
}

impl Forces {
    /// Start a scatter burst
    pub fn trigger_scatter(&mut self, params: &PhysicsParams) {
        self.scatter = params.scatter_strength;
    }

    /// Geometric decay, floored to exactly zero
    pub fn decay_scatter(&mut self, params: &PhysicsParams) {
        if self.scatter > 0.0 {
            self.scatter *= params.scatter_decay;
            if self.scatter < params.scatter_floor {
                self.scatter = 0.0;
            }
        }
    }

    pub fn clear(&mut self) {
        self.scatter = 0.0;
        self.gravity = None;
    }
}

/// Advance every non-grabbed dot by one frame
pub fn step<R: Rng>(dots: &mut [Dot], forces: &mut Forces, params: &PhysicsParams, rng: &mut R) {
    let (jitter_lo, jitter_hi) = params.scatter_jitter;

    for i in 0..dots.len() {
        if dots[i].grabbed {
            continue;
        }

        let pos = dots[i].pos;
        let mut vel = dots[i].vel;

        // Spring snap-back to home
        vel += (dots[i].home - pos) * params.spring;

        // Friend pull, only once friends have drifted apart
        for &fi in &dots[i].friends {
            let Some(friend) = dots.get(fi) else {
                continue;
            };
            let (dir, dist) = direction_and_distance(pos, friend.pos);
            if dist > params.friend_threshold {
                vel += dir * params.friend_pull;
            }
        }

        // Gravity vortex: radial pull plus swirl around z
        if let Some(well) = forces.gravity {
            let (dir, dist) = direction_and_distance(pos, well);
            let f = params.gravity / (1.0 + dist * params.gravity_falloff);
            vel += dir * f;
            vel += Vec3::new(-dir.y, dir.x, 0.0) * f * params.swirl;
        }

        // Scatter: push away from the origin
        if forces.scatter > 0.0 {
            let (dir, _) = direction_and_distance(Vec3::ZERO, pos);
            let jitter = Vec3::new(
                rng.random_range(jitter_lo..jitter_hi),
                rng.random_range(jitter_lo..jitter_hi),
                rng.random_range(jitter_lo..jitter_hi),
            );
            vel += dir * forces.scatter * jitter;
        }

        vel *= params.damping;

        let dot = &mut dots[i];
        dot.vel = vel;
        dot.pos += vel;
    }

    forces.decay_scatter(params);
}

/// Take pointer ownership of a dot. Returns false for a stale index.
pub fn grab(dots: &mut [Dot], index: usize) -> bool {
    match dots.get_mut(index) {
        Some(dot) => {
            dot.grabbed = true;
            true
        }
        None => false,
    }
}

/// Move a grabbed dot to `target` and tug its friends toward it
pub fn drag_to(dots: &mut [Dot], index: usize, target: Vec3, params: &PhysicsParams) {
    let Some(dot) = dots.get_mut(index) else {
        return;
    };
    dot.pos = target;

    let tug = Vec3::new(params.tug_lateral, params.tug_lateral, params.tug_depth);
    for k in 0..dots[index].friends.len() {
        let fi = dots[index].friends[k];
        if fi == index {
            continue;
        }
        let Some(friend) = dots.get_mut(fi) else {
            continue;
        };
        let (dir, _) = direction_and_distance(friend.pos, target);
        friend.vel += dir * tug;
    }
}

/// Hand a dot back to physics with a gentle snap-back velocity
pub fn release(dots: &mut [Dot], index: usize, params: &PhysicsParams) {
    if let Some(dot) = dots.get_mut(index) {
        dot.grabbed = false;
        dot.vel = -(dot.pos - dot.home) * params.release_factor;
    }
}

/// Snap every dot home and stop it
pub fn reset_all(dots: &mut [Dot], forces: &mut Forces) {
    forces.clear();
    for dot in dots.iter_mut() {
        dot.pos = dot.home;
        dot.vel = Vec3::ZERO;
        dot.grabbed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::dot::DotSeed;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn dot_at(home: Vec3, pos: Vec3) -> Dot {
        let mut dot = Dot::new(DotSeed::default(), home);
        dot.pos = pos;
        dot
    }

    #[test]
    fn test_single_dot_settles_home() {
        let params = PhysicsParams::default();
        let mut forces = Forces::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut dots = vec![dot_at(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO)];

        for _ in 0..200 {
            step(&mut dots, &mut forces, &params, &mut rng);
        }

        assert!((dots[0].pos - Vec3::new(10.0, 0.0, 0.0)).length() < 0.05);
        assert!(dots[0].vel.length() < 0.01);
    }

    #[test]
    fn test_rest_energy_decays() {
        let params = PhysicsParams::default();
        let mut forces = Forces::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut dots = vec![dot_at(Vec3::new(-30.0, 12.0, 5.0), Vec3::new(40.0, -8.0, 0.0))];

        let mut peak_speed = 0.0f32;
        for _ in 0..1500 {
            step(&mut dots, &mut forces, &params, &mut rng);
            peak_speed = peak_speed.max(dots[0].vel.length());
        }
        assert!(peak_speed > 0.1);
        assert!((dots[0].pos - dots[0].home).length() < 1e-3);
        assert!(dots[0].vel.length() < 1e-4);
    }

    #[test]
    fn test_grabbed_dot_is_frozen() {
        let params = PhysicsParams::default();
        let mut forces = Forces {
            scatter: 3.0,
            gravity: Some(Vec3::new(5.0, 5.0, 0.0)),
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let mut dots = vec![dot_at(Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0))];
        dots[0].vel = Vec3::new(1.0, 2.0, 3.0);
        assert!(grab(&mut dots, 0));

        for _ in 0..10 {
            step(&mut dots, &mut forces, &params, &mut rng);
        }
        assert_eq!(dots[0].pos, Vec3::new(50.0, 0.0, 0.0));
        assert_eq!(dots[0].vel, Vec3::new(1.0, 2.0, 3.0));

        drag_to(&mut dots, 0, Vec3::new(7.0, -2.0, 4.0), &params);
        step(&mut dots, &mut forces, &params, &mut rng);
        assert_eq!(dots[0].pos, Vec3::new(7.0, -2.0, 4.0));
    }

    #[test]
    fn test_release_velocity_law() {
        let params = PhysicsParams::default();
        let mut dots = vec![dot_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO)];
        grab(&mut dots, 0);
        drag_to(&mut dots, 0, Vec3::new(13.5, -7.25, 2.0), &params);
        let (pos, home) = (dots[0].pos, dots[0].home);

        release(&mut dots, 0, &params);
        assert!(!dots[0].grabbed);
        assert_eq!(dots[0].vel, -(pos - home) * 0.05);
    }

    #[test]
    fn test_scatter_decay_sequence() {
        let params = PhysicsParams::default();
        let mut forces = Forces::default();
        forces.trigger_scatter(&params);
        let s = forces.scatter;

        let mut n = 0;
        while forces.scatter > 0.0 {
            n += 1;
            forces.decay_scatter(&params);
            let expected = s * 0.8f32.powi(n);
            if expected >= 0.01 {
                assert!((forces.scatter - expected).abs() < 1e-5);
            } else {
                assert_eq!(forces.scatter, 0.0);
            }
        }
        // 3.0 * 0.8^n < 0.01 first at n = 26
        assert_eq!(n, 26);
    }

    #[test]
    fn test_scatter_pushes_outward() {
        let params = PhysicsParams::default();
        let mut forces = Forces::default();
        forces.trigger_scatter(&params);
        let mut rng = Pcg32::seed_from_u64(4);
        let mut dots = vec![dot_at(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0))];

        step(&mut dots, &mut forces, &params, &mut rng);
        // 3.0 * [0.8, 1.2) * 0.94
        assert!(dots[0].vel.x >= 3.0 * 0.8 * 0.94 - 1e-4);
        assert!(dots[0].vel.x < 3.0 * 1.2 * 0.94);
        assert_eq!(dots[0].vel.y, 0.0);
    }

    #[test]
    fn test_grab_tugs_friends() {
        let params = PhysicsParams::default();
        let mut a = dot_at(Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 1.0));
        a.friends.push(1);
        let b = dot_at(Vec3::ZERO, Vec3::ZERO);
        let mut dots = vec![a, b];

        grab(&mut dots, 0);
        drag_to(&mut dots, 0, Vec3::new(5.0, 5.0, 5.0), &params);

        let unit = Vec3::new(5.0, 5.0, 5.0).normalize();
        let expected = unit * Vec3::new(0.3, 0.3, 0.1);
        assert!((dots[1].vel - expected).length() < 1e-6);
        assert_eq!(dots[1].pos, Vec3::ZERO);
    }

    #[test]
    fn test_stale_friend_index_is_skipped() {
        let params = PhysicsParams::default();
        let mut forces = Forces::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut a = dot_at(Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0));
        a.friends = vec![42, 7];
        let mut dots = vec![a];

        step(&mut dots, &mut forces, &params, &mut rng);
        grab(&mut dots, 0);
        drag_to(&mut dots, 0, Vec3::ONE, &params);
        assert!(!grab(&mut dots, 3));
        assert!(dots[0].pos.is_finite());
    }

    #[test]
    fn test_friend_pull_needs_distance() {
        let params = PhysicsParams::default();
        let mut forces = Forces::default();
        let mut rng = Pcg32::seed_from_u64(6);

        let mut near = dot_at(Vec3::ZERO, Vec3::ZERO);
        near.friends.push(1);
        let mut dots = vec![near, dot_at(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0))];
        step(&mut dots, &mut forces, &params, &mut rng);
        assert_eq!(dots[0].vel, Vec3::ZERO);

        dots[0].vel = Vec3::ZERO;
        dots[1].pos = Vec3::new(30.0, 0.0, 0.0);
        dots[1].home = dots[1].pos;
        step(&mut dots, &mut forces, &params, &mut rng);
        assert!((dots[0].vel.x - 0.001 * 0.94).abs() < 1e-7);
    }

    #[test]
    fn test_gravity_swirls() {
        let params = PhysicsParams::default();
        let mut forces = Forces {
            scatter: 0.0,
            gravity: Some(Vec3::ZERO),
        };
        let mut rng = Pcg32::seed_from_u64(8);
        let start = Vec3::new(100.0, 0.0, 0.0);
        let mut dots = vec![dot_at(start, start)];

        step(&mut dots, &mut forces, &params, &mut rng);
        let f = 0.15 / (1.0 + 100.0 * 0.01);
        assert!((dots[0].vel.x - (-f * 0.94)).abs() < 1e-6);
        // Swirl is perpendicular (counter-clockwise around z)
        assert!((dots[0].vel.y - (-f * 0.3 * 0.94)).abs() < 1e-6);
    }

    #[test]
    fn test_reset_all() {
        let mut forces = Forces {
            scatter: 2.0,
            gravity: Some(Vec3::ONE),
        };
        let mut dots = vec![dot_at(Vec3::ONE, Vec3::ZERO)];
        dots[0].vel = Vec3::X;
        dots[0].grabbed = true;

        reset_all(&mut dots, &mut forces);
        assert_eq!(dots[0].pos, Vec3::ONE);
        assert_eq!(dots[0].vel, Vec3::ZERO);
        assert!(!dots[0].grabbed);
        assert_eq!(forces.scatter, 0.0);
        assert!(forces.gravity.is_none());
    }
}
