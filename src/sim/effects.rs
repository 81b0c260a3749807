//! Cosmetic overlays layered on top of the physics
//!
//! Nothing in here feeds back into positions or velocities. Time-limited
//! effects share one list and are pruned as they expire.

use glam::Vec3;

use super::dot::Dot;
use crate::settings::EffectParams;

/// Expanding size-boost shell centered on a dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub source: usize,
    pub start: f64,
    /// World units per second
    pub speed: f32,
    pub max_radius: f32,
}

impl Ripple {
    /// Ripple starting now with the current tuning; later settings changes
    /// don't affect it
    pub fn new(source: usize, start: f64, params: &EffectParams) -> Self {
        Self {
            source,
            start,
            speed: params.ripple_speed,
            max_radius: params.ripple_max_radius,
        }
    }

    pub fn radius(&self, now: f64) -> f32 {
        (now - self.start).max(0.0) as f32 * self.speed
    }

    /// Linear fade from 1 at the source to 0 at the max radius
    pub fn fade(&self, now: f64) -> f32 {
        1.0 - self.radius(now) / self.max_radius
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.radius(now) >= self.max_radius
    }
}

/// Expanding translucent sphere marking a newly created dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heartbeat {
    pub center: Vec3,
    pub color: Vec3,
    pub scale: f32,
    pub opacity: f32,
}

/// Growth per frame
const HEARTBEAT_GROWTH: f32 = 0.8;
const HEARTBEAT_FADE: f32 = 0.96;
const HEARTBEAT_MIN_OPACITY: f32 = 0.01;

impl Heartbeat {
    pub fn new(center: Vec3, color: Vec3) -> Self {
        Self {
            center,
            color,
            scale: 1.0,
            opacity: 0.4,
        }
    }
}

/// Temporary size pulse on one dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spotlight {
    pub index: usize,
    pub until: f64,
}

/// Any time-limited effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transient {
    Ripple(Ripple),
    Heartbeat(Heartbeat),
    Spotlight(Spotlight),
}

impl Transient {
    /// Advance one frame; false once the effect has expired
    fn advance(&mut self, now: f64, params: &EffectParams) -> bool {
        match self {
            Transient::Ripple(r) => !r.is_expired(now),
            Transient::Heartbeat(h) => {
                h.scale += HEARTBEAT_GROWTH;
                h.opacity *= HEARTBEAT_FADE;
                h.opacity >= HEARTBEAT_MIN_OPACITY
            }
            Transient::Spotlight(s) => now < s.until,
        }
    }
}

/// How orbit mode shows a dot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitRole {
    /// No lock active, or this is the locked dot
    Normal,
    /// Friend of the locked dot
    Friend,
    /// Everything else while locked
    Dimmed,
}

/// Classify dot `index` relative to the locked dot
pub fn orbit_role(dots: &[Dot], locked: Option<usize>, index: usize) -> OrbitRole {
    match locked.and_then(|l| dots.get(l).map(|d| (l, d))) {
        None => OrbitRole::Normal,
        Some((l, _)) if l == index => OrbitRole::Normal,
        Some((_, locked_dot)) if locked_dot.has_friend(index) => OrbitRole::Friend,
        Some(_) => OrbitRole::Dimmed,
    }
}

/// Global scale from the ~8 second breathing cycle
pub fn breath_scale(time: f64, params: &EffectParams) -> f32 {
    let phase = (time as f32 * params.breath_rate).sin() * 0.5 + 0.5;
    1.0 + phase * params.breath_amount
}

/// One faded trail line segment; `from` is the newer end
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSegment {
    pub from: Vec3,
    pub to: Vec3,
    pub from_color: Vec3,
    pub to_color: Vec3,
}

/// Ring buffer of the last N positions of every dot
#[derive(Debug, Clone, Default)]
pub struct TrailHistory {
    depth: usize,
    count: usize,
    /// `depth` frames of `count` positions each
    frames: Vec<Vec3>,
    head: usize,
}

impl TrailHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            ..Default::default()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fill every frame with the current positions
    pub fn reseed(&mut self, dots: &[Dot]) {
        self.count = dots.len();
        self.head = 0;
        self.frames.clear();
        for _ in 0..self.depth {
            self.frames.extend(dots.iter().map(|d| d.pos));
        }
    }

    /// Push the current positions as the newest frame
    pub fn record(&mut self, dots: &[Dot]) {
        if dots.len() != self.count {
            self.reseed(dots);
            return;
        }
        self.head = (self.head + 1) % self.depth;
        let start = self.head * self.count;
        for (slot, dot) in self.frames[start..start + self.count].iter_mut().zip(dots) {
            *slot = dot.pos;
        }
    }

    /// Position of dot `index` `age` frames ago (0 = newest)
    pub fn sample(&self, age: usize, index: usize) -> Option<Vec3> {
        if age >= self.depth || index >= self.count {
            return None;
        }
        let frame = (self.head + self.depth - age) % self.depth;
        self.frames.get(frame * self.count + index).copied()
    }

    /// Faded segments for every dot moving faster than the threshold
    pub fn segments(&self, dots: &[Dot], params: &EffectParams) -> Vec<TrailSegment> {
        let mut out = Vec::new();
        if self.depth < 2 {
            return out;
        }
        let last = (self.depth - 1) as f32;

        for (i, dot) in dots.iter().enumerate().take(self.count) {
            let speed = dot.vel.length();
            if speed < params.trail_speed_threshold {
                continue;
            }
            let strength = (speed / 2.0).min(1.0);
            for age in 0..self.depth - 1 {
                let (Some(from), Some(to)) = (self.sample(age, i), self.sample(age + 1, i)) else {
                    continue;
                };
                let alpha = (1.0 - age as f32 / last) * strength;
                out.push(TrailSegment {
                    from,
                    to,
                    from_color: dot.rgb * alpha,
                    to_color: dot.rgb * alpha * 0.5,
                });
            }
        }
        out
    }
}

/// All cosmetic state for a session
#[derive(Debug, Clone)]
pub struct Effects {
    pub transients: Vec<Transient>,
    /// Galaxy-wide pulse scalar (1 right after a creation)
    pub galaxy_pulse: f32,
    pub trail: TrailHistory,
    size_boost: Vec<f32>,
}

impl Effects {
    pub fn new(params: &EffectParams) -> Self {
        Self {
            transients: Vec::new(),
            galaxy_pulse: 0.0,
            trail: TrailHistory::new(params.trail_length),
            size_boost: Vec::new(),
        }
    }

    /// Re-fit per-dot buffers after the population changed
    pub fn resize(&mut self, dots: &[Dot]) {
        self.size_boost.resize(dots.len(), 0.0);
        self.trail.reseed(dots);
    }

    pub fn trigger_ripple(&mut self, source: usize, now: f64, params: &EffectParams) {
        self.transients
            .push(Transient::Ripple(Ripple::new(source, now, params)));
    }

    pub fn trigger_pulse(&mut self) {
        self.galaxy_pulse = 1.0;
    }

    pub fn add_heartbeat(&mut self, center: Vec3, color: Vec3) {
        self.transients
            .push(Transient::Heartbeat(Heartbeat::new(center, color)));
    }

    /// Pulse dot `index` until `until`, replacing any previous spotlight on it
    pub fn spotlight(&mut self, index: usize, until: f64) {
        self.transients
            .retain(|t| !matches!(t, Transient::Spotlight(s) if s.index == index));
        self.transients
            .push(Transient::Spotlight(Spotlight { index, until }));
    }

    pub fn is_spotlit(&self, index: usize, now: f64) -> bool {
        self.transients.iter().any(|t| {
            matches!(t, Transient::Spotlight(s) if s.index == index && now < s.until)
        })
    }

    pub fn ripple_count(&self) -> usize {
        self.transients
            .iter()
            .filter(|t| matches!(t, Transient::Ripple(_)))
            .count()
    }

    pub fn heartbeats(&self) -> impl Iterator<Item = &Heartbeat> {
        self.transients.iter().filter_map(|t| match t {
            Transient::Heartbeat(h) => Some(h),
            _ => None,
        })
    }

    /// Extra point size on dot `index` from active ripples
    pub fn size_boost(&self, index: usize) -> f32 {
        self.size_boost.get(index).copied().unwrap_or(0.0)
    }

    /// Clear everything transient (pulse, ripples, heartbeats, spotlights)
    pub fn clear(&mut self, dots: &[Dot]) {
        self.transients.clear();
        self.galaxy_pulse = 0.0;
        self.size_boost.iter_mut().for_each(|b| *b = 0.0);
        self.trail.reseed(dots);
    }

    /// Advance one frame after physics has moved the dots
    pub fn update(&mut self, now: f64, dots: &[Dot], params: &EffectParams, trails: bool) {
        if self.galaxy_pulse > 0.0 {
            self.galaxy_pulse *= params.pulse_decay;
            if self.galaxy_pulse < 0.01 {
                self.galaxy_pulse = 0.0;
            }
        }

        self.transients.retain_mut(|t| t.advance(now, params));

        if self.size_boost.len() != dots.len() {
            self.size_boost.resize(dots.len(), 0.0);
        }
        self.size_boost.iter_mut().for_each(|b| *b = 0.0);

        for t in &self.transients {
            let Transient::Ripple(ripple) = t else {
                continue;
            };
            let Some(source) = dots.get(ripple.source) else {
                continue;
            };
            let radius = ripple.radius(now);
            let strength = params.ripple_boost * ripple.fade(now);
            for (boost, dot) in self.size_boost.iter_mut().zip(dots) {
                let dist = dot.pos.distance(source.pos);
                if (dist - radius).abs() < params.ripple_shell {
                    *boost = boost.max(strength);
                }
            }
        }

        if trails {
            self.trail.record(dots);
        }
    }
}
