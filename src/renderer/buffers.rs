//! Per-frame buffer assembly
//!
//! Everything the host renderer draws is rebuilt from the session state after
//! each tick. Per-dot arrays are always exactly as long as the population.
//! Edge topology is cached and only rebuilt when the session's topology
//! version changes.

use glam::{Mat4, Vec2, Vec3};

use super::vertex::{LineVertex, colors};
use crate::sim::effects::{OrbitRole, breath_scale, orbit_role};
use crate::sim::{CameraTransform, GalaxyState, Heartbeat};

/// Edges fade out entirely at this zoom
const EDGE_FADE_ZOOM: f32 = 200.0;
/// Zoom range over which edges fade in
const EDGE_FADE_RANGE: f32 = 80.0;
/// Labels appear below this zoom
const LABEL_ZOOM: f32 = 120.0;
const LABEL_FADE_RANGE: f32 = 60.0;
/// Most labels shown at once
pub const LABEL_LIMIT: usize = 30;
/// The "me" label hides when zoomed in closer than this
const ME_LABEL_ZOOM: f32 = 100.0;

const GRABBED_SIZE: f32 = 6.0;
const MY_DOT_BONUS: f32 = 0.5;

/// Edge opacity from camera distance as `(regular, mutual)`; zero at or
/// beyond the fade zoom
pub fn edge_opacity(zoom: f32) -> (f32, f32) {
    if zoom >= EDGE_FADE_ZOOM {
        return (0.0, 0.0);
    }
    let fade = ((EDGE_FADE_ZOOM - zoom) / EDGE_FADE_RANGE).min(1.0);
    (fade * colors::EDGE_OPACITY, fade * colors::MUTUAL_EDGE_OPACITY)
}

/// Label opacity from camera distance; zero at or beyond the label zoom
pub fn label_opacity(zoom: f32) -> f32 {
    if zoom >= LABEL_ZOOM {
        return 0.0;
    }
    ((LABEL_ZOOM - zoom) / LABEL_FADE_RANGE).min(1.0) * colors::LABEL_OPACITY
}

/// Friend edges split into one-way and mutual sets
#[derive(Debug, Clone, Default)]
pub struct EdgeBuffers {
    topology: Option<u64>,
    regular_pairs: Vec<(usize, usize)>,
    mutual_pairs: Vec<(usize, usize)>,
    pub regular: Vec<LineVertex>,
    pub mutual: Vec<LineVertex>,
}

impl EdgeBuffers {
    pub fn regular_count(&self) -> usize {
        self.regular_pairs.len()
    }

    pub fn mutual_count(&self) -> usize {
        self.mutual_pairs.len()
    }

    /// Rebuild the edge sets if the topology changed, then refresh positions.
    /// Returns true when a rebuild happened.
    pub fn sync(&mut self, state: &GalaxyState) -> bool {
        let rebuilt = self.topology != Some(state.topology());
        if rebuilt {
            self.rebuild(state);
        }
        let dots = &state.dots;
        for (pairs, verts) in [
            (&self.regular_pairs, &mut self.regular),
            (&self.mutual_pairs, &mut self.mutual),
        ] {
            for (k, &(a, b)) in pairs.iter().enumerate() {
                verts[2 * k].position = dots[a].pos.to_array();
                verts[2 * k + 1].position = dots[b].pos.to_array();
            }
        }
        rebuilt
    }

    fn rebuild(&mut self, state: &GalaxyState) {
        self.regular_pairs.clear();
        self.mutual_pairs.clear();
        self.regular.clear();
        self.mutual.clear();

        let dots = &state.dots;
        for (i, dot) in dots.iter().enumerate() {
            for &fi in &dot.friends {
                let Some(friend) = dots.get(fi) else {
                    continue;
                };
                let (pairs, verts) = if state.is_mutual(i, fi) {
                    (&mut self.mutual_pairs, &mut self.mutual)
                } else {
                    (&mut self.regular_pairs, &mut self.regular)
                };
                pairs.push((i, fi));
                verts.push(LineVertex::new(dot.pos, dot.rgb));
                verts.push(LineVertex::new(friend.pos, friend.rgb));
            }
        }

        self.topology = Some(state.topology());
        log::debug!(
            "Rebuilt edges: {} regular, {} mutual",
            self.regular_pairs.len(),
            self.mutual_pairs.len()
        );
    }
}

/// Name label anchored to a dot on screen
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub index: usize,
    pub name: String,
    pub color: String,
    pub screen: Vec2,
}

/// Everything the host needs to draw one frame
#[derive(Debug, Clone, Default)]
pub struct FrameBuffers {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub sizes: Vec<f32>,
    pub brightness: Vec<f32>,
    pub edges: EdgeBuffers,
    /// `(regular, mutual)`
    pub edge_opacity: (f32, f32),
    pub edges_visible: bool,
    pub trails: Vec<LineVertex>,
    pub heartbeats: Vec<Heartbeat>,
    pub labels: Vec<Label>,
    pub label_opacity: f32,
    /// Halo around the user's own dot
    pub halo: Option<Vec3>,
    /// Screen anchor of the "me" label, when it should show
    pub me_label: Option<Vec2>,
    pub camera: Option<CameraTransform>,
    pub view_proj: Mat4,
}

impl FrameBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat `[x, y, z, ...]` view of the dot positions
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Column-major view-projection matrix
    pub fn view_proj_flat(&self) -> [f32; 16] {
        self.view_proj.to_cols_array()
    }

    /// Rebuild every buffer from the current state
    pub fn assemble(&mut self, state: &GalaxyState) {
        let n = state.dots.len();
        self.positions.resize(n, Vec3::ZERO);
        self.colors.resize(n, Vec3::ZERO);
        self.sizes.resize(n, 0.0);
        self.brightness.resize(n, 0.0);

        self.assemble_points(state);

        let zoom = state.camera.zoom;
        self.edges.sync(state);
        self.edges_visible = !state.color_mode() && zoom < EDGE_FADE_ZOOM;
        self.edge_opacity = if self.edges_visible {
            edge_opacity(zoom)
        } else {
            (0.0, 0.0)
        };

        self.trails.clear();
        if state.settings.trails_enabled() {
            for seg in state.effects.trail.segments(&state.dots, &state.settings.effects) {
                self.trails.push(LineVertex::new(seg.from, seg.from_color));
                self.trails.push(LineVertex::new(seg.to, seg.to_color));
            }
        }

        self.heartbeats.clear();
        self.heartbeats.extend(state.effects.heartbeats().copied());

        let transform = state.camera.transform(&state.settings.camera);
        let projector = state.projector();
        self.camera = Some(transform);
        self.view_proj = transform.view_projection(state.viewport.aspect());

        self.label_opacity = label_opacity(zoom);
        self.labels.clear();
        if self.label_opacity > 0.0 {
            for p in projector.nearest_on_screen(&state.dots, LABEL_LIMIT) {
                let dot = &state.dots[p.index];
                self.labels.push(Label {
                    index: p.index,
                    name: dot.name.clone(),
                    color: dot.color.clone(),
                    screen: p.screen,
                });
            }
        }

        self.halo = state.my_dot.and_then(|i| state.dots.get(i)).map(|d| d.pos);
        self.me_label = self
            .halo
            .filter(|_| zoom > ME_LABEL_ZOOM)
            .and_then(|pos| projector.to_screen(pos))
            .map(|(screen, _)| screen);
    }

    fn assemble_points(&mut self, state: &GalaxyState) {
        let t = state.time;
        let tf = t as f32;
        let fx = &state.settings.effects;
        let breath = breath_scale(t, fx);
        let pulse = state.effects.galaxy_pulse * 2.0;
        let locked = state.camera.locked_index();

        for (i, dot) in state.dots.iter().enumerate() {
            let wobble = (tf * 0.7 + i as f32 * 1.1).sin() * 0.7;
            let base = 2.5 + dot.connection_scale() * 2.0 + wobble;
            let mut size = (base + state.effects.size_boost(i) + pulse) * breath;

            if state.highlighted == Some(i) {
                size = 4.0 + (tf * 2.0).sin() * 1.5;
            }
            if dot.grabbed {
                size = GRABBED_SIZE;
            }
            if state.my_dot == Some(i) {
                if state.effects.is_spotlit(i, t) {
                    size = 6.0 + (tf * 4.0).sin() * 1.5;
                } else {
                    size += MY_DOT_BONUS;
                }
            }

            let mut color = dot.rgb;
            match orbit_role(&state.dots, locked, i) {
                OrbitRole::Dimmed => color *= fx.orbit_dim,
                OrbitRole::Friend => size += fx.orbit_friend_boost,
                OrbitRole::Normal => {}
            }

            self.positions[i] = dot.pos;
            self.colors[i] = color;
            self.sizes[i] = size;
            self.brightness[i] = dot.base_brightness() * breath;
        }
    }
}
