//! Owned snapshot of a frame for the page script
//!
//! The page may call back into the session while it draws, so it gets a copy
//! rather than a view into live buffers.

use serde_json::json;

use super::buffers::FrameBuffers;
use super::vertex::as_floats;

/// One frame in the flat layout the page script draws from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostFrame {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
    pub brightness: Vec<f32>,
    /// Interleaved `[x, y, z, r, g, b]` line vertices
    pub edges: Vec<f32>,
    pub mutual: Vec<f32>,
    pub trails: Vec<f32>,
    /// Column-major
    pub view_proj: [f32; 16],
    pub edge_alpha: f32,
    pub mutual_alpha: f32,
    /// Labels, heartbeats and markers as JSON
    pub overlay: String,
}

impl HostFrame {
    pub fn capture(buffers: &FrameBuffers) -> Self {
        Self {
            positions: buffers.positions_flat().to_vec(),
            colors: buffers.colors_flat().to_vec(),
            sizes: buffers.sizes.clone(),
            brightness: buffers.brightness.clone(),
            edges: as_floats(&buffers.edges.regular).to_vec(),
            mutual: as_floats(&buffers.edges.mutual).to_vec(),
            trails: as_floats(&buffers.trails).to_vec(),
            view_proj: buffers.view_proj_flat(),
            edge_alpha: buffers.edge_opacity.0,
            mutual_alpha: buffers.edge_opacity.1,
            overlay: overlay_json(buffers),
        }
    }
}

fn overlay_json(buffers: &FrameBuffers) -> String {
    let labels: Vec<_> = buffers
        .labels
        .iter()
        .map(|l| {
            json!({
                "index": l.index,
                "name": l.name,
                "color": l.color,
                "x": l.screen.x,
                "y": l.screen.y,
            })
        })
        .collect();
    let heartbeats: Vec<_> = buffers
        .heartbeats
        .iter()
        .map(|h| {
            json!({
                "center": h.center.to_array(),
                "color": h.color.to_array(),
                "scale": h.scale,
                "opacity": h.opacity,
            })
        })
        .collect();
    json!({
        "edgesVisible": buffers.edges_visible,
        "labels": labels,
        "labelOpacity": buffers.label_opacity,
        "heartbeats": heartbeats,
        "halo": buffers.halo.map(|v| v.to_array()),
        "me": buffers.me_label.map(|v| v.to_array()),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{QualityPreset, Settings};
    use crate::sim::{DotSeed, GalaxyState, tick};

    #[test]
    fn test_capture_is_detached_from_live_buffers() {
        let mut state = GalaxyState::generated(Settings::from_preset(QualityPreset::Low), 6);
        let mut buffers = FrameBuffers::new();
        tick(&mut state, 0.016);
        buffers.assemble(&state);

        let frame = HostFrame::capture(&buffers);
        assert_eq!(frame.positions.len(), 3 * state.dots.len());
        assert_eq!(frame.colors.len(), 3 * state.dots.len());
        assert_eq!(frame.sizes.len(), state.dots.len());
        assert_eq!(frame.edges.len(), 12 * buffers.edges.regular_count());
        assert_eq!(frame.mutual.len(), 12 * buffers.edges.mutual_count());
        assert_eq!(frame.view_proj, buffers.view_proj.to_cols_array());

        // The session keeps going while the copy is drawn
        state.create_dot(DotSeed::default());
        tick(&mut state, 0.032);
        buffers.assemble(&state);
        assert_eq!(frame.sizes.len(), state.dots.len() - 1);
    }

    #[test]
    fn test_overlay_is_valid_json() {
        let mut state = GalaxyState::generated(Settings::from_preset(QualityPreset::Low), 6);
        let idx = state.create_dot(DotSeed::default());
        let mut buffers = FrameBuffers::new();
        tick(&mut state, 0.016);
        buffers.assemble(&state);

        let frame = HostFrame::capture(&buffers);
        let overlay: serde_json::Value = serde_json::from_str(&frame.overlay).unwrap();
        assert_eq!(overlay["heartbeats"].as_array().map(Vec::len), Some(1));
        let halo = overlay["halo"].as_array().unwrap();
        assert_eq!(halo.len(), 3);
        assert!((halo[0].as_f64().unwrap() as f32 - state.dots[idx].pos.x).abs() < 1e-4);
        assert!(overlay["labels"].is_array());
    }
}
