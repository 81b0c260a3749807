//! Vertex types shared with the host renderer

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One end of a line segment (edges and trails)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub const FLOATS: usize = 6;

    #[inline]
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// Interleaved `[x, y, z, r, g, b]` view for upload
pub fn as_floats(vertices: &[LineVertex]) -> &[f32] {
    bytemuck::cast_slice(vertices)
}

/// Fixed colors and opacities
pub mod colors {
    /// Canvas clear color
    pub const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.02, 1.0];
    /// Peak opacity of one-way friend edges
    pub const EDGE_OPACITY: f32 = 0.06;
    /// Peak opacity of mutual friend edges
    pub const MUTUAL_EDGE_OPACITY: f32 = 0.12;
    /// Peak opacity of name labels
    pub const LABEL_OPACITY: f32 = 0.5;
}
