//! Render-buffer boundary
//!
//! The crate does no drawing itself. Each frame it fills flat buffers
//! (positions, colors, sizes, brightness, edges, trails) that the host
//! renderer uploads as-is.

pub mod buffers;
pub mod host;
pub mod vertex;

pub use buffers::{EdgeBuffers, FrameBuffers, LABEL_LIMIT, Label, edge_opacity, label_opacity};
pub use host::HostFrame;
pub use vertex::{LineVertex, as_floats};
