//! Render adapter: scene snapshots to coloured quads via wgpu

pub mod pipeline;
pub mod shapes;
pub mod sprite;
pub mod vertex;

pub use pipeline::RenderState;
pub use shapes::scene_vertices;
pub use vertex::Vertex;
