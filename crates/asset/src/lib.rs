//! Built-in render data: cube mesh and generated texture pixels.
//! Nothing here touches the filesystem; all data is produced in memory.

pub mod mesh;
pub mod texture;

pub use mesh::{MeshData, MeshVertex, unit_cube};
pub use texture::TextureData;
