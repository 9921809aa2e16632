pub mod curve;
pub mod tube;

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use crate::core::ar_error::ArError;
use crate::core::config::{TubeSettings, Waypoints};

#[derive(Debug, Clone, Default)]
pub struct TubeBuffers {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TubeBuffers {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        TubeBuffers {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }
}

impl From<TubeBuffers> for Mesh {
    fn from(buffers: TubeBuffers) -> Self {
        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, buffers.positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, buffers.normals)
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, buffers.uvs)
            .with_inserted_indices(Indices::U32(buffers.indices))
    }
}

/// Curve through the waypoints, swept into a tube mesh in anchor-local space.
pub fn build_path_mesh(waypoints: &Waypoints, settings: &TubeSettings) -> Result<Mesh, ArError> {
    let curve = curve::waypoint_curve(waypoints, settings.closed)?;
    Ok(tube::generate_tube(&curve, settings).into())
}
