//! Placeholder geometry for each viewport layer.
//!
//! Builders are pure: they turn an artifact into a list of [`LayerPart`]s and
//! never touch the world, so a bad artifact fails here instead of inside the
//! frame loop.

/// Ground plane and id-coloured anchor for a generated environment.
pub mod environment;

/// Polyline plus start/end markers for an exploration trajectory.
pub mod trajectory;

/// Point list and navigation polylines for a map artifact.
pub mod map;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use thiserror::Error;

/// One mesh of a layer, with the material parameters it is drawn with.
#[derive(Debug)]
pub struct LayerPart {
    pub name: String,
    pub mesh: Mesh,
    pub colour: Color,
    pub unlit: bool,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{what} {index} has a non-finite coordinate {point:?}")]
    NonFinite {
        what: &'static str,
        index: usize,
        point: [f32; 3],
    },
}

pub(crate) fn ensure_finite(
    what: &'static str,
    points: &[[f32; 3]],
) -> Result<(), GeometryError> {
    match points
        .iter()
        .position(|point| point.iter().any(|c| !c.is_finite()))
    {
        Some(index) => Err(GeometryError::NonFinite {
            what,
            index,
            point: points[index],
        }),
        None => Ok(()),
    }
}

/// Line segments joining consecutive points.
pub(crate) fn polyline_mesh(points: &[[f32; 3]]) -> Mesh {
    let mut indices = Vec::with_capacity(points.len().saturating_sub(1) * 2);
    for i in 1..points.len() {
        indices.extend_from_slice(&[(i - 1) as u32, i as u32]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, points.to_vec());
    mesh.insert_indices(Indices::U32(indices));
    mesh
}
