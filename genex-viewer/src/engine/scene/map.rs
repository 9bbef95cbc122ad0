use super::{GeometryError, LayerPart, ensure_finite, polyline_mesh};
use crate::pipeline::artifacts::MapArtifact;
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use constants::viewport::{MAP_PATH_COLOUR, MAP_POINT_COLOUR};

/// Build the map overlay: the point cloud as a point list and one polyline
/// per navigation path. Entries that are not `[x, y, z]` and paths with fewer
/// than two points are skipped.
pub fn map_parts(map: &MapArtifact) -> Result<Vec<LayerPart>, GeometryError> {
    let points = map.points();
    let paths = map.paths();
    ensure_finite("map point", &points)?;
    for (_, path) in &paths {
        ensure_finite("navigation point", path)?;
    }

    let mut parts = Vec::new();
    if !points.is_empty() {
        let mut mesh = Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, points);
        parts.push(LayerPart {
            name: format!("map {} points", map.environment_id),
            mesh,
            colour: MAP_POINT_COLOUR,
            unlit: true,
            transform: Transform::IDENTITY,
        });
    }

    for (name, path) in paths.iter().filter(|(_, path)| path.len() >= 2) {
        parts.push(LayerPart {
            name: format!("map {} path {}", map.environment_id, name),
            mesh: polyline_mesh(path),
            colour: MAP_PATH_COLOUR,
            unlit: true,
            transform: Transform::IDENTITY,
        });
    }

    Ok(parts)
}
