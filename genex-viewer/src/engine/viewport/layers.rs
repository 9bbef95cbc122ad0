use super::ViewportUpdate;
use crate::engine::scene::environment::environment_parts;
use crate::engine::scene::map::map_parts;
use crate::engine::scene::trajectory::trajectory_parts;
use crate::engine::scene::{GeometryError, LayerPart};
use crate::pipeline::status::StatusReporter;
use bevy::prelude::*;

/// Marks the root entity of one visual layer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportLayer {
    Environment,
    Trajectory,
    Map,
}

impl ViewportLayer {
    pub const ALL: [ViewportLayer; 3] = [Self::Environment, Self::Trajectory, Self::Map];

    fn label(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Trajectory => "trajectory",
            Self::Map => "map",
        }
    }
}

/// What each layer currently shows.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewportLayers {
    pub environment_id: Option<String>,
    pub trajectory_samples: Option<usize>,
    pub map_environment_id: Option<String>,
    /// Layers on screen, least recently rendered first. Each appears once.
    pub history: Vec<ViewportLayer>,
}

impl ViewportLayers {
    fn record(&mut self, layer: ViewportLayer) {
        self.history.retain(|shown| *shown != layer);
        self.history.push(layer);
    }

    fn forget(&mut self, layer: ViewportLayer) {
        match layer {
            ViewportLayer::Environment => self.environment_id = None,
            ViewportLayer::Trajectory => self.trajectory_samples = None,
            ViewportLayer::Map => self.map_environment_id = None,
        }
        self.history.retain(|shown| *shown != layer);
    }
}

/// Apply queued viewport updates. Each render replaces its layer wholesale;
/// camera and lighting entities are never touched.
///
/// Geometry failures are contained to their layer: the old layer is removed,
/// the error goes to the status channel and the frame carries on.
pub fn apply_viewport_updates(
    mut commands: Commands,
    mut updates: EventReader<ViewportUpdate>,
    layer_roots: Query<(Entity, &ViewportLayer)>,
    mut layers: ResMut<ViewportLayers>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut status: ResMut<StatusReporter>,
) {
    // Commands only flush after the system, so track roots locally to cover
    // several updates for one layer arriving in the same frame.
    let mut roots: Vec<(Entity, ViewportLayer)> = layer_roots
        .iter()
        .map(|(entity, layer)| (entity, *layer))
        .collect();

    for update in updates.read() {
        let (layer, built): (ViewportLayer, Result<Vec<LayerPart>, GeometryError>) = match update
        {
            ViewportUpdate::Environment(environment) => {
                layers.environment_id = Some(environment.id.clone());
                (ViewportLayer::Environment, Ok(environment_parts(environment)))
            }
            ViewportUpdate::Trajectory(trajectory) => {
                layers.trajectory_samples = Some(trajectory.len());
                (ViewportLayer::Trajectory, trajectory_parts(trajectory))
            }
            ViewportUpdate::Map(map) => {
                layers.map_environment_id = Some(map.environment_id.clone());
                (ViewportLayer::Map, map_parts(map))
            }
            ViewportUpdate::Clear => {
                for layer in ViewportLayer::ALL {
                    despawn_layer(&mut commands, &mut roots, layer);
                    layers.forget(layer);
                }
                debug!("Viewport cleared");
                continue;
            }
        };

        despawn_layer(&mut commands, &mut roots, layer);

        match built {
            Ok(parts) => {
                let part_count = parts.len();
                let root = spawn_layer(&mut commands, &mut meshes, &mut materials, layer, parts);
                roots.push((root, layer));
                layers.record(layer);
                info!("Rendered {} layer ({} parts)", layer.label(), part_count);
            }
            Err(error) => {
                layers.forget(layer);
                error!("Failed to build {} layer: {}", layer.label(), error);
                status.report_error(format!("Could not display {}: {}", layer.label(), error));
            }
        }
    }
}

fn despawn_layer(
    commands: &mut Commands,
    roots: &mut Vec<(Entity, ViewportLayer)>,
    layer: ViewportLayer,
) {
    roots.retain(|(entity, root_layer)| {
        if *root_layer == layer {
            commands.entity(*entity).despawn();
            false
        } else {
            true
        }
    });
}

fn spawn_layer(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    layer: ViewportLayer,
    parts: Vec<LayerPart>,
) -> Entity {
    commands
        .spawn((
            layer,
            Name::new(format!("{} layer", layer.label())),
            Transform::default(),
            Visibility::default(),
        ))
        .with_children(|parent| {
            for part in parts {
                parent.spawn((
                    Name::new(part.name),
                    Mesh3d(meshes.add(part.mesh)),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: part.colour,
                        unlit: part.unlit,
                        ..default()
                    })),
                    part.transform,
                ));
            }
        })
        .id()
}
