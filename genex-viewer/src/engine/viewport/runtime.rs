use super::ViewportUpdate;
use super::layers::{ViewportLayers, apply_viewport_updates};
use super::resize::resize_viewport;
use crate::engine::camera::viewport_camera::{ViewportCamera, camera_controller};
use crate::pipeline::status::StatusReporter;
use bevy::prelude::*;
use constants::viewport::{
    AMBIENT_BRIGHTNESS, CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, CLEAR_COLOUR,
    DIRECTIONAL_ILLUMINANCE,
};

pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(CLEAR_COLOUR))
            .insert_resource(AmbientLight {
                brightness: AMBIENT_BRIGHTNESS,
                ..default()
            })
            .init_resource::<ViewportCamera>()
            .init_resource::<ViewportLayers>()
            .init_resource::<StatusReporter>()
            .add_event::<ViewportUpdate>()
            .add_systems(Startup, setup_viewport)
            .add_systems(
                Update,
                (camera_controller, resize_viewport, apply_viewport_updates),
            );
    }
}

fn setup_viewport(mut commands: Commands, viewport_camera: Res<ViewportCamera>) {
    spawn_camera(&mut commands, &viewport_camera);
    spawn_lighting(&mut commands);
    info!("Viewport ready");
}

fn spawn_camera(commands: &mut Commands, viewport_camera: &ViewportCamera) {
    commands.spawn((
        Name::new("viewport camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        viewport_camera.transform(),
    ));
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        Name::new("key light"),
        DirectionalLight {
            illuminance: DIRECTIONAL_ILLUMINANCE,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(0.0, 1.0, 0.0).looking_at(Vec3::ZERO, Vec3::Z),
    ));
}
