use bevy::prelude::*;

/// Scene background, `#f0f0f0`.
pub const CLEAR_COLOUR: Color = Color::srgb(0.941, 0.941, 0.941);

pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
/// Distance of the camera from the orbit focus on startup.
pub const CAMERA_START_DISTANCE: f32 = 5.0;
pub const CAMERA_MIN_DISTANCE: f32 = 0.5;
pub const CAMERA_MAX_DISTANCE: f32 = 500.0;

/// Fraction of the remaining distance covered per 60Hz frame when easing towards the target view.
pub const ORBIT_DAMPING_FACTOR: f32 = 0.05;
pub const ORBIT_ROTATE_SENSITIVITY: f32 = 0.005;
pub const ORBIT_PAN_SENSITIVITY: f32 = 0.002;
pub const ORBIT_ZOOM_SENSITIVITY: f32 = 0.1;

pub const AMBIENT_BRIGHTNESS: f32 = 500.0;
pub const DIRECTIONAL_ILLUMINANCE: f32 = 5_000.0;

pub const ENVIRONMENT_GROUND_SIZE: f32 = 10.0;
pub const ENVIRONMENT_GROUND_COLOUR: Color = Color::srgb(0.78, 0.78, 0.76);
pub const ENVIRONMENT_ANCHOR_SIZE: f32 = 0.5;

pub const TRAJECTORY_COLOUR: Color = Color::srgb(0.9, 0.35, 0.1);
pub const TRAJECTORY_MARKER_RADIUS: f32 = 0.08;

pub const MAP_POINT_COLOUR: Color = Color::srgb(0.15, 0.4, 0.85);
pub const MAP_PATH_COLOUR: Color = Color::srgb(0.1, 0.7, 0.3);
