use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use constants::viewport::{
    CAMERA_MAX_DISTANCE, CAMERA_MIN_DISTANCE, CAMERA_START_DISTANCE, ORBIT_DAMPING_FACTOR,
    ORBIT_PAN_SENSITIVITY, ORBIT_ROTATE_SENSITIVITY, ORBIT_ZOOM_SENSITIVITY,
};

const PITCH_LIMIT: f32 = 1.55;

/// Orbit state. Input moves the targets; the applied view eases towards them.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    target_focus: Vec3,
    target_distance: f32,
    target_yaw: f32,
    target_pitch: f32,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, CAMERA_START_DISTANCE)
    }
}

impl ViewportCamera {
    /// Camera looking at `focus_point` from straight down +Z.
    pub fn new(focus_point: Vec3, distance: f32) -> Self {
        Self {
            focus_point,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            target_focus: focus_point,
            target_distance: distance,
            target_yaw: 0.0,
            target_pitch: 0.0,
        }
    }

    pub fn orbit(&mut self, mouse_delta: Vec2) {
        self.target_yaw -= mouse_delta.x * ORBIT_ROTATE_SENSITIVITY;
        self.target_pitch = (self.target_pitch - mouse_delta.y * ORBIT_ROTATE_SENSITIVITY)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Slide the focus point in the view plane, scaled by distance so panning
    /// feels the same at any zoom.
    pub fn pan(&mut self, mouse_delta: Vec2) {
        let rotation = self.target_rotation();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let scale = self.target_distance * ORBIT_PAN_SENSITIVITY;
        self.target_focus += (-right * mouse_delta.x + up * mouse_delta.y) * scale;
    }

    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * ORBIT_ZOOM_SENSITIVITY).max(0.1);
        self.target_distance =
            (self.target_distance * factor).clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE);
    }

    /// Advance the damped view by `delta_secs` and return the resulting camera transform.
    pub fn step(&mut self, delta_secs: f32) -> Transform {
        // Damping factor is specified per 60Hz frame.
        let t = 1.0 - (1.0 - ORBIT_DAMPING_FACTOR).powf(delta_secs * 60.0);
        self.focus_point = self.focus_point.lerp(self.target_focus, t);
        self.distance += (self.target_distance - self.distance) * t;
        self.yaw += (self.target_yaw - self.yaw) * t;
        self.pitch += (self.target_pitch - self.pitch) * t;
        self.transform()
    }

    /// Transform for the currently applied view.
    pub fn transform(&self) -> Transform {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);
        let eye = self.focus_point + rotation * Vec3::Z * self.distance;
        Transform::from_translation(eye).looking_at(self.focus_point, Vec3::Y)
    }

    fn target_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.target_yaw, self.target_pitch, 0.0)
    }
}

pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    mut viewport_camera: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    time: Res<Time>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    if mouse_delta != Vec2::ZERO {
        if mouse_button.pressed(MouseButton::Left) {
            viewport_camera.orbit(mouse_delta);
        } else if mouse_button.any_pressed([MouseButton::Right, MouseButton::Middle]) {
            viewport_camera.pan(mouse_delta);
        }
    }

    // Pixel scroll from touchpads arrives in much larger steps than line scroll.
    let scroll: f32 = scroll_events
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.05,
        })
        .sum();
    if scroll.abs() > f32::EPSILON {
        viewport_camera.zoom(scroll);
    }

    let view = viewport_camera.step(time.delta_secs());
    if let Ok(mut camera_transform) = camera_query.single_mut() {
        *camera_transform = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sits_on_positive_z() {
        let transform = ViewportCamera::default().transform();
        assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, 0.0, CAMERA_START_DISTANCE), 1e-5));
    }

    #[test]
    fn input_eases_towards_targets() {
        let mut camera = ViewportCamera::default();
        camera.orbit(Vec2::new(-100.0, 0.0));

        camera.step(1.0 / 60.0);
        let after_one_frame = camera.yaw;
        assert!(after_one_frame > 0.0 && after_one_frame < 0.5);

        for _ in 0..600 {
            camera.step(1.0 / 60.0);
        }
        assert!((camera.yaw - 0.5).abs() < 1e-3);
    }

    #[test]
    fn pitch_and_distance_are_clamped() {
        let mut camera = ViewportCamera::default();
        camera.orbit(Vec2::new(0.0, 100_000.0));
        camera.zoom(1_000.0);
        camera.step(100.0);

        assert!(camera.pitch >= -PITCH_LIMIT);
        assert!(camera.distance >= CAMERA_MIN_DISTANCE);
    }

    #[test]
    fn panning_moves_the_focus_not_the_angle() {
        let mut camera = ViewportCamera::default();
        camera.pan(Vec2::new(10.0, 0.0));
        camera.step(100.0);

        assert!(camera.focus_point.x < 0.0);
        assert_eq!(camera.yaw, 0.0);
    }
}
