use bevy::prelude::*;
use bevy::window::WindowResized;

/// Keep the camera aspect ratio in step with the render container.
pub fn resize_viewport(
    mut resized: EventReader<WindowResized>,
    mut projections: Query<&mut Projection, With<Camera3d>>,
) {
    let Some(latest) = resized.read().last() else {
        return;
    };

    // A collapsed container reports zero height; keep the last good aspect.
    if latest.width <= 0.0 || latest.height <= 0.0 {
        return;
    }

    let aspect_ratio = latest.width / latest.height;
    for mut projection in &mut projections {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = aspect_ratio;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resize_app() -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<WindowResized>()
            .add_systems(Update, resize_viewport);
        let camera = app
            .world_mut()
            .spawn((
                Camera3d::default(),
                Projection::Perspective(PerspectiveProjection::default()),
            ))
            .id();
        (app, camera)
    }

    fn resize(app: &mut App, width: f32, height: f32) {
        app.world_mut().send_event(WindowResized {
            window: Entity::PLACEHOLDER,
            width,
            height,
        });
        app.update();
    }

    fn aspect(app: &App, camera: Entity) -> f32 {
        match app.world().get::<Projection>(camera) {
            Some(Projection::Perspective(perspective)) => perspective.aspect_ratio,
            other => panic!("unexpected projection {other:?}"),
        }
    }

    #[test]
    fn aspect_follows_the_latest_size() {
        let (mut app, camera) = resize_app();

        resize(&mut app, 1600.0, 900.0);
        assert!((aspect(&app, camera) - 16.0 / 9.0).abs() < 1e-5);

        app.world_mut().send_event(WindowResized {
            window: Entity::PLACEHOLDER,
            width: 300.0,
            height: 300.0,
        });
        resize(&mut app, 800.0, 400.0);
        assert!((aspect(&app, camera) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn zero_height_keeps_previous_aspect() {
        let (mut app, camera) = resize_app();
        resize(&mut app, 1000.0, 500.0);
        resize(&mut app, 1000.0, 0.0);
        assert!((aspect(&app, camera) - 2.0).abs() < 1e-5);
    }
}
