use super::PipelineSet;
use super::controller::PipelineController;
use super::dispatch::PipelineAction;
use super::input::read_selected_file;
use super::state::Stage;
use super::status::StatusReporter;
use crate::engine::core::config::ViewerConfig;
use bevy::prelude::*;
use std::path::Path;

/// Keyboard, drag-and-drop and startup-image bindings for desktop builds.
/// The browser build drives the pipeline over RPC instead.
pub struct NativeInputPlugin;

impl Plugin for NativeInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, queue_startup_image)
            .add_systems(
                Update,
                (keyboard_actions, dropped_file_actions).before(PipelineSet),
            );
    }
}

/// G/E/M act like the host page's buttons: disabled stages ignore the key.
fn keyboard_actions(
    keys: Res<ButtonInput<KeyCode>>,
    controller: Res<PipelineController>,
    mut actions: EventWriter<PipelineAction>,
) {
    let enabled = controller.actions();
    let bindings = [
        (KeyCode::KeyG, Stage::Generate, PipelineAction::Generate),
        (KeyCode::KeyE, Stage::Explore, PipelineAction::Explore { goal: None }),
        (KeyCode::KeyM, Stage::Map, PipelineAction::Map),
    ];

    for (key, stage, action) in bindings {
        if !keys.just_pressed(key) {
            continue;
        }
        if enabled.allows(stage) {
            actions.write(action);
        } else {
            debug!("Ignoring {} key while {}", stage, controller.state());
        }
    }
}

fn dropped_file_actions(
    mut drops: EventReader<FileDragAndDrop>,
    mut actions: EventWriter<PipelineAction>,
    mut status: ResMut<StatusReporter>,
) {
    for drop in drops.read() {
        if let FileDragAndDrop::DroppedFile { path_buf, .. } = drop {
            select_path(path_buf, &mut actions, &mut status);
        }
    }
}

fn queue_startup_image(
    config: Res<ViewerConfig>,
    mut actions: EventWriter<PipelineAction>,
    mut status: ResMut<StatusReporter>,
) {
    if let Some(path) = &config.startup_image {
        info!("Selecting startup image {}", path.display());
        select_path(path, &mut actions, &mut status);
    }
}

fn select_path(
    path: &Path,
    actions: &mut EventWriter<PipelineAction>,
    status: &mut StatusReporter,
) {
    match read_selected_file(path) {
        Ok(file) => {
            actions.write(PipelineAction::SelectImage(Some(file)));
        }
        Err(error) => {
            warn!("Could not select {}: {}", path.display(), error);
            status.report_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelinePlugin;
    use crate::pipeline::artifacts::Environment;
    use crate::pipeline::client::StageClientHandle;
    use crate::pipeline::client::scripted::{ScriptedStageClient, StageCall};
    use crate::pipeline::input::SelectedFile;
    use crate::pipeline::state::PipelineState;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn native_app(config: ViewerConfig) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, PipelinePlugin, NativeInputPlugin))
            .init_resource::<ButtonInput<KeyCode>>()
            .add_event::<FileDragAndDrop>()
            .insert_resource(config);
        app
    }

    #[test]
    fn unreadable_startup_image_is_reported() {
        let mut app = native_app(ViewerConfig {
            startup_image: Some(PathBuf::from("/definitely/not/here.png")),
            ..ViewerConfig::default()
        });
        app.update();

        let status = app.world().resource::<StatusReporter>();
        assert!(status.is_error());
        assert!(status.message().contains("here.png"));
        assert_eq!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::Idle
        );
    }

    #[test]
    fn disabled_stage_keys_are_ignored() {
        let mut app = native_app(ViewerConfig::default());
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyG);
        app.update();

        let status = app.world().resource::<StatusReporter>();
        assert!(!status.is_error());
        assert!(status.message().is_empty());
        assert_eq!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::Idle
        );
    }

    #[test]
    fn generate_key_dispatches_once_an_image_is_selected() {
        let client = Arc::new(
            ScriptedStageClient::default().with_environment(Ok(Environment::new("e1"))),
        );
        let mut app = native_app(ViewerConfig::default());
        app.insert_resource(StageClientHandle::new(client.clone()));

        app.world_mut()
            .send_event(PipelineAction::SelectImage(Some(SelectedFile {
                name: "photo.png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
                declared_mime: Some("image/png".to_string()),
            })));
        app.update();
        assert_eq!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::ImageSelected
        );

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyG);
        app.update();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], StageCall::Generate(_)));
        assert!(matches!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::Generating | PipelineState::Generated
        ));
        assert!(!app.world().resource::<StatusReporter>().is_error());
    }

    #[test]
    fn dropped_files_select_an_image() {
        let path = std::env::temp_dir().join("genex-viewer-drop-test.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

        let mut app = native_app(ViewerConfig::default());
        app.world_mut().send_event(FileDragAndDrop::DroppedFile {
            window: Entity::PLACEHOLDER,
            path_buf: path.clone(),
        });
        app.update();
        app.update();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::ImageSelected
        );
        assert_eq!(
            app.world().resource::<StatusReporter>().message(),
            "Image selected: genex-viewer-drop-test.png"
        );
    }
}
