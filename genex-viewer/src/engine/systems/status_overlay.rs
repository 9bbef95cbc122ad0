use crate::pipeline::controller::PipelineController;
use crate::pipeline::input::{ImagePreview, ImagePreviewState};
use crate::pipeline::status::StatusReporter;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;

const THUMBNAIL_SIZE: u32 = 160;
const IDLE_HINT: &str = "Drop an image onto the window to begin";
const STATUS_COLOUR: Color = Color::srgb(0.1, 0.1, 0.1);
const ERROR_COLOUR: Color = Color::srgb(0.8, 0.1, 0.1);

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct ActionHintText;

#[derive(Component)]
pub struct PreviewThumbnail;

/// Status line, key hints and image thumbnail for desktop builds.
pub struct StatusOverlayPlugin;

impl Plugin for StatusOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_status_overlay).add_systems(
            Update,
            (
                update_status_text,
                update_action_hints,
                update_preview_thumbnail,
            ),
        );
    }
}

pub fn spawn_status_overlay(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(IDLE_HINT),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(STATUS_COLOUR),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                StatusText,
            ));
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(STATUS_COLOUR),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                ActionHintText,
            ));
            parent.spawn((
                ImageNode::default(),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    right: Val::Px(12.0),
                    width: Val::Px(THUMBNAIL_SIZE as f32),
                    ..default()
                },
                Visibility::Hidden,
                PreviewThumbnail,
            ));
        });
}

pub fn update_status_text(
    status: Res<StatusReporter>,
    mut query: Query<(&mut Text, &mut TextColor), With<StatusText>>,
) {
    if !status.is_changed() {
        return;
    }
    for (mut text, mut colour) in &mut query {
        text.0 = if status.message().is_empty() {
            IDLE_HINT.to_string()
        } else {
            status.message().to_string()
        };
        colour.0 = if status.is_error() {
            ERROR_COLOUR
        } else {
            STATUS_COLOUR
        };
    }
}

pub fn update_action_hints(
    controller: Res<PipelineController>,
    mut query: Query<&mut Text, With<ActionHintText>>,
) {
    let hint = action_hint(&controller);
    for mut text in &mut query {
        // Compare first so the text is only marked changed when it differs.
        if text.0 != hint {
            text.0 = hint.clone();
        }
    }
}

fn action_hint(controller: &PipelineController) -> String {
    let actions = controller.actions();
    let keys: Vec<&str> = [
        (actions.generate, "[G] generate"),
        (actions.explore, "[E] explore"),
        (actions.map, "[M] map"),
    ]
    .into_iter()
    .filter_map(|(enabled, key)| enabled.then_some(key))
    .collect();

    if keys.is_empty() {
        format!("State: {}", controller.state())
    } else {
        format!("State: {} | {}", controller.state(), keys.join("  "))
    }
}

pub fn update_preview_thumbnail(
    preview: Res<ImagePreviewState>,
    mut images: ResMut<Assets<Image>>,
    mut query: Query<(&mut ImageNode, &mut Visibility), With<PreviewThumbnail>>,
) {
    if !preview.is_changed() {
        return;
    }

    let thumbnail = preview.current.as_ref().and_then(thumbnail_image);
    for (mut node, mut visibility) in &mut query {
        match &thumbnail {
            Some(image) => {
                node.image = images.add(image.clone());
                *visibility = Visibility::Inherited;
            }
            None => {
                *visibility = Visibility::Hidden;
            }
        }
    }
}

/// Decode the preview back into a texture no larger than the thumbnail box.
/// `None` for formats the viewer cannot decode.
pub fn thumbnail_image(preview: &ImagePreview) -> Option<Image> {
    preview.dimensions?;
    let (_, encoded) = preview.data_url.split_once(";base64,")?;
    let bytes = STANDARD.decode(encoded).ok()?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| warn!("Could not decode preview {}: {}", preview.name, e))
        .ok()?;

    let fitted = if decoded.width() > THUMBNAIL_SIZE || decoded.height() > THUMBNAIL_SIZE {
        decoded.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    } else {
        decoded
    };

    Some(Image::from_dynamic(
        fitted,
        true,
        RenderAssetUsages::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::{SelectedFile, on_file_selected};
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn preview_of(width: u32, height: u32) -> ImagePreview {
        let image = ImageBuffer::from_pixel(width, height, Rgb([10u8, 120, 200]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        on_file_selected(Some(SelectedFile {
            name: "photo.png".to_string(),
            bytes,
            declared_mime: None,
        }))
        .unwrap()
        .preview
    }

    #[test]
    fn thumbnails_fit_the_overlay_box() {
        let small = thumbnail_image(&preview_of(4, 3)).unwrap();
        assert_eq!((small.width(), small.height()), (4, 3));

        let large = thumbnail_image(&preview_of(640, 320)).unwrap();
        assert_eq!(
            (large.width(), large.height()),
            (THUMBNAIL_SIZE, THUMBNAIL_SIZE / 2)
        );
    }

    #[test]
    fn undecodable_previews_have_no_thumbnail() {
        let preview = ImagePreview {
            name: "scan.raw".to_string(),
            data_url: "data:application/octet-stream;base64,AQIDBA==".to_string(),
            dimensions: None,
        };
        assert!(thumbnail_image(&preview).is_none());
    }

    #[test]
    fn status_text_follows_the_reporter() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<StatusReporter>()
            .init_resource::<PipelineController>()
            .init_resource::<ImagePreviewState>()
            .init_resource::<Assets<Image>>()
            .add_plugins(StatusOverlayPlugin);
        app.update();

        app.world_mut()
            .resource_mut::<StatusReporter>()
            .report_error("server unreachable");
        app.update();

        let (text, colour) = app
            .world_mut()
            .query_filtered::<(&Text, &TextColor), With<StatusText>>()
            .single(app.world())
            .unwrap();
        assert_eq!(text.0, "Error: server unreachable");
        assert_eq!(colour.0, ERROR_COLOUR);

        let hint = app
            .world_mut()
            .query_filtered::<&Text, With<ActionHintText>>()
            .single(app.world())
            .unwrap();
        assert_eq!(hint.0, "State: idle");
    }
}
