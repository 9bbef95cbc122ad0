use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;

use crate::engine::core::config::ViewerConfig;
use crate::engine::core::window_config::create_window_config;
use crate::engine::viewport::ViewportPlugin;
use crate::pipeline::PipelinePlugin;
use crate::pipeline::client::{HttpStageClient, StageClientHandle};
use crate::pipeline::status::StatusReporter;
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::status_overlay::StatusOverlayPlugin;
#[cfg(not(target_arch = "wasm32"))]
use crate::pipeline::bindings::NativeInputPlugin;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(ViewportPlugin)
        .add_plugins(PipelinePlugin)
        .add_plugins(WebRpcPlugin);

    // Logging is live once the default plugins are in.
    let config = ViewerConfig::load();
    info!(
        "Stage server {} (timeout {:?})",
        config.server_url, config.request_timeout
    );

    // Without a client every stage fails cleanly; the viewer still opens.
    match HttpStageClient::new(&config) {
        Ok(client) => {
            app.insert_resource(StageClientHandle::new(client));
        }
        Err(e) => {
            error!("Failed to create stage client: {}", e);
            app.world_mut()
                .resource_mut::<StatusReporter>()
                .report_error(&e);
        }
    }

    app.insert_resource(config);

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_plugins(NativeInputPlugin)
            .add_plugins(StatusOverlayPlugin)
            .add_systems(Startup, spawn_overlay_camera);
    }

    app
}

/// UI camera drawn over the viewport so the overlay is not lit or orbited.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_overlay_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        IsDefaultUiCamera,
    ));
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
