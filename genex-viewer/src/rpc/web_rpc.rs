use crate::pipeline::PipelineSet;
use crate::pipeline::controller::PipelineController;
use crate::pipeline::dispatch::PipelineAction;
use crate::pipeline::input::{ImagePreview, ImagePreviewState, SelectedFile};
use crate::pipeline::state::{ActionSet, PipelineState};
use crate::pipeline::status::StatusReporter;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// What a host request asks the viewer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    Action(PipelineAction),
    GetPipelineState,
}

/// Resource queueing messages for the host page until the end of the frame.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin connecting the pipeline to a host page over `postMessage`.
///
/// Incoming requests are turned into [`PipelineAction`]s before the pipeline
/// runs; status, state and preview changes are pushed back after it.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_event::<PipelineAction>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .before(PipelineSet),
            )
            .add_systems(
                Update,
                (
                    notify_status,
                    notify_pipeline_state,
                    notify_image_preview,
                    send_outgoing_messages,
                )
                    .chain()
                    .after(PipelineSet),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("Window object not available, host messages disabled");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    {
        error!("Failed to register message listener: {:?}", e);
        return;
    }

    // Ownership moves to JS; the listener lives as long as the page.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Queue shared with the `message` listener.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Raw JSON text received from the host page.
#[derive(Event, Debug, Clone)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    controller: Res<PipelineController>,
    status: Res<StatusReporter>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut actions: EventWriter<PipelineAction>,
) {
    for event in events.read() {
        let request = match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => request,
            Err(parse_error) => {
                warn!("Ignoring unparseable RPC message: {}", parse_error);
                continue;
            }
        };
        debug!("RPC request: {}", request.method);

        let (action, response) = handle_rpc_request(&request, &controller, &status);
        if let Some(action) = action {
            actions.write(action);
        }
        if let Some(response) = response {
            rpc_interface.queue_response(response);
        }
    }
}

/// Resolve one request into an optional pipeline action and, for requests
/// carrying an id, the response to send back.
///
/// Actions are acknowledged immediately; their outcome arrives through
/// `status_update` and `pipeline_state_changed`. An action the current state
/// does not enable is answered with `accepted: false` but still forwarded,
/// so the precondition failure reaches the status channel.
pub fn handle_rpc_request(
    request: &RpcRequest,
    controller: &PipelineController,
    status: &StatusReporter,
) -> (Option<PipelineAction>, Option<RpcResponse>) {
    let (action, result) = match parse_rpc_call(&request.method, &request.params) {
        Ok(RpcCall::Action(action)) => {
            let ack = action_ack(&action, controller);
            (Some(action), Ok(ack))
        }
        Ok(RpcCall::GetPipelineState) => (None, Ok(pipeline_snapshot(controller, status))),
        Err(error) => {
            warn!("Rejected RPC {}: {}", request.method, error.message);
            (None, Err(error))
        }
    };

    let response = request.id.clone().map(|id| match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    });

    (action, response)
}

/// Map a method name and its params onto a viewer call.
pub fn parse_rpc_call(method: &str, params: &Value) -> Result<RpcCall, RpcError> {
    match method {
        "select_image" => parse_select_image(params).map(RpcCall::Action),
        "generate" => Ok(RpcCall::Action(PipelineAction::Generate)),
        "explore" => parse_explore(params).map(RpcCall::Action),
        "map" => Ok(RpcCall::Action(PipelineAction::Map)),
        "get_pipeline_state" => Ok(RpcCall::GetPipelineState),
        _ => Err(RpcError::method_not_found(method)),
    }
}

fn parse_select_image(params: &Value) -> Result<PipelineAction, RpcError> {
    #[derive(Deserialize)]
    struct SelectImageParams {
        name: String,
        mime_type: Option<String>,
        data: String,
    }

    let parsed = serde_json::from_value::<SelectImageParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'name' and base64 'data' parameters"))?;

    // Hosts may pass a FileReader data URL as-is.
    let encoded = match parsed.data.split_once(";base64,") {
        Some((_, encoded)) if parsed.data.starts_with("data:") => encoded,
        _ => parsed.data.as_str(),
    };
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| RpcError::invalid_params(&format!("Invalid base64 image data: {}", e)))?;

    Ok(PipelineAction::SelectImage(Some(SelectedFile {
        name: parsed.name,
        bytes,
        declared_mime: parsed.mime_type,
    })))
}

fn parse_explore(params: &Value) -> Result<PipelineAction, RpcError> {
    match params {
        Value::Null => Ok(PipelineAction::Explore { goal: None }),
        Value::Object(fields) => Ok(PipelineAction::Explore {
            goal: fields.get("goal").filter(|goal| !goal.is_null()).cloned(),
        }),
        _ => Err(RpcError::invalid_params("Expected an object with optional 'goal'")),
    }
}

fn action_ack(action: &PipelineAction, controller: &PipelineController) -> Value {
    match action.stage() {
        Some(stage) if !controller.actions().allows(stage) => json!({
            "accepted": false,
            "state": controller.state().label(),
        }),
        _ => json!({ "accepted": true }),
    }
}

fn pipeline_snapshot(controller: &PipelineController, status: &StatusReporter) -> Value {
    json!({
        "state": controller.state().label(),
        "actions": controller.actions(),
        "environment_id": controller.environment().map(|environment| environment.id.as_str()),
        "has_map": controller.map().is_some(),
        "in_flight": controller.in_flight().map(|ticket| ticket.stage),
        "status": status_params(status),
    })
}

fn status_params(status: &StatusReporter) -> Value {
    json!({
        "message": status.message(),
        "is_error": status.is_error(),
    })
}

pub fn state_params(state: PipelineState, actions: ActionSet) -> Value {
    json!({
        "state": state.label(),
        "actions": actions,
    })
}

pub fn preview_params(preview: &ImagePreview) -> Value {
    let mut params = json!({
        "name": preview.name,
        "data_url": preview.data_url,
    });
    if let (Some((width, height)), Some(fields)) = (preview.dimensions, params.as_object_mut()) {
        fields.insert("width".to_string(), json!(width));
        fields.insert("height".to_string(), json!(height));
    }
    params
}

fn notify_status(status: Res<StatusReporter>, mut rpc_interface: ResMut<WebRpcInterface>) {
    if status.is_changed() && !status.message().is_empty() {
        rpc_interface.send_notification("status_update", status_params(&status));
    }
}

fn notify_pipeline_state(
    controller: Res<PipelineController>,
    mut last_sent: Local<Option<(PipelineState, ActionSet)>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let current = (controller.state(), controller.actions());
    if *last_sent != Some(current) {
        let (state, actions) = current;
        rpc_interface.send_notification("pipeline_state_changed", state_params(state, actions));
        *last_sent = Some(current);
    }
}

fn notify_image_preview(
    preview: Res<ImagePreviewState>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !preview.is_changed() {
        return;
    }
    if let Some(current) = &preview.current {
        rpc_interface.send_notification("image_preview", preview_params(current));
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // Desktop builds have no host page.
        let _ = message;
    }
}

impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: "Method not found".to_string(),
            data: Some(json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelinePlugin;
    use crate::pipeline::artifacts::ImagePayload;

    fn request(method: &str, params: Value, id: Option<Value>) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }

    #[test]
    fn parses_stage_methods() {
        assert_eq!(
            parse_rpc_call("generate", &Value::Null),
            Ok(RpcCall::Action(PipelineAction::Generate))
        );
        assert_eq!(
            parse_rpc_call("map", &json!({})),
            Ok(RpcCall::Action(PipelineAction::Map))
        );
        assert_eq!(
            parse_rpc_call("explore", &Value::Null),
            Ok(RpcCall::Action(PipelineAction::Explore { goal: None }))
        );
        assert_eq!(
            parse_rpc_call("explore", &json!({"goal": {"target": [1, 0, 2]}})),
            Ok(RpcCall::Action(PipelineAction::Explore {
                goal: Some(json!({"target": [1, 0, 2]}))
            }))
        );
        assert_eq!(
            parse_rpc_call("get_pipeline_state", &Value::Null),
            Ok(RpcCall::GetPipelineState)
        );
    }

    #[test]
    fn explore_rejects_non_object_params() {
        let error = parse_rpc_call("explore", &json!([1, 2])).unwrap_err();
        assert_eq!(error.code, INVALID_PARAMS);
    }

    #[test]
    fn unknown_methods_are_not_found() {
        let error = parse_rpc_call("tool_selection", &Value::Null).unwrap_err();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.data, Some(json!({"method": "tool_selection"})));
    }

    #[test]
    fn select_image_decodes_plain_base64_and_data_urls() {
        let plain = parse_rpc_call(
            "select_image",
            &json!({"name": "photo.png", "mime_type": "image/png", "data": "aGVsbG8="}),
        );
        assert_eq!(
            plain,
            Ok(RpcCall::Action(PipelineAction::SelectImage(Some(SelectedFile {
                name: "photo.png".to_string(),
                bytes: b"hello".to_vec(),
                declared_mime: Some("image/png".to_string()),
            }))))
        );

        let data_url = parse_rpc_call(
            "select_image",
            &json!({"name": "photo.png", "data": "data:image/png;base64,aGVsbG8="}),
        );
        match data_url {
            Ok(RpcCall::Action(PipelineAction::SelectImage(Some(file)))) => {
                assert_eq!(file.bytes, b"hello".to_vec());
                assert_eq!(file.declared_mime, None);
            }
            other => panic!("unexpected parse {other:?}"),
        }
    }

    #[test]
    fn select_image_rejects_bad_params() {
        let missing = parse_rpc_call("select_image", &json!({"name": "photo.png"})).unwrap_err();
        assert_eq!(missing.code, INVALID_PARAMS);

        let garbage = parse_rpc_call(
            "select_image",
            &json!({"name": "photo.png", "data": "not base64!"}),
        )
        .unwrap_err();
        assert_eq!(garbage.code, INVALID_PARAMS);
    }

    #[test]
    fn requests_without_id_act_but_get_no_response() {
        let controller = PipelineController::default();
        let status = StatusReporter::default();

        let (action, response) =
            handle_rpc_request(&request("generate", Value::Null, None), &controller, &status);
        assert_eq!(action, Some(PipelineAction::Generate));
        assert!(response.is_none());

        let (action, response) = handle_rpc_request(
            &request("bogus", Value::Null, Some(json!(7))),
            &controller,
            &status,
        );
        assert!(action.is_none());
        let response = response.unwrap();
        assert_eq!(response.id, Some(json!(7)));
        assert_eq!(response.error.map(|e| e.code), Some(METHOD_NOT_FOUND));
    }

    #[test]
    fn disabled_actions_are_answered_unaccepted_but_still_forwarded() {
        let controller = PipelineController::default();
        let status = StatusReporter::default();

        let (action, response) = handle_rpc_request(
            &request("generate", Value::Null, Some(json!(3))),
            &controller,
            &status,
        );

        assert_eq!(action, Some(PipelineAction::Generate));
        assert_eq!(
            response.and_then(|r| r.result),
            Some(json!({"accepted": false, "state": "idle"}))
        );
    }

    #[test]
    fn enabled_actions_are_accepted() {
        let mut controller = PipelineController::default();
        let mut status = StatusReporter::default();
        let photo = ImagePayload {
            name: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: b"hello".to_vec(),
        };
        controller.select_image(photo, &mut status).unwrap();

        let (_, generate) = handle_rpc_request(
            &request("generate", Value::Null, Some(json!(4))),
            &controller,
            &status,
        );
        assert_eq!(
            generate.and_then(|r| r.result),
            Some(json!({"accepted": true}))
        );

        let (_, map) = handle_rpc_request(
            &request("map", Value::Null, Some(json!(5))),
            &controller,
            &status,
        );
        assert_eq!(
            map.and_then(|r| r.result),
            Some(json!({"accepted": false, "state": "image_selected"}))
        );
    }

    #[test]
    fn unaccepted_actions_still_report_their_failure() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, PipelinePlugin, WebRpcPlugin));

        let message = json!({"jsonrpc": "2.0", "method": "explore", "id": 2});
        app.world_mut().send_event(IncomingRpcMessage {
            content: message.to_string(),
        });
        app.update();

        assert_eq!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::Idle
        );
        assert!(app.world().resource::<StatusReporter>().is_error());
    }

    #[test]
    fn pipeline_state_snapshot_lists_enabled_actions() {
        let controller = PipelineController::default();
        let mut status = StatusReporter::default();
        status.report("ready");

        let (_, response) = handle_rpc_request(
            &request("get_pipeline_state", Value::Null, Some(json!(1))),
            &controller,
            &status,
        );
        assert_eq!(
            response.and_then(|r| r.result),
            Some(json!({
                "state": "idle",
                "actions": {"generate": false, "explore": false, "map": false},
                "environment_id": null,
                "has_map": false,
                "in_flight": null,
                "status": {"message": "ready", "is_error": false},
            }))
        );
    }

    #[test]
    fn preview_params_include_dimensions_when_known() {
        let preview = ImagePreview {
            name: "photo.png".to_string(),
            data_url: "data:image/png;base64,AAAA".to_string(),
            dimensions: Some((4, 3)),
        };
        assert_eq!(
            preview_params(&preview),
            json!({
                "name": "photo.png",
                "data_url": "data:image/png;base64,AAAA",
                "width": 4,
                "height": 3,
            })
        );

        let unknown = ImagePreview {
            dimensions: None,
            ..preview
        };
        assert!(preview_params(&unknown).get("width").is_none());
    }

    #[test]
    fn incoming_select_image_reaches_the_controller() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, PipelinePlugin, WebRpcPlugin));

        let message = json!({
            "jsonrpc": "2.0",
            "method": "select_image",
            "params": {"name": "photo.png", "mime_type": "image/png", "data": "aGVsbG8="},
            "id": 1,
        });
        app.world_mut().send_event(IncomingRpcMessage {
            content: message.to_string(),
        });
        app.update();

        assert_eq!(
            app.world().resource::<PipelineController>().state(),
            PipelineState::ImageSelected
        );
        assert_eq!(
            app.world().resource::<StatusReporter>().message(),
            "Image selected: photo.png"
        );
    }
}
