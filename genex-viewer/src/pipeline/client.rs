use super::artifacts::{Environment, ImagePayload, MapArtifact, Trajectory};
use super::errors::{StageFailure, TransportError};
use super::state::Stage;
use crate::engine::core::config::ViewerConfig;
use bevy::prelude::*;
use bevy::tasks::BoxedFuture;
use constants::endpoints::{EXPLORE_PATH, GENERATE_PATH, IMAGE_FIELD, MAP_PATH};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Future resolving to one stage's typed result or failure.
pub type StageFuture<T> = BoxedFuture<'static, Result<T, StageFailure>>;

/// One network operation per pipeline stage.
///
/// Each call issues exactly one request and never retries. Non-success
/// statuses, transport faults and malformed bodies all resolve to a
/// [`StageFailure`].
pub trait StageClient: Send + Sync + 'static {
    fn generate(&self, payload: ImagePayload) -> StageFuture<Environment>;

    fn explore(&self, environment_id: &str, goal: Option<Value>) -> StageFuture<Trajectory>;

    fn map(&self, environment_id: &str, exploration_data: Value) -> StageFuture<MapArtifact>;
}

/// Shared handle to the active stage client.
#[derive(Resource, Clone)]
pub struct StageClientHandle(pub Arc<dyn StageClient>);

impl StageClientHandle {
    pub fn new(client: impl StageClient) -> Self {
        Self(Arc::new(client))
    }
}

#[derive(Debug, Error)]
pub enum ClientInitError {
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ExploreRequest<'a> {
    environment_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    goal: Option<Value>,
}

#[derive(Serialize)]
struct MapRequest<'a> {
    environment_id: &'a str,
    exploration_data: Value,
}

/// HTTP implementation backed by `reqwest`.
///
/// Native builds drive requests on a small tokio runtime owned by the client;
/// the returned future only awaits the join handle, so it can be polled from
/// any executor. Wasm builds use the browser fetch backend directly.
pub struct HttpStageClient {
    base_url: String,
    client: reqwest::Client,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: Arc<tokio::runtime::Runtime>,
}

impl HttpStageClient {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(config: &ViewerConfig) -> Result<Self, ClientInitError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("genex-http")
            .enable_all()
            .build()?;

        Ok(Self {
            base_url: config.server_url.clone(),
            client,
            runtime: Arc::new(runtime),
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(config: &ViewerConfig) -> Result<Self, ClientInitError> {
        Ok(Self {
            base_url: config.server_url.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn send<T>(
        &self,
        stage: Stage,
        request: reqwest::RequestBuilder,
        field: &'static str,
    ) -> StageFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        debug!("Dispatching {} request", stage);
        self.run(stage, async move {
            let response = request
                .send()
                .await
                .map_err(|e| TransportError::Unreachable(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Unreachable(e.to_string()))?;
            decode_response(status, &body, field)
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn run<T, F>(&self, stage: Stage, request: F) -> StageFuture<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let handle = self.runtime.spawn(request);
        Box::pin(async move {
            match handle.await {
                Ok(result) => result.map_err(|error| StageFailure::new(stage, error)),
                Err(join_error) => Err(StageFailure::new(
                    stage,
                    TransportError::Unreachable(join_error.to_string()),
                )),
            }
        })
    }

    #[cfg(target_arch = "wasm32")]
    fn run<T, F>(&self, stage: Stage, request: F) -> StageFuture<T>
    where
        T: 'static,
        F: Future<Output = Result<T, TransportError>> + 'static,
    {
        Box::pin(async move { request.await.map_err(|error| StageFailure::new(stage, error)) })
    }
}

impl StageClient for HttpStageClient {
    fn generate(&self, payload: ImagePayload) -> StageFuture<Environment> {
        let ImagePayload {
            name,
            mime_type,
            bytes,
        } = payload;

        let part = match Part::bytes(bytes.clone())
            .file_name(name.clone())
            .mime_str(&mime_type)
        {
            Ok(part) => part,
            Err(e) => {
                warn!("Sending `{}` without content type `{}`: {}", name, mime_type, e);
                Part::bytes(bytes).file_name(name)
            }
        };

        let request = self
            .client
            .post(self.endpoint(GENERATE_PATH))
            .multipart(Form::new().part(IMAGE_FIELD, part));
        self.send(Stage::Generate, request, "environment")
    }

    fn explore(&self, environment_id: &str, goal: Option<Value>) -> StageFuture<Trajectory> {
        let request = self
            .client
            .post(self.endpoint(EXPLORE_PATH))
            .json(&ExploreRequest {
                environment_id,
                goal,
            });
        self.send(Stage::Explore, request, "trajectory")
    }

    fn map(&self, environment_id: &str, exploration_data: Value) -> StageFuture<MapArtifact> {
        let request = self.client.post(self.endpoint(MAP_PATH)).json(&MapRequest {
            environment_id,
            exploration_data,
        });
        let pending = self.send::<MapArtifact>(Stage::Map, request, "map");
        let environment_id = environment_id.to_string();

        Box::pin(async move {
            let mut map = pending.await?;
            if map.environment_id.is_empty() {
                map.environment_id = environment_id;
            }
            Ok(map)
        })
    }
}

/// Decode a stage response envelope, extracting and typing `field`.
///
/// Any 2xx status is success. Other envelope keys (`status: "success"`) are ignored.
pub fn decode_response<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
    field: &str,
) -> Result<T, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::Status(status));
    }

    let mut envelope: Value = serde_json::from_slice(body)
        .map_err(|e| TransportError::MalformedBody(e.to_string()))?;

    let value = envelope
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| TransportError::MalformedBody(format!("missing `{field}`")))?;

    serde_json::from_value(value)
        .map_err(|e| TransportError::MalformedBody(format!("invalid `{field}`: {e}")))
}
