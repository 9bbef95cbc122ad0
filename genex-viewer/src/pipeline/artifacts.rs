use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Raw bytes of a user-selected image plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Server-generated scene derived from one input image.
///
/// Everything besides the id and exploration data is kept verbatim as the
/// scene description; the viewer never interprets more of it than it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploration_data: Option<Value>,
    #[serde(flatten)]
    pub scene_description: Map<String, Value>,
}

impl Environment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exploration_data: None,
            scene_description: Map::new(),
        }
    }
}

/// Ids arrive as strings from most servers, integers from some.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) if !id.is_empty() => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a non-empty string or integer id, got {other}"
        ))),
    }
}

/// One pose/observation sample recorded during exploration.
///
/// Typed fields are read leniently: a missing or malformed value is `None`
/// and the raw value stays in `extra`, so the sample still reaches `/map`
/// exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct TrajectorySample {
    pub position: Option<[f32; 3]>,
    pub orientation: Option<[f32; 4]>,
    pub confidence: Option<f32>,
    /// Observations, imagined states and anything unrecognised.
    pub extra: Map<String, Value>,
    /// Samples that are not JSON objects are kept whole.
    opaque: Option<Value>,
}

impl TrajectorySample {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for TrajectorySample {
    fn from(value: Value) -> Self {
        let Value::Object(mut extra) = value else {
            return Self {
                opaque: Some(value),
                ..Self::default()
            };
        };

        let position = take_parsed(&mut extra, "position", coordinates::<3>);
        let orientation = take_parsed(&mut extra, "orientation", coordinates::<4>);
        let confidence = take_parsed(&mut extra, "confidence", |v| v.as_f64().map(|c| c as f32));

        Self {
            position,
            orientation,
            confidence,
            extra,
            opaque: None,
        }
    }
}

impl From<TrajectorySample> for Value {
    fn from(sample: TrajectorySample) -> Self {
        if let Some(opaque) = sample.opaque {
            return opaque;
        }

        let mut object = sample.extra;
        if let Some(position) = sample.position {
            object.insert("position".to_string(), json!(position));
        }
        if let Some(orientation) = sample.orientation {
            object.insert("orientation".to_string(), json!(orientation));
        }
        if let Some(confidence) = sample.confidence {
            object.insert("confidence".to_string(), json!(confidence));
        }
        Value::Object(object)
    }
}

/// Remove `key` from `object` only when it parses; otherwise leave it in place.
fn take_parsed<T>(
    object: &mut Map<String, Value>,
    key: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let parsed = object.get(key).and_then(parse)?;
    object.remove(key);
    Some(parsed)
}

/// Exactly `N` numbers, e.g. `[x, y, z]`.
fn coordinates<const N: usize>(value: &Value) -> Option<[f32; N]> {
    let items = value.as_array().filter(|items| items.len() == N)?;
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

/// Points of a polyline or cloud; entries that are not `[x, y, z]` are skipped.
fn point_list(value: &Value) -> Vec<[f32; 3]> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(coordinates::<3>).collect())
        .unwrap_or_default()
}

/// Ordered samples produced by one exploration run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    pub samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn new(samples: Vec<TrajectorySample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Positions of the samples that have one, in order.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.samples
            .iter()
            .filter_map(|sample| sample.position)
            .collect()
    }

    /// Exploration data in the shape `/map` expects it back.
    pub fn exploration_data(&self) -> Value {
        Value::Array(self.samples.iter().map(TrajectorySample::to_value).collect())
    }
}

/// Spatial map derived from an environment's exploration data.
///
/// Geometry is kept as the server sent it. [`MapArtifact::points`] and
/// [`MapArtifact::paths`] pull out whatever is drawable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapArtifact {
    /// Filled in by the client from the request; servers do not echo it.
    #[serde(default)]
    pub environment_id: String,
    #[serde(default)]
    pub point_cloud: Value,
    /// A list of polylines or an object of named polylines.
    #[serde(default)]
    pub navigation_paths: Value,
    /// Meshes and semantic annotations.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MapArtifact {
    pub fn points(&self) -> Vec<[f32; 3]> {
        point_list(&self.point_cloud)
    }

    /// Named polylines. List entries are named by index.
    pub fn paths(&self) -> Vec<(String, Vec<[f32; 3]>)> {
        match &self.navigation_paths {
            Value::Array(paths) => paths
                .iter()
                .enumerate()
                .map(|(index, path)| (index.to_string(), point_list(path)))
                .collect(),
            Value::Object(paths) => paths
                .iter()
                .map(|(name, path)| (name.clone(), point_list(path)))
                .collect(),
            _ => Vec::new(),
        }
    }
}
