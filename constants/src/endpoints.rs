pub const GENERATE_PATH: &str = "/generate";
pub const EXPLORE_PATH: &str = "/explore";
pub const MAP_PATH: &str = "/map";

/// Multipart field carrying the uploaded image on `/generate`.
pub const IMAGE_FIELD: &str = "image";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
/// Generation runs heavy models server side, so the default is generous.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const SERVER_URL_VAR: &str = "GENEX_SERVER_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "GENEX_REQUEST_TIMEOUT_SECS";
pub const STARTUP_IMAGE_VAR: &str = "GENEX_IMAGE";
