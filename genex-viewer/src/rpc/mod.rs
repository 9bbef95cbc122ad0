//! JSON-RPC 2.0 bridge between the viewer and the page hosting it.
//!
//! The viewer runs inside an iframe and talks to its parent over
//! `postMessage`. Requests drive the pipeline; notifications keep the host's
//! controls and status line in sync.
//!
//! ```text
//! Host page (parent)  <──postMessage──>  Viewer (iframe)
//!        │                                     │
//!        ├─ Request (with ID) ───────────────> │
//!        │                                     ├─ PipelineAction
//!        │ <────────────── Response (with ID) ─┤
//!        │                                     │
//!        │ <─────────── Notification (no ID) ─┤
//! ```
//!
//! ## Methods
//!
//! - `select_image { name, mime_type?, data }`: `data` is base64, optionally
//!   as a data URL.
//! - `generate`, `explore { goal? }`, `map`: acknowledged with
//!   `{ "accepted": true }`; the outcome arrives as notifications.
//! - `get_pipeline_state`: current state, enabled actions, held artifacts and
//!   the status line.
//!
//! ## Notifications
//!
//! - `status_update { message, is_error }`
//! - `pipeline_state_changed { state, actions }`
//! - `image_preview { name, data_url, width?, height? }`
//!
//! Errors use the standard codes `-32601` (method not found) and `-32602`
//! (invalid params).

/// JSON-RPC 2.0 message types, request handling and host notifications.
pub mod web_rpc;
