//! Request and response types carried through the dispatch pipeline.
//!
//! The physical transport that delivers a request to the router is an
//! external collaborator; its whole contract is `send(channel, args) ->
//! response`, which is exactly [`Router::dispatch`](crate::Router::dispatch).
//! Both types are serde-serializable so a transport can move them across a
//! process boundary without the kernel knowing how.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound command: a channel name plus an ordered argument list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique string identifying the routed command
    pub channel: String,
    /// Positional arguments, unknown to the kernel
    pub args: Vec<Value>,
}

impl Request {
    /// Creates a request for the given channel and arguments.
    pub fn new(channel: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            channel: channel.into(),
            args,
        }
    }

    /// Returns the argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// The structured result of a dispatch.
///
/// Every command produces one of these: a success carrying optional data,
/// or a normalized failure carrying an error message. Handler errors never
/// cross the dispatch boundary as anything else.
///
/// # Examples
///
/// ```rust
/// use launchkit::Response;
/// use serde_json::json;
///
/// let ok = Response::ok(json!({"plugins": []}));
/// assert!(ok.success);
///
/// let failed = Response::failure("plugin not installed");
/// assert!(!failed.success);
/// assert_eq!(failed.error.as_deref(), Some("plugin not installed"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Whether the command succeeded
    pub success: bool,
    /// Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Optional out-of-band details (timings, pagination, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Response {
    /// Successful response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: None,
        }
    }

    /// Successful response with no payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            metadata: None,
        }
    }

    /// Failure response carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Attaches a metadata entry, creating the map on first use.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}
