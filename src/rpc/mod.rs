//! Line-delimited JSON RPC front end.
//!
//! Each request is one JSON object on one line:
//!
//! ```text
//! {"id": 1, "method": "get", "params": {"port": "/dev/ttyUSB0", "pin": 4, "sensor": "dht22", "model": "dht22"}}
//! ```
//!
//! and each response is one line carrying either `reply` (the structured
//! result) or `error` (the call was rejected before reaching the device).
//!
//! Methods may also be addressed through the daemon's object name, e.g.
//! `espcommd.get`.

pub mod stdio;
pub mod tcp;

use crate::protocol::Action;
use crate::service::DeviceService;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Methods exposed by the daemon object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Devices,
    On,
    Off,
    Get,
}

impl FromStr for Method {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devices" => Ok(Self::Devices),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "get" => Ok(Self::Get),
            other => Err(RpcError::MethodNotFound(other.to_string())),
        }
    }
}

/// One incoming call.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// A call rejected before the device was touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown method '{0}'")]
    MethodNotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
}

impl RpcError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::MethodNotFound(_) => "method_not_found",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }
}

/// Error body of a rejected call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// One outgoing response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    fn reply(id: Value, reply: Value) -> Self {
        Self {
            id,
            reply: Some(reply),
            error: None,
        }
    }

    fn error(id: Value, err: &RpcError) -> Self {
        Self {
            id,
            reply: None,
            error: Some(ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

fn string_arg(params: &Map<String, Value>, name: &str) -> Result<String, RpcError> {
    match params.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RpcError::InvalidArgument(format!(
            "argument '{name}' must be a string"
        ))),
        None => Err(RpcError::InvalidArgument(format!(
            "missing required argument '{name}'"
        ))),
    }
}

fn int32_arg(params: &Map<String, Value>, name: &str) -> Result<i32, RpcError> {
    let value = params.get(name).ok_or_else(|| {
        RpcError::InvalidArgument(format!("missing required argument '{name}'"))
    })?;
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| {
            RpcError::InvalidArgument(format!("argument '{name}' must be a 32-bit integer"))
        })
}

/// Build the action for `method` from the call arguments.
pub fn parse_action(method: Method, params: &Map<String, Value>) -> Result<Action, RpcError> {
    let port = string_arg(params, "port")?;
    let pin = int32_arg(params, "pin")?;
    match method {
        Method::On => Ok(Action::pin_on(port, pin)),
        Method::Off => Ok(Action::pin_off(port, pin)),
        Method::Get => {
            let sensor = string_arg(params, "sensor")?;
            let model = string_arg(params, "model")?;
            Action::get_sensor(port, pin, sensor, model)
                .map_err(|e| RpcError::InvalidArgument(e.to_string()))
        }
        Method::Devices => Err(RpcError::InvalidRequest(
            "devices takes no action".to_string(),
        )),
    }
}

/// Object name used when none is configured.
pub const DEFAULT_OBJECT_NAME: &str = "espcommd";

/// Routes calls to the [`DeviceService`], one at a time per process.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    service: DeviceService,
    object_name: String,
    serial: Arc<Mutex<()>>,
}

impl Dispatcher {
    pub fn new(service: DeviceService) -> Self {
        Self::with_object_name(service, DEFAULT_OBJECT_NAME)
    }

    pub fn with_object_name(service: DeviceService, object_name: impl Into<String>) -> Self {
        Self {
            service,
            object_name: object_name.into(),
            serial: Arc::new(Mutex::new(())),
        }
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Resolve a bare (`get`) or qualified (`espcommd.get`) method name.
    /// A qualifier naming another object is not found.
    pub fn resolve(&self, name: &str) -> Result<Method, RpcError> {
        let bare = match name.rsplit_once('.') {
            Some((object, method)) if object == self.object_name => method,
            Some(_) => return Err(RpcError::MethodNotFound(name.to_string())),
            None => name,
        };
        bare.parse::<Method>()
            .map_err(|_| RpcError::MethodNotFound(name.to_string()))
    }

    /// Handle one call. Blocks while another call is in flight.
    pub fn dispatch(&self, request: Request) -> Response {
        let id = request.id;
        let method = match self.resolve(&request.method) {
            Ok(method) => method,
            Err(e) => return Response::error(id, &e),
        };

        let _turn = self.serial.lock();
        debug!(method = %request.method, "dispatching call");
        let reply = match method {
            Method::Devices => serde_json::to_value(self.service.devices()),
            _ => match parse_action(method, &request.params) {
                Ok(action) => serde_json::to_value(self.service.perform(&action)),
                Err(e) => return Response::error(id, &e),
            },
        };

        match reply {
            Ok(reply) => Response::reply(id, reply),
            Err(e) => Response::error(id, &RpcError::InvalidRequest(e.to_string())),
        }
    }

    /// Parse one request line, dispatch it and render the response line
    /// (without the trailing newline).
    pub fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                let id = serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|v| v.get("id").cloned())
                    .unwrap_or(Value::Null);
                Response::error(id, &RpcError::InvalidRequest(e.to_string()))
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            json!({
                "id": Value::Null,
                "error": {"code": "invalid_request", "message": e.to_string()}
            })
            .to_string()
        })
    }
}
