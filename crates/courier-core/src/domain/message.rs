//! Protocol messages exchanged between a controller and a worker.
//!
//! Every message carries an `id` and the `callback` it concerns. Requests add
//! the callback input (`message`); responses add either `result` or `error`.
//!
//! On the wire the variants are a tagged union:
//!
//! ```json
//! {"type":"callback","id":1,"callback":"fetch_json","message":"https://..."}
//! {"type":"result","id":1,"callback":"fetch_json","result":{"a":1}}
//! {"type":"result_error","id":1,"callback":"fetch_json","error":{"kind":"invocation","message":"..."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::callback::CallbackName;
use super::errors::CallbackError;
use super::ids::CallbackId;

/// Fields shared by every message shape.
pub trait CallbackObject {
    fn id(&self) -> CallbackId;
    fn callback(&self) -> &CallbackName;
}

/// Controller → Worker: invoke `callback(message)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMessage {
    pub id: CallbackId,
    pub callback: CallbackName,
    pub message: Value,
}

impl CallbackMessage {
    pub fn new(id: CallbackId, callback: impl Into<CallbackName>, message: Value) -> Self {
        Self {
            id,
            callback: callback.into(),
            message,
        }
    }
}

/// Worker → Controller: the invocation succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub id: CallbackId,
    pub callback: CallbackName,
    pub result: Value,
}

impl ResultMessage {
    pub fn new(id: CallbackId, callback: impl Into<CallbackName>, result: Value) -> Self {
        Self {
            id,
            callback: callback.into(),
            result,
        }
    }
}

/// Worker → Controller: the invocation failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultErrorMessage {
    pub id: CallbackId,
    pub callback: CallbackName,
    pub error: CallbackError,
}

impl ResultErrorMessage {
    pub fn new(id: CallbackId, callback: impl Into<CallbackName>, error: CallbackError) -> Self {
        Self {
            id,
            callback: callback.into(),
            error,
        }
    }
}

/// Any message that can travel over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Callback(CallbackMessage),
    Result(ResultMessage),
    ResultError(ResultErrorMessage),
}

impl Message {
    pub fn into_request(self) -> Option<CallbackMessage> {
        match self {
            Self::Callback(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Callback(_) => None,
            Self::Result(msg) => Some(Response::Result(msg)),
            Self::ResultError(msg) => Some(Response::ResultError(msg)),
        }
    }
}

/// The outcome of exactly one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Result(ResultMessage),
    ResultError(ResultErrorMessage),
}

impl Response {
    pub fn success(id: CallbackId, callback: impl Into<CallbackName>, result: Value) -> Self {
        Self::Result(ResultMessage::new(id, callback, result))
    }

    pub fn failure(id: CallbackId, callback: impl Into<CallbackName>, error: CallbackError) -> Self {
        Self::ResultError(ResultErrorMessage::new(id, callback, error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    pub fn into_result(self) -> Result<Value, CallbackError> {
        match self {
            Self::Result(msg) => Ok(msg.result),
            Self::ResultError(msg) => Err(msg.error),
        }
    }
}

impl From<CallbackMessage> for Message {
    fn from(msg: CallbackMessage) -> Self {
        Self::Callback(msg)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        match response {
            Response::Result(msg) => Self::Result(msg),
            Response::ResultError(msg) => Self::ResultError(msg),
        }
    }
}

macro_rules! impl_callback_object {
    ($($ty:ty),*) => {
        $(
            impl CallbackObject for $ty {
                fn id(&self) -> CallbackId {
                    self.id
                }

                fn callback(&self) -> &CallbackName {
                    &self.callback
                }
            }
        )*
    };
}

impl_callback_object!(CallbackMessage, ResultMessage, ResultErrorMessage);

impl CallbackObject for Response {
    fn id(&self) -> CallbackId {
        match self {
            Self::Result(msg) => msg.id,
            Self::ResultError(msg) => msg.id,
        }
    }

    fn callback(&self) -> &CallbackName {
        match self {
            Self::Result(msg) => &msg.callback,
            Self::ResultError(msg) => &msg.callback,
        }
    }
}

impl CallbackObject for Message {
    fn id(&self) -> CallbackId {
        match self {
            Self::Callback(msg) => msg.id,
            Self::Result(msg) => msg.id,
            Self::ResultError(msg) => msg.id,
        }
    }

    fn callback(&self) -> &CallbackName {
        match self {
            Self::Callback(msg) => &msg.callback,
            Self::Result(msg) => &msg.callback,
            Self::ResultError(msg) => &msg.callback,
        }
    }
}
