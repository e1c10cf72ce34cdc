//! Domain model (ids, callback names, protocol messages, failure detail).

pub mod callback;
pub mod errors;
pub mod ids;
pub mod message;

pub use callback::CallbackName;
pub use errors::{CallbackError, ErrorKind};
pub use ids::CallbackId;
pub use message::{
    CallbackMessage, CallbackObject, Message, Response, ResultErrorMessage, ResultMessage,
};
