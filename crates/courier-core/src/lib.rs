//! courier-core
//!
//! Dispatch callbacks to an isolated worker and correlate the results by id.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, callback name, message, errors）
//! - **ports**: 抽象化レイヤー（IdGenerator）
//! - **typed**: 型付き Callback API（Callback trait, DynCallback, CallbackRegistry, codec）
//! - **app**: channel, Worker, Controller, RegistryBuilder
//! - **callbacks**: 組み込み callback（FetchJson）
//! - **config**: 環境変数からの設定
//! - **observability**: worker のカウンタ

pub mod app;
pub mod callbacks;
pub mod config;
pub mod domain;
pub mod observability;
pub mod ports;
pub mod typed;

pub use app::{CallError, Controller, PendingCall, RegistryBuilder, Worker, WorkerHandle, channel};
pub use config::{ConfigError, CourierConfig};
pub use domain::{
    CallbackError, CallbackId, CallbackMessage, CallbackName, CallbackObject, ErrorKind, Message,
    Response, ResultErrorMessage, ResultMessage,
};
pub use typed::{Callback, CallbackRegistry};
