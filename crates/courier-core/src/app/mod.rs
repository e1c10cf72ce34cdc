//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **channel**: controller と worker を結ぶ双方向チャネル
//! - **Worker**: `CallbackMessage` を受けて callback を実行し、結果を返す
//! - **Controller**: request を送り、`id` で response を待ち合わせる
//! - **RegistryBuilder**: 起動時検証付きの registry 構築

pub mod builder;
pub mod channel;
pub mod controller;
pub mod worker;

pub use self::builder::{BuildError, RegistryBuilder};
pub use self::channel::{ControllerEndpoint, WorkerEndpoint, channel};
pub use self::controller::{CallError, Controller, PendingCall};
pub use self::worker::{Worker, WorkerHandle};
