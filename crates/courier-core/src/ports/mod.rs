//! Ports - 抽象化レイヤー
//!
//! 差し替え可能なコンポーネントの trait を定義します。

pub mod id_generator;

pub use self::id_generator::{IdGenerator, SequentialIdGenerator};
