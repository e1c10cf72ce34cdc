//! Typed - 型付き Callback API
//!
//! callback 名の typo を型で排除し、入出力の型を静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Callback` trait - 型安全
//! - **内部（Dyn）**: `DynCallback` trait - object-safe, type erasure
//!
//! worker は `CallbackRegistry` から名前で `DynCallback` を引き、
//! JSON payload のまま呼び出します。

pub mod callback;
pub mod codec;
pub mod handler;
pub mod registry;

pub use self::callback::Callback;
pub use self::codec::CodecError;
pub use self::handler::{DynCallback, FnCallback, TypedCallback};
pub use self::registry::{CallbackRegistry, RegistryError};
