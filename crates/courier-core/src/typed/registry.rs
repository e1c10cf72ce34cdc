//! CallbackRegistry - 名前付き callback の登録と管理
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//! - Arc による共有所有権（worker の各タスクから参照される）

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::callback::Callback;
use super::handler::{DynCallback, FnCallback, TypedCallback};
use crate::domain::{CallbackError, CallbackName};

/// CallbackRegistry は worker が受信した callback 名を実体に解決する
///
/// # 使用例
/// ```ignore
/// let mut registry = CallbackRegistry::new();
/// registry.register(FetchJson::new(client))?;
/// registry.register_fn("double", |n: i64| async move { Ok(n * 2) })?;
///
/// let cb = registry.get("fetch_json");
/// ```
///
/// # 設計
/// - 初期化時に構築（mutable）
/// - 実行時は `Arc<CallbackRegistry>` として共有（immutable、ロック不要）
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<CallbackName, Arc<dyn DynCallback>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("callback '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    pub fn register<C: Callback>(&mut self, callback: C) -> Result<(), RegistryError> {
        self.insert(Arc::new(TypedCallback::new(callback)))
    }

    pub fn register_fn<F, Fut, I, O>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, CallbackError>> + Send + 'static,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
    {
        self.insert(Arc::new(FnCallback::new(name, f)))
    }

    fn insert(&mut self, callback: Arc<dyn DynCallback>) -> Result<(), RegistryError> {
        let name = CallbackName::new(callback.name());
        if self.callbacks.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.callbacks.insert(name, callback);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynCallback>> {
        self.callbacks.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.callbacks.keys().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
