//! RegistryBuilder - worker に載せる callback 群の構築
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::CallbackError;
use crate::typed::{Callback, CallbackRegistry, RegistryError};

/// RegistryBuilder は CallbackRegistry を構築
///
/// # 使用例
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .register(FetchJson::new(client))?
///     .expect(&["fetch_json"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect() で期待される callback 名を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す（controller が送ってから
///   not_registered で気付くより早い）
pub struct RegistryBuilder {
    registry: CallbackRegistry,
    expected: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing callbacks: {0:?}. These were expected but not registered.")]
    MissingCallbacks(Vec<String>),
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: CallbackRegistry::new(),
            expected: None,
        }
    }

    pub fn register<C: Callback>(mut self, callback: C) -> Result<Self, RegistryError> {
        self.registry.register(callback)?;
        Ok(self)
    }

    pub fn register_fn<F, Fut, I, O>(
        mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<Self, RegistryError>
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, CallbackError>> + Send + 'static,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
    {
        self.registry.register_fn(name, f)?;
        Ok(self)
    }

    pub fn expect(mut self, names: &[&str]) -> Self {
        self.expected = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<CallbackRegistry, BuildError> {
        if let Some(expected) = &self.expected {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| self.registry.get(name).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingCallbacks(missing));
            }
        }
        Ok(self.registry)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_builder() -> RegistryBuilder {
        RegistryBuilder::new()
            .register_fn("noop", |_: serde_json::Value| async move {
                Ok::<_, CallbackError>(())
            })
            .unwrap()
    }

    #[test]
    fn build_success() {
        let registry = noop_builder().expect(&["noop"]).build().unwrap();
        assert_eq!(registry.registered_names(), vec!["noop"]);
    }

    #[test]
    fn build_missing_callbacks() {
        let result = noop_builder().expect(&["noop", "fetch_json"]).build();
        assert!(matches!(
            result,
            Err(BuildError::MissingCallbacks(missing)) if missing == vec!["fetch_json".to_string()]
        ));
    }

    #[test]
    fn build_without_expectations() {
        assert!(noop_builder().build().is_ok());
    }

    #[test]
    fn duplicate_registration_fails_early() {
        let result = noop_builder().register_fn("noop", |v: i64| async move {
            Ok::<_, CallbackError>(v)
        });
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }
}
