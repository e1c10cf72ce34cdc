//! DynCallback - type-erased callbacks stored in the registry
//!
//! # 学習ポイント
//! - Object-safe trait (DynCallback)
//! - Type erasure パターン (TypedCallback<C> → DynCallback)
//! - クロージャを callback として登録する (FnCallback)

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::callback::Callback;
use super::codec;
use crate::domain::CallbackError;

/// DynCallback は object-safe な Callback の抽象化
///
/// `HashMap<CallbackName, Arc<dyn DynCallback>>` に格納するため、
/// 入出力は `serde_json::Value` に固定しています。
#[async_trait]
pub trait DynCallback: Send + Sync {
    async fn call_dyn(&self, input: Value) -> Result<Value, CallbackError>;
    fn name(&self) -> &str;
}

pub struct TypedCallback<C: Callback> {
    callback: C,
}

impl<C: Callback> TypedCallback<C> {
    pub fn new(callback: C) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<C: Callback> DynCallback for TypedCallback<C> {
    async fn call_dyn(&self, input: Value) -> Result<Value, CallbackError> {
        let input: C::Input = codec::decode_payload(input)
            .map_err(|e| CallbackError::invalid_input(e.to_string()))?;
        let output = self.callback.call(input).await?;
        codec::encode_payload(&output).map_err(|e| CallbackError::invalid_output(e.to_string()))
    }

    fn name(&self) -> &str {
        C::NAME
    }
}

/// A plain async function registered under a runtime name.
pub struct FnCallback<F, I, O> {
    name: String,
    f: F,
    _marker: PhantomData<fn(I) -> O>,
}

impl<F, Fut, I, O> FnCallback<F, I, O>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<O, CallbackError>>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, I, O> DynCallback for FnCallback<F, I, O>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, CallbackError>> + Send + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    async fn call_dyn(&self, input: Value) -> Result<Value, CallbackError> {
        let input: I = codec::decode_payload(input)
            .map_err(|e| CallbackError::invalid_input(e.to_string()))?;
        let output = (self.f)(input).await?;
        codec::encode_payload(&output).map_err(|e| CallbackError::invalid_output(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Greeting {
        name: String,
    }

    struct Greet;

    #[async_trait]
    impl Callback for Greet {
        const NAME: &'static str = "greet";
        type Input = Greeting;
        type Output = String;

        async fn call(&self, input: Greeting) -> Result<String, CallbackError> {
            if input.name.is_empty() {
                return Err(CallbackError::invocation("empty name"));
            }
            Ok(format!("hello, {}", input.name))
        }
    }

    #[tokio::test]
    async fn typed_callback_decodes_and_encodes() {
        let cb = TypedCallback::new(Greet);
        assert_eq!(cb.name(), "greet");

        let out = cb.call_dyn(json!({ "name": "courier" })).await.unwrap();
        assert_eq!(out, json!("hello, courier"));
    }

    #[tokio::test]
    async fn typed_callback_reports_bad_input() {
        let cb = TypedCallback::new(Greet);
        let err = cb.call_dyn(json!("not an object")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn typed_callback_passes_failure_through() {
        let cb = TypedCallback::new(Greet);
        let err = cb.call_dyn(json!({ "name": "" })).await.unwrap_err();
        assert_eq!(err, CallbackError::invocation("empty name"));
    }

    #[tokio::test]
    async fn fn_callback_wraps_closure() {
        let cb = FnCallback::new("double", |n: i64| async move { Ok::<_, CallbackError>(n * 2) });
        assert_eq!(cb.name(), "double");
        assert_eq!(cb.call_dyn(json!(21)).await.unwrap(), json!(42));
    }
}
