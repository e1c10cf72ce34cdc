//! Callback trait - 名前付き callback の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const NAME`)
//! - Associated Types (`Input`, `Output`) による入出力の型付け

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::CallbackError;

/// Callback は名前と入出力型を対応付ける
///
/// # 使用例
/// ```ignore
/// struct Upper;
///
/// #[async_trait]
/// impl Callback for Upper {
///     const NAME: &'static str = "upper";
///     type Input = String;
///     type Output = String;
///
///     async fn call(&self, input: String) -> Result<String, CallbackError> {
///         Ok(input.to_uppercase())
///     }
/// }
/// ```
///
/// # Trait Bounds
/// - `Input: DeserializeOwned`: 受信した JSON payload から復元するため
/// - `Output: Serialize`: `ResultMessage` に載せるため
/// - `Send + Sync + 'static`: `Arc<dyn DynCallback>` に格納するため
#[async_trait]
pub trait Callback: Send + Sync + 'static {
    /// Registry key. Requests reference the callback by this name.
    const NAME: &'static str;

    type Input: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    async fn call(&self, input: Self::Input) -> Result<Self::Output, CallbackError>;
}
