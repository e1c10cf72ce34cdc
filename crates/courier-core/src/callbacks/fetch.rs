//! `fetch_json`: GET a URL and return its parsed JSON body.
//!
//! Fails when the request cannot be made or the body is not JSON. The status
//! code is not inspected, so an error page with a JSON body still succeeds.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::config::CourierConfig;
use crate::domain::CallbackError;
use crate::typed::Callback;

pub struct FetchJson {
    client: reqwest::Client,
}

impl FetchJson {
    pub fn new(config: &CourierConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, url: &str) -> Result<Value, CallbackError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| CallbackError::invocation(format!("network error: {e}")))?;

        debug!(url, status = %response.status(), "fetched");

        response
            .json::<Value>()
            .await
            .map_err(|e| CallbackError::invocation(format!("invalid json body: {e}")))
    }
}

#[async_trait]
impl Callback for FetchJson {
    const NAME: &'static str = "fetch_json";
    type Input = String;
    type Output = Value;

    async fn call(&self, url: String) -> Result<Value, CallbackError> {
        self.get(&url).await
    }
}
