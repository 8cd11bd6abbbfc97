//! Dataset loaders: deferred producers of a language's translation dataset.
//!
//! Any `Fn() -> impl Future<Output = anyhow::Result<Value>>` closure is a
//! loader. [`JsonFileLoader`] and [`HttpLoader`] cover the common cases of a
//! dataset on disk and a dataset served over HTTP.

use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// A boxed, sendable load in progress.
pub type LoadFuture = BoxFuture<'static, Result<Value>>;

/// Produces a translation dataset on demand.
pub trait DatasetLoader: Send + Sync {
    fn load(&self) -> LoadFuture;
}

impl<F, Fut> DatasetLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn load(&self) -> LoadFuture {
        Box::pin((self)())
    }
}

/// Unwrap a module-style `{"default": {...}}` wrapper.
///
/// Bundled datasets are often exported as a module whose `default` member is
/// the actual dataset; anything else is returned unchanged.
pub fn unwrap_module_default(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("default").is_some_and(Value::is_object) => {
            map.remove("default").unwrap_or_default()
        }
        other => other,
    }
}

/// Reads a JSON dataset from a file.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetLoader for JsonFileLoader {
    fn load(&self) -> LoadFuture {
        let path = self.path.clone();
        Box::pin(async move {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read dataset {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse dataset {}", path.display()))
        })
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("invalid JSON body: {0}")]
    Body(reqwest::Error),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status(status) => *status >= 500 || *status == 429,
            FetchError::Body(_) => false,
        }
    }
}

async fn fetch_once(client: reqwest::Client, url: String) -> Result<Value, FetchError> {
    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    response.json::<Value>().await.map_err(FetchError::Body)
}

/// Fetches a JSON dataset over HTTP, retrying transient failures.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
    url: String,
    retry: RetryConfig,
}

impl HttpLoader {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            retry: RetryConfig::dataset_fetch(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl DatasetLoader for HttpLoader {
    fn load(&self) -> LoadFuture {
        let client = self.client.clone();
        let url = self.url.clone();
        let retry = self.retry.clone();

        Box::pin(async move {
            let operation = format!("Fetch dataset {}", url);
            let value = with_retry_if(
                &retry,
                &operation,
                || fetch_once(client.clone(), url.clone()),
                FetchError::is_retryable,
            )
            .await
            .with_context(|| format!("Failed to fetch dataset from {}", url))?;
            Ok(value)
        })
    }
}
