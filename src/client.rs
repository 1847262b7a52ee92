//! HTTP client for the publish endpoint.
//!
//! The CLI uses this in `--server` mode so edits go through the same
//! validation and write path as the browser editor.

use crate::server::{ErrorResponse, HealthResponse};
use crate::store::PublishReceipt;
use crate::types::MenuTree;
use crate::validate::{self, Violation};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("menu rejected: {}", validate::summarize(.0))]
    Rejected(Vec<Violation>),
    #[error("no menu published yet")]
    NotFound,
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

pub struct MenuClient {
    client: Client,
    base_url: String,
}

impl MenuClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn fetch(&self) -> Result<MenuTree, ClientError> {
        let url = self.url("/api/menu");
        debug!(%url, "fetching menu");
        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(error_from(response).await)
    }

    pub async fn publish(&self, tree: &MenuTree) -> Result<PublishReceipt, ClientError> {
        let url = self.url("/api/menu");
        debug!(%url, items = tree.item_count(), "publishing menu");
        let response = self.client.post(url).json(tree).send().await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(error_from(response).await)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn error_from(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed: Option<ErrorResponse> = serde_json::from_str(&body).ok();
    match (status, parsed) {
        (StatusCode::BAD_REQUEST, Some(err)) if !err.violations.is_empty() => {
            ClientError::Rejected(err.violations)
        }
        (StatusCode::NOT_FOUND, _) => ClientError::NotFound,
        (_, Some(err)) => ClientError::Server {
            status: status.as_u16(),
            message: err.message,
        },
        (_, None) => ClientError::Server {
            status: status.as_u16(),
            message: body,
        },
    }
}
