use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, error, info, warn};

use super::LinkStore;
use crate::config::{LinkStoreConfig, RequestConfig};
use crate::error::{LinkStoreError, LinkStoreResult};
use crate::model::Link;

/// HTTP client for a remote link store service.
///
/// Fetch lookups are idempotent and retried with exponential backoff up to
/// the configured maximum. Mutations go out exactly once: a retried create
/// could double-write, and failed mutations are surfaced to the caller for
/// explicit retry.
#[derive(Clone)]
pub struct HttpLinkStore {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
}

impl HttpLinkStore {
    /// Create a new link store client
    pub fn new(config: &LinkStoreConfig, request_config: RequestConfig) -> LinkStoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LinkStoreError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch links by one direction column, retrying on failure.
    async fn fetch_links(&self, column: &str, ids: &[String]) -> LinkStoreResult<Vec<Link>> {
        let url = format!(
            "{}/v1/links/{}?ids={}",
            self.base_url,
            column,
            ids.join(",")
        );

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    column,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying link fetch"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute::<Vec<Link>>(Method::GET, &url, None).await {
                Ok(links) => {
                    debug!(
                        column,
                        links = links.len(),
                        latency_ms = start.elapsed().as_millis(),
                        "Link fetch succeeded"
                    );
                    return Ok(links);
                }
                Err(e) => {
                    error!(
                        column,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Link fetch failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(LinkStoreError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request and parse the JSON response (internal)
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> LinkStoreResult<T> {
        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LinkStoreError::Timeout {
                    timeout_ms: self.request_config.timeout_ms,
                }
            } else {
                LinkStoreError::Http(e)
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LinkStoreError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LinkStoreError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Map a 404 on a link-addressed endpoint to [`LinkStoreError::LinkNotFound`].
    fn map_missing(error: LinkStoreError, link_id: &str) -> LinkStoreError {
        match error {
            LinkStoreError::Api { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                LinkStoreError::LinkNotFound {
                    link_id: link_id.to_string(),
                }
            }
            other => other,
        }
    }
}

#[async_trait]
impl LinkStore for HttpLinkStore {
    async fn links_from_sources(&self, ids: &[String]) -> LinkStoreResult<Vec<Link>> {
        self.fetch_links("by-source", ids).await
    }

    async fn links_to_targets(&self, ids: &[String]) -> LinkStoreResult<Vec<Link>> {
        self.fetch_links("by-target", ids).await
    }

    async fn create_link(&self, link: &Link) -> LinkStoreResult<Link> {
        let url = format!("{}/v1/links", self.base_url);
        let created: Link = self
            .execute(Method::POST, &url, Some(serde_json::to_value(link)?))
            .await?;
        info!(link_id = %created.id, "Link persisted");
        Ok(created)
    }

    async fn create_links(&self, links: &[Link]) -> LinkStoreResult<Vec<Link>> {
        let url = format!("{}/v1/links/batch", self.base_url);
        let created: Vec<Link> = self
            .execute(Method::POST, &url, Some(serde_json::to_value(links)?))
            .await?;
        info!(count = created.len(), "Link batch persisted");
        Ok(created)
    }

    async fn update_weight(&self, link_id: &str, weight: f64) -> LinkStoreResult<Link> {
        let url = format!("{}/v1/links/{}/weight", self.base_url, link_id);
        let body = serde_json::json!({ "weight": weight });
        self.execute(Method::PATCH, &url, Some(body))
            .await
            .map_err(|e| Self::map_missing(e, link_id))
    }

    async fn delete_link(&self, link_id: &str) -> LinkStoreResult<()> {
        let url = format!("{}/v1/links/{}", self.base_url, link_id);

        // DELETE responses carry no body worth parsing.
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LinkStoreError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    LinkStoreError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::map_missing(
                LinkStoreError::Api {
                    status: status.as_u16(),
                    message: error_body,
                },
                link_id,
            ));
        }

        info!(link_id, "Link removed from store");
        Ok(())
    }
}
