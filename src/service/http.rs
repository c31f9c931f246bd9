//! HTTP object-storage client speaking the Swift-style container API.

use crate::config::ServiceConfig;
use crate::error::{ApiError, RackError};
use crate::service::{ContainerInfo, ObjectStorage};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

fn map_http_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(error.to_string())
    } else if error.is_connect() {
        ApiError::RequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::RequestFailed(format!("HTTP error: {}", error))
    }
}

async fn map_status(response: Response, subject: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        format!("{} ({})", subject, status)
    } else {
        format!("{} ({}): {}", subject, status, body.trim())
    };
    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(subject.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(detail),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(detail),
        _ => ApiError::RequestFailed(detail),
    })
}

fn header_u64(headers: &HeaderMap, name: &str) -> Result<u64, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ApiError::InvalidResponse(format!("missing or invalid {} header", name)))
}

/// Object-storage client backed by `reqwest`.
pub struct HttpObjectStorage {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpObjectStorage {
    pub fn new(endpoint: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self, RackError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RackError::Config(format!("Invalid service endpoint {}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(RackError::Config(format!(
                "Service endpoint {} cannot be used as a base URL",
                endpoint
            )));
        }
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| RackError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            auth_token,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, RackError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            RackError::Config(
                "No service endpoint configured. Set service.endpoint or RACK_SERVICE__ENDPOINT"
                    .to_string(),
            )
        })?;
        Self::new(
            endpoint,
            config.auth_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn container_url(&self, name: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::RequestFailed("endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => builder.header(AUTH_TOKEN_HEADER, token),
            None => builder,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn list_containers(
        &self,
        prefix: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ContainerInfo>, ApiError> {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "json");
            if let Some(prefix) = prefix {
                query.append_pair("prefix", prefix);
            }
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        debug!(url = %url, "Listing containers");
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = map_status(response, "containers").await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse container list: {}", e)))
    }

    async fn get_container(&self, name: &str) -> Result<ContainerInfo, ApiError> {
        let url = self.container_url(name)?;
        debug!(url = %url, "Fetching container metadata");
        let response = self
            .request(reqwest::Method::HEAD, url)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = map_status(response, name).await?;
        let headers = response.headers();
        Ok(ContainerInfo {
            name: name.to_string(),
            object_count: header_u64(headers, "X-Container-Object-Count")?,
            bytes_used: header_u64(headers, "X-Container-Bytes-Used")?,
        })
    }

    async fn create_container(
        &self,
        name: &str,
        metadata: &[(String, String)],
    ) -> Result<(), ApiError> {
        let url = self.container_url(name)?;
        debug!(url = %url, "Creating container");
        let mut builder = self.request(reqwest::Method::PUT, url);
        for (key, value) in metadata {
            builder = builder.header(format!("X-Container-Meta-{}", key), value);
        }
        let response = builder.send().await.map_err(map_http_error)?;
        map_status(response, name).await?;
        Ok(())
    }

    async fn delete_container(&self, name: &str) -> Result<(), ApiError> {
        let url = self.container_url(name)?;
        debug!(url = %url, "Deleting container");
        let response = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await
            .map_err(map_http_error)?;
        map_status(response, name).await?;
        Ok(())
    }
}
