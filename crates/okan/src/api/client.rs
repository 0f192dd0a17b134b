//! HTTP client for the hosted data API.
//!
//! Table calls go to `<base>/rest/v1/<table>` and authentication calls to `<base>/auth/v1/`.
//! Every request carries the project key in `apikey` and a bearer token: the signed-in user's
//! access token when there is one, the project key otherwise.

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::error::ApiError;
use super::query::Query;
use crate::db::{DataApi, Table};

pub struct HostedClient {
    client: Client,
    rest_base: Url,
    pub(super) auth_base: Url,
    api_key: String,
}

impl HostedClient {
    /// Creates a client for the project at `base_url` using its public key.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        Ok(Self {
            client,
            rest_base: base.join("rest/v1/")?,
            auth_base: base.join("auth/v1/")?,
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: Table) -> Result<Url, ApiError> {
        Ok(self.rest_base.join(table.name())?)
    }

    /// Starts a request with the project key and bearer headers set.
    pub(super) fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    /// Sends the request and turns non-success statuses into [`ApiError::Status`].
    pub(super) async fn send(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Response, ApiError> {
        let correlation_id = generate_correlation_id();
        let start = Instant::now();

        let response = request.send().await.map_err(|e| {
            warn!(
                correlation_id = %correlation_id,
                resource = what,
                error = %e,
                "Hosted API request failed"
            );
            ApiError::from(e)
        })?;

        let status = response.status();
        debug!(
            correlation_id = %correlation_id,
            resource = what,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Hosted API responded"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = status_error(status.as_u16(), &body);
        warn!(
            correlation_id = %correlation_id,
            resource = what,
            status = status.as_u16(),
            error = %error,
            "Hosted API rejected request"
        );
        Err(error)
    }
}

/// Error payloads differ between the REST and auth endpoints; take whichever message is set.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }

    pub fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| match &self.code {
            Some(Value::String(code)) => Some(code.clone()),
            _ => self.error.clone(),
        })
    }
}

pub(super) fn status_error(status: u16, body: &str) -> ApiError {
    let parsed = ErrorBody::parse(body);
    let message = parsed
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });

    ApiError::Status {
        status,
        message,
        code: parsed.code(),
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(header: Option<&HeaderValue>) -> Option<u64> {
    header?.to_str().ok()?.rsplit('/').next()?.parse().ok()
}

#[async_trait]
impl DataApi for HostedClient {
    async fn select(
        &self,
        table: Table,
        query: &Query,
        bearer: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        let request = self
            .request(Method::GET, self.table_url(table)?, bearer)
            .query(&query.to_params());
        let response = self.send(request, table.name()).await?;
        Ok(response.json().await?)
    }

    async fn count(
        &self,
        table: Table,
        query: &Query,
        bearer: Option<&str>,
    ) -> Result<u64, ApiError> {
        let mut params = vec![("select".to_string(), "id".to_string())];
        params.extend(query.filter_params());

        let request = self
            .request(Method::HEAD, self.table_url(table)?, bearer)
            .header("Prefer", "count=exact")
            .query(&params);
        let response = self.send(request, table.name()).await?;

        parse_content_range(response.headers().get(CONTENT_RANGE)).ok_or_else(|| {
            ApiError::Decode {
                message: format!("missing row count for {table}"),
            }
        })
    }

    async fn insert(&self, table: Table, row: Value, bearer: Option<&str>) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.table_url(table)?, bearer)
            .header("Prefer", "return=minimal")
            .json(&row);
        self.send(request, table.name()).await?;
        info!(table = table.name(), "Inserted row");
        Ok(())
    }

    async fn update(
        &self,
        table: Table,
        query: &Query,
        changes: Value,
        bearer: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, self.table_url(table)?, bearer)
            .header("Prefer", "return=minimal")
            .query(&query.filter_params())
            .json(&changes);
        self.send(request, table.name()).await?;
        info!(table = table.name(), "Updated rows");
        Ok(())
    }

    async fn delete(
        &self,
        table: Table,
        query: &Query,
        bearer: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, self.table_url(table)?, bearer)
            .query(&query.filter_params());
        self.send(request, table.name()).await?;
        info!(table = table.name(), "Deleted rows");
        Ok(())
    }
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
