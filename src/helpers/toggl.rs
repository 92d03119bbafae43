use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{InvoiceError, Result};

pub const DEFAULT_API_URL: &str = "https://www.toggl.com/api/v8";

const USER_AGENT: &str = "toggl-invoice";

/// The five Toggl resources an invoice is assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    TimeEntries { start: String, end: String },
    Clients,
    Project(u64),
    Workspaces,
    Me,
}

impl Resource {
    pub fn path(&self) -> String {
        match self {
            Resource::TimeEntries { .. } => "time_entries".to_string(),
            Resource::Clients => "clients".to_string(),
            Resource::Project(id) => format!("projects/{id}"),
            Resource::Workspaces => "workspaces".to_string(),
            Resource::Me => "me".to_string(),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, &str)> {
        match self {
            Resource::TimeEntries { start, end } => {
                vec![("start_date", start.as_str()), ("end_date", end.as_str())]
            }
            _ => Vec::new(),
        }
    }
}

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// GETs `resource` and returns its JSON body. Anything but `200 OK` is a
    /// [`InvoiceError::RemoteRequest`].
    async fn fetch(&self, resource: &Resource) -> Result<Value>;
}

/// Authenticated Toggl session shared by every request of a run.
#[derive(Clone)]
pub struct TogglClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for TogglClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TogglClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TogglClient {
    pub fn new(token: String, base_url: &str) -> Result<Self> {
        info!("Initializing Toggl client for {}", base_url);

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                error!("Failed to build Toggl client: {}", e);
                e
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn url(&self, resource: &Resource) -> Result<Url> {
        let base = format!("{}/{}", self.base_url, resource.path());
        Url::parse_with_params(&base, resource.query()).map_err(|e| {
            error!("Invalid Toggl URL {}: {}", base, e);
            InvoiceError::InvalidUrl {
                url: base.clone(),
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl ResourceFetcher for TogglClient {
    async fn fetch(&self, resource: &Resource) -> Result<Value> {
        let url = self.url(resource)?;
        debug!("GET {}", url.path());

        let response = match self
            .client
            .get(url.clone())
            .basic_auth(&self.token, Some("api_token"))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to send request to Toggl API: {}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            error!("Toggl API returned status {} for {}", status, url.path());
            return Err(InvoiceError::RemoteRequest {
                url: url.to_string(),
                status,
            });
        }

        let text = response.text().await.map_err(|e| {
            error!("Failed to read response body: {}", e);
            e
        })?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Failed to parse Toggl response: {}", e);
                debug!("Raw response: {}", text);
                Err(e.into())
            }
        }
    }
}
