//! Remote client: paginated campaign lists and per-campaign content.
//!
//! [`CampaignApi`] is the seam the pipeline talks to; [`HttpApi`] is the Mailchimp implementation
//! (blocking reqwest, basic auth, per-request timeout). No retries and no caching happen here.

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::errors::ApiError;
use crate::utils::config::ApiConsts;
use crate::{ItemContent, RawItem, SyncConfig};

/// One list request. `fields` is the configured selection; required fields are added on the wire.
#[derive(Clone, Copy, Debug)]
pub struct ListRequest<'a> {
    pub fields: &'a [String],
    pub count: u32,
    pub offset: u64,
}

/// One page of the list endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ListPage {
    /// `None` when the response carried no `campaigns` field.
    #[serde(rename = "campaigns", default)]
    pub items: Option<Vec<RawItem>>,
    #[serde(default)]
    pub total_items: u64,
}

impl ListPage {
    pub fn item_count(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }
}

/// Request/response operations against the campaigns API. Must be shareable across the threads of
/// a content wave.
pub trait CampaignApi: Send + Sync {
    /// Fetch one page of campaign metadata.
    fn list_page(&self, req: &ListRequest<'_>) -> Result<ListPage, ApiError>;

    /// Fetch one campaign's content from `url`.
    fn fetch_detail(&self, url: &str, fields: &[String]) -> Result<ItemContent, ApiError>;

    /// Base URL of the campaigns collection (`{root}/campaigns`).
    fn campaigns_url(&self) -> &str;
}

/// `{campaigns_url}/{id}/content`
pub fn content_url_for(campaigns_url: &str, id: &str) -> String {
    format!(
        "{}/{}/{}",
        campaigns_url.trim_end_matches('/'),
        id,
        ApiConsts::CONTENT_PATH
    )
}

/// `{root_url}/campaigns`
pub fn campaigns_url_for(root_url: &str) -> String {
    format!(
        "{}/{}",
        root_url.trim_end_matches('/'),
        ApiConsts::CAMPAIGNS_PATH
    )
}

/// Configured list fields plus the ones pagination and parsing rely on, without duplicates.
pub fn list_fields_param(fields: &[String]) -> String {
    let mut all: Vec<&str> = fields.iter().map(String::as_str).collect();
    for required in ApiConsts::REQUIRED_LIST_FIELDS {
        if !all.contains(&required) {
            all.push(required);
        }
    }
    all.join(",")
}

/// Query parameters for a list request, in wire order.
pub fn list_query(req: &ListRequest<'_>, status: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("fields", list_fields_param(req.fields)),
        ("count", req.count.to_string()),
        ("offset", req.offset.to_string()),
        ("sort_field", ApiConsts::SORT_FIELD.to_string()),
        ("sort_dir", ApiConsts::SORT_DIR.to_string()),
    ];
    if let Some(status) = status {
        query.push(("status", status.to_string()));
    }
    query
}

/// Query parameters for a content request. An empty selection asks for the full payload.
pub fn detail_query(fields: &[String]) -> Vec<(&'static str, String)> {
    if fields.is_empty() {
        Vec::new()
    } else {
        vec![("fields", fields.join(","))]
    }
}

/// Mailchimp campaigns API over blocking HTTP.
pub struct HttpApi {
    client: Client,
    campaigns_url: String,
    username: String,
    key: String,
    status: Option<String>,
}

impl HttpApi {
    /// Build a client from an already validated config.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            client,
            campaigns_url: campaigns_url_for(&config.root_url),
            username: config.auth_username.clone(),
            key: config.key.clone(),
            status: config.status.clone(),
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        debug!("GET {} {:?}", url, query);
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.key))
            .query(query)
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl CampaignApi for HttpApi {
    fn list_page(&self, req: &ListRequest<'_>) -> Result<ListPage, ApiError> {
        let query = list_query(req, self.status.as_deref());
        self.get_json(&self.campaigns_url, &query)
    }

    fn fetch_detail(&self, url: &str, fields: &[String]) -> Result<ItemContent, ApiError> {
        self.get_json(url, &detail_query(fields))
    }

    fn campaigns_url(&self) -> &str {
        &self.campaigns_url
    }
}
