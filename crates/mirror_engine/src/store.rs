use std::time::Duration;

use mirror_core::{Block, Page};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{FailureKind, StoreError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_version: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub page_size: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com".to_string(),
            api_version: "2022-06-28".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            page_size: 100,
        }
    }
}

/// Read access to the hosted document store.
#[async_trait::async_trait]
pub trait PageStore: Send + Sync {
    /// Every page of the database, all result pages concatenated.
    async fn query_database(&self, database_id: &str) -> Result<Vec<Page>, StoreError>;

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, StoreError>;

    /// Direct children of a block or page, in document order.
    async fn block_children(&self, block_id: &str) -> Result<Vec<Block>, StoreError>;
}

#[derive(Deserialize)]
struct Paginated<T> {
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    settings: ClientSettings,
    token: String,
}

impl NotionClient {
    pub fn new(settings: ClientSettings, token: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| StoreError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            settings,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        let base = self.settings.base_url.trim_end_matches('/');
        Url::parse(&format!("{base}/v1/{path}"))
            .map_err(|err| StoreError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("Notion-Version", &self.settings.api_version)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, StoreError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ApiErrorBody>(&body) {
                Ok(ApiErrorBody {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{code}: {message}"),
                Ok(ApiErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                _ => status.to_string(),
            };
            return Err(StoreError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        serde_json::from_slice(&body)
            .map_err(|err| StoreError::new(FailureKind::Decode, err.to_string()))
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        mut next: impl FnMut(Option<&str>) -> Result<reqwest::RequestBuilder, StoreError>,
    ) -> Result<Vec<T>, StoreError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let request = next(cursor.as_deref())?;
            let page: Paginated<T> = self.send(request).await?;
            items.extend(page.results);
            match (page.has_more, page.next_cursor) {
                (true, Some(next_cursor)) => cursor = Some(next_cursor),
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait::async_trait]
impl PageStore for NotionClient {
    async fn query_database(&self, database_id: &str) -> Result<Vec<Page>, StoreError> {
        let url = self.endpoint(&format!("databases/{database_id}/query"))?;
        let page_size = self.settings.page_size;
        self.paginate(|cursor| {
            let mut body = json!({ "page_size": page_size });
            if let Some(cursor) = cursor {
                body["start_cursor"] = Value::String(cursor.to_string());
            }
            Ok(self
                .request(reqwest::Method::POST, url.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string()))
        })
        .await
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, StoreError> {
        let url = self.endpoint(&format!("pages/{page_id}"))?;
        self.send(self.request(reqwest::Method::GET, url)).await
    }

    async fn block_children(&self, block_id: &str) -> Result<Vec<Block>, StoreError> {
        let base = self.endpoint(&format!("blocks/{block_id}/children"))?;
        let page_size = self.settings.page_size.to_string();
        self.paginate(|cursor| {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page_size", &page_size);
                if let Some(cursor) = cursor {
                    query.append_pair("start_cursor", cursor);
                }
            }
            Ok(self.request(reqwest::Method::GET, url))
        })
        .await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        return StoreError::new(FailureKind::Timeout, err.to_string());
    }
    StoreError::new(FailureKind::Network, err.to_string())
}
