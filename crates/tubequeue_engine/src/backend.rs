use std::time::Duration;

use engine_logging::engine_debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use tubequeue_core::{ConfigPatch, LinkId, LinkRecord, RawSubmission, ServerState};

use crate::wire::{
    decode_state, decode_submit_response, encode_config_patch, encode_submission, encode_tags,
};
use crate::{BackendError, FailureKind};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8765";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// What the backend returned for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitReceipt {
    pub link: Option<LinkRecord>,
    /// The link already existed and was attached to the category.
    pub duplicate: bool,
}

/// The ingestion backend. Submission is not idempotent; callers never retry it.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `Err` with [`FailureKind::Conflict`] when the backend refuses a duplicate.
    async fn submit_link(&self, submission: &RawSubmission)
        -> Result<SubmitReceipt, BackendError>;

    async fn fetch_state(&self) -> Result<ServerState, BackendError>;

    async fn push_config(&self, patch: &ConfigPatch) -> Result<(), BackendError>;

    async fn add_category(&self, name: &str) -> Result<(), BackendError>;

    async fn move_link(&self, id: LinkId, category: &str) -> Result<(), BackendError>;

    async fn delete_link(&self, id: LinkId) -> Result<(), BackendError>;

    /// Replaces the link's tags.
    async fn update_tags(&self, id: LinkId, tags: &[String]) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        json_body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, BackendError> {
        engine_debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(body) = json_body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::new(FailureKind::Conflict, message));
        }
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(body.to_vec())
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn submit_link(
        &self,
        submission: &RawSubmission,
    ) -> Result<SubmitReceipt, BackendError> {
        let body = encode_submission(&submission.url, &submission.category)?;
        let response = self
            .send(Method::POST, self.endpoint("api/links")?, Some(body))
            .await?;
        Ok(decode_submit_response(&response))
    }

    async fn fetch_state(&self) -> Result<ServerState, BackendError> {
        let response = self
            .send(Method::GET, self.endpoint("api/draft")?, None)
            .await?;
        decode_state(&response)
    }

    async fn push_config(&self, patch: &ConfigPatch) -> Result<(), BackendError> {
        let body = encode_config_patch(patch);
        self.send(Method::POST, self.endpoint("api/config")?, Some(body))
            .await?;
        Ok(())
    }

    async fn add_category(&self, name: &str) -> Result<(), BackendError> {
        let mut url = self.endpoint("api/categories")?;
        url.query_pairs_mut().append_pair("name", name);
        self.send(Method::POST, url, None).await?;
        Ok(())
    }

    async fn move_link(&self, id: LinkId, category: &str) -> Result<(), BackendError> {
        let mut url = self.endpoint(&format!("api/links/{id}/category"))?;
        url.query_pairs_mut().append_pair("category", category);
        self.send(Method::PATCH, url, None).await?;
        Ok(())
    }

    async fn delete_link(&self, id: LinkId) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("api/links/{id}"))?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn update_tags(&self, id: LinkId, tags: &[String]) -> Result<(), BackendError> {
        let body = encode_tags(tags)?;
        let url = self.endpoint(&format!("api/links/{id}/tags"))?;
        self.send(Method::PATCH, url, Some(body)).await?;
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return BackendError::new(FailureKind::InvalidUrl, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}
