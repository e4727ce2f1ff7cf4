//! HTTP client for the extraction and scoring service.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use ssm_model::{ImportedVariable, MappingCandidate, ReferenceVariable};
use tracing::{debug, info, instrument, warn};

use crate::error::GatewayError;
use crate::settings::GatewaySettings;
use crate::wire::{
    AlignRequest, AlignResponse, ExtractedVariable, ReferenceListResponse, UploadResponse,
    WireCandidate,
};

/// Operations the review workflow needs from the remote service.
///
/// Each call is a single request: no retry, no batching, no cancellation.
pub trait ScoringGateway {
    /// Fetch the full reference schema.
    fn load_references(
        &self,
    ) -> impl Future<Output = Result<Vec<ReferenceVariable>, GatewayError>> + Send;

    /// Submit a dataset file for variable extraction.
    fn upload_file(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Vec<ExtractedVariable>, GatewayError>> + Send;

    /// Request scored reference candidates for one imported variable.
    fn get_mapping(
        &self,
        variable: &ImportedVariable,
    ) -> impl Future<Output = Result<Vec<MappingCandidate>, GatewayError>> + Send;
}

/// [`ScoringGateway`] over HTTP.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    settings: GatewaySettings,
}

impl GatewayClient {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    async fn read_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(url, e))?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl ScoringGateway for GatewayClient {
    #[instrument(skip_all)]
    async fn load_references(&self) -> Result<Vec<ReferenceVariable>, GatewayError> {
        let url = self.settings.endpoint("core");
        debug!(%url, "loading reference schema");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::transport(&url, e))?;
        let payload: ReferenceListResponse = Self::read_json(&url, response).await?;

        if let Some(count) = payload.count
            && count != payload.items.len()
        {
            debug!(count, items = payload.items.len(), "reference count differs from items");
        }
        let received = payload.items.len();
        let references: Vec<ReferenceVariable> = payload
            .items
            .into_iter()
            .filter_map(|item| {
                let model = item.into_model();
                if model.is_none() {
                    warn!("reference item without an id skipped");
                }
                model
            })
            .collect();
        info!(received, loaded = references.len(), "reference schema loaded");
        Ok(references)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    async fn upload_file(&self, path: &Path) -> Result<Vec<ExtractedVariable>, GatewayError> {
        let url = self.settings.endpoint("uploadfile");
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GatewayError::io(path, e))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        debug!(%url, size = bytes.len(), "uploading file");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::transport(&url, e))?;
        let payload: UploadResponse = Self::read_json(&url, response).await?;
        info!(variables = payload.variables.len(), "file extracted");
        Ok(payload.variables)
    }

    #[instrument(skip_all, fields(import_id = %variable.import_id))]
    async fn get_mapping(
        &self,
        variable: &ImportedVariable,
    ) -> Result<Vec<MappingCandidate>, GatewayError> {
        let url = self.settings.endpoint("align");
        let response = self
            .http
            .post(&url)
            .json(&AlignRequest::from(variable))
            .send()
            .await
            .map_err(|e| GatewayError::transport(&url, e))?;
        let payload: AlignResponse = Self::read_json(&url, response).await?;
        let candidates: Vec<MappingCandidate> = payload
            .into_items()
            .into_iter()
            .filter_map(WireCandidate::into_model)
            .collect();
        debug!(candidates = candidates.len(), "mapping candidates received");
        Ok(candidates)
    }
}
