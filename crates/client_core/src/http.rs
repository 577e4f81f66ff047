use std::sync::Arc;

use reqwest::{
    multipart::{Form, Part},
    Client, Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::error::{upstream_message, DashboardError};
use tracing::{debug, error};

use crate::{
    adapter::{normalize_list_payload, RecordList},
    auth::{require_token, TokenSource},
    config::Settings,
};

/// Paths of the priority endpoints, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub priorities: String,
    pub assign_priority: String,
    pub update_priority: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for Endpoints {
    fn from(settings: &Settings) -> Self {
        Self {
            priorities: settings.priorities_endpoint.clone(),
            assign_priority: settings.assign_priority_endpoint.clone(),
            update_priority: settings.update_priority_endpoint.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub field: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Authenticated JSON client for the dashboard backend.
///
/// Every request reads the bearer token from the configured
/// [`TokenSource`]; without one the request is never sent.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    endpoints: Endpoints,
    tokens: Arc<dyn TokenSource>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints: Endpoints::default(),
            tokens,
        }
    }

    pub fn from_settings(settings: &Settings, tokens: Arc<dyn TokenSource>) -> Self {
        Self::new(settings.api_base_url.clone(), tokens).with_endpoints(Endpoints::from(settings))
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, DashboardError> {
        let token = require_token(self.tokens.as_ref())?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<T, DashboardError> {
        let response = builder.send().await.map_err(|err| {
            error!(context, error = %err, "backend request could not be sent");
            DashboardError::upstream(None, format!("{context}: {err}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            error!(context, status = status.as_u16(), error = %err, "failed to read backend response");
            DashboardError::upstream(Some(status.as_u16()), format!("{context}: {err}"))
        })?;

        if !status.is_success() {
            error!(context, status = status.as_u16(), body = %body, "backend returned an error");
            return Err(DashboardError::upstream(
                Some(status.as_u16()),
                upstream_message(status.as_u16(), &body),
            ));
        }

        debug!(context, status = status.as_u16(), bytes = body.len(), "backend request succeeded");
        serde_json::from_str(&body).map_err(|err| {
            error!(context, body = %body, error = %err, "backend response is not the expected JSON");
            DashboardError::malformed(format!("{context}: {err}"))
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashboardError> {
        let builder = self.request(Method::GET, path)?;
        self.execute(builder, &format!("GET {path}")).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, DashboardError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path)?.json(body);
        self.execute(builder, &format!("POST {path}")).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, DashboardError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path)?.json(body);
        self.execute(builder, &format!("PUT {path}")).await
    }

    /// Fetch a list endpoint answering with either a bare array or a
    /// `{ content: [...] }` envelope.
    pub async fn fetch_records(&self, path: &str) -> Result<RecordList, DashboardError> {
        let payload: Value = self.get_json(path).await?;
        normalize_list_payload(payload)
    }

    pub async fn upload_file(&self, path: &str, upload: FileUpload) -> Result<Value, DashboardError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.filename);
        if let Some(mime_type) = upload.mime_type.as_deref() {
            part = part.mime_str(mime_type).map_err(|err| {
                DashboardError::invalid(format!("invalid mime type '{mime_type}': {err}"))
            })?;
        }
        let form = Form::new().part(upload.field, part);
        let builder = self.request(Method::POST, path)?.multipart(form);
        self.execute(builder, &format!("POST {path} (multipart)")).await
    }
}
