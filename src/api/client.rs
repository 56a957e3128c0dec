//! HTTP plumbing shared by every endpoint group.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ClientError, ClientResult, ErrorBody};
use crate::session::SessionManager;

/// JSON-over-HTTP client for the admin backend.
///
/// Attaches the stored bearer credential to every request and applies one
/// timeout to all of them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    sessions: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        sessions: Arc<SessionManager>,
    ) -> ClientResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            sessions,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn build(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.sessions.credential().await {
            Some(credential) => builder.bearer_auth(credential),
            None => builder,
        }
    }

    /// Send and turn non-2xx statuses into errors.
    async fn execute(&self, method: &Method, path: &str, builder: RequestBuilder) -> ClientResult<Response> {
        tracing::debug!("{} {}", method, path);

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, path, e);
            ClientError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        let err = ClientError::from_status(status, message);
        tracing::warn!("{} {} -> {}", method, path, err);
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.get_with_query(path, &[]).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let mut builder = self.build(Method::GET, path).await;
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let response = self.execute(&Method::GET, path, builder).await?;
        Self::decode(response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.build(Method::POST, path).await.json(body);
        let response = self.execute(&Method::POST, path, builder).await?;
        Self::decode(response).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.build(Method::PUT, path).await.json(body);
        let response = self.execute(&Method::PUT, path, builder).await?;
        Self::decode(response).await
    }

    /// DELETE, ignoring whatever body comes back.
    pub(crate) async fn delete(&self, path: &str) -> ClientResult<()> {
        let builder = self.build(Method::DELETE, path).await;
        self.execute(&Method::DELETE, path, builder).await?;
        Ok(())
    }

    /// DELETE that answers with a document.
    pub(crate) async fn delete_returning<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let builder = self.build(Method::DELETE, path).await;
        let response = self.execute(&Method::DELETE, path, builder).await?;
        Self::decode(response).await
    }
}

/// Characters escaped inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode a path segment.
pub(crate) fn segment(id: &str) -> String {
    utf8_percent_encode(id, PATH_SEGMENT).to_string()
}
