// zOS REST client
//
// Wraps `reqwest::Client` with base-URL joining, the JSON `filter` query
// convention, and status/error mapping. Endpoint groups (channels,
// messages, auth, users) are inherent methods in separate files so this
// module stays focused on transport mechanics.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in an error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// The `filter` query parameter accepted by list endpoints.
///
/// A text filter is passed through verbatim; a JSON filter is serialized.
/// An empty JSON object (or `null`) sends no query at all.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFilter {
    Text(String),
    Json(serde_json::Value),
}

impl RequestFilter {
    /// The encoded `filter` value, or `None` when nothing should be sent.
    pub fn query_value(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Json(v) if json_is_empty(v) => None,
            Self::Json(v) => Some(v.to_string()),
        }
    }
}

impl From<&str> for RequestFilter {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<serde_json::Value> for RequestFilter {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

fn json_is_empty(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => true,
        serde_json::Value::Object(m) => m.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// A file to send as the `file` part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: bytes::Bytes,
}

impl UploadFile {
    /// Read a file from disk, guessing nothing about its type.
    pub fn from_path(path: &std::path::Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            file_name,
            mime_type: None,
            bytes: bytes.into(),
        })
    }
}

/// Raw HTTP client for the zOS API.
///
/// Every request carries credentials: the session cookie jar and, when
/// configured, a bearer token. There is no retry, caching, or backoff;
/// failures surface to the caller unchanged.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root (e.g. `https://zosapi.zero.tech/api`);
    /// request paths are appended verbatim.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join `path` onto the base URL: `{base}{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Ok(Url::parse(&full)?)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        let url = self.api_url(path)?;
        debug!("{method} {url}");
        Ok(self.http.request(method, url))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET with an optional `filter` query parameter.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&RequestFilter>,
    ) -> Result<T, Error> {
        let mut builder = self.request(Method::GET, path)?;
        if let Some(value) = filter.and_then(RequestFilter::query_value) {
            builder = builder.query(&[("filter", value)]);
        }
        self.send_json(builder).await
    }

    /// GET with arbitrary serialized query parameters.
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &(impl Serialize + Sync + ?Sized),
    ) -> Result<T, Error> {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send_json(builder).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync + ?Sized),
    ) -> Result<T, Error> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send_json(builder).await
    }

    /// POST without a body, returning only the HTTP status.
    pub async fn post_status(&self, path: &str) -> Result<u16, Error> {
        let builder = self.request(Method::POST, path)?;
        self.send_status(builder).await
    }

    /// PUT a JSON body, returning only the HTTP status.
    pub async fn put_status(
        &self,
        path: &str,
        body: &(impl Serialize + Sync + ?Sized),
    ) -> Result<u16, Error> {
        let builder = self.request(Method::PUT, path)?.json(body);
        self.send_status(builder).await
    }

    /// DELETE with a JSON body, returning only the HTTP status.
    pub async fn delete_status(
        &self,
        path: &str,
        body: Option<&(impl Serialize + Sync + ?Sized)>,
    ) -> Result<u16, Error> {
        let mut builder = self.request(Method::DELETE, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send_status(builder).await
    }

    /// Multipart POST with a single `file` part.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: UploadFile,
    ) -> Result<T, Error> {
        let mut part =
            reqwest::multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
        if let Some(ref mime) = file.mime_type {
            part = part.mime_str(mime)?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);
        let builder = self.request(Method::POST, path)?.multipart(form);
        self.send_json(builder).await
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, Error> {
        let resp = builder.send().await.map_err(Error::Transport)?;
        let resp = check_status(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(len = body.len(), "response body received");

        // Endpoints that answer with an empty body decode as JSON `null`.
        let text = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(text).map_err(|e| {
            let preview = &body[..floor_char_boundary(&body, ERROR_BODY_PREVIEW)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn send_status(&self, builder: RequestBuilder) -> Result<u16, Error> {
        let resp = builder.send().await.map_err(Error::Transport)?;
        let resp = check_status(resp).await?;
        Ok(resp.status().as_u16())
    }
}

/// Map non-success responses to typed errors.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let preview = &body[..floor_char_boundary(&body, ERROR_BODY_PREVIEW)];
        return Err(Error::Api {
            status: status.as_u16(),
            message: if preview.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_owned()
            } else {
                preview.to_owned()
            },
        });
    }

    Ok(resp)
}

/// Largest char boundary `<= max` so previews never split a code point.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
