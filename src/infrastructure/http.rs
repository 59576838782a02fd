// src/infrastructure/http.rs
// Shared HTTPS transport with a per-call deadline

use std::time::Duration;

use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use thiserror::Error;
use tower::{ServiceBuilder, ServiceExt};
use url::form_urlencoded;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Http(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Response status and body as read off the wire.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<serde_json::Value, TransportError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TransportError::Http(format!("invalid JSON body: {}", e)))
    }

    /// Fail on any non-2xx status, keeping the body for diagnostics.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status.as_u16(),
                body: self.text(),
            })
        }
    }
}

/// Thin wrapper over a hyper client. Every exchange (send plus body read)
/// is bounded by `timeout`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpsConnector<HttpConnector>>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Self { client, timeout }
    }

    pub async fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let request = build_request(Method::GET, url, headers, None, Body::empty())?;
        self.execute(request).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form(
        &self,
        url: &str,
        headers: &[(&str, String)],
        form: &[(&str, String)],
    ) -> Result<HttpResponse, TransportError> {
        let body = encode_form(form);
        let request = build_request(
            Method::POST,
            url,
            headers,
            Some("application/x-www-form-urlencoded"),
            Body::from(body),
        )?;
        self.execute(request).await
    }

    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, String)],
        payload: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let request = build_request(method, url, headers, Some("application/json"), Body::from(body))?;
        self.execute(request).await
    }

    async fn execute(&self, request: Request<Body>) -> Result<HttpResponse, TransportError> {
        let client = self.client.clone();
        let service = ServiceBuilder::new()
            .timeout(self.timeout)
            .service_fn(move |request: Request<Body>| {
                let client = client.clone();
                async move {
                    let response = client.request(request).await?;
                    let status = response.status();
                    let body = hyper::body::to_bytes(response.into_body()).await?;
                    Ok::<_, hyper::Error>(HttpResponse { status, body })
                }
            });

        service.oneshot(request).await.map_err(|e| {
            if e.is::<tower::timeout::error::Elapsed>() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Http(e.to_string())
            }
        })
    }
}

fn build_request(
    method: Method,
    url: &str,
    headers: &[(&str, String)],
    content_type: Option<&str>,
    body: Body,
) -> Result<Request<Body>, TransportError> {
    let mut builder = Request::builder().method(method).uri(url);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    if let Some(content_type) = content_type {
        builder = builder.header(hyper::header::CONTENT_TYPE, content_type);
    }
    builder
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

pub fn encode_form(form: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
