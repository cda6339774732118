//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only seam that performs I/O, so tests can substitute
//! a scripted implementation. `UreqTransport` is the blocking default: it
//! builds a fresh agent for every call (no connection reuse between calls)
//! and returns 4xx/5xx responses as data, leaving status interpretation to
//! `Operation::parse`.

use std::fmt;
use std::fs;

use ureq::tls::{Certificate, ClientCert, PrivateKey, TlsConfig};
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::config::{ClientCertPaths, ClientConfig};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Sends one request and returns the raw response.
///
/// Implementations return `Err` only when no HTTP response was obtained.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    tls: TlsConfig,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Transport without a client certificate.
    pub fn new(verify_tls: bool) -> Self {
        Self {
            tls: TlsConfig::builder()
                .disable_verification(!verify_tls)
                .build(),
        }
    }

    /// Reads the client certificate pair, if configured, from disk.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client_cert = config.client_cert.as_ref().map(load_client_cert).transpose()?;
        Ok(Self {
            tls: TlsConfig::builder()
                .disable_verification(!config.verify_tls)
                .client_cert(client_cert)
                .build(),
        })
    }

    fn agent(&self) -> Agent {
        Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(self.tls.clone())
            .build()
            .new_agent()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent();
        let url = request.url.as_str();

        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), &request.headers).call(),
            HttpMethod::Post => send_body(agent.post(url), request),
            HttpMethod::Put => send_body(agent.put(url), request),
            HttpMethod::Patch => send_body(agent.patch(url), request),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    request: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = with_headers(builder, &request.headers);
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn load_client_cert(paths: &ClientCertPaths) -> Result<ClientCert, ApiError> {
    let cert_pem = fs::read(&paths.cert).map_err(|e| {
        ApiError::Config(format!("reading client certificate {}: {e}", paths.cert.display()))
    })?;
    let key_pem = fs::read(&paths.key).map_err(|e| {
        ApiError::Config(format!("reading client key {}: {e}", paths.key.display()))
    })?;

    let cert = Certificate::from_pem(&cert_pem)
        .map_err(|e| ApiError::Config(format!("parsing client certificate: {e}")))?
        .to_owned();
    let key = PrivateKey::from_pem(&key_pem)
        .map_err(|e| ApiError::Config(format!("parsing client key: {e}")))?
        .to_owned();

    Ok(ClientCert::new_with_certs(&[cert], key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_certificate_file_is_config_error() {
        let config = ClientConfig::new("https://127.0.0.1:27124", "t")
            .with_client_cert("/nonexistent/cert.pem", "/nonexistent/key.pem");
        let err = UreqTransport::from_config(&config).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert!(err.to_string().contains("/nonexistent/cert.pem"));
    }

    #[test]
    fn connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://127.0.0.1:{port}/"),
            headers: Vec::new(),
            body: None,
        };
        let err = UreqTransport::default().send(&request).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
