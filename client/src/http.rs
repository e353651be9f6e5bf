use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::debug;
use once_cell::sync::Lazy;
use url::Url;

use crate::result::BoxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-specified request ready for dispatch. Encoders produce a fresh
/// descriptor per call and never mutate one they were handed.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: HttpMethod,
    /// Header names are kept case-sensitive as supplied; one value per name.
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// Transport-level response facts a parser needs besides the body.
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub status: u16,
    /// Final URL reported by the transport, after any redirects it followed.
    pub url: Option<Url>,
}

/// A transport's own classification of its failure. Parsers map `Network`
/// to [`crate::ResultError::Network`] and `Other` to
/// [`crate::ResultError::Unexpected`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connectivity-level failure: DNS, timeout, TLS, connection reset.
    #[error("network failure: {0}")]
    Network(#[source] BoxError),
    /// Failure the transport could not classify.
    #[error("transport failure: {0}")]
    Other(#[source] BoxError),
}

/// Raw outcome of a transport round-trip, before parsing. The transport
/// guarantees completion-or-error: exactly one of the two arms is produced
/// per submitted request.
pub type TransportOutcome = Result<(Option<Vec<u8>>, ResponseMetadata), TransportError>;

/// An injectable HTTP transport. Implementations own connection management,
/// TLS and pooling; this crate only delegates single requests to it. Must be
/// safe for concurrent use by any number of in-flight requests.
pub trait Transport: Send + Sync {
    fn submit(&self, request: RequestDescriptor) -> BoxFuture<'_, TransportOutcome>;
}

/// Production transport over a `reqwest::Client`. The wrapped client is the
/// place to configure timeouts, user agent and pool limits.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn submit(&self, request: RequestDescriptor) -> BoxFuture<'_, TransportOutcome> {
        Box::pin(async move {
            debug!("{} {}", request.method, request.url);

            let mut builder = match request.method {
                HttpMethod::GET => self.client.get(request.url.clone()),
                HttpMethod::POST => self.client.post(request.url.clone()),
                HttpMethod::PUT => self.client.put(request.url.clone()),
                HttpMethod::PATCH => self.client.patch(request.url.clone()),
                HttpMethod::DELETE => self.client.delete(request.url.clone()),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(classify)?;
            let metadata = ResponseMetadata {
                status: response.status().as_u16(),
                url: Some(response.url().clone()),
            };
            let body = response.bytes().await.map_err(classify)?;
            Ok((Some(body.to_vec()), metadata))
        })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() || error.is_connect() {
        TransportError::Network(Box::new(error))
    } else {
        TransportError::Other(Box::new(error))
    }
}

static SHARED_TRANSPORT: Lazy<Arc<ReqwestTransport>> =
    Lazy::new(|| Arc::new(ReqwestTransport::default()));

/// Process-wide transport shared by [`crate::Session::default`]. One
/// underlying client, reused for the life of the process.
pub fn shared_transport() -> Arc<dyn Transport> {
    SHARED_TRANSPORT.clone() as Arc<dyn Transport>
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn method_strings_match_the_wire_verbs() {
        assert_eq!(HttpMethod::GET.as_str(), "GET");
        assert_eq!(HttpMethod::PATCH.to_string(), "PATCH");
    }

    #[tokio::test]
    async fn submit_reports_status_body_and_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let request = RequestDescriptor {
            url: Url::parse(&format!("{}/ping", server.uri())).unwrap(),
            method: HttpMethod::GET,
            headers: HashMap::new(),
            body: None,
        };

        let (body, metadata) = transport.submit(request).await.unwrap();
        assert_eq!(metadata.status, 200);
        assert_eq!(body.unwrap(), b"pong");
        assert!(metadata.url.unwrap().path().ends_with("/ping"));
    }

    #[tokio::test]
    async fn submit_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("X-Trace", "abc123"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let request = RequestDescriptor {
            url: Url::parse(&format!("{}/echo", server.uri())).unwrap(),
            method: HttpMethod::POST,
            headers: HashMap::from([("X-Trace".to_string(), "abc123".to_string())]),
            body: Some(b"payload".to_vec()),
        };

        let (_, metadata) = transport.submit(request).await.unwrap();
        assert_eq!(metadata.status, 204);
    }

    #[tokio::test]
    async fn connection_refused_classifies_as_network() {
        // Port 1 is never listening on loopback.
        let transport = ReqwestTransport::default();
        let request = RequestDescriptor {
            url: Url::parse("http://127.0.0.1:1/unreachable").unwrap(),
            method: HttpMethod::GET,
            headers: HashMap::new(),
            body: None,
        };

        match transport.submit(request).await {
            Err(TransportError::Network(_)) => {}
            Err(TransportError::Other(error)) => panic!("unclassified failure: {error}"),
            Ok(_) => panic!("expected the connection to be refused"),
        }
    }
}
