use std::collections::HashMap;
use std::marker::PhantomData;

use serde::Serialize;
use url::Url;

use crate::http::{HttpMethod, RequestDescriptor};

static HEADER_CONTENT_TYPE: &str = "Content-Type";

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// Parameter payload that cannot be represented in the target format.
    #[error("invalid request payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Turns a URL, a method and optional typed parameters into a
/// transport-ready [`RequestDescriptor`].
///
/// Variants contribute their format through
/// [`default_headers`](RequestEncoder::default_headers) and a body, and
/// compose [`base_request`](RequestEncoder::base_request) for everything
/// shared. Each call produces a fresh descriptor.
pub trait RequestEncoder {
    type Params;

    /// Headers the encoder contributes on its own. `extra_headers` passed
    /// to [`encode`](RequestEncoder::encode) win on key collision.
    fn default_headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn encode(
        &self,
        url: &Url,
        method: HttpMethod,
        parameters: Option<&Self::Params>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<RequestDescriptor, EncodingError>;

    /// Method, merged headers, empty body: the base every variant builds on.
    fn base_request(
        &self,
        url: &Url,
        method: HttpMethod,
        extra_headers: &HashMap<String, String>,
    ) -> RequestDescriptor {
        let mut headers = self.default_headers();
        for (name, value) in extra_headers {
            headers.insert(name.clone(), value.clone());
        }
        RequestDescriptor {
            url: url.clone(),
            method,
            headers,
            body: None,
        }
    }
}

/// Method and headers only; ignores parameters and never sets a body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRequestEncoder;

impl RequestEncoder for BasicRequestEncoder {
    type Params = ();

    fn encode(
        &self,
        url: &Url,
        method: HttpMethod,
        _parameters: Option<&()>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<RequestDescriptor, EncodingError> {
        Ok(self.base_request(url, method, extra_headers))
    }
}

/// Serializes parameters into a JSON body with
/// `Content-Type: application/json`. The default parameter type,
/// `serde_json::Value`, covers free-form objects, arrays and scalars.
pub struct JsonRequestEncoder<P = serde_json::Value> {
    _marker: PhantomData<fn() -> P>,
}

impl<P> JsonRequestEncoder<P> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P> Default for JsonRequestEncoder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Serialize> RequestEncoder for JsonRequestEncoder<P> {
    type Params = P;

    fn default_headers(&self) -> HashMap<String, String> {
        HashMap::from([(
            HEADER_CONTENT_TYPE.to_string(),
            "application/json".to_string(),
        )])
    }

    fn encode(
        &self,
        url: &Url,
        method: HttpMethod,
        parameters: Option<&P>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<RequestDescriptor, EncodingError> {
        let mut request = self.base_request(url, method, extra_headers);
        if let Some(parameters) = parameters {
            request.body = Some(serde_json::to_vec(parameters)?);
        }
        Ok(request)
    }
}

/// Percent-encodes a string map into an
/// `application/x-www-form-urlencoded` body. An empty map produces no body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormRequestEncoder;

impl RequestEncoder for FormRequestEncoder {
    type Params = HashMap<String, String>;

    fn default_headers(&self) -> HashMap<String, String> {
        HashMap::from([(
            HEADER_CONTENT_TYPE.to_string(),
            "application/x-www-form-urlencoded; charset=utf-8".to_string(),
        )])
    }

    fn encode(
        &self,
        url: &Url,
        method: HttpMethod,
        parameters: Option<&HashMap<String, String>>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<RequestDescriptor, EncodingError> {
        let mut request = self.base_request(url, method, extra_headers);
        request.body = parameters.and_then(form_body);
        Ok(request)
    }
}

// Alphanumerics plus `_ - . ~` pass through; everything else is
// percent-escaped. Pair order follows map iteration and is unspecified.
fn form_body(parameters: &HashMap<String, String>) -> Option<Vec<u8>> {
    if parameters.is_empty() {
        return None;
    }

    let encoded = parameters
        .iter()
        .map(|(key, value)| {
            format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
        })
        .collect::<Vec<_>>()
        .join("&");
    Some(encoded.into_bytes())
}
