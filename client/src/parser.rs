use std::collections::HashMap;
use std::marker::PhantomData;

use log::debug;
use serde::de::DeserializeOwned;

use crate::http::{ResponseMetadata, TransportError, TransportOutcome};
use crate::result::{ApiResult, DataError, ResultError, ServerError};

/// Converts a raw transport outcome into a typed [`ApiResult`].
///
/// Every variant runs the same triage (transport failures and failing
/// statuses short-circuit, an empty body yields the success default) and
/// only parses a body that survives it. `Rejection` is the application-level payload
/// type of [`ResultError::Client`]; parsers never construct it themselves.
pub trait ResponseParser {
    type Success;
    type Rejection;

    /// MIME type the session manager attaches as the `Accept` header
    /// before dispatch, when present.
    fn accept_type(&self) -> Option<&'static str> {
        None
    }

    fn parse(&self, outcome: TransportOutcome) -> ApiResult<Self::Success, Self::Rejection>;

    /// Uniform failure triage shared by all variants: transport errors map
    /// to `Network`/`Unexpected` and statuses >= 500 map to `Server`,
    /// without touching the body. Anything else is handed back for parsing.
    fn triage(
        &self,
        outcome: TransportOutcome,
    ) -> Result<(Option<Vec<u8>>, ResponseMetadata), ResultError<Self::Rejection>> {
        match outcome {
            Err(TransportError::Network(error)) => Err(ResultError::Network(error)),
            Err(TransportError::Other(error)) => Err(ResultError::Unexpected(error)),
            Ok((body, metadata)) => {
                if metadata.status >= 500 {
                    Err(ResultError::Server(ServerError::Status {
                        code: metadata.status,
                        url: metadata.url.clone(),
                    }))
                } else {
                    Ok((body, metadata))
                }
            }
        }
    }
}

/// Decodes a JSON body into any `DeserializeOwned + Default` success type.
/// An absent or empty body yields `S::default()`.
pub struct JsonResponseParser<S, E> {
    _marker: PhantomData<fn() -> (S, E)>,
}

impl<S, E> JsonResponseParser<S, E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<S, E> Default for JsonResponseParser<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> ResponseParser for JsonResponseParser<S, E>
where
    S: DeserializeOwned + Default,
{
    type Success = S;
    type Rejection = E;

    fn accept_type(&self) -> Option<&'static str> {
        Some("application/json")
    }

    fn parse(&self, outcome: TransportOutcome) -> ApiResult<S, E> {
        let (body, _metadata) = self.triage(outcome)?;

        let data = match body {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(S::default()),
        };

        let value: serde_json::Value = match serde_json::from_slice(&data) {
            Ok(value) => value,
            Err(error) => {
                debug!("response body is not JSON: {error}");
                return Err(ResultError::Server(ServerError::Parsing(
                    DataError::Wrapped(Box::new(error)),
                )));
            }
        };

        match serde_json::from_value(value.clone()) {
            Ok(success) => Ok(success),
            Err(error) => Err(ResultError::Server(ServerError::Parsing(
                DataError::Format {
                    message: format!(
                        "cannot decode into {}: {error}",
                        std::any::type_name::<S>()
                    ),
                    value,
                },
            ))),
        }
    }
}

/// Decodes an `application/x-www-form-urlencoded` body into a string map,
/// inverting [`crate::FormRequestEncoder`]'s percent-escapes. Later
/// duplicate keys overwrite earlier ones.
pub struct FormResponseParser<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> FormResponseParser<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for FormResponseParser<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ResponseParser for FormResponseParser<E> {
    type Success = HashMap<String, String>;
    type Rejection = E;

    fn accept_type(&self) -> Option<&'static str> {
        Some("application/x-www-form-urlencoded")
    }

    fn parse(&self, outcome: TransportOutcome) -> ApiResult<HashMap<String, String>, E> {
        let (body, _metadata) = self.triage(outcome)?;

        let data = match body {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(HashMap::new()),
        };

        let text = match std::str::from_utf8(&data) {
            Ok(text) => text,
            Err(_) => {
                return Err(ResultError::Server(ServerError::Unexpected(Some(
                    "response body is not UTF-8".to_string(),
                ))))
            }
        };

        let mut fields = HashMap::new();
        for pair in text.split('&') {
            // Split on the first `=` so values may themselves contain one.
            let Some((key, value)) = pair.split_once('=') else {
                debug!("form pair without '=': {pair:?}");
                return Err(ResultError::Server(ServerError::Parsing(
                    DataError::Format {
                        message: format!("form pair {pair:?} is missing '='"),
                        value: serde_json::Value::String(text.to_string()),
                    },
                )));
            };
            let key = percent_decode(key)?;
            let value = percent_decode(value)?;
            fields.insert(key, value);
        }

        Ok(fields)
    }
}

fn percent_decode<E>(input: &str) -> Result<String, ResultError<E>> {
    match urlencoding::decode(input) {
        Ok(decoded) => Ok(decoded.into_owned()),
        Err(error) => Err(ResultError::Server(ServerError::Parsing(
            DataError::Wrapped(Box::new(error)),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseMetadata;
    use serde_json::json;

    type JsonMapParser = JsonResponseParser<HashMap<String, serde_json::Value>, ()>;
    type FormParser = FormResponseParser<()>;

    fn reply(status: u16, body: &[u8]) -> TransportOutcome {
        Ok((
            Some(body.to_vec()),
            ResponseMetadata { status, url: None },
        ))
    }

    #[test]
    fn transport_network_error_maps_to_network() {
        let outcome: TransportOutcome =
            Err(TransportError::Network("connection reset".into()));
        let result = JsonMapParser::new().parse(outcome);
        assert!(matches!(result, Err(ResultError::Network(_))));
    }

    #[test]
    fn unrecognized_transport_error_maps_to_unexpected() {
        let outcome: TransportOutcome = Err(TransportError::Other("weird".into()));
        let result = JsonMapParser::new().parse(outcome);
        assert!(matches!(result, Err(ResultError::Unexpected(_))));
    }

    #[test]
    fn status_500_short_circuits_ignoring_the_body() {
        // The body is not valid JSON; it must never be inspected.
        let result = JsonMapParser::new().parse(reply(500, b"<html>oops</html>"));
        match result {
            Err(ResultError::Server(ServerError::Status { code, .. })) => assert_eq!(code, 500),
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn status_499_does_not_short_circuit() {
        let result = JsonMapParser::new().parse(reply(499, br#"{"a":1}"#));
        assert_eq!(result.unwrap(), HashMap::from([("a".to_string(), json!(1))]));
    }

    #[test]
    fn empty_body_yields_the_empty_default() {
        let map = JsonMapParser::new().parse(reply(200, b"")).unwrap();
        assert!(map.is_empty());

        let list = JsonResponseParser::<Vec<serde_json::Value>, ()>::new()
            .parse(reply(200, b""))
            .unwrap();
        assert!(list.is_empty());

        let absent: TransportOutcome =
            Ok((None, ResponseMetadata { status: 200, url: None }));
        assert!(FormParser::new().parse(absent).unwrap().is_empty());
    }

    #[test]
    fn json_object_decodes_into_a_map() {
        let map = JsonMapParser::new().parse(reply(200, br#"{"a":1}"#)).unwrap();
        assert_eq!(map, HashMap::from([("a".to_string(), json!(1))]));
    }

    #[test]
    fn invalid_json_is_a_wrapped_parsing_failure() {
        let result = JsonMapParser::new().parse(reply(200, b"not json"));
        assert!(matches!(
            result,
            Err(ResultError::Server(ServerError::Parsing(DataError::Wrapped(_))))
        ));
    }

    #[test]
    fn type_mismatch_keeps_the_decoded_value() {
        // Valid JSON, but an array cannot become a map.
        let result = JsonMapParser::new().parse(reply(200, b"[1,2]"));
        match result {
            Err(ResultError::Server(ServerError::Parsing(DataError::Format {
                value, ..
            }))) => assert_eq!(value, json!([1, 2])),
            other => panic!("expected a format mismatch, got {other:?}"),
        }
    }

    #[test]
    fn form_body_decodes_pairs_and_percent_escapes() {
        let map = FormParser::new()
            .parse(reply(200, b"name=a%20b&val=5"))
            .unwrap();
        assert_eq!(
            map,
            HashMap::from([
                ("name".to_string(), "a b".to_string()),
                ("val".to_string(), "5".to_string()),
            ])
        );
    }

    #[test]
    fn later_duplicate_form_keys_overwrite_earlier_ones() {
        let map = FormParser::new().parse(reply(200, b"k=1&k=2")).unwrap();
        assert_eq!(map, HashMap::from([("k".to_string(), "2".to_string())]));
    }

    #[test]
    fn form_pair_without_equals_is_a_format_failure() {
        let result = FormParser::new().parse(reply(200, b"key1=val1&key2"));
        assert!(matches!(
            result,
            Err(ResultError::Server(ServerError::Parsing(DataError::Format { .. })))
        ));
    }

    #[test]
    fn form_value_may_contain_equals() {
        let map = FormParser::new().parse(reply(200, b"token=a=b")).unwrap();
        assert_eq!(map, HashMap::from([("token".to_string(), "a=b".to_string())]));
    }

    #[test]
    fn non_utf8_form_body_is_unexpected() {
        let result = FormParser::new().parse(reply(200, &[0xff, 0xfe]));
        assert!(matches!(
            result,
            Err(ResultError::Server(ServerError::Unexpected(Some(_))))
        ));
    }

    #[test]
    fn accept_types_match_the_variant_format() {
        assert_eq!(JsonMapParser::new().accept_type(), Some("application/json"));
        assert_eq!(
            FormParser::new().accept_type(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn form_round_trips_through_the_encoder() {
        use crate::encoder::{FormRequestEncoder, RequestEncoder};
        use crate::http::HttpMethod;

        let original = HashMap::from([
            ("name".to_string(), "a b".to_string()),
            ("path".to_string(), "/tmp/x~1".to_string()),
            ("plus".to_string(), "1+1".to_string()),
        ]);
        let request = FormRequestEncoder
            .encode(
                &url::Url::parse("http://api.example.com/submit").unwrap(),
                HttpMethod::POST,
                Some(&original),
                &HashMap::new(),
            )
            .unwrap();

        let decoded = FormParser::new()
            .parse(reply(200, &request.body.unwrap()))
            .unwrap();
        assert_eq!(decoded, original);
    }
}
