use std::collections::HashMap;

use url::Url;

/// Single query-string entry. The order of a `QueryParam` slice is
/// reflected verbatim into the URL, and duplicate names are allowed. A
/// `None` value serializes as the bare name with no `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: Option<String>,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A valueless parameter, e.g. `?verbose`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Builds absolute URLs from a fixed base, a relative path and ordered
/// query parameters.
///
/// Implementors supply [`base_url`](UrlBuilder::base_url); the provided
/// methods handle composition. Builders that inject fixed parameters (a
/// locale code, a formatting flag) override [`build_url`](UrlBuilder::build_url),
/// append to a copy of the caller's parameters and delegate to
/// [`compose_url`]; the caller's slice is never mutated.
pub trait UrlBuilder {
    fn base_url(&self) -> &Url;

    fn build_url(&self, path: &str, parameters: &[QueryParam]) -> Option<Url> {
        compose_url(self.base_url(), path, parameters)
    }

    /// Convenience form taking a name-to-value map. Map iteration order is
    /// not guaranteed; callers that need deterministic ordering use the
    /// slice form.
    fn build_url_from_map(
        &self,
        path: &str,
        parameters: &HashMap<String, Option<String>>,
    ) -> Option<Url> {
        let items: Vec<QueryParam> = parameters
            .iter()
            .map(|(name, value)| QueryParam {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        self.build_url(path, &items)
    }

    /// Equivalent to [`build_url`](UrlBuilder::build_url) with no parameters.
    fn build_url_bare(&self, path: &str) -> Option<Url> {
        self.build_url(path, &[])
    }
}

/// Append `path` as path components onto `base`, then attach `parameters`
/// as the query string, preserving their order. Returns `None` when `base`
/// cannot carry path segments (`mailto:`-style URLs).
pub fn compose_url(base: &Url, path: &str, parameters: &[QueryParam]) -> Option<Url> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            segments.push(component);
        }
    }
    url.set_query(query_string(parameters).as_deref());
    Some(url)
}

fn query_string(parameters: &[QueryParam]) -> Option<String> {
    if parameters.is_empty() {
        return None;
    }

    let mut query = String::new();
    for parameter in parameters {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&urlencoding::encode(&parameter.name));
        if let Some(value) = &parameter.value {
            query.push('=');
            query.push_str(&urlencoding::encode(value));
        }
    }
    Some(query)
}

/// Plain builder over a fixed base URL, for callers that inject nothing.
#[derive(Debug, Clone)]
pub struct BaseUrlBuilder {
    base: Url,
}

impl BaseUrlBuilder {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl UrlBuilder for BaseUrlBuilder {
    fn base_url(&self) -> &Url {
        &self.base
    }
}
