//! Observed HTTP exchanges, as handed over by the proxy integration.

use serde::{Deserialize, Serialize};

/// Where a request parameter was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Url,
    Body,
    Cookie,
    Json,
}

/// A request parameter exactly as it appeared on the wire (not decoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpParameter {
    pub name: String,
    pub value: String,
    pub kind: ParamKind,
}

impl HttpParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }

    /// Split a raw `a=1&b=2` string into parameters without decoding.
    pub fn parse_raw(input: &str, kind: ParamKind) -> Vec<HttpParameter> {
        input
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((name, value)) => HttpParameter::new(name, value, kind),
                None => HttpParameter::new(pair, "", kind),
            })
            .collect()
    }
}

/// The request half of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub parameters: Vec<HttpParameter>,
}

impl HttpRequest {
    /// Create a request with no parameters.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            parameters: Vec::new(),
        }
    }

    /// A GET request whose parameters come from the URL query string.
    pub fn get(url: impl Into<String>) -> Self {
        let url = url.into();
        let parameters = raw_query(&url)
            .map(|q| HttpParameter::parse_raw(q, ParamKind::Url))
            .unwrap_or_default();
        Self {
            method: "GET".to_string(),
            url,
            parameters,
        }
    }

    /// Append parameters from an `application/x-www-form-urlencoded` body.
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.parameters
            .extend(HttpParameter::parse_raw(body, ParamKind::Body));
        self
    }

    /// Append a single parameter.
    pub fn with_parameter(mut self, parameter: HttpParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Query string of a URL without percent-decoding it.
fn raw_query(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once('?')?;
    Some(rest.split('#').next().unwrap_or(rest))
}

/// The response half of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }
}

/// One observed request/response pair. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpExchange {
    pub request: Option<HttpRequest>,
    pub response: Option<HttpResponse>,
}

impl HttpExchange {
    pub fn new(request: Option<HttpRequest>, response: Option<HttpResponse>) -> Self {
        Self { request, response }
    }

    /// A full request/response pair.
    pub fn pair(request: HttpRequest, response: HttpResponse) -> Self {
        Self::new(Some(request), Some(response))
    }

    /// A request that has not (yet) been answered.
    pub fn request_only(request: HttpRequest) -> Self {
        Self::new(Some(request), None)
    }

    /// A response seen without its request (replayed or synthetic).
    pub fn response_only(response: HttpResponse) -> Self {
        Self::new(None, Some(response))
    }
}
