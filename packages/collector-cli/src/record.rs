//! Recorded exchanges, one JSON object per line.
//!
//! ```json
//! {"request":{"method":"POST","url":"https://example.com/login","body":"user=a"},"response":{"status":200,"body":"{}"}}
//! ```

use collector::{HttpExchange, HttpParameter, HttpRequest, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExchangeRecord {
    #[serde(default)]
    pub request: Option<RequestRecord>,
    #[serde(default)]
    pub response: Option<ResponseRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RequestRecord {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    /// Form-encoded request body.
    #[serde(default)]
    pub body: Option<String>,
    /// Parameters the recording tool already split out (cookies, JSON).
    #[serde(default)]
    pub parameters: Vec<HttpParameter>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseRecord {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

impl ExchangeRecord {
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn into_exchange(self) -> HttpExchange {
        let request = self.request.map(|r| {
            let mut request = HttpRequest::get(r.url);
            request.method = r.method;
            if let Some(body) = r.body.as_deref() {
                request = request.with_form_body(body);
            }
            request.parameters.extend(r.parameters);
            request
        });
        let response = self.response.map(|r| HttpResponse::new(r.status, r.body));
        HttpExchange::new(request, response)
    }
}
