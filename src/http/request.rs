//! Request and response descriptors exchanged with a [`Transport`](super::Transport).

use std::fmt;

pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully resolved request. The body, when present, is already JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Builds the descriptor for `method`. POST sends `Accept` and
    /// `Content-Type`, PUT only `Content-Type`, GET and DELETE neither and
    /// never carry a body.
    pub fn new(method: Method, url: impl Into<String>, body: Option<String>) -> Self {
        let json = || (String::from("Content-Type"), APPLICATION_JSON.to_string());
        let (headers, body) = match method {
            Method::Post => (
                vec![
                    (String::from("Accept"), APPLICATION_JSON.to_string()),
                    json(),
                ],
                body,
            ),
            Method::Put => (vec![json()], body),
            Method::Get | Method::Delete => (Vec::new(), None),
        };

        Self {
            method,
            url: url.into(),
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and fully read body text of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}
