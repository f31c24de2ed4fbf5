//! Request URL construction: root + path, caller params, then the token.

use std::collections::BTreeMap;

use log::warn;
use url::form_urlencoded::byte_serialize;

/// Name of the query parameter that carries the auth token.
pub const TOKEN_PARAM: &str = "token";

/// Joins the root URL and a path with exactly one `/` between them.
pub fn join_path(root_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        root_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn connector(url: &str) -> char {
    if url.contains('?') { '&' } else { '?' }
}

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

/// Appends caller params in key order. A `token` param is dropped since the
/// token is always appended separately.
pub fn append_params(url: &str, params: &BTreeMap<String, String>) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter(|(key, _)| {
            if key.as_str() == TOKEN_PARAM {
                warn!("Ignoring caller-supplied '{}' query parameter", TOKEN_PARAM);
                return false;
            }
            true
        })
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect();

    if pairs.is_empty() {
        return url.to_string();
    }
    format!("{}{}{}", url, connector(url), pairs.join("&"))
}

/// Drops `token` pairs the path already carries in its query string.
pub fn strip_token(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            if key == TOKEN_PARAM {
                warn!("Ignoring '{}' query parameter embedded in path", TOKEN_PARAM);
                return false;
            }
            true
        })
        .collect();

    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    }
}

pub fn append_token(url: &str, token: &str) -> String {
    format!("{}{}{}={}", url, connector(url), TOKEN_PARAM, encode(token))
}

/// Full request URL for a path relative to `root_url`.
pub fn build_url(
    root_url: &str,
    path: &str,
    params: &BTreeMap<String, String>,
    token: &str,
) -> String {
    let url = strip_token(&join_path(root_url, path));
    append_token(&append_params(&url, params), token)
}
