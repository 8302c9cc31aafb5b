//! Request plumbing shared by the V2 client and the backend adapters.

use crate::error::{Result, SiloError};
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

/// Sends a request and maps transport failures and non-success statuses.
pub(crate) async fn send(request: RequestBuilder, target: &str) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| translate_reqwest_error(e, target))?;
    check_response_status(response).await
}

/// Decodes a JSON body, naming `what` in the error.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| SiloError::network_with_source(format!("Failed to read {}", what), e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SiloError::validation_with_source(format!("Failed to parse {}", what), e))
}

/// Follows a paginated listing until no next page is advertised.
///
/// `build` turns a page URL into a request, `extract` splits a decoded page
/// into its items and the `next` URL found in the body, if any. When the
/// body carries none, a `Link: <...>; rel="next"` header is honoured.
/// Relative next URLs are resolved against `base`.
pub(crate) async fn collect_pages<T, I, B, E>(
    base: &str,
    first_url: String,
    build: B,
    mut extract: E,
) -> Result<Vec<I>>
where
    T: DeserializeOwned,
    B: Fn(&str) -> RequestBuilder,
    E: FnMut(T) -> (Vec<I>, Option<String>),
{
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut url = first_url;

    loop {
        debug!(url = %url, "fetching page");
        visited.insert(url.clone());

        let response = build(&url)
            .send()
            .await
            .map_err(|e| translate_reqwest_error(e, &url))?;
        let link_next = extract_next_link(response.headers());
        let response = check_response_status(response).await?;

        let page: T = decode_json(response, "listing response").await?;
        let (page_items, body_next) = extract(page);
        items.extend(page_items);

        let next = body_next
            .filter(|n| !n.trim().is_empty())
            .or(link_next)
            .map(|n| resolve_url(base, &n));

        match next {
            Some(next) if visited.contains(&next) => {
                warn!(url = %next, "pagination loops back to a visited page, stopping");
                break;
            }
            Some(next) => url = next,
            None => break,
        }
    }

    Ok(items)
}

/// Resolves a possibly relative URL against `base`.
pub(crate) fn resolve_url(base: &str, next: &str) -> String {
    let next = next.trim();
    if next.starts_with("http://") || next.starts_with("https://") {
        next.to_string()
    } else if next.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), next)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), next)
    }
}

/// Extracts the next page URL from the Link header.
///
/// Format: `</v2/_catalog?n=100&last=repo99>; rel="next"`
pub(crate) fn extract_next_link(headers: &HeaderMap) -> Option<String> {
    let link_str = headers.get(LINK)?.to_str().ok()?;

    for link_part in link_str.split(',') {
        let link_part = link_part.trim();
        if (link_part.contains("rel=\"next\"") || link_part.contains("rel='next'"))
            && let (Some(start), Some(end)) = (link_part.find('<'), link_part.find('>'))
            && start < end
        {
            return Some(link_part[start + 1..end].to_string());
        }
    }

    None
}

/// Translates a reqwest error into a SiloError.
pub(crate) fn translate_reqwest_error(error: reqwest::Error, target: &str) -> SiloError {
    if error.is_timeout() {
        SiloError::network_with_source(format!("Request to {} timed out", target), error)
    } else if error.is_connect() {
        SiloError::network_with_source(format!("Failed to connect to {}", target), error)
    } else if error.is_request() {
        SiloError::network_with_source(format!("Failed to send request to {}", target), error)
    } else {
        SiloError::network_with_source(format!("Network error communicating with {}", target), error)
    }
}

/// Checks the HTTP response status and translates errors to SiloError.
pub(crate) async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(unable to read response body)"));

    match status {
        StatusCode::UNAUTHORIZED => Err(SiloError::authentication(
            format!("Authentication required for {}: {}", url, error_body),
            Some(401),
        )),
        StatusCode::FORBIDDEN => Err(SiloError::authentication(
            format!("Access forbidden for {}: {}", url, error_body),
            Some(403),
        )),
        StatusCode::NOT_FOUND => Err(SiloError::not_found("endpoint".to_string(), url)),
        StatusCode::TOO_MANY_REQUESTS => Err(SiloError::rate_limit(
            format!("Rate limit exceeded for {}", url),
            retry_after,
        )),
        s if s.is_server_error() => Err(SiloError::server(
            format!("Server error from {}: {}", url, error_body),
            status.as_u16(),
        )),
        _ => Err(SiloError::network(format!(
            "HTTP {} from {}: {}",
            status.as_u16(),
            url,
            error_body
        ))),
    }
}
