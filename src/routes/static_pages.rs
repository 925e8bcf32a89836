// Request/response middleware for serving the built single-page app

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri, uri::PathAndQuery},
    response::Response,
};
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::error::{AppError, AppResult};

// Compiled url_rewrite table: path regex -> replacement directory
#[derive(Clone, Debug, Default)]
pub struct UrlRewrites {
    rules: Arc<Vec<(Regex, String)>>,
}

impl UrlRewrites {
    pub fn compile(table: &HashMap<String, String>) -> Result<Self> {
        // Longest pattern first so more specific rules win deterministically
        let mut entries: Vec<_> = table.iter().collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        let rules = entries
            .into_iter()
            .map(|(pattern, dir)| {
                let regex = Regex::new(pattern)
                    .with_context(|| format!("Invalid url_rewrite pattern '{}'", pattern))?;
                Ok((regex, dir.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules: Arc::new(rules) })
    }

    // Rewritten path for `path`, or None when no rule matches
    pub fn rewrite(&self, path: &str) -> Option<String> {
        let (regex, dir) = self.rules.iter().find(|(regex, _)| regex.is_match(path))?;
        let rewritten = regex.replace(path, dir.as_str()).into_owned();
        if rewritten.starts_with('/') {
            Some(rewritten)
        } else {
            Some(format!("/{}", rewritten))
        }
    }
}

// Headers added to every response (CORS by default)
#[derive(Clone, Debug, Default)]
pub struct ResponseHeaders {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl ResponseHeaders {
    pub fn parse(table: &BTreeMap<String, String>) -> Result<Self> {
        let headers = table
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("Invalid response header name '{}'", name))?;
                let value = HeaderValue::from_str(value)
                    .with_context(|| format!("Invalid value for response header '{}'", name))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { headers: Arc::new(headers) })
    }
}

pub async fn rewrite_url(
    State(rewrites): State<UrlRewrites>,
    mut request: Request,
) -> AppResult<Request> {
    let Some(path) = rewrites.rewrite(request.uri().path()) else {
        return Ok(request);
    };

    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };
    tracing::debug!(from = %request.uri(), to = %path_and_query, "Rewriting request path");

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query.as_str())
            .map_err(|e| AppError::BadRequest(format!("Rewritten path is invalid: {}", e)))?,
    );
    *request.uri_mut() = Uri::from_parts(parts)
        .context("Failed to rebuild rewritten URI")
        .map_err(AppError::from)?;
    Ok(request)
}

// Preflight requests never reach the file service
pub async fn answer_preflight(request: Request) -> Result<Request, StatusCode> {
    if request.method() == Method::OPTIONS {
        return Err(StatusCode::NO_CONTENT);
    }
    Ok(request)
}

pub async fn add_response_headers(
    State(headers): State<ResponseHeaders>,
    mut response: Response,
) -> Response {
    for (name, value) in headers.headers.iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_replaces_matched_prefix() {
        let rewrites = UrlRewrites::compile(&HashMap::from([(
            "^/docs".to_string(),
            "/manual".to_string(),
        )]))
        .expect("compile");

        assert_eq!(rewrites.rewrite("/docs/intro.html").as_deref(), Some("/manual/intro.html"));
        assert_eq!(rewrites.rewrite("/other/docs"), None);
    }

    #[test]
    fn rewrite_target_without_slash_is_rooted() {
        let rewrites =
            UrlRewrites::compile(&HashMap::from([("^/old".to_string(), "new".to_string())]))
                .expect("compile");
        assert_eq!(rewrites.rewrite("/old/a.js").as_deref(), Some("/new/a.js"));
    }

    #[test]
    fn bad_patterns_and_headers_are_rejected() {
        assert!(UrlRewrites::compile(&HashMap::from([("(".to_string(), "/x".to_string())])).is_err());
        assert!(
            ResponseHeaders::parse(&BTreeMap::from([("bad header".to_string(), "x".to_string())]))
                .is_err()
        );
    }
}
