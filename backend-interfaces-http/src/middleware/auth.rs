use std::io::Read;

use anyhow::{anyhow, Result};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use backend_domain::{RuntimeConfig, ScanEventInput};

/// When an api_token is configured every route requires a matching bearer
/// token. Without one the surface is open (local and staging deployments).
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Scanner firmware gzips bodies on slow links; plain JSON stays supported.
/// The body limit layer only sees the compressed size, so the decompressed
/// size is capped here as well.
pub fn parse_scan(
    headers: &HeaderMap,
    body: &[u8],
    max_body_bytes: u64,
) -> Result<ScanEventInput> {
    let content = maybe_gunzip(headers, body, max_body_bytes)?;
    Ok(serde_json::from_str(&content)?)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8], max_body_bytes: u64) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("") == "gzip" {
            let mut decoder = GzDecoder::new(body).take(max_body_bytes + 1);
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            if out.len() as u64 > max_body_bytes {
                return Err(anyhow!(
                    "decompressed body exceeds {} bytes",
                    max_body_bytes
                ));
            }
            return Ok(out);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
