//! URL canonicalization for consistent classification and cache keys.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    normalize(parsed)
}

/// Resolve an absolute or root-relative reference against the app origin.
pub fn resolve(origin: &Url, reference: &str) -> Result<Url, UrlError> {
    let trimmed = reference.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    normalize(joined)
}

/// Lowercase the host and drop the fragment of an already-parsed URL.
pub fn normalize(mut url: Url) -> Result<Url, UrlError> {
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    url.set_fragment(None);

    Ok(url)
}

/// True when `host` is `cdn` itself or one of its subdomains.
pub fn host_matches(host: &str, cdn: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let cdn = cdn.trim().trim_end_matches('.').to_ascii_lowercase();
    host == cdn || host.strip_suffix(&cdn).is_some_and(|rest| rest.ends_with('.'))
}
