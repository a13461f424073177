use hydropack_common::error::{HydroError, Result};
use url::Url;

/// Validates a URL, ensuring it uses the HTTPS scheme (or plain HTTP when
/// `allow_http` is set).
pub fn validate_url(url_str: &str, allow_http: bool) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| HydroError::ValidationError(format!("Failed to parse URL '{url_str}': {e}")))?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if allow_http => Ok(url),
        scheme => Err(HydroError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': Must be https, but got '{scheme}'"
        ))),
    }
}
