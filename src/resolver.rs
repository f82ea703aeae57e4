use tracing::debug;

use crate::url_utils;

/// Schemes an asset reference may carry and still be fetched.
const FETCHABLE_SCHEMES: [&str; 2] = ["http", "https"];

/// Turns a raw attribute value into the absolute URL to fetch it from.
///
/// First match wins: values that already name a host are returned as is
/// (scheme-relative ones get the page's scheme), root-relative paths are
/// appended to `page_full_domain`, everything else to `page_base_url`.
/// Malformed input degrades to "relative" rather than failing.
pub fn resolve_asset_url(raw_value: &str, page_base_url: &str, page_full_domain: &str) -> String {
    if raw_value.starts_with("//") {
        let scheme = url_utils::scheme(page_full_domain);
        let resolved = format!("{}:{}", scheme, raw_value);
        debug!("Scheme-relative asset {} resolved to {}", raw_value, resolved);
        return resolved;
    }

    if !url_utils::domain(raw_value).is_empty() {
        debug!("Asset is an absolute URL: {}", raw_value);
        return raw_value.to_string();
    }

    if url_utils::is_absolute_path(raw_value) {
        let resolved = format!("{}{}", page_full_domain, raw_value);
        debug!("Full URL for root-relative path: {}", resolved);
        return resolved;
    }

    let resolved = format!("{}{}", page_base_url, raw_value);
    debug!("Full URL for relative path: {}", resolved);
    resolved
}

/// True when `raw_value` names a host and that host is not `page_domain`.
///
/// Relative references never count as foreign.
pub fn is_other_domain(raw_value: &str, page_domain: &str) -> bool {
    let asset_domain = url_utils::domain(raw_value);
    !asset_domain.is_empty() && asset_domain != page_domain
}

/// Scheme of a value that cannot be fetched over HTTP (`data:`, `mailto:`),
/// or `None` when the value is fetchable or relative.
pub fn unsupported_scheme(raw_value: &str) -> Option<String> {
    if raw_value.starts_with("//") {
        return None;
    }
    let scheme = url_utils::scheme(raw_value);
    if scheme.is_empty() || FETCHABLE_SCHEMES.contains(&scheme.as_str()) {
        None
    } else {
        Some(scheme)
    }
}
